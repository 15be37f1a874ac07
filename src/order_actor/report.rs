use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use super::ImportError;
use crate::export::ExportError;

/// Outcome of an import or export, ready to show to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationReport {
    pub success: bool,
    pub message: String,
}

impl OperationReport {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }

    pub fn from_import(result: Result<usize, ImportError>) -> Self {
        match result {
            Ok(count) => Self::ok(format!("Imported {} orders", count)),
            Err(e) => Self::failed(e.to_string()),
        }
    }

    pub fn from_export(result: Result<PathBuf, ExportError>) -> Self {
        match result {
            Ok(path) => Self::ok(format!("Exported orders to {}", path.display())),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

impl fmt::Display for OperationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.success { "OK" } else { "FAILED" };
        write!(f, "{}: {}", label, self.message)
    }
}
