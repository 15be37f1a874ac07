use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// File looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE: &str = "order-tracker.toml";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub storage: StorageConfig,
    pub export: ExportConfig,
    #[serde(default)]
    pub actor: ActorConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Name of the persisted blob.
    pub key: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ExportConfig {
    pub dir: PathBuf,
    pub prefix: String,
    #[serde(default)]
    pub share: ShareKind,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShareKind {
    #[default]
    Console,
    Disabled,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ActorConfig {
    pub buffer_size: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self { buffer_size: 32 }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[storage]
data_dir = "data"
key = "orders-storage"

[export]
dir = "exports"
prefix = "orders-export"
share = "console"

[actor]
buffer_size = 32
"#;

/// Load configuration.
///
/// Search order:
/// 1. `path`, when given (it must exist)
/// 2. `order-tracker.toml` in the working directory
/// 3. the embedded default
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = path {
        tracing::info!("Loading config from: {}", path.display());
        return read_config(path);
    }

    let local = Path::new(CONFIG_FILE);
    if local.exists() {
        tracing::info!("Loading config from: {}", local.display());
        return read_config(local);
    }

    tracing::info!("Using default embedded configuration");
    toml::from_str(DEFAULT_CONFIG).context("parsing embedded default config")
}

fn read_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parsing config file {}", path.display()))
}
