use serde_json::Value;

use crate::domain::Order;
use super::ImportError;

/// The export/import text format: a pretty-printed JSON array of orders.
pub fn serialize_orders(orders: &[Order]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(orders)
}

/// Parses and validates an import payload as a whole.
///
/// Either every element is a well-formed order and the full list is
/// returned, or the first problem found is reported.
pub fn parse_import(text: &str) -> Result<Vec<Order>, ImportError> {
    let value: Value = serde_json::from_str(text).map_err(|e| ImportError::Syntax(e.to_string()))?;
    let Value::Array(elements) = value else {
        return Err(ImportError::NotAnArray);
    };

    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            check_required_fields(index, &element)?;
            serde_json::from_value::<Order>(element).map_err(|e| ImportError::Malformed {
                index,
                message: e.to_string(),
            })
        })
        .collect()
}

fn check_required_fields(index: usize, element: &Value) -> Result<(), ImportError> {
    let object = element.as_object().ok_or(ImportError::NotAnObject { index })?;

    let required: [(&'static str, fn(&Value) -> bool); 3] = [
        ("id", Value::is_string),
        ("gymName", Value::is_string),
        ("products", Value::is_array),
    ];
    for (field, is_valid) in required {
        if !object.get(field).is_some_and(is_valid) {
            return Err(ImportError::MissingField { index, field });
        }
    }
    Ok(())
}
