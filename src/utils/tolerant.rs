//! Lenient serde decoders for the site's drifting JSON schema
//!
//! Every decoder here yields `None` (or skips an element) instead of failing
//! when the payload does not have the expected shape, so one renamed or
//! retyped field never aborts decoding of the whole player config.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use tracing::warn;

/// Decode any field, yielding `None` when its JSON type does not match
pub fn option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| T::deserialize(v).ok()))
}

/// Decode a number given either as a JSON number or a numeric string
pub fn number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.to_string().parse().ok(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Decode a boolean given either as a JSON bool or as "true"/"false"
pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => match s.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Decode a list, skipping elements that do not decode
pub fn seq<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(None);
    };

    let decoded = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match T::deserialize(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("Skipping undecodable list element {}: {}", index, e);
                None
            }
        })
        .collect();
    Ok(Some(decoded))
}
