//! URL utilities for video ids and query strings

use crate::error::RytexError;
use std::collections::HashMap;
use url::Url;

const VIDEO_ID_LEN: usize = 11;

/// Check whether `candidate` has the shape of a bare video id
pub fn is_video_id(candidate: &str) -> bool {
    candidate.len() == VIDEO_ID_LEN
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Extract video ID from a bare id or from any supported video URL format
pub fn extract_video_id(input: &str) -> Result<String, RytexError> {
    let input = input.trim();
    if is_video_id(input) {
        return Ok(input.to_string());
    }

    let parsed = Url::parse(input)
        .map_err(|e| RytexError::InvalidInput(format!("{}: {}", input, e)))?;

    let id = match parsed.host_str() {
        Some("youtu.be") => parsed.path().trim_start_matches('/').to_string(),
        Some("youtube.com") | Some("www.youtube.com") | Some("m.youtube.com") => {
            let path = parsed.path();
            if path.starts_with("/watch") {
                parsed
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.to_string())
                    .unwrap_or_default()
            } else if let Some(rest) = path
                .strip_prefix("/shorts/")
                .or_else(|| path.strip_prefix("/embed/"))
                .or_else(|| path.strip_prefix("/v/"))
            {
                rest.trim_end_matches('/').to_string()
            } else {
                return Err(RytexError::InvalidInput(
                    "Unsupported video URL format".to_string(),
                ));
            }
        }
        _ => {
            return Err(RytexError::InvalidInput(
                "Not a supported video platform URL".to_string(),
            ))
        }
    };

    if is_video_id(&id) {
        Ok(id)
    } else {
        Err(RytexError::InvalidInput(format!(
            "Missing or malformed video ID in {}",
            input
        )))
    }
}

/// Split a form-encoded string (`a=1&b=2`) into decoded key/value pairs
pub fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .into_owned()
        .collect()
}

/// Check whether `url` already carries a query parameter named `name`
pub fn has_query_param(url: &str, name: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.query_pairs().any(|(key, _)| key == name),
        Err(_) => false,
    }
}

/// Append `name=value` to the query of `url`
pub fn append_query_param(url: &str, name: &str, value: &str) -> Result<String, url::ParseError> {
    let mut parsed = Url::parse(url)?;
    parsed.query_pairs_mut().append_pair(name, value);
    Ok(parsed.into())
}
