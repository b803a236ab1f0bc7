//! Player configuration recovery from watch page markup

use crate::core::PlayerConfig;
use crate::error::ExtractionError;
use crate::platform::patterns;
use crate::utils::parse_query;
use serde_json::Value;
use tracing::{debug, info};

/// Recovers the [`PlayerConfig`] embedded in a watch page
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigExtractor;

impl ConfigExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the player config from raw page text.
    ///
    /// Anchors from [`patterns::CONFIG_ANCHORS`] are tried in order and the
    /// first one whose object can be cut out is decoded. Without a match the
    /// page is searched for the unavailable banner.
    pub fn extract(&self, page: &str) -> Result<PlayerConfig, ExtractionError> {
        for (name, anchor) in patterns::CONFIG_ANCHORS.iter() {
            let Some(found) = anchor.find(page) else {
                continue;
            };
            // The anchor match ends on the opening brace
            let Some(object) = balanced_object(page, found.end() - 1) else {
                debug!("Config anchor {} matched but object is unterminated", name);
                continue;
            };
            info!("Player config found via {}", name);
            return decode_config(object);
        }

        if let Some(caps) = patterns::UNAVAILABLE_BANNER.captures(page) {
            return Err(ExtractionError::UnavailableBanner {
                reason: caps[1].trim().to_string(),
            });
        }

        Err(ExtractionError::ConfigNotFound)
    }
}

/// Decode a config object, unwrapping the legacy `ytplayer.config` envelope
fn decode_config(object: &str) -> Result<PlayerConfig, ExtractionError> {
    let value: Value = serde_json::from_str(object)?;
    match value.pointer("/args/player_response") {
        Some(Value::String(inner)) => {
            debug!("Unwrapping legacy player_response");
            Ok(serde_json::from_str(inner)?)
        }
        Some(inner @ Value::Object(_)) => Ok(serde_json::from_value(inner.clone())?),
        _ => Ok(serde_json::from_value(value)?),
    }
}

/// Cut out the JSON object starting at `start`, honoring strings and escapes
pub(crate) fn balanced_object(text: &str, start: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return text.get(start..=start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Check whether a watch page is age-gated
pub fn is_age_gated(page: &str) -> bool {
    patterns::AGE_GATE.is_match(page)
}

/// Signature timestamp from the embedded player page
pub fn signature_timestamp(embed_page: &str) -> Result<String, ExtractionError> {
    patterns::SIGNATURE_TIMESTAMP
        .captures(embed_page)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ExtractionError::VideoInfo("signature timestamp not found".to_string()))
}

/// Decode the legacy video info response into a player config
pub fn parse_video_info(body: &str) -> Result<PlayerConfig, ExtractionError> {
    let params = parse_query(body.trim());
    match params.get("player_response") {
        Some(response) if !response.trim().is_empty() => Ok(serde_json::from_str(response)?),
        _ => {
            let reason = params
                .get("reason")
                .cloned()
                .unwrap_or_else(|| "player_response is missing".to_string());
            Err(ExtractionError::VideoInfo(reason))
        }
    }
}
