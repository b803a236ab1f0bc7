//! Playability classification of a decoded player config

use crate::core::player_config::UNAVAILABLE_REASON;
use crate::core::{PlayerConfig, StatusTag};

/// Outcome of the playability gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Playability {
    /// Streams can be resolved
    Available,
    /// Content is inaccessible, with the reason the site gives
    Unavailable(String),
    /// Live broadcast without adaptive formats; use the manifest URLs instead
    LiveWithoutFormats,
}

/// Classify a player config. Pure, depends on nothing but `config`.
pub fn classify(config: &PlayerConfig) -> Playability {
    if let Some(status) = &config.playability_status {
        let errored = status.status == Some(StatusTag::Error);
        let sentinel = status.reason.as_deref() == Some(UNAVAILABLE_REASON);
        if errored || sentinel {
            let reason = status
                .display_reason()
                .unwrap_or_else(|| UNAVAILABLE_REASON.to_string());
            return Playability::Unavailable(reason);
        }
    }

    if config.is_live_content() && config.adaptive_formats().is_empty() {
        return Playability::LiveWithoutFormats;
    }

    Playability::Available
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(json: &str) -> PlayerConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_available() {
        let c = config(r#"{"playabilityStatus":{"status":"OK"}}"#);
        assert_eq!(classify(&c), Playability::Available);
        assert_eq!(classify(&PlayerConfig::default()), Playability::Available);
    }

    #[test]
    fn test_error_status_is_unavailable() {
        let c = config(r#"{"playabilityStatus":{"status":"ERROR","reason":"This video has been removed"}}"#);
        assert_eq!(
            classify(&c),
            Playability::Unavailable("This video has been removed".to_string())
        );

        let c = config(r#"{"playabilityStatus":{"status":"ERROR"}}"#);
        assert_eq!(
            classify(&c),
            Playability::Unavailable(UNAVAILABLE_REASON.to_string())
        );
    }

    #[test]
    fn test_sentinel_reason_is_unavailable() {
        let c = config(r#"{"playabilityStatus":{"status":"UNPLAYABLE","reason":"Video unavailable"}}"#);
        assert!(matches!(classify(&c), Playability::Unavailable(_)));

        let c = config(r#"{"playabilityStatus":{"status":"LOGIN_REQUIRED","reason":"Sign in"}}"#);
        assert_eq!(classify(&c), Playability::Available);
    }

    #[test]
    fn test_live_without_adaptive_formats() {
        let c = config(
            r#"{"playabilityStatus":{"status":"OK"},"videoDetails":{"isLiveContent":true},
                "streamingData":{"hlsManifestUrl":"https://m/x.m3u8"}}"#,
        );
        assert_eq!(classify(&c), Playability::LiveWithoutFormats);

        let c = config(
            r#"{"videoDetails":{"isLiveContent":true},
                "streamingData":{"adaptiveFormats":[{"itag":140}]}}"#,
        );
        assert_eq!(classify(&c), Playability::Available);
    }

    #[test]
    fn test_deterministic() {
        let c = config(r#"{"playabilityStatus":{"status":"ERROR","reason":"x"}}"#);
        assert_eq!(classify(&c), classify(&c.clone()));
    }
}
