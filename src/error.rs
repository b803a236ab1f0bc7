//! Error types for rytex

use std::fmt;
use thiserror::Error;

/// Pipeline stage in which an extraction failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AgeGate,
    Config,
    CipherDetection,
    PlayerCode,
    Signature,
    Reconstruction,
    Subtitles,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::AgeGate => "age-gate fallback",
            Stage::Config => "player config",
            Stage::CipherDetection => "cipher detection",
            Stage::PlayerCode => "player code",
            Stage::Signature => "signature decryption",
            Stage::Reconstruction => "stream reconstruction",
            Stage::Subtitles => "subtitles",
        };
        f.write_str(name)
    }
}

/// Low-level cause of an extraction failure.
///
/// These mean the site markup or player script no longer matches the known
/// patterns in [`crate::platform::patterns`]; none of them are retryable.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("player config not found in page")]
    ConfigNotFound,

    #[error("{reason}")]
    UnavailableBanner { reason: String },

    #[error("malformed player config: {0}")]
    MalformedConfig(#[from] serde_json::Error),

    #[error("streaming data is missing")]
    MissingStreamData,

    #[error("adaptive format list is empty")]
    EmptyStreamList,

    #[error("player code not found: {0}")]
    PlayerCodeNotFound(String),

    #[error("signature decryption failed: {0}")]
    SignatureDecryptionFailed(String),

    #[error("malformed stream url: {0}")]
    MalformedStreamUrl(String),

    #[error("video info: {0}")]
    VideoInfo(String),

    #[error("malformed subtitles: {0}")]
    MalformedSubtitles(String),
}

/// Main error type for rytex operations
#[derive(Debug, Error)]
pub enum RytexError {
    #[error("Extraction failed for video {video_id} at {stage}: {source}")]
    ExtractionFailed {
        video_id: String,
        stage: Stage,
        #[source]
        source: ExtractionError,
    },

    #[error("Network request to {url} failed: {reason}")]
    NetworkFailed { url: String, reason: String },

    #[error("Video {video_id} is unavailable, reason: {reason}")]
    VideoUnavailable { video_id: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RytexError {
    /// Wrap a low-level cause with the video id and failing stage
    pub fn extraction(video_id: &str, stage: Stage, source: ExtractionError) -> Self {
        RytexError::ExtractionFailed {
            video_id: video_id.to_string(),
            stage,
            source,
        }
    }

    /// Build a network failure from any displayable transport error
    pub fn network(url: &str, reason: impl fmt::Display) -> Self {
        RytexError::NetworkFailed {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, RytexError::NetworkFailed { .. })
    }

    /// Check if the failure means the site patterns need updating
    pub fn is_extraction_failure(&self) -> bool {
        matches!(self, RytexError::ExtractionFailed { .. })
    }

    /// Stage of an extraction failure, if this is one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            RytexError::ExtractionFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Human-readable reason embedded by the site, if any
    pub fn site_reason(&self) -> Option<&str> {
        match self {
            RytexError::ExtractionFailed {
                source: ExtractionError::UnavailableBanner { reason },
                ..
            } => Some(reason),
            RytexError::VideoUnavailable { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Attach video id and stage to a stage-local result
pub(crate) trait StageContext<T> {
    fn at_stage(self, video_id: &str, stage: Stage) -> Result<T, RytexError>;
}

impl<T> StageContext<T> for Result<T, ExtractionError> {
    fn at_stage(self, video_id: &str, stage: Stage) -> Result<T, RytexError> {
        self.map_err(|source| RytexError::extraction(video_id, stage, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_network_errors_are_retryable() {
        assert!(RytexError::network("https://x", "connection reset").is_retryable());
        assert!(!RytexError::extraction("id", Stage::Config, ExtractionError::ConfigNotFound)
            .is_retryable());
        assert!(!RytexError::VideoUnavailable {
            video_id: "id".to_string(),
            reason: "gone".to_string(),
        }
        .is_retryable());
    }

    #[test]
    fn test_extraction_message_carries_context() {
        let err = RytexError::extraction(
            "abc",
            Stage::Signature,
            ExtractionError::SignatureDecryptionFailed("unknown call Xy.zz".to_string()),
        );
        let message = err.to_string();
        assert!(message.contains("abc"));
        assert!(message.contains("signature decryption"));
        assert!(message.contains("Xy.zz"));
        assert_eq!(err.stage(), Some(Stage::Signature));
    }

    #[test]
    fn test_site_reason() {
        let err = RytexError::extraction(
            "abc",
            Stage::Config,
            ExtractionError::UnavailableBanner {
                reason: "This video is unavailable".to_string(),
            },
        );
        assert_eq!(err.site_reason(), Some("This video is unavailable"));
        assert!(RytexError::InvalidInput("x".to_string()).site_reason().is_none());
    }

    #[test]
    fn test_stage_names() {
        let names: Vec<String> = [
            Stage::AgeGate,
            Stage::Config,
            Stage::CipherDetection,
            Stage::PlayerCode,
            Stage::Signature,
            Stage::Reconstruction,
            Stage::Subtitles,
        ]
        .iter()
        .map(Stage::to_string)
        .collect();
        assert_eq!(
            names,
            vec![
                "age-gate fallback",
                "player config",
                "cipher detection",
                "player code",
                "signature decryption",
                "stream reconstruction",
                "subtitles",
            ]
        );
    }

    #[test]
    fn test_stage_context() {
        let result: Result<(), ExtractionError> = Err(ExtractionError::MissingStreamData);
        let err = result.at_stage("vid", Stage::CipherDetection).unwrap_err();
        assert!(err.is_extraction_failure());
        assert_eq!(err.stage(), Some(Stage::CipherDetection));
    }
}
