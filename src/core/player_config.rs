//! Player configuration structures
//!
//! These mirror the JSON object the site embeds in its watch page. Every
//! field is optional and decoded through [`crate::utils::tolerant`], so
//! schema drift degrades to absent fields instead of a failed parse.

use crate::utils::{parse_query, tolerant};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// Reason text the site uses for videos that cannot be played at all
pub const UNAVAILABLE_REASON: &str = "Video unavailable";

/// Root extraction result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerConfig {
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub playability_status: Option<PlayabilityStatus>,
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub streaming_data: Option<StreamingData>,
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub video_details: Option<VideoDetails>,
}

impl PlayerConfig {
    /// Check whether the content is (or was) a live broadcast
    pub fn is_live_content(&self) -> bool {
        self.video_details
            .as_ref()
            .and_then(|d| d.is_live_content)
            .unwrap_or(false)
    }

    /// Adaptive formats, empty when absent
    pub fn adaptive_formats(&self) -> &[StreamDescriptor] {
        self.streaming_data
            .as_ref()
            .and_then(|s| s.adaptive_formats.as_deref())
            .unwrap_or_default()
    }

    /// Muxed formats, empty when absent
    pub fn muxed_formats(&self) -> &[StreamDescriptor] {
        self.streaming_data
            .as_ref()
            .and_then(|s| s.formats.as_deref())
            .unwrap_or_default()
    }
}

/// Playability status tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusTag {
    Ok,
    Error,
    Unplayable,
    LoginRequired,
    LiveStreamOffline,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayabilityStatus {
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusTag>,
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub error_screen: Option<ErrorScreen>,
    #[serde(default, deserialize_with = "tolerant::flag", skip_serializing_if = "Option::is_none")]
    pub playable_in_embed: Option<bool>,
}

impl PlayabilityStatus {
    /// Most specific human-readable reason the site gives
    pub fn display_reason(&self) -> Option<String> {
        self.error_screen
            .as_ref()
            .and_then(|screen| screen.player_error_message_renderer.as_ref())
            .and_then(|renderer| renderer.reason.as_ref())
            .and_then(Text::to_plain)
            .or_else(|| self.reason.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorScreen {
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub player_error_message_renderer: Option<PlayerErrorMessageRenderer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerErrorMessageRenderer {
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub reason: Option<Text>,
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub subreason: Option<Text>,
}

/// Text node given either as `simpleText` or as a list of runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub simple_text: Option<String>,
    #[serde(default, deserialize_with = "tolerant::seq", skip_serializing_if = "Option::is_none")]
    pub runs: Option<Vec<TextRun>>,
}

impl Text {
    pub fn to_plain(&self) -> Option<String> {
        if let Some(text) = &self.simple_text {
            return Some(text.clone());
        }
        let joined: String = self
            .runs
            .as_deref()?
            .iter()
            .filter_map(|run| run.text.as_deref())
            .collect();
        (!joined.is_empty()).then_some(joined)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Stream catalog of the video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingData {
    #[serde(default, deserialize_with = "tolerant::number", skip_serializing_if = "Option::is_none")]
    pub expires_in_seconds: Option<u64>,
    /// Muxed (audio+video) streams
    #[serde(default, deserialize_with = "tolerant::seq", skip_serializing_if = "Option::is_none")]
    pub formats: Option<Vec<StreamDescriptor>>,
    #[serde(default, deserialize_with = "tolerant::seq", skip_serializing_if = "Option::is_none")]
    pub adaptive_formats: Option<Vec<StreamDescriptor>>,
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub dash_manifest_url: Option<String>,
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub hls_manifest_url: Option<String>,
    /// Audio-only adaptive streams, filled in by stream classification
    #[serde(skip_deserializing, skip_serializing_if = "Vec::is_empty")]
    pub audio_streams: Vec<StreamDescriptor>,
    /// Video-only adaptive streams, filled in by stream classification
    #[serde(skip_deserializing, skip_serializing_if = "Vec::is_empty")]
    pub video_streams: Vec<StreamDescriptor>,
}

/// A single adaptive or muxed stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamDescriptor {
    #[serde(default, deserialize_with = "tolerant::number", skip_serializing_if = "Option::is_none")]
    pub itag: Option<u32>,
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, deserialize_with = "tolerant::number", skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,
    #[serde(default, deserialize_with = "tolerant::number", skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, deserialize_with = "tolerant::number", skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, deserialize_with = "tolerant::number", skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub quality_label: Option<String>,
    #[serde(default, deserialize_with = "tolerant::number", skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    #[serde(default, deserialize_with = "tolerant::number", skip_serializing_if = "Option::is_none")]
    pub approx_duration_ms: Option<u64>,
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub audio_quality: Option<String>,
    #[serde(default, deserialize_with = "tolerant::number", skip_serializing_if = "Option::is_none")]
    pub audio_sample_rate: Option<u32>,
    #[serde(default, deserialize_with = "tolerant::number", skip_serializing_if = "Option::is_none")]
    pub audio_channels: Option<u32>,
    #[serde(
        default,
        alias = "signatureCipher",
        deserialize_with = "tolerant::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub cipher: Option<Cipher>,
}

impl StreamDescriptor {
    /// Declared MIME type, empty when absent
    pub fn mime(&self) -> &str {
        self.mime_type.as_deref().unwrap_or_default()
    }
}

/// Encrypted signature and the pieces needed to rebuild a playable URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cipher {
    /// Signature, url-decoded when the cipher is decoded; decrypted once
    /// reconstruction ran
    pub s: String,
    /// Query parameter name the signature goes under
    pub sp: String,
    /// Base stream URL without the signature
    pub url: String,
}

impl Cipher {
    pub const DEFAULT_PARAM: &'static str = "signature";

    /// Parse the form-encoded variant, e.g. `s=..&sp=sig&url=..`
    pub fn from_query(query: &str) -> Option<Self> {
        let mut pairs = parse_query(query);
        Some(Self {
            s: pairs.remove("s")?,
            sp: pairs
                .remove("sp")
                .unwrap_or_else(|| Self::DEFAULT_PARAM.to_string()),
            url: pairs.remove("url")?,
        })
    }
}

impl<'de> Deserialize<'de> for Cipher {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Encoded(String),
            Fields {
                s: String,
                sp: Option<String>,
                url: String,
            },
        }

        match Raw::deserialize(deserializer)? {
            Raw::Encoded(query) => Cipher::from_query(&query)
                .ok_or_else(|| de::Error::custom("cipher string lacks `s` or `url`")),
            Raw::Fields { s, sp, url } => Ok(Cipher {
                s: urlencoding::decode(&s).map(Cow::into_owned).unwrap_or(s),
                sp: sp.unwrap_or_else(|| Cipher::DEFAULT_PARAM.to_string()),
                url,
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "tolerant::number", skip_serializing_if = "Option::is_none")]
    pub length_seconds: Option<u64>,
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Thumbnails>,
    #[serde(default, deserialize_with = "tolerant::number", skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "tolerant::flag", skip_serializing_if = "Option::is_none")]
    pub is_live_content: Option<bool>,
    #[serde(default, deserialize_with = "tolerant::flag", skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
    #[serde(default, deserialize_with = "tolerant::number", skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(default, deserialize_with = "tolerant::flag", skip_serializing_if = "Option::is_none")]
    pub allow_ratings: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thumbnails {
    #[serde(default, deserialize_with = "tolerant::seq", skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Vec<Thumbnail>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    #[serde(default, deserialize_with = "tolerant::option", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "tolerant::number", skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, deserialize_with = "tolerant::number", skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// One timed subtitle line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtitle {
    pub start_seconds: f64,
    pub duration_seconds: f64,
    pub text: String,
}

/// Subtitle lines keyed by language code; iteration order is unspecified
pub type SubtitleMap = HashMap<String, Vec<Subtitle>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config: PlayerConfig =
            serde_json::from_str(r#"{"playabilityStatus":{"status":"OK"}}"#).unwrap();
        let status = config.playability_status.unwrap();
        assert_eq!(status.status, Some(StatusTag::Ok));
        assert!(status.reason.is_none());
        assert!(config.streaming_data.is_none());
    }

    #[test]
    fn test_unknown_status_and_fields() {
        let config: PlayerConfig = serde_json::from_str(
            r#"{"playabilityStatus":{"status":"SOMETHING_NEW","miniplayer":{}},"trackingParams":"x"}"#,
        )
        .unwrap();
        assert_eq!(
            config.playability_status.unwrap().status,
            Some(StatusTag::Unknown)
        );
    }

    #[test]
    fn test_display_reason_prefers_error_screen() {
        let status: PlayabilityStatus = serde_json::from_str(
            r#"{
                "status": "ERROR",
                "reason": "Video unavailable",
                "errorScreen": {"playerErrorMessageRenderer": {
                    "reason": {"runs": [{"text": "This video "}, {"text": "is private"}]}
                }}
            }"#,
        )
        .unwrap();
        assert_eq!(status.display_reason().as_deref(), Some("This video is private"));

        let status: PlayabilityStatus =
            serde_json::from_str(r#"{"status": "ERROR", "reason": "Gone"}"#).unwrap();
        assert_eq!(status.display_reason().as_deref(), Some("Gone"));
    }

    #[test]
    fn test_descriptor_numeric_strings() {
        let descriptor: StreamDescriptor = serde_json::from_str(
            r#"{
                "itag": 251,
                "mimeType": "audio/webm; codecs=\"opus\"",
                "bitrate": 135000,
                "contentLength": "3456789",
                "approxDurationMs": "212061",
                "audioSampleRate": "48000",
                "url": "https://x/?a=1"
            }"#,
        )
        .unwrap();
        assert_eq!(descriptor.itag, Some(251));
        assert_eq!(descriptor.content_length, Some(3456789));
        assert_eq!(descriptor.approx_duration_ms, Some(212061));
        assert_eq!(descriptor.audio_sample_rate, Some(48000));
        assert!(descriptor.mime().starts_with("audio/webm"));
        assert!(descriptor.cipher.is_none());
    }

    #[test]
    fn test_cipher_object_form() {
        let descriptor: StreamDescriptor = serde_json::from_str(
            r#"{"cipher": {"s": "AB12", "sp": "sig", "url": "https://x/?a=1"}}"#,
        )
        .unwrap();
        assert_eq!(
            descriptor.cipher,
            Some(Cipher {
                s: "AB12".to_string(),
                sp: "sig".to_string(),
                url: "https://x/?a=1".to_string(),
            })
        );
    }

    #[test]
    fn test_cipher_encoded_form() {
        let descriptor: StreamDescriptor = serde_json::from_str(
            r#"{"signatureCipher": "s=AB%3D12&sp=sig&url=https%3A%2F%2Fx%2F%3Fa%3D1"}"#,
        )
        .unwrap();
        let cipher = descriptor.cipher.unwrap();
        assert_eq!(cipher.s, "AB=12");
        assert_eq!(cipher.sp, "sig");
        assert_eq!(cipher.url, "https://x/?a=1");
    }

    #[test]
    fn test_cipher_signature_is_decoded_once() {
        let encoded: StreamDescriptor = serde_json::from_str(
            r#"{"signatureCipher": "s=AB%2541&sp=sig&url=https%3A%2F%2Fx%2F"}"#,
        )
        .unwrap();
        assert_eq!(encoded.cipher.unwrap().s, "AB%41");

        let object: StreamDescriptor = serde_json::from_str(
            r#"{"cipher": {"s": "AB%2541", "sp": "sig", "url": "https://x/"}}"#,
        )
        .unwrap();
        assert_eq!(object.cipher.unwrap().s, "AB%41");
    }

    #[test]
    fn test_cipher_defaults_param_name() {
        let cipher = Cipher::from_query("s=XY&url=https%3A%2F%2Fx%2F").unwrap();
        assert_eq!(cipher.sp, Cipher::DEFAULT_PARAM);
        assert!(Cipher::from_query("sp=sig").is_none());
    }

    #[test]
    fn test_broken_cipher_does_not_abort_descriptor() {
        let descriptor: StreamDescriptor =
            serde_json::from_str(r#"{"itag": 18, "cipher": "sp=sig"}"#).unwrap();
        assert_eq!(descriptor.itag, Some(18));
        assert!(descriptor.cipher.is_none());
    }

    #[test]
    fn test_live_content_and_format_accessors() {
        let config: PlayerConfig = serde_json::from_str(
            r#"{
                "videoDetails": {"videoId": "abc", "isLiveContent": true, "lengthSeconds": "0"},
                "streamingData": {"formats": [{"itag": 18}], "hlsManifestUrl": "https://m/x.m3u8"}
            }"#,
        )
        .unwrap();
        assert!(config.is_live_content());
        assert_eq!(config.muxed_formats().len(), 1);
        assert!(config.adaptive_formats().is_empty());
        assert_eq!(config.video_details.unwrap().length_seconds, Some(0));
    }
}
