//! Stream URL reconstruction and audio/video partitioning

use crate::core::{Cipher, PlayerConfig, StreamDescriptor, StreamingData};
use crate::error::ExtractionError;
use crate::platform::cipher::OperationSequence;
use crate::utils::{append_query_param, has_query_param};
use tracing::{debug, warn};

/// Rebuilds playable URLs from ciphered descriptors.
///
/// Descriptors are never modified in place; every call returns new values.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamReconstructor<'a> {
    sequence: Option<&'a OperationSequence>,
}

impl<'a> StreamReconstructor<'a> {
    /// Reconstructor for signatures that still need decrypting
    pub fn new(sequence: &'a OperationSequence) -> Self {
        Self {
            sequence: Some(sequence),
        }
    }

    /// Reconstructor for signatures that are already plain
    pub fn plain() -> Self {
        Self { sequence: None }
    }

    /// Playable descriptor for `descriptor`.
    ///
    /// A direct URL is kept as is. Otherwise the signature is decrypted and
    /// appended to `cipher.url` under `cipher.sp`, unless that parameter is
    /// already present. The result always carries a direct URL, so a second
    /// pass returns it unchanged.
    pub fn reconstruct(
        &self,
        descriptor: &StreamDescriptor,
    ) -> Result<StreamDescriptor, ExtractionError> {
        if descriptor.url.is_some() {
            return Ok(descriptor.clone());
        }
        let Some(cipher) = &descriptor.cipher else {
            return Ok(descriptor.clone());
        };

        let signature = match self.sequence {
            Some(sequence) => sequence.apply(&cipher.s)?,
            None => cipher.s.clone(),
        };

        let url = if has_query_param(&cipher.url, &cipher.sp) {
            cipher.url.clone()
        } else {
            append_query_param(&cipher.url, &cipher.sp, &signature)
                .map_err(|e| ExtractionError::MalformedStreamUrl(format!("{}: {}", cipher.url, e)))?
        };

        Ok(StreamDescriptor {
            url: Some(url),
            cipher: Some(Cipher {
                s: signature,
                ..cipher.clone()
            }),
            ..descriptor.clone()
        })
    }

    /// Reconstruct every muxed and adaptive descriptor of `config`
    pub fn reconstruct_config(&self, config: &PlayerConfig) -> Result<PlayerConfig, ExtractionError> {
        let Some(streaming) = &config.streaming_data else {
            return Ok(config.clone());
        };

        let rebuild = |list: &Option<Vec<StreamDescriptor>>| {
            list.as_ref()
                .map(|items| {
                    items
                        .iter()
                        .map(|d| self.reconstruct(d))
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()
        };

        let streaming = StreamingData {
            formats: rebuild(&streaming.formats)?,
            adaptive_formats: rebuild(&streaming.adaptive_formats)?,
            ..streaming.clone()
        };
        debug!(
            "Reconstructed {} muxed and {} adaptive streams",
            streaming.formats.as_ref().map_or(0, Vec::len),
            streaming.adaptive_formats.as_ref().map_or(0, Vec::len)
        );

        Ok(PlayerConfig {
            streaming_data: Some(streaming),
            ..config.clone()
        })
    }
}

/// Adaptive streams split by media type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamPartition {
    pub audio: Vec<StreamDescriptor>,
    pub video: Vec<StreamDescriptor>,
    /// Entries without duration or with an unrecognized MIME type
    pub dropped: Vec<StreamDescriptor>,
}

/// Partition adaptive streams into audio-only and video-only sets
pub fn partition_streams(adaptive: &[StreamDescriptor]) -> StreamPartition {
    let mut partition = StreamPartition::default();

    for descriptor in adaptive {
        if descriptor.approx_duration_ms.is_none() {
            warn!(
                "Dropping stream itag {:?}: no duration metadata",
                descriptor.itag
            );
            partition.dropped.push(descriptor.clone());
            continue;
        }

        let mime = descriptor.mime();
        if mime.contains("audio") {
            partition.audio.push(descriptor.clone());
        } else if mime.contains("video") {
            partition.video.push(descriptor.clone());
        } else {
            warn!(
                "Dropping stream itag {:?}: unrecognized mime type {:?}",
                descriptor.itag, mime
            );
            partition.dropped.push(descriptor.clone());
        }
    }

    partition
}

/// Copy of `config` with the audio and video stream sets filled in
pub fn classify_streams(config: &PlayerConfig) -> PlayerConfig {
    let Some(streaming) = &config.streaming_data else {
        return config.clone();
    };

    let partition = partition_streams(streaming.adaptive_formats.as_deref().unwrap_or_default());
    debug!(
        "Classified {} audio, {} video, {} dropped adaptive streams",
        partition.audio.len(),
        partition.video.len(),
        partition.dropped.len()
    );

    PlayerConfig {
        streaming_data: Some(StreamingData {
            audio_streams: partition.audio,
            video_streams: partition.video,
            ..streaming.clone()
        }),
        ..config.clone()
    }
}
