//! # rytex - Rust Video Stream Extractor
//!
//! Resolves playable stream URLs and metadata for a video from its public
//! watch page.
//!
//! ## Features
//!
//! - Player config extraction from current and legacy page layouts
//! - Signature decryption by interpreting the player script
//! - Age-gate fallback through the embed page
//! - Adaptive stream classification into audio and video
//! - Subtitle retrieval for every listed language
//!
//! ## Example
//!
//! ```rust,no_run
//! use rytex::Extractor;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = Extractor::new()?;
//!     let config = extractor.extract("dQw4w9WgXcQ").await?;
//!
//!     if let Some(streaming) = &config.streaming_data {
//!         println!("{} audio streams", streaming.audio_streams.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod platform;
pub mod utils;

// Re-export main types
pub use self::core::{ExtractionOutcome, Extractor, PlayerConfig, StreamDescriptor, Subtitle, SubtitleMap};
pub use error::{ExtractionError, RytexError, Stage};
pub use platform::{Endpoints, HttpClientConfig, HttpFetcher, PageFetcher};

/// Result type alias for rytex operations
pub type Result<T> = std::result::Result<T, RytexError>;
