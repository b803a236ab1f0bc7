//! Core functionality for rytex

pub mod extractor;
pub mod player_config;

pub use extractor::*;
pub use player_config::*;
