//! Utility functions for rytex

pub mod mime;
pub mod tolerant;
pub mod url;

pub use self::mime::*;
pub use self::url::*;
