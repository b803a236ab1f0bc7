//! Command line interface for the rytex binary

pub mod args;
pub mod output;
pub mod retry;

pub use args::{Args, VerbosityLevel};
pub use output::OutputFormatter;
pub use retry::{RetryConfig, RetryConfigBuilder, RetryExecutor};
