//! Video platform protocol boundary: fetching, site patterns and the
//! extraction stages that depend on them

pub mod cipher;
pub mod client;
pub mod page;
pub mod patterns;
pub mod playability;
pub mod player;
pub mod streams;
pub mod subtitles;

pub use cipher::{streams_are_ciphered, Operation, OperationSequence, SignatureInterpreter};
pub use client::{Endpoints, HttpClientConfig, HttpFetcher, PageFetcher};
pub use page::ConfigExtractor;
pub use playability::{classify, Playability};
pub use player::{PlayerCodeReference, PlayerCodeResolver};
pub use streams::{classify_streams, partition_streams, StreamPartition, StreamReconstructor};
