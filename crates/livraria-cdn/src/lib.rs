//! Remote image store client and the image ingestion pipeline.
//!
//! The client speaks the store's HTTP API (multipart upload, name lookup,
//! delete) behind the [`RemoteImageStore`] trait; the pipeline orchestrates
//! validate → transform → replace-old → upload and owns the TTL cache that
//! fronts name→file-id lookups.

pub mod client;
pub mod pipeline;

pub use client::{CdnClient, CdnError, RemoteFile, RemoteImageStore};
pub use pipeline::ImagePipeline;
