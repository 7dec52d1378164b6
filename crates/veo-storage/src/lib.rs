//! Publishing of generated videos to S3-compatible object storage.
//!
//! Works with AWS S3 and DigitalOcean Spaces. Objects are written with a
//! `public-read` ACL and addressed as `{endpoint}/{bucket}/{key}`.

pub mod client;
pub mod error;

pub use client::{object_key, SpacesClient, SpacesConfig, VideoPublisher};
pub use error::{StorageError, StorageResult};
