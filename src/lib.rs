//! Scheduled mirror of the WRA reservoir open-data feeds into object storage.
//!
//! Each configured source is fetched, decoded, shape-checked against its
//! schema, mapped onto a stable record type and published under a fixed
//! object key. See `pipeline` for the lane state machine.

pub mod config;
pub mod error;
pub mod handler;
pub mod ingest;
pub mod logging;
pub mod mapper;
pub mod model;
pub mod pipeline;
pub mod schema;
pub mod sink;
pub mod sources;
pub mod validate;
pub mod verify;

pub use error::{ConfigError, MirrorError};
pub use pipeline::{Mirror, RunReport};
