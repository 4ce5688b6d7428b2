/// Destinations for mirrored objects.
///
/// Submodules:
/// - `s3`    — public-read uploads to an S3-compatible bucket.
/// - `local` — atomic writes into a local directory (dry runs, local mirrors).

pub mod local;
pub mod s3;

use serde::Deserialize;

use crate::error::{ConfigError, PublishError};

pub use local::DirectorySink;
pub use self::s3::{S3Credentials, S3Sink, S3SinkConfig};

/// Stores a finished byte buffer under an object key, overwriting whatever
/// was there. A call either returns after the object is durably visible or
/// fails without exposing a partial object.
pub trait Sink {
    fn publish(&self, key: &str, bytes: &[u8]) -> Result<(), PublishError>;
}

impl<T: Sink + ?Sized> Sink for &T {
    fn publish(&self, key: &str, bytes: &[u8]) -> Result<(), PublishError> {
        (**self).publish(key, bytes)
    }
}

impl<T: Sink + ?Sized> Sink for Box<T> {
    fn publish(&self, key: &str, bytes: &[u8]) -> Result<(), PublishError> {
        (**self).publish(key, bytes)
    }
}

/// `[sink]` section of the mirror configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkConfig {
    S3(S3SinkConfig),
    Directory { path: String },
}

/// Builds the configured sink. S3 credentials come from the environment.
pub fn build_sink(config: &SinkConfig) -> Result<Box<dyn Sink>, ConfigError> {
    match config {
        SinkConfig::S3(s3_config) => {
            let credentials = S3Credentials::from_env()?;
            Ok(Box::new(S3Sink::new(s3_config, &credentials)?))
        }
        SinkConfig::Directory { path } => Ok(Box::new(DirectorySink::new(path))),
    }
}
