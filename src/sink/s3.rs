/// S3-compatible object storage sink.
///
/// Every object is written with a plain PUT: no conditional headers, no
/// versioning, last writer wins. Objects are exposed with a public-read ACL
/// because the mirror exists to be downloaded by anonymous clients.

use ::s3::bucket::Bucket;
use ::s3::creds::Credentials;
use ::s3::region::Region;
use serde::Deserialize;

use super::Sink;
use crate::error::{ConfigError, PublishError};

pub const ENV_ACCESS_KEY: &str = "S3_ACCESS_KEY";
pub const ENV_SECRET_KEY: &str = "S3_SECRET_KEY";
pub const ENV_BUCKET: &str = "S3_BUCKET";

const CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct S3SinkConfig {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for non-AWS stores (MinIO, R2, ...).
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub path_style: bool,
    #[serde(default = "default_public_read")]
    pub public_read: bool,
}

fn default_public_read() -> bool {
    true
}

/// Access keys, loaded from the environment (and `.env`) rather than the
/// config file.
#[derive(Clone)]
pub struct S3Credentials {
    pub access_key: String,
    pub secret_key: String,
    /// Overrides the configured bucket name when set.
    pub bucket: Option<String>,
}

impl std::fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl S3Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let access_key = std::env::var(ENV_ACCESS_KEY).map_err(|_| ConfigError::MissingEnv(ENV_ACCESS_KEY))?;
        let secret_key = std::env::var(ENV_SECRET_KEY).map_err(|_| ConfigError::MissingEnv(ENV_SECRET_KEY))?;
        let bucket = std::env::var(ENV_BUCKET).ok().filter(|b| !b.is_empty());
        Ok(S3Credentials {
            access_key,
            secret_key,
            bucket,
        })
    }
}

pub struct S3Sink {
    bucket: Bucket,
}

impl S3Sink {
    pub fn new(config: &S3SinkConfig, credentials: &S3Credentials) -> Result<Self, ConfigError> {
        let client_error = |cause: String| ConfigError::Client {
            component: "S3 bucket",
            cause,
        };

        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse::<Region>()
                .map_err(|e| client_error(e.to_string()))?,
        };

        let creds = Credentials::new(
            Some(credentials.access_key.as_str()),
            Some(credentials.secret_key.as_str()),
            None,
            None,
            None,
        )
        .map_err(|e| client_error(e.to_string()))?;

        let name = credentials.bucket.as_deref().unwrap_or(&config.bucket);
        let mut bucket = Bucket::new(name, region, creds).map_err(|e| client_error(e.to_string()))?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }
        if config.public_read {
            bucket.add_header("x-amz-acl", "public-read");
        }

        Ok(S3Sink { bucket })
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket.name
    }
}

impl Sink for S3Sink {
    fn publish(&self, key: &str, bytes: &[u8]) -> Result<(), PublishError> {
        let publish_error = |cause: String| PublishError {
            key: key.to_string(),
            cause,
        };

        let response = self
            .bucket
            .put_object_with_content_type(format!("/{}", key), bytes, CONTENT_TYPE)
            .map_err(|e| publish_error(e.to_string()))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(publish_error(format!("HTTP {}", status)));
        }
        Ok(())
    }
}
