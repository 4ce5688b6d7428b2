//! Mirror configuration.
//!
//! Everything that may change without a code change lives in a TOML file:
//! endpoints, object keys, schema overrides, the sink, HTTP and logging
//! settings. Secrets do not; S3 keys come from the environment (see
//! `sink::s3`).
//!
//! ```toml
//! [sink]
//! kind = "s3"
//! bucket = "twr-open-data"
//! region = "ap-northeast-1"
//!
//! [[sources]]
//! name = "Data"
//! endpoint = "https://opendata.wra.gov.tw/api/v2/...&format=JSON"
//! key = "twrData.json"
//! kind = "daily-operational-statistics"
//! ```
//!
//! Without any `[[sources]]` entry the built-in registry is mirrored.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::ingest::{HttpConfig, HttpFetcher};
use crate::logging::LoggingConfig;
use crate::model::{PublishMode, RecordKind, SourceDescriptor};
use crate::pipeline::Mirror;
use crate::schema::{self, Schema};
use crate::sink::{self, Sink, SinkConfig};
use crate::sources;

pub const DEFAULT_CONFIG_PATH: &str = "./mirror.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MirrorConfig {
    #[serde(default)]
    pub http: HttpConfig,
    pub sink: SinkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Schema overrides, looked up by name before the built-ins.
    #[serde(default)]
    pub schemas: Vec<Schema>,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// One `[[sources]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub name: String,
    pub endpoint: String,
    pub key: String,
    pub kind: RecordKind,
    #[serde(default)]
    pub mode: PublishMode,
    /// Schema name; defaults to the built-in schema of `kind`.
    pub schema: Option<String>,
    /// Overrides whether undeclared fields are rejected.
    pub closed: Option<bool>,
}

/// Reads and parses a config file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MirrorConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    MirrorConfig::from_toml(&text, &path.display().to_string())
}

impl MirrorConfig {
    pub fn from_toml(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    fn find_schema(&self, name: &str) -> Option<Schema> {
        self.schemas
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .or_else(|| schema::builtin(name))
    }

    /// Resolves the descriptor table. Every source gets exactly one schema
    /// and one object key; names and keys must be unique.
    pub fn descriptors(&self) -> Result<Vec<SourceDescriptor>, ConfigError> {
        if self.sources.is_empty() {
            return Ok(sources::default_sources());
        }

        let mut names = HashSet::new();
        let mut keys = HashSet::new();
        let mut descriptors = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            if !names.insert(source.name.as_str()) {
                return Err(ConfigError::DuplicateSource(source.name.clone()));
            }
            if !keys.insert(source.key.as_str()) {
                return Err(ConfigError::DuplicateKey(source.key.clone()));
            }

            let schema_name = source
                .schema
                .clone()
                .unwrap_or_else(|| sources::schema_for(source.kind).name);
            let mut schema = self
                .find_schema(&schema_name)
                .ok_or_else(|| ConfigError::UnknownSchema {
                    source_name: source.name.clone(),
                    schema: schema_name.clone(),
                })?;
            if let Some(closed) = source.closed {
                schema.closed = closed;
            }

            descriptors.push(SourceDescriptor {
                name: source.name.clone(),
                endpoint: source.endpoint.clone(),
                schema,
                key: source.key.clone(),
                kind: source.kind,
                mode: source.mode,
            });
        }

        Ok(descriptors)
    }

    /// Constructs the fetcher, sink and descriptor table once, for injection
    /// into the orchestrator.
    pub fn build_mirror(&self) -> Result<Mirror<HttpFetcher, Box<dyn Sink>>, ConfigError> {
        let descriptors = self.descriptors()?;
        if descriptors.is_empty() {
            return Err(ConfigError::NoSources);
        }
        let fetcher = HttpFetcher::new(&self.http)?;
        let sink = sink::build_sink(&self.sink)?;
        Ok(Mirror::new(fetcher, sink, descriptors))
    }
}
