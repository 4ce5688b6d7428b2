/// Error taxonomy for the mirroring pipeline.
///
/// Each pipeline stage has its own error type. The orchestrator wraps them
/// in `MirrorError`, which always carries the name of the source (lane) that
/// failed so a single log line is enough to diagnose a run.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Stage errors
// ---------------------------------------------------------------------------

/// Transport-level failure while retrieving a source payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The server answered with something other than 200 OK.
    #[error("Download source error: {0}")]
    Status(String),
    /// No response was received (DNS, TLS, connect, body read).
    #[error("request failed: {0}")]
    Request(String),
}

/// The payload was not UTF-8 encoded JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{source_name} decode failed: invalid JSON ({cause})")]
pub struct DecodeError {
    pub source_name: String,
    pub cause: String,
}

/// Why the representative element did not match its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    /// A required field is absent.
    Missing(String),
    /// A field outside a closed schema is present.
    Unexpected(String),
    /// Anything else: wrong container shape, wrong field type.
    Generic(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{source_name} validation failed: {}", describe_reason(.reason))]
pub struct ValidationError {
    pub source_name: String,
    pub reason: ValidationReason,
}

fn describe_reason(reason: &ValidationReason) -> String {
    match reason {
        ValidationReason::Missing(field) => format!("mismatch field '{}' (missing)", field),
        ValidationReason::Unexpected(field) => format!("mismatch field '{}' (unexpected)", field),
        ValidationReason::Generic(message) => message.clone(),
    }
}

impl ValidationError {
    pub fn generic(source_name: &str, message: impl Into<String>) -> Self {
        ValidationError {
            source_name: source_name.to_string(),
            reason: ValidationReason::Generic(message.into()),
        }
    }

    /// The offending field name, when the failure names one.
    pub fn field(&self) -> Option<&str> {
        match &self.reason {
            ValidationReason::Missing(field) | ValidationReason::Unexpected(field) => Some(field),
            ValidationReason::Generic(_) => None,
        }
    }
}

/// The sink did not acknowledge an upload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("upload of '{key}' failed: {cause}")]
pub struct PublishError {
    pub key: String,
    pub cause: String,
}

// ---------------------------------------------------------------------------
// Lane error
// ---------------------------------------------------------------------------

/// Coarse classification used to pick log severity and tag failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// The source moved or changed its shape: decode or validation failed.
    SourceChanged,
    /// The source could not be reached or refused the request.
    Transport,
    /// The mirrored object could not be produced or stored.
    Sink,
}

impl std::fmt::Display for FailureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureType::SourceChanged => write!(f, "SOURCE-CHANGED"),
            FailureType::Transport => write!(f, "TRANSPORT"),
            FailureType::Sink => write!(f, "SINK"),
        }
    }
}

/// Any failure of a single lane, tagged with the source it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MirrorError {
    #[error("{source_name} {error}")]
    Transport {
        source_name: String,
        #[source]
        error: FetchError,
    },
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{source_name} serialization failed: {cause}")]
    Serialize { source_name: String, cause: String },
    #[error("{source_name} {error}")]
    Publish {
        source_name: String,
        #[source]
        error: PublishError,
    },
}

impl MirrorError {
    pub fn source_name(&self) -> &str {
        match self {
            MirrorError::Transport { source_name, .. }
            | MirrorError::Serialize { source_name, .. }
            | MirrorError::Publish { source_name, .. } => source_name,
            MirrorError::Decode(e) => &e.source_name,
            MirrorError::Validation(e) => &e.source_name,
        }
    }

    pub fn failure_type(&self) -> FailureType {
        match self {
            MirrorError::Transport { .. } => FailureType::Transport,
            MirrorError::Decode(_) | MirrorError::Validation(_) => FailureType::SourceChanged,
            MirrorError::Serialize { .. } | MirrorError::Publish { .. } => FailureType::Sink,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("source '{source_name}' references unknown schema '{schema}'")]
    UnknownSchema { source_name: String, schema: String },
    #[error("duplicate source name '{0}'")]
    DuplicateSource(String),
    #[error("object key '{0}' is used by more than one source")]
    DuplicateKey(String),
    #[error("no sources configured")]
    NoSources,
    #[error("environment variable {0} must be set")]
    MissingEnv(&'static str),
    #[error("cannot build {component}: {cause}")]
    Client { component: &'static str, cause: String },
}
