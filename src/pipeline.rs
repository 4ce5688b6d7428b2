//! Pipeline orchestration.
//!
//! Each configured source runs as an independent lane:
//!
//! ```text
//! Idle → Fetching → Decoding → Validating → Mapping → Serializing → Publishing → Done
//! ```
//!
//! and any state may end in `Failed`. Lanes run one after another on the
//! calling thread. A failed lane never stops or rolls back the others; the
//! run as a whole fails if any lane did, citing the first error.

use std::fmt;

use serde_json::Value;

use crate::error::MirrorError;
use crate::ingest::{Fetcher, decode};
use crate::logging::{self, Component};
use crate::mapper;
use crate::model::{PublishMode, SourceDescriptor};
use crate::sink::Sink;
use crate::validate::validate_shape;

// ---------------------------------------------------------------------------
// Lane state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneState {
    Idle,
    Fetching,
    Decoding,
    Validating,
    Mapping,
    Serializing,
    Publishing,
    Done,
    Failed,
}

impl fmt::Display for LaneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LaneState::Idle => "idle",
            LaneState::Fetching => "fetching",
            LaneState::Decoding => "decoding",
            LaneState::Validating => "validating",
            LaneState::Mapping => "mapping",
            LaneState::Serializing => "serializing",
            LaneState::Publishing => "publishing",
            LaneState::Done => "done",
            LaneState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Tracks where a lane is, so a failure can report the stage it died in.
struct Lane<'a> {
    source: &'a SourceDescriptor,
    state: LaneState,
}

impl<'a> Lane<'a> {
    fn new(source: &'a SourceDescriptor) -> Self {
        Lane {
            source,
            state: LaneState::Idle,
        }
    }

    fn enter(&mut self, next: LaneState) {
        logging::debug(
            Component::Orchestrator,
            Some(&self.source.name),
            &format!("{} -> {}", self.state, next),
        );
        self.state = next;
    }

    fn fail(&mut self, error: MirrorError) -> LaneFailure {
        let failed_in = self.state;
        logging::log_lane_failure(&error);
        self.enter(LaneState::Failed);
        LaneFailure {
            source_name: self.source.name.clone(),
            failed_in,
            error,
        }
    }
}

// ---------------------------------------------------------------------------
// Lane and run outcomes
// ---------------------------------------------------------------------------

/// A lane that reached `Done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneReport {
    pub source_name: String,
    pub key: String,
    /// Elements in the upstream array.
    pub records: usize,
    /// Size of the published object.
    pub bytes: usize,
}

/// A lane that ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneFailure {
    pub source_name: String,
    /// The state the lane was in when the error occurred.
    pub failed_in: LaneState,
    pub error: MirrorError,
}

pub type LaneOutcome = Result<LaneReport, LaneFailure>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// One outcome per source, in run order.
    pub lanes: Vec<LaneOutcome>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.lanes.iter().all(|lane| lane.is_ok())
    }

    pub fn first_failure(&self) -> Option<&LaneFailure> {
        self.lanes.iter().find_map(|lane| lane.as_ref().err())
    }

    /// `Ok` when every lane completed, otherwise the first lane error.
    pub fn outcome(&self) -> Result<(), &MirrorError> {
        match self.first_failure() {
            Some(failure) => Err(&failure.error),
            None => Ok(()),
        }
    }

    pub fn published(&self) -> impl Iterator<Item = &LaneReport> {
        self.lanes.iter().filter_map(|lane| lane.as_ref().ok())
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Runs every configured source through fetch, decode, validate, map and
/// publish. The fetcher, sink and descriptor table are injected.
pub struct Mirror<F, S> {
    fetcher: F,
    sink: S,
    sources: Vec<SourceDescriptor>,
}

impl<F: Fetcher, S: Sink> Mirror<F, S> {
    pub fn new(fetcher: F, sink: S, sources: Vec<SourceDescriptor>) -> Self {
        Mirror {
            fetcher,
            sink,
            sources,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Runs all lanes sequentially and logs one terminal line.
    pub fn run(&self) -> RunReport {
        let lanes: Vec<LaneOutcome> = self.sources.iter().map(|source| self.run_lane(source)).collect();
        let report = RunReport { lanes };

        let failed = report.lanes.iter().filter(|lane| lane.is_err()).count();
        logging::log_run_summary(report.lanes.len(), report.lanes.len() - failed, failed);

        match report.outcome() {
            Ok(()) => logging::info(Component::Orchestrator, None, "File mirroring success!"),
            Err(err) => logging::error(
                Component::Orchestrator,
                None,
                &format!("File mirroring failed: {}", err),
            ),
        }

        report
    }

    /// Runs one source end to end.
    pub fn run_lane(&self, source: &SourceDescriptor) -> LaneOutcome {
        let mut lane = Lane::new(source);

        lane.enter(LaneState::Fetching);
        let payload = self
            .fetcher
            .fetch(&source.endpoint)
            .map_err(|error| {
                lane.fail(MirrorError::Transport {
                    source_name: source.name.clone(),
                    error,
                })
            })?;

        lane.enter(LaneState::Decoding);
        let decoded = decode(&payload, &source.name).map_err(|e| lane.fail(e.into()))?;

        lane.enter(LaneState::Validating);
        validate_shape(&decoded, &source.schema, &source.name).map_err(|e| lane.fail(e.into()))?;

        let records = decoded.as_array().map(Vec::len).unwrap_or_default();
        let body = match source.mode {
            PublishMode::Passthrough => payload,
            PublishMode::Remap => {
                lane.enter(LaneState::Mapping);
                let raw: &[Value] = match &decoded {
                    Value::Array(items) => items.as_slice(),
                    _ => &[],
                };
                let mapped = mapper::map_records(source.kind, raw);

                lane.enter(LaneState::Serializing);
                serde_json::to_vec(&mapped).map_err(|e| {
                    lane.fail(MirrorError::Serialize {
                        source_name: source.name.clone(),
                        cause: e.to_string(),
                    })
                })?
            }
        };

        lane.enter(LaneState::Publishing);
        self.sink.publish(&source.key, &body).map_err(|error| {
            lane.fail(MirrorError::Publish {
                source_name: source.name.clone(),
                error,
            })
        })?;

        lane.enter(LaneState::Done);
        logging::info(
            Component::Publisher,
            Some(&source.name),
            &format!("published {} records ({} bytes) to {}", records, body.len(), source.key),
        );

        Ok(LaneReport {
            source_name: source.name.clone(),
            key: source.key.clone(),
            records,
            bytes: body.len(),
        })
    }
}
