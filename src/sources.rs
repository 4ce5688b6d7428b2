/// Source registry for the reservoir open-data mirror.
///
/// Defines the canonical feeds mirrored by this service, with the object
/// key each one is published under. This is the default descriptor table;
/// a config file may replace it (see `config`), but object keys should be
/// referenced from here rather than hardcoded elsewhere.

use crate::model::{
    KEY_DAILY_STATISTICS, KEY_RESERVOIR_CONDITION, PublishMode, RecordKind, SourceDescriptor,
};
use crate::schema;

// ---------------------------------------------------------------------------
// Source metadata
// ---------------------------------------------------------------------------

/// A built-in mirrored feed.
pub struct SourceDefinition {
    /// Logical name, used in logs and error messages.
    pub name: &'static str,
    /// Human-readable description of the dataset.
    pub description: &'static str,
    /// WRA open data API endpoint (JSON format, oldest import first).
    pub endpoint: &'static str,
    /// Object key of the mirrored copy.
    pub key: &'static str,
    pub kind: RecordKind,
}

/// All feeds mirrored by default, in the order lanes run.
///
/// Source: Water Resources Agency open data platform (opendata.wra.gov.tw).
pub static SOURCE_REGISTRY: &[SourceDefinition] = &[
    SourceDefinition {
        name: "Data",
        description: "Daily operational statistics of reservoirs: rainfall, \
                      inflow, outflow and effective capacity per reservoir.",
        endpoint: "https://opendata.wra.gov.tw/api/v2/51023e88-4c76-4dbc-bbb9-470da690d539?sort=_importdate%20asc&format=JSON",
        key: KEY_DAILY_STATISTICS,
        kind: RecordKind::DailyOperationalStatistics,
    },
    SourceDefinition {
        name: "DataWater",
        description: "Reservoir water-condition observations: water level, \
                      storage and per-outlet discharge.",
        endpoint: "https://opendata.wra.gov.tw/api/v2/2be9044c-6e44-4856-aad5-dd108c2e6679?sort=_importdate%20asc&format=JSON",
        key: KEY_RESERVOIR_CONDITION,
        kind: RecordKind::ReservoirConditionData,
    },
];

/// The built-in schema matching a record kind.
pub fn schema_for(kind: RecordKind) -> schema::Schema {
    match kind {
        RecordKind::DailyOperationalStatistics => schema::daily_operational_statistics(),
        RecordKind::ReservoirConditionData => schema::reservoir_condition_data(),
    }
}

impl SourceDefinition {
    pub fn descriptor(&self) -> SourceDescriptor {
        SourceDescriptor {
            name: self.name.to_string(),
            endpoint: self.endpoint.to_string(),
            schema: schema_for(self.kind),
            key: self.key.to_string(),
            kind: self.kind,
            mode: PublishMode::Remap,
        }
    }
}

/// Descriptors for every registry entry, ready for a `Mirror`.
pub fn default_sources() -> Vec<SourceDescriptor> {
    SOURCE_REGISTRY.iter().map(SourceDefinition::descriptor).collect()
}

/// Looks up a feed by logical name. Returns `None` if not found.
pub fn find_source(name: &str) -> Option<&'static SourceDefinition> {
    SOURCE_REGISTRY.iter().find(|s| s.name == name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
