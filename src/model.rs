/// Core data types for the reservoir open-data mirror.
///
/// This module defines the shared domain model imported by all other modules:
/// the source descriptor that configures a lane, and the internal record
/// types published to object storage. It contains no logic and no I/O.

use serde::{Deserialize, Serialize};

use crate::schema::Schema;

// ---------------------------------------------------------------------------
// Object keys
// ---------------------------------------------------------------------------

/// Object key of the mirrored daily operational statistics.
pub const KEY_DAILY_STATISTICS: &str = "twrData.json";

/// Object key of the mirrored reservoir water-condition records.
pub const KEY_RESERVOIR_CONDITION: &str = "twrDataWater.json";

// ---------------------------------------------------------------------------
// Source descriptors
// ---------------------------------------------------------------------------

/// Which internal record type a source is mapped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    DailyOperationalStatistics,
    ReservoirConditionData,
}

/// What a lane uploads once validation passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublishMode {
    /// Map every element into the internal record type and publish those.
    #[default]
    Remap,
    /// Publish the upstream bytes verbatim.
    Passthrough,
}

/// One mirrored feed. Immutable once configuration is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDescriptor {
    /// Logical name, embedded in every error raised by this lane.
    pub name: String,
    /// HTTP(S) endpoint returning a JSON array.
    pub endpoint: String,
    /// Structural contract checked against the first element.
    pub schema: Schema,
    /// Object key the lane publishes to.
    pub key: String,
    pub kind: RecordKind,
    pub mode: PublishMode,
}

// ---------------------------------------------------------------------------
// Internal records
// ---------------------------------------------------------------------------

/// A reservoir's water-condition observation.
///
/// Text fields are empty when the upstream value was absent; measurements
/// are `None` when the upstream value was absent or not numeric.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservoirConditionData {
    pub reservoir_identifier: String,
    pub observation_time: String,
    pub status_type: String,
    pub water_level: Option<f64>,                   // m
    pub effective_water_storage_capacity: Option<f64>, // 10^4 m3
    pub inflow_discharge: Option<f64>,              // m3/s
    pub total_outflow: Option<f64>,                 // m3/s
    pub accumulate_rainfall_in_catchment: Option<f64>, // mm
    pub spillway_outflow: Option<f64>,
    pub power_outlet_outflow: Option<f64>,
    pub desilting_tunnel_outflow: Option<f64>,
    pub drainage_tunnel_outflow: Option<f64>,
    pub others_outflow: Option<f64>,
}

/// One reservoir's operational statistics for a day.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyOperationalStatistics {
    pub reservoir_identifier: String,
    pub reservoir_name: String,
    pub record_time: String,
    pub catchment_area_rainfall: Option<f64>,
    pub inflow_volume: Option<f64>,
    pub outflow: Option<f64>,
    pub outflow_discharge: Option<f64>,
    pub outflow_total: Option<f64>,
    pub cross_flow: Option<f64>,
    pub regulatory_discharge: Option<f64>,
    pub dead_storage_level: Option<f64>,
    pub full_water_level: Option<f64>,
    pub effective_capacity: Option<f64>,
    /// Most recent water-condition observation, when upstream embeds one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_water_data: Option<ReservoirConditionData>,
}

/// The mapped contents of one lane, ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MappedRecords {
    DailyOperationalStatistics(Vec<DailyOperationalStatistics>),
    ReservoirConditionData(Vec<ReservoirConditionData>),
}

impl MappedRecords {
    pub fn len(&self) -> usize {
        match self {
            MappedRecords::DailyOperationalStatistics(records) => records.len(),
            MappedRecords::ReservoirConditionData(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
