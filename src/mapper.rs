/// Projection of raw upstream records onto the internal record types.
///
/// Mapping never fails. Once the representative element passed shape
/// validation, individual values are coerced rather than rejected: text
/// fields fall back to an empty string, measurements to `None`.

use serde_json::Value;

use crate::model::{DailyOperationalStatistics, MappedRecords, RecordKind, ReservoirConditionData};

// ---------------------------------------------------------------------------
// Coercion helpers
// ---------------------------------------------------------------------------

fn text(raw: &Value, field: &str) -> String {
    match raw.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Numbers pass through; numeric strings are parsed after trimming.
/// Non-finite results ("NaN", "inf", "1e999") have no JSON form and map to
/// `None`.
fn number(raw: &Value, field: &str) -> Option<f64> {
    let parsed = match raw.get(field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Record mappers
// ---------------------------------------------------------------------------

pub fn map_reservoir_condition(raw: &Value) -> ReservoirConditionData {
    ReservoirConditionData {
        reservoir_identifier: text(raw, "reservoiridentifier"),
        observation_time: text(raw, "observationtime"),
        status_type: text(raw, "statustype"),
        water_level: number(raw, "waterlevel"),
        effective_water_storage_capacity: number(raw, "effectivewaterstoragecapacity"),
        inflow_discharge: number(raw, "inflowdischarge"),
        total_outflow: number(raw, "totaloutflow"),
        accumulate_rainfall_in_catchment: number(raw, "accumulaterainfallincatchment"),
        spillway_outflow: number(raw, "spillwayoutflow"),
        power_outlet_outflow: number(raw, "poweroutletoutflow"),
        desilting_tunnel_outflow: number(raw, "desiltingtunneloutflow"),
        drainage_tunnel_outflow: number(raw, "drainagetunneloutflow"),
        others_outflow: number(raw, "othersoutflow"),
    }
}

pub fn map_daily_statistics(raw: &Value) -> DailyOperationalStatistics {
    let latest_water_data = raw
        .get("latestwaterdata")
        .filter(|nested| nested.is_object())
        .map(map_reservoir_condition);

    DailyOperationalStatistics {
        reservoir_identifier: text(raw, "reservoiridentifier"),
        reservoir_name: text(raw, "reservoirname"),
        record_time: text(raw, "recordtime"),
        catchment_area_rainfall: number(raw, "catchmentarearainfall"),
        inflow_volume: number(raw, "inflowvolume"),
        outflow: number(raw, "outflow"),
        outflow_discharge: number(raw, "outflowdischarge"),
        outflow_total: number(raw, "outflowtotal"),
        cross_flow: number(raw, "crossflow"),
        regulatory_discharge: number(raw, "regulatorydischarge"),
        dead_storage_level: number(raw, "deadstoragelevel"),
        full_water_level: number(raw, "fullwaterlevel"),
        effective_capacity: number(raw, "effectivecapacity"),
        latest_water_data,
    }
}

/// Maps every element, not just the one that was validated.
pub fn map_records(kind: RecordKind, raw: &[Value]) -> MappedRecords {
    match kind {
        RecordKind::DailyOperationalStatistics => {
            MappedRecords::DailyOperationalStatistics(raw.iter().map(map_daily_statistics).collect())
        }
        RecordKind::ReservoirConditionData => {
            MappedRecords::ReservoirConditionData(raw.iter().map(map_reservoir_condition).collect())
        }
    }
}
