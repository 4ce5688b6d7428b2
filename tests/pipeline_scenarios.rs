/// End-to-end pipeline scenarios with in-memory collaborators.
///
/// These tests drive `Mirror` through the default descriptor table with a
/// fake fetcher (canned responses per endpoint) and a recording sink, so
/// they cover fetch → decode → validate → map → publish without network or
/// storage access.
///
/// Run with: cargo test --test pipeline_scenarios

use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::{Value, json};

use twr_mirror::error::{FetchError, MirrorError, PublishError, ValidationReason};
use twr_mirror::handler;
use twr_mirror::model::{PublishMode, SourceDescriptor};
use twr_mirror::pipeline::{LaneState, Mirror};
use twr_mirror::sink::{DirectorySink, Sink};
use twr_mirror::sources::default_sources;
use twr_mirror::ingest::Fetcher;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// Serves canned responses by endpoint and remembers what was requested.
#[derive(Default)]
struct FakeFetcher {
    responses: HashMap<String, Result<Vec<u8>, FetchError>>,
    requested: RefCell<Vec<String>>,
}

impl FakeFetcher {
    fn respond(mut self, source: &SourceDescriptor, response: Result<Vec<u8>, FetchError>) -> Self {
        self.responses.insert(source.endpoint.clone(), response);
        self
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, endpoint: &str) -> Result<Vec<u8>, FetchError> {
        self.requested.borrow_mut().push(endpoint.to_string());
        self.responses
            .get(endpoint)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Status("404 Not Found".to_string())))
    }
}

#[derive(Default)]
struct RecordingSink {
    objects: RefCell<HashMap<String, Vec<u8>>>,
}

impl RecordingSink {
    fn object(&self, key: &str) -> Option<Value> {
        self.objects
            .borrow()
            .get(key)
            .map(|bytes| serde_json::from_slice(bytes).expect("published object must be JSON"))
    }

    fn count(&self) -> usize {
        self.objects.borrow().len()
    }
}

impl Sink for RecordingSink {
    fn publish(&self, key: &str, bytes: &[u8]) -> Result<(), PublishError> {
        self.objects.borrow_mut().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

fn daily_record() -> Value {
    json!({
        "reservoiridentifier": "10201",
        "reservoirname": "石門水庫",
        "recordtime": "2024-05-01T00:00:00",
        "catchmentarearainfall": "3.2",
        "inflowvolume": "102.44",
        "outflow": "88.1",
        "outflowdischarge": "70.0",
        "outflowtotal": "158.1",
        "crossflow": "0",
        "regulatorydischarge": "0",
        "deadstoragelevel": "195",
        "fullwaterlevel": "245",
        "effectivecapacity": "20526.46"
    })
}

fn water_record() -> Value {
    json!({
        "reservoiridentifier": "10201",
        "observationtime": "2024-05-01T13:00:00",
        "statustype": "1",
        "waterlevel": "245.31",
        "effectivewaterstoragecapacity": "20455.6",
        "inflowdischarge": "12.5",
        "totaloutflow": "8.1",
        "accumulaterainfallincatchment": "0",
        "spillwayoutflow": "0",
        "poweroutletoutflow": "8.1",
        "desiltingtunneloutflow": "0",
        "drainagetunneloutflow": "0",
        "othersoutflow": "0"
    })
}

fn bytes(value: Value) -> Result<Vec<u8>, FetchError> {
    Ok(serde_json::to_vec(&value).unwrap())
}

// ---------------------------------------------------------------------------
// Scenario A: valid payloads are mapped and published
// ---------------------------------------------------------------------------

#[test]
fn test_valid_daily_statistics_are_published_as_mapped_array() {
    let sources = default_sources();
    let fetcher = FakeFetcher::default()
        .respond(&sources[0], bytes(json!([daily_record()])))
        .respond(&sources[1], bytes(json!([water_record(), water_record()])));
    let mirror = Mirror::new(fetcher, RecordingSink::default(), sources);

    let report = mirror.run();

    assert!(report.is_success(), "run failed: {:?}", report.outcome());
    assert_eq!(mirror.sink().count(), 2);

    let daily = mirror.sink().object("twrData.json").expect("twrData.json should be published");
    let daily = daily.as_array().unwrap();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0]["reservoirIdentifier"], "10201");
    assert_eq!(daily[0]["reservoirName"], "石門水庫");
    assert_eq!(daily[0]["inflowVolume"], 102.44);
    assert!(daily[0].get("latestWaterData").is_none());

    let water = mirror.sink().object("twrDataWater.json").unwrap();
    assert_eq!(water.as_array().unwrap().len(), 2);
    assert_eq!(water[0]["waterLevel"], 245.31);

    let response = handler::invoke(&mirror);
    assert_eq!(response.status_code, 200);
}

#[test]
fn test_nested_latest_water_data_is_published() {
    let sources = default_sources();
    let mut record = daily_record();
    record["latestwaterdata"] = water_record();
    let fetcher = FakeFetcher::default()
        .respond(&sources[0], bytes(json!([record])))
        .respond(&sources[1], bytes(json!([water_record()])));
    let mirror = Mirror::new(fetcher, RecordingSink::default(), sources);

    assert!(mirror.run().is_success());
    let daily = mirror.sink().object("twrData.json").unwrap();
    assert_eq!(daily[0]["latestWaterData"]["observationTime"], "2024-05-01T13:00:00");
}

// ---------------------------------------------------------------------------
// Scenario B: empty array
// ---------------------------------------------------------------------------

#[test]
fn test_empty_array_fails_lane_without_publishing() {
    let sources = default_sources();
    let fetcher = FakeFetcher::default()
        .respond(&sources[0], bytes(json!([])))
        .respond(&sources[1], bytes(json!([water_record()])));
    let mirror = Mirror::new(fetcher, RecordingSink::default(), sources);

    let report = mirror.run();

    let err = report.outcome().unwrap_err();
    assert_eq!(err.to_string(), "Data validation failed: JSON array is empty");
    assert!(mirror.sink().object("twrData.json").is_none());
    // The other lane is isolated from the failure.
    assert!(mirror.sink().object("twrDataWater.json").is_some());

    let response = handler::invoke(&mirror);
    assert_eq!(response.status_code, 400);
    assert!(response.body.contains("JSON array is empty"));
}

// ---------------------------------------------------------------------------
// Scenario C: non-JSON payload
// ---------------------------------------------------------------------------

#[test]
fn test_non_json_payload_is_decode_error_with_source_name() {
    let sources = default_sources();
    let fetcher = FakeFetcher::default()
        .respond(&sources[0], bytes(json!([daily_record()])))
        .respond(&sources[1], Ok(b"<html>Service Temporarily Unavailable</html>".to_vec()));
    let mirror = Mirror::new(fetcher, RecordingSink::default(), sources);

    let report = mirror.run();

    let failure = report.first_failure().expect("DataWater lane should fail");
    assert_eq!(failure.source_name, "DataWater");
    assert_eq!(failure.failed_in, LaneState::Decoding);
    match &failure.error {
        MirrorError::Decode(e) => assert_eq!(e.source_name, "DataWater"),
        other => panic!("expected a decode error, got {:?}", other),
    }
    assert!(mirror.sink().object("twrDataWater.json").is_none());
}

// ---------------------------------------------------------------------------
// Scenario D: second lane transport failure
// ---------------------------------------------------------------------------

#[test]
fn test_second_lane_http_500_keeps_first_lane_published() {
    let sources = default_sources();
    let fetcher = FakeFetcher::default()
        .respond(&sources[0], bytes(json!([daily_record()])))
        .respond(
            &sources[1],
            Err(FetchError::Status("500 Internal Server Error".to_string())),
        );
    let mirror = Mirror::new(fetcher, RecordingSink::default(), sources);

    let report = mirror.run();

    assert!(mirror.sink().object("twrData.json").is_some());
    assert!(mirror.sink().object("twrDataWater.json").is_none());
    assert_eq!(report.published().count(), 1);

    let err = report.outcome().unwrap_err();
    assert_eq!(
        err,
        &MirrorError::Transport {
            source_name: "DataWater".to_string(),
            error: FetchError::Status("500 Internal Server Error".to_string()),
        }
    );
}

// ---------------------------------------------------------------------------
// Shape drift
// ---------------------------------------------------------------------------

#[test]
fn test_renamed_upstream_field_is_reported_as_missing() {
    let sources = default_sources();
    let mut drifted = water_record();
    let level = drifted.as_object_mut().unwrap().remove("waterlevel").unwrap();
    drifted["water_level"] = level;
    let fetcher = FakeFetcher::default()
        .respond(&sources[0], bytes(json!([daily_record()])))
        .respond(&sources[1], bytes(json!([drifted])));
    let mirror = Mirror::new(fetcher, RecordingSink::default(), sources);

    let report = mirror.run();

    match report.outcome().unwrap_err() {
        MirrorError::Validation(e) => {
            assert_eq!(e.reason, ValidationReason::Missing("waterlevel".to_string()));
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
}

#[test]
fn test_added_upstream_field_is_reported_as_unexpected() {
    let sources = default_sources();
    let mut drifted = daily_record();
    drifted["basinrainfall"] = json!("1.0");
    let fetcher = FakeFetcher::default()
        .respond(&sources[0], bytes(json!([drifted])))
        .respond(&sources[1], bytes(json!([water_record()])));
    let mirror = Mirror::new(fetcher, RecordingSink::default(), sources);

    let err = mirror.run().outcome().unwrap_err().to_string();
    assert_eq!(err, "Data validation failed: mismatch field 'basinrainfall' (unexpected)");
}

#[test]
fn test_every_lane_is_attempted_in_order() {
    let sources = default_sources();
    let mirror = Mirror::new(FakeFetcher::default(), RecordingSink::default(), sources.clone());

    let report = mirror.run();

    let requested = mirror.fetcher().requested.borrow().clone();
    let expected: Vec<String> = sources.iter().map(|s| s.endpoint.clone()).collect();
    assert_eq!(requested, expected);
    assert_eq!(report.lanes.len(), 2);
    assert_eq!(report.outcome().unwrap_err().source_name(), "Data");
}

// ---------------------------------------------------------------------------
// Passthrough mode with a real directory sink
// ---------------------------------------------------------------------------

#[test]
fn test_passthrough_lane_writes_verbatim_bytes_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut sources = default_sources();
    for source in &mut sources {
        source.mode = PublishMode::Passthrough;
    }
    let daily_bytes = serde_json::to_vec_pretty(&json!([daily_record()])).unwrap();
    let fetcher = FakeFetcher::default()
        .respond(&sources[0], Ok(daily_bytes.clone()))
        .respond(&sources[1], bytes(json!([water_record()])));
    let mirror = Mirror::new(fetcher, DirectorySink::new(dir.path()), sources);

    assert!(mirror.run().is_success());
    assert_eq!(std::fs::read(dir.path().join("twrData.json")).unwrap(), daily_bytes);
}
