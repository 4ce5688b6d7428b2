/// Log output of a full mirror run.
///
/// A run must end with exactly one terminal line from the orchestrator:
/// "File mirroring success!" or "File mirroring failed: <first error>".
/// Lane counts are debug-only. This file installs a capturing global
/// logger, so it holds a single test.
///
/// Run with: cargo test --test run_logging

use std::collections::HashMap;
use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record};
use serde_json::json;

use twr_mirror::error::{FetchError, PublishError};
use twr_mirror::ingest::Fetcher;
use twr_mirror::pipeline::Mirror;
use twr_mirror::sink::Sink;
use twr_mirror::sources::default_sources;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

struct CapturingLogger {
    lines: Mutex<Vec<(Level, String)>>,
}

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if record.target() == "twr_mirror" {
            self.lines
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger {
    lines: Mutex::new(Vec::new()),
};

fn take_lines() -> Vec<(Level, String)> {
    std::mem::take(&mut *LOGGER.lines.lock().unwrap())
}

/// Orchestrator lines at info or above.
fn terminal_lines(lines: &[(Level, String)]) -> Vec<String> {
    lines
        .iter()
        .filter(|(level, message)| *level <= Level::Info && message.starts_with("RUN"))
        .map(|(_, message)| message.clone())
        .collect()
}

struct CannedFetcher(HashMap<String, Result<Vec<u8>, FetchError>>);

impl Fetcher for CannedFetcher {
    fn fetch(&self, endpoint: &str) -> Result<Vec<u8>, FetchError> {
        self.0
            .get(endpoint)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Status("500 Internal Server Error".to_string())))
    }
}

struct NullSink;

impl Sink for NullSink {
    fn publish(&self, _key: &str, _bytes: &[u8]) -> Result<(), PublishError> {
        Ok(())
    }
}

fn valid_payloads() -> CannedFetcher {
    let sources = default_sources();
    let daily = json!([{
        "reservoiridentifier": "10201", "reservoirname": "石門水庫",
        "recordtime": "2024-05-01T00:00:00", "catchmentarearainfall": "3.2",
        "inflowvolume": "102.44", "outflow": "88.1", "outflowdischarge": "70.0",
        "outflowtotal": "158.1", "crossflow": "0", "regulatorydischarge": "0",
        "deadstoragelevel": "195", "fullwaterlevel": "245", "effectivecapacity": "20526.46"
    }]);
    let water = json!([{
        "reservoiridentifier": "10201", "observationtime": "2024-05-01T13:00:00",
        "statustype": "1", "waterlevel": "245.31", "effectivewaterstoragecapacity": "20455.6",
        "inflowdischarge": "12.5", "totaloutflow": "8.1", "accumulaterainfallincatchment": "0",
        "spillwayoutflow": "0", "poweroutletoutflow": "8.1", "desiltingtunneloutflow": "0",
        "drainagetunneloutflow": "0", "othersoutflow": "0"
    }]);

    let mut responses = HashMap::new();
    responses.insert(sources[0].endpoint.clone(), Ok(serde_json::to_vec(&daily).unwrap()));
    responses.insert(sources[1].endpoint.clone(), Ok(serde_json::to_vec(&water).unwrap()));
    CannedFetcher(responses)
}

// ---------------------------------------------------------------------------
// Terminal line
// ---------------------------------------------------------------------------

#[test]
fn test_run_logs_exactly_one_terminal_line() {
    log::set_logger(&LOGGER).expect("no other logger in this test binary");
    log::set_max_level(LevelFilter::Trace);

    // Success: every lane published.
    let mirror = Mirror::new(valid_payloads(), NullSink, default_sources());
    assert!(mirror.run().is_success());
    let lines = take_lines();
    assert_eq!(terminal_lines(&lines), vec!["RUN: File mirroring success!".to_string()]);
    assert_eq!(lines.last().map(|(_, m)| m.as_str()), Some("RUN: File mirroring success!"));
    assert!(
        lines
            .iter()
            .any(|(level, m)| *level == Level::Debug && m.contains("2/2 lanes mirrored"))
    );

    // Failure: both lanes answer HTTP 500, the first error is reported once.
    let mirror = Mirror::new(CannedFetcher(HashMap::new()), NullSink, default_sources());
    assert!(!mirror.run().is_success());
    let lines = take_lines();
    let expected = "RUN: File mirroring failed: Data Download source error: 500 Internal Server Error";
    assert_eq!(terminal_lines(&lines), vec![expected.to_string()]);
    assert_eq!(lines.last(), Some(&(Level::Error, expected.to_string())));
}
