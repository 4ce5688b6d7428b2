/// Invocation surface for schedulers.
///
/// Whatever triggers a run (cron, a serverless function wrapper) gets a
/// structured response back, never a crash: `200` with `"Success!"`, or
/// `400` with `"Error! <first lane error>"`. The body is a JSON string so
/// function-style gateways can pass it through untouched.

use serde::Serialize;

use crate::ingest::Fetcher;
use crate::pipeline::{Mirror, RunReport};
use crate::sink::Sink;

pub const STATUS_SUCCESS: u16 = 200;
pub const STATUS_FAILURE: u16 = 400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    pub fn from_report(report: &RunReport) -> Self {
        let (status_code, message) = match report.outcome() {
            Ok(()) => (STATUS_SUCCESS, "Success!".to_string()),
            Err(err) => (STATUS_FAILURE, format!("Error! {}", err)),
        };
        InvocationResponse {
            status_code,
            body: serde_json::Value::String(message).to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_SUCCESS
    }
}

/// Runs every lane and folds the result into a response.
pub fn invoke<F: Fetcher, S: Sink>(mirror: &Mirror<F, S>) -> InvocationResponse {
    InvocationResponse::from_report(&mirror.run())
}
