//! Source Verification Module
//!
//! Checks configured sources against the live API without publishing
//! anything: each source is fetched, decoded and shape-validated exactly as
//! a mirror run would, and the outcome is collected into a report.
//!
//! Use this after upstream announces a dataset change, or before pointing a
//! new source at production storage.

use chrono::Utc;
use serde::Serialize;

use crate::error::MirrorError;
use crate::ingest::{Fetcher, decode};
use crate::model::SourceDescriptor;
use crate::sources::find_source;
use crate::validate::validate_shape;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerificationStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceVerification {
    pub name: String,
    /// Dataset description, for built-in sources.
    pub description: Option<String>,
    pub endpoint: String,
    pub status: VerificationStatus,
    /// Elements in the upstream array, when it decoded.
    pub record_count: usize,
    pub payload_bytes: usize,
    /// Offending field of a shape mismatch.
    pub mismatched_field: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub working: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub results: Vec<SourceVerification>,
    pub summary: VerificationSummary,
}

// ============================================================================
// Single Source
// ============================================================================

pub fn verify_source<F: Fetcher>(fetcher: &F, source: &SourceDescriptor) -> SourceVerification {
    let mut result = SourceVerification {
        name: source.name.clone(),
        description: find_source(&source.name).map(|def| def.description.to_string()),
        endpoint: source.endpoint.clone(),
        status: VerificationStatus::Failed,
        record_count: 0,
        payload_bytes: 0,
        mismatched_field: None,
        error_message: None,
    };

    let payload = match fetcher.fetch(&source.endpoint) {
        Ok(payload) => payload,
        Err(error) => {
            let err = MirrorError::Transport {
                source_name: source.name.clone(),
                error,
            };
            result.error_message = Some(err.to_string());
            return result;
        }
    };
    result.payload_bytes = payload.len();

    let decoded = match decode(&payload, &source.name) {
        Ok(decoded) => decoded,
        Err(e) => {
            result.error_message = Some(e.to_string());
            return result;
        }
    };
    result.record_count = decoded.as_array().map(Vec::len).unwrap_or_default();

    match validate_shape(&decoded, &source.schema, &source.name) {
        Ok(()) => result.status = VerificationStatus::Success,
        Err(e) => {
            result.mismatched_field = e.field().map(String::from);
            result.error_message = Some(e.to_string());
        }
    }

    result
}

// ============================================================================
// Full Verification Runner
// ============================================================================

pub fn run_verification<F: Fetcher>(fetcher: &F, sources: &[SourceDescriptor]) -> VerificationReport {
    let results: Vec<SourceVerification> = sources.iter().map(|s| verify_source(fetcher, s)).collect();

    let working = results
        .iter()
        .filter(|r| r.status == VerificationStatus::Success)
        .count();

    VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        summary: VerificationSummary {
            total: results.len(),
            working,
            failed: results.len() - working,
        },
        results,
    }
}

pub fn print_summary(report: &VerificationReport) {
    println!("═══════════════════════════════════════════════════════════");
    println!("SOURCE VERIFICATION  {}", report.timestamp);
    println!("═══════════════════════════════════════════════════════════");
    for result in &report.results {
        match result.status {
            VerificationStatus::Success => {
                println!("  ✓ {} ({} records, {} bytes)", result.name, result.record_count, result.payload_bytes);
            }
            VerificationStatus::Failed => {
                println!(
                    "  ✗ {}: {}",
                    result.name,
                    result.error_message.as_deref().unwrap_or("Unknown")
                );
            }
        }
        if let Some(description) = &result.description {
            println!("      {}", description);
        }
    }
    println!();
    println!(
        "Sources: {}/{} working  ({} failed)",
        report.summary.working, report.summary.total, report.summary.failed
    );
    println!("═══════════════════════════════════════════════════════════");
}
