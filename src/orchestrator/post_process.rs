//! Post-run processing utilities.
//!
//! Builds the final report for a settled submission and handles exports.

use crate::cli::Cli;
use crate::model::{ControllerConfig, RunReport, SubmissionState};
use crate::storage;

/// Result of post-run processing, ready for presentation layers.
pub(crate) struct ProcessedRun {
    pub report: RunReport,
    pub export_messages: Vec<String>,
}

/// Current UTC time as RFC 3339, the format used for report timestamps.
pub(crate) fn now_utc() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into())
}

pub(crate) fn build_report(
    cfg: &ControllerConfig,
    submitted_at_utc: String,
    state: &SubmissionState,
) -> RunReport {
    RunReport {
        base_url: cfg.base_url.clone(),
        poll_interval: cfg.poll_interval,
        submitted_at_utc,
        finished_at_utc: now_utc(),
        state: state.clone(),
    }
}

/// Process a settled submission: build the report and run any requested export.
pub(crate) fn process_run_completion(
    args: &Cli,
    cfg: &ControllerConfig,
    submitted_at_utc: String,
    state: &SubmissionState,
) -> ProcessedRun {
    let report = build_report(cfg, submitted_at_utc, state);

    let mut export_messages = Vec::new();
    if let Some(export_path) = args.export_json.as_deref() {
        match storage::export_json(export_path, &report) {
            Ok(_) => export_messages.push(format!("Exported JSON: {}", export_path.display())),
            Err(e) => export_messages.push(format!("Export JSON failed: {e:#}")),
        }
    }

    ProcessedRun {
        report,
        export_messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JobResults, JobStatus};
    use std::time::Duration;

    #[test]
    fn report_carries_config_and_state() {
        let cfg = ControllerConfig {
            poll_interval: Duration::from_secs(5),
            ..Default::default()
        };
        let state = SubmissionState {
            text: "hola".into(),
            job_id: Some("abc".into()),
            status: JobStatus::Completed,
            results: Some(JobResults {
                sentiment: Some("positive".into()),
                keywords: vec!["hola".into()],
            }),
            error: None,
        };
        let report = build_report(&cfg, "2026-01-01T00:00:00Z".into(), &state);
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["base_url"], "http://localhost:8000");
        assert_eq!(v["poll_interval"], "5s");
        assert_eq!(v["submitted_at_utc"], "2026-01-01T00:00:00Z");
        assert_eq!(v["state"]["status"], "COMPLETED");
        assert_eq!(v["state"]["results"]["keywords"][0], "hola");
        assert!(v["finished_at_utc"].as_str().unwrap().contains('T'));
    }
}
