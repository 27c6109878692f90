//! Text summary builder for CLI output.
//!
//! Formats human-readable lines for a settled submission in text mode.

use crate::model::{JobStatus, SubmissionState};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// One progress line per status transition, written to stderr while polling.
pub(crate) fn progress_line(state: &SubmissionState) -> String {
    match state.job_id.as_deref() {
        Some(id) => format!("== {} == (job {id})", state.status),
        None => format!("== {} ==", state.status),
    }
}

/// Build a text summary from the final submission state.
pub(crate) fn build_text_summary(state: &SubmissionState) -> TextSummary {
    let mut lines = Vec::new();

    lines.push(format!("Status: {}", state.status));
    if let Some(job_id) = state.job_id.as_deref() {
        lines.push(format!("Job ID: {job_id}"));
    }

    match state.status {
        JobStatus::Completed => match state.results.as_ref() {
            Some(results) => {
                lines.push(format!(
                    "Sentiment: {}",
                    results.sentiment.as_deref().unwrap_or("-")
                ));
                if results.keywords.is_empty() {
                    lines.push("Keywords: -".into());
                } else {
                    lines.push(format!("Keywords: {}", results.keywords.join(", ")));
                }
            }
            None => lines.push("Results: not reported by the service".into()),
        },
        JobStatus::Error => {
            if let Some(msg) = state.error_message() {
                lines.push(format!("Error: {msg}"));
            }
        }
        _ => {}
    }

    TextSummary { lines }
}
