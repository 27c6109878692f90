use crate::model::RunReport;
use anyhow::{Context, Result};
use std::path::Path;

/// Write a report as pretty-printed JSON, creating parent directories as needed.
pub fn export_json(path: &Path, report: &RunReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(report).context("serialize report")?;
    std::fs::write(path, body).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JobFailure, JobStatus, SubmissionState};
    use std::time::Duration;

    #[test]
    fn writes_report_into_new_directory() {
        let dir = std::env::temp_dir().join(format!("analyticore-export-{}", std::process::id()));
        let path = dir.join("nested").join("report.json");
        let report = RunReport {
            base_url: "http://localhost:8000".into(),
            poll_interval: Duration::from_secs(3),
            submitted_at_utc: "a".into(),
            finished_at_utc: "b".into(),
            state: SubmissionState {
                text: "x".into(),
                status: JobStatus::Error,
                error: Some(JobFailure::Submission {
                    reason: "HTTP 500: boom".into(),
                }),
                ..Default::default()
            },
        };

        export_json(&path, &report).unwrap();
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            v["state"]["error"],
            "Failed to submit the request: HTTP 500: boom"
        );
        std::fs::remove_dir_all(&dir).ok();
    }
}
