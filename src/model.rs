use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Message shown when the service itself reports that a job failed.
pub const JOB_FAILED_MESSAGE: &str = "An error occurred during analysis.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            poll_interval: Duration::from_secs(3),
            request_timeout: None,
            user_agent: format!("analyticore-cli/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Client-side view of where the current submission stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    #[default]
    Idle,
    Pending,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    /// No further polling happens for the current job once it is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// A job has been handed to the service and has not finished yet.
    pub fn is_in_flight(self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Processing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Idle => "IDLE",
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status values the analysis service can put on the wire. `IDLE` is client-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl RemoteStatus {
    pub fn is_terminal(self) -> bool {
        JobStatus::from(self).is_terminal()
    }
}

impl From<RemoteStatus> for JobStatus {
    fn from(s: RemoteStatus) -> Self {
        match s {
            RemoteStatus::Pending => JobStatus::Pending,
            RemoteStatus::Processing => JobStatus::Processing,
            RemoteStatus::Completed => JobStatus::Completed,
            RemoteStatus::Error => JobStatus::Error,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: RemoteStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub status: RemoteStatus,
    #[serde(default)]
    pub sentiment: Option<String>,
    // The service sends `null` for jobs that have not finished.
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobResults {
    pub sentiment: Option<String>,
    pub keywords: Vec<String>,
}

/// Why the current job ended in `ERROR`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobFailure {
    #[error("Failed to submit the request: {reason}")]
    Submission { reason: String },

    #[error("Failed to fetch the job status: {reason}")]
    PollTransport { reason: String },

    #[error("{}", JOB_FAILED_MESSAGE)]
    Job,
}

impl Serialize for JobFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Everything the presentation layers need to render one submission.
///
/// `results` is only set in `COMPLETED` and `error` only in `ERROR`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SubmissionState {
    pub text: String,
    pub job_id: Option<String>,
    pub status: JobStatus,
    pub results: Option<JobResults>,
    pub error: Option<JobFailure>,
}

impl SubmissionState {
    /// Fresh state for a submission that has just been sent.
    pub fn pending(text: String) -> Self {
        Self {
            text,
            status: JobStatus::Pending,
            ..Default::default()
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    // Box to keep the event small; the snapshot carries the submitted text.
    State(Box<SubmissionState>),
    Info(InfoEvent),
}

/// Structured info events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone)]
pub enum InfoEvent {
    Submitting { chars: usize },
    Superseded { job_id: String },
    Stopped,
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Submitting { chars } => {
                format!("Submitting {} characters for analysis", chars)
            }
            InfoEvent::Superseded { job_id } => {
                format!("Stopped polling job {} (superseded)", job_id)
            }
            InfoEvent::Stopped => "Controller stopped".to_string(),
        }
    }
}

/// Final report printed in JSON mode and written by `--export-json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    pub submitted_at_utc: String,
    pub finished_at_utc: String,
    pub state: SubmissionState,
}
