//! Scripted in-memory `AnalysisApi` for controller tests.

use crate::engine::{AnalysisApi, ApiError};
use crate::model::{JobStatusResponse, RemoteStatus, SubmitResponse};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

enum Reply<T> {
    Ok(T),
    Http(u16),
    Transport,
}

struct Scripted<T> {
    delay: Duration,
    reply: Reply<T>,
}

impl<T> Scripted<T> {
    fn resolve(self) -> Result<T, ApiError> {
        match self.reply {
            Reply::Ok(v) => Ok(v),
            Reply::Http(status) => Err(ApiError::Http {
                status,
                message: "scripted failure".into(),
            }),
            Reply::Transport => Err(transport_error()),
        }
    }
}

/// A real `reqwest::Error` produced without touching the network.
pub(crate) fn transport_error() -> ApiError {
    let err = reqwest::Client::new()
        .get("not a url")
        .build()
        .expect_err("an unparsable URL must fail to build");
    ApiError::Request(err)
}

#[derive(Default)]
pub(crate) struct ScriptedApi {
    submits: Mutex<VecDeque<Scripted<SubmitResponse>>>,
    polls: Mutex<HashMap<String, VecDeque<Scripted<JobStatusResponse>>>>,
    submitted_texts: Mutex<Vec<String>>,
    polled_ids: Mutex<Vec<String>>,
}

pub(crate) fn status(s: RemoteStatus) -> JobStatusResponse {
    JobStatusResponse {
        status: s,
        sentiment: None,
        keywords: None,
    }
}

pub(crate) fn completed(sentiment: &str, keywords: &[&str]) -> JobStatusResponse {
    JobStatusResponse {
        status: RemoteStatus::Completed,
        sentiment: Some(sentiment.to_string()),
        keywords: Some(keywords.iter().map(|k| k.to_string()).collect()),
    }
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(self, job_id: &str) -> Self {
        self.accept_after(job_id, Duration::ZERO)
    }

    pub fn accept_after(self, job_id: &str, delay: Duration) -> Self {
        self.push_submit(
            delay,
            Reply::Ok(SubmitResponse {
                job_id: job_id.to_string(),
                status: RemoteStatus::Pending,
            }),
        )
    }

    pub fn accept_with_status(self, job_id: &str, status: RemoteStatus) -> Self {
        self.push_submit(
            Duration::ZERO,
            Reply::Ok(SubmitResponse {
                job_id: job_id.to_string(),
                status,
            }),
        )
    }

    pub fn reject_submit(self, http_status: u16) -> Self {
        self.push_submit(Duration::ZERO, Reply::Http(http_status))
    }

    pub fn fail_submit(self) -> Self {
        self.push_submit(Duration::ZERO, Reply::Transport)
    }

    pub fn poll(self, job_id: &str, resp: JobStatusResponse) -> Self {
        self.poll_after(job_id, Duration::ZERO, resp)
    }

    pub fn poll_after(self, job_id: &str, delay: Duration, resp: JobStatusResponse) -> Self {
        self.push_poll(job_id, delay, Reply::Ok(resp))
    }

    pub fn fail_poll(self, job_id: &str) -> Self {
        self.push_poll(job_id, Duration::ZERO, Reply::Transport)
    }

    pub fn reject_poll(self, job_id: &str, http_status: u16) -> Self {
        self.push_poll(job_id, Duration::ZERO, Reply::Http(http_status))
    }

    pub fn submitted_texts(&self) -> Vec<String> {
        self.submitted_texts.lock().unwrap().clone()
    }

    pub fn polled_ids(&self) -> Vec<String> {
        self.polled_ids.lock().unwrap().clone()
    }

    fn push_submit(self, delay: Duration, reply: Reply<SubmitResponse>) -> Self {
        self.submits
            .lock()
            .unwrap()
            .push_back(Scripted { delay, reply });
        self
    }

    fn push_poll(self, job_id: &str, delay: Duration, reply: Reply<JobStatusResponse>) -> Self {
        self.polls
            .lock()
            .unwrap()
            .entry(job_id.to_string())
            .or_default()
            .push_back(Scripted { delay, reply });
        self
    }
}

#[async_trait]
impl AnalysisApi for ScriptedApi {
    async fn submit_job(&self, text: &str) -> Result<SubmitResponse, ApiError> {
        self.submitted_texts.lock().unwrap().push(text.to_string());
        let next = self.submits.lock().unwrap().pop_front();
        let Some(scripted) = next else {
            return Err(ApiError::Http {
                status: 500,
                message: "no scripted submission left".into(),
            });
        };
        tokio::time::sleep(scripted.delay).await;
        scripted.resolve()
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, ApiError> {
        self.polled_ids.lock().unwrap().push(job_id.to_string());
        let next = self
            .polls
            .lock()
            .unwrap()
            .get_mut(job_id)
            .and_then(|q| q.pop_front());
        // Unscripted jobs stay pending forever.
        let Some(scripted) = next else {
            return Ok(status(RemoteStatus::Pending));
        };
        tokio::time::sleep(scripted.delay).await;
        scripted.resolve()
    }
}
