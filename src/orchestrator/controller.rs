//! Submission lifecycle controller.
//!
//! Owns the `SubmissionState` for one analysis request and the single poll loop
//! that follows it. Requests run in spawned tasks and report back as `Outcome`s;
//! every outcome carries the generation of the submission it was made for, and
//! anything from an older generation is dropped on arrival.

use crate::engine::{AnalysisApi, Outcome, PollParams, PollTask};
use crate::model::{ControllerConfig, JobFailure, JobResults, JobStatus, SubmissionState};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

pub struct SubmissionController {
    api: Arc<dyn AnalysisApi>,
    poll_interval: Duration,
    state: SubmissionState,
    generation: u64,
    // Cleared by `dispose`: nothing for the current generation can arrive after it.
    awaiting: bool,
    poller: Option<PollTask>,
    live_polls: Arc<AtomicUsize>,
    outcome_tx: UnboundedSender<Outcome>,
    outcome_rx: UnboundedReceiver<Outcome>,
}

impl SubmissionController {
    pub fn new(api: Arc<dyn AnalysisApi>, cfg: &ControllerConfig) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            api,
            poll_interval: cfg.poll_interval,
            state: SubmissionState::default(),
            generation: 0,
            awaiting: false,
            poller: None,
            live_polls: Arc::new(AtomicUsize::new(0)),
            outcome_tx,
            outcome_rx,
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// True while a poll loop is scheduled for the current job.
    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_cancelled())
    }

    /// Poll loops that have not exited yet, including cancelled ones still
    /// finishing an in-flight request.
    pub fn live_poll_loops(&self) -> usize {
        self.live_polls.load(Ordering::SeqCst)
    }

    /// Nothing is in flight for the current submission, either because it
    /// reached a terminal status or because the controller was disposed.
    pub fn is_settled(&self) -> bool {
        !self.awaiting || !self.state.status.is_in_flight()
    }

    /// Start a new submission, superseding whatever came before.
    ///
    /// Returns the job id whose poll loop was cancelled, if any. Must be called
    /// from within a Tokio runtime.
    pub fn submit(&mut self, text: impl Into<String>) -> Option<String> {
        let text = text.into();
        let superseded = self.stop_polling();
        self.generation += 1;
        self.awaiting = true;
        self.state = SubmissionState::pending(text.clone());

        let generation = self.generation;
        info!(generation, chars = text.chars().count(), "submitting job");
        let api = self.api.clone();
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = api.submit_job(&text).await;
            let _ = tx.send(Outcome::Submitted { generation, result });
        });

        superseded
    }

    /// Wait for the next request outcome.
    pub async fn next_outcome(&mut self) -> Option<Outcome> {
        self.outcome_rx.recv().await
    }

    /// Fold one outcome into the state. Returns false when it was stale and ignored.
    pub fn apply(&mut self, outcome: Outcome) -> bool {
        if outcome.generation() != self.generation {
            debug!(
                generation = outcome.generation(),
                current = self.generation,
                "discarding stale outcome"
            );
            return false;
        }

        match outcome {
            Outcome::Submitted { result, .. } => {
                if self.state.status != JobStatus::Pending || self.state.job_id.is_some() {
                    return false;
                }
                match result {
                    Ok(resp) => {
                        let status = JobStatus::from(resp.status);
                        info!(job_id = %resp.job_id, %status, "job accepted");
                        self.state.job_id = Some(resp.job_id.clone());
                        self.state.status = status;
                        match status {
                            JobStatus::Error => self.state.error = Some(JobFailure::Job),
                            s if s.is_in_flight() => self.start_polling(resp.job_id),
                            _ => {}
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, status = ?e.status_code(), "submission failed");
                        self.state.status = JobStatus::Error;
                        self.state.error = Some(JobFailure::Submission {
                            reason: e.to_string(),
                        });
                    }
                }
                true
            }
            Outcome::Polled { job_id, result, .. } => {
                if self.state.job_id.as_deref() != Some(job_id.as_str())
                    || self.state.status.is_terminal()
                {
                    debug!(%job_id, "discarding poll outcome for inactive job");
                    return false;
                }
                match result {
                    Ok(resp) => {
                        let status = JobStatus::from(resp.status);
                        if status != self.state.status {
                            info!(%job_id, %status, "job status changed");
                        }
                        self.state.status = status;
                        match status {
                            JobStatus::Completed => {
                                self.stop_polling();
                                self.state.results = Some(JobResults {
                                    sentiment: resp.sentiment,
                                    keywords: resp.keywords.unwrap_or_default(),
                                });
                            }
                            JobStatus::Error => {
                                self.stop_polling();
                                self.state.error = Some(JobFailure::Job);
                            }
                            _ => {}
                        }
                    }
                    Err(e) => {
                        warn!(%job_id, error = %e, status = ?e.status_code(), "status check failed");
                        self.stop_polling();
                        self.state.status = JobStatus::Error;
                        self.state.error = Some(JobFailure::PollTransport {
                            reason: e.to_string(),
                        });
                    }
                }
                true
            }
        }
    }

    /// Wait for one outcome and apply it. Returns whether the state changed.
    pub async fn step(&mut self) -> bool {
        match self.next_outcome().await {
            Some(outcome) => self.apply(outcome),
            None => false,
        }
    }

    /// Drive the current submission until it completes or fails, calling
    /// `on_change` after every applied transition.
    pub async fn run_until_settled<F>(&mut self, mut on_change: F) -> &SubmissionState
    where
        F: FnMut(&SubmissionState),
    {
        // The controller holds a sender, so the outcome channel never closes here.
        while !self.is_settled() {
            if self.step().await {
                on_change(&self.state);
            }
        }
        &self.state
    }

    /// Cancel the active poll loop and ignore anything still in flight.
    pub fn dispose(&mut self) {
        if let Some(job_id) = self.stop_polling() {
            debug!(%job_id, "controller disposed while polling");
        }
        self.generation += 1;
        self.awaiting = false;
    }

    fn start_polling(&mut self, job_id: String) {
        self.stop_polling();
        self.poller = Some(PollTask::spawn(PollParams {
            api: self.api.clone(),
            job_id,
            generation: self.generation,
            interval: self.poll_interval,
            outcome_tx: self.outcome_tx.clone(),
            live: self.live_polls.clone(),
        }));
    }

    fn stop_polling(&mut self) -> Option<String> {
        let poller = self.poller.take()?;
        poller.cancel();
        Some(poller.job_id().to_string())
    }
}

impl Drop for SubmissionController {
    fn drop(&mut self) {
        self.stop_polling();
    }
}
