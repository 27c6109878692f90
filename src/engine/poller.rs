use crate::engine::client::AnalysisApi;
use crate::engine::Outcome;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Parameters for spawning a status poll loop.
pub(crate) struct PollParams {
    pub api: Arc<dyn AnalysisApi>,
    pub job_id: String,
    pub generation: u64,
    pub interval: Duration,
    pub outcome_tx: mpsc::UnboundedSender<Outcome>,
    /// Shared count of loops that have not exited yet.
    pub live: Arc<AtomicUsize>,
}

/// Handle to the one scheduled status check loop for a job.
///
/// Cancelling stops the timer; a request already in flight still completes and
/// its outcome is delivered, tagged with this loop's generation.
pub(crate) struct PollTask {
    job_id: String,
    generation: u64,
    cancel: Arc<AtomicBool>,
    wake: Arc<Notify>,
    // Detached on drop; the loop exits on its own once it sees the flag.
    _handle: JoinHandle<()>,
}

impl PollTask {
    pub fn spawn(params: PollParams) -> Self {
        let PollParams {
            api,
            job_id,
            generation,
            interval,
            outcome_tx,
            live,
        } = params;
        let cancel = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());

        live.fetch_add(1, Ordering::SeqCst);
        let guard = LiveGuard(live);
        let loop_job_id = job_id.clone();
        let cancel2 = cancel.clone();
        let wake2 = wake.clone();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            poll_loop(
                api,
                loop_job_id,
                generation,
                interval.max(MIN_POLL_INTERVAL),
                cancel2,
                wake2,
                outcome_tx,
            )
            .await;
        });

        Self {
            job_id,
            generation,
            cancel,
            wake,
            _handle: handle,
        }
    }

    /// Stop scheduling further ticks. Safe to call any number of times.
    pub fn cancel(&self) {
        if !self.cancel.swap(true, Ordering::SeqCst) {
            debug!(job_id = %self.job_id, generation = self.generation, "poll loop cancelled");
            self.wake.notify_one();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn poll_loop(
    api: Arc<dyn AnalysisApi>,
    job_id: String,
    generation: u64,
    interval: Duration,
    cancel: Arc<AtomicBool>,
    wake: Arc<Notify>,
    outcome_tx: mpsc::UnboundedSender<Outcome>,
) {
    // First check happens one full period after polling starts.
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    // Each request is awaited before the next tick, so a slow request skips ticks
    // instead of stacking them up.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = wake.notified() => {}
        }
        if cancel.load(Ordering::SeqCst) {
            break;
        }

        trace!(%job_id, generation, "poll tick");
        let result = api.job_status(&job_id).await;
        let keep_polling = matches!(&result, Ok(r) if !r.status.is_terminal());

        let outcome = Outcome::Polled {
            generation,
            job_id: job_id.clone(),
            result,
        };
        if outcome_tx.send(outcome).is_err() || !keep_polling {
            break;
        }
    }
    debug!(%job_id, generation, "poll loop exited");
}
