use crate::engine::{AnalysisApi, AnalysisClient};
use crate::model::{ControllerConfig, JobStatus, SubmissionState};
use crate::orchestrator::{self, SubmissionController};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{IsTerminal, Read, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "analyticore-cli",
    version,
    about = "Submit text for sentiment and keyword analysis and follow the job until it finishes"
)]
pub struct Cli {
    /// Text to analyze ("-" reads it from stdin)
    pub input: Option<String>,

    /// Base URL of the analysis service
    #[arg(long, env = "API_BASE_URL", default_value = "http://localhost:8000")]
    pub base_url: String,

    /// Print a JSON report and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print status lines and a text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Run silently: suppress all output except errors (for scripting)
    #[arg(long)]
    pub silent: bool,

    /// Interval between job status checks
    #[arg(long, default_value = "3s")]
    pub poll_interval: humantime::Duration,

    /// Timeout for each HTTP request (no timeout by default)
    #[arg(long)]
    pub request_timeout: Option<humantime::Duration>,

    /// Export the final report as JSON
    #[arg(long)]
    pub export_json: Option<std::path::PathBuf>,

    /// Log request and state details to stderr (non-TUI modes)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn is_non_tui(&self) -> bool {
        self.silent || self.json || self.text || cfg!(not(feature = "tui"))
    }
}

pub async fn run(args: Cli) -> Result<()> {
    // Validate that --silent can only be used with --json
    if args.silent && !args.json {
        return Err(anyhow::anyhow!(
            "--silent can only be used with --json. Use --silent --json together."
        ));
    }
    if Duration::from(args.poll_interval).is_zero() {
        return Err(anyhow::anyhow!("--poll-interval must be greater than zero"));
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
    }

    let text = read_input_text(args.input.as_deref())?;
    if args.json {
        return run_json(args, text).await;
    }

    run_text(args, text).await
}

/// Build a `ControllerConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ControllerConfig {
    ControllerConfig {
        base_url: args.base_url.clone(),
        poll_interval: Duration::from(args.poll_interval),
        request_timeout: args.request_timeout.map(Duration::from),
        ..Default::default()
    }
}

/// Build the reqwest-backed service client for this run.
pub fn build_api(cfg: &ControllerConfig) -> Result<Arc<dyn AnalysisApi>> {
    let client = AnalysisClient::new(cfg).context("failed to create analysis service client")?;
    debug!(base_url = %client.base_url(), "analysis client ready");
    Ok(Arc::new(client))
}

/// Resolve the text to analyze from the positional argument or stdin.
fn read_input_text(arg: Option<&str>) -> Result<String> {
    let text = match arg {
        Some(t) if t != "-" => t.to_string(),
        _ => {
            let mut stdin = std::io::stdin();
            if arg.is_none() && stdin.is_terminal() {
                return Err(anyhow::anyhow!(
                    "no text to analyze: pass it as an argument or pipe it on stdin"
                ));
            }
            let mut buf = String::new();
            stdin
                .read_to_string(&mut buf)
                .context("failed to read text from stdin")?;
            buf.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    validate_text(text)
}

/// Submissions require non-empty text.
pub(crate) fn validate_text(text: String) -> Result<String> {
    if text.trim().is_empty() {
        return Err(anyhow::anyhow!("text to analyze must not be empty"));
    }
    Ok(text)
}

/// Drive a submitted controller until it settles, stopping early on Ctrl-C.
async fn drive_until_settled<F>(
    controller: &mut SubmissionController,
    on_change: F,
) -> Result<SubmissionState>
where
    F: FnMut(&SubmissionState),
{
    let settled = tokio::select! {
        state = controller.run_until_settled(on_change) => Some(state.clone()),
        _ = tokio::signal::ctrl_c() => None,
    };
    match settled {
        Some(state) => Ok(state),
        None => {
            controller.dispose();
            Err(anyhow::anyhow!("interrupted before the job finished"))
        }
    }
}

/// Turn the final state into the process result.
fn finish(state: &SubmissionState) -> Result<()> {
    if state.status == JobStatus::Error {
        let msg = state
            .error_message()
            .unwrap_or_else(|| "analysis failed".to_string());
        return Err(anyhow::anyhow!(msg));
    }
    Ok(())
}

async fn run_json(args: Cli, text: String) -> Result<()> {
    let cfg = build_config(&args);
    let api = build_api(&cfg)?;
    let (out_tx, out_handle) = if args.silent {
        (None, None)
    } else {
        let (tx, handle) = spawn_output_writer();
        (Some(tx), Some(handle))
    };

    let mut controller = SubmissionController::new(api, &cfg);
    let submitted_at = orchestrator::now_utc();
    controller.submit(text);
    let state = drive_until_settled(&mut controller, |_| {}).await?;

    let processed = orchestrator::process_run_completion(&args, &cfg, submitted_at, &state);
    if args.silent {
        // Export failures still matter when nothing else is printed.
        if let Some(msg) = processed
            .export_messages
            .iter()
            .find(|m| m.starts_with("Export JSON failed"))
        {
            return Err(anyhow::anyhow!(msg.clone()));
        }
    }

    if let Some(tx) = out_tx.as_ref() {
        let out = serde_json::to_string_pretty(&processed.report)?;
        let _ = tx.send(OutputLine::Stdout(out));
        for msg in &processed.export_messages {
            let _ = tx.send(OutputLine::Stderr(msg.clone()));
        }
    }

    if let Some(tx) = out_tx {
        drop(tx);
    }
    if let Some(handle) = out_handle {
        let _ = handle.await;
    }

    finish(&state)
}

async fn run_text(args: Cli, text: String) -> Result<()> {
    let cfg = build_config(&args);
    let api = build_api(&cfg)?;
    let (out_tx, out_handle) = spawn_output_writer();

    let mut controller = SubmissionController::new(api, &cfg);
    let submitted_at = orchestrator::now_utc();
    let _ = out_tx.send(OutputLine::Stderr(format!(
        "Submitting {} characters to {}",
        text.chars().count(),
        cfg.base_url
    )));
    controller.submit(text);
    let _ = out_tx.send(OutputLine::Stderr(crate::text_summary::progress_line(
        controller.state(),
    )));

    // Only print when the status or job id actually changes.
    let mut last = (JobStatus::Pending, None::<String>);
    let state = drive_until_settled(&mut controller, |s| {
        let key = (s.status, s.job_id.clone());
        if key != last {
            let _ = out_tx.send(OutputLine::Stderr(crate::text_summary::progress_line(s)));
            last = key;
        }
    })
    .await?;

    let processed = orchestrator::process_run_completion(&args, &cfg, submitted_at, &state);
    for line in crate::text_summary::build_text_summary(&state).lines {
        let _ = out_tx.send(OutputLine::Stdout(line));
    }
    for msg in processed.export_messages {
        let _ = out_tx.send(OutputLine::Stderr(msg));
    }
    drop(out_tx);
    let _ = out_handle.await;

    finish(&state)
}
