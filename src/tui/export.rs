use crate::model::ControllerConfig;
use anyhow::{Context, Result};
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

use super::state::UiState;

// Clipboard worker channel, started on first copy.
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Default file name for a saved report: job id plus submission time.
pub fn report_file_name(state: &UiState) -> String {
    let stamp = state
        .submitted_at_utc
        .as_deref()
        .unwrap_or("unsubmitted")
        .replace(':', "-")
        .replace('T', "_");
    let job: String = state
        .submission
        .job_id
        .as_deref()
        .unwrap_or("no-job")
        .chars()
        .take(8)
        .collect();
    format!("analyticore-{}-{}.json", stamp, job)
}

/// Save the current submission as a JSON report in the working directory.
/// Returns the absolute path of the written file.
pub fn save_report_json(cfg: &ControllerConfig, state: &UiState) -> Result<std::path::PathBuf> {
    let current_dir = std::env::current_dir().context("get current directory")?;
    let path = current_dir.join(report_file_name(state));
    let report = crate::orchestrator::build_report(
        cfg,
        state.submitted_at_utc.clone().unwrap_or_default(),
        &state.submission,
    );
    crate::storage::export_json(&path, &report)?;
    Ok(path)
}

/// Save and record the outcome in `state.info`.
pub fn save_and_show_path(cfg: &ControllerConfig, state: &mut UiState) {
    match save_report_json(cfg, state) {
        Ok(path) => {
            state.info = format!("Saved: {}", path.display());
            state.last_exported_path = Some(path.display().to_string());
        }
        Err(e) => {
            state.info = format!("Save failed: {e:#}");
        }
    }
}

/// Start the clipboard thread if needed. Each copy keeps its clipboard alive for a
/// couple of seconds so Linux clipboard managers can pick the contents up.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    let sender = CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                if let Ok(mut clipboard) = Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });

        tx
    });
    Ok(sender)
}

/// Queue text for the clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = init_clipboard_manager()?;
    sender
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}
