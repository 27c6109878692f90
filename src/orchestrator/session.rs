//! Interactive session loop.
//!
//! Owns one `SubmissionController`, applies commands from a UI layer and emits
//! state snapshots back to it.

use super::controller::SubmissionController;
use crate::engine::AnalysisApi;
use crate::model::{ControllerConfig, ControllerEvent, InfoEvent};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Commands emitted by UI layers to drive the controller.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Submit(String),
    Quit,
}

fn emit_state(event_tx: &UnboundedSender<ControllerEvent>, controller: &SubmissionController) {
    let _ = event_tx.send(ControllerEvent::State(Box::new(controller.state().clone())));
}

/// Run the controller until the UI quits or drops its command sender.
pub(crate) async fn run_controller(
    api: Arc<dyn AnalysisApi>,
    cfg: &ControllerConfig,
    event_tx: UnboundedSender<ControllerEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut controller = SubmissionController::new(api, cfg);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Submit(text)) => {
                        let chars = text.chars().count();
                        if let Some(job_id) = controller.submit(text) {
                            let _ = event_tx.send(ControllerEvent::Info(InfoEvent::Superseded { job_id }));
                        }
                        let _ = event_tx.send(ControllerEvent::Info(InfoEvent::Submitting { chars }));
                        emit_state(&event_tx, &controller);
                    }
                    Some(UiCommand::Quit) | None => break,
                }
            }
            outcome = controller.next_outcome() => {
                if let Some(outcome) = outcome {
                    if controller.apply(outcome) {
                        debug!(
                            status = %controller.state().status,
                            polling = controller.is_polling(),
                            live_loops = controller.live_poll_loops(),
                            "state changed"
                        );
                        emit_state(&event_tx, &controller);
                    }
                }
            }
        }
    }

    controller.dispose();
    let _ = event_tx.send(ControllerEvent::Info(InfoEvent::Stopped));
    Ok(())
}
