//! Backend worker: owns the tokio runtime and the analysis transport, runs
//! every queued command as its own task and reports back as UI events.

use std::{sync::Arc, thread};

use client_core::{plan_loader::read_plan_text, AnalysisTransport};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

/// Commands do not wait for each other: a plan read finishes while an
/// analysis request is still in flight.
pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    transport: Arc<dyn AnalysisTransport>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        while let Ok(cmd) = cmd_rx.recv() {
            tracing::debug!(command = cmd.name(), "backend: spawning command");
            runtime.spawn(run_command(cmd, ui_tx.clone(), Arc::clone(&transport)));
        }
        tracing::debug!("backend command queue closed; worker exiting");
    })
}

async fn run_command(
    cmd: BackendCommand,
    ui_tx: Sender<UiEvent>,
    transport: Arc<dyn AnalysisTransport>,
) {
    let event = match cmd {
        BackendCommand::ReadPlanFile { file } => match read_plan_text(&file).await {
            Ok(text) => UiEvent::PlanTextLoaded(text),
            Err(err) => {
                tracing::warn!(name = %file.name, "backend: plan read failed: {err:#}");
                UiEvent::PlanReadFailed(format!("{err:#}"))
            }
        },
        BackendCommand::Analyze { request } => {
            tracing::info!(
                attachments = request.attachments.len(),
                question_len = request.question.len(),
                "backend: analyze"
            );
            let outcome = transport.analyze(&request).await;
            if let Err(err) = &outcome {
                tracing::error!("backend: analyze failed: {err}");
            }
            UiEvent::AnalysisFinished(outcome)
        }
    };
    // blocking send: the UI must always learn how a command ended
    let _ = ui_tx.send(event);
}
