use std::sync::Arc;

mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::{load_settings, HttpAnalysisClient};
use crossbeam_channel::bounded;
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::ui::{AnalyzerApp, StartupConfig};

#[derive(Debug, Parser)]
#[command(name = "analyze-gui", about = "Desktop form for the data analysis service")]
struct Args {
    /// Base URL of the analysis server; overrides analyzer.toml and the environment.
    #[arg(long)]
    server_url: Option<String>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    let mut startup = StartupConfig {
        settings: load_settings(),
        ..StartupConfig::default()
    };
    if let Some(server_url) = args.server_url {
        startup.settings.server_url = server_url;
    }

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    match HttpAnalysisClient::from_settings(&startup.settings) {
        Ok(client) => {
            let _ = ui_tx.try_send(UiEvent::Info(format!(
                "Ready - analysis endpoint {}",
                client.endpoint()
            )));
            backend_bridge::runtime::launch(cmd_rx, ui_tx, Arc::new(client));
        }
        Err(err) => {
            tracing::error!("invalid analysis endpoint: {err:#}");
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                UiErrorContext::BackendStartup,
                format!("backend worker startup failure: invalid server URL: {err:#}"),
            )));
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(startup.window_title.clone())
            .with_inner_size([1100.0, 800.0])
            .with_min_inner_size([640.0, 480.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    let title = startup.window_title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(AnalyzerApp::new(cmd_tx, ui_rx, &startup)))),
    )
}
