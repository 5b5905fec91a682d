use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    load_settings, AttachmentListView, CardBody, FormController, HttpAnalysisClient, ResultCard,
    ResultsView, RunOutcome,
};
use shared::domain::DroppedFile;

mod alert;

#[derive(Parser, Debug)]
#[command(about = "Send an analysis plan and supporting files to an analysis server")]
struct Args {
    /// Overrides `server_url` from analyzer.toml and the environment.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long, conflicts_with = "question_file")]
    question: Option<String>,
    /// Text file whose content becomes the question.
    #[arg(long)]
    question_file: Option<PathBuf>,
    #[arg(long = "attach", value_name = "PATH")]
    attachments: Vec<PathBuf>,
    /// Directory that image cards are saved to as `<key>.png`.
    #[arg(long, value_name = "DIR")]
    save_images: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    let client = HttpAnalysisClient::from_settings(&settings)?;
    tracing::info!(endpoint = %client.endpoint(), "using analysis endpoint");

    let mut form = FormController::new(Arc::new(alert::StderrAlerter));
    if let Some(path) = args.question_file {
        if !form.load_plan(&[DroppedFile::from_path(path)]).await {
            return Ok(ExitCode::from(2));
        }
    } else if let Some(question) = args.question {
        form.set_question(question);
    }

    let dropped: Vec<DroppedFile> = args
        .attachments
        .into_iter()
        .map(DroppedFile::from_path)
        .collect();
    form.add_dropped(&dropped);
    print_attachments(&form.attachment_list());

    let outcome = form.run(&client).await;
    match form.results().view() {
        ResultsView::Cards(cards) => {
            for card in cards {
                print_card(card, args.save_images.as_ref())?;
            }
        }
        ResultsView::Failed(card) => {
            println!("== {} ==\n{}", card.title, card.message);
        }
        ResultsView::Hidden => {}
    }

    Ok(match outcome {
        RunOutcome::Rendered { .. } => ExitCode::SUCCESS,
        RunOutcome::Failed { .. } => ExitCode::FAILURE,
        RunOutcome::Rejected(_) => ExitCode::from(2),
    })
}

fn print_attachments(view: &AttachmentListView) {
    match view {
        AttachmentListView::Placeholder(text) => eprintln!("attachments: ({text})"),
        AttachmentListView::Rows(rows) => {
            eprintln!("attachments:");
            for row in rows {
                eprintln!("  {} ({})", row.display_name, row.size_label);
            }
        }
    }
}

fn print_card(card: &ResultCard, image_dir: Option<&PathBuf>) -> Result<()> {
    println!("== {} ==", card.title);
    match &card.body {
        CardBody::Text(text) | CardBody::Preformatted(text) => println!("{text}"),
        CardBody::Image { download_name, .. } => {
            let Some(dir) = image_dir else {
                println!("[image, pass --save-images to write {download_name}]");
                return Ok(());
            };
            match card.body.decode_image() {
                Some(Ok(bytes)) => {
                    std::fs::create_dir_all(dir)
                        .with_context(|| format!("failed to create '{}'", dir.display()))?;
                    let path = dir.join(download_name);
                    std::fs::write(&path, bytes)
                        .with_context(|| format!("failed to write '{}'", path.display()))?;
                    println!("[image saved to {}]", path.display());
                }
                Some(Err(err)) => {
                    tracing::warn!(key = %card.key, "image card is not valid base64: {err}");
                    println!("[broken image]");
                }
                None => {}
            }
        }
    }
    println!();
    Ok(())
}
