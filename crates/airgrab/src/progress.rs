use airgrab_core::protocol::DownloadEvent;
use colored::*;
use futures::channel::mpsc;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};

fn file_bar(name: &str, total_bytes: u64) -> ProgressBar {
    let (bar, template) = if total_bytes > 0 {
        (
            ProgressBar::new(total_bytes),
            "{spinner:.cyan} [{elapsed_precise:.dim}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} {msg}",
        )
    } else {
        (
            ProgressBar::new_spinner(),
            "{spinner:.cyan} [{elapsed_precise:.dim}] {bytes} {msg}",
        )
    };
    let style = ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
    bar.set_style(style);
    bar.set_message(name.to_string());
    bar
}

/// Draw pipeline events until the orchestrator goes away.
pub async fn render(mut events: mpsc::UnboundedReceiver<DownloadEvent>) {
    let mut bar: Option<ProgressBar> = None;

    while let Some(event) = events.next().await {
        match event {
            DownloadEvent::Received(locator) => {
                println!("📥 {}", locator.to_string().cyan());
            }
            DownloadEvent::Resolved {
                model,
                version,
                directory,
            } => {
                println!(
                    "   {} / {} → {}",
                    model.bold(),
                    version,
                    directory.display().to_string().dimmed()
                );
            }
            DownloadEvent::FileStarted { name, total_bytes } => {
                bar = Some(file_bar(&name, total_bytes));
            }
            DownloadEvent::Progress(bytes) => {
                if let Some(bar) = &bar {
                    bar.inc(bytes);
                }
            }
            DownloadEvent::FileFinished { .. } => {
                if let Some(bar) = bar.take() {
                    bar.finish();
                }
            }
            DownloadEvent::Complete { directory, .. } => {
                println!(
                    "✅ Download complete: {}",
                    directory.display().to_string().green()
                );
            }
            DownloadEvent::Failed { locator, reason } => {
                if let Some(bar) = bar.take() {
                    bar.abandon();
                }
                eprintln!("❌ {}: {}", locator, reason.red());
            }
        }
    }
}
