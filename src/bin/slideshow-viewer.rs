//! Headless slideshow client.
//!
//! Runs the listing poll and autoplay against a running server and logs the
//! slide on display. Commands are read from stdin, one per line: `n` next,
//! `p` previous, an empty line or a space toggles play/pause,
//! `swipe <start-x> <end-x>` navigates like a touch gesture, `q` quits.
//! Once stdin is closed the slideshow keeps running until Ctrl-C.

use std::{future::Future, path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use clap::{Parser, Subcommand};
use slideshow_service::client::{
    Command, DriverSettings, ImageApi, ImageUploader, SlideshowDriver, UploadStatus, View,
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "slideshow-viewer", about = "Slideshow client for slideshow-service")]
struct Cli {
    /// Base URL of the slideshow server
    #[arg(long, env = "SLIDESHOW_URL", default_value = "http://localhost:8080")]
    server: String,

    #[command(subcommand)]
    command: Option<ViewerCommand>,
}

#[derive(Debug, Subcommand)]
enum ViewerCommand {
    /// Show the slideshow (default)
    Watch {
        /// Seconds between automatic slide changes
        #[arg(long, default_value_t = 5)]
        autoplay_secs: u64,
        /// Seconds between listing refreshes
        #[arg(long, default_value_t = 10)]
        poll_secs: u64,
        /// Start with autoplay paused
        #[arg(long)]
        paused: bool,
    },
    /// Upload image files, one request per file
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn parse_line(line: &str) -> Option<Command> {
    match line.trim_end_matches(|c: char| c == '\r' || c == '\n') {
        "n" | "next" => Some(Command::Next),
        "p" | "prev" => Some(Command::Previous),
        "" | " " => Some(Command::TogglePlay),
        "q" | "quit" => Some(Command::Quit),
        other => match other.strip_prefix("swipe ") {
            Some(coords) => parse_swipe(coords),
            None => Command::from_key(other),
        },
    }
}

fn parse_swipe(coords: &str) -> Option<Command> {
    let mut parts = coords.split_whitespace().map(str::parse::<f32>);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(start_x)), Some(Ok(end_x)), None) => Command::from_swipe(start_x, end_x),
        _ => None,
    }
}

/// Forwards commands read from `input` until `q` or `shutdown`.
///
/// End of input only stops the reading; the session then runs unattended
/// until `shutdown` completes. Always ends by sending `Command::Quit`.
async fn forward_commands<R, S>(input: R, commands: &mpsc::Sender<Command>, shutdown: S)
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut lines = input.lines();
    let mut reading = true;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
            line = lines.next_line(), if reading => match line {
                Ok(Some(line)) => {
                    let Some(command) = parse_line(&line) else {
                        warn!("Unknown command '{}'", line);
                        continue;
                    };
                    if command == Command::Quit || commands.send(command).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    info!("Input closed, running unattended until Ctrl-C");
                    reading = false;
                }
                Err(e) => {
                    error!("Cannot read stdin: {}", e);
                    reading = false;
                }
            },
        }
    }

    let _ = commands.send(Command::Quit).await;
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn watch(api: Arc<ImageApi>, settings: DriverSettings) -> ExitCode {
    let (driver, mut snapshots) = SlideshowDriver::new(api.clone(), settings);
    let (tx, rx) = mpsc::channel(16);
    let driver = tokio::spawn(driver.run(rx));

    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            match (snapshot.view, snapshot.current) {
                (View::Slides, Some(current)) => info!(
                    "[{}/{}] {}{}",
                    snapshot.position,
                    snapshot.total,
                    api.image_url(&current),
                    if snapshot.playing { "" } else { " (paused)" }
                ),
                (View::Empty, _) => info!("No images found, upload some first"),
                (View::LoadError, _) => warn!("Error loading images, check the connection"),
                _ => {}
            }
        }
    });

    forward_commands(BufReader::new(tokio::io::stdin()), &tx, ctrl_c()).await;

    match driver.await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Slideshow task failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn upload(api: Arc<ImageApi>, files: Vec<PathBuf>) -> ExitCode {
    let uploader = ImageUploader::new(api);

    let reports = match uploader.upload_files(&files).await {
        Ok(reports) => reports,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    for report in &reports {
        match &report.status {
            UploadStatus::Uploaded { stored_name } => println!("ok     {} -> {}", report.file, stored_name),
            UploadStatus::Failed { reason } => println!("error  {}: {}", report.file, reason),
        }
    }

    match uploader.existing_files().await {
        Ok(existing) => info!("{} image(s) now on the server", existing.len()),
        Err(e) => warn!("Could not refresh the listing: {}", e),
    }

    if reports.iter().all(|r| r.is_uploaded()) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let api = Arc::new(ImageApi::new(&cli.server));

    match cli.command.unwrap_or(ViewerCommand::Watch {
        autoplay_secs: 5,
        poll_secs: 10,
        paused: false,
    }) {
        ViewerCommand::Watch {
            autoplay_secs,
            poll_secs,
            paused,
        } => {
            let settings = DriverSettings {
                autoplay_interval: Duration::from_secs(autoplay_secs.max(1)),
                poll_interval: Duration::from_secs(poll_secs.max(1)),
                start_playing: !paused,
            };
            watch(api, settings).await
        }
        ViewerCommand::Upload { files } => upload(api, files).await,
    }
}
