//! Camcast command-line entry point.
//!
//! Loads the TOML configuration, applies CLI overrides, verifies FFmpeg is
//! available, launches the stream fleet, and translates Ctrl+C into a
//! single coordinated shutdown.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode, Stdio};
use std::sync::Arc;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use camcast_core::config::{ConfigManager, Settings};
use camcast_core::models::{LayoutMode, StreamJob, StreamingMode};
use camcast_core::supervisor::{FleetCoordinator, ProcessState, QUIT_GRACE};

#[derive(Parser)]
#[command(
    name = "camcast",
    about = "Combine RTSP cameras into RTMP live streams",
    version
)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, short, default_value = "camcast.toml")]
    config: PathBuf,

    /// Override the configured layout (side-by-side, grid, switch)
    #[arg(long)]
    layout: Option<LayoutMode>,

    /// Override the switch rotation interval in seconds
    #[arg(long)]
    switch_interval: Option<u32>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _log_guard = init_logging(args.log_file.as_deref());
    run(args)
}

fn run(args: Args) -> ExitCode {
    tracing::info!(version = camcast_core::version(), "camcast starting");

    let mut manager = ConfigManager::new(&args.config);
    if let Err(err) = manager.load() {
        tracing::error!(error = %err, "configuration error");
        return ExitCode::FAILURE;
    }

    {
        let settings = manager.settings_mut();
        if let Some(layout) = args.layout {
            settings.layout.mode = layout;
        }
        if let Some(interval) = args.switch_interval {
            settings.layout.switch_interval = interval;
        }
    }

    let jobs = match manager.settings().build_jobs() {
        Ok(jobs) => jobs,
        Err(err) => {
            tracing::error!(error = %err, "configuration error");
            return ExitCode::FAILURE;
        }
    };

    if !ffmpeg_available() {
        tracing::error!(
            "FFmpeg is not installed or not on PATH (https://ffmpeg.org/download.html)"
        );
        return ExitCode::FAILURE;
    }

    banner(manager.settings(), &jobs);

    let fleet = Arc::new(FleetCoordinator::new());
    {
        let fleet = Arc::clone(&fleet);
        if let Err(err) = ctrlc::set_handler(move || {
            tracing::info!("shutdown requested (Ctrl+C)");
            fleet.stop_all(QUIT_GRACE);
        }) {
            tracing::error!(error = %err, "failed to install the Ctrl+C handler");
            return ExitCode::FAILURE;
        }
    }

    let started = match fleet.launch_all(&jobs) {
        Ok(started) => started,
        Err(err) => {
            tracing::error!(error = %err, "configuration error");
            return ExitCode::FAILURE;
        }
    };
    if started == 0 {
        tracing::error!("no stream could be started");
        return ExitCode::FAILURE;
    }

    let exits = fleet.await_all();

    // A coordinated shutdown is a clean exit regardless of process exit
    // codes; otherwise any job that did not end with status 0 is a failure.
    let clean = fleet.is_shutting_down()
        || exits
            .iter()
            .all(|exit| exit.state == ProcessState::Exited(Some(0)));
    if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Console logging, plus a non-blocking file writer when requested.
///
/// The returned guard must stay alive for the file writer to flush.
fn init_logging(log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter).with(fmt::layer());

    if let Some(path) = log_file {
        match fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                let (writer, guard) = tracing_appender::non_blocking(file);
                registry
                    .with(fmt::layer().with_ansi(false).with_writer(writer))
                    .init();
                return Some(guard);
            }
            Err(err) => {
                registry.init();
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "could not open log file, logging to console only"
                );
                return None;
            }
        }
    }

    registry.init();
    None
}

/// FFmpeg does all decoding and encoding; nothing works without it.
fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn banner(settings: &Settings, jobs: &[StreamJob]) {
    tracing::info!("==================================================");
    match settings.output.mode {
        StreamingMode::Combined => {
            tracing::info!(layout = %settings.layout.mode, "combined camera stream");
            if settings.layout.mode == LayoutMode::Switch {
                tracing::info!(
                    seconds = settings.layout.switch_interval,
                    "switch interval"
                );
            }
        }
        StreamingMode::Independent => {
            tracing::info!(streams = jobs.len(), "independent camera streams");
        }
    }
    let cameras: Vec<&str> = settings
        .cameras
        .iter()
        .map(|camera| camera.name.as_str())
        .collect();
    tracing::info!(cameras = cameras.join(", "), "sources");
    tracing::info!("press Ctrl+C to stop streaming");
    tracing::info!("==================================================");
}
