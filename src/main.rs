use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use sysinfo::System;

use pingpong_referee::capture::ImageSequenceSource;
use pingpong_referee::clock::SystemClock;
use pingpong_referee::config::Config;
use pingpong_referee::detection::ColorBlobLocator;
use pingpong_referee::display::ConsoleDisplay;
use pingpong_referee::error::AppResult;
use pingpong_referee::messaging::{EventBus, GameEvent};
use pingpong_referee::runner::{self, GameLoop, RunOptions, RunSummary};

const LOG_TARGET_STARTUP: &str = "pingpong_referee::startup";

#[derive(Parser, Debug)]
#[command(name = "pingpong-referee", version, about = "Camera-based ping-pong scorekeeper")]
struct Cli {
    /// Configuration file (defaults to config/config.json next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Referee a live game from a directory of frames
    Run {
        /// Directory of frame images, read in file name order
        #[arg(long)]
        frames: PathBuf,

        /// Override the configured frame rate
        #[arg(long)]
        fps: Option<u32>,

        /// Start over from the first frame when the directory runs out
        #[arg(long = "loop")]
        looping: bool,

        /// Write annotated frames to this directory
        #[arg(long)]
        annotate: Option<PathBuf>,

        /// Stop after this many frames, failed captures included
        #[arg(long)]
        max_frames: Option<u64>,

        /// Record per-frame detections to a trace file
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Replay a recorded detection trace
    Replay {
        /// JSON Lines trace file
        #[arg(long)]
        trace: PathBuf,
    },

    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        write: bool,
    },
}

/// Initialize tracing with file rotation
///
/// Logs go to the console and to a daily-rotated file under
/// `<config dir>/PingPongReferee/logs`. `RUST_LOG` overrides the default
/// `info` filter.
fn initialize_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = dirs::config_dir()
        .map(|dir| dir.join("PingPongReferee").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "pingpong-referee.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    let console_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    tracing::info!("Log directory: {}", log_dir.display());
    guard
}

fn log_runtime_environment() {
    let version = env!("CARGO_PKG_VERSION");
    let os_name = System::long_os_version()
        .or_else(System::name)
        .unwrap_or_else(|| "Unknown OS".to_string());
    let kernel = System::kernel_version().unwrap_or_else(|| "Unknown Kernel".to_string());
    let architecture = std::env::consts::ARCH;

    tracing::info!(
        target: LOG_TARGET_STARTUP,
        "Starting pingpong-referee v{} on ({})",
        version,
        architecture
    );
    tracing::info!(target: LOG_TARGET_STARTUP, "Operating System: {} (kernel {})", os_name, kernel);
    tracing::debug!(
        target: LOG_TARGET_STARTUP,
        "Worker threads: {}",
        rayon::current_num_threads()
    );
}

fn load_config(path: Option<&Path>) -> AppResult<(Config, PathBuf)> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path().context("Failed to locate config file")?,
    };
    let config = Config::load_or_create(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    Ok((config, path))
}

/// Tally of bus events, collected on a separate thread until shutdown
#[derive(Debug, Default)]
struct EventTally {
    dwells: u64,
    cancelled: u64,
    points: u64,
    matches: u64,
}

fn spawn_event_tally(bus: &EventBus) -> JoinHandle<EventTally> {
    let (rx, _id) = bus.subscribe();
    thread::spawn(move || {
        let mut tally = EventTally::default();
        for event in rx.iter() {
            match event {
                GameEvent::DwellStarted { .. } => tally.dwells += 1,
                GameEvent::DwellCancelled { .. } => tally.cancelled += 1,
                GameEvent::PointScored { .. } => tally.points += 1,
                GameEvent::MatchWon { .. } => tally.matches += 1,
                GameEvent::PointResumed { .. } | GameEvent::MatchRestarted { .. } => {}
                GameEvent::Shutdown => break,
            }
        }
        tally
    })
}

fn log_summary(summary: &RunSummary, tally: Option<EventTally>) {
    let (left, right) = summary.scores;
    tracing::info!(
        "Final score {}-{} ({}), {} frames",
        left,
        right,
        summary.status.description(),
        summary.frames
    );
    if let Some(tally) = tally {
        tracing::info!(
            "Events: {} dwells ({} cancelled), {} points, {} matches",
            tally.dwells,
            tally.cancelled,
            tally.points,
            tally.matches
        );
    }
}

fn run_game(
    config: Config,
    frames: &Path,
    looping: bool,
    options: RunOptions,
) -> AppResult<RunSummary> {
    let source = ImageSequenceSource::open(frames)
        .with_context(|| format!("Failed to open frame directory {}", frames.display()))?
        .looping(looping)
        .with_frame_size(config.capture.frame_width, config.capture.frame_height);

    if let Some(dir) = &options.annotate_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create annotation directory {}", dir.display()))?;
    }

    let stop = runner::stop_flag();
    let stop_handler = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        tracing::info!("Shutting down...");
        stop_handler.store(true, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl+C handler")?;

    let bus = EventBus::new();
    let tally = spawn_event_tally(&bus);

    let mut game = GameLoop::new(
        &config,
        Box::new(source),
        Box::new(ColorBlobLocator::from_config(&config.tracking)),
        ConsoleDisplay::new(),
        bus,
        Arc::new(SystemClock),
        stop,
    );

    tracing::info!("Referee ready, press Ctrl+C to stop");
    let summary = game.run(&options);
    log_summary(&summary, tally.join().ok());
    Ok(summary)
}

fn replay_trace(config: &Config, trace: &Path) -> AppResult<RunSummary> {
    let bus = EventBus::new();
    let tally = spawn_event_tally(&bus);

    let summary = runner::replay_file(trace, config, bus)
        .with_context(|| format!("Failed to replay {}", trace.display()))?;

    log_summary(&summary, tally.join().ok());
    Ok(summary)
}

fn run(cli: Cli) -> AppResult<()> {
    let (mut config, config_path) = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Run {
            frames,
            fps,
            looping,
            annotate,
            max_frames,
            record,
        } => {
            if let Some(fps) = fps {
                config.capture.fps = fps;
                config.validate().context("Invalid --fps")?;
            }
            let options = RunOptions {
                max_frames,
                annotate_dir: annotate,
                record_trace: record,
                unpaced: false,
            };
            run_game(config, &frames, looping, options)?;
        }
        Command::Replay { trace } => {
            replay_trace(&config, &trace)?;
        }
        Command::Config { write } => {
            let json = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
            println!("{}", json);
            if write {
                config
                    .save(&config_path)
                    .with_context(|| format!("Failed to write {}", config_path.display()))?;
                tracing::info!("Config written to {}", config_path.display());
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let log_guard = initialize_tracing();
    log_runtime_environment();

    let result = run(cli);
    if let Err(e) = &result {
        tracing::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
    }

    // Flush the file writer before exiting
    drop(log_guard);
    if result.is_err() {
        std::process::exit(1);
    }
}
