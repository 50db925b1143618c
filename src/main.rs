use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gesture_presenter::config::{BackendConfig, Config};
use gesture_presenter::dispatch::{self, RecordingDispatcher};
use gesture_presenter::feed::{self, FeedFrame};
use gesture_presenter::gesture::GestureEngine;
use gesture_presenter::hud::Hud;
use gesture_presenter::presenter::{Presenter, run_live, run_replay};

#[derive(Parser)]
#[command(name = "gesture-presenter", about = "Control slides with hand gestures")]
struct Cli {
    /// Config file (defaults to ./config.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Landmark feed, one JSON object per line ("-" for stdin)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Override the configured dispatch backend
    #[arg(long, value_enum)]
    backend: Option<BackendConfig>,

    /// Print commands instead of pressing keys
    #[arg(long)]
    dry_run: bool,

    /// Hide the terminal status line
    #[arg(long)]
    no_hud: bool,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Run a recorded feed using its timestamps and print the commands
    Replay { path: PathBuf },
    /// Print the effective configuration
    ShowConfig,
}

/// Frames buffered between the feed reader and the engine
const FEED_QUEUE: usize = 8;

#[hotpath::main]
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.log_level);

    match &cli.command {
        Some(Mode::ShowConfig) => {
            print!(
                "{}",
                toml::to_string_pretty(&config).context("serializing configuration")?
            );
            Ok(())
        }
        Some(Mode::Replay { path }) => run_replay_mode(&config, path),
        None => run_live_mode(&cli, &config),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                bail!("config file {} not found", path.display());
            }
            Config::load_from(path).context("loading configuration")
        }
        None => Config::load().context("loading configuration"),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_live_mode(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let detection = &config.detection;
    info!(
        max_num_hands = detection.max_num_hands,
        min_detection_confidence = detection.min_detection_confidence,
        min_tracking_confidence = detection.min_tracking_confidence,
        camera_index = detection.camera_index,
        "Starting Gesture Presenter (two-hand lock enabled)"
    );

    let backend = if cli.dry_run {
        BackendConfig::Log
    } else {
        cli.backend.unwrap_or(config.output.backend)
    };
    let dispatcher = dispatch::from_config(backend).context("initializing command dispatcher")?;

    let reader = feed::open(cli.input.as_deref()).with_context(|| match &cli.input {
        Some(path) => format!("opening landmark feed {}", path.display()),
        None => "opening landmark feed on stdin".to_string(),
    })?;

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))
        .context("installing Ctrl+C handler")?;

    let (frame_tx, frame_rx) = flume::bounded::<FeedFrame>(FEED_QUEUE);
    let reader_handle = feed::spawn_reader(reader, frame_tx, Arc::clone(&running));

    let engine = GestureEngine::new(config.timing.to_timings());
    let hud = Hud::new(config.output.hud && !cli.no_hud);
    let mut presenter = Presenter::new(engine, dispatcher, hud);

    let frames = run_live(&mut presenter, &frame_rx, &running);
    presenter.into_dispatcher();

    // The reader may still be blocked on input after Ctrl+C
    if running.load(Ordering::SeqCst) {
        let _ = reader_handle.join();
    }

    info!(frames, "Application exited");
    Ok(())
}

fn run_replay_mode(config: &Config, path: &Path) -> anyhow::Result<()> {
    let reader = feed::open(Some(path))
        .with_context(|| format!("opening landmark feed {}", path.display()))?;

    let engine = GestureEngine::new(config.timing.to_timings());
    let mut presenter = Presenter::new(engine, RecordingDispatcher::default(), Hud::new(false));

    let entries = run_replay(&mut presenter, feed::frames(reader));
    for entry in &entries {
        println!("t={:.3} {}", entry.at, entry.command);
    }

    info!(commands = entries.len(), "Replay finished");
    Ok(())
}
