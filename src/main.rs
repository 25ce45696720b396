//! Entry point for the pace-keeper simulator.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml` (or `--config`).
//! - Wire the simulated player, transcript directory and preference file
//!   into the orchestrator and drive the playlist to completion.

use anyhow::{Context, Result, anyhow, bail};
use pace_keeper::cache::FilePreferenceStore;
use pace_keeper::cancellation::CancellationToken;
use pace_keeper::config::{AppConfig, load_config};
use pace_keeper::orchestrator::{Collaborators, Event, Orchestrator};
use pace_keeper::probe::TracingDisplay;
use pace_keeper::runtime::Runtime;
use pace_keeper::simulator::{AdBreak, PlaylistEntry, SimulatedPlayer, run_playlist};
use pace_keeper::transcript::{DirectoryTranscriptProvider, TranscriptProvider};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const USAGE: &str = "Usage: pace-keeper [--config PATH] [--time-scale N] [--ad-at SECS] \
                     [--ad-length SECS] <transcript-dir> <video-id>...";
/// Wall-clock granularity of the simulated playhead.
const SIMULATION_STEP: Duration = Duration::from_millis(100);
/// Played past the last cue so the final stretch is observed.
const TRAILING_SECS: f64 = 5.0;
/// Length used when a video has no usable transcript.
const FALLBACK_DURATION_SECS: f64 = 60.0;

#[derive(Debug)]
struct CliArgs {
    config_path: PathBuf,
    time_scale: f64,
    ad_at: Option<f64>,
    ad_length: f64,
    transcript_dir: PathBuf,
    video_ids: Vec<String>,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    let config = load_config(&args.config_path);
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        config = %args.config_path.display(),
        transcripts = %args.transcript_dir.display(),
        videos = args.video_ids.len(),
        time_scale = args.time_scale,
        level = %config.log_level,
        "Starting pace-keeper"
    );

    let provider: Arc<dyn TranscriptProvider> =
        Arc::new(DirectoryTranscriptProvider::new(&args.transcript_dir));
    let playlist = build_playlist(&args, provider.as_ref());

    let tokio_runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to build the async runtime")?;
    tokio_runtime.block_on(simulate(config, args, provider, playlist))
}

async fn simulate(
    config: AppConfig,
    args: CliArgs,
    provider: Arc<dyn TranscriptProvider>,
    playlist: Vec<PlaylistEntry>,
) -> Result<()> {
    let player = SimulatedPlayer::new();
    let store = FilePreferenceStore::in_cache_dir(Path::new(&config.cache_dir));
    info!(path = %store.path().display(), "Preference store");
    let orchestrator = Orchestrator::new(
        &config,
        Collaborators {
            player: Box::new(player.clone()),
            page: Box::new(player.page()),
            store: Box::new(store),
            display: Box::new(TracingDisplay),
        },
    );

    let shutdown = CancellationToken::new();
    let runtime = Runtime::new(orchestrator, provider, &config, shutdown.clone());
    let events = runtime.sender();
    let interrupt = events.clone();
    shutdown.cancel_on_ctrlc(move || {
        let _ = interrupt.send(Event::Shutdown);
    })?;

    let driver = tokio::spawn(run_playlist(
        player.clone(),
        events,
        playlist,
        SIMULATION_STEP,
        args.time_scale,
        shutdown.clone(),
    ));

    let orchestrator = runtime.run().await?;
    shutdown.cancel();
    match driver.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!("Playlist stopped early: {err:#}"),
        Err(err) => warn!("Playlist task failed: {err}"),
    }

    info!(
        rate_writes = player.rate_writes().len(),
        final_rate = orchestrator.current_rate(),
        enabled = orchestrator.preferences().enabled,
        multiplier = orchestrator.preferences().target_multiplier,
        "Simulation finished"
    );
    Ok(())
}

/// Size each video from its transcript so playback covers every cue.
fn build_playlist(args: &CliArgs, provider: &dyn TranscriptProvider) -> Vec<PlaylistEntry> {
    args.video_ids
        .iter()
        .map(|video_id| {
            let duration_secs = match provider.fetch(video_id) {
                Ok(transcript) if !transcript.is_empty() => {
                    transcript.duration_secs() + TRAILING_SECS
                }
                Ok(_) => FALLBACK_DURATION_SECS,
                Err(err) => {
                    warn!(video_id = %video_id, "Sizing without transcript: {err}");
                    FALLBACK_DURATION_SECS
                }
            };
            let ads = args
                .ad_at
                .filter(|at| *at < duration_secs)
                .map(|at_secs| AdBreak {
                    at_secs,
                    length_secs: args.ad_length,
                })
                .into_iter()
                .collect();
            PlaylistEntry {
                video_id: video_id.clone(),
                duration_secs,
                ads,
            }
        })
        .collect()
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut config_path = PathBuf::from("conf/config.toml");
    let mut time_scale = 1.0;
    let mut ad_at = None;
    let mut ad_length = 15.0;
    let mut positional = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config_path = PathBuf::from(flag_value(&mut args, "--config")?);
            }
            "--time-scale" => {
                time_scale = parse_secs(&flag_value(&mut args, "--time-scale")?)?;
                if time_scale <= 0.0 {
                    bail!("--time-scale must be positive");
                }
            }
            "--ad-at" => ad_at = Some(parse_secs(&flag_value(&mut args, "--ad-at")?)?),
            "--ad-length" => ad_length = parse_secs(&flag_value(&mut args, "--ad-length")?)?,
            flag if flag.starts_with("--") => bail!("Unknown flag {flag}\n{USAGE}"),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let transcript_dir = PathBuf::from(positional.next().ok_or_else(|| anyhow!(USAGE))?);
    if !transcript_dir.is_dir() {
        return Err(anyhow!(
            "Transcript directory not found: {}",
            transcript_dir.display()
        ));
    }
    let video_ids: Vec<String> = positional.collect();
    if video_ids.is_empty() {
        bail!(USAGE);
    }

    Ok(CliArgs {
        config_path,
        time_scale,
        ad_at,
        ad_length,
        transcript_dir,
        video_ids,
    })
}

fn flag_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("{flag} expects a value\n{USAGE}"))
}

fn parse_secs(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .parse()
        .with_context(|| format!("Not a number: {raw}"))?;
    if !value.is_finite() || value < 0.0 {
        bail!("Expected a non-negative number, got {raw}");
    }
    Ok(value)
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    warn!("Logging initialized; override level with config.log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    if env::var_os("RUST_LOG").is_some() {
        info!("RUST_LOG set; ignoring config log level");
        return;
    }
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
