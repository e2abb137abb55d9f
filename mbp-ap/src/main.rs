//! Audio Player (mbp-ap) - Main entry point
//!
//! Runs a single playback session over the tracks given on the command line
//! and drives it from line commands on stdin:
//! `play`, `pause`, `next`, `prev`, `stop`, `status`, `quit`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mbp_ap::config::TomlConfig;
use mbp_ap::provider::FileProvider;
use mbp_ap::{Session, SessionHandle};
use mbp_common::events::{EventBus, SessionEvent};
use mbp_common::TrackReference;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "mbp-ap")]
#[command(about = "Playback session controller for the media browser")]
#[command(version)]
struct Args {
    /// Audio files to play, in order
    #[arg(required = true)]
    tracks: Vec<PathBuf>,

    /// Index of the first track to play (clamped to the playlist)
    #[arg(short, long, default_value_t = 0)]
    start: usize,

    /// Configuration file (overrides MBP_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "mbp_ap=trace"
    #[arg(short, long, env = "MBP_LOG")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing: RUST_LOG > --log-level/MBP_LOG > config file
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MBP Audio Player with {} tracks", args.tracks.len());
    debug!("Configuration: {:?}", config);

    let events = EventBus::new(config.session.event_capacity);
    let logger = tokio::spawn(log_events(events.subscribe()));

    let provider = FileProvider::new(config.position_interval());
    let (handle, session_task) = Session::spawn(provider, config.session_config(), events);

    let tracks: Vec<TrackReference> = args.tracks.iter().map(TrackReference::from_path).collect();
    handle
        .set_playlist(tracks, args.start)
        .await
        .context("Failed to set playlist")?;
    handle.play().await.context("Failed to start playback")?;

    tokio::select! {
        result = command_loop(&handle) => {
            result.context("Command input failed")?;
        }
        _ = shutdown_signal() => {}
    }

    handle.shutdown().await.context("Failed to shut down session")?;
    session_task.await.context("Session task panicked")?;
    logger.abort();

    info!("Shutdown complete");
    Ok(())
}

/// Read transport commands from stdin until `quit` or end of input
async fn command_loop(handle: &SessionHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let result = match line.trim() {
            "" => continue,
            "play" => handle.play().await,
            "pause" => handle.pause().await,
            "next" => handle.next().await,
            "prev" | "previous" => handle.previous().await,
            "stop" => handle.stop().await,
            "status" => handle.current_state().await.map(|snapshot| {
                let track = snapshot
                    .current_track
                    .as_ref()
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{} [{}/{}] {} {}/{} ms",
                    snapshot.state,
                    snapshot.cursor + 1,
                    snapshot.playlist_len,
                    track,
                    snapshot.position_ms,
                    snapshot.duration_ms
                );
            }),
            "quit" | "exit" => break,
            other => {
                warn!("Unknown command: {}", other);
                continue;
            }
        };

        if let Err(e) = result {
            warn!("Command failed: {}", e);
        }
    }

    Ok(())
}

/// Log every session event until the bus closes
async fn log_events(mut rx: tokio::sync::broadcast::Receiver<SessionEvent>) {
    loop {
        match rx.recv().await {
            Ok(SessionEvent::StateChanged {
                old_state,
                new_state,
                current_track,
                ..
            }) => {
                let track = current_track.map(|t| t.to_string()).unwrap_or_default();
                info!("State: {} -> {} {}", old_state, new_state, track);
            }
            Ok(SessionEvent::TrackChanged {
                track,
                cursor,
                auto_advance,
                ..
            }) => {
                info!("Track {}: {} (auto_advance={})", cursor, track, auto_advance);
            }
            Ok(SessionEvent::PlaybackFailed { track, error, .. }) => {
                let track = track.map(|t| t.to_string()).unwrap_or_default();
                warn!("Playback failed: {} {}", track, error);
            }
            Ok(event) => debug!("Event: {}", event.event_type()),
            Err(RecvError::Lagged(skipped)) => warn!("Event logger lagged, skipped {} events", skipped),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
