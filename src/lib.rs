// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod publish;
pub mod serve;
pub mod state;
pub mod watch;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tracing::info;

use crate::cli::{CliArgs, Mode};
use crate::config::{PublishConfig, ServeConfig, WatchConfig};
use crate::engine::{EngineEvent, Worker};
use crate::errors::Result;
use crate::publish::{UploadSink, Uploader};
use crate::serve::AppState;
use crate::state::{SharedLatest, StateSink};
use crate::watch::FileFilter;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config validation
/// - the notify watcher and (optional) poll loop
/// - the coalescing engine worker with the mode-specific sink
/// - the HTTP server (serve mode)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let watch_cfg = WatchConfig::from_args(&args.watch)?;
    let filter = FileFilter::new(&watch_cfg.patterns)?;

    // Both notification channels and the Ctrl-C task funnel into this one
    // bounded channel; the worker is its only consumer.
    let (engine_tx, engine_rx) = mpsc::channel::<EngineEvent>(64);

    let _watcher_handle =
        watch::spawn_watcher(watch_cfg.dir.clone(), filter.clone(), engine_tx.clone())?;

    if let Some(interval) = watch_cfg.poll_interval {
        watch::spawn_poller(
            watch_cfg.dir.clone(),
            filter.clone(),
            interval,
            engine_tx.clone(),
        );
    }

    match args.mode {
        Mode::Serve(serve_args) => {
            let serve_cfg = ServeConfig::from_args(&serve_args);
            let latest = SharedLatest::new();

            let mut worker = Worker::new(
                watch_cfg,
                filter,
                engine_rx,
                StateSink::new(latest.clone()),
            );
            spawn_ctrl_c(engine_tx.clone(), worker.cancel_flag());
            // Pick up files that already exist before accepting requests.
            worker.resolve_now().await;

            let app_state = AppState::new(latest);
            let worker_task = tokio::spawn(worker.run());

            tokio::select! {
                res = serve::serve(&serve_cfg, app_state) => res,
                res = worker_task => res.map_err(anyhow::Error::from)?,
            }
        }
        Mode::Publish(publish_args) => {
            let publish_cfg = PublishConfig::from_args(&publish_args)?;
            let uploader = Uploader::new(publish_cfg)?;

            let worker = Worker::new(watch_cfg, filter, engine_rx, UploadSink::new(uploader));
            spawn_ctrl_c(engine_tx.clone(), worker.cancel_flag());
            worker.run().await
        }
    }
}

/// Ctrl-C → graceful shutdown: raise the cancel flag first so an in-progress
/// stability wait is abandoned, then queue the shutdown event.
fn spawn_ctrl_c(tx: mpsc::Sender<EngineEvent>, cancel: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        info!("Ctrl-C received; shutting down");
        cancel.store(true, Ordering::Relaxed);
        let _ = tx.send(EngineEvent::Shutdown).await;
    });
}
