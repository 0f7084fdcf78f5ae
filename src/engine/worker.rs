// src/engine/worker.rs

//! The coalescing worker loop.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::{STABILITY_CHECK_EVERY, WatchConfig};
use crate::errors::Result;
use crate::watch::{FileFilter, Stability, latest_file, wait_until_stable};

use super::{EngineEvent, LatestSink, ResolvedFile};

/// Consumes engine events, coalesces trigger bursts and drives resolution.
///
/// Per coalesced batch: drain the channel for up to the coalescing window
/// (keeping only the fact that *a* trigger occurred), scan for the current
/// top candidate, wait for it to stabilize on a blocking thread, then hand
/// it to the sink. A missing or vanished candidate silently ends the batch;
/// the next trigger re-resolves.
pub struct Worker<S: LatestSink> {
    cfg: WatchConfig,
    filter: FileFilter,
    event_rx: mpsc::Receiver<EngineEvent>,
    sink: S,
    /// Raised by the shutdown path so an in-progress stability wait is
    /// abandoned instead of holding up exit for the full debounce.
    cancel: Arc<AtomicBool>,
}

impl<S: LatestSink> std::fmt::Debug for Worker<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("dir", &self.cfg.dir)
            .finish_non_exhaustive()
    }
}

impl<S: LatestSink> Worker<S> {
    pub fn new(
        cfg: WatchConfig,
        filter: FileFilter,
        event_rx: mpsc::Receiver<EngineEvent>,
        sink: S,
    ) -> Self {
        Self {
            cfg,
            filter,
            event_rx,
            sink,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that abandons an in-progress stability wait; the shutdown path
    /// raises it before (or instead of) sending [`EngineEvent::Shutdown`].
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Main loop: one resolution pass per coalesced trigger batch.
    pub async fn run(mut self) -> Result<()> {
        info!("engine worker started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("engine event channel closed; exiting");
                    break;
                }
            };

            match event {
                EngineEvent::Shutdown => {
                    info!("shutdown requested; stopping engine worker");
                    break;
                }
                EngineEvent::Trigger(at) => {
                    debug!(?at, "trigger received; coalescing");
                    if !self.drain_triggers().await {
                        info!("shutdown requested during coalescing; stopping");
                        break;
                    }
                    self.resolve_now().await;
                }
            }
        }

        info!("engine worker exiting");
        Ok(())
    }

    /// Swallow follow-up triggers until the channel stays quiet for the
    /// coalescing window. Returns false when shutdown was seen.
    async fn drain_triggers(&mut self) -> bool {
        loop {
            match timeout(self.cfg.coalesce_window, self.event_rx.recv()).await {
                Ok(Some(EngineEvent::Trigger(_))) => continue,
                Ok(Some(EngineEvent::Shutdown)) | Ok(None) => return false,
                Err(_elapsed) => return true,
            }
        }
    }

    /// One resolution pass: scan, stabilize, deliver.
    ///
    /// Also used directly at startup so pre-existing files are picked up
    /// without waiting for a filesystem event.
    pub async fn resolve_now(&mut self) {
        let dir = self.cfg.dir.clone();
        let filter = self.filter.clone();
        let debounce = self.cfg.debounce;
        let cancel = Arc::clone(&self.cancel);

        // Scanning and the stability wait both block, so they run on a
        // disposable blocking thread, never on the runtime's core threads.
        let resolved = tokio::task::spawn_blocking(move || {
            let path = latest_file(&dir, &filter)?;
            match wait_until_stable(&path, debounce, STABILITY_CHECK_EVERY, &cancel) {
                Stability::Stable { size, mtime } => Some(ResolvedFile { path, size, mtime }),
                Stability::Vanished => {
                    debug!(path = %path.display(), "candidate vanished during stability wait");
                    None
                }
                Stability::Cancelled => {
                    debug!(path = %path.display(), "stability wait cancelled by shutdown");
                    None
                }
            }
        })
        .await;

        match resolved {
            Ok(Some(file)) => {
                debug!(path = %file.path.display(), size = file.size, "candidate stable; delivering");
                if let Err(err) = self.sink.deliver(file).await {
                    error!(%err, "failed to deliver resolved file");
                }
            }
            Ok(None) => {
                debug!("no deliverable candidate this batch");
            }
            Err(err) => {
                warn!(%err, "resolution task panicked or was cancelled");
            }
        }
    }
}
