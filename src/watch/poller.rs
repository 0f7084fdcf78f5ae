// src/watch/poller.rs

//! Polling fallback for environments where filesystem notifications are
//! unreliable (network shares) or as a belt-and-braces companion to them.

use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::EngineEvent;
use crate::watch::{FileFilter, latest_file};

/// Spawn a loop that re-resolves the top candidate every `interval` and emits
/// a trigger when the candidate path changed or its mtime advanced.
///
/// The loop ends on its own once the engine side of the channel goes away.
pub fn spawn_poller(
    dir: PathBuf,
    filter: FileFilter,
    interval: Duration,
    engine_tx: mpsc::Sender<EngineEvent>,
) -> JoinHandle<()> {
    info!("polling {:?} every {:.2?}", dir, interval);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut last_seen: Option<(PathBuf, SystemTime)> = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = engine_tx.closed() => break,
            }

            let candidate = {
                let dir = dir.clone();
                let filter = filter.clone();
                tokio::task::spawn_blocking(move || {
                    latest_file(&dir, &filter).map(|path| {
                        let mtime = std::fs::metadata(&path)
                            .and_then(|m| m.modified())
                            .unwrap_or(SystemTime::UNIX_EPOCH);
                        (path, mtime)
                    })
                })
                .await
                .ok()
                .flatten()
            };

            let Some(current) = candidate else { continue };

            let advanced = match &last_seen {
                None => true,
                Some((path, mtime)) => current.0 != *path || current.1 > *mtime,
            };
            if !advanced {
                continue;
            }

            debug!(path = %current.0.display(), "poll observed a new or updated candidate");
            last_seen = Some(current);

            if engine_tx
                .send(EngineEvent::Trigger(Instant::now()))
                .await
                .is_err()
            {
                break;
            }
        }
        debug!("poll loop finished");
    })
}
