// src/watch/watcher.rs

use std::path::PathBuf;
use std::time::{Duration, Instant};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::EngineEvent;
use crate::errors::Result;
use crate::watch::FileFilter;

/// Accepted events within this window of the previous accepted event are
/// dropped, so a large file being flushed byte-by-byte does not re-trigger a
/// scan per flush.
const EVENT_QUIET_WINDOW: Duration = Duration::from_millis(300);

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive
/// for as long as needed. Dropping this handle stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher on `dir` (non-recursive) that rate-limits
/// qualifying events into `EngineEvent::Trigger`s on `engine_tx`.
///
/// An event qualifies when it creates/modifies/renames a file whose name
/// passes `filter`. The bridge task ends on its own once the engine side of
/// the channel goes away.
pub fn spawn_watcher(
    dir: impl Into<PathBuf>,
    filter: FileFilter,
    engine_tx: mpsc::Sender<EngineEvent>,
) -> Result<WatcherHandle> {
    let dir = dir.into();
    // Canonicalize once so we watch a stable path.
    let dir = dir.canonicalize().unwrap_or(dir);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    // Receiver gone means we are shutting down; nothing to do.
                    let _ = event_tx.send(event);
                }
                Err(err) => {
                    // Can't easily log via tracing from notify's thread.
                    eprintln!("lastframe: file watch error: {err}");
                }
            }
        },
        Config::default(),
    )?;

    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    info!("file watcher started on {:?}", dir);

    tokio::spawn(async move {
        let mut last_accepted: Option<Instant> = None;

        while let Some(event) = event_rx.recv().await {
            if !event_qualifies(&event, &filter) {
                continue;
            }

            let now = Instant::now();
            if let Some(prev) = last_accepted {
                if now.duration_since(prev) < EVENT_QUIET_WINDOW {
                    continue;
                }
            }
            last_accepted = Some(now);

            debug!(?event, "qualifying filesystem event -> trigger");
            if engine_tx.send(EngineEvent::Trigger(now)).await.is_err() {
                // Engine is gone; no point keeping the bridge alive.
                break;
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Does this notify event concern a matching, non-hidden file?
fn event_qualifies(event: &Event, filter: &FileFilter) -> bool {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return false;
    }
    event.paths.iter().any(|path| {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| filter.matches(name))
    })
}
