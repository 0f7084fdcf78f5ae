// src/watch/stability.rs

//! Blocking write-settlement detection.
//!
//! A file is "stable" once its (size, mtime) pair has stayed unchanged for a
//! continuous window. This intentionally blocks the calling thread for at
//! least that window; the engine runs it on `spawn_blocking`, never on an
//! HTTP-serving task. A shared cancel flag lets shutdown abandon a check
//! that is still waiting.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant, SystemTime};

/// Outcome of a stability wait.
#[derive(Debug, Clone, PartialEq)]
pub enum Stability {
    /// Unchanged for the full window; size/mtime are from the last stat.
    Stable { size: u64, mtime: SystemTime },
    /// The file disappeared before stability was reached.
    Vanished,
    /// The cancel flag was raised mid-wait (shutdown).
    Cancelled,
}

/// Block until `path` has kept the same (size, mtime) for `stable_for`, until
/// it vanishes, or until `cancel` is raised.
///
/// There is no timeout other than disappearance or cancellation: a file that
/// is perpetually rewritten keeps this call waiting, and a later trigger
/// supersedes it.
pub fn wait_until_stable(
    path: &Path,
    stable_for: Duration,
    check_every: Duration,
    cancel: &AtomicBool,
) -> Stability {
    let mut last: Option<(u64, SystemTime)> = None;
    let mut deadline: Option<Instant> = None;

    loop {
        if cancel.load(Ordering::Relaxed) {
            return Stability::Cancelled;
        }

        let meta = match std::fs::metadata(path) {
            Ok(meta) => meta,
            Err(_) => return Stability::Vanished,
        };
        let size = meta.len();
        let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let current = (size, mtime);

        if last == Some(current) {
            let end = *deadline.get_or_insert_with(|| Instant::now() + stable_for);
            if Instant::now() >= end {
                return Stability::Stable { size, mtime };
            }
        } else {
            last = Some(current);
            deadline = None;
        }

        std::thread::sleep(check_every);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;

    const STABLE_FOR: Duration = Duration::from_millis(80);
    const CHECK_EVERY: Duration = Duration::from_millis(10);

    fn no_cancel() -> AtomicBool {
        AtomicBool::new(false)
    }

    #[test]
    fn untouched_file_becomes_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.tif");
        fs::write(&path, vec![0u8; 100]).unwrap();

        match wait_until_stable(&path, STABLE_FOR, CHECK_EVERY, &no_cancel()) {
            Stability::Stable { size, .. } => assert_eq!(size, 100),
            other => panic!("file should have stabilized, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_reports_vanished() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never-written.tif");
        assert_eq!(
            wait_until_stable(&path, STABLE_FOR, CHECK_EVERY, &no_cancel()),
            Stability::Vanished
        );
    }

    #[test]
    fn deletion_mid_wait_reports_vanished() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.tif");
        fs::write(&path, b"x").unwrap();

        let waiter = {
            let path = path.clone();
            std::thread::spawn(move || {
                wait_until_stable(&path, Duration::from_secs(2), CHECK_EVERY, &no_cancel())
            })
        };
        std::thread::sleep(Duration::from_millis(50));
        fs::remove_file(&path).unwrap();

        assert_eq!(waiter.join().unwrap(), Stability::Vanished);
    }

    #[test]
    fn cancel_flag_abandons_the_wait() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.tif");
        fs::write(&path, b"x").unwrap();

        let cancel = Arc::new(AtomicBool::new(false));
        let waiter = {
            let path = path.clone();
            let cancel = Arc::clone(&cancel);
            std::thread::spawn(move || {
                wait_until_stable(&path, Duration::from_secs(60), CHECK_EVERY, &cancel)
            })
        };
        std::thread::sleep(Duration::from_millis(30));
        cancel.store(true, Ordering::Relaxed);

        assert_eq!(waiter.join().unwrap(), Stability::Cancelled);
    }

    #[test]
    fn rewrites_restart_the_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.tif");
        fs::write(&path, b"one").unwrap();

        let started = Instant::now();
        let waiter = {
            let path = path.clone();
            std::thread::spawn(move || {
                wait_until_stable(&path, STABLE_FOR, CHECK_EVERY, &no_cancel())
            })
        };
        // Keep growing the file for a while; stability must not be reached
        // until the writes stop.
        for i in 0..4u32 {
            std::thread::sleep(Duration::from_millis(40));
            fs::write(&path, vec![0u8; 10 + i as usize]).unwrap();
        }

        match waiter.join().unwrap() {
            Stability::Stable { .. } => {
                assert!(started.elapsed() >= Duration::from_millis(160 + 80));
            }
            other => panic!("expected stability, got {other:?}"),
        }
    }
}
