// src/state.rs

//! Shared "latest image" record.
//!
//! The engine worker is the only writer; HTTP handlers take snapshot copies
//! under the lock. The lock is never held across I/O.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// The currently published file.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestImage {
    pub path: PathBuf,
    pub mtime: SystemTime,
    pub size: u64,
    /// Strictly increases on every successful replace. Used by the HTTP
    /// layer for cache busting and weak ETags.
    pub version: u64,
}

impl LatestImage {
    /// File name component, lossy. Paths produced by the scanner always have
    /// a final component.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Modification time as fractional seconds since the Unix epoch.
    pub fn mtime_secs(&self) -> f64 {
        self.mtime
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// Handle to the process-wide latest-image record.
///
/// Cheap to clone; all clones observe the same record.
#[derive(Debug, Clone, Default)]
pub struct SharedLatest {
    inner: Arc<Mutex<Option<LatestImage>>>,
}

impl SharedLatest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current record, if any.
    pub fn snapshot(&self) -> Option<LatestImage> {
        self.inner.lock().expect("latest-state lock poisoned").clone()
    }

    /// Replace the record with a newly resolved file, bumping the version.
    ///
    /// Returns the version assigned to this update.
    pub fn replace(&self, path: PathBuf, mtime: SystemTime, size: u64) -> u64 {
        let mut guard = self.inner.lock().expect("latest-state lock poisoned");
        let version = guard.as_ref().map(|l| l.version).unwrap_or(0) + 1;
        *guard = Some(LatestImage {
            path,
            mtime,
            size,
            version,
        });
        version
    }
}

/// `LatestSink` that publishes resolved files into the shared record
/// (serve mode).
#[derive(Debug)]
pub struct StateSink {
    latest: SharedLatest,
}

impl StateSink {
    pub fn new(latest: SharedLatest) -> Self {
        Self { latest }
    }
}

impl crate::engine::LatestSink for StateSink {
    fn deliver(
        &mut self,
        resolved: crate::engine::ResolvedFile,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = crate::errors::Result<()>> + Send + '_>,
    > {
        Box::pin(async move {
            let name = resolved
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let version = self
                .latest
                .replace(resolved.path, resolved.mtime, resolved.size);
            tracing::info!(file = %name, size = resolved.size, version, "latest image updated");
            Ok(())
        })
    }
}
