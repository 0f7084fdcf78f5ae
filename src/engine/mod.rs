// src/engine/mod.rs

//! Trigger coalescing and latest-file resolution.
//!
//! Two producers (the notify bridge and the optional poll loop) write
//! [`EngineEvent`]s into one bounded channel. A single worker consumes them,
//! collapses bursts, resolves the newest stable file and hands it to a
//! mode-specific [`LatestSink`]:
//! - serve mode updates the shared latest-image record,
//! - publish mode uploads the file downstream with retry/backoff.
//!
//! Intermediate files may be skipped by design; only the newest file at
//! resolution time matters.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::{Instant, SystemTime};

use crate::errors::Result;

pub mod worker;

pub use worker::Worker;

/// Events flowing into the engine worker.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The watched directory may have changed; re-check. Several of these in
    /// quick succession mean the same thing as one.
    Trigger(Instant),
    /// Graceful shutdown requested (e.g. Ctrl-C).
    Shutdown,
}

/// A candidate that survived the stability wait.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub size: u64,
    pub mtime: SystemTime,
}

/// Where resolved files go. Implemented by the serve-mode state updater and
/// the publish-mode uploader.
pub trait LatestSink: Send {
    fn deliver(
        &mut self,
        resolved: ResolvedFile,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}
