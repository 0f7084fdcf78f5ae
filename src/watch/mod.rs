// src/watch/mod.rs

//! Directory watching and latest-file resolution.
//!
//! This module is responsible for:
//! - Compiling the include glob patterns into a [`FileFilter`].
//! - One-shot scans that pick the newest matching file.
//! - Blocking until a candidate file has stopped changing.
//! - Wiring up a cross-platform filesystem watcher (`notify`) and an
//!   optional polling fallback, both feeding the engine's trigger channel.
//!
//! It does **not** decide what happens to a resolved file; it only turns
//! filesystem activity into "something relevant may have changed" triggers.

pub mod filter;
pub mod poller;
pub mod scanner;
pub mod stability;
pub mod watcher;

pub use filter::FileFilter;
pub use poller::spawn_poller;
pub use scanner::latest_file;
pub use stability::{Stability, wait_until_stable};
pub use watcher::{WatcherHandle, spawn_watcher};
