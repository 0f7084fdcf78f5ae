// src/config.rs

//! Immutable runtime configuration.
//!
//! Built exactly once from the parsed CLI arguments, validated, then passed
//! by reference to each component. Nothing mutates these after startup.

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::{PublishArgs, ServeArgs, WatchArgs};
use crate::errors::{LastframeError, Result};

/// How often the stability checker re-stats a candidate file.
pub const STABILITY_CHECK_EVERY: Duration = Duration::from_millis(400);

/// Watch-side configuration shared by both modes.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Directory to monitor (created at startup if absent).
    pub dir: PathBuf,
    /// Include globs; empty means "every non-hidden file".
    pub patterns: Vec<String>,
    /// How long a file's (size, mtime) must stay unchanged before use.
    pub debounce: Duration,
    /// Polling fallback interval; `None` disables the poll loop.
    pub poll_interval: Option<Duration>,
    /// Window for collapsing trigger bursts into a single re-check.
    pub coalesce_window: Duration,
}

impl WatchConfig {
    /// Validate and construct from CLI arguments.
    ///
    /// The watch directory is created if it does not exist yet; failure to
    /// create it is fatal.
    pub fn from_args(args: &WatchArgs) -> Result<Self> {
        if args.debounce < 0.0 {
            return Err(LastframeError::ConfigError(format!(
                "--debounce must be >= 0 (got {})",
                args.debounce
            )));
        }

        let dir = PathBuf::from(&args.dir);
        std::fs::create_dir_all(&dir).map_err(|e| {
            LastframeError::ConfigError(format!(
                "watch directory {} does not exist and cannot be created: {e}",
                dir.display()
            ))
        })?;

        Ok(Self {
            dir,
            patterns: args.patterns.clone(),
            debounce: Duration::from_secs_f64(args.debounce),
            poll_interval: (args.poll_interval > 0.0)
                .then(|| Duration::from_secs_f64(args.poll_interval)),
            coalesce_window: Duration::from_secs_f64(args.coalesce_window),
        })
    }
}

/// Serve-mode configuration.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
}

impl ServeConfig {
    pub fn from_args(args: &ServeArgs) -> Self {
        Self {
            host: args.host.clone(),
            port: args.port,
        }
    }
}

/// Publish-mode configuration.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub endpoint: String,
    pub field_name: String,
    /// Bearer token, read from the env var named by `--token-env`.
    pub token: Option<String>,
    /// Static extra form fields sent with every upload.
    pub extra: Vec<(String, String)>,
    pub timeout: Duration,
    pub attempts: u32,
    pub backoff: Duration,
}

impl PublishConfig {
    pub fn from_args(args: &PublishArgs) -> Result<Self> {
        if args.attempts == 0 {
            return Err(LastframeError::ConfigError(
                "--attempts must be >= 1 (got 0)".to_string(),
            ));
        }

        let mut extra = Vec::with_capacity(args.extra.len());
        for kv in &args.extra {
            match kv.split_once('=') {
                Some((k, v)) => extra.push((k.to_string(), v.to_string())),
                None => {
                    return Err(LastframeError::ConfigError(format!(
                        "--extra expects key=value (got '{kv}')"
                    )));
                }
            }
        }

        let token = std::env::var(&args.token_env).ok().filter(|t| !t.is_empty());

        Ok(Self {
            endpoint: args.endpoint.clone(),
            field_name: args.field_name.clone(),
            token,
            extra,
            timeout: Duration::from_secs_f64(args.timeout),
            attempts: args.attempts,
            backoff: Duration::from_secs_f64(args.backoff),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PublishArgs;

    fn publish_args() -> PublishArgs {
        PublishArgs {
            endpoint: "http://127.0.0.1:9/upload".to_string(),
            field_name: "file".to_string(),
            token_env: "LASTFRAME_TEST_NO_SUCH_VAR".to_string(),
            extra: Vec::new(),
            timeout: 5.0,
            attempts: 3,
            backoff: 0.5,
        }
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let mut args = publish_args();
        args.attempts = 0;
        assert!(PublishConfig::from_args(&args).is_err());
    }

    #[test]
    fn malformed_extra_is_rejected() {
        let mut args = publish_args();
        args.extra = vec!["novalue".to_string()];
        assert!(PublishConfig::from_args(&args).is_err());
    }

    #[test]
    fn extra_splits_on_first_equals_only() {
        let mut args = publish_args();
        args.extra = vec!["note=a=b".to_string()];
        let cfg = PublishConfig::from_args(&args).unwrap();
        assert_eq!(cfg.extra, vec![("note".to_string(), "a=b".to_string())]);
    }
}
