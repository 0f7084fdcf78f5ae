// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `lastframe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "lastframe",
    version,
    about = "Relay the newest image from a watched directory: serve it over HTTP or push it downstream.",
    long_about = None
)]
pub struct CliArgs {
    #[command(flatten)]
    pub watch: WatchArgs,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LASTFRAME_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub mode: Mode,
}

/// Options shared by both modes: what to watch and when a file counts as done.
#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    /// Directory to monitor.
    #[arg(long, value_name = "PATH")]
    pub dir: String,

    /// Glob pattern(s) to include (e.g. --pattern '*.tif'). Repeatable.
    ///
    /// No patterns means: accept every non-hidden file.
    #[arg(long = "pattern", value_name = "GLOB")]
    pub patterns: Vec<String>,

    /// Seconds a file's size and mtime must stay unchanged before use.
    #[arg(long, value_name = "SECS", default_value_t = 1.5)]
    pub debounce: f64,

    /// If > 0, enable a polling fallback at this interval (seconds).
    #[arg(long, value_name = "SECS", default_value_t = 0.0)]
    pub poll_interval: f64,

    /// Window (seconds) for collapsing bursts of triggers into one re-check.
    #[arg(long, value_name = "SECS", default_value_t = 0.75)]
    pub coalesce_window: f64,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Mode {
    /// Serve the latest image over HTTP for live inspection.
    Serve(ServeArgs),
    /// Push the latest image to a downstream HTTP endpoint.
    Publish(PublishArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Web server host.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Web server port.
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
}

#[derive(Debug, Clone, Args)]
pub struct PublishArgs {
    /// Web service URL to POST the file to.
    #[arg(long, value_name = "URL")]
    pub endpoint: String,

    /// Form field name for the file upload.
    #[arg(long, default_value = "file")]
    pub field_name: String,

    /// Env var name holding a Bearer token (optional).
    #[arg(long, value_name = "VAR", default_value = "UPLOAD_TOKEN")]
    pub token_env: String,

    /// Extra static form fields as key=value. Repeatable.
    #[arg(long = "extra", value_name = "KEY=VALUE")]
    pub extra: Vec<String>,

    /// HTTP request timeout (seconds).
    #[arg(long, value_name = "SECS", default_value_t = 30.0)]
    pub timeout: f64,

    /// Max upload attempts per resolved file.
    #[arg(long, default_value_t = 4)]
    pub attempts: u32,

    /// Initial backoff between retries (seconds), doubled each retry.
    #[arg(long, value_name = "SECS", default_value_t = 1.0)]
    pub backoff: f64,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
