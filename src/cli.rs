use std::path::{Path, PathBuf};

use anyhow::anyhow;
use clap::{ArgAction, Parser};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::session::Route;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "trivial",
    version,
    about = "Terminal client for the trivial freelance-task marketplace"
)]
pub struct Cli {
    /// Config file (default: <config dir>/trivial/config.toml)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Backend base URL; overrides the config file and TRIVIAL_API_URL
    #[arg(long = "api-url")]
    pub api_url: Option<String>,

    /// Route to open first, e.g. /tasks/7 or /account
    #[arg(long = "open", default_value = "/", value_parser = parse_route)]
    pub open: Route,

    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

fn parse_route(s: &str) -> Result<Route, String> {
    Route::parse(s).ok_or_else(|| format!("unknown route: {s}"))
}

fn level_for(base: &str, verbose: u8) -> String {
    match verbose {
        0 => base.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Logs go to a daily file under `log_dir`; the terminal belongs to the UI.
/// Keep the guard alive until exit or buffered lines are lost.
pub fn init_tracing(log_dir: &Path, filter: &str, verbose: u8) -> anyhow::Result<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level_for(filter, verbose)))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let appender = tracing_appender::rolling::daily(log_dir, "trivial.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_target(true)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("tracing subscriber already set: {e}"))?;

    Ok(guard)
}
