use std::{fs, io};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{error, info};

use trivial_tui::api::ApiClient;
use trivial_tui::app::App;
use trivial_tui::cli::{init_tracing, Cli};
use trivial_tui::config::{Config, API_URL_ENV};
use trivial_tui::dispatch::Dispatcher;
use trivial_tui::ui::run_app;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, source) = Config::load(cli.config.as_deref())?;
    config.apply_overrides(std::env::var(API_URL_ENV).ok(), cli.api_url.as_deref());

    let log_dir = config.log_dir();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log dir {}", log_dir.display()))?;
    let _guard = init_tracing(&log_dir, &config.log_filter, cli.verbose)?;
    source.log();
    info!(api_url = %config.api_url, start = %cli.open, "starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let client = ApiClient::new(&config.api_url).context("failed to build HTTP client")?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let dispatcher = Dispatcher::new(client, runtime.handle().clone(), tx);

    let mut app = App::new();
    app.start(cli.open);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(
        &mut terminal,
        &mut app,
        &dispatcher,
        &mut rx,
        config.tick_rate(),
    );

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        error!(error = %err, "UI loop failed");
    }
    runtime.shutdown_background();
    result.context("terminal I/O failed")
}
