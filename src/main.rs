use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use readiness::cli::{Cli, CliHandler, Commands};
use readiness::config::LoaderConfig;
use readiness::startup::{LoaderView, ReadinessHandle, ReadinessTracker, StepRunner};
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command();

    init_logging(&command, &cli.log_file, cli.debug)?;
    if cli.debug {
        tracing::info!("Debug mode enabled - verbose logging active");
    }

    let config_path = cli.config.as_deref();
    let mut stdout = io::stdout();

    // init-config never reads the existing file
    match command {
        Commands::InitConfig { force } => {
            CliHandler::init_config(config_path, force, &mut stdout).await
        }
        Commands::Run => run_loader(LoaderConfig::load(config_path).await?).await,
        Commands::Plain => {
            let config = LoaderConfig::load(config_path).await?;
            CliHandler::new(config).plain(&mut stdout).await
        }
        Commands::Check => {
            let config = LoaderConfig::load(config_path).await?;
            CliHandler::new(config).check(&mut stdout)
        }
    }
}

/// Full-screen mode logs to a file so output does not corrupt the overlay
fn init_logging(command: &Commands, log_file: &Path, debug: bool) -> Result<()> {
    let log_level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    if *command == Commands::Run {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

        tracing_subscriber::fmt()
            .with_writer(file)
            .with_ansi(false)
            .with_max_level(log_level)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_max_level(log_level)
            .init();
    }
    Ok(())
}

async fn run_loader(config: LoaderConfig) -> Result<()> {
    let tracker = ReadinessTracker::new(config.steps())?;
    let mut state_rx = tracker.subscribe();
    let handle = ReadinessHandle::new(tracker);

    let mut runner = StepRunner::new(handle.clone());
    runner.spawn_simulated(config.tasks(), config.run_mode);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_event_loop(&mut terminal, &config, &handle, &mut state_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    match result? {
        LoopOutcome::Dismissed => {
            runner.wait().await?;
            println!("{} - ready in {:.1}s", config.title, handle.elapsed().as_secs_f64());
        }
        LoopOutcome::Aborted => {
            tracing::info!("Loading session aborted by user");
            runner.cancel();
        }
    }
    Ok(())
}

enum LoopOutcome {
    Dismissed,
    Aborted,
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &LoaderConfig,
    handle: &ReadinessHandle,
    state_rx: &mut tokio::sync::watch::Receiver<readiness::startup::ReadinessState>,
) -> Result<LoopOutcome> {
    let theme = config.theme();
    let tick_rate = config.tick_rate();
    let mut view = LoaderView::new(config.title.clone(), config.transitions());

    loop {
        let now = Instant::now();
        // Unchanged states render to an identical tree and start no transitions
        let state = state_rx.borrow_and_update().clone();
        view.update(&state, now);
        view.tick(now);

        if view.is_dismissed(now) {
            return Ok(LoopOutcome::Dismissed);
        }

        let elapsed = handle.elapsed();
        terminal.draw(|frame| {
            let area = frame.size();
            view.draw(frame, area, &theme, elapsed, now);
        })?;

        // Poll input without blocking the runtime for longer than a tick
        if event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                {
                    return Ok(LoopOutcome::Aborted);
                }
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(tick_rate) => {}
            _ = state_rx.changed() => {}
        }
    }
}
