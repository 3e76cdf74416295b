use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::LoaderConfig;
use crate::startup::{
    diff_rows, LoaderView, ReadinessHandle, ReadinessTracker, RowChange, StepRunner,
};

/// Readiness - animated multi-step loading screen for the terminal
#[derive(Parser, Debug)]
#[command(name = "readiness")]
#[command(about = "Show a multi-step loading overlay while initialization tasks complete")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Loader configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log file used while the full-screen loader is active
    #[arg(long, global = true, default_value = "readiness.log")]
    pub log_file: PathBuf,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show the full-screen loader while simulated initializers run
    Run,

    /// Print step changes line by line instead of drawing an overlay
    Plain,

    /// Validate the configuration and print the step sequence
    Check,

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Handles the non-interactive subcommands
pub struct CliHandler {
    config: LoaderConfig,
}

impl CliHandler {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Print the step sequence of the loaded configuration
    pub fn check<W: Write>(&self, out: &mut W) -> Result<()> {
        self.config.validate()?;
        ReadinessTracker::new(self.config.steps())?;

        writeln!(out, "{} ({} steps)", self.config.title, self.config.steps.len())?;
        for (index, step) in self.config.steps.iter().enumerate() {
            let marker = if step.done { "✓" } else { " " };
            writeln!(
                out,
                "{:>3}. [{}] {:<16} {} ({} ms)",
                index + 1,
                marker,
                step.id,
                step.message,
                step.delay_ms
            )?;
        }
        Ok(())
    }

    /// Write the default configuration, refusing to clobber an existing file
    ///
    /// Runs without a loaded configuration, so a missing or broken file at
    /// `config_path` can be created or replaced.
    pub async fn init_config<W: Write>(
        config_path: Option<&Path>,
        force: bool,
        out: &mut W,
    ) -> Result<()> {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(LoaderConfig::config_file_path);

        if path.exists() && !force {
            writeln!(out, "{} already exists (use --force to overwrite)", path.display())?;
            return Ok(());
        }

        let written = LoaderConfig::default().save(Some(&path)).await?;
        writeln!(out, "Wrote {}", written.display())?;
        Ok(())
    }

    /// Run a session, printing each row change as it happens
    pub async fn plain<W: Write>(&self, out: &mut W) -> Result<()> {
        let tracker = ReadinessTracker::new(self.config.steps())?;
        let mut state_rx = tracker.subscribe();
        let handle = ReadinessHandle::new(tracker);
        let view = LoaderView::new(self.config.title.clone(), self.config.transitions());

        let mut runner = StepRunner::new(handle.clone());
        runner.spawn_simulated(self.config.tasks(), self.config.run_mode);

        writeln!(out, "{}", self.config.title)?;
        let mut previous = Vec::new();
        loop {
            let state = state_rx.borrow_and_update().clone();
            let tree = view.render(&state);
            for change in diff_rows(&previous, &tree.rows) {
                match change {
                    RowChange::Entered(row) | RowChange::Completed(row) => {
                        writeln!(out, "  {}", row.line())?
                    }
                    RowChange::Exited(_) => {}
                }
            }
            out.flush()?;
            previous = tree.rows;

            if state.all_ready {
                writeln!(out, "Ready in {:.1}s", handle.elapsed().as_secs_f64())?;
                break;
            }
            if state_rx.changed().await.is_err() {
                break;
            }
        }

        runner.wait().await?;
        Ok(())
    }
}
