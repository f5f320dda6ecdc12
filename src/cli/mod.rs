//! Command-line interface for update-deps.
//!
//! ```bash
//! # Re-resolve every dependency, prompting for a forge token when interactive
//! bazel run //build/deps:update-deps
//!
//! # Only dependencies whose name starts with "capnp"
//! update-deps capnp
//!
//! # Show what the generated fragments are pinned to, offline
//! update-deps --status
//! ```
//!
//! Progress goes to stdout as one `Checking <name> ... <reference>` line per
//! dependency. Diagnostics go to stderr through `tracing`.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::{Settings, ToolConfig, deps_dir_from};
use crate::constants::{GEN_SUBDIR, WORKSPACE_DIR_ENV};
use crate::emitter::read_provenance;
use crate::updater::{UpdateEvent, UpdateOptions, UpdateSummary, Updater};

const TOKEN_HELP: &str = "Follow these steps to obtain a GitHub API access token with
appropriate permissions:

1. On github.com, go to
    Settings > Developer Settings > Personal access tokens > Fine-grained tokens.
2. Generate a new token with default settings.
";

/// Resolve external dependencies and regenerate their pinned fragments.
#[derive(Parser, Debug)]
#[command(
    name = "update-deps",
    about = "Resolve external dependencies and pin them in generated .bzl fragments",
    version
)]
pub struct Cli {
    /// Only update dependencies whose name starts with this prefix.
    ///
    /// Filtered runs keep fragments of other dependencies and never prompt
    /// for a token.
    #[arg(value_name = "NAME_PREFIX")]
    filter: Option<String>,

    /// Forge API access token for a higher rate limit.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Never prompt for a token, even on a terminal.
    #[arg(long)]
    no_prompt: bool,

    /// Directory holding deps.jsonc and build_deps.jsonc.
    ///
    /// Defaults to `$BUILD_WORKSPACE_DIRECTORY/build/deps`, then `./build/deps`.
    #[arg(long, value_name = "DIR")]
    deps_dir: Option<PathBuf>,

    /// Configuration file to use instead of `<deps-dir>/update-deps.toml`.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Resolve everything but write and delete nothing.
    #[arg(long)]
    dry_run: bool,

    /// Print what the generated fragments are pinned to and exit.
    #[arg(long, conflicts_with_all = ["filter", "dry_run"])]
    status: bool,

    /// Enable debug logging.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Run the command.
    pub async fn execute(self) -> Result<()> {
        self.init_logging();

        let cwd = std::env::current_dir().context("Failed to determine the current directory")?;
        let deps_dir = deps_dir_from(self.deps_dir.clone(), std::env::var_os(WORKSPACE_DIR_ENV), &cwd);
        tracing::debug!(deps_dir = %deps_dir.display(), "using deps directory");

        if self.status {
            return self.print_status(&deps_dir.join(GEN_SUBDIR)).await;
        }

        let tool = ToolConfig::load(&deps_dir, self.config.as_deref()).await?;
        let token = self.resolve_token()?;
        let settings = Settings {
            deps_dir,
            tool,
            github_token: None,
        }
        .with_token(token);

        let options = UpdateOptions {
            filter: self.filter.clone(),
            dry_run: self.dry_run,
        };
        let updater = Updater::new(&settings, options)?;
        let summary = updater.run(|event| self.print_event(event)).await?;
        self.print_summary(summary);
        Ok(())
    }

    fn init_logging(&self) {
        let filter = if self.verbose {
            EnvFilter::new("warn,deps_pin=debug,update_deps=debug")
        } else if self.quiet {
            EnvFilter::new("error")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Token from the flag or environment; otherwise ask, but only for an
    /// unfiltered run on an interactive terminal.
    fn resolve_token(&self) -> Result<Option<String>> {
        if self.token.is_some() {
            return Ok(self.token.clone());
        }
        if !self.should_prompt(std::io::stdin().is_terminal()) {
            return Ok(None);
        }

        println!("{TOKEN_HELP}");
        print!("Please enter GitHub API access token (or empty to skip): ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line).context("Failed to read access token")?;
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn should_prompt(&self, interactive: bool) -> bool {
        self.token.is_none() && self.filter.is_none() && !self.no_prompt && interactive
    }

    fn print_event(&self, event: &UpdateEvent) {
        if self.quiet {
            return;
        }
        match event {
            UpdateEvent::StaleRemoved {
                count,
            } if *count > 0 => {
                println!("{} {count} previously generated file(s)", "Removed".dimmed());
            }
            UpdateEvent::StaleRemoved {
                ..
            } => {}
            UpdateEvent::ListStarted {
                spec,
                count,
            } => {
                println!("{} {} ({count} dependencies)", "Processing".cyan().bold(), spec.display());
            }
            UpdateEvent::Checking {
                name,
            } => {
                print!("Checking {name} ... ");
                let _ = std::io::stdout().flush();
            }
            UpdateEvent::Skipped {
                ..
            } => println!("{}", "skipped".dimmed()),
            UpdateEvent::Resolved {
                dependency,
                ..
            } => match &dependency.drift {
                Some(drift) => println!("{}", drift.to_string().yellow()),
                None => println!("{}", dependency.reference.to_string().green()),
            },
            UpdateEvent::AggregateWritten {
                path,
            } => {
                println!("{} {}", "Wrote".green().bold(), path.display());
            }
        }
    }

    fn print_summary(&self, summary: UpdateSummary) {
        if self.quiet {
            return;
        }
        let mut line = format!("{} dependencies resolved", summary.resolved);
        if summary.skipped > 0 {
            line.push_str(&format!(", {} skipped", summary.skipped));
        }
        if summary.drifted > 0 {
            line.push_str(&format!(", {} frozen with updates available", summary.drifted));
        }
        if self.dry_run {
            line.push_str(" (dry run, nothing written)");
        }
        println!("{}", line.bold());
    }

    async fn print_status(&self, gen_dir: &std::path::Path) -> Result<()> {
        let entries = read_provenance(gen_dir).await?;
        if entries.is_empty() {
            println!("No generated fragments in {}", gen_dir.display());
            return Ok(());
        }

        let width = entries.iter().map(|e| e.macro_name.len()).max().unwrap_or(0);
        for entry in &entries {
            println!("{:<width$}  {}", entry.macro_name, entry.reference.as_str().cyan());
        }
        Ok(())
    }
}
