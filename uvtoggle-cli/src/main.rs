//! uvtoggle - toggle a uv dependency between local, git and PyPI sources
//!
//! Main entry point: argument parsing, logging setup, mode selection and
//! user-facing status output. All real work lives in uvtoggle-core.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use uvtoggle_core::github::GitHubAccess;
use uvtoggle_core::pyproject::PyProject;
use uvtoggle_core::source::{self, ResolvedSource, SourceMode};
use uvtoggle_core::sync;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "uvtoggle",
    about = "Toggle a uv dependency between a local checkout, a git reference and PyPI",
    version
)]
#[clap(group(ArgGroup::new("mode").args(["local", "git", "pypi"])))]
struct Cli {
    /// Package name as it appears in pyproject.toml
    #[clap(required_unless_present = "remove_editable")]
    module: Option<String>,

    /// Use a local editable checkout, cloning it under the toggle root if necessary
    #[clap(long)]
    local: bool,

    /// Use the package's git repository
    #[clap(long)]
    git: bool,

    /// Use the published PyPI version (removes the source override)
    #[clap(long)]
    pypi: bool,

    /// Find all editable sources and switch each to its git state
    #[clap(long, conflicts_with = "mode")]
    remove_editable: bool,

    /// Set log level
    #[clap(long, default_value = "warn")]
    log_level: LogLevel,
}

impl Cli {
    fn requested_mode(&self) -> Option<SourceMode> {
        if self.local {
            Some(SourceMode::Local)
        } else if self.git {
            Some(SourceMode::Git)
        } else if self.pypi {
            Some(SourceMode::Published)
        } else {
            None
        }
    }
}

/// Initialize tracing from the --log-level flag.
///
/// Logs go to stderr so stdout stays reserved for status output.
fn initialize_tracing(log_level: &LogLevel) {
    let filter = EnvFilter::new(log_level.to_filter_directive());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level);

    // Toggle root comes from the environment but is passed down explicitly;
    // nothing below main reads ambient state.
    let toggle_root = PathBuf::from(
        std::env::var("PYTHON_DEVELOPMENT_TOGGLE").unwrap_or_else(|_| "pypi".to_string()),
    );

    let repo = GitHubAccess::new().context("Failed to create HTTP client")?;

    if cli.remove_editable {
        return remove_editable_command(&toggle_root, &repo).await;
    }

    // clap guarantees the module is present on this path
    let module = cli.module.as_deref().unwrap_or_default();

    toggle_command(module, cli.requested_mode(), &toggle_root, &repo).await
}

/// Toggle a single package's source and sync it.
async fn toggle_command(
    module: &str,
    requested: Option<SourceMode>,
    toggle_root: &Path,
    repo: &GitHubAccess,
) -> Result<()> {
    let mut pyproject = PyProject::load("pyproject.toml").await?;
    let existing = pyproject.source(module);
    let mode = requested.unwrap_or_else(|| SourceMode::toggled_from(existing.as_ref()));

    // Resolution (including any clone) happens before the file is touched;
    // a resolution failure leaves pyproject.toml exactly as it was.
    let resolved = source::resolve(module, mode, existing.as_ref(), toggle_root, repo).await?;

    let had_override = existing.is_some();
    pyproject.apply(module, &resolved)?;
    pyproject.save().await?;

    match &resolved {
        ResolvedSource::Local { path } => {
            println!("✅ Set {} source to local path: {}", module, path.display());
        }
        ResolvedSource::Git { url, branch } => match branch {
            Some(branch) => {
                println!("✅ Set {module} source to git repo: {url} (branch: {branch})");
            }
            None => println!("✅ Set {module} source to git repo: {url}"),
        },
        ResolvedSource::Remove => {
            if had_override {
                println!("✅ Removed custom source for {module}; using the PyPI version");
            } else {
                println!("✅ Already using the PyPI version for {module}");
            }
        }
    }

    // The write is the unit of success; a failed sync is only a warning.
    if let Err(error) = sync::upgrade_package(module).await {
        eprintln!("⚠️  Could not sync {module}: {error}");
    }

    Ok(())
}

/// Convert every editable source back to its git state.
async fn remove_editable_command(toggle_root: &Path, repo: &GitHubAccess) -> Result<()> {
    let pyproject = PyProject::load("pyproject.toml").await?;
    let editable = pyproject.editable_sources();
    drop(pyproject);

    if editable.is_empty() {
        println!("No editable sources found in pyproject.toml");
        return Ok(());
    }

    for module in &editable {
        println!("Found editable source: {module}");
        toggle_command(module, Some(SourceMode::Git), toggle_root, repo).await?;
    }

    println!("✅ Converted {} editable sources to git sources", editable.len());
    Ok(())
}
