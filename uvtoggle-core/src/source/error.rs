//! Source resolution error types with clear, actionable messages

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors raised while resolving a package's source
#[derive(Error, Debug)]
pub enum SourceError {
    /// No repository URL could be discovered for the package
    #[error("Could not determine a repository URL for '{package}'.\n\nTried the GitHub account guess and the PyPI project metadata.\n\nEither clone the repository manually under the toggle root, or add the\nsource to pyproject.toml by hand.")]
    RepositoryNotFound { package: String },

    /// Cloning the discovered repository failed
    #[error("Failed to clone {url} into {dest}")]
    CloneFailed {
        url: String,
        dest: PathBuf,
        #[source]
        source: CloneError,
    },
}

/// Failure modes of the clone collaborator
#[derive(Error, Debug)]
pub enum CloneError {
    /// git itself could not be started
    #[error("failed to run git")]
    Spawn(#[from] std::io::Error),

    /// git ran but reported an error
    #[error("git clone exited with {status}: {stderr}")]
    Exited { status: ExitStatus, stderr: String },
}
