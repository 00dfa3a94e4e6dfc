//! Post-write `uv sync` follow-up
//!
//! After the configuration has been persisted, the toggled package gets
//! upgraded in place. `--upgrade-package` keeps the sync targeted so other
//! previously installed groups are not dropped. Failure here never rolls
//! back the already-written configuration.

use std::process::ExitStatus;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Failure modes of the sync collaborator
#[derive(Error, Debug)]
pub enum SyncError {
    /// uv is not installed or not on PATH
    #[error("'uv' command not found - make sure it is installed and on your PATH")]
    UvMissing(#[source] std::io::Error),

    /// uv could not be started for another reason
    #[error("failed to run uv")]
    Spawn(#[source] std::io::Error),

    /// uv ran but reported an error
    #[error("uv sync --upgrade-package {package} exited with {status}: {stderr}")]
    Failed {
        package: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Run `uv sync --upgrade-package <package>`.
pub async fn upgrade_package(package: &str) -> Result<(), SyncError> {
    info!("Upgrading package reference {}...", package);

    let output = Command::new("uv")
        .args(["sync", "--upgrade-package", package])
        .output()
        .await
        .map_err(|error| {
            if error.kind() == std::io::ErrorKind::NotFound {
                SyncError::UvMissing(error)
            } else {
                SyncError::Spawn(error)
            }
        })?;

    if !output.status.success() {
        return Err(SyncError::Failed {
            package: package.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    debug!(
        "Sync result: {} {}",
        String::from_utf8_lossy(&output.stdout).trim(),
        String::from_utf8_lossy(&output.stderr).trim()
    );
    info!("Successfully upgraded {}", package);
    Ok(())
}
