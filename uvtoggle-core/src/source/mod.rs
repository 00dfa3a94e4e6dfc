//! Source resolution for a single package
//!
//! Given a requested mode and the current state of pyproject.toml, computes
//! the exact override entry that should replace any existing entry for the
//! package. Repository discovery and cloning go through the [`RepoAccess`]
//! trait so the resolver stays testable without network or git.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::pyproject::CurrentSource;

pub mod error;

pub use error::{CloneError, SourceError};

/// The three states a dependency source can be toggled to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    /// Editable checkout under the toggle root
    Local,
    /// Git repository reference
    Git,
    /// No override; fall back to the default PyPI resolution
    Published,
}

impl SourceMode {
    /// The state an unflagged invocation toggles to.
    ///
    /// A git override flips back to a local checkout; anything else (a path
    /// override or no override at all) flips to the git state.
    pub fn toggled_from(existing: Option<&CurrentSource>) -> Self {
        match existing {
            Some(CurrentSource::Git { .. }) => SourceMode::Local,
            _ => SourceMode::Git,
        }
    }
}

/// The override entry a toggle produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    /// Editable path source, recorded as `{ path = ..., editable = true }`
    Local { path: PathBuf },
    /// Git source, recorded as `{ git = ...[, branch = ...] }`
    Git { url: String, branch: Option<String> },
    /// Delete the override entry entirely
    Remove,
}

/// Repository discovery and git plumbing consumed by [`resolve`]
#[async_trait]
pub trait RepoAccess: Send + Sync {
    /// Best-effort repository URL discovery for a package name.
    ///
    /// Implementations try a direct hosting-convention guess first and fall
    /// back to the package registry's project metadata.
    async fn discover_url(&self, package: &str) -> Option<String>;

    /// Clone `url` into `dest`.
    async fn clone_into(&self, url: &str, dest: &Path) -> Result<(), CloneError>;

    /// Currently checked-out branch of a local clone, if one can be read.
    async fn current_branch(&self, checkout: &Path) -> Option<String>;
}

/// Compute the override entry for `name` under the requested mode.
///
/// Side effects are limited to the `Local` case: a filesystem existence
/// check and, when the checkout is missing, a clone through `repo`. Both
/// failure modes abort before any configuration write happens.
pub async fn resolve(
    name: &str,
    mode: SourceMode,
    existing: Option<&CurrentSource>,
    toggle_root: &Path,
    repo: &dyn RepoAccess,
) -> Result<ResolvedSource, SourceError> {
    match mode {
        SourceMode::Published => Ok(ResolvedSource::Remove),

        SourceMode::Local => {
            let checkout = local_checkout(toggle_root, name);
            if !checkout.exists() {
                let url = repo.discover_url(name).await.ok_or_else(|| {
                    SourceError::RepositoryNotFound {
                        package: name.to_string(),
                    }
                })?;
                info!(
                    "Local checkout {} does not exist, cloning {}",
                    checkout.display(),
                    url
                );
                repo.clone_into(&url, &checkout)
                    .await
                    .map_err(|source| SourceError::CloneFailed {
                        url,
                        dest: checkout.clone(),
                        source,
                    })?;
            }
            Ok(ResolvedSource::Local { path: checkout })
        }

        SourceMode::Git => {
            let url = match existing_git_url(existing) {
                Some(url) => url.to_string(),
                None => {
                    repo.discover_url(name)
                        .await
                        .ok_or_else(|| SourceError::RepositoryNotFound {
                            package: name.to_string(),
                        })?
                }
            };

            // An existing branch value is always preserved verbatim. Without
            // one, a local checkout's current branch is used, except for the
            // default branches which mean "no branch field".
            let branch = match existing {
                Some(CurrentSource::Git {
                    branch: Some(branch),
                    ..
                }) => Some(branch.clone()),
                _ => {
                    let checkout = local_checkout(toggle_root, name);
                    if checkout.exists() {
                        repo.current_branch(&checkout)
                            .await
                            .filter(|branch| branch != "main" && branch != "master")
                    } else {
                        None
                    }
                }
            };

            Ok(ResolvedSource::Git { url, branch })
        }
    }
}

/// Where the package's development checkout lives under the toggle root.
///
/// Package names and directory names disagree about dashes versus
/// underscores often enough that both spellings are probed before falling
/// back to the name as given.
pub fn local_checkout(toggle_root: &Path, name: &str) -> PathBuf {
    let default = toggle_root.join(name);
    if default.exists() {
        return default;
    }

    let dashed = toggle_root.join(name.replace('_', "-"));
    if dashed.exists() {
        debug!("Using dashed checkout directory {}", dashed.display());
        return dashed;
    }

    let underscored = toggle_root.join(name.replace('-', "_"));
    if underscored.exists() {
        debug!(
            "Using underscored checkout directory {}",
            underscored.display()
        );
        return underscored;
    }

    default
}

fn existing_git_url(existing: Option<&CurrentSource>) -> Option<&str> {
    match existing {
        Some(CurrentSource::Git { url, .. }) => Some(url),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_git_to_local() {
        let existing = CurrentSource::Git {
            url: "https://github.com/acme/foo.git".to_string(),
            branch: None,
        };
        assert_eq!(SourceMode::toggled_from(Some(&existing)), SourceMode::Local);
    }

    #[test]
    fn toggle_flips_path_to_git() {
        let existing = CurrentSource::Path {
            path: "pypi/foo".to_string(),
            editable: true,
        };
        assert_eq!(SourceMode::toggled_from(Some(&existing)), SourceMode::Git);
    }

    #[test]
    fn toggle_flips_absent_to_git() {
        assert_eq!(SourceMode::toggled_from(None), SourceMode::Git);
    }
}
