//! GitHub-side collaborators: identity lookup, repository probes, git plumbing
//!
//! All subprocess work (gh, git) goes through `tokio::process::Command`; the
//! repository existence probe is a plain HTTPS request.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::pypi;
use crate::source::{CloneError, RepoAccess};

/// [`RepoAccess`] implementation backed by GitHub, the PyPI registry and the
/// local git/gh binaries
pub struct GitHubAccess {
    client: reqwest::Client,
}

impl GitHubAccess {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("uvtoggle/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Whether `https://github.com/<username>/<repo>` exists.
    async fn repo_exists(&self, username: &str, repo: &str) -> bool {
        let url = format!("https://github.com/{username}/{repo}");
        debug!("Checking if repository exists: {}", url);
        match self.client.head(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                debug!("Repository probe failed: {}", error);
                false
            }
        }
    }
}

#[async_trait]
impl RepoAccess for GitHubAccess {
    async fn discover_url(&self, package: &str) -> Option<String> {
        // Direct guess against the invoking user's account first
        if let Some(username) = cli_username().await {
            if self.repo_exists(&username, package).await {
                return Some(format!("https://github.com/{username}/{package}.git"));
            }
        }

        // Fall back to the repository the PyPI project points at
        let metadata = pypi::project_metadata(&self.client, package).await?;
        let url = pypi::repository_url(&metadata.info)?;
        if url.contains("github.com") {
            Some(ensure_git_suffix(&url))
        } else {
            debug!("PyPI metadata for {} points at a non-GitHub URL: {}", package, url);
            None
        }
    }

    async fn clone_into(&self, url: &str, dest: &Path) -> Result<(), CloneError> {
        info!("Cloning {} into {}", url, dest.display());
        let output = Command::new("git")
            .arg("clone")
            .arg(url)
            .arg(dest)
            .output()
            .await?;

        if !output.status.success() {
            return Err(CloneError::Exited {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    async fn current_branch(&self, checkout: &Path) -> Option<String> {
        let output = Command::new("git")
            .args(["rev-parse", "--abbrev-ref", "HEAD"])
            .current_dir(checkout)
            .output()
            .await
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!branch.is_empty()).then_some(branch)
    }
}

/// The hosting account name of the invoking user.
///
/// Tries `gh api user` first; falls back to `git config user.name`. Either
/// binary being absent is not an error, just a missed hint.
pub async fn cli_username() -> Option<String> {
    match Command::new("gh").args(["api", "user"]).output().await {
        Ok(output) if output.status.success() => {
            if let Ok(user) = serde_json::from_slice::<serde_json::Value>(&output.stdout) {
                if let Some(login) = user.get("login").and_then(|login| login.as_str()) {
                    debug!("Found username via gh cli: {}", login);
                    return Some(login.to_string());
                }
            }
        }
        Ok(_) => debug!("gh api user failed, trying git config"),
        Err(_) => debug!("gh cli not found, trying git config"),
    }

    match Command::new("git")
        .args(["config", "user.name"])
        .output()
        .await
    {
        Ok(output) if output.status.success() => {
            let username = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if username.is_empty() {
                return None;
            }
            debug!("Found username via git config: {}", username);
            Some(username)
        }
        _ => None,
    }
}

fn ensure_git_suffix(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if trimmed.ends_with(".git") {
        trimmed.to_string()
    } else {
        format!("{trimmed}.git")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn git_suffix_is_appended_once() {
        assert_eq!(
            ensure_git_suffix("https://github.com/acme/foo"),
            "https://github.com/acme/foo.git"
        );
        assert_eq!(
            ensure_git_suffix("https://github.com/acme/foo/"),
            "https://github.com/acme/foo.git"
        );
        assert_eq!(
            ensure_git_suffix("https://github.com/acme/foo.git"),
            "https://github.com/acme/foo.git"
        );
    }
}
