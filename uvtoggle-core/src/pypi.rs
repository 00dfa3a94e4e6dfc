//! PyPI project metadata lookup
//!
//! Fetches `https://pypi.org/pypi/<name>/json` and digs a repository URL out
//! of the project's declared links. The `project_urls` mapping is free-form,
//! so the lookup works through a priority list of well-known key names
//! before falling back to anything that looks like a repository.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

/// Top-level payload of the PyPI JSON API
#[derive(Debug, Default, Deserialize)]
pub struct ProjectMetadata {
    #[serde(default)]
    pub info: ProjectInfo,
}

/// The `info` object of a PyPI project
#[derive(Debug, Default, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub home_page: Option<String>,
    /// Link name -> URL; values can be explicitly null
    #[serde(default)]
    pub project_urls: Option<HashMap<String, Option<String>>>,
}

/// Fetch a project's metadata; any failure is treated as "no metadata".
pub async fn project_metadata(
    client: &reqwest::Client,
    package: &str,
) -> Option<ProjectMetadata> {
    let url = format!("https://pypi.org/pypi/{package}/json");
    debug!("Fetching PyPI metadata for {}", package);

    let response = match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            debug!("PyPI returned {} for {}", response.status(), package);
            return None;
        }
        Err(error) => {
            debug!("Failed to fetch PyPI metadata: {}", error);
            return None;
        }
    };

    match response.json::<ProjectMetadata>().await {
        Ok(metadata) => Some(metadata),
        Err(error) => {
            debug!("Failed to decode PyPI metadata: {}", error);
            None
        }
    }
}

/// Link names that point at the repository when present
const PRIORITY_KEYS: &[&str] = &["repository", "source", "source code"];

/// Link names that never point at the repository
const SKIP_KEYS: &[&str] = &[
    "changelog",
    "documentation",
    "docs",
    "issues",
    "bug tracker",
    "bugtracker",
];

/// Pick the most plausible repository URL out of a project's links.
pub fn repository_url(info: &ProjectInfo) -> Option<String> {
    if let Some(home_page) = &info.home_page {
        if is_repository_url(home_page) {
            return Some(home_page.clone());
        }
    }

    let normalized: HashMap<String, &str> = info
        .project_urls
        .iter()
        .flatten()
        .filter_map(|(key, url)| {
            url.as_deref()
                .map(|url| (key.trim().to_lowercase(), url))
        })
        .collect();

    for key in PRIORITY_KEYS {
        if let Some(url) = normalized.get(*key) {
            if is_repository_url(url) {
                return Some((*url).to_string());
            }
        }
    }

    for (key, url) in &normalized {
        if SKIP_KEYS.contains(&key.as_str()) {
            continue;
        }
        if is_repository_url(url) {
            return Some((*url).to_string());
        }
    }

    // Last resort: anything on github.com, even a deep link
    for url in normalized.values() {
        if url.contains("github.com") {
            return Some((*url).to_string());
        }
    }

    info.home_page.clone().filter(|url| !url.is_empty())
}

/// A repository URL proper, as opposed to a file or directory deep link.
fn is_repository_url(url: &str) -> bool {
    url.contains("github.com") && !url.contains("/blob/") && !url.contains("/tree/")
}
