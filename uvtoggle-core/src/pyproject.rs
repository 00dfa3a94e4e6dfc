//! Format-preserving pyproject.toml mutation
//!
//! The document is held as a `toml_edit::DocumentMut` so that every key,
//! comment and piece of whitespace the toggle does not touch survives a
//! write byte for byte. Only the `tool.uv.sources` table is ever mutated.

use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, InlineTable, Item, Table, TableLike, Value};
use tracing::debug;

use crate::source::ResolvedSource;

/// Errors raised while reading, shaping or writing pyproject.toml
#[derive(Error, Debug)]
pub enum PyProjectError {
    /// The file is missing entirely
    #[error("No pyproject.toml found at {path} - are you in the right folder?")]
    NotFound { path: PathBuf },

    /// The file exists but could not be read
    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML
    #[error("Failed to parse {path} as TOML")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },

    /// The mutated document could not be written back
    #[error("Failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An intermediate key exists but does not hold a table
    #[error("`{key}` in pyproject.toml is not a table")]
    NotATable { key: String },
}

/// The override entry currently recorded for a package, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentSource {
    /// `{ path = ..., editable = ... }`
    Path { path: String, editable: bool },
    /// `{ git = ...[, branch = ...] }`
    Git { url: String, branch: Option<String> },
    /// An entry of some other shape; treated as opaque
    Other,
}

/// A loaded pyproject.toml, mutable in place
#[derive(Debug)]
pub struct PyProject {
    path: PathBuf,
    doc: DocumentMut,
}

impl PyProject {
    /// Load and parse pyproject.toml from `path`.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, PyProjectError> {
        let path = path.into();
        if !path.exists() {
            return Err(PyProjectError::NotFound { path });
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| PyProjectError::Read {
                path: path.clone(),
                source,
            })?;

        let doc = content
            .parse::<DocumentMut>()
            .map_err(|source| PyProjectError::Parse {
                path: path.clone(),
                source,
            })?;

        Ok(Self { path, doc })
    }

    /// The file this document was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The override entry currently recorded for `name`, if any.
    pub fn source(&self, name: &str) -> Option<CurrentSource> {
        let item = self.sources()?.get(name)?;
        let Some(entry) = item.as_table_like() else {
            return Some(CurrentSource::Other);
        };

        if let Some(url) = entry.get("git").and_then(Item::as_str) {
            let branch = entry
                .get("branch")
                .and_then(Item::as_str)
                .map(str::to_string);
            return Some(CurrentSource::Git {
                url: url.to_string(),
                branch,
            });
        }

        if let Some(path) = entry.get("path").and_then(Item::as_str) {
            let editable = entry
                .get("editable")
                .and_then(Item::as_bool)
                .unwrap_or(false);
            return Some(CurrentSource::Path {
                path: path.to_string(),
                editable,
            });
        }

        Some(CurrentSource::Other)
    }

    /// Names of every override entry marked `editable = true`.
    pub fn editable_sources(&self) -> Vec<String> {
        let Some(sources) = self.sources() else {
            return Vec::new();
        };

        sources
            .iter()
            .filter(|(_, item)| {
                item.as_table_like()
                    .and_then(|entry| entry.get("editable"))
                    .and_then(Item::as_bool)
                    .unwrap_or(false)
            })
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Replace, insert or delete the override entry for `name`.
    ///
    /// Setting an entry replaces it wholesale, never merges. A removal is
    /// idempotent: an absent entry is a no-op, and `tool.uv.sources` is not
    /// created just to delete from it.
    pub fn apply(&mut self, name: &str, resolved: &ResolvedSource) -> Result<(), PyProjectError> {
        match resolved {
            ResolvedSource::Remove => {
                if let Some(sources) = self.existing_sources_mut() {
                    if sources.remove(name).is_some() {
                        debug!("Removed source override for {}", name);
                    }
                }
                Ok(())
            }
            ResolvedSource::Local { path } => {
                let mut entry = InlineTable::new();
                entry.insert("path", Value::from(path.display().to_string()));
                entry.insert("editable", Value::from(true));
                self.set_source(name, entry)
            }
            ResolvedSource::Git { url, branch } => {
                let mut entry = InlineTable::new();
                entry.insert("git", Value::from(url.as_str()));
                if let Some(branch) = branch {
                    entry.insert("branch", Value::from(branch.as_str()));
                }
                self.set_source(name, entry)
            }
        }
    }

    /// Write the document back to where it was loaded from.
    pub async fn save(&self) -> Result<(), PyProjectError> {
        tokio::fs::write(&self.path, self.doc.to_string())
            .await
            .map_err(|source| PyProjectError::Write {
                path: self.path.clone(),
                source,
            })
    }

    fn set_source(&mut self, name: &str, entry: InlineTable) -> Result<(), PyProjectError> {
        let sources = self.ensure_sources()?;
        sources.insert(name, Item::Value(Value::InlineTable(entry)));
        debug!("Set source override for {}", name);
        Ok(())
    }

    fn sources(&self) -> Option<&dyn TableLike> {
        self.doc
            .as_table()
            .get("tool")?
            .as_table_like()?
            .get("uv")?
            .as_table_like()?
            .get("sources")?
            .as_table_like()
    }

    fn existing_sources_mut(&mut self) -> Option<&mut dyn TableLike> {
        self.doc
            .as_table_mut()
            .get_mut("tool")?
            .as_table_like_mut()?
            .get_mut("uv")?
            .as_table_like_mut()?
            .get_mut("sources")?
            .as_table_like_mut()
    }

    /// `tool.uv.sources`, creating any missing intermediate level as an
    /// implicit table. An existing intermediate is never overwritten; one
    /// that is not a table is an error.
    fn ensure_sources(&mut self) -> Result<&mut dyn TableLike, PyProjectError> {
        let tool = ensure_table(self.doc.as_table_mut(), "tool")?;
        let uv = ensure_table(tool, "tool.uv")?;
        ensure_table(uv, "tool.uv.sources")
    }
}

fn ensure_table<'a>(
    parent: &'a mut dyn TableLike,
    key: &str,
) -> Result<&'a mut dyn TableLike, PyProjectError> {
    // `key` carries its dotted prefix purely for error messages; only the
    // last segment is looked up.
    let segment = key.rsplit('.').next().unwrap_or(key);

    if parent.get(segment).is_none() {
        let mut table = Table::new();
        table.set_implicit(true);
        parent.insert(segment, Item::Table(table));
    }

    parent
        .get_mut(segment)
        .and_then(Item::as_table_like_mut)
        .ok_or_else(|| PyProjectError::NotATable {
            key: key.to_string(),
        })
}
