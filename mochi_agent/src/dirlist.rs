//! Directory listing for the file browser.

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::types::{DirEntry, DirectoryListing};

#[derive(Error, Debug)]
pub enum ListError {
    #[error("Invalid path")]
    InvalidPath,

    #[error("Cannot access directory: {0}")]
    Access(#[from] io::Error),
}

/// List the immediate children of `path`. `None` stands for a payload that was not a string.
pub async fn list_dir(path: Option<&str>) -> DirectoryListing {
    match read_listing(path).await {
        Ok((resolved, entries)) => {
            DirectoryListing::listed(resolved.display().to_string(), entries)
        }
        Err(e) => {
            debug!(path = ?path, error = %e, "directory listing failed");
            DirectoryListing::failed(e.to_string())
        }
    }
}

async fn read_listing(path: Option<&str>) -> Result<(PathBuf, Vec<DirEntry>), ListError> {
    let raw = path.filter(|p| !p.is_empty()).ok_or(ListError::InvalidPath)?;
    let resolved = resolve(raw)?;

    let mut read_dir = fs::read_dir(&resolved).await?;
    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        let Some(is_directory) = classify(&entry).await else {
            continue;
        };
        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_directory,
            is_parent_marker: false,
        });
    }

    sort_entries(&mut entries);
    entries.insert(0, DirEntry::parent_marker());
    Ok((resolved, entries))
}

fn resolve(raw: &str) -> io::Result<PathBuf> {
    let path = Path::new(raw);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(normalize(&absolute))
}

/// Lexical normalization: drops `.`, folds `..` (never above the root), rebuilds separators.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let ends_in_name = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if ends_in_name {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(name) => out.push(name),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// `Some(true)` for directories, `Some(false)` for files, `None` for anything else.
/// Symlinks are classified by their target; dangling links are dropped.
async fn classify(entry: &fs::DirEntry) -> Option<bool> {
    let file_type = entry.file_type().await.ok()?;
    if file_type.is_dir() {
        return Some(true);
    }
    if file_type.is_file() {
        return Some(false);
    }
    if file_type.is_symlink() {
        let target = fs::metadata(entry.path()).await.ok()?;
        if target.is_dir() {
            return Some(true);
        }
        if target.is_file() {
            return Some(false);
        }
    }
    None
}

/// Directories first, then by name ignoring case; exact name breaks ties.
pub fn sort_entries(entries: &mut [DirEntry]) {
    entries.sort_by(|a, b| {
        b.is_directory
            .cmp(&a.is_directory)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.name.cmp(&b.name))
    });
}
