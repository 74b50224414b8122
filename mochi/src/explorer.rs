//! File browser state: current directory, its entries and the selection.

use std::path::{Path, PathBuf};

use crate::types::{DirEntry, DirectoryListing};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// List this directory next.
    Navigate(String),
    /// `..` at a filesystem root; nothing to do.
    AtRoot,
    File(String),
    Nothing,
}

#[derive(Debug, Clone)]
pub struct Explorer {
    pub path: String,
    pub entries: Vec<DirEntry>,
    pub selected: usize,
}

/// Home directory, or the filesystem root when there is none.
pub fn start_path() -> String {
    dirs_next::home_dir()
        .unwrap_or_else(fallback_root)
        .display()
        .to_string()
}

fn fallback_root() -> PathBuf {
    #[cfg(windows)]
    {
        PathBuf::from("C:\\")
    }
    #[cfg(not(windows))]
    {
        PathBuf::from("/")
    }
}

impl Explorer {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
            selected: 0,
        }
    }

    /// Adopt a listing. On failure the current view is left untouched and the error returned.
    pub fn apply(&mut self, listing: DirectoryListing) -> Result<(), String> {
        match listing {
            DirectoryListing {
                success: true,
                resolved_path: Some(path),
                entries: Some(entries),
                ..
            } => {
                self.path = path;
                self.entries = entries;
                self.selected = 0;
                Ok(())
            }
            other => Err(other.error.unwrap_or_else(|| "Invalid listing".into())),
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_entry(&self) -> Option<&DirEntry> {
        self.entries.get(self.selected)
    }

    pub fn activate(&self) -> Activation {
        let Some(entry) = self.selected_entry() else {
            return Activation::Nothing;
        };
        let here = Path::new(&self.path);
        if entry.is_parent_marker {
            return match here.parent() {
                Some(parent) => Activation::Navigate(parent.display().to_string()),
                None => Activation::AtRoot,
            };
        }
        if entry.is_directory {
            Activation::Navigate(here.join(&entry.name).display().to_string())
        } else {
            Activation::File(entry.name.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, dir: bool) -> DirEntry {
        DirEntry {
            name: name.into(),
            is_directory: dir,
            is_parent_marker: false,
        }
    }

    fn parent() -> DirEntry {
        DirEntry {
            name: "..".into(),
            is_directory: true,
            is_parent_marker: true,
        }
    }

    fn listed(path: &str, entries: Vec<DirEntry>) -> DirectoryListing {
        DirectoryListing {
            success: true,
            resolved_path: Some(path.into()),
            entries: Some(entries),
            error: None,
        }
    }

    #[cfg(unix)]
    #[test]
    fn navigation_targets() {
        let mut ex = Explorer::new("/");
        ex.apply(listed(
            "/home/user",
            vec![parent(), entry("docs", true), entry("notes.txt", false)],
        ))
        .unwrap();
        assert_eq!(ex.activate(), Activation::Navigate("/home".into()));
        ex.select_next();
        assert_eq!(ex.activate(), Activation::Navigate("/home/user/docs".into()));
        ex.select_next();
        ex.select_next();
        assert_eq!(ex.selected, 2);
        assert_eq!(ex.activate(), Activation::File("notes.txt".into()));
        ex.select_prev();
        ex.select_prev();
        ex.select_prev();
        assert_eq!(ex.selected, 0);
    }

    #[cfg(unix)]
    #[test]
    fn parent_of_root_is_a_no_op() {
        let mut ex = Explorer::new("/");
        ex.apply(listed("/", vec![parent(), entry("etc", true)])).unwrap();
        assert_eq!(ex.activate(), Activation::AtRoot);
    }

    #[test]
    fn failed_listing_keeps_current_view() {
        let mut ex = Explorer::new("/tmp");
        ex.entries = vec![parent()];
        let err = ex
            .apply(DirectoryListing {
                success: false,
                resolved_path: None,
                entries: None,
                error: Some("Cannot access directory: denied".into()),
            })
            .unwrap_err();
        assert_eq!(err, "Cannot access directory: denied");
        assert_eq!(ex.path, "/tmp");
        assert_eq!(ex.entries.len(), 1);
    }

    #[test]
    fn empty_view_activates_nothing() {
        assert_eq!(Explorer::new("/").activate(), Activation::Nothing);
        assert!(!start_path().is_empty());
    }
}
