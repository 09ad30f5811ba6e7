//! Copy-and-swap blocklist.
//!
//! Readers load an `Arc` snapshot; refreshes build a complete new set and
//! swap it in, so a check sees either the old or the new set, never a mix.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;

use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum BlocklistError {
    #[error("failed to read blocklist file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to watch blocklist file: {0}")]
    Watch(#[from] notify::Error),
}

#[derive(Debug, Default)]
pub struct Blocklist {
    entries: ArcSwap<HashSet<String>>,
}

impl Blocklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let blocklist = Self::new();
        blocklist.replace(entries.into_iter().map(Into::into).collect());
        blocklist
    }

    pub fn is_blocked(&self, key: &str) -> bool {
        self.entries.load().contains(key)
    }

    /// Swap in a whole new set; returns its size.
    pub fn replace(&self, entries: HashSet<String>) -> usize {
        let size = entries.len();
        self.entries.store(Arc::new(entries));
        metrics::record_blocklist_size(size);
        size
    }

    pub fn snapshot(&self) -> Arc<HashSet<String>> {
        self.entries.load_full()
    }

    /// Sorted copy, for display.
    pub fn sorted_entries(&self) -> Vec<String> {
        let mut entries: Vec<_> = self.entries.load().iter().cloned().collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reload from a file and swap atomically. On error the current set stays.
    pub fn refresh_from_file(&self, path: &Path) -> Result<usize, BlocklistError> {
        let entries = load_blocklist_file(path)?;
        let size = self.replace(entries);
        tracing::info!(path = %path.display(), entries = size, "Blocklist refreshed");
        Ok(size)
    }

    /// Reload triggered by a file change event.
    ///
    /// An empty read while entries are loaded is treated as a writer caught
    /// between truncate and rewrite, and is skipped. Returns `None` when skipped.
    pub fn reload_on_change(&self, path: &Path) -> Result<Option<usize>, BlocklistError> {
        let entries = load_blocklist_file(path)?;
        if entries.is_empty() && !self.is_empty() {
            tracing::warn!(
                path = %path.display(),
                current = self.len(),
                "Blocklist file read back empty; keeping current entries"
            );
            return Ok(None);
        }
        let size = self.replace(entries);
        tracing::info!(path = %path.display(), entries = size, "Blocklist refreshed");
        Ok(Some(size))
    }

    /// Reload whenever the file changes. Keep the returned watcher alive.
    ///
    /// Replace the file atomically (write a temp file, then rename); an
    /// in-place rewrite can be observed half written.
    pub fn watch_file(self: &Arc<Self>, path: &Path) -> Result<RecommendedWatcher, BlocklistError> {
        let blocklist = Arc::clone(self);
        let watched: PathBuf = path.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        if let Err(e) = blocklist.reload_on_change(&watched) {
                            tracing::error!(error = %e, "Failed to reload blocklist; keeping current entries");
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Blocklist watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %path.display(), "Blocklist watcher started");
        Ok(watcher)
    }
}

/// One address per line; blank lines and `#` comments are ignored.
pub fn parse_blocklist(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load_blocklist_file(path: &Path) -> Result<HashSet<String>, BlocklistError> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_blocklist(&content))
}
