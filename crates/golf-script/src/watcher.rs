//! File watcher for hot reloading golf scripts
//!
//! Watches `.gs` files and reports when a script should be loaded again.

use crate::script::Script;
use anyhow::{Result, anyhow};
use notify::RecursiveMode;
use notify_debouncer_mini::{DebouncedEvent, new_debouncer};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, channel};
use std::time::Duration;

pub const SCRIPT_EXTENSION: &str = "gs";
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Event emitted when a watched file changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Modified(PathBuf),
    Error(String),
}

/// Whether a changed path belongs to one of the watched entries
fn is_relevant(watched: &[PathBuf], path: &Path) -> bool {
    if watched.iter().any(|p| p == path) {
        return true;
    }
    path.extension().is_some_and(|e| e == SCRIPT_EXTENSION)
        && watched.iter().any(|p| path.starts_with(p))
}

pub struct ScriptWatcher {
    debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    receiver: Receiver<WatchEvent>,
    watched_paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl ScriptWatcher {
    /// Create a watcher that coalesces bursts of writes within `debounce_ms`
    pub fn new(debounce_ms: Option<u64>) -> Result<Self> {
        let (tx, rx) = channel();
        let watched_paths = Arc::new(Mutex::new(Vec::<PathBuf>::new()));
        let watched = Arc::clone(&watched_paths);

        let debounce = Duration::from_millis(debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS));

        let debouncer = new_debouncer(
            debounce,
            move |result: std::result::Result<Vec<DebouncedEvent>, notify::Error>| match result {
                Ok(events) => {
                    let watched = watched.lock();
                    for event in events {
                        if is_relevant(&watched, &event.path) {
                            let _ = tx.send(WatchEvent::Modified(event.path));
                        }
                    }
                }
                Err(e) => {
                    let _ = tx.send(WatchEvent::Error(format!("Watch error: {:?}", e)));
                }
            },
        )
        .map_err(|e| anyhow!("Failed to create file watcher: {:?}", e))?;

        Ok(Self {
            debouncer,
            receiver: rx,
            watched_paths,
        })
    }

    /// Watch a script file, or every `.gs` file directly inside a directory
    pub fn watch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        self.debouncer
            .watcher()
            .watch(&canonical, RecursiveMode::NonRecursive)
            .map_err(|e| anyhow!("Failed to watch path {}: {}", canonical.display(), e))?;

        let mut watched = self.watched_paths.lock();
        if !watched.contains(&canonical) {
            watched.push(canonical.clone());
        }
        tracing::info!("Watching: {}", canonical.display());
        Ok(())
    }

    pub fn watched(&self) -> Vec<PathBuf> {
        self.watched_paths.lock().clone()
    }

    pub fn recv(&self) -> Option<WatchEvent> {
        self.receiver.recv().ok()
    }

    pub fn drain_events(&self) -> Vec<WatchEvent> {
        self.receiver.try_iter().collect()
    }
}

/// Load `path` again, replacing `current` only if the new load succeeds
///
/// The reload uses the script's own options, so its scoping and any host
/// natives carry over. The old script stays registered and usable when the
/// edited file has an error.
pub fn reload(current: &mut Script) -> Result<()> {
    let path = current.path().to_path_buf();
    let fresh = Script::load_file_with_options(&path, current.options().clone())?;
    tracing::info!("Reloaded: {}", path.display());
    *current = fresh;
    Ok(())
}
