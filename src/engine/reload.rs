//! Hot-reload plumbing: change notifications for the config file and the
//! gate that keeps reloads from overlapping.

use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Quiet period that ends a burst of config writes, and the minimum gap
/// between two reloads.
pub const RELOAD_DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
struct GateState {
    in_progress: bool,
    last_completed: Option<Instant>,
}

/// Critical section for reloads.
#[derive(Debug, Clone)]
pub struct ReloadGate {
    state: Arc<Mutex<GateState>>,
    debounce: Duration,
}

/// Held for the duration of a reload; completion is recorded on drop.
#[derive(Debug)]
pub struct ReloadGuard {
    state: Arc<Mutex<GateState>>,
}

impl Default for ReloadGate {
    fn default() -> Self {
        Self::new(RELOAD_DEBOUNCE)
    }
}

impl ReloadGate {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(GateState::default())),
            debounce,
        }
    }

    /// Enter the critical section. While a reload is running, or within the
    /// debounce window after one finished, returns how long to wait before
    /// trying again. A deferred request must be retried, not dropped.
    pub fn try_begin(&self, now: Instant) -> Result<ReloadGuard, Duration> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.in_progress {
            return Err(self.debounce);
        }
        if let Some(done) = state.last_completed {
            let since = now.saturating_duration_since(done);
            if since < self.debounce {
                return Err(self.debounce - since);
            }
        }
        state.in_progress = true;
        Ok(ReloadGuard {
            state: Arc::clone(&self.state),
        })
    }
}

impl Drop for ReloadGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.in_progress = false;
        state.last_completed = Some(Instant::now());
    }
}

/// Watches one config file and calls `on_change` for writes to it.
///
/// The parent directory is watched so editors that save by renaming a temp
/// file over the original are still noticed. A burst of writes produces one
/// callback, [`RELOAD_DEBOUNCE`] after the last write of the burst.
pub struct ConfigWatcher {
    // Dropping the watcher stops notifications and ends the debounce thread
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    pub fn spawn<F>(path: &Path, on_change: F) -> Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let path = path
            .canonicalize()
            .with_context(|| format!("Failed to resolve config path: {}", path.display()))?;
        let file_name = path.file_name().map(|n| n.to_os_string());
        let watch_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("config-debounce".to_string())
            .spawn(move || debounce(rx, RELOAD_DEBOUNCE, on_change))
            .context("Failed to spawn config debounce thread")?;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        return;
                    }
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if ours {
                        let _ = tx.send(());
                    }
                }
                Err(err) => tracing::error!("config watch error: {err:?}"),
            },
            notify::Config::default(),
        )
        .context("Failed to create config watcher")?;

        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", watch_dir.display()))?;

        tracing::info!(path = %path.display(), "watching config for changes");

        Ok(Self { _watcher: watcher })
    }
}

/// Trailing-edge debounce: after the first event, wait until no event has
/// arrived for `window`, then fire once. Returns when the sender is gone.
fn debounce<F: Fn()>(rx: Receiver<()>, window: Duration, on_change: F) {
    while rx.recv().is_ok() {
        loop {
            match rx.recv_timeout(window) {
                Ok(()) => continue,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
        on_change();
    }
}
