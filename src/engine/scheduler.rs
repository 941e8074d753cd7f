// Per-widget refresh loops

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::widget::Widget;

/// One refresh loop per widget of a generation.
pub struct Scheduler {
    handles: Vec<JoinHandle<()>>,
    active_loops: Arc<Mutex<usize>>,
}

impl Scheduler {
    /// Spawn a loop for every enabled widget.
    pub fn start(widgets: &[Arc<dyn Widget>]) -> Self {
        let active_loops = Arc::new(Mutex::new(0));
        let mut handles = Vec::with_capacity(widgets.len());

        for widget in widgets.iter().filter(|w| w.settings().enabled) {
            let widget = Arc::clone(widget);
            let active = Arc::clone(&active_loops);

            // Count the loop before the thread runs so callers never observe
            // a started scheduler with a short count.
            *active.lock().unwrap_or_else(|e| e.into_inner()) += 1;

            let name = format!("refresh-{}", widget.settings().name);
            let spawned = thread::Builder::new().name(name).spawn(move || {
                schedule(widget.as_ref());
                *active.lock().unwrap_or_else(|e| e.into_inner()) -= 1;
            });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    *active_loops.lock().unwrap_or_else(|e| e.into_inner()) -= 1;
                    tracing::error!("failed to spawn refresh loop: {}", e);
                }
            }
        }

        tracing::debug!(loops = handles.len(), "scheduler started");

        Self {
            handles,
            active_loops,
        }
    }

    /// Number of loops that have not yet exited.
    pub fn active_loops(&self) -> usize {
        *self.active_loops.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn loop_count(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every loop to exit, giving up at `deadline`. Widgets must
    /// already be stopped. Returns how many loops were left running.
    pub fn join_until(self, deadline: Instant) -> usize {
        join_until(self.handles, deadline)
    }
}

/// Join `handles`, detaching any thread still running at `deadline`.
/// Returns the number detached.
pub fn join_until(handles: Vec<JoinHandle<()>>, deadline: Instant) -> usize {
    let mut detached = 0;
    for handle in handles {
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        if handle.is_finished() {
            if handle.join().is_err() {
                tracing::error!("refresh thread panicked outside of refresh");
            }
        } else {
            let name = handle.thread().name().unwrap_or("unnamed").to_string();
            tracing::warn!(thread = %name, "refresh still running after stop, detaching");
            detached += 1;
        }
    }
    detached
}

/// Body of a single refresh loop.
///
/// Disabled: nothing. Zero interval: one refresh. Otherwise refresh now and
/// then on every tick until the widget's stop signal fires.
pub fn schedule(widget: &dyn Widget) {
    let settings = widget.settings();
    if !settings.enabled {
        return;
    }

    let stop = widget.base().stop_signal();
    if stop.is_stopped() {
        return;
    }

    refresh_guarded(widget);

    let Some(interval) = settings.auto_refresh() else {
        return;
    };

    while !stop.wait_timeout(interval) {
        refresh_guarded(widget);
    }

    tracing::debug!(widget = %settings.name, "refresh loop stopped");
}

/// Run one refresh, containing any panic to this widget.
pub fn refresh_guarded(widget: &dyn Widget) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| widget.refresh()));
    if result.is_err() {
        let name = &widget.settings().name;
        tracing::error!(widget = %name, "refresh panicked");
        widget.base().display_error("refresh panicked; will retry on next tick");
    }
}
