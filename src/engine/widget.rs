// Widget capability interface and the shared base every panel embeds

use anyhow::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use super::redraw::RedrawRequester;

/// Placement of a widget on the dashboard grid, in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub top: u16,
    pub left: u16,
    #[serde(default = "default_span")]
    pub width: u16,
    #[serde(default = "default_span")]
    pub height: u16,
}

fn default_span() -> u16 {
    1
}

impl GridPosition {
    pub fn new(top: u16, left: u16, width: u16, height: u16) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> u32 {
        self.top as u32 + self.height as u32
    }

    pub fn right(&self) -> u32 {
        self.left as u32 + self.width as u32
    }

    pub fn overlaps(&self, other: &GridPosition) -> bool {
        if self.width == 0 || self.height == 0 || other.width == 0 || other.height == 0 {
            return false;
        }
        (self.left as u32) < other.right()
            && (other.left as u32) < self.right()
            && (self.top as u32) < other.bottom()
            && (other.top as u32) < self.bottom()
    }
}

/// Color names understood by ratatui (`"yellow"`, `"#ff8800"`, `"240"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelColors {
    #[serde(default = "default_border_color")]
    pub border: String,
    #[serde(default = "default_focus_color")]
    pub focus: String,
    #[serde(default = "default_text_color")]
    pub text: String,
}

fn default_border_color() -> String {
    "gray".to_string()
}

fn default_focus_color() -> String {
    "yellow".to_string()
}

fn default_text_color() -> String {
    "white".to_string()
}

impl Default for PanelColors {
    fn default() -> Self {
        Self {
            border: default_border_color(),
            focus: default_focus_color(),
            text: default_text_color(),
        }
    }
}

/// Read-only settings the orchestration layer consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSettings {
    pub name: String,
    pub title: String,
    pub focus_char: Option<char>,
    pub focusable: bool,
    /// Zero means the widget never refreshes on its own.
    pub refresh_interval: Duration,
    pub enabled: bool,
    pub position: GridPosition,
    pub colors: PanelColors,
}

impl WidgetSettings {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            focus_char: None,
            focusable: false,
            refresh_interval: Duration::ZERO,
            enabled: true,
            position: GridPosition::new(0, 0, 1, 1),
            colors: PanelColors::default(),
        }
    }

    pub fn is_focusable(&self) -> bool {
        self.enabled && (self.focus_char.is_some() || self.focusable)
    }

    /// Interval for the recurring refresh, or `None` for refresh-once widgets.
    pub fn auto_refresh(&self) -> Option<Duration> {
        if self.enabled && !self.refresh_interval.is_zero() {
            Some(self.refresh_interval)
        } else {
            None
        }
    }
}

/// Cancellation flag a refresh loop can sleep on.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.inner.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Idempotent.
    pub fn stop(&self) {
        let mut stopped = self.lock();
        *stopped = true;
        self.inner.1.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.lock()
    }

    /// Sleep for `timeout` or until stopped. Returns `true` if stopped.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (stopped, _) = self
            .inner
            .1
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
            .unwrap_or_else(|e| e.into_inner());
        *stopped
    }
}

/// The private display region a widget renders into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelContent {
    pub lines: Vec<String>,
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Local>>,
    pub scroll: u16,
}

/// Keys a focused widget may interpret locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKey {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    Char(char),
}

const PAGE: u16 = 10;

/// State shared by every widget: settings, stop flag, display region and the
/// redraw requester of the generation it belongs to.
#[derive(Debug)]
pub struct WidgetBase {
    settings: WidgetSettings,
    stop: StopSignal,
    content: Mutex<PanelContent>,
    redraw: RedrawRequester,
}

impl WidgetBase {
    pub fn new(settings: WidgetSettings, redraw: RedrawRequester) -> Self {
        Self {
            settings,
            stop: StopSignal::default(),
            content: Mutex::new(PanelContent::default()),
            redraw,
        }
    }

    fn region(&self) -> MutexGuard<'_, PanelContent> {
        self.content.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn settings(&self) -> &WidgetSettings {
        &self.settings
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn content(&self) -> PanelContent {
        self.region().clone()
    }

    /// Replace the region's text and ask for a repaint.
    pub fn display(&self, lines: Vec<String>) {
        {
            let mut region = self.region();
            region.lines = lines;
            region.error = None;
            region.updated_at = Some(Local::now());
        }
        self.redraw.request_redraw();
    }

    /// Keep the last good text but flag the region with an error.
    pub fn display_error(&self, message: impl Into<String>) {
        {
            let mut region = self.region();
            region.error = Some(message.into());
            region.updated_at = Some(Local::now());
        }
        self.redraw.request_redraw();
    }

    /// Route a fetch result into the region. Errors stay local to the widget.
    pub fn publish(&self, result: Result<Vec<String>>) {
        match result {
            Ok(lines) => self.display(lines),
            Err(e) => {
                tracing::warn!(widget = %self.settings.name, "refresh failed: {:#}", e);
                self.display_error(format!("{:#}", e));
            }
        }
    }

    pub fn scroll(&self, key: PanelKey) -> bool {
        let handled = {
            let mut region = self.region();
            let max = region.lines.len().saturating_sub(1).min(u16::MAX as usize) as u16;
            let next = match key {
                PanelKey::Up | PanelKey::Char('k') => region.scroll.saturating_sub(1),
                PanelKey::Down | PanelKey::Char('j') => region.scroll.saturating_add(1).min(max),
                PanelKey::PageUp => region.scroll.saturating_sub(PAGE),
                PanelKey::PageDown => region.scroll.saturating_add(PAGE).min(max),
                PanelKey::Home => 0,
                PanelKey::Char(_) => return false,
            };
            region.scroll = next;
            true
        };
        if handled {
            self.redraw.request_redraw();
        }
        handled
    }

    pub fn request_redraw(&self) {
        self.redraw.request_redraw();
    }
}

/// Capability set the orchestration layer depends on.
///
/// `refresh` must not panic across the boundary on ordinary failures; it
/// records them in its own region via [`WidgetBase::publish`].
pub trait Widget: Send + Sync {
    fn base(&self) -> &WidgetBase;

    /// Fetch and render into the widget's own region.
    fn refresh(&self);

    fn settings(&self) -> &WidgetSettings {
        self.base().settings()
    }

    fn stop(&self) {
        self.base().stop()
    }

    fn content(&self) -> PanelContent {
        self.base().content()
    }

    /// Widget-local interpretation of a key while focused.
    fn handle_key(&self, key: PanelKey) -> bool {
        self.base().scroll(key)
    }
}
