//! Layout validation for a widget set before it is scheduled.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::widget::Widget;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub widget: String,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.widget.is_empty() {
            write!(f, "{}: {}", self.field, self.message)
        } else {
            write!(f, "{} ({}): {}", self.widget, self.field, self.message)
        }
    }
}

/// Number of grid cells available to widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub columns: usize,
    pub rows: usize,
}

/// Check a widget set against the grid. Every problem is reported, not just
/// the first one.
pub fn validate(widgets: &[Arc<dyn Widget>], grid: GridBounds) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if widgets.is_empty() {
        errors.push(err(
            "",
            "widgets",
            "no widgets defined; at least one widget is required",
        ));
    }

    if grid.columns == 0 {
        errors.push(err("", "grid.columns", "grid declares no columns"));
    }
    if grid.rows == 0 {
        errors.push(err("", "grid.rows", "grid declares no rows"));
    }

    // Focus keys: every widget sharing a key is reported
    let mut by_key: BTreeMap<char, Vec<&str>> = BTreeMap::new();
    for widget in widgets {
        let settings = widget.settings();
        if let (true, Some(key)) = (settings.enabled, settings.focus_char) {
            by_key.entry(key).or_default().push(&settings.name);
        }
    }
    for (key, names) in &by_key {
        if names.len() > 1 {
            for name in names {
                errors.push(err(
                    name,
                    "focus_char",
                    &format!("focus key '{}' is shared by {}", key, names.join(", ")),
                ));
            }
        }
    }

    // Geometry
    for widget in widgets {
        let settings = widget.settings();
        let pos = settings.position;

        if pos.width == 0 || pos.height == 0 {
            errors.push(err(
                &settings.name,
                "position",
                "width and height must both be at least 1",
            ));
            continue;
        }

        if grid.columns > 0 && pos.right() > grid.columns as u32 {
            errors.push(err(
                &settings.name,
                "position.left",
                &format!(
                    "columns {}..{} exceed the grid's {} columns",
                    pos.left,
                    pos.right(),
                    grid.columns
                ),
            ));
        }
        if grid.rows > 0 && pos.bottom() > grid.rows as u32 {
            errors.push(err(
                &settings.name,
                "position.top",
                &format!(
                    "rows {}..{} exceed the grid's {} rows",
                    pos.top,
                    pos.bottom(),
                    grid.rows
                ),
            ));
        }
    }

    let enabled: Vec<_> = widgets.iter().filter(|w| w.settings().enabled).collect();
    for (i, a) in enabled.iter().enumerate() {
        for b in &enabled[i + 1..] {
            let (sa, sb) = (a.settings(), b.settings());
            if sa.position.overlaps(&sb.position) {
                errors.push(err(
                    &sa.name,
                    "position",
                    &format!("overlaps widget '{}'", sb.name),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Human-readable report, one problem per line.
pub fn render_report(errors: &[ValidationError]) -> String {
    let mut out = format!("Found {} configuration problem(s):\n", errors.len());
    for error in errors {
        out.push_str("  - ");
        out.push_str(&error.to_string());
        out.push('\n');
    }
    out
}

fn err(widget: &str, field: &str, message: &str) -> ValidationError {
    ValidationError {
        widget: widget.to_string(),
        field: field.to_string(),
        message: message.to_string(),
    }
}
