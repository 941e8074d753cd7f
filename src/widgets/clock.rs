// Local time panel

use anyhow::{Result, anyhow};
use chrono::Local;
use std::fmt::Write;

use crate::engine::widget::{Widget, WidgetBase};

pub struct ClockWidget {
    base: WidgetBase,
    format: String,
}

impl ClockWidget {
    pub fn new(base: WidgetBase, format: String) -> Self {
        Self { base, format }
    }

    fn render_lines(&self) -> Result<Vec<String>> {
        let now = Local::now();
        let mut time = String::new();
        // chrono reports a bad format string only when it is rendered
        write!(time, "{}", now.format(&self.format))
            .map_err(|_| anyhow!("invalid clock format '{}'", self.format))?;
        Ok(vec![time, now.format("%A, week %V").to_string()])
    }
}

impl Widget for ClockWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn refresh(&self) {
        self.base.publish(self.render_lines());
    }
}
