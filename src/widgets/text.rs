// Static text panel, inline or read from a file

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::engine::widget::{Widget, WidgetBase};

pub struct TextWidget {
    base: WidgetBase,
    text: Option<String>,
    path: Option<PathBuf>,
}

impl TextWidget {
    pub fn new(base: WidgetBase, text: Option<String>, path: Option<PathBuf>) -> Self {
        Self { base, text, path }
    }

    fn load(&self) -> Result<Vec<String>> {
        let body = match (&self.path, &self.text) {
            (Some(path), _) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            (None, Some(text)) => text.clone(),
            (None, None) => String::new(),
        };
        Ok(body.lines().map(str::to_string).collect())
    }
}

impl Widget for TextWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn refresh(&self) {
        self.base.publish(self.load());
    }
}
