// Concrete dashboard panels and the factory that builds them from config

use anyhow::{Context, Result, bail};
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::config::{Config, WidgetKind};
use crate::engine::redraw::RedrawRequester;
use crate::engine::widget::{Widget, WidgetBase};

pub mod clock;
pub mod command;
pub mod gitlab;
pub mod resources;
pub mod text;

pub use clock::ClockWidget;
pub use command::CommandWidget;
pub use gitlab::GitlabWidget;
pub use resources::ResourcesWidget;
pub use text::TextWidget;

/// Build the widget set for one generation, in declared order.
pub fn make_widgets(config: &Config, redraw: &RedrawRequester) -> Result<Vec<Arc<dyn Widget>>> {
    config
        .widgets
        .iter()
        .map(|widget_config| {
            let base = WidgetBase::new(widget_config.settings(), redraw.clone());
            let widget: Arc<dyn Widget> = match &widget_config.kind {
                WidgetKind::Clock { format } => Arc::new(ClockWidget::new(base, format.clone())),
                WidgetKind::Text { text, path } => {
                    Arc::new(TextWidget::new(base, text.clone(), path.clone()))
                }
                WidgetKind::Command { command } => Arc::new(CommandWidget::new(base, command)?),
                WidgetKind::Resources => Arc::new(ResourcesWidget::new(base)),
                WidgetKind::Gitlab {
                    domain,
                    api_key,
                    projects,
                } => Arc::new(GitlabWidget::new(
                    base,
                    domain.clone(),
                    api_key.clone(),
                    projects.clone(),
                    config.app.open_url_util.clone(),
                )?),
            };
            Ok(widget)
        })
        .collect()
}

/// Hand `url` to the configured opener, e.g. `["xdg-open"]`. The child is
/// not waited on.
pub fn open_url(util: &[String], url: &str) -> Result<()> {
    let Some((program, args)) = util.split_first() else {
        bail!("open_url_util is empty");
    };
    Command::new(program)
        .args(args)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to run {}", program))?;
    tracing::debug!(%url, "opened url");
    Ok(())
}
