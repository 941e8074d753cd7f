// Display coordinator: the only code path that paints the terminal

use ratatui::{
    Frame, Terminal,
    backend::Backend,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crate::engine::redraw::{Drained, RedrawDrain};
use crate::engine::widget::{PanelContent, Widget, WidgetSettings};
use crate::ui::layout::GridLayout;

/// Everything one generation puts on screen.
pub struct Screen {
    generation: u64,
    widgets: Vec<Arc<dyn Widget>>,
    layout: GridLayout,
    focused: Mutex<Option<usize>>,
    status: Mutex<Option<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl Screen {
    pub fn new(generation: u64, widgets: Vec<Arc<dyn Widget>>, layout: GridLayout) -> Self {
        Self {
            generation,
            widgets,
            layout,
            focused: Mutex::new(None),
            status: Mutex::new(None),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Published by the orchestrator after every focus transition.
    pub fn set_focused(&self, index: Option<usize>) {
        *lock(&self.focused) = index;
    }

    pub fn focused(&self) -> Option<usize> {
        *lock(&self.focused)
    }

    pub fn set_status(&self, message: Option<String>) {
        *lock(&self.status) = message;
    }

    pub fn status(&self) -> Option<String> {
        lock(&self.status).clone()
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Start from a blank frame so no cells survive from another layout
        frame.render_widget(Clear, area);

        let status = self.status();
        let grid_area = match status {
            Some(_) if area.height > 1 => Rect {
                height: area.height - 1,
                ..area
            },
            _ => area,
        };

        let focused = self.focused();
        for (index, widget) in self.widgets.iter().enumerate() {
            let settings = widget.settings();
            if !settings.enabled {
                continue;
            }
            let Some(rect) = self.layout.rect_for(grid_area, &settings.position) else {
                continue;
            };
            render_panel(
                frame,
                rect,
                settings,
                &widget.content(),
                focused == Some(index),
            );
        }

        if let Some(message) = status {
            if area.height > 1 {
                let line_area = Rect {
                    y: area.bottom() - 1,
                    height: 1,
                    ..area
                };
                let line = Paragraph::new(Line::from(Span::styled(
                    message,
                    Style::default().fg(Color::Black).bg(Color::Red),
                )));
                frame.render_widget(line, line_area);
            }
        }
    }
}

fn parse_color(name: &str, fallback: Color) -> Color {
    name.parse().unwrap_or(fallback)
}

fn render_panel(
    frame: &mut Frame,
    area: Rect,
    settings: &WidgetSettings,
    content: &PanelContent,
    focused: bool,
) {
    let border_color = if focused {
        parse_color(&settings.colors.focus, Color::Yellow)
    } else {
        parse_color(&settings.colors.border, Color::Gray)
    };
    let text_color = parse_color(&settings.colors.text, Color::White);

    let title = match settings.focus_char {
        Some(c) => format!(" {} [{}] ", settings.title, c),
        None => format!(" {} ", settings.title),
    };

    let mut border_style = Style::default().fg(border_color);
    if focused {
        border_style = border_style.add_modifier(Modifier::BOLD);
    }

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title);
    if let Some(updated) = content.updated_at {
        block = block.title_bottom(
            Line::from(format!(" {} ", updated.format("%H:%M:%S"))).alignment(Alignment::Right),
        );
    }

    let mut lines = Vec::with_capacity(content.lines.len() + 1);
    if let Some(error) = &content.error {
        lines.push(Line::from(Span::styled(
            format!("! {}", error),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }
    lines.extend(content.lines.iter().map(|l| Line::from(l.as_str())));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().fg(text_color))
        .wrap(Wrap { trim: false })
        .scroll((content.scroll, 0));

    frame.render_widget(paragraph, area);
}

/// Redraw consumer loop for one generation.
pub struct DisplayCoordinator {
    handle: JoinHandle<()>,
    repaints: Arc<AtomicUsize>,
}

impl DisplayCoordinator {
    pub fn spawn<B>(
        terminal: Arc<Mutex<Terminal<B>>>,
        screen: Arc<Screen>,
        drain: RedrawDrain,
    ) -> io::Result<Self>
    where
        B: Backend + Send + 'static,
    {
        let repaints = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&repaints);

        let handle = thread::Builder::new()
            .name(format!("display-{}", screen.generation()))
            .spawn(move || {
                let mut first_paint = true;
                while drain.drain() == Drained::Repaint {
                    let mut terminal = lock(&terminal);

                    // A new generation may have a different layout
                    if first_paint {
                        if let Err(e) = terminal.clear() {
                            tracing::warn!("failed to clear terminal: {}", e);
                        }
                        first_paint = false;
                    }

                    if let Err(e) = terminal.draw(|frame| screen.render(frame)) {
                        tracing::error!("repaint failed: {}", e);
                    }
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                tracing::debug!(generation = screen.generation(), "display loop exited");
            })?;

        Ok(Self { handle, repaints })
    }

    pub fn repaints(&self) -> usize {
        self.repaints.load(Ordering::SeqCst)
    }

    /// Wait for the loop to exit. The generation's redraw signal must be
    /// closed first.
    pub fn join(self) {
        if self.handle.join().is_err() {
            tracing::error!("display loop panicked");
        }
    }
}
