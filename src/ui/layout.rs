// Grid geometry: config tracks to terminal rectangles

use ratatui::layout::{Constraint, Layout, Rect};

use crate::config::GridConfig;
use crate::engine::widget::GridPosition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    columns: Vec<u16>,
    rows: Vec<u16>,
}

impl GridLayout {
    pub fn new(columns: Vec<u16>, rows: Vec<u16>) -> Self {
        Self { columns, rows }
    }

    pub fn from_config(grid: &GridConfig) -> Self {
        Self::new(grid.columns.clone(), grid.rows.clone())
    }

    fn constraints(tracks: &[u16]) -> Vec<Constraint> {
        tracks
            .iter()
            .map(|&size| {
                if size == 0 {
                    Constraint::Fill(1)
                } else {
                    Constraint::Length(size)
                }
            })
            .collect()
    }

    /// Split `area` into column and row cells.
    pub fn cells(&self, area: Rect) -> (Vec<Rect>, Vec<Rect>) {
        let columns = Layout::horizontal(Self::constraints(&self.columns)).split(area);
        let rows = Layout::vertical(Self::constraints(&self.rows)).split(area);
        (columns.to_vec(), rows.to_vec())
    }

    /// Screen rectangle covered by `position`, or `None` if it lies outside
    /// the grid or the visible area.
    pub fn rect_for(&self, area: Rect, position: &GridPosition) -> Option<Rect> {
        if position.width == 0 || position.height == 0 {
            return None;
        }

        let (columns, rows) = self.cells(area);
        let first_col = columns.get(position.left as usize)?;
        let last_col = columns.get(position.right() as usize - 1)?;
        let first_row = rows.get(position.top as usize)?;
        let last_row = rows.get(position.bottom() as usize - 1)?;

        let x = first_col.x;
        let y = first_row.y;
        let rect = Rect {
            x,
            y,
            width: last_col.right().saturating_sub(x),
            height: last_row.bottom().saturating_sub(y),
        }
        .intersection(area);

        if rect.is_empty() { None } else { Some(rect) }
    }
}
