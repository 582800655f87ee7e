//! Grid cell placement.
//!
//! Positions are `(row, col, row_span, col_span)` on an R x C grid. Cells are
//! integer-proportional; the division remainder goes to the last row and
//! column so the grid always covers the full content area.

use ratatui::layout::Rect;

use crate::config::Position;

/// Compute the terminal rectangle for one grid position.
#[must_use]
pub fn cell_rect(area: Rect, rows: u16, cols: u16, position: Position) -> Rect {
    let rows = rows.max(1);
    let cols = cols.max(1);
    let cell_width = area.width / cols;
    let cell_height = area.height / rows;

    let x = area.x.saturating_add(position.col.min(cols).saturating_mul(cell_width));
    let y = area.y.saturating_add(position.row.min(rows).saturating_mul(cell_height));

    let width = if position.col.saturating_add(position.col_span) >= cols {
        (area.x + area.width).saturating_sub(x)
    } else {
        cell_width.saturating_mul(position.col_span)
    };
    let height = if position.row.saturating_add(position.row_span) >= rows {
        (area.y + area.height).saturating_sub(y)
    } else {
        cell_height.saturating_mul(position.row_span)
    };

    Rect { x, y, width, height }
}
