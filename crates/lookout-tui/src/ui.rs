//! Dashboard chrome and slot rendering.
//!
//! Widget content is drawn by each widget; this module draws the header,
//! per-slot borders, error cells and the footer. One `terminal.draw` covers
//! the whole frame, never one per widget.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use lookout_core::widget::Phase;

use crate::app::{Dashboard, Slot};
use crate::grid;

/// Main UI rendering function.
pub fn draw(frame: &mut Frame<'_>, dashboard: &Dashboard) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Widget grid
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    draw_header(frame, dashboard, chunks[0]);
    draw_slots(frame, dashboard, chunks[1]);
    draw_footer(frame, dashboard, chunks[2]);
}

fn draw_header(frame: &mut Frame<'_>, dashboard: &Dashboard, area: Rect) {
    let theme = &dashboard.theme;
    let mut spans = vec![
        Span::raw("  "),
        Span::styled(
            format!("{} widgets", dashboard.slots.len()),
            Style::default().fg(theme.fg),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("{}x{} grid", dashboard.rows, dashboard.cols),
            Style::default().fg(theme.fg),
        ),
        Span::raw("  │  "),
        Span::styled(format!("theme: {}", theme.name), Style::default().fg(theme.secondary)),
    ];
    if dashboard.paused {
        spans.push(Span::raw("  │  "));
        spans.push(Span::styled(
            "⏸ PAUSED",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" ⌖ LOOKOUT ")
            .title_style(Style::default().fg(theme.primary).add_modifier(Modifier::BOLD))
            .border_style(Style::default().fg(theme.border)),
    );
    frame.render_widget(header, area);
}

fn draw_slots(frame: &mut Frame<'_>, dashboard: &Dashboard, area: Rect) {
    for (index, slot) in dashboard.slots.iter().enumerate() {
        let cell = grid::cell_rect(area, dashboard.rows, dashboard.cols, slot.position);
        if cell.width < 2 || cell.height < 2 {
            continue;
        }

        let focused = index == dashboard.focused;
        let border_style = if focused {
            Style::default().fg(dashboard.theme.primary).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(dashboard.theme.border)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", slot.name))
            .border_style(border_style);
        let inner = block.inner(cell);
        frame.render_widget(block, cell);

        if slot.phase == Phase::Destroyed || inner.width == 0 || inner.height == 0 {
            continue;
        }
        if slot.phase == Phase::Error {
            draw_error_cell(frame, slot, inner);
            continue;
        }

        // A transient fetch error keeps the stale content visible and adds a
        // retry banner on the bottom line instead of blanking the cell.
        let content = if slot.has_error && inner.height > 1 {
            let banner = Rect {
                x: inner.x,
                y: inner.y + inner.height - 1,
                width: inner.width,
                height: 1,
            };
            draw_retry_banner(frame, slot, banner);
            Rect {
                height: inner.height - 1,
                ..inner
            }
        } else {
            inner
        };

        if let Some(widget) = &slot.widget {
            widget.render(frame, content, &dashboard.theme);
        }
    }
}

fn draw_error_cell(frame: &mut Frame<'_>, slot: &Slot, area: Rect) {
    let mut lines = vec![Line::styled(
        "⚠ widget error",
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    )];
    if let Some(message) = &slot.error_message {
        lines.push(Line::styled(message.clone(), Style::default().fg(Color::Red)));
    }
    if let Some(interval) = slot.poll_interval {
        lines.push(Line::styled(
            format!("retrying every {}s", interval.as_secs()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_retry_banner(frame: &mut Frame<'_>, slot: &Slot, area: Rect) {
    let message = slot.error_message.as_deref().unwrap_or("fetch failed");
    let text: String = format!("⚠ {message}, retrying").chars().take(area.width as usize).collect();
    let banner = Paragraph::new(Line::styled(text, Style::default().fg(Color::Red)));
    frame.render_widget(banner, area);
}

fn draw_footer(frame: &mut Frame<'_>, dashboard: &Dashboard, area: Rect) {
    let theme = &dashboard.theme;
    let errors = dashboard.error_count();
    let status = if errors == 0 {
        Span::styled("● ok", Style::default().fg(Color::Green))
    } else {
        Span::styled(
            format!("● {errors} error{}", if errors == 1 { "" } else { "s" }),
            Style::default().fg(Color::Red),
        )
    };

    let last_update = dashboard
        .last_update()
        .map(|ts| ts.format("last update %H:%M:%S").to_string())
        .unwrap_or_else(|| "no updates".to_string());

    let help = "[q] quit  [space] pause  [t] theme  [r] refresh  [←→] focus";

    let footer = Paragraph::new(Line::from(vec![
        Span::raw("  "),
        status,
        Span::raw("  │  "),
        Span::styled(last_update, Style::default().fg(Color::DarkGray)),
        Span::raw("  │  "),
        Span::styled(help, Style::default().fg(Color::DarkGray)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    );

    frame.render_widget(footer, area);
}
