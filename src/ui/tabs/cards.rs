//! Card-style rendering of raw sheet rows, shared by the Events and Courses
//! tabs and the Winners list pane.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, SheetView};
use crate::models::{FieldValue, Record};
use crate::ui::styles;
use crate::utils::format_header;

/// Build display lines for rows, newest first. One card per row: a line per
/// field plus a separator line.
pub fn card_lines(records: &[Record]) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    for record in records.iter().rev() {
        for (field, value) in record.fields() {
            let value_span = match value {
                FieldValue::Link(url) => Span::styled(url.as_str(), styles::link_style()),
                other => Span::styled(other.to_string(), styles::list_item_style()),
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{:<16}", format_header(field)), styles::muted_style()),
                Span::styled(": ", styles::muted_style()),
                value_span,
            ]));
        }
        lines.push(Line::from(Span::styled(
            "─".repeat(30),
            styles::border_style(),
        )));
    }
    lines
}

/// Render the active tab's sheet as a scrollable card list.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(" {} ", app.current_tab.title());
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style());

    let paragraph = match app.current_view() {
        SheetView::Loading => {
            Paragraph::new(Line::from(Span::styled(" Loading...", styles::muted_style())))
        }
        SheetView::Unavailable => Paragraph::new(Line::from(Span::styled(
            " Failed to load data.",
            styles::error_style(),
        ))),
        SheetView::Ready(records) if records.is_empty() => Paragraph::new(Line::from(
            Span::styled(" No data available.", styles::muted_style()),
        )),
        SheetView::Ready(records) => {
            let lines = card_lines(records);
            let visible = area.height.saturating_sub(2) as usize;
            let max_scroll = lines.len().saturating_sub(visible);
            let offset = app.current_scroll().min(max_scroll) as u16;
            Paragraph::new(lines).scroll((offset, 0))
        }
    };

    frame.render_widget(paragraph.block(block), area);
}
