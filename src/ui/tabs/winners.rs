//! Winners tab: ranked champions leaderboard beside the full winner list.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, SheetView};
use crate::leaderboard::{compute_standings, weight_label, Standing};
use crate::ui::styles;
use crate::utils::truncate;

use super::cards;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    render_leaderboard(frame, app, chunks[0]);
    render_winner_list(frame, app, chunks[1]);
}

fn medal(rank: u32) -> &'static str {
    match rank {
        1 => "*1st*",
        2 => "*2nd*",
        3 => "*3rd*",
        _ => "     ",
    }
}

// Every span is an owned string, so the line borrows nothing from the
// standing and can outlive the per-render standings vec.
fn standing_line(standing: &Standing) -> Line<'static> {
    let wins_word = if standing.wins == 1 { "win" } else { "wins" };
    Line::from(vec![
        Span::styled(format!(" {} ", medal(standing.rank)), styles::medal_style(standing.rank)),
        Span::styled(
            format!("{:<20}", truncate(&standing.name, 20)),
            styles::list_item_style(),
        ),
        Span::styled(
            format!(
                "{} {} (Best: {} Place)",
                standing.wins,
                wins_word,
                weight_label(standing.best_weight)
            ),
            styles::muted_style(),
        ),
    ])
}

fn render_leaderboard(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Champions Leaderboard ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style());

    let lines: Vec<Line> = match app.current_view() {
        SheetView::Loading => {
            vec![Line::from(Span::styled(" Loading...", styles::muted_style()))]
        }
        SheetView::Unavailable => vec![Line::from(Span::styled(
            " Failed to load data.",
            styles::error_style(),
        ))],
        SheetView::Ready(records) => {
            // Derived on every render; nothing here is persisted
            let standings = compute_standings(records);
            if standings.is_empty() {
                vec![Line::from(Span::styled(
                    " No leaderboard yet. Keep competing!",
                    styles::muted_style(),
                ))]
            } else {
                standings.iter().map(standing_line).collect()
            }
        }
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_winner_list(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" All Winners ")
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
            let lines = cards::card_lines(records);
            let visible = area.height.saturating_sub(2) as usize;
            let max_scroll = lines.len().saturating_sub(visible);
            let offset = app.current_scroll().min(max_scroll) as u16;
            Paragraph::new(lines).scroll((offset, 0))
        }
    };

    frame.render_widget(paragraph.block(block), area);
}
