// Allow dead code: Style functions defined for consistent UI
#![allow(dead_code)]

use ratatui::style::{Color, Modifier, Style};

// Color palette
pub const PRIMARY: Color = Color::Rgb(64, 128, 192);
pub const SECONDARY: Color = Color::Rgb(96, 160, 96);
pub const ACCENT: Color = Color::Rgb(192, 160, 64);
pub const ERROR: Color = Color::Rgb(192, 64, 64);
pub const MUTED: Color = Color::Rgb(128, 128, 128);

// Medal colors for the leaderboard
pub const GOLD: Color = Color::Rgb(212, 175, 55);
pub const SILVER: Color = Color::Rgb(170, 170, 180);
pub const BRONZE: Color = Color::Rgb(176, 120, 80);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn link_style() -> Style {
    Style::default()
        .fg(PRIMARY)
        .add_modifier(Modifier::UNDERLINED)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(PRIMARY)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::White)
    }
}

pub fn border_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 32, 40)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn medal_style(rank: u32) -> Style {
    match rank {
        1 => Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
        2 => Style::default().fg(SILVER).add_modifier(Modifier::BOLD),
        3 => Style::default().fg(BRONZE).add_modifier(Modifier::BOLD),
        _ => muted_style(),
    }
}
