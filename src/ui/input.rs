//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, AppState, Tab, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }

        // Tab switching
        KeyCode::Char('1') => app.select_tab(Tab::Events).await,
        KeyCode::Char('2') => app.select_tab(Tab::Courses).await,
        KeyCode::Char('3') => app.select_tab(Tab::Winners).await,
        KeyCode::Right | KeyCode::Tab => {
            let next = app.current_tab.next();
            app.select_tab(next).await;
        }
        KeyCode::Left | KeyCode::BackTab => {
            let prev = app.current_tab.prev();
            app.select_tab(prev).await;
        }

        // Scrolling
        KeyCode::Up | KeyCode::Char('k') => app.scroll_by(-1),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_by(1),
        KeyCode::PageUp => app.scroll_by(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => app.scroll_by(PAGE_SCROLL_SIZE as isize),
        KeyCode::Home => app.scroll_to_top(),

        // Refresh
        KeyCode::Char('u') => app.refresh_current(),

        _ => {}
    }

    Ok(false)
}
