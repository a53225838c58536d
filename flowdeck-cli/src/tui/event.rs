//! Key handling for the browser

use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use flowdeck_core::loader::LoadTicket;
use flowdeck_core::{DetailFetch, DetailTab, FilterState, Result};

use super::app::{App, Mode};

/// Poll for events with timeout
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Result of handling a key event
#[derive(Debug)]
pub enum HandleResult {
    Continue,
    Quit,
    /// Dispatch a listing load
    Load(LoadTicket),
    /// Fetch a detail tab
    Fetch(DetailFetch),
    /// Copy the overlay's current text
    Copy,
    /// Download the named workflow
    Download(String),
    /// Switch theme and persist it
    ToggleTheme,
}

/// Lines lifted into the help popup
pub const HELP_TEXT: &str = "\
Browse
  j/k, ↑/↓     move selection       g/G   first/last
  Enter        open details         d     download
  n            load more            r     retry / reload
  /            search               x     clear filters
  t            cycle trigger        c     cycle complexity
  o            cycle category       a     toggle active only
  T            toggle theme         q     quit

Details
  j            JSON tab             v     diagram tab
  o            overview             y     copy
  d            download             ↑/↓, PgUp/PgDn  scroll
  Esc/q        close";

pub fn handle_key(app: &mut App, key: KeyEvent, now: Instant) -> HandleResult {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return HandleResult::Quit;
    }

    if app.mode == Mode::Help {
        app.mode = Mode::Normal;
        return HandleResult::Continue;
    }

    if app.overlay.is_open() {
        return handle_overlay(app, key);
    }

    match app.mode {
        Mode::Search => handle_search_mode(app, key, now),
        Mode::Normal | Mode::Help => handle_normal_mode(app, key),
    }
}

/// Turn a started load into a dispatch, or surface why it could not start
fn started(app: &mut App, ticket: Result<LoadTicket>) -> HandleResult {
    match ticket {
        Ok(ticket) => {
            app.started(&ticket);
            HandleResult::Load(ticket)
        }
        Err(e) => {
            app.set_status(e.to_string());
            HandleResult::Continue
        }
    }
}

/// Apply a filter change; pending search text goes with it
fn change_filters<F>(app: &mut App, change: F) -> HandleResult
where
    F: FnOnce(&mut FilterState),
{
    app.debouncer.cancel();
    let ticket = app.controller.update_filters(change);
    started(app, ticket)
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) -> HandleResult {
    match key.code {
        KeyCode::Char('q') => HandleResult::Quit,

        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            HandleResult::Continue
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_prev();
            HandleResult::Continue
        }
        KeyCode::Char('g') | KeyCode::Home => {
            app.selected_index = 0;
            HandleResult::Continue
        }
        KeyCode::Char('G') | KeyCode::End => {
            app.select_last();
            HandleResult::Continue
        }

        KeyCode::Char('/') => {
            app.mode = Mode::Search;
            app.search_cursor = app.search_input.chars().count();
            HandleResult::Continue
        }

        KeyCode::Char('t') => change_filters(app, |f| f.trigger = f.trigger.next()),
        KeyCode::Char('c') => change_filters(app, |f| f.complexity = f.complexity.next()),
        KeyCode::Char('o') => {
            let categories = app.controller.categories().to_vec();
            change_filters(app, |f| f.category = f.category.next(&categories))
        }
        KeyCode::Char('a') => change_filters(app, |f| f.active_only = !f.active_only),
        KeyCode::Char('x') => {
            app.search_input.clear();
            app.search_cursor = 0;
            change_filters(app, |f| {
                *f = FilterState::new(f.per_page);
            })
        }

        KeyCode::Char('n') => match app.controller.begin_load_more() {
            Some(ticket) => {
                app.started(&ticket);
                HandleResult::Load(ticket)
            }
            None => HandleResult::Continue,
        },
        KeyCode::Char('r') => {
            app.debouncer.cancel();
            let ticket = app.controller.begin_initial();
            started(app, ticket)
        }

        KeyCode::Enter => {
            app.open_detail();
            HandleResult::Continue
        }
        KeyCode::Char('d') => match app.selected_workflow() {
            Some(wf) => HandleResult::Download(wf.filename.clone()),
            None => HandleResult::Continue,
        },

        KeyCode::Char('T') => HandleResult::ToggleTheme,
        KeyCode::Char('?') => {
            app.mode = Mode::Help;
            HandleResult::Continue
        }
        KeyCode::Esc => {
            app.clear_status();
            HandleResult::Continue
        }
        _ => HandleResult::Continue,
    }
}

fn handle_search_mode(app: &mut App, key: KeyEvent, now: Instant) -> HandleResult {
    match key.code {
        KeyCode::Esc => {
            app.mode = Mode::Normal;
            HandleResult::Continue
        }
        KeyCode::Enter => {
            app.mode = Mode::Normal;
            app.debouncer.cancel();
            let ticket = app.controller.begin_search();
            started(app, ticket)
        }
        KeyCode::Backspace => {
            app.search_backspace(now);
            HandleResult::Continue
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.search_clear(now);
            HandleResult::Continue
        }
        KeyCode::Char(c) => {
            app.search_insert(c, now);
            HandleResult::Continue
        }
        KeyCode::Left => {
            app.cursor_left();
            HandleResult::Continue
        }
        KeyCode::Right => {
            app.cursor_right();
            HandleResult::Continue
        }
        _ => HandleResult::Continue,
    }
}

fn handle_overlay(app: &mut App, key: KeyEvent) -> HandleResult {
    let Some(overlay) = app.overlay.current_mut() else {
        return HandleResult::Continue;
    };

    let fetch = match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            app.close_detail();
            return HandleResult::Continue;
        }
        KeyCode::Char('j') => overlay.toggle(DetailTab::Json),
        KeyCode::Char('v') => overlay.toggle(DetailTab::Diagram),
        KeyCode::Char('o') => overlay.show(DetailTab::Overview),
        KeyCode::Tab => {
            let next = match overlay.tab() {
                DetailTab::Overview => DetailTab::Json,
                DetailTab::Json => DetailTab::Diagram,
                DetailTab::Diagram => DetailTab::Overview,
            };
            overlay.show(next)
        }
        KeyCode::Char('y') => return HandleResult::Copy,
        KeyCode::Char('d') => return HandleResult::Download(overlay.workflow().filename.clone()),
        KeyCode::Down => {
            app.detail_scroll = app.detail_scroll.saturating_add(1);
            return HandleResult::Continue;
        }
        KeyCode::Up => {
            app.detail_scroll = app.detail_scroll.saturating_sub(1);
            return HandleResult::Continue;
        }
        KeyCode::PageDown => {
            app.detail_scroll = app.detail_scroll.saturating_add(10);
            return HandleResult::Continue;
        }
        KeyCode::PageUp => {
            app.detail_scroll = app.detail_scroll.saturating_sub(10);
            return HandleResult::Continue;
        }
        _ => return HandleResult::Continue,
    };

    app.detail_scroll = 0;
    match fetch {
        Some(fetch) => HandleResult::Fetch(fetch),
        None => HandleResult::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowdeck_core::{Controller, Theme, TriggerFilter, TriggerType};

    fn app() -> App {
        App::new(Controller::default(), Duration::from_millis(300), Theme::Dark)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_trigger_key_starts_reset_load() {
        let mut app = app();
        match handle_key(&mut app, key(KeyCode::Char('t')), Instant::now()) {
            HandleResult::Load(ticket) => {
                assert_eq!(ticket.kind, flowdeck_core::LoadKind::Reset);
            }
            other => panic!("expected load, got {:?}", other),
        }
        assert_eq!(
            app.controller.filters().trigger,
            TriggerFilter::Only(TriggerType::Manual)
        );
    }

    #[test]
    fn test_search_enter_fires_without_waiting() {
        let now = Instant::now();
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Char('/')), now);
        assert_eq!(app.mode, Mode::Search);
        handle_key(&mut app, key(KeyCode::Char('q')), now);
        assert_eq!(app.search_input, "q");
        assert!(app.debouncer.is_pending());

        let result = handle_key(&mut app, key(KeyCode::Enter), now);
        assert!(matches!(result, HandleResult::Load(_)));
        assert!(!app.debouncer.is_pending());
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_help_dismissed_by_any_key() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Char('?')), Instant::now());
        assert_eq!(app.mode, Mode::Help);
        let result = handle_key(&mut app, key(KeyCode::Char('q')), Instant::now());
        assert!(matches!(result, HandleResult::Continue));
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_ctrl_c_quits_from_search() {
        let mut app = app();
        app.mode = Mode::Search;
        let result = handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Instant::now(),
        );
        assert!(matches!(result, HandleResult::Quit));
    }

    #[test]
    fn test_overlay_json_key_requests_fetch_once() {
        let mut app = app();
        let wf: flowdeck_core::Workflow =
            serde_json::from_value(serde_json::json!({"filename": "0001_a.json"})).unwrap();
        app.overlay.open(wf, "CRM");

        let first = handle_key(&mut app, key(KeyCode::Char('j')), Instant::now());
        assert!(matches!(first, HandleResult::Fetch(DetailFetch::Json { .. })));
        // back to overview, then JSON again while still loading
        handle_key(&mut app, key(KeyCode::Char('j')), Instant::now());
        let again = handle_key(&mut app, key(KeyCode::Char('j')), Instant::now());
        assert!(matches!(again, HandleResult::Continue));

        handle_key(&mut app, key(KeyCode::Esc), Instant::now());
        assert!(!app.overlay.is_open());
    }
}
