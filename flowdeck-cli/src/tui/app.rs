//! Browser state: the query controller plus everything the screen needs

use std::time::{Duration, Instant};

use flowdeck_core::loader::{LoadKind, LoadResponse, LoadTicket, RequestToken};
use flowdeck_core::{Applied, Controller, Debouncer, OverlaySlot, Result, Theme, Workflow};
use tracing::debug;

/// Input mode for the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Navigate cards, change filters, open details
    #[default]
    Normal,
    /// Editing the search text
    Search,
    /// Key reference overlay
    Help,
}

#[derive(Debug)]
pub struct App {
    pub controller: Controller,
    pub overlay: OverlaySlot,
    pub debouncer: Debouncer,
    pub mode: Mode,
    /// Search text as typed; pushed into the controller on each edit
    pub search_input: String,
    /// Cursor position in chars
    pub search_cursor: usize,
    pub selected_index: usize,
    /// Vertical scroll of the detail body
    pub detail_scroll: u16,
    pub theme: Theme,
    pub status_message: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(controller: Controller, debounce: Duration, theme: Theme) -> Self {
        Self {
            controller,
            overlay: OverlaySlot::default(),
            debouncer: Debouncer::new(debounce),
            mode: Mode::Normal,
            search_input: String::new(),
            search_cursor: 0,
            selected_index: 0,
            detail_scroll: 0,
            theme,
            status_message: None,
            should_quit: false,
        }
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn selected_workflow(&self) -> Option<&Workflow> {
        self.controller.workflows().get(self.selected_index)
    }

    pub fn select_next(&mut self) {
        let len = self.controller.workflows().len();
        if len > 0 {
            self.selected_index = (self.selected_index + 1) % len;
        }
    }

    pub fn select_prev(&mut self) {
        let len = self.controller.workflows().len();
        if len > 0 {
            self.selected_index = self
                .selected_index
                .checked_sub(1)
                .unwrap_or(len.saturating_sub(1));
        }
    }

    pub fn select_last(&mut self) {
        self.selected_index = self.controller.workflows().len().saturating_sub(1);
    }

    /// Record a ticket the UI is about to dispatch
    pub fn started(&mut self, ticket: &LoadTicket) {
        if ticket.kind != LoadKind::More {
            self.selected_index = 0;
        }
        self.clear_status();
    }

    /// Apply a finished listing load
    pub fn apply_load(&mut self, token: RequestToken, kind: LoadKind, result: Result<LoadResponse>) {
        let applied = self.controller.apply(token, kind, result);
        if applied == Applied::Loaded {
            let len = self.controller.workflows().len();
            if self.selected_index >= len {
                self.selected_index = len.saturating_sub(1);
            }
        }
        debug!(token = token.value(), ?applied, "listing response handled");
    }

    /// Fire the debounced search if its quiet period is over
    pub fn poll_debounce(&mut self, now: Instant) -> Option<LoadTicket> {
        if !self.debouncer.fire_if_due(now) {
            return None;
        }
        match self.controller.begin_search() {
            Ok(ticket) => {
                self.started(&ticket);
                Some(ticket)
            }
            Err(e) => {
                self.set_status(e.to_string());
                None
            }
        }
    }

    /// How long the event loop may block before the next tick
    pub fn tick(&self, now: Instant) -> Duration {
        match self.debouncer.remaining(now) {
            Some(left) => left.min(Duration::from_millis(50)),
            None => Duration::from_millis(100),
        }
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.search_input
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.search_input.len())
    }

    fn search_edited(&mut self, now: Instant) {
        self.controller.set_query_text(self.search_input.clone());
        self.debouncer.touch(now);
    }

    pub fn search_insert(&mut self, c: char, now: Instant) {
        let at = self.byte_index(self.search_cursor);
        self.search_input.insert(at, c);
        self.search_cursor += 1;
        self.search_edited(now);
    }

    pub fn search_backspace(&mut self, now: Instant) {
        if self.search_cursor > 0 {
            self.search_cursor -= 1;
            let at = self.byte_index(self.search_cursor);
            self.search_input.remove(at);
            self.search_edited(now);
        }
    }

    pub fn search_clear(&mut self, now: Instant) {
        if !self.search_input.is_empty() {
            self.search_input.clear();
            self.search_cursor = 0;
            self.search_edited(now);
        }
    }

    pub fn cursor_left(&mut self) {
        self.search_cursor = self.search_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        if self.search_cursor < self.search_input.chars().count() {
            self.search_cursor += 1;
        }
    }

    /// Open the detail overlay for the selected card
    pub fn open_detail(&mut self) -> bool {
        let Some(workflow) = self.selected_workflow().cloned() else {
            return false;
        };
        let category = self.controller.category_of(&workflow).to_string();
        self.overlay.open(workflow, category);
        self.detail_scroll = 0;
        true
    }

    pub fn close_detail(&mut self) {
        self.overlay.close();
        self.detail_scroll = 0;
    }
}
