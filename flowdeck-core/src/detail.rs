//! Detail overlay state
//!
//! The overview comes straight from the already-fetched record. The JSON and
//! diagram tabs are fetched the first time they are shown and cached until the
//! overlay closes. Each open gets a fresh session id; fetches that complete
//! after their session closed are dropped.

use std::time::Instant;

use tracing::debug;

use crate::clipboard::CopyFeedback;
use crate::error::Result;
use crate::model::Workflow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailTab {
    #[default]
    Overview,
    Json,
    Diagram,
}

impl DetailTab {
    pub fn title(&self) -> &'static str {
        match self {
            DetailTab::Overview => "Overview",
            DetailTab::Json => "JSON",
            DetailTab::Diagram => "Diagram",
        }
    }
}

/// A lazily loaded sub-view
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubView {
    #[default]
    NotLoaded,
    Loading,
    Loaded(String),
    Failed(String),
}

impl SubView {
    pub fn text(&self) -> Option<&str> {
        match self {
            SubView::Loaded(text) => Some(text),
            _ => None,
        }
    }
}

/// A fetch the overlay needs; run it and report back with the same session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailFetch {
    Json { session: u64, filename: String },
    Diagram { session: u64, filename: String },
}

#[derive(Debug, Clone)]
pub struct DetailOverlay {
    session: u64,
    workflow: Workflow,
    category: String,
    tab: DetailTab,
    json: SubView,
    diagram: SubView,
    copy: CopyFeedback,
}

impl DetailOverlay {
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn tab(&self) -> DetailTab {
        self.tab
    }

    pub fn json(&self) -> &SubView {
        &self.json
    }

    pub fn diagram(&self) -> &SubView {
        &self.diagram
    }

    pub fn copy_feedback(&self) -> &CopyFeedback {
        &self.copy
    }

    /// Switch tabs; returns the fetch to run if the tab has no data yet
    pub fn show(&mut self, tab: DetailTab) -> Option<DetailFetch> {
        self.tab = tab;
        let filename = self.workflow.filename.clone();
        let session = self.session;
        match tab {
            DetailTab::Overview => None,
            DetailTab::Json => match self.json {
                SubView::NotLoaded | SubView::Failed(_) => {
                    self.json = SubView::Loading;
                    Some(DetailFetch::Json { session, filename })
                }
                _ => None,
            },
            DetailTab::Diagram => match self.diagram {
                SubView::NotLoaded | SubView::Failed(_) => {
                    self.diagram = SubView::Loading;
                    Some(DetailFetch::Diagram { session, filename })
                }
                _ => None,
            },
        }
    }

    /// Toggle between the overview and `tab`
    pub fn toggle(&mut self, tab: DetailTab) -> Option<DetailFetch> {
        if self.tab == tab {
            self.show(DetailTab::Overview)
        } else {
            self.show(tab)
        }
    }

    /// Text the copy action should put on the clipboard
    pub fn copy_text(&self) -> Option<&str> {
        match self.tab {
            DetailTab::Json => self.json.text(),
            DetailTab::Diagram => self.diagram.text(),
            DetailTab::Overview => Some(&self.workflow.filename),
        }
    }

    pub fn mark_copied(&mut self, now: Instant) {
        self.copy.mark(now);
    }
}

/// Holds at most one open overlay and hands out session ids
#[derive(Debug, Default)]
pub struct OverlaySlot {
    current: Option<DetailOverlay>,
    sessions: u64,
}

impl OverlaySlot {
    pub fn open(&mut self, workflow: Workflow, category: impl Into<String>) -> &mut DetailOverlay {
        self.sessions += 1;
        debug!(session = self.sessions, filename = %workflow.filename, "detail overlay opened");
        self.current.insert(DetailOverlay {
            session: self.sessions,
            workflow,
            category: category.into(),
            tab: DetailTab::Overview,
            json: SubView::NotLoaded,
            diagram: SubView::NotLoaded,
            copy: CopyFeedback::default(),
        })
    }

    /// Close and drop both caches and the copy state
    pub fn close(&mut self) {
        if let Some(overlay) = self.current.take() {
            debug!(session = overlay.session, "detail overlay closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&DetailOverlay> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut DetailOverlay> {
        self.current.as_mut()
    }

    fn live_session(&mut self, session: u64) -> Option<&mut DetailOverlay> {
        self.current.as_mut().filter(|o| o.session == session)
    }

    /// Store a JSON fetch result; false if the session is gone
    pub fn apply_json(&mut self, session: u64, result: Result<serde_json::Value>) -> bool {
        let Some(overlay) = self.live_session(session) else {
            debug!(session, "dropping JSON for closed overlay");
            return false;
        };
        overlay.json = match result {
            Ok(value) => match serde_json::to_string_pretty(&value) {
                Ok(text) => SubView::Loaded(text),
                Err(e) => SubView::Failed(e.to_string()),
            },
            Err(e) => SubView::Failed(e.to_string()),
        };
        true
    }

    /// Store a diagram fetch result; false if the session is gone
    pub fn apply_diagram(&mut self, session: u64, result: Result<String>) -> bool {
        let Some(overlay) = self.live_session(session) else {
            debug!(session, "dropping diagram for closed overlay");
            return false;
        };
        overlay.diagram = match result {
            Ok(text) => SubView::Loaded(text),
            Err(e) => SubView::Failed(e.to_string()),
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeckError;

    fn workflow() -> Workflow {
        serde_json::from_value(serde_json::json!({
            "filename": "0007_crm_sync.json",
            "name": "CRM Sync",
            "integrations": ["HubSpot", "Slack"]
        }))
        .unwrap()
    }

    #[test]
    fn test_json_fetched_once_per_session() {
        let mut slot = OverlaySlot::default();
        let session = slot.open(workflow(), "CRM").session();

        let fetch = slot.current_mut().unwrap().show(DetailTab::Json);
        assert_eq!(
            fetch,
            Some(DetailFetch::Json {
                session,
                filename: "0007_crm_sync.json".to_string()
            })
        );
        assert!(slot.apply_json(session, Ok(serde_json::json!({"nodes": []}))));

        let overlay = slot.current_mut().unwrap();
        assert_eq!(overlay.show(DetailTab::Overview), None);
        assert_eq!(overlay.show(DetailTab::Json), None);
        assert!(overlay.copy_text().unwrap().contains("\"nodes\""));
    }

    #[test]
    fn test_reopen_refetches_and_resets_copy_state() {
        let mut slot = OverlaySlot::default();
        let first = slot.open(workflow(), "CRM").session();
        slot.current_mut().unwrap().show(DetailTab::Diagram);
        slot.apply_diagram(first, Ok("graph TD".to_string()));
        slot.current_mut().unwrap().mark_copied(Instant::now());
        slot.close();
        assert!(!slot.is_open());

        let second = slot.open(workflow(), "CRM").session();
        assert_ne!(first, second);
        let overlay = slot.current_mut().unwrap();
        assert!(!overlay.copy_feedback().is_visible(Instant::now()));
        assert_eq!(overlay.diagram(), &SubView::NotLoaded);
        assert!(matches!(
            overlay.show(DetailTab::Diagram),
            Some(DetailFetch::Diagram { .. })
        ));
    }

    #[test]
    fn test_late_result_for_closed_session_is_dropped() {
        let mut slot = OverlaySlot::default();
        let first = slot.open(workflow(), "CRM").session();
        slot.current_mut().unwrap().show(DetailTab::Json);
        slot.close();
        let second = slot.open(workflow(), "CRM").session();

        assert!(!slot.apply_json(first, Ok(serde_json::json!({"stale": true}))));
        assert_eq!(slot.current().unwrap().json(), &SubView::NotLoaded);
        assert!(slot.apply_json(second, Err(DeckError::http(404, "u", "missing"))));
        assert!(matches!(slot.current().unwrap().json(), SubView::Failed(_)));
    }

    #[test]
    fn test_failed_tab_retries_on_next_show() {
        let mut slot = OverlaySlot::default();
        let session = slot.open(workflow(), "CRM").session();
        slot.current_mut().unwrap().show(DetailTab::Diagram);
        slot.apply_diagram(session, Err(DeckError::http(500, "u", "boom")));

        let overlay = slot.current_mut().unwrap();
        assert_eq!(overlay.toggle(DetailTab::Diagram), None);
        assert_eq!(overlay.tab(), DetailTab::Overview);
        assert!(overlay.toggle(DetailTab::Diagram).is_some());
    }
}
