pub mod api;
pub mod clipboard;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod detail;
pub mod error;
pub mod filters;
pub mod loader;
pub mod model;
pub mod prefs;
pub mod view;

pub use api::{HttpApi, WorkflowApi};
pub use clipboard::{copy_with_fallback, ClipboardBackend, CopyFeedback, Osc52, COPY_FEEDBACK};
pub use config::DeckConfig;
pub use controller::{Applied, Controller, ViewState};
pub use debounce::{Debouncer, SEARCH_DEBOUNCE};
pub use detail::{DetailFetch, DetailOverlay, DetailTab, OverlaySlot, SubView};
pub use error::{DeckError, Result, USER_FACING_MESSAGE};
pub use filters::{CategoryFilter, ComplexityFilter, FilterState, ListQuery, TriggerFilter};
pub use loader::{execute, LoadKind, LoadPlan, LoadResponse, LoadTicket, RequestToken};
pub use model::{CategoryMap, Complexity, ListPage, Stats, TriggerType, Workflow, UNCATEGORIZED};
pub use prefs::{PreferenceStore, Preferences, Theme};
pub use view::{sanitize_inline, sanitize_text, CardAction, CardView, DetailSummary};
