//! Interactive workflow browser
//!
//! - Card list with search, trigger/complexity/category/status filters
//! - Load-more pagination and a client-side category walk
//! - Detail overlay with lazily fetched JSON and diagram tabs
//! - Light/dark theme persisted between runs

pub mod app;
pub mod event;
pub mod terminal;
pub mod theme;
pub mod ui;

pub use terminal::run;
