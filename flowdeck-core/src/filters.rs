//! Filter state and the listing query it produces

use crate::error::{DeckError, Result};
use crate::model::{Complexity, TriggerType};

pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Page size used when walking every page for a category filter
pub const CATEGORY_PAGE_SIZE: usize = 100;
pub const MAX_PAGE_SIZE: usize = 100;
pub const MAX_QUERY_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TriggerFilter {
    #[default]
    All,
    Only(TriggerType),
}

impl TriggerFilter {
    /// all → Manual → Webhook → Scheduled → Complex → all
    pub fn next(&self) -> Self {
        let known = &TriggerType::KNOWN;
        match self {
            TriggerFilter::All => TriggerFilter::Only(known[0].clone()),
            TriggerFilter::Only(current) => match known.iter().position(|t| t == current) {
                Some(idx) if idx + 1 < known.len() => TriggerFilter::Only(known[idx + 1].clone()),
                _ => TriggerFilter::All,
            },
        }
    }

    pub fn param(&self) -> String {
        match self {
            TriggerFilter::All => "all".to_string(),
            TriggerFilter::Only(t) => t.as_str().to_string(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            TriggerFilter::All => "All triggers".to_string(),
            TriggerFilter::Only(t) => t.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComplexityFilter {
    #[default]
    All,
    Only(Complexity),
}

impl ComplexityFilter {
    pub fn next(&self) -> Self {
        match self {
            ComplexityFilter::All => ComplexityFilter::Only(Complexity::Low),
            ComplexityFilter::Only(Complexity::Low) => ComplexityFilter::Only(Complexity::Medium),
            ComplexityFilter::Only(Complexity::Medium) => ComplexityFilter::Only(Complexity::High),
            ComplexityFilter::Only(Complexity::High) => ComplexityFilter::All,
        }
    }

    pub fn param(&self) -> String {
        match self {
            ComplexityFilter::All => "all".to_string(),
            ComplexityFilter::Only(c) => c.as_str().to_string(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ComplexityFilter::All => "All complexity".to_string(),
            ComplexityFilter::Only(c) => c.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// Step through `categories` in order, wrapping back to `All`
    pub fn next(&self, categories: &[String]) -> Self {
        match self {
            CategoryFilter::All => categories
                .first()
                .map(|c| CategoryFilter::Only(c.clone()))
                .unwrap_or(CategoryFilter::All),
            CategoryFilter::Only(current) => match categories.iter().position(|c| c == current) {
                Some(idx) if idx + 1 < categories.len() => {
                    CategoryFilter::Only(categories[idx + 1].clone())
                }
                _ => CategoryFilter::All,
            },
        }
    }

    pub fn selected(&self) -> Option<&str> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Only(c) => Some(c.as_str()),
        }
    }

    pub fn label(&self) -> String {
        match self {
            CategoryFilter::All => "All categories".to_string(),
            CategoryFilter::Only(c) => c.clone(),
        }
    }
}

/// Everything the user can change that shapes a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub query: String,
    pub trigger: TriggerFilter,
    pub complexity: ComplexityFilter,
    pub category: CategoryFilter,
    pub active_only: bool,
    /// 1-based page cursor of the last page applied
    pub page: usize,
    pub per_page: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl FilterState {
    pub fn new(per_page: usize) -> Self {
        Self {
            query: String::new(),
            trigger: TriggerFilter::All,
            complexity: ComplexityFilter::All,
            category: CategoryFilter::All,
            active_only: false,
            page: 1,
            per_page,
        }
    }

    /// Build the validated listing query for `page`
    pub fn query_for_page(&self, page: usize) -> Result<ListQuery> {
        let q = self.query.trim();
        if q.chars().count() > MAX_QUERY_CHARS {
            return Err(DeckError::invalid_filter(
                "q",
                format!("longer than {} characters", MAX_QUERY_CHARS),
            ));
        }
        if page == 0 {
            return Err(DeckError::invalid_filter("page", "must be at least 1"));
        }
        if self.per_page == 0 || self.per_page > MAX_PAGE_SIZE {
            return Err(DeckError::invalid_filter(
                "per_page",
                format!("must be between 1 and {}", MAX_PAGE_SIZE),
            ));
        }

        Ok(ListQuery {
            q: q.to_string(),
            trigger: self.trigger.param(),
            complexity: self.complexity.param(),
            active_only: self.active_only,
            page,
            per_page: self.per_page,
        })
    }

    /// One-line summary for status bars
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.query.trim().is_empty() {
            parts.push(format!("\"{}\"", self.query.trim()));
        }
        if self.trigger != TriggerFilter::All {
            parts.push(self.trigger.label());
        }
        if self.complexity != ComplexityFilter::All {
            parts.push(self.complexity.label());
        }
        if let Some(category) = self.category.selected() {
            parts.push(category.to_string());
        }
        if self.active_only {
            parts.push("active only".to_string());
        }
        if parts.is_empty() {
            "no filters".to_string()
        } else {
            parts.join(" · ")
        }
    }
}

/// Query parameters for `GET /workflows`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub q: String,
    pub trigger: String,
    pub complexity: String,
    pub active_only: bool,
    pub page: usize,
    pub per_page: usize,
}

impl ListQuery {
    pub fn with_page(&self, page: usize) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    pub fn with_per_page(&self, per_page: usize) -> Self {
        Self {
            per_page,
            ..self.clone()
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.q.clone()),
            ("trigger", self.trigger.clone()),
            ("complexity", self.complexity.clone()),
            ("active_only", self.active_only.to_string()),
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ]
    }
}
