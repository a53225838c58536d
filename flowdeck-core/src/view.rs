//! Typed view components built from workflow records.
//!
//! Every piece of server text in these structs has passed through
//! [`sanitize_text`] or [`sanitize_inline`]. Both are also used directly by
//! the CLI and TUI for text printed outside a card or summary.

use crate::model::{CategoryMap, Complexity, Workflow, UNCATEGORIZED};

/// Integration tags shown on a card before collapsing into "+N"
pub const MAX_CARD_TAGS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    Download,
    ViewDetails,
}

impl CardAction {
    pub fn label(&self) -> &'static str {
        match self {
            CardAction::Download => "Download",
            CardAction::ViewDetails => "View Details",
        }
    }
}

/// One listing card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub filename: String,
    pub active: bool,
    pub complexity: Complexity,
    pub node_count: u32,
    pub trigger: String,
    pub title: String,
    pub description: String,
    /// `None` for uncategorized workflows
    pub category: Option<String>,
    pub tags: Vec<String>,
    /// Integrations not shown as tags
    pub overflow: usize,
    pub actions: [CardAction; 2],
}

impl CardView {
    pub fn from_workflow(workflow: &Workflow, categories: &CategoryMap) -> Self {
        let category = categories.category_of(&workflow.filename);
        let tags: Vec<String> = workflow
            .integrations
            .iter()
            .take(MAX_CARD_TAGS)
            .map(|tag| sanitize_inline(tag))
            .collect();

        Self {
            filename: sanitize_inline(&workflow.filename),
            active: workflow.active,
            complexity: workflow.complexity,
            node_count: workflow.node_count,
            trigger: sanitize_inline(workflow.trigger_type.as_str()),
            title: sanitize_inline(&workflow.display_name()),
            description: sanitize_inline(&workflow.description),
            category: (category != UNCATEGORIZED).then(|| sanitize_inline(category)),
            overflow: workflow.integrations.len().saturating_sub(MAX_CARD_TAGS),
            tags,
            actions: [CardAction::Download, CardAction::ViewDetails],
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.active {
            "Active"
        } else {
            "Inactive"
        }
    }

    /// "+N" when integrations were cut, otherwise `None`
    pub fn overflow_label(&self) -> Option<String> {
        (self.overflow > 0).then(|| format!("+{}", self.overflow))
    }
}

/// Header and stat block of the detail overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailSummary {
    pub title: String,
    pub description: String,
    pub status: &'static str,
    pub trigger: String,
    pub complexity: String,
    pub node_count: u32,
    pub category: String,
    /// Every integration, not truncated
    pub integrations: Vec<String>,
}

impl DetailSummary {
    pub fn new(workflow: &Workflow, category: &str) -> Self {
        Self {
            title: sanitize_inline(&workflow.display_name()),
            description: sanitize_text(&workflow.description),
            status: if workflow.active { "Active" } else { "Inactive" },
            trigger: sanitize_inline(workflow.trigger_type.as_str()),
            complexity: workflow.complexity.as_str().to_string(),
            node_count: workflow.node_count,
            category: sanitize_inline(category),
            integrations: workflow
                .integrations
                .iter()
                .map(|i| sanitize_inline(i))
                .collect(),
        }
    }
}

/// Strip terminal escape sequences and control characters, keeping newlines
/// and tabs.
pub fn sanitize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x1b' => skip_escape(&mut chars),
            // C1 CSI
            '\u{9b}' => skip_csi(&mut chars),
            '\n' | '\t' => out.push(c),
            '\r' => {}
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// [`sanitize_text`] folded onto a single line with runs of whitespace
/// collapsed
pub fn sanitize_inline(input: &str) -> String {
    sanitize_text(input)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn skip_escape<I>(chars: &mut std::iter::Peekable<I>)
where
    I: Iterator<Item = char>,
{
    match chars.peek() {
        Some('[') => {
            chars.next();
            skip_csi(chars);
        }
        // OSC, DCS, SOS, PM, APC: run until BEL or ST
        Some(']') | Some('P') | Some('X') | Some('^') | Some('_') => {
            chars.next();
            while let Some(c) = chars.next() {
                if c == '\x07' {
                    break;
                }
                if c == '\x1b' {
                    if chars.peek() == Some(&'\\') {
                        chars.next();
                    }
                    break;
                }
            }
        }
        Some(_) => {
            chars.next();
        }
        None => {}
    }
}

fn skip_csi<I>(chars: &mut std::iter::Peekable<I>)
where
    I: Iterator<Item = char>,
{
    // parameters and intermediates, then one final byte in 0x40..=0x7e
    for c in chars.by_ref() {
        if ('\x40'..='\x7e').contains(&c) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workflow(integrations: &[&str]) -> Workflow {
        serde_json::from_value(serde_json::json!({
            "filename": "0100_lead_router.json",
            "name": "Lead Router",
            "description": "Routes\tleads\nto owners",
            "active": true,
            "trigger_type": "Webhook",
            "complexity": "high",
            "node_count": 21,
            "integrations": integrations,
        }))
        .unwrap()
    }

    #[test]
    fn test_card_truncates_tags_with_overflow() {
        let wf = workflow(&["A", "B", "C", "D", "E", "F", "G"]);
        let card = CardView::from_workflow(&wf, &CategoryMap::default());
        assert_eq!(card.tags, vec!["A", "B", "C", "D", "E"]);
        assert_eq!(card.overflow, 2);
        assert_eq!(card.overflow_label().as_deref(), Some("+2"));
        assert_eq!(card.description, "Routes leads to owners");
        assert_eq!(card.status_label(), "Active");
    }

    #[test]
    fn test_card_omits_uncategorized_badge() {
        let wf = workflow(&["Slack"]);
        let none = CardView::from_workflow(&wf, &CategoryMap::default());
        assert_eq!(none.category, None);
        assert_eq!(none.overflow_label(), None);

        let map: CategoryMap = [("0100_lead_router.json".to_string(), "Sales".to_string())]
            .into_iter()
            .collect();
        let some = CardView::from_workflow(&wf, &map);
        assert_eq!(some.category.as_deref(), Some("Sales"));
    }

    #[test]
    fn test_detail_summary_keeps_all_integrations() {
        let wf = workflow(&["A", "B", "C", "D", "E", "F"]);
        let summary = DetailSummary::new(&wf, UNCATEGORIZED);
        assert_eq!(summary.integrations.len(), 6);
        assert_eq!(summary.category, UNCATEGORIZED);
        assert_eq!(summary.trigger, "Webhook");
        assert_eq!(summary.description, "Routes\tleads\nto owners");
    }

    #[test]
    fn test_card_strips_escapes_from_unknown_trigger() {
        let mut wf = workflow(&["Slack"]);
        wf.trigger_type = serde_json::from_value(serde_json::json!(
            "\u{1b}]52;c;cm0gLXJmIH4=\u{07}Webhook"
        ))
        .unwrap();
        let card = CardView::from_workflow(&wf, &CategoryMap::default());
        assert_eq!(card.trigger, "Webhook");
        assert_eq!(DetailSummary::new(&wf, UNCATEGORIZED).trigger, "Webhook");
    }

    #[test]
    fn test_sanitize_strips_escapes() {
        assert_eq!(sanitize_text("\x1b[31mred\x1b[0m"), "red");
        assert_eq!(sanitize_text("a\x1b]52;c;aGk=\x07b"), "ab");
        assert_eq!(sanitize_text("a\x1b]0;title\x1b\\b"), "ab");
        assert_eq!(sanitize_text("bell\x07\r\nnext"), "bell\nnext");
        assert_eq!(sanitize_text("<b>ok</b> & ü"), "<b>ok</b> & ü");
        assert_eq!(sanitize_inline("  two\n\nlines  "), "two lines");
    }
}
