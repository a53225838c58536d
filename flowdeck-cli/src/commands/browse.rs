//! `list`, `stats` and `categories`

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use flowdeck_core::filters::{CategoryFilter, ComplexityFilter, FilterState, TriggerFilter};
use flowdeck_core::loader::{execute, LoadTicket};
use flowdeck_core::{
    sanitize_inline, CardView, Complexity, Controller, DeckConfig, HttpApi, Stats, TriggerType,
    WorkflowApi,
};
use serde_json::json;
use tracing::info;

use super::{connect, OutputFormat};
use crate::ui;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplexityArg {
    Low,
    Medium,
    High,
}

impl From<ComplexityArg> for Complexity {
    fn from(value: ComplexityArg) -> Self {
        match value {
            ComplexityArg::Low => Complexity::Low,
            ComplexityArg::Medium => Complexity::Medium,
            ComplexityArg::High => Complexity::High,
        }
    }
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Search text (matched server-side)
    pub query: Option<String>,

    /// Filter by trigger (Manual, Webhook, Scheduled, Complex)
    #[arg(long, short)]
    pub trigger: Option<String>,

    /// Filter by complexity
    #[arg(long, short, value_enum)]
    pub complexity: Option<ComplexityArg>,

    /// Filter by category (walks every page and filters locally)
    #[arg(long)]
    pub category: Option<String>,

    /// Only show active workflows
    #[arg(long)]
    pub active_only: bool,

    /// Results per page (1-100, default from config)
    #[arg(long)]
    pub per_page: Option<usize>,

    /// Keep loading pages until the listing is exhausted
    #[arg(long)]
    pub all_pages: bool,

    /// Output format
    #[arg(long, short, value_enum, default_value = "human")]
    pub output: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    /// Output format
    #[arg(long, short, value_enum, default_value = "human")]
    pub output: OutputFormat,
}

impl ListArgs {
    fn filters(&self, default_per_page: usize) -> FilterState {
        let mut filters = FilterState::new(self.per_page.unwrap_or(default_per_page));
        filters.query = self.query.clone().unwrap_or_default();
        filters.trigger = match &self.trigger {
            Some(t) if !t.eq_ignore_ascii_case("all") => {
                TriggerFilter::Only(TriggerType::from(t.clone()))
            }
            _ => TriggerFilter::All,
        };
        filters.complexity = self
            .complexity
            .map(|c| ComplexityFilter::Only(c.into()))
            .unwrap_or_default();
        filters.category = self
            .category
            .clone()
            .map(CategoryFilter::Only)
            .unwrap_or_default();
        filters.active_only = self.active_only;
        filters
    }
}

/// Run a ticket to completion; the only load in flight, so never stale
async fn settle(controller: &mut Controller, api: &HttpApi, ticket: LoadTicket) -> Result<()> {
    let response = execute(api, &ticket, controller.category_map())
        .await
        .context("Failed to load workflows")?;
    controller.apply(ticket.token, ticket.kind, Ok(response));
    Ok(())
}

pub async fn run_list(args: ListArgs, config: &DeckConfig) -> Result<()> {
    let api = connect(config)?;
    let mut controller = Controller::new(config.browse.page_size, config.browse.category_page_size);
    controller.set_filters(args.filters(config.browse.page_size));

    // a category needs the mappings, which only the initial load fetches
    let ticket = if controller.filters().category.selected().is_some() {
        controller.begin_initial()?
    } else {
        controller.begin_search()?
    };

    ui::with_spinner_async(
        "Loading workflows",
        "Loaded",
        settle(&mut controller, &api, ticket),
    )
    .await?;

    if args.all_pages {
        while let Some(ticket) = controller.begin_load_more() {
            let page = controller.page() + 1;
            ui::with_spinner_async(
                format!("Loading page {}/{}", page, controller.pages()),
                format!("Page {}", page),
                settle(&mut controller, &api, ticket),
            )
            .await?;
        }
    }

    info!(
        shown = controller.workflows().len(),
        total = controller.total(),
        "listing complete"
    );

    match args.output {
        OutputFormat::Json => {
            let body = json!({
                "total": controller.total(),
                "shown": controller.workflows().len(),
                "page": controller.page(),
                "pages": controller.pages(),
                "filters": controller.filters().summary(),
                "workflows": controller.workflows(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Human => print_listing(&controller),
    }
    Ok(())
}

fn print_listing(controller: &Controller) {
    if controller.workflows().is_empty() {
        println!("No workflows found ({}).", controller.filters().summary());
        return;
    }

    let categories = controller.category_map();
    for workflow in controller.workflows() {
        let card = CardView::from_workflow(workflow, &categories);
        print_card(&card);
    }

    println!(
        "Showing {} of {} · page {}/{} · {}",
        controller.workflows().len(),
        controller.total(),
        controller.page(),
        controller.pages().max(1),
        controller.filters().summary()
    );
    if controller.can_load_more() {
        println!("More results available: pass --all-pages to fetch them.");
    }
}

fn print_card(card: &CardView) {
    let dot = if card.active { "●" } else { "○" };
    let category = card
        .category
        .as_deref()
        .map(|c| format!("  #{}", c))
        .unwrap_or_default();
    println!("{} {}  [{}]{}", dot, card.title, card.trigger, category);

    let mut meta = format!(
        "  {} · {} · {} nodes",
        card.filename, card.complexity, card.node_count
    );
    if !card.tags.is_empty() {
        meta.push_str(" · ");
        meta.push_str(&card.tags.join(", "));
    }
    if let Some(overflow) = card.overflow_label() {
        meta.push(' ');
        meta.push_str(&overflow);
    }
    println!("{}", meta);

    if !card.description.is_empty() {
        let mut description: String = card.description.chars().take(100).collect();
        if card.description.chars().count() > 100 {
            description.push('…');
        }
        println!("  {}", description);
    }
    println!();
}

pub async fn run_stats(args: OutputArgs, config: &DeckConfig) -> Result<()> {
    let api = connect(config)?;
    let stats = ui::with_spinner_async("Fetching stats", "Stats loaded", api.stats())
        .await
        .context("Failed to load stats")?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Human => print_stats(&stats),
    }
    Ok(())
}

fn breakdown(counts: &BTreeMap<String, u64>) -> String {
    if counts.is_empty() {
        return "-".to_string();
    }
    counts
        .iter()
        .map(|(k, v)| format!("{} {}", sanitize_inline(k), v))
        .collect::<Vec<_>>()
        .join(" · ")
}

fn print_stats(stats: &Stats) {
    let inactive = stats
        .inactive
        .unwrap_or_else(|| stats.total.saturating_sub(stats.active));
    println!("Workflows:     {}", stats.total);
    println!("Active:        {}", stats.active);
    println!("Inactive:      {}", inactive);
    println!("Total nodes:   {}", stats.total_nodes);
    println!("Integrations:  {}", stats.unique_integrations);
    println!("Triggers:      {}", breakdown(&stats.triggers));
    println!("Complexity:    {}", breakdown(&stats.complexity));
    if let Some(indexed) = &stats.last_indexed {
        println!("Last indexed:  {}", sanitize_inline(indexed));
    }
}

pub async fn run_categories(args: OutputArgs, config: &DeckConfig) -> Result<()> {
    let api = connect(config)?;
    let (categories, mappings) = ui::with_spinner_async(
        "Fetching categories",
        "Categories loaded",
        async { tokio::try_join!(api.categories(), api.category_mappings()) },
    )
    .await
    .context("Failed to load categories")?;

    let mut mapped: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, category) in mappings.iter() {
        *mapped.entry(category).or_default() += 1;
    }

    match args.output {
        OutputFormat::Json => {
            let rows: Vec<_> = categories
                .iter()
                .map(|c| json!({ "name": c, "mapped": mapped.get(c.as_str()).copied().unwrap_or(0) }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Human => {
            for category in &categories {
                let count = mapped.get(category.as_str()).copied().unwrap_or(0);
                println!("{:<32} {:>6}", sanitize_inline(category), count);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_strips_escapes_from_keys() {
        let counts: BTreeMap<String, u64> = [
            ("\u{1b}]52;c;aGk=\u{07}Email".to_string(), 3),
            ("Manual".to_string(), 7),
        ]
        .into_iter()
        .collect();
        assert_eq!(breakdown(&counts), "Email 3 · Manual 7");
        assert_eq!(breakdown(&BTreeMap::new()), "-");
    }
}
