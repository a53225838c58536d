//! UI rendering using ratatui
//!
//! Cards and the detail overview are drawn from the typed view components in
//! `flowdeck_core::view`. Other server text (sub-view bodies, status and
//! category labels) goes through `sanitize_text`/`sanitize_inline` here.

use std::time::Instant;

use flowdeck_core::{
    sanitize_inline, sanitize_text, CardView, DetailOverlay, DetailSummary, DetailTab, SubView,
    ViewState,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

use super::app::{App, Mode};
use super::event::HELP_TEXT;
use super::theme::{palette, Palette};

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &App, now: Instant) {
    let p = palette(app.theme);
    let area = frame.area();
    frame.render_widget(Block::default().style(Style::default().bg(p.background)), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header + stats
            Constraint::Length(3), // Search + filters
            Constraint::Min(6),    // Cards
            Constraint::Length(1), // Result count
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_header(frame, app, p, chunks[0]);
    render_filter_bar(frame, app, p, chunks[1]);
    render_content(frame, app, p, chunks[2]);
    render_footer(frame, app, p, chunks[3]);
    render_status_bar(frame, app, p, chunks[4]);

    if let Some(overlay) = app.overlay.current() {
        render_detail(frame, app, overlay, p, now);
    }

    if app.mode == Mode::Help {
        render_help_overlay(frame, p);
    }
}

fn render_header(frame: &mut Frame, app: &App, p: &Palette, area: Rect) {
    let stat = |label: &str, value: String| {
        vec![
            Span::styled(value, Style::default().fg(p.accent).add_modifier(Modifier::BOLD)),
            Span::styled(format!(" {}   ", label), Style::default().fg(p.dim)),
        ]
    };

    let spans: Vec<Span> = match app.controller.stats() {
        Some(stats) => [
            stat("workflows", stats.total.to_string()),
            stat("active", stats.active.to_string()),
            stat("nodes", stats.total_nodes.to_string()),
            stat("integrations", stats.unique_integrations.to_string()),
        ]
        .into_iter()
        .flatten()
        .collect(),
        None => vec![Span::styled("loading stats…", Style::default().fg(p.dim))],
    };

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .title(" Workflow Catalogue ")
            .title_style(Style::default().fg(p.accent).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(p.secondary)),
    );
    frame.render_widget(header, area);
}

fn render_filter_bar(frame: &mut Frame, app: &App, p: &Palette, area: Rect) {
    let filters = app.controller.filters();
    let searching = app.mode == Mode::Search;

    let query = if searching {
        let split = app
            .search_input
            .char_indices()
            .nth(app.search_cursor)
            .map(|(i, _)| i)
            .unwrap_or(app.search_input.len());
        let (before, after) = app.search_input.split_at(split);
        format!("{}|{}", before, after)
    } else if app.search_input.is_empty() {
        "press / to search".to_string()
    } else {
        app.search_input.clone()
    };

    let chip = |key: &str, label: String, on: bool| {
        let style = if on {
            Style::default().fg(p.highlight).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(p.dim)
        };
        vec![
            Span::styled(format!("[{}] ", key), Style::default().fg(p.secondary)),
            Span::styled(format!("{}  ", label), style),
        ]
    };

    let mut spans = vec![
        Span::styled(
            format!("{}  ", query),
            if searching {
                Style::default().fg(p.text)
            } else {
                Style::default().fg(p.dim)
            },
        ),
        Span::styled("│ ", Style::default().fg(p.secondary)),
    ];
    spans.extend(chip(
        "t",
        filters.trigger.label(),
        filters.trigger != Default::default(),
    ));
    spans.extend(chip(
        "c",
        filters.complexity.label(),
        filters.complexity != Default::default(),
    ));
    spans.extend(chip(
        "o",
        sanitize_inline(&filters.category.label()),
        filters.category.selected().is_some(),
    ));
    spans.extend(chip(
        "a",
        if filters.active_only { "Active only" } else { "Any status" }.to_string(),
        filters.active_only,
    ));

    let border = if searching { p.accent } else { p.secondary };
    let bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .title(if searching { " Search " } else { " Filters " })
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(bar, area);
}

fn render_content(frame: &mut Frame, app: &App, p: &Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(p.secondary));

    match app.controller.view_state() {
        ViewState::Loading => {
            let msg = Paragraph::new(Line::from(Span::styled(
                "Loading workflows…",
                Style::default().fg(p.accent),
            )))
            .block(block);
            frame.render_widget(msg, area);
        }
        ViewState::Error(message) => {
            let text = Text::from(vec![
                Line::from(Span::styled(
                    message.as_str(),
                    Style::default().fg(p.error).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled("Press r to retry", Style::default().fg(p.dim))),
            ]);
            frame.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: false }), area);
        }
        ViewState::NoResults => {
            let text = Text::from(vec![
                Line::from(Span::styled("No workflows found", Style::default().fg(p.text))),
                Line::from(Span::styled(
                    "Try different search terms or press x to clear filters",
                    Style::default().fg(p.dim),
                )),
            ]);
            frame.render_widget(Paragraph::new(text).block(block), area);
        }
        ViewState::Content => render_cards(frame, app, p, block, area),
    }
}

fn card_item<'a>(card: &'a CardView, p: &Palette, selected: bool) -> ListItem<'a> {
    let status_color = if card.active { p.success } else { p.dim };
    let title_style = if selected {
        Style::default()
            .fg(p.on_accent)
            .bg(p.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(p.text).add_modifier(Modifier::BOLD)
    };

    let mut meta = vec![
        Span::styled(format!("● {}", card.status_label()), Style::default().fg(status_color)),
        Span::styled(
            format!("  {}  {} nodes  {}", card.complexity, card.node_count, card.trigger),
            Style::default().fg(p.dim),
        ),
    ];
    if let Some(category) = &card.category {
        meta.push(Span::styled(format!("  [{}]", category), Style::default().fg(p.highlight)));
    }

    let mut tags: Vec<Span> = card
        .tags
        .iter()
        .map(|t| Span::styled(format!("{} ", t), Style::default().fg(p.accent)))
        .collect();
    if let Some(more) = card.overflow_label() {
        tags.push(Span::styled(more, Style::default().fg(p.dim)));
    }

    let description = if card.description.is_empty() {
        "No description"
    } else {
        card.description.as_str()
    };

    ListItem::new(Text::from(vec![
        Line::from(Span::styled(card.title.as_str(), title_style)),
        Line::from(meta),
        Line::from(Span::styled(description, Style::default().fg(p.text))),
        Line::from(tags),
        Line::from(Span::styled(
            format!(
                "{}  [d] {}  [Enter] {}",
                card.filename,
                card.actions[0].label(),
                card.actions[1].label()
            ),
            Style::default().fg(p.secondary),
        )),
        Line::from(""),
    ]))
}

fn render_cards(frame: &mut Frame, app: &App, p: &Palette, block: Block, area: Rect) {
    let categories = app.controller.category_map();
    let cards: Vec<CardView> = app
        .controller
        .workflows()
        .iter()
        .map(|wf| CardView::from_workflow(wf, &categories))
        .collect();

    let items: Vec<ListItem> = cards
        .iter()
        .enumerate()
        .map(|(idx, card)| card_item(card, p, idx == app.selected_index))
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.selected_index));
    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

fn render_footer(frame: &mut Frame, app: &App, p: &Palette, area: Rect) {
    let ctl = &app.controller;
    let mut spans = vec![Span::styled(
        format!(" Showing {} of {} workflows", ctl.workflows().len(), ctl.total()),
        Style::default().fg(p.dim),
    )];
    if ctl.is_loading() && !ctl.workflows().is_empty() {
        spans.push(Span::styled("  loading…", Style::default().fg(p.accent)));
    } else if ctl.can_load_more() {
        spans.push(Span::styled(
            format!("  [n] Load more (page {}/{})", ctl.page(), ctl.pages()),
            Style::default().fg(p.highlight),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, p: &Palette, area: Rect) {
    let (label, bg) = match (app.mode, app.overlay.is_open()) {
        (_, true) => (" DETAIL ", p.highlight),
        (Mode::Search, _) => (" SEARCH ", p.accent),
        (Mode::Help, _) => (" HELP ", p.success),
        (Mode::Normal, _) => (" BROWSE ", p.accent),
    };

    let help_text = match (app.mode, app.overlay.is_open()) {
        (_, true) => "j:json  v:diagram  o:overview  y:copy  d:download  Esc:close",
        (Mode::Search, _) => "Type to search  Enter:now  Ctrl+u:clear  Esc:done",
        _ => "j/k:nav  /:search  t/c/o/a:filters  Enter:details  n:more  T:theme  ?:help  q:quit",
    };

    let status = app.status_message.as_deref().unwrap_or("");

    let line = Line::from(vec![
        Span::styled(label, Style::default().bg(bg).fg(p.on_accent)),
        Span::raw(" "),
        Span::styled(help_text, Style::default().fg(p.dim)),
        Span::raw(" "),
        Span::styled(sanitize_inline(status), Style::default().fg(p.highlight)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Centered rect taking `pct_x`/`pct_y` percent of `area`
fn centered(area: Rect, pct_x: u16, pct_y: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(pct_x) / 100) as u16;
    let height = (u32::from(area.height) * u32::from(pct_y) / 100) as u16;
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

fn render_detail(frame: &mut Frame, app: &App, overlay: &DetailOverlay, p: &Palette, now: Instant) {
    let popup = centered(frame.area(), 90, 85);
    frame.render_widget(Clear, popup);

    let summary = DetailSummary::new(overlay.workflow(), overlay.category());
    let copy_label = if overlay.copy_feedback().is_visible(now) {
        Span::styled(" ✓ Copied! ", Style::default().fg(p.success).add_modifier(Modifier::BOLD))
    } else {
        Span::styled(" [y] Copy ", Style::default().fg(p.dim))
    };

    let block = Block::default()
        .title(format!(" {} ", summary.title))
        .title_style(Style::default().fg(p.accent).add_modifier(Modifier::BOLD))
        .title_bottom(Line::from(copy_label).right_aligned())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(p.accent))
        .style(Style::default().bg(p.background));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(inner);

    let tabs = [DetailTab::Overview, DetailTab::Json, DetailTab::Diagram];
    let selected = tabs.iter().position(|t| *t == overlay.tab()).unwrap_or(0);
    let tab_bar = Tabs::new(tabs.iter().map(|t| t.title()))
        .select(selected)
        .style(Style::default().fg(p.dim))
        .highlight_style(Style::default().fg(p.highlight).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM).border_style(Style::default().fg(p.secondary)));
    frame.render_widget(tab_bar, chunks[0]);

    let body = match overlay.tab() {
        DetailTab::Overview => overview_text(&summary, p),
        DetailTab::Json => sub_view_text(overlay.json(), "workflow JSON", p),
        DetailTab::Diagram => sub_view_text(overlay.diagram(), "diagram", p),
    };

    let paragraph = Paragraph::new(body)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));
    frame.render_widget(paragraph, chunks[1]);
}

fn overview_text(summary: &DetailSummary, p: &Palette) -> Text<'static> {
    let row = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:<14}", label), Style::default().fg(p.dim)),
            Span::styled(value, Style::default().fg(p.text)),
        ])
    };

    let mut lines = vec![
        row("Status", summary.status.to_string()),
        row("Trigger", summary.trigger.clone()),
        row("Complexity", summary.complexity.clone()),
        row("Nodes", summary.node_count.to_string()),
        row("Category", summary.category.clone()),
        Line::from(""),
    ];
    for line in summary.description.lines() {
        lines.push(Line::from(Span::styled(line.to_string(), Style::default().fg(p.text))));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Integrations ({})", summary.integrations.len()),
        Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
    )));
    for integration in &summary.integrations {
        lines.push(Line::from(Span::styled(
            format!("  • {}", integration),
            Style::default().fg(p.text),
        )));
    }
    Text::from(lines)
}

fn sub_view_text(view: &SubView, what: &str, p: &Palette) -> Text<'static> {
    match view {
        SubView::NotLoaded | SubView::Loading => Text::from(Line::from(Span::styled(
            format!("Loading {}…", what),
            Style::default().fg(p.accent),
        ))),
        SubView::Loaded(text) => Text::styled(sanitize_text(text), Style::default().fg(p.text)),
        SubView::Failed(reason) => Text::from(vec![
            Line::from(Span::styled(
                format!("Failed to load {}", what),
                Style::default().fg(p.error).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(sanitize_inline(reason), Style::default().fg(p.dim))),
            Line::from(""),
            Line::from(Span::styled(
                "Switch tabs and back to retry",
                Style::default().fg(p.dim),
            )),
        ]),
    }
}

fn render_help_overlay(frame: &mut Frame, p: &Palette) {
    let area = frame.area();
    let height = (HELP_TEXT.lines().count() as u16 + 2).min(area.height);
    let width = 70.min(area.width.saturating_sub(4));
    let popup_area = Rect {
        x: (area.width.saturating_sub(width)) / 2,
        y: (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Help (press any key to close) ")
        .title_style(Style::default().fg(p.success).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(p.success))
        .style(Style::default().bg(p.background));

    let paragraph = Paragraph::new(HELP_TEXT)
        .block(block)
        .style(Style::default().fg(p.text));

    frame.render_widget(paragraph, popup_area);
}
