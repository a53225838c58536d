//! Query/pagination controller
//!
//! Owns the filter state and the in-memory result list. Every transition that
//! needs data returns a [`LoadTicket`]; the caller executes it (see
//! [`crate::loader::execute`]) and hands the result back to [`Controller::apply`].
//! Only the most recently issued token is ever applied.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::error::{Result, USER_FACING_MESSAGE};
use crate::filters::{FilterState, ListQuery, CATEGORY_PAGE_SIZE, DEFAULT_PAGE_SIZE};
use crate::loader::{LoadKind, LoadPlan, LoadResponse, LoadTicket, RequestToken};
use crate::model::{CategoryMap, Stats, Workflow};

/// Which of the four main views is visible
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Error(String),
    NoResults,
    Content,
}

/// What [`Controller::apply`] did with a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Token superseded; nothing changed
    Stale,
    /// Records applied
    Loaded,
    /// Load failed; error view shown
    Failed,
}

#[derive(Debug)]
pub struct Controller {
    filters: FilterState,
    category_page_size: usize,
    workflows: Vec<Workflow>,
    total: usize,
    pages: usize,
    /// The current set came from a category walk
    exhaustive: bool,
    /// Page-1 query behind the current list; load-more follows it
    list_query: Option<ListQuery>,
    categories: Vec<String>,
    mappings: Arc<CategoryMap>,
    stats: Option<Stats>,
    view: ViewState,
    loading: bool,
    last_token: RequestToken,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, CATEGORY_PAGE_SIZE)
    }
}

impl Controller {
    pub fn new(page_size: usize, category_page_size: usize) -> Self {
        Self {
            filters: FilterState::new(page_size),
            category_page_size,
            workflows: Vec::new(),
            total: 0,
            pages: 0,
            exhaustive: false,
            list_query: None,
            categories: Vec::new(),
            mappings: Arc::new(CategoryMap::default()),
            stats: None,
            view: ViewState::Loading,
            loading: false,
            last_token: RequestToken::default(),
        }
    }

    // --- accessors -------------------------------------------------------

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn workflows(&self) -> &[Workflow] {
        &self.workflows
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn page(&self) -> usize {
        self.filters.page
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Shared handle for loads running off the UI thread
    pub fn category_map(&self) -> Arc<CategoryMap> {
        Arc::clone(&self.mappings)
    }

    pub fn category_of(&self, workflow: &Workflow) -> &str {
        self.mappings.category_of(&workflow.filename)
    }

    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn latest_token(&self) -> RequestToken {
        self.last_token
    }

    /// More pages exist and nothing is in flight
    pub fn can_load_more(&self) -> bool {
        !self.loading && !self.exhaustive && self.filters.page < self.pages
    }

    // --- transitions -----------------------------------------------------

    /// Startup and manual retry: reload bootstrap data and the first page
    pub fn begin_initial(&mut self) -> Result<LoadTicket> {
        self.start(LoadKind::Initial)
    }

    /// Discard the list and restart pagination from page 1
    pub fn begin_search(&mut self) -> Result<LoadTicket> {
        self.start(LoadKind::Reset)
    }

    /// Change filters and restart the search
    pub fn update_filters<F>(&mut self, change: F) -> Result<LoadTicket>
    where
        F: FnOnce(&mut FilterState),
    {
        change(&mut self.filters);
        self.begin_search()
    }

    /// Edit the search text without firing; the debouncer decides when
    pub fn set_query_text(&mut self, text: impl Into<String>) {
        self.filters.query = text.into();
    }

    /// Replace every filter at once without starting a load
    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
    }

    /// Request the next page, if there is one and nothing is loading
    pub fn begin_load_more(&mut self) -> Option<LoadTicket> {
        if !self.can_load_more() {
            return None;
        }
        let next = self.filters.page + 1;
        let query = self.list_query.as_ref()?.with_page(next);
        let token = self.next_token();
        self.loading = true;
        debug!(token = token.value(), page = next, "load more");
        Some(LoadTicket {
            token,
            kind: LoadKind::More,
            plan: LoadPlan::Page(query),
        })
    }

    fn start(&mut self, kind: LoadKind) -> Result<LoadTicket> {
        self.filters.page = 1;
        self.workflows.clear();
        self.total = 0;
        self.pages = 0;
        self.exhaustive = false;
        self.list_query = None;

        let plan = match self.plan_first_page() {
            Ok(plan) => plan,
            Err(err) => {
                self.last_token = RequestToken(self.last_token.0 + 1);
                self.loading = false;
                self.view = ViewState::Error(err.to_string());
                return Err(err);
            }
        };

        if let LoadPlan::Page(query) = &plan {
            self.list_query = Some(query.clone());
        }
        let token = self.next_token();
        self.loading = true;
        self.view = ViewState::Loading;
        info!(
            token = token.value(),
            ?kind,
            filters = %self.filters.summary(),
            "load started"
        );
        Ok(LoadTicket { token, kind, plan })
    }

    fn plan_first_page(&self) -> Result<LoadPlan> {
        match self.filters.category.selected() {
            Some(category) => {
                let query = self
                    .filters
                    .query_for_page(1)?
                    .with_per_page(self.category_page_size);
                Ok(LoadPlan::AllPagesInCategory {
                    query,
                    category: category.to_string(),
                })
            }
            None => Ok(LoadPlan::Page(self.filters.query_for_page(1)?)),
        }
    }

    fn next_token(&mut self) -> RequestToken {
        self.last_token = RequestToken(self.last_token.0 + 1);
        self.last_token
    }

    /// Apply the result of the load stamped `token`
    pub fn apply(&mut self, token: RequestToken, kind: LoadKind, result: Result<LoadResponse>) -> Applied {
        if token != self.last_token {
            debug!(
                token = token.value(),
                latest = self.last_token.value(),
                "discarding stale response"
            );
            return Applied::Stale;
        }
        self.loading = false;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                error!(token = token.value(), ?kind, error = %err, "load failed");
                self.fail(USER_FACING_MESSAGE);
                return Applied::Failed;
            }
        };

        if let Some(bootstrap) = response.bootstrap {
            self.categories = bootstrap.categories;
            self.mappings = Arc::new(bootstrap.mappings);
            self.stats = Some(bootstrap.stats);
        }

        let outcome = response.outcome;
        match kind {
            LoadKind::Initial | LoadKind::Reset => self.workflows = outcome.workflows,
            LoadKind::More => self.workflows.extend(outcome.workflows),
        }
        self.total = outcome.total;
        self.pages = outcome.pages;
        self.filters.page = outcome.page;
        self.exhaustive = outcome.exhaustive;

        self.view = if self.workflows.is_empty() {
            ViewState::NoResults
        } else {
            ViewState::Content
        };
        info!(
            token = token.value(),
            shown = self.workflows.len(),
            total = self.total,
            page = self.filters.page,
            pages = self.pages,
            "load applied"
        );
        Applied::Loaded
    }

    fn fail(&mut self, message: &str) {
        self.loading = false;
        self.view = ViewState::Error(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::WorkflowApi;
    use crate::error::DeckError;
    use crate::filters::{CategoryFilter, ListQuery, TriggerFilter};
    use crate::loader::execute;
    use crate::model::{ListPage, TriggerType};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory catalogue that paginates like the real listing endpoint
    struct FakeApi {
        records: Vec<Workflow>,
        mappings: HashMap<String, String>,
        requests: Mutex<Vec<ListQuery>>,
        fail_listing: Mutex<bool>,
    }

    impl FakeApi {
        fn with_records(n: usize) -> Self {
            let records = (1..=n)
                .map(|i| Workflow {
                    filename: format!("{:04}_flow.json", i),
                    name: format!("Flow {}", i),
                    description: String::new(),
                    active: i % 2 == 0,
                    trigger_type: TriggerType::Manual,
                    complexity: Default::default(),
                    node_count: 3,
                    integrations: vec![],
                    raw_json: None,
                    diagram: None,
                })
                .collect();
            Self {
                records,
                mappings: HashMap::new(),
                requests: Mutex::new(Vec::new()),
                fail_listing: Mutex::new(false),
            }
        }

        fn map_every_third_to(mut self, category: &str) -> Self {
            for (i, wf) in self.records.iter().enumerate() {
                if i % 3 == 0 {
                    self.mappings.insert(wf.filename.clone(), category.to_string());
                }
            }
            self
        }

        fn requests(&self) -> Vec<ListQuery> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WorkflowApi for FakeApi {
        async fn categories(&self) -> Result<Vec<String>> {
            Ok(vec!["CRM".to_string(), "Marketing".to_string()])
        }

        async fn category_mappings(&self) -> Result<CategoryMap> {
            Ok(CategoryMap::new(self.mappings.clone()))
        }

        async fn stats(&self) -> Result<Stats> {
            Ok(Stats {
                total: self.records.len() as u64,
                ..Default::default()
            })
        }

        async fn list_workflows(&self, query: &ListQuery) -> Result<ListPage> {
            self.requests.lock().unwrap().push(query.clone());
            if *self.fail_listing.lock().unwrap() {
                return Err(DeckError::http(500, "/workflows", "boom"));
            }
            let matching: Vec<&Workflow> = self
                .records
                .iter()
                .filter(|wf| !query.active_only || wf.active)
                .collect();
            let total = matching.len();
            let pages = total.div_ceil(query.per_page).max(1);
            let start = (query.page - 1) * query.per_page;
            let workflows = matching
                .into_iter()
                .skip(start)
                .take(query.per_page)
                .cloned()
                .collect();
            Ok(ListPage {
                workflows,
                total,
                pages,
            })
        }

        async fn workflow_json(&self, _filename: &str) -> Result<serde_json::Value> {
            Ok(serde_json::json!({}))
        }

        async fn workflow_diagram(&self, _filename: &str) -> Result<String> {
            Ok(String::new())
        }

        async fn download(&self, _filename: &str) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    async fn run(ctl: &mut Controller, api: &FakeApi, ticket: LoadTicket) -> Applied {
        let result = execute(api, &ticket, ctl.category_map()).await;
        ctl.apply(ticket.token, ticket.kind, result)
    }

    #[tokio::test]
    async fn test_load_more_appends_until_last_page() {
        let api = FakeApi::with_records(45);
        let mut ctl = Controller::default();

        let ticket = ctl.begin_initial().unwrap();
        assert_eq!(run(&mut ctl, &api, ticket).await, Applied::Loaded);
        assert_eq!(ctl.workflows().len(), 20);
        assert_eq!((ctl.total(), ctl.pages()), (45, 3));
        assert!(ctl.can_load_more());

        let ticket = ctl.begin_load_more().unwrap();
        run(&mut ctl, &api, ticket).await;
        assert_eq!(ctl.workflows().len(), 40);
        assert!(ctl.can_load_more());

        let ticket = ctl.begin_load_more().unwrap();
        run(&mut ctl, &api, ticket).await;
        assert_eq!(ctl.workflows().len(), 45);
        assert_eq!(ctl.page(), 3);
        assert!(!ctl.can_load_more());
        assert!(ctl.begin_load_more().is_none());
        assert_eq!(ctl.workflows()[20].filename, "0021_flow.json");
    }

    #[tokio::test]
    async fn test_filter_change_resets_to_page_one() {
        let api = FakeApi::with_records(45);
        let mut ctl = Controller::default();
        let ticket = ctl.begin_initial().unwrap();
        run(&mut ctl, &api, ticket).await;
        let ticket = ctl.begin_load_more().unwrap();
        run(&mut ctl, &api, ticket).await;
        assert_eq!(ctl.page(), 2);

        let ticket = ctl.update_filters(|f| f.active_only = true).unwrap();
        assert!(ctl.workflows().is_empty());
        assert_eq!(ctl.page(), 1);
        assert_eq!(ctl.view_state(), &ViewState::Loading);
        match &ticket.plan {
            LoadPlan::Page(q) => {
                assert_eq!(q.page, 1);
                assert!(q.active_only);
            }
            other => panic!("unexpected plan {:?}", other),
        }

        run(&mut ctl, &api, ticket).await;
        assert_eq!(ctl.total(), 22);
        assert!(ctl.workflows().iter().all(|wf| wf.active));
    }

    #[tokio::test]
    async fn test_category_filter_walks_all_pages() {
        let api = FakeApi::with_records(200).map_every_third_to("CRM");
        let mut ctl = Controller::default();
        let ticket = ctl.begin_initial().unwrap();
        run(&mut ctl, &api, ticket).await;

        let ticket = ctl
            .update_filters(|f| f.category = CategoryFilter::Only("CRM".to_string()))
            .unwrap();
        run(&mut ctl, &api, ticket).await;

        let walked: Vec<(usize, usize)> = api
            .requests()
            .iter()
            .skip(1)
            .map(|q| (q.page, q.per_page))
            .collect();
        assert_eq!(walked, vec![(1, 100), (2, 100)]);

        let expected = (0..200).filter(|i| i % 3 == 0).count();
        assert_eq!(ctl.workflows().len(), expected);
        assert_eq!(ctl.total(), expected);
        assert!(ctl
            .workflows()
            .iter()
            .all(|wf| ctl.category_of(wf) == "CRM"));
        assert!(!ctl.can_load_more());
    }

    #[tokio::test]
    async fn test_uncategorized_category_filter_matches_unmapped() {
        let api = FakeApi::with_records(9).map_every_third_to("CRM");
        let mut ctl = Controller::default();
        let ticket = ctl.begin_initial().unwrap();
        run(&mut ctl, &api, ticket).await;

        let ticket = ctl
            .update_filters(|f| f.category = CategoryFilter::Only("Uncategorized".to_string()))
            .unwrap();
        run(&mut ctl, &api, ticket).await;
        assert_eq!(ctl.workflows().len(), 6);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let api = FakeApi::with_records(45);
        let mut ctl = Controller::default();

        let slow = ctl.begin_initial().unwrap();
        let fast = ctl
            .update_filters(|f| f.trigger = TriggerFilter::Only(TriggerType::Webhook))
            .unwrap();

        let fast_result = execute(&api, &fast, ctl.category_map()).await;
        assert_eq!(ctl.apply(fast.token, fast.kind, fast_result), Applied::Loaded);
        let shown = ctl.workflows().len();

        let slow_result = execute(&api, &slow, ctl.category_map()).await;
        assert_eq!(ctl.apply(slow.token, slow.kind, slow_result), Applied::Stale);
        assert_eq!(ctl.workflows().len(), shown);
        assert!(ctl.stats().is_none());
    }

    #[tokio::test]
    async fn test_failed_load_more_keeps_list_and_cursor() {
        let api = FakeApi::with_records(45);
        let mut ctl = Controller::default();
        let ticket = ctl.begin_initial().unwrap();
        run(&mut ctl, &api, ticket).await;

        *api.fail_listing.lock().unwrap() = true;
        let ticket = ctl.begin_load_more().unwrap();
        assert_eq!(run(&mut ctl, &api, ticket).await, Applied::Failed);
        assert_eq!(ctl.workflows().len(), 20);
        assert_eq!(ctl.page(), 1);
        assert_eq!(
            ctl.view_state(),
            &ViewState::Error(USER_FACING_MESSAGE.to_string())
        );

        *api.fail_listing.lock().unwrap() = false;
        let ticket = ctl.begin_load_more().unwrap();
        match &ticket.plan {
            LoadPlan::Page(q) => assert_eq!(q.page, 2),
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_more_ignores_unsearched_query_text() {
        let api = FakeApi::with_records(45);
        let mut ctl = Controller::default();
        let ticket = ctl.begin_initial().unwrap();
        run(&mut ctl, &api, ticket).await;

        // typed, debounce not fired yet
        ctl.set_query_text("zzz");
        let ticket = ctl.begin_load_more().unwrap();
        match &ticket.plan {
            LoadPlan::Page(q) => assert_eq!((q.q.as_str(), q.page), ("", 2)),
            other => panic!("unexpected plan {:?}", other),
        }
        run(&mut ctl, &api, ticket).await;
        assert_eq!(ctl.workflows().len(), 40);
        assert_eq!(api.requests()[1], api.requests()[0].with_page(2));

        let ticket = ctl.begin_search().unwrap();
        match &ticket.plan {
            LoadPlan::Page(q) => assert_eq!((q.q.as_str(), q.page), ("zzz", 1)),
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_result_shows_no_results() {
        let api = FakeApi::with_records(0);
        let mut ctl = Controller::default();
        let ticket = ctl.begin_initial().unwrap();
        run(&mut ctl, &api, ticket).await;
        assert_eq!(ctl.view_state(), &ViewState::NoResults);
        assert!(!ctl.can_load_more());
    }

    #[test]
    fn test_load_more_refused_while_loading() {
        let mut ctl = Controller::default();
        let _ticket = ctl.begin_initial().unwrap();
        assert!(ctl.is_loading());
        assert!(ctl.begin_load_more().is_none());
    }

    #[test]
    fn test_set_filters_does_not_start_a_load() {
        let mut ctl = Controller::default();
        let mut filters = FilterState::new(50);
        filters.query = "slack".to_string();
        ctl.set_filters(filters);
        assert!(!ctl.is_loading());

        let ticket = ctl.begin_search().unwrap();
        match ticket.plan {
            LoadPlan::Page(q) => assert_eq!((q.q.as_str(), q.per_page), ("slack", 50)),
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_invalid_filter_surfaces_error_view() {
        let mut ctl = Controller::new(500, 100);
        assert!(ctl.begin_search().is_err());
        assert!(matches!(ctl.view_state(), ViewState::Error(_)));
        assert!(!ctl.is_loading());
    }
}
