//! Load plans and their execution against a [`WorkflowApi`]
//!
//! The controller decides *what* to load and stamps it with a token; this
//! module does the network work. Execution never touches controller state, so
//! it can run on any task and report back by message.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use crate::api::WorkflowApi;
use crate::error::Result;
use crate::filters::ListQuery;
use crate::model::{CategoryMap, ListPage, Stats, Workflow};

/// Pages fetched concurrently while walking a category
const CATEGORY_FETCH_CONCURRENCY: usize = 4;

/// Monotonically increasing stamp on every load the controller issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestToken(pub(crate) u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Why a load was started; decides replace vs append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// Startup or retry: bootstrap data plus the first page
    Initial,
    /// Filter change: replace the list
    Reset,
    /// Next page: append to the list
    More,
}

/// What to fetch for a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPlan {
    /// One listing page
    Page(ListQuery),
    /// Every page of `query`, then keep records mapped to `category`
    AllPagesInCategory { query: ListQuery, category: String },
}

/// A load the controller has committed to
#[derive(Debug, Clone)]
pub struct LoadTicket {
    pub token: RequestToken,
    pub kind: LoadKind,
    pub plan: LoadPlan,
}

/// Data fetched once at startup
#[derive(Debug, Clone, Default)]
pub struct Bootstrap {
    pub categories: Vec<String>,
    pub mappings: CategoryMap,
    pub stats: Stats,
}

/// Records produced by a plan, with pagination metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOutcome {
    pub workflows: Vec<Workflow>,
    pub total: usize,
    pub pages: usize,
    /// Page cursor to record once applied
    pub page: usize,
    /// Result came from the category walk (no further pages)
    pub exhaustive: bool,
}

#[derive(Debug, Clone)]
pub struct LoadResponse {
    pub bootstrap: Option<Bootstrap>,
    pub outcome: LoadOutcome,
}

/// Run `ticket` against `api`.
///
/// Initial loads fetch bootstrap data first and use the fresh mappings for a
/// category walk; other loads use `mappings`.
pub async fn execute<A>(api: &A, ticket: &LoadTicket, mappings: Arc<CategoryMap>) -> Result<LoadResponse>
where
    A: WorkflowApi + ?Sized,
{
    match ticket.kind {
        LoadKind::Initial => {
            let bootstrap = fetch_bootstrap(api).await?;
            let outcome = run_plan(api, &ticket.plan, &bootstrap.mappings).await?;
            Ok(LoadResponse {
                bootstrap: Some(bootstrap),
                outcome,
            })
        }
        LoadKind::Reset | LoadKind::More => {
            let outcome = run_plan(api, &ticket.plan, &mappings).await?;
            Ok(LoadResponse {
                bootstrap: None,
                outcome,
            })
        }
    }
}

/// Categories, mappings and stats; any failure fails the whole bootstrap
pub async fn fetch_bootstrap<A>(api: &A) -> Result<Bootstrap>
where
    A: WorkflowApi + ?Sized,
{
    let categories = api.categories().await?;
    let mappings = api.category_mappings().await?;
    let stats = api.stats().await?;
    info!(
        categories = categories.len(),
        mappings = mappings.len(),
        total = stats.total,
        "bootstrap loaded"
    );
    Ok(Bootstrap {
        categories,
        mappings,
        stats,
    })
}

pub async fn run_plan<A>(api: &A, plan: &LoadPlan, mappings: &CategoryMap) -> Result<LoadOutcome>
where
    A: WorkflowApi + ?Sized,
{
    match plan {
        LoadPlan::Page(query) => {
            let ListPage {
                workflows,
                total,
                pages,
            } = api.list_workflows(query).await?;
            Ok(LoadOutcome {
                workflows,
                total,
                pages,
                page: query.page,
                exhaustive: false,
            })
        }
        LoadPlan::AllPagesInCategory { query, category } => {
            let all = fetch_all_pages(api, query).await?;
            let fetched = all.len();
            let workflows: Vec<Workflow> = all
                .into_iter()
                .filter(|wf| mappings.matches(&wf.filename, category))
                .collect();
            info!(
                category = %category,
                fetched,
                matched = workflows.len(),
                "category filter applied client-side"
            );
            Ok(LoadOutcome {
                total: workflows.len(),
                pages: 1,
                page: 1,
                exhaustive: true,
                workflows,
            })
        }
    }
}

/// Walk every page of `query`, preserving server order
pub async fn fetch_all_pages<A>(api: &A, query: &ListQuery) -> Result<Vec<Workflow>>
where
    A: WorkflowApi + ?Sized,
{
    let first_query = query.with_page(1);
    let first = api.list_workflows(&first_query).await?;
    let pages = first.pages;
    let mut all = first.workflows;
    debug!(pages, per_page = query.per_page, "walking listing pages");

    if pages > 1 {
        let rest: Vec<ListPage> = stream::iter(2..=pages)
            .map(|page| {
                let page_query = query.with_page(page);
                async move { api.list_workflows(&page_query).await }
            })
            .buffered(CATEGORY_FETCH_CONCURRENCY)
            .try_collect()
            .await?;
        for page in rest {
            all.extend(page.workflows);
        }
    }

    Ok(all)
}
