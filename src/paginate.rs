//! Incremental pagination of the post list. A [`PaginatorState`] holds every
//! summary fetched so far plus the cursor for the next page; each
//! [`PaginatorState::load_more`] produces a new state with the next page
//! appended. [`Paginator`] wraps a state for callers that may trigger loads
//! concurrently: it allows a single load in flight and bounds each fetch with
//! a timeout.

use crate::cms;
use crate::post::{PostPage, PostSummary};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// The accumulated post list and the cursor for the next page.
///
/// `items` is append-only: pages appear in the order they were requested and
/// each page's own order is preserved. Nothing is reordered or deduplicated.
/// `next_page` is always the cursor returned by the most recent fetch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaginatorState {
    pub items: Vec<PostSummary>,
    pub next_page: Option<String>,
}

impl PaginatorState {
    /// Seeds the state from the first page.
    pub fn initialize(page: PostPage) -> PaginatorState {
        PaginatorState {
            items: page.items,
            next_page: page.next_page,
        }
    }

    /// Whether another page exists. The "load more" control is shown iff
    /// this is true.
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Fetches the page at the current cursor with `fetch_page` and returns a
    /// new state with that page appended. `self` is left untouched, so on
    /// failure the caller still holds the previous state and can retry.
    pub async fn load_more<F, Fut>(&self, fetch_page: F) -> Result<PaginatorState>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = cms::Result<PostPage>>,
    {
        let cursor = self.next_page.clone().ok_or(Error::InvalidState)?;
        debug!(cursor = cursor.as_str(), "loading next page");
        let page = fetch_page(cursor).await?;
        Ok(self.appended(page))
    }

    fn appended(&self, page: PostPage) -> PaginatorState {
        let mut items = Vec::with_capacity(self.items.len() + page.items.len());
        items.extend_from_slice(&self.items);
        items.extend(page.items);
        PaginatorState {
            items,
            next_page: page.next_page,
        }
    }
}

/// A [`PaginatorState`] with single-flight loading. A `load_more` issued
/// while another is outstanding is rejected with [`Error::AlreadyLoading`].
pub struct Paginator {
    state: Mutex<PaginatorState>,
    loading: AtomicBool,
    timeout: Duration,
}

impl Paginator {
    pub fn new(first_page: PostPage, timeout: Duration) -> Paginator {
        Paginator {
            state: Mutex::new(PaginatorState::initialize(first_page)),
            loading: AtomicBool::new(false),
            timeout,
        }
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> PaginatorState {
        self.state.lock().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Loads the next page and returns the new state. A fetch that exceeds
    /// the timeout fails with [`cms::Error::Timeout`]. On any failure the
    /// held state is unchanged.
    pub async fn load_more<F, Fut>(&self, fetch_page: F) -> Result<PaginatorState>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = cms::Result<PostPage>>,
    {
        if self.loading.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyLoading);
        }
        let _loading = scopeguard::guard(&self.loading, |loading| {
            loading.store(false, Ordering::SeqCst)
        });

        let current = self.state();
        let timeout = self.timeout;
        let next = current
            .load_more(|cursor| async move {
                match tokio::time::timeout(timeout, fetch_page(cursor)).await {
                    Ok(result) => result,
                    Err(_) => Err(cms::Error::Timeout(timeout)),
                }
            })
            .await?;
        *self.state.lock() = next.clone();
        Ok(next)
    }
}

/// The result of a pagination operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failed `load_more`.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when there is no next page to load.
    #[error("no next page to load")]
    InvalidState,

    /// Returned when another load is already in flight.
    #[error("a page is already loading")]
    AlreadyLoading,

    /// Returned when fetching the page fails or times out.
    #[error("fetching next page: {0}")]
    Fetch(#[from] cms::Error),
}
