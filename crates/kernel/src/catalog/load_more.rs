//! "Load more" pagination accumulator.
//!
//! Keeps the products fetched so far, the last page loaded and whether the
//! server reported another page. Each fetch is bound to a [`PageTicket`];
//! only one ticket is outstanding at a time and a completion carrying a
//! ticket that is no longer current is dropped, so two overlapping
//! "load more" clicks can never append the same page twice.

use std::future::Future;

use parking_lot::Mutex;
use tracing::debug;

use super::service::{ProductPage, SearchPage};

/// One fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageChunk<T> {
    pub items: Vec<T>,
    pub has_next_page: bool,
}

impl<T> From<SearchPage<T>> for PageChunk<T> {
    fn from(page: SearchPage<T>) -> Self {
        Self {
            items: page.results,
            has_next_page: page.has_next_page,
        }
    }
}

impl<T> From<ProductPage<T>> for PageChunk<T> {
    fn from(page: ProductPage<T>) -> Self {
        Self {
            items: page.results,
            has_next_page: page.has_next_page,
        }
    }
}

/// Permission to fetch one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    seq: u64,
    page: u32,
}

impl PageTicket {
    /// Page this ticket fetches.
    pub fn page(&self) -> u32 {
        self.page
    }
}

#[derive(Debug)]
struct State<T> {
    items: Vec<T>,
    page: u32,
    has_more: bool,
    seq: u64,
    in_flight: Option<u64>,
}

/// Append-only list of fetched pages.
#[derive(Debug)]
pub struct LoadMore<T> {
    state: Mutex<State<T>>,
}

impl<T> LoadMore<T> {
    /// Start from the first page.
    pub fn new(first: PageChunk<T>) -> Self {
        Self {
            state: Mutex::new(State {
                items: first.items,
                page: 1,
                has_more: first.has_next_page,
                seq: 0,
                in_flight: None,
            }),
        }
    }

    /// Last page loaded.
    pub fn page(&self) -> u32 {
        self.state.lock().page
    }

    pub fn has_more(&self) -> bool {
        self.state.lock().has_more
    }

    /// Whether a fetch is outstanding.
    pub fn is_loading(&self) -> bool {
        self.state.lock().in_flight.is_some()
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Run `f` over the accumulated items.
    pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.state.lock().items)
    }

    /// Reserve the next page. `None` when there is nothing more to load or
    /// a fetch is already outstanding.
    pub fn begin(&self) -> Option<PageTicket> {
        let mut state = self.state.lock();
        if !state.has_more || state.in_flight.is_some() {
            return None;
        }
        state.seq += 1;
        state.in_flight = Some(state.seq);
        Some(PageTicket {
            seq: state.seq,
            page: state.page + 1,
        })
    }

    /// Append a fetched page. Returns `false` (and changes nothing) when
    /// the ticket is stale.
    pub fn complete(&self, ticket: PageTicket, chunk: PageChunk<T>) -> bool {
        let mut state = self.state.lock();
        if state.in_flight != Some(ticket.seq) {
            debug!(page = ticket.page, "discarding stale page");
            return false;
        }
        state.in_flight = None;
        state.items.extend(chunk.items);
        state.page = ticket.page;
        state.has_more = chunk.has_next_page;
        true
    }

    /// Give up on a fetch, leaving the list untouched.
    pub fn abort(&self, ticket: PageTicket) {
        let mut state = self.state.lock();
        if state.in_flight == Some(ticket.seq) {
            state.in_flight = None;
        }
    }

    /// Replace everything with a new first page (e.g. after the filters
    /// changed). Outstanding tickets become stale.
    pub fn reset(&self, first: PageChunk<T>) {
        let mut state = self.state.lock();
        state.seq += 1;
        state.in_flight = None;
        state.items = first.items;
        state.page = 1;
        state.has_more = first.has_next_page;
    }

    /// Fetch and append the next page.
    ///
    /// Returns `Ok(false)` without calling `fetch` when nothing can be
    /// loaded, and `Ok(false)` when the result arrived stale. A failed
    /// fetch releases the ticket and leaves the list as it was.
    pub async fn load_more<F, Fut, E>(&self, fetch: F) -> Result<bool, E>
    where
        F: FnOnce(u32) -> Fut,
        Fut: Future<Output = Result<PageChunk<T>, E>>,
    {
        let Some(ticket) = self.begin() else {
            return Ok(false);
        };

        match fetch(ticket.page()).await {
            Ok(chunk) => Ok(self.complete(ticket, chunk)),
            Err(e) => {
                self.abort(ticket);
                Err(e)
            }
        }
    }
}
