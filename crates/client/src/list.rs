//! Paginated, sorted collection views.
//!
//! [`ListQuery`] is the state behind one table: the active sort, the page
//! window, the rows on screen and the load status. It performs no I/O.
//! Every input change returns whether a new fetch is needed; a fetch is
//! `begin_fetch()` followed by `apply()` with the response.
//!
//! Policies:
//! - changing the sort column or direction returns to the first page;
//! - changing the page size returns to the first page;
//! - only the response to the most recent `begin_fetch()` is applied;
//! - a failed fetch empties the table and reports the server's message,
//!   or `"Failed to load <resource>."` when there is none.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::resources::{ListPage, ListRequest, Resource, Sort};
use crate::routes::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PageSize {
    Ten,
    #[default]
    Twenty,
    Fifty,
}

impl PageSize {
    pub const ALL: [PageSize; 3] = [PageSize::Ten, PageSize::Twenty, PageSize::Fifty];

    pub const fn get(self) -> u32 {
        match self {
            Self::Ten => 10,
            Self::Twenty => 20,
            Self::Fifty => 50,
        }
    }

    pub fn from_value(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|size| size.get() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStatus {
    Loading,
    Ready,
    Error(String),
}

/// Where inside a row a click landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    Row,
    /// An embedded link; it navigates to its own target.
    Link(Route),
    /// An embedded button; it handles the click itself.
    Button,
}

pub struct ListQuery<R: Resource> {
    sort: Sort,
    page: u64,
    page_size: PageSize,
    rows: Vec<R::Record>,
    total: u64,
    status: ListStatus,
    latest_seq: u64,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Default for ListQuery<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> fmt::Debug for ListQuery<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListQuery")
            .field("resource", &R::NAME)
            .field("sort", &self.sort)
            .field("page", &self.page)
            .field("page_size", &self.page_size)
            .field("rows", &self.rows.len())
            .field("total", &self.total)
            .field("status", &self.status)
            .field("latest_seq", &self.latest_seq)
            .finish()
    }
}

impl<R: Resource> ListQuery<R> {
    pub fn new() -> Self {
        Self {
            sort: R::DEFAULT_SORT,
            page: 0,
            page_size: PageSize::default(),
            rows: Vec::new(),
            total: 0,
            status: ListStatus::Loading,
            latest_seq: 0,
            _resource: PhantomData,
        }
    }

    pub fn sort(&self) -> Sort {
        self.sort
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn rows(&self) -> &[R::Record] {
        &self.rows
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn status(&self) -> &ListStatus {
        &self.status
    }

    /// Loaded successfully and nothing to show.
    pub fn is_empty(&self) -> bool {
        self.status == ListStatus::Ready && self.rows.is_empty()
    }

    /// Zero-based index of the last page that has rows.
    pub fn last_page(&self) -> u64 {
        self.total.saturating_sub(1) / u64::from(self.page_size.get())
    }

    /// Mark the table as loading and describe the fetch to issue.
    pub fn begin_fetch(&mut self) -> ListRequest {
        self.latest_seq += 1;
        self.status = ListStatus::Loading;

        let limit = self.page_size.get();
        ListRequest {
            sort: self.sort,
            limit,
            skip: self.page * u64::from(limit),
            seq: self.latest_seq,
        }
    }

    /// Reconcile a fetch result. Returns `false` if it was superseded.
    pub fn apply(&mut self, seq: u64, result: Result<ListPage<R::Record>, ApiError>) -> bool {
        if seq != self.latest_seq {
            tracing::warn!(
                resource = R::NAME,
                seq,
                latest = self.latest_seq,
                "discarding stale list response"
            );
            return false;
        }

        match result {
            Ok(page) => {
                self.rows = page.records;
                self.rows.truncate(self.page_size.get() as usize);
                self.total = page.total;
                self.status = ListStatus::Ready;
            }
            Err(err) => {
                tracing::error!(resource = R::NAME, "list fetch failed: {err}");
                self.rows.clear();
                self.total = 0;
                self.status = ListStatus::Error(err.user_message(&format!("Failed to load {}.", R::NAME)));
            }
        }
        true
    }

    /// Header click. The active column flips direction; another sortable
    /// column becomes active ascending. Unsortable columns are ignored.
    pub fn sort_by(&mut self, column: &str) -> bool {
        let Some(field) = R::sortable(column) else {
            return false;
        };

        self.sort = if field == self.sort.field {
            Sort { field, direction: self.sort.direction.toggled() }
        } else {
            Sort::asc(field)
        };
        self.page = 0;
        true
    }

    pub fn set_page(&mut self, page: u64) -> bool {
        if page == self.page || page > self.last_page() {
            return false;
        }
        self.page = page;
        true
    }

    pub fn set_page_size(&mut self, size: PageSize) -> bool {
        self.page_size = size;
        self.page = 0;
        true
    }

    /// Navigation target of a click on row `index`, if any.
    pub fn row_click(&self, index: usize, target: ClickTarget) -> Option<Route> {
        match target {
            ClickTarget::Link(route) => Some(route),
            ClickTarget::Button => None,
            ClickTarget::Row => self.rows.get(index).map(R::detail_route),
        }
    }

    /// Pagination caption, e.g. `"21-40 / 95"`.
    pub fn displayed_rows_label(&self) -> String {
        let size = u64::from(self.page_size.get());
        let (from, to) = if self.total == 0 {
            (0, 0)
        } else {
            (self.page * size + 1, self.total.min((self.page + 1) * size))
        };
        format!("{from}-{to} / {}", self.total)
    }

    /// One-based position of row `index` in the whole collection.
    pub fn row_number(&self, index: usize) -> u64 {
        self.page * u64::from(self.page_size.get()) + index as u64 + 1
    }
}

/// Drives a [`ListQuery`] against the backend.
pub struct ListController<R: Resource> {
    client: ApiClient,
    state: Arc<Mutex<ListQuery<R>>>,
}

impl<R: Resource> Clone for ListController<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<R: Resource> ListController<R> {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(ListQuery::new())),
        }
    }

    /// Fetch the current page. Returns whether the response was applied.
    pub async fn refresh(&self) -> bool {
        let request = self.state.lock().begin_fetch();
        let result = self.client.list::<R>(&request).await;
        self.state.lock().apply(request.seq, result)
    }

    pub fn sort_by(&self, column: &str) -> bool {
        self.state.lock().sort_by(column)
    }

    pub fn set_page(&self, page: u64) -> bool {
        self.state.lock().set_page(page)
    }

    pub fn set_page_size(&self, size: PageSize) -> bool {
        self.state.lock().set_page_size(size)
    }

    pub fn row_click(&self, index: usize, target: ClickTarget) -> Option<Route> {
        self.state.lock().row_click(index, target)
    }

    /// Read the current state without holding the lock past `f`.
    pub fn with_state<T>(&self, f: impl FnOnce(&ListQuery<R>) -> T) -> T {
        f(&*self.state.lock())
    }
}
