//! Resource collections exposed by the backend.
//!
//! A [`Resource`] describes one paginated collection (where it lives, how its
//! list responses are keyed, which columns sort). The list state machine in
//! [`crate::list`] is written once against this trait.

pub mod items;
pub mod users;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::routes::Route;

pub use items::{ItemsApi, ItemsResource};
pub use users::{UsersApi, UsersResource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sort {
    pub field: &'static str,
    pub direction: SortDirection,
}

impl Sort {
    pub const fn asc(field: &'static str) -> Self {
        Self { field, direction: SortDirection::Asc }
    }

    pub const fn desc(field: &'static str) -> Self {
        Self { field, direction: SortDirection::Desc }
    }
}

/// One page request against a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRequest {
    pub sort: Sort,
    pub limit: u32,
    pub skip: u64,
    /// Sequence number of the fetch; later fetches have larger numbers.
    pub seq: u64,
}

impl ListRequest {
    pub fn query_pairs(&self) -> [(&'static str, String); 4] {
        [
            ("skip", self.skip.to_string()),
            ("limit", self.limit.to_string()),
            ("sort_field", self.sort.field.to_string()),
            ("sort_direction", self.sort.direction.as_str().to_string()),
        ]
    }
}

/// One page of records plus the size of the whole collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    pub records: Vec<T>,
    pub total: u64,
}

pub trait Resource: Send + Sync + 'static {
    type Record: DeserializeOwned + Clone + Send + Sync + 'static;

    /// Plural name used in user-facing messages.
    const NAME: &'static str;
    /// Collection path segment under the API prefix.
    const PATH: &'static str;
    /// Key holding the records in a list response.
    const COLLECTION_KEY: &'static str;
    const SORTABLE: &'static [&'static str];
    const DEFAULT_SORT: Sort;

    fn detail_route(record: &Self::Record) -> Route;

    fn sortable(field: &str) -> Option<&'static str> {
        Self::SORTABLE.iter().copied().find(|f| *f == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_toggles() {
        assert_eq!(SortDirection::Asc.toggled(), SortDirection::Desc);
        assert_eq!(SortDirection::Desc.toggled().toggled(), SortDirection::Desc);
        assert_eq!(SortDirection::default(), SortDirection::Asc);
    }

    #[test]
    fn request_query_pairs() {
        let request = ListRequest { sort: Sort::desc("name"), limit: 20, skip: 40, seq: 1 };
        let pairs = request.query_pairs();
        assert_eq!(pairs[0], ("skip", "40".to_string()));
        assert_eq!(pairs[1], ("limit", "20".to_string()));
        assert_eq!(pairs[2], ("sort_field", "name".to_string()));
        assert_eq!(pairs[3], ("sort_direction", "desc".to_string()));
    }

    #[test]
    fn only_declared_columns_sort() {
        assert_eq!(ItemsResource::sortable("rating"), Some("rating"));
        assert_eq!(ItemsResource::sortable("description"), None);
        assert_eq!(UsersResource::sortable("is_superuser"), Some("is_superuser"));
    }
}
