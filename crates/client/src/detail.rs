//! Detail view state.

use crate::error::ApiError;

/// What a detail page renders for a single record.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState<T> {
    Loading,
    Found(T),
    /// The record does not exist; rendered as its own view, not as an error.
    NotFound,
    Failed(String),
}

impl<T> Default for DetailState<T> {
    fn default() -> Self {
        Self::Loading
    }
}

impl<T> DetailState<T> {
    pub fn from_result(result: Result<T, ApiError>, fallback: &str) -> Self {
        match result {
            Ok(record) => Self::Found(record),
            Err(ApiError::NotFound(_)) => Self::NotFound,
            Err(err) => {
                tracing::debug!("detail fetch failed: {err}");
                Self::Failed(err.user_message(fallback))
            }
        }
    }

    pub fn record(&self) -> Option<&T> {
        match self {
            Self::Found(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}
