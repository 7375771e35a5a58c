//! Request failure model.

use thiserror::Error;

/// Failure of a request to the backend.
///
/// Call sites convert these into local UI state; nothing here is meant to be
/// shown verbatim except through [`ApiError::user_message`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({status}): {}", detail.as_deref().unwrap_or("no details"))]
    Api { status: u16, detail: Option<String> },
    #[error("not found")]
    NotFound(Option<String>),
    #[error("unauthorized")]
    Unauthorized(Option<String>),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("failed to build request: {0}")]
    Build(String),
}

impl ApiError {
    /// Message supplied by the server, if it sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Api { detail, .. } | Self::NotFound(detail) | Self::Unauthorized(detail) => {
                detail.as_deref()
            }
            _ => None,
        }
    }

    /// Text for a page-level banner: the server's message when present,
    /// otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail().unwrap_or(fallback).to_string()
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            Self::Unauthorized(_) => Some(401),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Extract the human-readable message from a backend error body.
///
/// Understands `{"detail": "..."}`, validation lists
/// `{"detail": [{"msg": "..."}]}` and `{"message": "..."}`.
pub(crate) fn parse_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail").or_else(|| value.get("message"))? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Array(entries) => {
            let messages: Vec<&str> = entries
                .iter()
                .filter_map(|e| e.get("msg").and_then(serde_json::Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}
