//! Typed client for the moderation backend.
//!
//! - `config`: where the backend lives (`ClientConfig`)
//! - `interceptor`: per-request hooks (bearer authorization)
//! - `http`: `ApiClient`, error mapping and the 401 refresh policy
//! - `auth_api`: login, registration, profile, logout
//! - `resources`: items and users CRUD
//! - `list`: paginated/sorted table state shared by both collections
//! - `detail`: single-record view state
//! - `routes`: page routing table

pub mod auth_api;
pub mod config;
pub mod detail;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod list;
pub mod resources;
pub mod routes;

pub use auth_api::AuthApi;
pub use config::{ClientConfig, ConfigError};
pub use detail::DetailState;
pub use error::ApiError;
pub use http::ApiClient;
pub use interceptor::{BearerAuth, RequestInterceptor, TokenSource};
pub use list::{ClickTarget, ListController, ListQuery, ListStatus, PageSize};
pub use resources::{
    ItemsApi, ItemsResource, ListPage, ListRequest, Resource, Sort, SortDirection, UsersApi,
    UsersResource,
};
pub use routes::{Route, UnknownRoute};
