use moderation_core::{UserPayload, UserProfile, UserUpdatePayload, Validated};

use super::{ListPage, ListRequest, Resource, Sort};
use crate::detail::DetailState;
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::routes::Route;

pub struct UsersResource;

impl Resource for UsersResource {
    type Record = UserProfile;

    const NAME: &'static str = "users";
    const PATH: &'static str = "users";
    const COLLECTION_KEY: &'static str = "users";
    const SORTABLE: &'static [&'static str] = &["username", "email", "is_active", "is_superuser"];
    const DEFAULT_SORT: Sort = Sort::asc("username");

    fn detail_route(record: &UserProfile) -> Route {
        Route::UserDetail(record.username.clone())
    }
}

/// CRUD calls for user accounts, all keyed by username.
#[derive(Debug, Clone, Copy)]
pub struct UsersApi<'a> {
    client: &'a ApiClient,
}

impl<'a> UsersApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, request: &ListRequest) -> Result<ListPage<UserProfile>, ApiError> {
        self.client.list::<UsersResource>(request).await
    }

    pub async fn get(&self, username: &str) -> Result<UserProfile, ApiError> {
        let url = self.client.api_endpoint(&["users", username], false)?;
        self.client.get_json(url).await
    }

    pub async fn detail(&self, username: &str) -> DetailState<UserProfile> {
        DetailState::from_result(self.get(username).await, "Failed to load user.")
    }

    pub async fn create(&self, user: &Validated<UserPayload>) -> Result<UserProfile, ApiError> {
        let url = self.client.api_endpoint(&["users"], true)?;
        let created: UserProfile = self.client.send_json(reqwest::Method::POST, url, user.get()).await?;
        tracing::info!(username = %created.username, "user created");
        Ok(created)
    }

    pub async fn update(
        &self,
        username: &str,
        changes: &Validated<UserUpdatePayload>,
    ) -> Result<UserProfile, ApiError> {
        let url = self.client.api_endpoint(&["users", username], false)?;
        self.client.send_json(reqwest::Method::PUT, url, changes.get()).await
    }

    pub async fn delete(&self, username: &str) -> Result<(), ApiError> {
        let url = self.client.api_endpoint(&["users", username], false)?;
        self.client.delete(url).await?;
        tracing::info!(username, "user deleted");
        Ok(())
    }
}
