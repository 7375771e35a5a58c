//! Session lifecycle: login, registration, profile, logout.

use moderation_auth::TokenPair;
use moderation_core::{
    Message, PasswordChange, RegisterPayload, UserProfile, UserUpdatePayload, Validated,
};
use reqwest::Method;

use crate::error::ApiError;
use crate::http::{ApiClient, parse_json};

#[derive(Debug, Clone, Copy)]
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for tokens, then cache the user's profile.
    ///
    /// Tokens are saved before the profile is fetched; if that fetch fails
    /// the tokens stay saved and the error is returned.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile, ApiError> {
        let username = username.trim();
        let url = self.client.auth_endpoint(&["token"])?;
        let request = self
            .client
            .http()
            .post(url)
            .form(&[("username", username), ("password", password)]);

        let tokens: TokenPair = parse_json(self.client.execute_anonymous(request).await?).await?;
        self.client.session().save_token_pair(&tokens);

        let profile = self.me().await?;
        tracing::info!(username = %profile.username, "logged in");
        Ok(profile)
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, account: &Validated<RegisterPayload>) -> Result<UserProfile, ApiError> {
        let url = self.client.auth_endpoint(&["register"])?;
        let request = self.client.http().post(url).json(account.get());
        let profile: UserProfile = parse_json(self.client.execute_anonymous(request).await?).await?;
        tracing::info!(username = %profile.username, "account registered");
        Ok(profile)
    }

    pub async fn register_and_login(
        &self,
        account: &Validated<RegisterPayload>,
    ) -> Result<UserProfile, ApiError> {
        self.register(account).await?;
        self.login(&account.username, &account.password).await
    }

    /// Fetch the signed-in user's profile and refresh the cached copy.
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        let url = self.client.auth_endpoint(&["me"])?;
        let profile: UserProfile = self.client.get_json(url).await?;
        self.client.session().save_user_profile(&profile);
        Ok(profile)
    }

    pub async fn update_me(
        &self,
        changes: &Validated<UserUpdatePayload>,
    ) -> Result<UserProfile, ApiError> {
        let url = self.client.auth_endpoint(&["me"])?;
        let profile: UserProfile = self.client.send_json(Method::PATCH, url, changes.get()).await?;
        self.client.session().save_user_profile(&profile);
        Ok(profile)
    }

    pub async fn change_password(&self, change: &Validated<PasswordChange>) -> Result<Message, ApiError> {
        let url = self.client.auth_endpoint(&["password"])?;
        self.client.send_json(Method::PUT, url, change.get()).await
    }

    pub async fn refresh(&self) -> Result<TokenPair, ApiError> {
        self.client.refresh_tokens().await
    }

    pub fn logout(&self) {
        self.client.session().clear_auth_data();
        tracing::info!("logged out");
    }
}
