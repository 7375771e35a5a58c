//! Client-side session: tokens plus a cached profile snapshot.
//!
//! "Logged in" means exactly "a non-empty access token is stored". Expiry and
//! server-side validity are never checked here; the HTTP layer finds out when
//! a request is rejected.

use std::sync::Arc;

use moderation_core::UserProfile;

use crate::storage::{MemoryStorage, SessionStorage};
use crate::tokens::TokenPair;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_PROFILE_KEY: &str = "user_profile";

/// Handle to the persisted session triple.
///
/// Cheap to clone; all clones share the same storage.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    /// Session that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Overwrite both tokens. No shape validation is performed.
    pub fn save_tokens(&self, access_token: &str, refresh_token: &str) {
        self.storage.set(ACCESS_TOKEN_KEY, access_token);
        self.storage.set(REFRESH_TOKEN_KEY, refresh_token);
        tracing::info!(logged_in = !access_token.is_empty(), "session tokens saved");
    }

    pub fn save_token_pair(&self, tokens: &TokenPair) {
        self.save_tokens(&tokens.access_token, &tokens.refresh_token);
    }

    /// Overwrite the cached profile. Independent of the tokens.
    pub fn save_user_profile(&self, profile: &UserProfile) {
        match serde_json::to_string(profile) {
            Ok(raw) => self.storage.set(USER_PROFILE_KEY, &raw),
            Err(err) => tracing::error!("failed to serialize user profile: {err:?}"),
        }
    }

    /// Stored access token, or `""` when there is none.
    pub fn access_token(&self) -> String {
        self.storage.get(ACCESS_TOKEN_KEY).unwrap_or_default()
    }

    /// Stored refresh token, or `""` when there is none.
    pub fn refresh_token(&self) -> String {
        self.storage.get(REFRESH_TOKEN_KEY).unwrap_or_default()
    }

    /// Cached profile; `None` when absent or unreadable.
    pub fn user_profile(&self) -> Option<UserProfile> {
        let raw = self.storage.get(USER_PROFILE_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(err) => {
                tracing::debug!("ignoring malformed cached profile: {err}");
                None
            }
        }
    }

    /// Remove all three session keys. Idempotent.
    pub fn clear_auth_data(&self) {
        self.storage.remove(ACCESS_TOKEN_KEY);
        self.storage.remove(REFRESH_TOKEN_KEY);
        self.storage.remove(USER_PROFILE_KEY);
        tracing::info!("session cleared");
    }

    pub fn is_logged_in(&self) -> bool {
        !self.access_token().is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl core::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionStore")
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStorage;
    use chrono::{TimeZone, Utc};
    use moderation_core::UserId;
    use proptest::prelude::*;

    fn profile() -> UserProfile {
        UserProfile {
            id: UserId::new(3),
            username: "carol".to_string(),
            email: Some("carol@example.com".to_string()),
            avatar_url: None,
            is_active: Some(true),
            is_superuser: false,
            created_at: Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap(),
        }
    }

    #[test]
    fn fresh_session_is_anonymous() {
        let session = SessionStore::in_memory();
        assert!(!session.is_logged_in());
        assert_eq!(session.access_token(), "");
        assert_eq!(session.refresh_token(), "");
        assert!(session.user_profile().is_none());
    }

    #[test]
    fn empty_access_token_is_not_logged_in() {
        let session = SessionStore::in_memory();
        session.save_tokens("", "refresh");
        assert!(!session.is_logged_in());
        assert_eq!(session.refresh_token(), "refresh");
    }

    #[test]
    fn profile_round_trips() {
        let session = SessionStore::in_memory();
        session.save_user_profile(&profile());
        assert_eq!(session.user_profile(), Some(profile()));
    }

    #[test]
    fn malformed_profile_reads_as_none() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(USER_PROFILE_KEY, "{\"id\": \"oops\"");
        let session = SessionStore::new(storage);
        assert!(session.user_profile().is_none());
    }

    #[test]
    fn clear_removes_everything_and_is_idempotent() {
        let session = SessionStore::in_memory();
        session.save_tokens("a", "r");
        session.save_user_profile(&profile());

        session.clear_auth_data();
        session.clear_auth_data();

        assert!(!session.is_logged_in());
        assert_eq!(session.refresh_token(), "");
        assert!(session.user_profile().is_none());
    }

    #[test]
    fn clones_share_state() {
        let session = SessionStore::in_memory();
        let other = session.clone();
        session.save_tokens("shared", "r");
        assert!(other.is_logged_in());
        other.clear_auth_data();
        assert!(!session.is_logged_in());
    }

    #[test]
    fn file_backed_session_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let session = SessionStore::new(Arc::new(FileStorage::open(&path)));
        session.save_token_pair(&TokenPair::bearer("acc", "ref"));
        session.save_user_profile(&profile());

        let restarted = SessionStore::new(Arc::new(FileStorage::open(&path)));
        assert!(restarted.is_logged_in());
        assert_eq!(restarted.access_token(), "acc");
        assert_eq!(restarted.user_profile(), Some(profile()));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: any non-empty access token reads back verbatim and
        /// counts as logged in.
        #[test]
        fn saved_tokens_read_back(access in ".+", refresh in ".*") {
            let session = SessionStore::in_memory();
            session.save_tokens(&access, &refresh);
            prop_assert!(session.is_logged_in());
            prop_assert_eq!(session.access_token(), access);
            prop_assert_eq!(session.refresh_token(), refresh);
        }

        /// Property: clearing always logs out, whatever was stored before.
        #[test]
        fn clear_always_logs_out(access in ".*", refresh in ".*", with_profile in any::<bool>()) {
            let session = SessionStore::in_memory();
            session.save_tokens(&access, &refresh);
            if with_profile {
                session.save_user_profile(&profile());
            }
            session.clear_auth_data();
            prop_assert!(!session.is_logged_in());
            prop_assert!(session.user_profile().is_none());
        }
    }
}
