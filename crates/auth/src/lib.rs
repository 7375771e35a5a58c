//! `moderation-auth`
//!
//! Client-side session state: credentials and the cached profile. No HTTP.

pub mod session;
pub mod storage;
pub mod tokens;

pub use session::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, SessionStore, USER_PROFILE_KEY};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, default_session_path};
pub use tokens::TokenPair;
