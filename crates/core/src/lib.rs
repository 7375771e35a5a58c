//! `moderation-core`
//!
//! Records, identifiers and form validation shared by the client crates.
//!
//! This crate is pure: no HTTP, no storage.

pub mod error;
pub mod id;
pub mod model;
pub mod validation;

pub use error::{DomainError, DomainResult, FieldError, ValidationErrors};
pub use id::{ItemId, Slug, UserId};
pub use model::{
    ItemPayload, ItemRecord, Message, PasswordChange, RegisterPayload, UserPayload, UserProfile,
    UserUpdatePayload,
};
pub use validation::{
    ItemDraft, PasswordDraft, RegisterDraft, UserDraft, UserEditDraft, Validated,
};
