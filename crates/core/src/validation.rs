//! Client-side form validation.
//!
//! Drafts hold raw form input. `validate()` trims every text field, checks
//! all of them, and either returns every field error at once or a
//! [`Validated`] payload. API calls that send user input only accept
//! `Validated` values, so rejected input never reaches the network.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationErrors;
use crate::model::{ItemPayload, PasswordChange, RegisterPayload, UserPayload, UserUpdatePayload};

/// Minimum password length accepted by the backend.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Highest rating an item can carry.
pub const RATING_MAX: f64 = 5.0;

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").expect("valid regex"));
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://.+\..+").expect("valid regex"));
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]{3,50}$").expect("valid regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+$").expect("valid regex"));

/// A payload that passed client-side validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T>(T);

impl<T> Validated<T> {
    pub fn get(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> core::ops::Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

pub fn is_valid_slug(s: &str) -> bool {
    SLUG_RE.is_match(s)
}

pub fn is_valid_url(s: &str) -> bool {
    URL_RE.is_match(s)
}

pub fn is_valid_username(s: &str) -> bool {
    USERNAME_RE.is_match(s)
}

pub fn is_valid_email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

/// Trimmed value, or `None` when nothing but whitespace was entered.
fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn check_url(errors: &mut ValidationErrors, field: &'static str, label: &str, value: &Option<String>) {
    if let Some(url) = value {
        if !is_valid_url(url) {
            errors.push(field, format!("{label} must be a valid URL."));
        }
    }
}

fn check_email(errors: &mut ValidationErrors, value: &Option<String>) {
    if let Some(email) = value {
        if !is_valid_email(email) {
            errors.push("email", "Email must be valid.");
        }
    }
}

fn check_password(errors: &mut ValidationErrors, field: &'static str, password: &str) {
    if password.chars().count() < PASSWORD_MIN_LEN {
        errors.push(
            field,
            format!("Password must be at least {PASSWORD_MIN_LEN} characters long"),
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Items
// ─────────────────────────────────────────────────────────────────────────────

/// Raw input of the item create/edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub rating: String,
    pub available: bool,
    pub image_url: String,
    pub website_url: String,
}

impl Default for ItemDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            slug: String::new(),
            description: String::new(),
            rating: String::new(),
            available: true,
            image_url: String::new(),
            website_url: String::new(),
        }
    }
}

impl ItemDraft {
    pub fn validate(&self) -> Result<Validated<ItemPayload>, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self.name.trim().to_string();
        if name.is_empty() {
            errors.push("name", "Name is required.");
        }

        let slug = non_empty(&self.slug);
        if let Some(slug) = &slug {
            if !is_valid_slug(slug) {
                errors.push(
                    "slug",
                    "Slug must contain only lowercase letters, numbers, and hyphens.",
                );
            }
        }

        let rating = match non_empty(&self.rating) {
            None => None,
            Some(raw) => match raw.parse::<f64>() {
                Ok(r) if (0.0..=RATING_MAX).contains(&r) => Some(r),
                _ => {
                    errors.push("rating", "Rating must be a number between 0 and 5.");
                    None
                }
            },
        };

        let image_url = non_empty(&self.image_url);
        check_url(&mut errors, "image_url", "Image URL", &image_url);
        let website_url = non_empty(&self.website_url);
        check_url(&mut errors, "website_url", "Website URL", &website_url);

        errors.into_result()?;
        Ok(Validated(ItemPayload {
            name,
            slug,
            description: non_empty(&self.description),
            rating,
            available: self.available,
            image_url,
            website_url,
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// Raw input of the admin "create user" form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub username: String,
    pub password: String,
    pub email: String,
    pub avatar_url: String,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl Default for UserDraft {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            email: String::new(),
            avatar_url: String::new(),
            is_active: true,
            is_superuser: false,
        }
    }
}

impl UserDraft {
    pub fn validate(&self) -> Result<Validated<UserPayload>, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let username = self.username.trim().to_string();
        if !is_valid_username(&username) {
            errors.push(
                "username",
                "Username must be 3-50 characters, letters, numbers, underscores or hyphens.",
            );
        }
        check_password(&mut errors, "password", &self.password);
        let email = non_empty(&self.email);
        check_email(&mut errors, &email);
        let avatar_url = non_empty(&self.avatar_url);
        check_url(&mut errors, "avatar_url", "Avatar URL", &avatar_url);

        errors.into_result()?;
        Ok(Validated(UserPayload {
            username,
            password: self.password.clone(),
            email,
            avatar_url,
            is_active: self.is_active,
            is_superuser: self.is_superuser,
        }))
    }
}

/// Raw input of the user/profile edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserEditDraft {
    pub email: String,
    pub avatar_url: String,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl UserEditDraft {
    /// The form is prefilled with the stored values, so a blank email or
    /// avatar URL clears it. Privilege flags are only sent when the editor is
    /// a superuser.
    pub fn validate(
        &self,
        editor_is_superuser: bool,
    ) -> Result<Validated<UserUpdatePayload>, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let email = non_empty(&self.email);
        check_email(&mut errors, &email);
        let avatar_url = non_empty(&self.avatar_url);
        check_url(&mut errors, "avatar_url", "Avatar URL", &avatar_url);

        errors.into_result()?;
        Ok(Validated(UserUpdatePayload {
            email: Some(email),
            avatar_url: Some(avatar_url),
            is_active: editor_is_superuser.then_some(self.is_active),
            is_superuser: editor_is_superuser.then_some(self.is_superuser),
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Account
// ─────────────────────────────────────────────────────────────────────────────

/// Raw input of the self-registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterDraft {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl RegisterDraft {
    pub fn validate(&self) -> Result<Validated<RegisterPayload>, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let username = self.username.trim().to_string();
        if !is_valid_username(&username) {
            errors.push(
                "username",
                "Username must be 3-50 characters, letters, numbers, underscores or hyphens.",
            );
        }
        check_password(&mut errors, "password", &self.password);
        let email = non_empty(&self.email);
        check_email(&mut errors, &email);

        errors.into_result()?;
        Ok(Validated(RegisterPayload {
            username,
            password: self.password.clone(),
            email,
        }))
    }
}

/// Raw input of the password change form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordDraft {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordDraft {
    pub fn validate(&self) -> Result<Validated<PasswordChange>, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.current_password.is_empty() {
            errors.push("current_password", "Current password is required.");
        }
        check_password(&mut errors, "new_password", &self.new_password);
        if self.new_password != self.confirm_password {
            errors.push("confirm_password", "Passwords do not match.");
        }

        errors.into_result()?;
        Ok(Validated(PasswordChange {
            current_password: self.current_password.clone(),
            new_password: self.new_password.clone(),
        }))
    }
}
