//! Page routing table.

use std::fmt;
use std::str::FromStr;

use moderation_core::Slug;

/// Every page of the application, addressable by path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Items,
    ItemCreate,
    ItemDetail(Slug),
    ItemEdit(Slug),
    Users,
    UserCreate,
    UserDetail(String),
    UserEdit(String),
    Login,
    Register,
    Profile,
    Contact,
    Privacy,
    Faq,
    Terms,
    About,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no page matches path {0:?}")]
pub struct UnknownRoute(pub String);

impl Route {
    /// Pages that are only reachable with an active session.
    pub fn requires_session(&self) -> bool {
        matches!(
            self,
            Self::ItemCreate
                | Self::ItemEdit(_)
                | Self::Users
                | Self::UserCreate
                | Self::UserDetail(_)
                | Self::UserEdit(_)
                | Self::Profile
        )
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("/"),
            Self::Items => f.write_str("/items"),
            Self::ItemCreate => f.write_str("/items/create"),
            Self::ItemDetail(slug) => write!(f, "/items/{slug}"),
            Self::ItemEdit(slug) => write!(f, "/items/{slug}/edit"),
            Self::Users => f.write_str("/users"),
            Self::UserCreate => f.write_str("/users/create"),
            Self::UserDetail(username) => write!(f, "/users/{username}"),
            Self::UserEdit(username) => write!(f, "/users/{username}/edit"),
            Self::Login => f.write_str("/login"),
            Self::Register => f.write_str("/register"),
            Self::Profile => f.write_str("/profile"),
            Self::Contact => f.write_str("/contact"),
            Self::Privacy => f.write_str("/privacy"),
            Self::Faq => f.write_str("/faq"),
            Self::Terms => f.write_str("/terms"),
            Self::About => f.write_str("/about"),
        }
    }
}

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownRoute(path.to_string());
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let route = match segments.as_slice() {
            [] => Self::Home,
            ["items"] => Self::Items,
            ["items", "create"] => Self::ItemCreate,
            ["items", slug] => Self::ItemDetail(Slug::parse(*slug).map_err(|_| unknown())?),
            ["items", slug, "edit"] => Self::ItemEdit(Slug::parse(*slug).map_err(|_| unknown())?),
            ["users"] => Self::Users,
            ["users", "create"] => Self::UserCreate,
            ["users", username] => Self::UserDetail((*username).to_string()),
            ["users", username, "edit"] => Self::UserEdit((*username).to_string()),
            ["login"] => Self::Login,
            ["register"] => Self::Register,
            ["profile"] => Self::Profile,
            ["contact"] => Self::Contact,
            ["privacy"] => Self::Privacy,
            ["faq"] => Self::Faq,
            ["terms"] => Self::Terms,
            ["about"] => Self::About,
            _ => return Err(unknown()),
        };
        Ok(route)
    }
}
