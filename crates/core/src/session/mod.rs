//! Accounts, login and the acting principal.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::User;

/// Username of the administrator seeded on first start.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_ADMIN_FULL_NAME: &str = "Administrator";

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("invalid username regex"));

/// Identity captured at login and handed to every gated operation.
///
/// A principal is a snapshot, not a live reference: operations resolve the
/// username against the directory again before mutating anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    username: String,
    admin: bool,
}

impl Principal {
    pub(crate) fn for_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            admin: user.is_admin,
        }
    }

    /// Username this principal logged in as.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Whether this principal holds the administrator role.
    pub fn is_admin(&self) -> bool {
        self.admin
    }
}

/// The full account set, keyed by username.
///
/// A `BTreeMap` keeps iteration (and therefore the persisted file) in a
/// deterministic order regardless of registration order.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: BTreeMap<String, User>,
}

impl UserDirectory {
    /// Empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-loaded account set.
    pub fn from_users(users: BTreeMap<String, User>) -> Self {
        Self { users }
    }

    /// Number of accounts.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the directory holds no accounts.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Look up an account by username.
    pub fn get(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    pub(crate) fn get_mut(&mut self, username: &str) -> Option<&mut User> {
        self.users.get_mut(username)
    }

    /// Iterate accounts in username order.
    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut User> {
        self.users.values_mut()
    }

    /// Borrow the underlying map, e.g. for persisting.
    pub fn users(&self) -> &BTreeMap<String, User> {
        &self.users
    }

    /// Seed the built-in administrator account unless one already exists
    /// under that username. Returns whether an account was created.
    pub fn ensure_default_admin(&mut self) -> bool {
        if self.users.contains_key(DEFAULT_ADMIN_USERNAME) {
            return false;
        }
        self.users.insert(
            DEFAULT_ADMIN_USERNAME.to_string(),
            User::new(
                DEFAULT_ADMIN_USERNAME,
                DEFAULT_ADMIN_PASSWORD,
                DEFAULT_ADMIN_FULL_NAME,
                true,
            ),
        );
        info!(username = DEFAULT_ADMIN_USERNAME, "seeded default administrator");
        true
    }

    /// Create a farmer account. Self-registration never grants the
    /// administrator role.
    pub fn register(&mut self, username: &str, password: &str, full_name: &str) -> Result<&User> {
        validate_username(username)?;
        validate_text_field("password", password)?;
        validate_text_field("full name", full_name)?;
        match self.users.entry(username.to_string()) {
            Entry::Occupied(_) => Err(Error::DuplicateUsername(username.to_string())),
            Entry::Vacant(slot) => {
                info!(username, "account registered");
                Ok(&*slot.insert(User::new(username, password, full_name, false)))
            }
        }
    }

    /// Authenticate a username/password pair into a [`Principal`].
    pub fn login(&self, username: &str, password: &str) -> Result<Principal> {
        let user = self
            .get(username)
            .ok_or_else(|| Error::UserNotFound(username.to_string()))?;
        if !user.authenticate(password) {
            return Err(Error::InvalidCredentials);
        }
        info!(username, admin = user.is_admin, "login succeeded");
        Ok(Principal::for_user(user))
    }
}

/// Gate an operation to administrators.
pub(crate) fn require_admin(principal: &Principal) -> Result<()> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(Error::AuthorizationDenied)
    }
}

/// Gate an operation to farmer accounts.
pub(crate) fn require_farmer(principal: &Principal) -> Result<()> {
    if principal.is_admin() {
        Err(Error::AuthorizationDenied)
    } else {
        Ok(())
    }
}

/// Reject values the pipe-delimited records cannot carry back unchanged.
/// The loader trims every field, so surrounding whitespace is refused up
/// front instead of being silently stripped on the next load.
pub(crate) fn validate_text_field(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidField {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    if value.contains('|') {
        return Err(Error::InvalidField {
            field,
            reason: "must not contain '|'".to_string(),
        });
    }
    if value.contains('\n') || value.contains('\r') {
        return Err(Error::InvalidField {
            field,
            reason: "must not span lines".to_string(),
        });
    }
    if value.trim() != value {
        return Err(Error::InvalidField {
            field,
            reason: "must not start or end with whitespace".to_string(),
        });
    }
    Ok(())
}

/// Variant for fields the record format treats as optional: an empty value
/// is allowed and means "not filled in".
pub(crate) fn validate_optional_field(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        Ok(())
    } else {
        validate_text_field(field, value)
    }
}

fn validate_username(username: &str) -> Result<()> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(Error::InvalidField {
            field: "username",
            reason: "use letters, digits, '_', '.' or '-', starting with a letter or digit"
                .to_string(),
        })
    }
}
