//! User management
//!
//! Credential lookup behind the `UserManager` trait, with an in-memory
//! implementation populated from the server configuration.

use std::collections::HashMap;

use crate::config::UserConfig;
use crate::error::AuthError;

const MAX_CREDENTIAL_LENGTH: usize = 64;

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    name: String,
}

impl User {
    pub fn name(&self) -> &str {
        &self.name
    }
}

pub trait UserManager: Send + Sync {
    fn user_exists(&self, username: &str) -> bool;

    fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthError>;

    fn user_names(&self) -> Vec<String>;
}

/// Rejects empty, oversized or control-character input.
fn is_valid_input(input: &str) -> bool {
    !input.trim().is_empty()
        && input.len() <= MAX_CREDENTIAL_LENGTH
        && !input.contains(['\r', '\n', '\0'])
}

/// Checks the shape of a user name before any lookup.
pub fn validate_username(username: &str) -> Result<(), AuthError> {
    if !is_valid_input(username) {
        return Err(AuthError::MalformedInput("Invalid username format".into()));
    }
    if username.contains(['@', '#', ',', '%']) || username.starts_with(|c: char| c.is_numeric()) {
        return Err(AuthError::InvalidUsername(username.to_string()));
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct InMemoryUserManager {
    credentials: HashMap<String, String>,
}

impl InMemoryUserManager {
    pub fn from_config(users: &[UserConfig]) -> Self {
        let credentials = users
            .iter()
            .map(|u| (u.name.clone(), u.password.clone()))
            .collect();
        Self { credentials }
    }

    pub fn add_user(&mut self, name: impl Into<String>, password: impl Into<String>) {
        self.credentials.insert(name.into(), password.into());
    }
}

impl UserManager for InMemoryUserManager {
    fn user_exists(&self, username: &str) -> bool {
        self.credentials.contains_key(username)
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthError> {
        validate_username(username)?;
        if !is_valid_input(password) {
            return Err(AuthError::MalformedInput("Invalid password format".into()));
        }

        match self.credentials.get(username) {
            Some(stored) if stored == password => Ok(User {
                name: username.to_string(),
            }),
            Some(_) => Err(AuthError::InvalidPassword(username.to_string())),
            None => Err(AuthError::UserNotFound(username.to_string())),
        }
    }

    fn user_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.credentials.keys().cloned().collect();
        names.sort();
        names
    }
}
