// src/accounts.rs
use crate::auth::Credential;
use crate::error::{AppError, Result};
use crate::models::User;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRegistry {
    users: BTreeMap<String, User>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_available(&self, username: &str) -> bool {
        !self.users.contains_key(username)
    }

    pub fn get(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn register(
        &mut self,
        username: &str,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User> {
        if !self.is_available(username) {
            return Err(AppError::DuplicateUsername(username.to_string()));
        }
        let user = User {
            name: name.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            credential: Credential::derive(password),
            created_at: Utc::now(),
        };
        self.users.insert(username.to_string(), user.clone());
        Ok(user)
    }

    /// Unknown usernames and wrong passwords fail the same way.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<&User> {
        self.users
            .get(username)
            .filter(|user| user.credential.verify(password))
            .ok_or(AppError::AuthFailure)
    }
}
