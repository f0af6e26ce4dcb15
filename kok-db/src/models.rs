//! Row types that only exist on the storage side.
//!
//! Stations and measurement records are shared domain types and live in
//! [`kok_data`].

use serde::Serialize;

/// A login account.
///
/// Passwords are stored as entered.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl User {
    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password == candidate
    }
}
