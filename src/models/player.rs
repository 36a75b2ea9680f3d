//! Player model.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::PlayerId;
use crate::error::ValidationError;

/// A league member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Player {
    /// "First Last" display form.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Case-insensitive substring match over names and email.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.first_name.to_lowercase().contains(&needle)
            || self.last_name.to_lowercase().contains(&needle)
            || self
                .email
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains(&needle))
    }
}

/// Player payload as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerInput {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A validated, trimmed player ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlayer {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl PlayerInput {
    pub fn validate(&self) -> Result<NewPlayer, ValidationError> {
        let first_name = trimmed(&self.first_name);
        let last_name = trimmed(&self.last_name);
        let (Some(first_name), Some(last_name)) = (first_name, last_name) else {
            return Err(ValidationError::MissingName);
        };

        let email = trimmed(&self.email);
        if let Some(ref email) = email {
            if !email_regex().is_match(email) {
                return Err(ValidationError::InvalidEmail);
            }
        }

        Ok(NewPlayer {
            first_name,
            last_name,
            email,
            phone: trimmed(&self.phone),
        })
    }
}
