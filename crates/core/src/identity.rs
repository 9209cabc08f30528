//! Identity and session identifiers.
//!
//! A deployment talks to the memory service as one fixed user. The session
//! id is derived from the process start time, so each run gets a fresh
//! session and nothing is resumed across runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The user the agent remembers things about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            first_name: None,
            last_name: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    /// "First Last", falling back to the user id.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.user_id.clone(),
        }
    }
}

/// Unique identifier for a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// `session_<unix millis>` for the given instant.
    pub fn from_start_time(started_at: DateTime<Utc>) -> Self {
        Self(format!("session_{}", started_at.timestamp_millis()))
    }

    /// A session id for a process starting now.
    pub fn for_this_run() -> Self {
        Self::from_start_time(Utc::now())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
