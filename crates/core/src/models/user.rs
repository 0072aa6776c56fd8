//! User model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marketplace role, fixed at the directory boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Requests services
    Client,
    /// Offers services and answers booking requests
    Provider,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Provider => "provider",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "provider" => Ok(Role::Provider),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// A marketplace account as seen by the booking core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub role: Role,
    /// Trade offered, providers only (e.g. "electrician")
    pub work_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn client(display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            role: Role::Client,
            work_type: None,
            created_at: super::now(),
        }
    }

    pub fn provider(display_name: impl Into<String>, work_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            role: Role::Provider,
            work_type: Some(work_type.into()),
            created_at: super::now(),
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            role: self.role,
        }
    }
}

/// Minimal view handed out by the identity directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}
