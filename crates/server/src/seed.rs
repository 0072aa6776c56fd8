//! Directory seeding
//!
//! Imports marketplace users from a TOML file at startup. This is an
//! administrative import; the booking core itself never writes users.
//!
//! ```toml
//! [[users]]
//! id = "6f1c8a52-5a0e-4b8e-9d7f-0b1f3f7d2c11"
//! name = "Pat"
//! role = "provider"
//! work_type = "electrician"
//! ```

use std::path::{Path, PathBuf};

use handyhub_core::{Role, Storage, User};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub work_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to read seed file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse seed TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid seed entry {id}: {reason}")]
    Invalid { id: Uuid, reason: String },
    #[error("Failed to store seeded user: {0}")]
    Storage(#[from] handyhub_core::Error),
}

impl SeedUser {
    fn into_user(self) -> Result<User, SeedError> {
        let invalid = |reason: &str| SeedError::Invalid {
            id: self.id,
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        let work_type = self.work_type.filter(|w| !w.trim().is_empty());
        let user = match (self.role, work_type) {
            (Role::Provider, Some(work_type)) => User::provider(self.name, work_type),
            (Role::Provider, None) => return Err(invalid("providers need a work_type")),
            (Role::Client, None) => User::client(self.name),
            (Role::Client, Some(_)) => return Err(invalid("clients have no work_type")),
        };
        Ok(user.with_id(self.id))
    }
}

impl SeedFile {
    pub fn from_toml(content: &str) -> Result<Self, SeedError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let content = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Validate every entry, then insert or refresh them all
    pub fn apply(self, storage: &dyn Storage) -> Result<usize, SeedError> {
        let users = self
            .users
            .into_iter()
            .map(SeedUser::into_user)
            .collect::<Result<Vec<_>, _>>()?;

        for user in &users {
            storage.upsert_user(user)?;
            debug!(user_id = %user.id, role = %user.role, "Seeded user");
        }
        Ok(users.len())
    }
}

/// Load a seed file and import it
pub fn seed_directory(storage: &dyn Storage, path: &Path) -> Result<usize, SeedError> {
    let count = SeedFile::load(path)?.apply(storage)?;
    info!(count, path = %path.display(), "Directory seeded");
    Ok(count)
}
