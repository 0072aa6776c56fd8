//! Identity directory
//!
//! Read-only view of marketplace users. The booking core resolves
//! participants through here and never creates or edits identities.

use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Identity, Role};
use crate::storage::Storage;

/// Resolves user ids to identities
pub struct Directory<'a> {
    storage: &'a dyn Storage,
}

impl<'a> Directory<'a> {
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    /// Resolve a user id, failing with `NotFound` if nobody has it
    pub fn resolve_user(&self, id: Uuid) -> Result<Identity> {
        let user = self
            .storage
            .find_user_by_id(id)?
            .ok_or_else(|| Error::not_found("user", id))?;
        debug!(user_id = %id, role = %user.role, "Resolved user");
        Ok(user.identity())
    }

    /// Resolve a user and check they hold `role`
    pub fn require_role(&self, id: Uuid, role: Role) -> Result<Identity> {
        let identity = self.resolve_user(id)?;
        if identity.role != role {
            return Err(Error::validation(format!(
                "user {} is a {}, not a {}",
                id, identity.role, role
            )));
        }
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::storage::{Database, UserRepository};

    #[test]
    fn test_resolve_known_and_unknown() {
        let db = Database::open_in_memory().unwrap();
        let provider = User::provider("Pat", "plumber");
        db.create_user(&provider).unwrap();

        let directory = Directory::new(&db);
        let identity = directory.resolve_user(provider.id).unwrap();
        assert_eq!(identity.role, Role::Provider);

        let err = directory.resolve_user(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_require_role_mismatch() {
        let db = Database::open_in_memory().unwrap();
        let client = User::client("Casey");
        db.create_user(&client).unwrap();

        let directory = Directory::new(&db);
        assert!(directory.require_role(client.id, Role::Client).is_ok());
        let err = directory.require_role(client.id, Role::Provider).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
