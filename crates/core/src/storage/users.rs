//! User storage operations
//!
//! Backs the identity directory. The booking core only reads these rows;
//! writes come from administrative imports.

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{fmt_datetime, parse_datetime, parse_role, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::User;

pub struct UserStore<'a> {
    conn: &'a Connection,
}

impl<'a> UserStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new user
    #[instrument(skip(self, user), fields(user_id = %user.id, role = %user.role))]
    pub fn create(&self, user: &User) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (id, display_name, role, work_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.to_string(),
                user.display_name,
                user.role.as_str(),
                user.work_type,
                fmt_datetime(user.created_at),
            ],
        )?;
        Ok(())
    }

    /// Insert or refresh a user record (used by directory imports)
    #[instrument(skip(self, user), fields(user_id = %user.id, role = %user.role))]
    pub fn upsert(&self, user: &User) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (id, display_name, role, work_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                display_name = excluded.display_name,
                role = excluded.role,
                work_type = excluded.work_type",
            params![
                user.id.to_string(),
                user.display_name,
                user.role.as_str(),
                user.work_type,
                fmt_datetime(user.created_at),
            ],
        )?;
        Ok(())
    }

    /// Find user by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, display_name, role, work_type, created_at FROM users WHERE id = ?1",
        )?;

        let user = stmt
            .query_row(params![id.to_string()], Self::map_user)
            .optional()?;

        Ok(user)
    }

    /// Count all users
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: parse_uuid(&row.get::<_, String>(0)?)?,
            display_name: row.get(1)?,
            role: parse_role(&row.get::<_, String>(2)?)?,
            work_type: row.get(3)?,
            created_at: parse_datetime(&row.get::<_, String>(4)?)?,
        })
    }
}
