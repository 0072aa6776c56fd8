//! Database migration system
//!
//! Tracks schema versions and applies migrations in order.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    /// Description of what this migration does
    pub description: &'static str,
    /// SQL to run for this migration
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: r#"
            -- Identity directory (populated outside the booking core)
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('client', 'provider')),
                work_type TEXT,
                created_at TEXT NOT NULL
            );

            -- Booking requests
            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                provider_id TEXT NOT NULL,
                description TEXT NOT NULL,
                price REAL,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'accepted', 'rejected')),
                created_at TEXT NOT NULL,
                decided_at TEXT,
                FOREIGN KEY (user_id) REFERENCES users(id),
                FOREIGN KEY (provider_id) REFERENCES users(id),
                CHECK (user_id <> provider_id)
            );

            -- Response tokens, kept apart from bookings so consumption is auditable
            CREATE TABLE IF NOT EXISTS response_tokens (
                id TEXT PRIMARY KEY,
                booking_id TEXT NOT NULL,
                secret_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                consumed_at TEXT,
                decision TEXT CHECK (decision IS NULL OR decision IN ('accept', 'reject')),
                FOREIGN KEY (booking_id) REFERENCES bookings(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add conversations and messages",
        sql: r#"
            -- One conversation per unordered participant pair, stored as (low, high).
            -- booking_id is advisory context and deliberately has no foreign key.
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                participant_low TEXT NOT NULL,
                participant_high TEXT NOT NULL,
                booking_id TEXT,
                created_at TEXT NOT NULL,
                last_activity_at TEXT NOT NULL,
                FOREIGN KEY (participant_low) REFERENCES users(id),
                FOREIGN KEY (participant_high) REFERENCES users(id),
                CHECK (participant_low < participant_high),
                UNIQUE (participant_low, participant_high)
            );

            -- Append-only; seq doubles as the pagination cursor
            CREATE TABLE IF NOT EXISTS messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                conversation_id TEXT NOT NULL,
                sender_id TEXT NOT NULL,
                content TEXT NOT NULL,
                sent_at TEXT NOT NULL,
                FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE,
                FOREIGN KEY (sender_id) REFERENCES users(id)
            );
        "#,
    },
    Migration {
        version: 3,
        description: "Add indexes for query performance",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_bookings_user ON bookings(user_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_bookings_provider ON bookings(provider_id, created_at);

            CREATE INDEX IF NOT EXISTS idx_tokens_booking ON response_tokens(booking_id);
            CREATE INDEX IF NOT EXISTS idx_tokens_expires ON response_tokens(expires_at);

            CREATE INDEX IF NOT EXISTS idx_conversations_low
                ON conversations(participant_low, last_activity_at);
            CREATE INDEX IF NOT EXISTS idx_conversations_high
                ON conversations(participant_high, last_activity_at);

            CREATE INDEX IF NOT EXISTS idx_messages_conversation_seq
                ON messages(conversation_id, seq);
        "#,
    },
];

/// Initialize the migrations table
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version
pub(crate) fn get_current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}

/// Record that a migration was applied
fn record_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.description,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Run all pending migrations
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn)?;

    let current_version = get_current_version(conn)?;
    info!(current_version, "Checking for pending migrations");

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                description = migration.description,
                "Applying migration"
            );

            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(migration.sql)?;
            record_migration(&tx, migration)?;
            tx.commit()?;

            info!(version = migration.version, "Migration complete");
        }
    }

    let new_version = get_current_version(conn)?;
    if new_version > current_version {
        info!(
            from = current_version,
            to = new_version,
            "Database schema updated"
        );
    }

    Ok(())
}
