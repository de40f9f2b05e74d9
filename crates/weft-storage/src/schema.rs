//! Identifier validation and collection schema provisioning.
//!
//! Collections are created lazily on first write. Each collection owns a
//! primary record table, an FTS5 external-content shadow index over
//! `content`, three triggers that mirror insert/update/delete into the
//! shadow index within the same write statement, and secondary indexes on
//! `created_at`, `updated_at`, `is_embedded`, and `tags`. All DDL is
//! `IF NOT EXISTS`, so provisioning is safe to run on every write.

use sqlx::sqlite::SqlitePool;
use weft_core::{Error, Result};

/// Maximum identifier length for tenants and collections.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Validate a tenant or collection identifier.
///
/// Identifiers are interpolated into generated SQL and file names, so they
/// are restricted to `[A-Za-z0-9_]`, length 1 to 64. Anything else is
/// rejected before a query or path is constructed — never sanitized.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_IDENTIFIER_LEN {
        return Err(Error::invalid_identifier(name));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(Error::invalid_identifier(name));
    }
    Ok(())
}

/// Idempotently provision a collection's schema on the given tenant
/// connection.
///
/// Fails with [`Error::InvalidIdentifier`] before constructing any SQL if
/// the name fails the identifier rule.
pub async fn ensure_collection(pool: &SqlitePool, name: &str) -> Result<()> {
    validate_identifier(name)?;

    let primary = format!(
        r#"
        CREATE TABLE IF NOT EXISTS "{name}" (
            id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            metadata TEXT,
            tags TEXT,
            vector BLOB,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL,
            is_embedded INTEGER DEFAULT 0
        )
        "#
    );

    // External-content FTS5 table keyed by the primary table's rowid.
    let shadow = format!(
        r#"
        CREATE VIRTUAL TABLE IF NOT EXISTS "{name}_fts" USING fts5(
            id UNINDEXED,
            content,
            content='{name}',
            content_rowid='rowid'
        )
        "#
    );

    // External-content tables index nothing on their own; these triggers
    // mirror every primary-table write into the shadow index as part of the
    // same statement. Removal uses the FTS5 'delete' command, which is how
    // an external-content index drops entries it no longer stores.
    let trigger_insert = format!(
        r#"
        CREATE TRIGGER IF NOT EXISTS "{name}_ai" AFTER INSERT ON "{name}" BEGIN
            INSERT INTO "{name}_fts"(rowid, id, content)
            VALUES (new.rowid, new.id, new.content);
        END
        "#
    );

    let trigger_delete = format!(
        r#"
        CREATE TRIGGER IF NOT EXISTS "{name}_ad" AFTER DELETE ON "{name}" BEGIN
            INSERT INTO "{name}_fts"("{name}_fts", rowid, id, content)
            VALUES ('delete', old.rowid, old.id, old.content);
        END
        "#
    );

    let trigger_update = format!(
        r#"
        CREATE TRIGGER IF NOT EXISTS "{name}_au" AFTER UPDATE ON "{name}" BEGIN
            INSERT INTO "{name}_fts"("{name}_fts", rowid, id, content)
            VALUES ('delete', old.rowid, old.id, old.content);
            INSERT INTO "{name}_fts"(rowid, id, content)
            VALUES (new.rowid, new.id, new.content);
        END
        "#
    );

    let indexes = [
        format!(
            r#"CREATE INDEX IF NOT EXISTS "idx_{name}_created_at" ON "{name}"(created_at)"#
        ),
        format!(
            r#"CREATE INDEX IF NOT EXISTS "idx_{name}_updated_at" ON "{name}"(updated_at)"#
        ),
        format!(r#"CREATE INDEX IF NOT EXISTS "idx_{name}_embedded" ON "{name}"(is_embedded)"#),
        format!(r#"CREATE INDEX IF NOT EXISTS "idx_{name}_tags" ON "{name}"(tags)"#),
    ];

    for ddl in std::iter::once(&primary)
        .chain(std::iter::once(&shadow))
        .chain([&trigger_insert, &trigger_delete, &trigger_update])
        .chain(indexes.iter())
    {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(Error::backend)?;
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
