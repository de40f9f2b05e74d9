//! Per-tenant connection lifecycle and discovery.
//!
//! Each tenant maps 1:1 to a SQLite file `<tenant>.db` under the base
//! directory. Connections are opened lazily on first access and cached for
//! process lifetime; the tenant→pool map is the only shared mutable state in
//! the storage core and lives behind a `tokio::sync::Mutex` held across
//! lookup-or-create, so concurrent first accesses to the same tenant
//! converge on one connection.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::sync::Mutex;
use weft_core::{Error, Result};

use crate::schema::validate_identifier;

/// File extension for tenant storage files.
const DB_EXT: &str = "db";

/// Owns one SQLite connection pool per tenant.
#[derive(Debug)]
pub struct ConnectionRegistry {
    base_dir: PathBuf,
    pools: Mutex<HashMap<String, SqlitePool>>,
}

impl ConnectionRegistry {
    /// Open a registry rooted at the given base directory, creating the
    /// directory if needed.
    pub async fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        tokio::fs::create_dir_all(&base_dir).await?;

        Ok(Self {
            base_dir,
            pools: Mutex::new(HashMap::new()),
        })
    }

    /// The storage file path for a tenant.
    pub fn tenant_path(&self, tenant: &str) -> PathBuf {
        self.base_dir.join(format!("{tenant}.{DB_EXT}"))
    }

    /// Get the connection for a tenant, opening and caching it on first use.
    ///
    /// Creation applies baseline configuration (foreign-key enforcement) and
    /// runs with a single connection per pool so each tenant serializes its
    /// own statement execution. A failed open is not cached; the next call
    /// retries creation from scratch.
    pub async fn get(&self, tenant: &str) -> Result<SqlitePool> {
        validate_identifier(tenant)?;

        let mut pools = self.pools.lock().await;
        if let Some(pool) = pools.get(tenant) {
            return Ok(pool.clone());
        }

        let options = SqliteConnectOptions::new()
            .filename(self.tenant_path(tenant))
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(Error::backend)?;

        log::debug!("opened tenant database '{tenant}'");
        pools.insert(tenant.to_string(), pool.clone());
        Ok(pool)
    }

    /// List all known tenants: those with a live cached connection plus
    /// those discoverable from storage files on disk.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut names: BTreeSet<String> = {
            let pools = self.pools.lock().await;
            pools.keys().cloned().collect()
        };

        let mut entries = tokio::fs::read_dir(&self.base_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(name) = file_name.strip_suffix(&format!(".{DB_EXT}")) {
                names.insert(name.to_string());
            }
        }

        Ok(names.into_iter().collect())
    }

    /// Delete a tenant: close and evict its cached connection if present,
    /// then remove its storage file.
    ///
    /// Fails with [`Error::NotFound`] if the storage file does not exist.
    pub async fn delete(&self, tenant: &str) -> Result<()> {
        validate_identifier(tenant)?;

        {
            let mut pools = self.pools.lock().await;
            if let Some(pool) = pools.remove(tenant) {
                pool.close().await;
            }
        }

        let path = self.tenant_path(tenant);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::not_found(format!("tenant not found: {tenant}")));
            }
            Err(e) => return Err(e.into()),
        }

        // WAL side files may outlive the main file.
        remove_side_file(&path, "-wal").await;
        remove_side_file(&path, "-shm").await;

        log::info!("deleted tenant database '{tenant}'");
        Ok(())
    }

    /// Close every cached connection. Called once at process shutdown.
    pub async fn close_all(&self) {
        let mut pools = self.pools.lock().await;
        for (tenant, pool) in pools.drain() {
            log::debug!("closing tenant database '{tenant}'");
            pool.close().await;
        }
    }
}

async fn remove_side_file(path: &Path, suffix: &str) {
    let mut side = path.as_os_str().to_owned();
    side.push(suffix);
    let _ = tokio::fs::remove_file(PathBuf::from(side)).await;
}

// ============================================================================
// Tests
// ============================================================================
