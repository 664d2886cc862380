//! Artifact-backed table store.
//!
//! Every query asks the store for the current table. Missing or unreadable
//! artifacts load as an empty table so the dashboard keeps serving.
//!
//! With caching enabled, the decoded table is kept until the artifact's
//! modification time or length changes. Failed loads are never cached.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use crate::artifact::TableArtifact;
use crate::table::Table;

/// Identity of an artifact on disk as seen by the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

struct Cached {
    fingerprint: Fingerprint,
    table: Arc<Table>,
}

/// Loads the table artifact for each query.
pub struct TableStore {
    path: PathBuf,
    cache_enabled: bool,
    cache: RwLock<Option<Cached>>,
}

impl TableStore {
    pub fn new(path: impl Into<PathBuf>, cache_enabled: bool) -> Self {
        Self {
            path: path.into(),
            cache_enabled,
            cache: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current table, or an empty table when the artifact is unusable.
    pub fn load(&self) -> Arc<Table> {
        let fingerprint = match std::fs::metadata(&self.path) {
            Ok(meta) => Fingerprint {
                modified: meta.modified().ok(),
                len: meta.len(),
            },
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Table artifact unavailable, serving empty table"
                );
                self.clear_cache();
                return Arc::new(Table::empty());
            }
        };

        if self.cache_enabled {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = cache.as_ref() {
                if cached.fingerprint == fingerprint {
                    return cached.table.clone();
                }
            }
        }

        let table = match TableArtifact::read(&self.path) {
            Ok(artifact) => Arc::new(artifact.table),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to load table artifact, serving empty table"
                );
                self.clear_cache();
                return Arc::new(Table::empty());
            }
        };

        tracing::debug!(
            path = %self.path.display(),
            rows = table.row_count(),
            columns = table.column_count(),
            "Loaded table artifact"
        );

        if self.cache_enabled {
            let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
            *cache = Some(Cached {
                fingerprint,
                table: table.clone(),
            });
        }
        table
    }

    /// Drop any cached table.
    pub fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
