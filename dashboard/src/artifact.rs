//! The single on-disk table artifact bridging ingestion and serving.
//!
//! Format: a 4-byte magic (`TDB1`) followed by a bincode-serialized
//! [`TableArtifact`] envelope. The envelope carries a format version and the
//! table itself, including column names, per-column value types and the row
//! index.
//!
//! Writes go to a sibling `.tmp` file that is renamed over the target, so a
//! reader never observes a partially written artifact.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::table::{Table, TableError};

/// Artifact file name used when none is configured.
pub const DEFAULT_ARTIFACT: &str = "data.pkl";

/// Leading bytes of every artifact file.
pub const MAGIC: &[u8; 4] = b"TDB1";

/// Artifact contents - a versioned table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableArtifact {
    /// Version for forward compatibility
    pub version: u8,
    pub table: Table,
}

impl TableArtifact {
    /// Current artifact format version
    pub const VERSION: u8 = 1;

    pub fn new(table: Table) -> Self {
        Self {
            version: Self::VERSION,
            table,
        }
    }

    /// Write the artifact atomically, replacing any existing file at `path`.
    pub fn write(&self, path: &Path) -> Result<(), ArtifactError> {
        let tmp_path = temp_path_for(path);
        let mut bytes = MAGIC.to_vec();
        bincode::serialize_into(&mut bytes, self)?;

        if let Err(e) = std::fs::write(&tmp_path, &bytes) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        if let Err(e) = std::fs::rename(&tmp_path, path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }

    /// Read and validate an artifact.
    pub fn read(path: &Path) -> Result<Self, ArtifactError> {
        let bytes = std::fs::read(path)?;
        let payload = bytes
            .strip_prefix(MAGIC.as_slice())
            .ok_or(ArtifactError::NotAnArtifact)?;
        let artifact: Self = bincode::deserialize(payload)?;

        if artifact.version > Self::VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: artifact.version,
                max_supported: Self::VERSION,
            });
        }

        artifact.table.validate()?;
        Ok(artifact)
    }
}

/// Sibling temp path used while writing: `data.pkl` -> `data.pkl.tmp`.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DEFAULT_ARTIFACT.into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Artifact file errors
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("not a table artifact (missing magic header)")]
    NotAnArtifact,

    #[error("Unsupported artifact version: found {found}, max supported {max_supported}")]
    UnsupportedVersion { found: u8, max_supported: u8 },

    #[error("artifact does not contain a well-formed table: {0}")]
    Malformed(#[from] TableError),
}
