//! Snapshot files on the local filesystem.
//!
//! Each save writes one JSON file named
//! `<simulation name, lowercased, spaces as underscores>_cycle_<tick>.snapshot`
//! into the configured directory. The file wraps the [`Snapshot`] in an
//! envelope carrying the simulation name and the save time.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use fungera_core::snapshot::{LoadSource, Snapshot, SnapshotRepository};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;

/// File extension of snapshot files.
pub const SNAPSHOT_EXTENSION: &str = "snapshot";

/// A snapshot file as read from disk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SnapshotEnvelope {
    /// Name of the simulation that wrote the file.
    pub simulation: String,
    /// When the file was written.
    pub saved_at: DateTime<Utc>,
    /// The saved state.
    pub snapshot: Snapshot,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    simulation: &'a str,
    saved_at: DateTime<Utc>,
    snapshot: &'a Snapshot,
}

/// Snapshot repository backed by a directory of JSON files.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    directory: PathBuf,
}

impl FileSnapshotStore {
    /// A store writing into `directory`. The directory is created on the
    /// first save.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// The directory snapshots are written to.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File name for a snapshot of `name` taken at `tick`.
    pub fn file_name(name: &str, tick: u64) -> String {
        let stem = name.to_lowercase().replace(' ', "_");
        format!("{stem}_cycle_{tick}.{SNAPSHOT_EXTENSION}")
    }

    /// Read and decode one snapshot file.
    pub fn read_envelope(path: &Path) -> Result<SnapshotEnvelope, StoreError> {
        let file = fs::File::open(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            StoreError::Serialization {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// The snapshot file in the directory with the newest modification
    /// time, or `None` if there is none.
    pub fn latest_path(&self) -> Result<Option<PathBuf>, StoreError> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.directory.clone(),
                    source,
                });
            }
        };

        let mut newest: Option<(SystemTime, PathBuf)> = None;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
                continue;
            };
            if newest.as_ref().is_none_or(|(time, _)| modified > *time) {
                newest = Some((modified, path));
            }
        }
        Ok(newest.map(|(_, path)| path))
    }
}

impl SnapshotRepository for FileSnapshotStore {
    type Error = StoreError;

    fn save(&self, name: &str, snapshot: &Snapshot) -> Result<PathBuf, Self::Error> {
        fs::create_dir_all(&self.directory).map_err(|source| StoreError::Io {
            path: self.directory.clone(),
            source,
        })?;
        let path = self
            .directory
            .join(Self::file_name(name, snapshot.tick));
        let file = fs::File::create(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let envelope = EnvelopeRef {
            simulation: name,
            saved_at: Utc::now(),
            snapshot,
        };
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &envelope).map_err(|source| {
            StoreError::Serialization {
                path: path.clone(),
                source,
            }
        })?;
        writer.flush().map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), tick = snapshot.tick, "snapshot file written");
        Ok(path)
    }

    fn load(&self, source: &LoadSource) -> Result<Option<Snapshot>, Self::Error> {
        let path = match source {
            LoadSource::Fresh => return Ok(None),
            LoadSource::Latest => match self.latest_path()? {
                Some(path) => path,
                None => return Ok(None),
            },
            LoadSource::Path(path) => path.clone(),
        };
        let envelope = Self::read_envelope(&path)?;
        debug!(
            path = %path.display(),
            simulation = %envelope.simulation,
            saved_at = %envelope.saved_at,
            tick = envelope.snapshot.tick,
            "snapshot file read"
        );
        Ok(Some(envelope.snapshot))
    }
}
