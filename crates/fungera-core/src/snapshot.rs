//! Point-in-time simulation snapshots and the repository seam.
//!
//! A [`Snapshot`] is everything needed to resume a run: the tick and purge
//! counters, the grid (cells plus allocation bitmap) and the scheduler
//! (roster, selection cursor, lineage archive). The RNG is not part of it;
//! a restored run reseeds from `seed + tick`.
//!
//! Where snapshots live is decided by a [`SnapshotRepository`]. The core
//! only ships [`NoSnapshots`]; the file-backed store is in `fungera-store`.

use std::path::{Path, PathBuf};

use fungera_types::Vec2;
use fungera_world::Grid;
use serde::{Deserialize, Serialize};

use crate::scheduler::Scheduler;

/// Setting value that starts from an empty grid.
pub const FRESH_SETTING: &str = "new";

/// Setting value that resumes from the newest snapshot.
pub const LATEST_SETTING: &str = "last";

/// A snapshot whose contents contradict each other.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    /// The allocation bitmap is not exactly the union of the owned and
    /// staged regions of the roster.
    #[error("allocation bitmap disagrees with the roster at {cell}")]
    AllocationMismatch {
        /// First cell where they disagree.
        cell: Vec2,
    },

    /// The selection cursor points past the end of the roster.
    #[error("selection index {index} is out of range for {len} organisms")]
    SelectionOutOfRange {
        /// Stored cursor.
        index: usize,
        /// Roster length.
        len: usize,
    },
}

/// Serializable simulation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Completed ticks.
    pub tick: u64,
    /// Culling passes performed.
    pub purges: u64,
    /// Instruction memory and allocation bitmap.
    pub grid: Grid,
    /// Roster, cursor, and archive.
    pub scheduler: Scheduler,
}

impl Snapshot {
    /// Check that the allocation bitmap is exactly the roster's owned and
    /// staged regions and that the cursor is in range.
    ///
    /// Run this before replacing live state with a loaded snapshot.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let len = self.scheduler.len();
        if let Some(index) = self.scheduler.selected_index().filter(|i| *i >= len) {
            return Err(SnapshotError::SelectionOutOfRange { index, len });
        }
        let regions = self.scheduler.organisms().iter().flat_map(|organism| {
            let owned = (!organism.size.has_non_positive())
                .then_some((organism.start, organism.size));
            let staged = organism
                .has_staged_child()
                .then_some((organism.child_start, organism.child_size));
            owned.into_iter().chain(staged)
        });
        if let Some(cell) = self.grid.allocation_mismatch(regions) {
            return Err(SnapshotError::AllocationMismatch { cell });
        }
        Ok(())
    }
}

/// Which state a run starts from, or which snapshot an operator loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadSource {
    /// Start from an empty grid with a freshly seeded organism.
    Fresh,
    /// The newest snapshot by modification time.
    Latest,
    /// An explicit snapshot file.
    Path(PathBuf),
}

impl LoadSource {
    /// Interpret a `world.state` setting: `new`, `last`, or a path.
    pub fn from_setting(setting: &str) -> Self {
        match setting.trim() {
            "" | FRESH_SETTING => Self::Fresh,
            LATEST_SETTING => Self::Latest,
            other => Self::Path(PathBuf::from(other)),
        }
    }

    /// The explicit path, if this source names one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Fresh | Self::Latest => None,
        }
    }
}

/// Storage backend for snapshots.
pub trait SnapshotRepository {
    /// Backend failure type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist `snapshot` for the run called `name`. Returns where it went.
    fn save(&self, name: &str, snapshot: &Snapshot) -> Result<PathBuf, Self::Error>;

    /// Load the snapshot `source` selects. [`LoadSource::Fresh`] and an
    /// empty repository yield `Ok(None)`.
    fn load(&self, source: &LoadSource) -> Result<Option<Snapshot>, Self::Error>;
}

/// Error type of [`NoSnapshots`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("snapshots are disabled")]
pub struct SnapshotsDisabled;

/// A repository that stores nothing. Saves fail, loads find nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSnapshots;

impl SnapshotRepository for NoSnapshots {
    type Error = SnapshotsDisabled;

    fn save(&self, _name: &str, _snapshot: &Snapshot) -> Result<PathBuf, Self::Error> {
        Err(SnapshotsDisabled)
    }

    fn load(&self, _source: &LoadSource) -> Result<Option<Snapshot>, Self::Error> {
        Ok(None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fungera_organisms::spawn;
    use fungera_types::Vec2;

    use super::*;

    fn snapshot() -> Snapshot {
        let mut grid = Grid::new(10, 10).unwrap();
        let mut scheduler = Scheduler::new();
        scheduler.add_organism(spawn(&mut grid, Vec2::new(1, 1), Vec2::new(2, 3), None));
        Snapshot {
            tick: 12,
            purges: 1,
            grid,
            scheduler,
        }
    }

    #[test]
    fn setting_values_map_to_sources() {
        assert_eq!(LoadSource::from_setting("new"), LoadSource::Fresh);
        assert_eq!(LoadSource::from_setting(""), LoadSource::Fresh);
        assert_eq!(LoadSource::from_setting("last"), LoadSource::Latest);
        let source = LoadSource::from_setting("snapshots/run_cycle_40.snapshot");
        assert_eq!(
            source.path(),
            Some(Path::new("snapshots/run_cycle_40.snapshot"))
        );
    }

    #[test]
    fn consistent_snapshot_validates() {
        assert!(snapshot().validate().is_ok());
    }

    #[test]
    fn unallocated_region_is_rejected() {
        let mut snap = snapshot();
        snap.grid.deallocate(Vec2::new(1, 1), Vec2::new(2, 3));
        assert_eq!(
            snap.validate(),
            Err(SnapshotError::AllocationMismatch {
                cell: Vec2::new(1, 1)
            })
        );
    }

    #[test]
    fn partly_allocated_region_is_rejected() {
        let mut snap = snapshot();
        snap.grid.deallocate(Vec2::new(2, 3), Vec2::new(1, 1));
        assert_eq!(
            snap.validate(),
            Err(SnapshotError::AllocationMismatch {
                cell: Vec2::new(2, 3)
            })
        );
    }

    #[test]
    fn stray_allocation_is_rejected() {
        let mut snap = snapshot();
        snap.grid.allocate(Vec2::new(8, 8), Vec2::new(1, 1));
        assert_eq!(
            snap.validate(),
            Err(SnapshotError::AllocationMismatch {
                cell: Vec2::new(8, 8)
            })
        );
    }

    #[test]
    fn staged_child_must_be_allocated() {
        let mut snap = snapshot();
        let mut parent = snap.scheduler.organisms().first().unwrap().clone();
        parent.child_start = Vec2::new(5, 5);
        parent.child_size = Vec2::new(2, 2);
        let mut scheduler = Scheduler::new();
        scheduler.add_organism(parent);
        snap.scheduler = scheduler;
        assert_eq!(
            snap.validate(),
            Err(SnapshotError::AllocationMismatch {
                cell: Vec2::new(5, 5)
            })
        );

        snap.grid.allocate(Vec2::new(5, 5), Vec2::new(2, 2));
        assert!(snap.validate().is_ok());
    }

    #[test]
    fn snapshot_json_roundtrip_is_identical() {
        let snap = snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn disabled_repository_finds_nothing() {
        let repo = NoSnapshots;
        assert!(repo.load(&LoadSource::Latest).unwrap().is_none());
        assert!(repo.save("x", &snapshot()).is_err());
    }
}
