//! Birth and release of organisms on the grid.
//!
//! These two functions are the only places that tie an organism's regions
//! to the allocation bitmap outside of `allocate_child`/`split_child`, which
//! keeps the bitmap equal to the union of live owned and staged regions.

use fungera_types::{Organism, OrganismId, Vec2};
use fungera_world::Grid;

/// Create an organism owning `[start, start + size)` and mark that region
/// allocated.
pub fn spawn(grid: &mut Grid, start: Vec2, size: Vec2, parent: Option<OrganismId>) -> Organism {
    grid.allocate(start, size);
    let organism = Organism::new(start, size, parent);
    tracing::trace!(organism_id = %organism.id, %start, %size, "organism spawned");
    organism
}

/// Deallocate an organism's owned region and any staged child region.
///
/// The owned size is zeroed so a second release is harmless.
pub fn release(organism: &mut Organism, grid: &mut Grid) {
    grid.deallocate(organism.start, organism.size);
    organism.size = Vec2::ZERO;
    if organism.has_staged_child() {
        grid.deallocate(organism.child_start, organism.child_size);
    }
    organism.clear_staged_child();
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn spawn_allocates_and_release_frees_everything() {
        let mut grid = Grid::new(20, 20).unwrap();
        let mut org = spawn(&mut grid, Vec2::new(2, 2), Vec2::new(3, 4), None);
        assert_eq!(grid.allocated_count(), 12);

        org.child_start = Vec2::new(10, 10);
        org.child_size = Vec2::new(2, 2);
        grid.allocate(org.child_start, org.child_size);
        assert_eq!(grid.allocated_count(), 16);

        release(&mut org, &mut grid);
        assert_eq!(grid.allocated_count(), 0);
        assert_eq!(org.size, Vec2::ZERO);
        assert!(!org.has_staged_child());

        release(&mut org, &mut grid);
        assert_eq!(grid.allocated_count(), 0);
    }
}
