use noc_common::db::indices::ClusterBlockId;
use noc_common::db::placement::BlockLocations;
use noc_common::error::NocError;
use noc_common::geom::coord::GridCoord;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovedBlock {
    pub block: ClusterBlockId,
    pub old_loc: GridCoord,
    pub new_loc: GridCoord,
}

/// Blocks relocated by a single placement move.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlocksToBeMoved {
    pub moved_blocks: Vec<MovedBlock>,
}

impl BlocksToBeMoved {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exchanges the locations of two blocks.
    pub fn swap(
        a: ClusterBlockId,
        b: ClusterBlockId,
        locs: &BlockLocations,
    ) -> Result<Self, NocError> {
        let loc_a = locs.loc(a)?;
        let loc_b = locs.loc(b)?;
        let mut moves = Self::new();
        moves.add_block(a, loc_a, loc_b);
        moves.add_block(b, loc_b, loc_a);
        Ok(moves)
    }

    /// Moves one block to an unoccupied location.
    pub fn relocate(
        block: ClusterBlockId,
        to: GridCoord,
        locs: &BlockLocations,
    ) -> Result<Self, NocError> {
        let from = locs.loc(block)?;
        let mut moves = Self::new();
        moves.add_block(block, from, to);
        Ok(moves)
    }

    pub fn add_block(&mut self, block: ClusterBlockId, old_loc: GridCoord, new_loc: GridCoord) {
        self.moved_blocks.push(MovedBlock {
            block,
            old_loc,
            new_loc,
        });
    }

    pub fn len(&self) -> usize {
        self.moved_blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moved_blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MovedBlock> {
        self.moved_blocks.iter()
    }

    /// Writes the proposed locations into the placement.
    pub fn apply(&self, locs: &mut BlockLocations) {
        for m in &self.moved_blocks {
            locs.set(m.block, m.new_loc);
        }
    }

    /// Restores the locations the blocks had before the move.
    pub fn revert(&self, locs: &mut BlockLocations) {
        for m in self.moved_blocks.iter().rev() {
            locs.set(m.block, m.old_loc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_apply_and_revert() {
        let a = ClusterBlockId::new(0);
        let b = ClusterBlockId::new(1);
        let mut locs = BlockLocations::new(2);
        locs.set(a, GridCoord::new(0, 0, 0));
        locs.set(b, GridCoord::new(5, 5, 0));
        let before = locs.clone();

        let moves = BlocksToBeMoved::swap(a, b, &locs).unwrap();
        assert_eq!(moves.len(), 2);

        moves.apply(&mut locs);
        assert_eq!(locs.get(a), Some(GridCoord::new(5, 5, 0)));
        assert_eq!(locs.get(b), Some(GridCoord::new(0, 0, 0)));

        moves.revert(&mut locs);
        assert_eq!(locs, before);
    }

    #[test]
    fn unplaced_block_cannot_move() {
        let locs = BlockLocations::new(1);
        let err = BlocksToBeMoved::relocate(ClusterBlockId::new(0), GridCoord::new(1, 1, 0), &locs)
            .unwrap_err();
        assert_eq!(err, NocError::UnplacedBlock(ClusterBlockId::new(0)));
    }
}
