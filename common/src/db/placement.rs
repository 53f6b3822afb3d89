use crate::db::indices::ClusterBlockId;
use crate::error::NocError;
use crate::geom::coord::GridCoord;

/// Current grid location of every cluster block, as seen by the placer.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockLocations {
    locs: Vec<Option<GridCoord>>,
}

impl BlockLocations {
    pub fn new(num_blocks: usize) -> Self {
        Self {
            locs: vec![None; num_blocks],
        }
    }

    pub fn num_blocks(&self) -> usize {
        self.locs.len()
    }

    pub fn set(&mut self, block: ClusterBlockId, loc: GridCoord) {
        if block.index() >= self.locs.len() {
            self.locs.resize(block.index() + 1, None);
        }
        self.locs[block.index()] = Some(loc);
    }

    pub fn get(&self, block: ClusterBlockId) -> Option<GridCoord> {
        self.locs.get(block.index()).copied().flatten()
    }

    pub fn loc(&self, block: ClusterBlockId) -> Result<GridCoord, NocError> {
        self.get(block).ok_or(NocError::UnplacedBlock(block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unplaced_blocks_report_an_error() {
        let mut locs = BlockLocations::new(2);
        locs.set(ClusterBlockId::new(0), GridCoord::new(3, 4, 0));

        assert_eq!(locs.loc(ClusterBlockId::new(0)), Ok(GridCoord::new(3, 4, 0)));
        assert_eq!(
            locs.loc(ClusterBlockId::new(1)),
            Err(NocError::UnplacedBlock(ClusterBlockId::new(1)))
        );
        assert_eq!(locs.get(ClusterBlockId::new(9)), None);
    }

    #[test]
    fn setting_past_the_end_grows_the_table() {
        let mut locs = BlockLocations::new(0);
        locs.set(ClusterBlockId::new(4), GridCoord::new(1, 1, 0));
        assert_eq!(locs.num_blocks(), 5);
    }
}
