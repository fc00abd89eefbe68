use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// Up to eight neighbor coordinates.
pub type NeighborSet = SmallVec<[Coord2; 8]>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Every unknown neighbor is safe.
    Clear,
    /// Every unknown neighbor is a mine.
    Flag,
    Unknown,
}

/// Snapshot of a center cell's neighbors, split by what the player knows.
///
/// Built fresh from the field whenever it is needed; it goes stale as soon as
/// the field changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    center: Coord2,
    surrounding_mines: u8,
    naked: NeighborSet,
    flagged: NeighborSet,
    unknown: NeighborSet,
}

impl Block {
    pub fn new(field: &Field, center: Coord2) -> Self {
        let mut block = Self {
            center,
            surrounding_mines: field[center].surrounding_mines(),
            naked: NeighborSet::new(),
            flagged: NeighborSet::new(),
            unknown: NeighborSet::new(),
        };
        for pos in field.neighbors(center) {
            let cell = &field[pos];
            if cell.is_naked() {
                block.naked.push(pos);
            } else if cell.is_flagged() {
                block.flagged.push(pos);
            } else {
                block.unknown.push(pos);
            }
        }
        block
    }

    pub fn center(&self) -> Coord2 {
        self.center
    }

    pub fn naked(&self) -> &[Coord2] {
        &self.naked
    }

    pub fn flagged(&self) -> &[Coord2] {
        &self.flagged
    }

    pub fn unknown(&self) -> &[Coord2] {
        &self.unknown
    }

    /// Mines around the center not yet accounted for by flags. Negative when
    /// the center is over-flagged.
    pub fn mines_left(&self) -> i16 {
        i16::from(self.surrounding_mines) - self.flagged.len() as i16
    }

    pub fn solve(&self) -> Decision {
        let flagged = self.flagged.len();
        let possible_mines = flagged + self.unknown.len();
        let center_value = usize::from(self.surrounding_mines);

        if center_value <= flagged {
            Decision::Clear
        } else if center_value == possible_mines {
            Decision::Flag
        } else {
            Decision::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uncovered(size: Coord2, mines: &[Coord2], naked: &[Coord2]) -> Field {
        let mut field = Field::with_mines(size, mines).unwrap();
        for &pos in naked {
            field.uncover(pos);
        }
        field
    }

    #[test]
    fn partitions_neighbors() {
        let mut field = uncovered((3, 3), &[(0, 0)], &[(1, 1), (2, 2)]);
        field.toggle_flag((0, 0));
        let block = Block::new(&field, (1, 1));

        assert_eq!(block.naked(), [(2, 2)]);
        assert_eq!(block.flagged(), [(0, 0)]);
        assert_eq!(block.unknown().len(), 6);
        assert!(!block.unknown().contains(&(1, 1)));
    }

    #[test]
    fn satisfied_center_clears() {
        let mut field = uncovered((3, 3), &[(0, 0)], &[(1, 1)]);
        field.toggle_flag((0, 0));
        assert_eq!(Block::new(&field, (1, 1)).solve(), Decision::Clear);
    }

    #[test]
    fn saturated_center_flags() {
        let field = uncovered((3, 1), &[(0, 0), (2, 0)], &[(1, 0)]);
        assert_eq!(Block::new(&field, (1, 0)).solve(), Decision::Flag);
    }

    #[test]
    fn ambiguous_center_is_unknown() {
        let field = uncovered((3, 3), &[(0, 0)], &[(1, 1)]);
        assert_eq!(Block::new(&field, (1, 1)).solve(), Decision::Unknown);
    }

    #[test]
    fn empty_unknown_set_resolves_to_clear() {
        // count 1, one flag, nothing unknown: both rules hold, clear wins
        let mut field = uncovered((2, 1), &[(1, 0)], &[(0, 0)]);
        field.toggle_flag((1, 0));
        let block = Block::new(&field, (0, 0));
        assert!(block.unknown().is_empty());
        assert_eq!(block.solve(), Decision::Clear);
    }

    #[test]
    fn over_flagged_center_clears() {
        let mut field = uncovered((3, 1), &[(0, 0)], &[(1, 0)]);
        field.toggle_flag((0, 0));
        field.toggle_flag((2, 0));
        let block = Block::new(&field, (1, 0));
        assert_eq!(block.mines_left(), -1);
        assert_eq!(block.solve(), Decision::Clear);
    }

    #[test]
    fn decisions_are_sound_against_layout() {
        use rand::SeedableRng;
        use rand::rngs::SmallRng;

        for seed in 0..16 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut field = Field::new(GameConfig::new_unchecked((10, 8), 16));
            field.place_mines((5, 4), &mut rng);
            // open every safe cell in the left half
            for pos in field.iter_coords() {
                if pos.0 < 5 && !field[pos].is_mined() {
                    field.uncover(pos);
                }
            }

            for center in field.iter_coords().filter(|&pos| field[pos].is_naked()) {
                let block = Block::new(&field, center);
                match block.solve() {
                    Decision::Clear => {
                        assert!(block.unknown().iter().all(|&pos| !field[pos].is_mined()))
                    }
                    Decision::Flag => {
                        assert!(block.unknown().iter().all(|&pos| field[pos].is_mined()))
                    }
                    Decision::Unknown => {}
                }
            }
        }
    }
}
