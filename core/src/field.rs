use alloc::vec::Vec;
use core::ops::Index;
use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// Every cell of one game, plus the mine budget.
///
/// Mines are placed lazily on the first uncover (see [`Field::place_mines`])
/// unless a fixed layout was seeded up front.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    cells: Array2<Cell>,
    total_mines: CellCount,
    mines_placed: bool,
    naked_count: CellCount,
    flagged_count: CellCount,
    triggered: Option<Coord2>,
    detonated: bool,
}

impl Field {
    /// Unchecked configs are clamped like [`GameConfig::new`] does, so that
    /// placement always fits.
    pub fn new(config: GameConfig) -> Self {
        let allowed = config.total_cells().saturating_sub(START_REGION_CELLS);
        if config.mines > allowed {
            log::debug!(
                "Clamping mine count, requested {} but only {} fit",
                config.mines,
                allowed
            );
        }
        Self {
            cells: Array2::default(config.size.to_nd_index()),
            total_mines: config.mines.min(allowed),
            mines_placed: false,
            naked_count: 0,
            flagged_count: 0,
            triggered: None,
            detonated: false,
        }
    }

    /// Builds a field with a fixed mine layout, bypassing random placement.
    pub fn with_mines(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::InvalidConfiguration(
                "field width and height must be non-zero",
            ));
        }

        let mut field = Self::new(GameConfig::new_unchecked(size, 0));
        for &coords in mine_coords {
            let coords = field.validate_coords(coords)?;
            if field.arm(coords) {
                field.total_mines += 1;
            }
        }
        if field.total_mines == field.total_cells() {
            return Err(GameError::InvalidConfiguration(
                "layout must leave at least one safe cell",
            ));
        }
        field.mines_placed = true;
        log::debug!("Seeded fixed layout with {} mines", field.total_mines);
        Ok(field)
    }

    pub fn size(&self) -> Coord2 {
        let (x, y) = self.cells.dim();
        // dimensions originate from `Coord2`, so they always fit
        (x as Coord, y as Coord)
    }

    pub fn total_cells(&self) -> CellCount {
        self.cells.len() as CellCount
    }

    pub fn total_mines(&self) -> CellCount {
        self.total_mines
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells().saturating_sub(self.total_mines)
    }

    pub fn naked_count(&self) -> CellCount {
        self.naked_count
    }

    pub fn flagged_count(&self) -> CellCount {
        self.flagged_count
    }

    pub fn mines_placed(&self) -> bool {
        self.mines_placed
    }

    pub fn contains(&self, coords: Coord2) -> bool {
        in_bounds(coords, self.size())
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if self.contains(coords) {
            Ok(coords)
        } else {
            Err(GameError::OutOfBounds { coords })
        }
    }

    pub fn view(&self, coords: Coord2) -> CellView {
        self[coords].view()
    }

    pub fn neighbors(&self, coords: Coord2) -> Neighbors {
        Neighbors::new(coords, self.size())
    }

    pub fn has_unknown_neighbors(&self, coords: Coord2) -> bool {
        self.neighbors(coords).any(|pos| self[pos].is_unknown())
    }

    pub fn iter_coords(&self) -> impl Iterator<Item = Coord2> + use<> {
        iter_coords(self.size())
    }

    /// Coordinates of every mine, row-major. Feeds [`Field::with_mines`] for
    /// replaying a finished layout.
    pub fn mine_coords(&self) -> Vec<Coord2> {
        self.iter_coords().filter(|&pos| self[pos].is_mined()).collect()
    }

    /// The mined cell that ended the game, if any.
    pub fn triggered(&self) -> Option<Coord2> {
        self.triggered
    }

    /// Places all mines, keeping `first_step` and its unknown neighbors clear.
    ///
    /// Cells flagged before the first uncover are mined first and count
    /// towards the total. Each flagged cell's neighbors are also kept clear,
    /// unless that would leave fewer candidates than mines still to place.
    pub fn place_mines<R: Rng + ?Sized>(&mut self, first_step: Coord2, rng: &mut R) {
        if self.mines_placed {
            return;
        }
        self.mines_placed = true;

        let size = self.size();
        let mut leave_clear: Array2<bool> = Array2::default(size.to_nd_index());
        leave_clear[first_step.to_nd_index()] = true;
        for pos in self.neighbors(first_step) {
            if self[pos].is_unknown() {
                leave_clear[pos.to_nd_index()] = true;
            }
        }

        let flagged: Vec<Coord2> = self
            .iter_coords()
            .filter(|&pos| self[pos].is_flagged())
            .take(self.total_mines.into())
            .collect();
        let mut to_place = self.total_mines - flagged.len() as CellCount;
        let mut candidates = self
            .iter_coords()
            .filter(|&pos| self[pos].is_unknown() && !leave_clear[pos.to_nd_index()])
            .count() as CellCount;

        for &flag in &flagged {
            self.arm(flag);

            let expansion: SmallVec<[Coord2; 8]> = self
                .neighbors(flag)
                .filter(|&pos| self[pos].is_unknown() && !leave_clear[pos.to_nd_index()])
                .collect();
            let shrunk = candidates - expansion.len() as CellCount;
            if shrunk >= to_place {
                for pos in expansion {
                    leave_clear[pos.to_nd_index()] = true;
                }
                candidates = shrunk;
            } else {
                log::debug!(
                    "Not clearing around flag {:?}, {} candidates left for {} mines",
                    flag,
                    candidates,
                    to_place
                );
            }
        }

        let total_cells = self.total_cells();
        let width = CellCount::from(size.0);
        while to_place > 0 {
            if candidates == 0 {
                log::warn!("Ran out of mine candidates with {} mines left", to_place);
                break;
            }
            let index = rng.random_range(0..total_cells);
            let pos = ((index % width) as Coord, (index / width) as Coord);
            if leave_clear[pos.to_nd_index()] || !self[pos].is_unknown() || self[pos].is_mined() {
                continue;
            }
            self.arm(pos);
            to_place -= 1;
            candidates -= 1;
        }

        let placed = self.iter_coords().filter(|&pos| self[pos].is_mined()).count() as CellCount;
        if placed != self.total_mines {
            log::warn!(
                "Placed mine count mismatch, actual: {}, requested: {}",
                placed,
                self.total_mines
            );
            self.total_mines = placed;
        }
        log::debug!("Placed {} mines around first step {:?}", placed, first_step);
    }

    /// Marks `coords` as naked. Flagged and already naked cells are left alone.
    pub fn uncover(&mut self, coords: Coord2) -> bool {
        let cell = &mut self.cells[coords.to_nd_index()];
        if !cell.uncover() {
            return false;
        }
        self.naked_count += 1;
        if cell.is_mined() {
            self.triggered.get_or_insert(coords);
        }
        true
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> MarkOutcome {
        let cell = &mut self.cells[coords.to_nd_index()];
        if cell.unflag() {
            self.flagged_count -= 1;
            MarkOutcome::Unflagged
        } else if cell.flag() {
            self.flagged_count += 1;
            MarkOutcome::Flagged
        } else {
            MarkOutcome::NoChange
        }
    }

    /// Whether a mine has been uncovered. The first positive answer also
    /// detonates the field.
    pub fn is_triggered(&mut self) -> bool {
        if self.triggered.is_none() {
            return false;
        }
        self.detonate();
        true
    }

    /// Discloses every unflagged mine and every false flag. Only the first
    /// call has any effect.
    pub fn detonate(&mut self) -> Vec<(Coord2, Mistake)> {
        if self.detonated {
            return Vec::new();
        }
        self.detonated = true;

        let mut mistakes = Vec::new();
        for pos in iter_coords(self.size()) {
            if let Some(mistake) = self.cells[pos.to_nd_index()].disclose() {
                mistakes.push((pos, mistake));
            }
        }
        log::debug!("Detonated, {} mistakes disclosed", mistakes.len());
        mistakes
    }

    pub fn is_all_clear(&self) -> bool {
        self.naked_count == self.safe_cell_count()
    }

    /// Mines `coords` and bumps every neighbor's count.
    fn arm(&mut self, coords: Coord2) -> bool {
        if !self.cells[coords.to_nd_index()].arm() {
            return false;
        }
        for pos in Neighbors::new(coords, self.size()) {
            self.cells[pos.to_nd_index()].bump_count();
        }
        true
    }
}

impl Index<Coord2> for Field {
    type Output = Cell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn field(size: Coord2, mines: CellCount) -> Field {
        Field::new(GameConfig::new_unchecked(size, mines))
    }

    fn is_start_region(pos: Coord2, start: Coord2) -> bool {
        pos.0.abs_diff(start.0) <= 1 && pos.1.abs_diff(start.1) <= 1
    }

    #[test]
    fn placement_respects_count_and_start_region() {
        for seed in 0..32 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut field = field((9, 7), 30);
            let start = (4, 3);
            field.place_mines(start, &mut rng);

            assert_eq!(field.mine_coords().len(), 30);
            assert!(field.mine_coords().iter().all(|&pos| !is_start_region(pos, start)));
        }
    }

    #[test]
    fn placement_fills_everything_outside_start_region() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut field = field((4, 4), 7);
        field.place_mines((1, 1), &mut rng);

        assert_eq!(field.total_mines(), 7);
        for pos in field.iter_coords() {
            assert_eq!(field[pos].is_mined(), pos.0 == 3 || pos.1 == 3);
        }
    }

    #[test]
    fn unchecked_config_is_clamped() {
        let tiny = field((3, 3), 20);
        assert_eq!(tiny.total_mines(), 0);
        assert_eq!(tiny.safe_cell_count(), 9);

        let mut crowded = field((4, 4), 200);
        assert_eq!(crowded.total_mines(), 7);
        crowded.place_mines((1, 1), &mut SmallRng::seed_from_u64(0));
        assert_eq!(crowded.mine_coords().len(), 7);
    }

    #[test]
    fn surrounding_counts_match_layout() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut field = field((8, 8), 20);
        field.place_mines((0, 7), &mut rng);

        for pos in field.iter_coords() {
            let expected = field.neighbors(pos).filter(|&n| field[n].is_mined()).count();
            assert_eq!(usize::from(field[pos].surrounding_mines()), expected);
        }
    }

    #[test]
    fn placement_happens_once() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut field = field((6, 6), 10);
        field.place_mines((0, 0), &mut rng);
        let first = field.mine_coords();
        field.place_mines((5, 5), &mut rng);
        assert_eq!(field.mine_coords(), first);
    }

    #[test]
    fn flags_before_placement_become_mines() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut field = field((8, 8), 10);
        field.toggle_flag((7, 7));
        field.toggle_flag((7, 0));
        field.place_mines((0, 0), &mut rng);

        assert!(field[(7, 7)].is_mined());
        assert!(field[(7, 0)].is_mined());
        assert_eq!(field.mine_coords().len(), 10);
        // neighbors of each flag stay clear while there is room
        for pos in field.neighbors((7, 7)).chain(field.neighbors((7, 0))) {
            assert!(!field[pos].is_mined());
        }
    }

    #[test]
    fn flag_expansion_is_skipped_when_it_would_starve_placement() {
        let mut rng = SmallRng::seed_from_u64(5);
        // 16 cells, 9 kept clear by the start, 7 mines: no room for expansion
        let mut field = field((4, 4), 7);
        field.toggle_flag((3, 3));
        field.place_mines((1, 1), &mut rng);

        assert_eq!(field.mine_coords().len(), 7);
        assert!(field[(3, 3)].is_mined());
        assert!(field[(3, 2)].is_mined());
        assert!(field[(2, 3)].is_mined());
    }

    #[test]
    fn flagged_start_neighbor_is_mined_not_kept_clear() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut field = field((5, 5), 3);
        field.toggle_flag((1, 1));
        field.place_mines((0, 0), &mut rng);

        assert!(field[(1, 1)].is_mined());
        assert!(!field[(0, 0)].is_mined());
        assert_eq!(field[(0, 0)].surrounding_mines(), 1);
    }

    #[test]
    fn seeded_layout_skips_random_placement() {
        let mut field = Field::with_mines((3, 3), &[(0, 0), (0, 0)]).unwrap();
        assert_eq!(field.total_mines(), 1);
        assert!(field.mines_placed());

        let mut rng = SmallRng::seed_from_u64(0);
        field.place_mines((2, 2), &mut rng);
        assert_eq!(field.mine_coords(), [(0, 0)]);
        assert_eq!(field[(1, 1)].surrounding_mines(), 1);
    }

    #[test]
    fn seeded_layout_rejects_bad_input() {
        assert_eq!(
            Field::with_mines((3, 3), &[(3, 0)]),
            Err(GameError::OutOfBounds { coords: (3, 0) })
        );
        assert!(matches!(
            Field::with_mines((1, 1), &[(0, 0)]),
            Err(GameError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn flagged_cell_is_never_uncovered() {
        let mut field = Field::with_mines((3, 3), &[(0, 0)]).unwrap();
        assert_eq!(field.toggle_flag((2, 2)), MarkOutcome::Flagged);
        assert!(!field.uncover((2, 2)));
        assert_eq!(field.naked_count(), 0);

        assert!(field.uncover((1, 1)));
        assert!(!field.uncover((1, 1)));
        assert_eq!(field.toggle_flag((1, 1)), MarkOutcome::NoChange);
        assert_eq!(field.naked_count(), 1);
    }

    #[test]
    fn triggering_discloses_mistakes_once() {
        let mut field = Field::with_mines((3, 3), &[(0, 0), (2, 2)]).unwrap();
        field.toggle_flag((2, 2));
        field.toggle_flag((1, 0));
        assert!(!field.is_triggered());

        field.uncover((0, 0));
        assert!(field.is_triggered());
        assert_eq!(field.triggered(), Some((0, 0)));
        assert_eq!(field.view((0, 0)), CellView::Exploded);
        assert_eq!(field.view((2, 2)), CellView::Flagged);
        assert_eq!(field.view((1, 0)), CellView::FalseFlag);
        assert!(field.detonate().is_empty());
    }

    #[test]
    fn detonate_lists_unflagged_mines() {
        let mut field = Field::with_mines((3, 3), &[(0, 0), (2, 2)]).unwrap();
        field.uncover((0, 0));
        let mistakes = field.detonate();
        assert_eq!(mistakes, [((2, 2), Mistake::UnflaggedMine)]);
        assert_eq!(field.view((2, 2)), CellView::Mine);
    }

    #[test]
    fn all_clear_once_every_safe_cell_is_naked() {
        let mut field = Field::with_mines((2, 2), &[(1, 1)]).unwrap();
        for pos in [(0, 0), (1, 0)] {
            field.uncover(pos);
            assert!(!field.is_all_clear());
        }
        field.uncover((0, 1));
        assert!(field.is_all_clear());
    }
}
