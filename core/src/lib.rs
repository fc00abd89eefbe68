#![no_std]

extern crate alloc;

use core::ops::BitOr;
use serde::{Deserialize, Serialize};

pub use analysis::*;
pub use cell::*;
pub use engine::*;
pub use error::*;
pub use field::*;
pub use presenter::*;
pub use queue::*;
pub use types::*;

mod analysis;
mod cell;
mod engine;
mod error;
mod field;
mod presenter;
mod queue;
mod types;

/// Cells kept free of random mines around the first uncovered cell: the cell
/// itself plus its eight neighbors.
pub const START_REGION_CELLS: CellCount = 9;

/// How many mines the player asked for.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MineDensity {
    /// Percentage of all cells, `0.0..=100.0`.
    Percent(f64),
    Count(CellCount),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Validates the field shape and density, then clamps the mine count so
    /// that a mine-free start region always fits.
    pub fn new(size: Coord2, density: MineDensity) -> Result<Self> {
        let (size_x, size_y) = size;
        if size_x == 0 || size_y == 0 {
            return Err(GameError::InvalidConfiguration(
                "field width and height must be non-zero",
            ));
        }

        let total_cells = mult(size_x, size_y);
        if total_cells < START_REGION_CELLS {
            return Err(GameError::InvalidConfiguration(
                "field must have at least 9 cells",
            ));
        }

        let requested = match density {
            MineDensity::Percent(percent) => {
                if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
                    return Err(GameError::InvalidConfiguration(
                        "mine percentage must be between 0 and 100",
                    ));
                }
                round_half_even(f64::from(total_cells) * percent / 100.0)
            }
            MineDensity::Count(count) => count,
        };

        let allowed = total_cells - START_REGION_CELLS;
        if requested > allowed {
            log::debug!(
                "Clamping mine count, requested {} but only {} fit",
                requested,
                allowed
            );
        }

        Ok(Self::new_unchecked(size, requested.min(allowed)))
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub const fn safe_cells(&self) -> CellCount {
        self.total_cells() - self.mines
    }
}

/// Rounds a non-negative count to the nearest integer, ties to even.
fn round_half_even(value: f64) -> CellCount {
    let floor = value as CellCount;
    let fraction = value - f64::from(floor);
    if fraction > 0.5 || (fraction == 0.5 && floor % 2 == 1) {
        floor + 1
    } else {
        floor
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkOutcome {
    NoChange,
    Flagged,
    Unflagged,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        use RevealOutcome::*;
        match self {
            NoChange => false,
            Revealed => true,
            HitMine => true,
            Won => true,
        }
    }
}

/// Merges the outcome of a command with whatever propagation did afterwards.
impl BitOr for RevealOutcome {
    type Output = RevealOutcome;

    fn bitor(self, rhs: Self) -> Self::Output {
        use RevealOutcome::*;
        match (self, rhs) {
            (HitMine, _) => HitMine,
            (_, HitMine) => HitMine,
            (Won, _) => Won,
            (_, Won) => Won,
            (Revealed, _) => Revealed,
            (_, Revealed) => Revealed,
            (NoChange, NoChange) => NoChange,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_clamps_to_leave_start_region() {
        let config = GameConfig::new((4, 4), MineDensity::Count(100)).unwrap();
        assert_eq!(config.mines, 7);
        assert_eq!(config.safe_cells(), 9);
    }

    #[test]
    fn config_rounds_percentage() {
        let config = GameConfig::new((40, 24), MineDensity::Percent(19.0)).unwrap();
        assert_eq!(config.mines, 182);

        // ties go to the even count
        let mines = |percent| {
            GameConfig::new((10, 10), MineDensity::Percent(percent))
                .unwrap()
                .mines
        };
        assert_eq!(mines(12.5), 12);
        assert_eq!(mines(13.5), 14);
        assert_eq!(mines(0.5), 0);
        assert_eq!(mines(1.5), 2);
        assert_eq!(mines(12.6), 13);
        assert_eq!(mines(12.4), 12);
    }

    #[test]
    fn config_rejects_degenerate_input() {
        assert!(matches!(
            GameConfig::new((0, 9), MineDensity::Count(1)),
            Err(GameError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            GameConfig::new((2, 2), MineDensity::Count(0)),
            Err(GameError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            GameConfig::new((9, 9), MineDensity::Percent(-1.0)),
            Err(GameError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            GameConfig::new((9, 9), MineDensity::Percent(f64::NAN)),
            Err(GameError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            GameConfig::new((9, 9), MineDensity::Percent(100.5)),
            Err(GameError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn reveal_outcome_merge_prefers_terminal_states() {
        use RevealOutcome::*;
        assert_eq!(Revealed | HitMine, HitMine);
        assert_eq!(Won | Revealed, Won);
        assert_eq!(NoChange | Revealed, Revealed);
        assert_eq!(NoChange | NoChange, NoChange);
    }
}
