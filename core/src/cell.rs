use serde::{Deserialize, Serialize};

/// What `detonate` reveals about a cell the player got wrong.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mistake {
    /// A mine that was never flagged.
    UnflaggedMine,
    /// A flag on a cell without a mine.
    FalseFlag,
}

/// State of a single field cell.
///
/// Transitions are guarded here rather than in the callers: uncovering a
/// flagged cell, flagging a naked one, or covering a naked one again are all
/// silent no-ops.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    naked: bool,
    flagged: bool,
    mined: bool,
    surrounding_mines: u8,
    disclosed: Option<Mistake>,
}

impl Cell {
    pub const fn is_naked(&self) -> bool {
        self.naked
    }

    pub const fn is_flagged(&self) -> bool {
        self.flagged
    }

    pub const fn is_mined(&self) -> bool {
        self.mined
    }

    /// Neither naked nor flagged.
    pub const fn is_unknown(&self) -> bool {
        !self.naked && !self.flagged
    }

    pub const fn surrounding_mines(&self) -> u8 {
        self.surrounding_mines
    }

    pub const fn disclosed(&self) -> Option<Mistake> {
        self.disclosed
    }

    /// Returns `true` if the cell became naked.
    pub fn uncover(&mut self) -> bool {
        if self.flagged || self.naked {
            return false;
        }
        self.naked = true;
        true
    }

    /// Returns `true` if the flag was placed.
    pub fn flag(&mut self) -> bool {
        if self.naked || self.flagged {
            return false;
        }
        self.flagged = true;
        true
    }

    /// Returns `true` if a flag was removed.
    pub fn unflag(&mut self) -> bool {
        if !self.flagged {
            return false;
        }
        self.flagged = false;
        true
    }

    pub(crate) fn arm(&mut self) -> bool {
        if self.mined {
            return false;
        }
        self.mined = true;
        true
    }

    pub(crate) fn bump_count(&mut self) {
        self.surrounding_mines += 1;
    }

    /// Records the mistake this cell represents, if any. Naked cells and
    /// cells already disclosed are left alone.
    pub(crate) fn disclose(&mut self) -> Option<Mistake> {
        if self.naked || self.disclosed.is_some() {
            return None;
        }
        self.disclosed = match (self.mined, self.flagged) {
            (true, false) => Some(Mistake::UnflaggedMine),
            (false, true) => Some(Mistake::FalseFlag),
            _ => None,
        };
        self.disclosed
    }

    pub fn view(&self) -> CellView {
        use CellView::*;
        match (self.naked, self.mined, self.disclosed) {
            (true, true, _) => Exploded,
            (true, false, _) => Naked(self.surrounding_mines),
            (false, _, Some(Mistake::UnflaggedMine)) => Mine,
            (false, _, Some(Mistake::FalseFlag)) => FalseFlag,
            (false, _, None) if self.flagged => Flagged,
            (false, _, None) => Covered,
        }
    }
}

/// Player-visible projection of a cell, for presentation layers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellView {
    Covered,
    Flagged,
    Naked(u8),
    /// The mine that ended the game.
    Exploded,
    /// Disclosed after a loss.
    Mine,
    /// Disclosed after a loss.
    FalseFlag,
}

impl CellView {
    // whether the cell still looks closed
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Covered | Self::Flagged | Self::FalseFlag)
    }
}

impl Default for CellView {
    fn default() -> Self {
        Self::Covered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naked_is_monotonic_and_excludes_flag() {
        let mut cell = Cell::default();
        assert!(cell.uncover());
        assert!(!cell.uncover());
        assert!(!cell.flag());
        assert!(cell.is_naked());
        assert!(!cell.is_flagged());
    }

    #[test]
    fn flagged_cell_cannot_be_uncovered() {
        let mut cell = Cell::default();
        assert!(cell.flag());
        assert!(!cell.uncover());
        assert!(!cell.is_naked());
        assert!(cell.unflag());
        assert!(cell.uncover());
    }

    #[test]
    fn disclose_reports_each_mistake_once() {
        let mut mine = Cell::default();
        mine.arm();
        assert_eq!(mine.disclose(), Some(Mistake::UnflaggedMine));
        assert_eq!(mine.disclose(), None);
        assert_eq!(mine.view(), CellView::Mine);

        let mut false_flag = Cell::default();
        false_flag.flag();
        assert_eq!(false_flag.disclose(), Some(Mistake::FalseFlag));
        assert_eq!(false_flag.view(), CellView::FalseFlag);

        let mut correct_flag = Cell::default();
        correct_flag.arm();
        correct_flag.flag();
        assert_eq!(correct_flag.disclose(), None);
        assert_eq!(correct_flag.view(), CellView::Flagged);
    }

    #[test]
    fn view_tracks_state() {
        let mut cell = Cell::default();
        cell.bump_count();
        cell.bump_count();
        assert_eq!(cell.view(), CellView::Covered);
        cell.uncover();
        assert_eq!(cell.view(), CellView::Naked(2));
        assert!(!cell.view().is_closed());
    }
}
