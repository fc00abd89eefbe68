use serde::{Deserialize, Serialize};

use crate::*;

/// Points in propagation where a presentation layer may want to linger.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ClearQueue,
    AutoQueue,
    HyperQueue,
    AddBatch,
    Redundant,
    ToFlag,
}

impl Stage {
    pub const fn of(kind: QueueKind) -> Self {
        match kind {
            QueueKind::Clear => Self::ClearQueue,
            QueueKind::Auto => Self::AutoQueue,
            QueueKind::Hyper => Self::HyperQueue,
        }
    }
}

/// Display settings for one stage: whether to show it, and for how long.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Emphasis {
    pub is_checked: bool,
    /// Milliseconds.
    pub pause_time: u32,
}

impl Emphasis {
    pub const fn pause_for(self) -> Option<u32> {
        if self.is_checked && self.pause_time > 0 {
            Some(self.pause_time)
        } else {
            None
        }
    }
}

/// Emphasis for every [`Stage`], as loaded from a settings file.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmphasisTable {
    pub clear_queue: Emphasis,
    pub auto_queue: Emphasis,
    pub hyper_queue: Emphasis,
    pub add_batch: Emphasis,
    pub redundant: Emphasis,
    pub to_flag: Emphasis,
}

impl EmphasisTable {
    pub fn get(&self, stage: Stage) -> Emphasis {
        use Stage::*;
        match stage {
            ClearQueue => self.clear_queue,
            AutoQueue => self.auto_queue,
            HyperQueue => self.hyper_queue,
            AddBatch => self.add_batch,
            Redundant => self.redundant,
            ToFlag => self.to_flag,
        }
    }

    /// Same emphasis on every stage.
    pub fn uniform(emphasis: Emphasis) -> Self {
        Self {
            clear_queue: emphasis,
            auto_queue: emphasis,
            hyper_queue: emphasis,
            add_batch: emphasis,
            redundant: emphasis,
            to_flag: emphasis,
        }
    }
}

/// Something the engine just did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepEvent<'a> {
    /// `coords` was picked from `queue` for processing.
    Active { queue: QueueKind, coords: Coord2 },
    /// A pair of naked cells is about to be solved together.
    Pair { a: Coord2, b: Coord2 },
    Batch { queue: QueueKind, added: &'a [Coord2] },
    Redundant { queue: QueueKind, removed: &'a [Coord2] },
    ToFlag { cells: &'a [Coord2] },
    Uncovered { coords: Coord2 },
    Marked { coords: Coord2, outcome: MarkOutcome },
    Detonated { triggered: Coord2 },
    AllClear,
}

/// Hooks the engine calls into. Every method defaults to doing nothing.
pub trait Presenter {
    fn emphasis(&self, stage: Stage) -> Emphasis {
        let _ = stage;
        Emphasis::default()
    }

    /// Called when the emphasis of a stage asks for a pause.
    fn pause(&mut self, millis: u32) {
        let _ = millis;
    }

    fn render(&mut self, event: StepEvent<'_>, field: &Field) {
        let _ = (event, field);
    }
}

/// Headless presenter.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_only_when_checked_and_positive() {
        let checked = Emphasis {
            is_checked: true,
            pause_time: 20,
        };
        assert_eq!(checked.pause_for(), Some(20));
        assert_eq!(
            Emphasis {
                is_checked: false,
                ..checked
            }
            .pause_for(),
            None
        );
        assert_eq!(
            Emphasis {
                pause_time: 0,
                ..checked
            }
            .pause_for(),
            None
        );
    }

    #[test]
    fn table_lookup_matches_stage() {
        let mut table = EmphasisTable::default();
        table.to_flag.is_checked = true;
        assert!(table.get(Stage::ToFlag).is_checked);
        assert!(!table.get(Stage::of(QueueKind::Hyper)).is_checked);
    }
}
