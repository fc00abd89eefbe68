use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Deserializer, Serialize, de};
use smallvec::SmallVec;

use crate::*;

/// Order in which queued coordinates are processed.
///
/// Cardinal directions name where processing heads: `East` starts with the
/// west-most coordinates and works its way east.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Lifo,
    Fifo,
    Random,
    /// Reverse the queue before every pick.
    Whiplash,
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Self::Lifo,
        Self::Fifo,
        Self::Random,
        Self::Whiplash,
        Self::North,
        Self::South,
        Self::East,
        Self::West,
    ];

    pub const fn name(self) -> &'static str {
        use Direction::*;
        match self {
            Lifo => "lifo",
            Fifo => "fifo",
            Random => "random",
            Whiplash => "whiplash",
            North => "north",
            South => "south",
            East => "east",
            West => "west",
        }
    }

    /// Only FIFO takes from the head, everything else from the tail.
    pub const fn takes_head(self) -> bool {
        matches!(self, Self::Fifo)
    }

    /// Reorders `entries` in place for this policy.
    pub fn orient<R: Rng + ?Sized>(self, entries: &mut [Coord2], rng: &mut R) {
        use Direction::*;
        match self {
            Lifo | Fifo => {}
            Random => entries.shuffle(rng),
            Whiplash => entries.reverse(),
            North | South => entries.sort_by_key(|&(_, y)| y),
            East | West => entries.sort_by_key(|&(x, _)| x),
        }
        if matches!(self, South | East) {
            entries.reverse();
        }
    }

    /// Index of the entry this policy picks next.
    pub fn pick(self, len: usize) -> Option<usize> {
        match len {
            0 => None,
            _ if self.takes_head() => Some(0),
            _ => Some(len - 1),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|direction| direction.name().eq_ignore_ascii_case(s))
            .ok_or(GameError::InvalidConfiguration("unknown direction"))
    }
}

/// Accepts the same case-insensitive names as [`FromStr`].
impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        const NAMES: &[&str] = &[
            "lifo", "fifo", "random", "whiplash", "north", "south", "east", "west",
        ];
        let name = String::deserialize(deserializer)?;
        name.parse()
            .map_err(|_| de::Error::unknown_variant(&name, NAMES))
    }
}

/// Shared handle on the live processing direction.
///
/// Every queue of a game holds a clone; the presentation layer keeps one too
/// and may change the direction at any time, including mid-drain.
#[derive(Clone, Debug, Default)]
pub struct DirectionSelector(Rc<core::cell::Cell<Direction>>);

impl DirectionSelector {
    pub fn new(direction: Direction) -> Self {
        Self(Rc::new(core::cell::Cell::new(direction)))
    }

    pub fn get(&self) -> Direction {
        self.0.get()
    }

    pub fn set(&self, direction: Direction) {
        self.0.set(direction)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueKind {
    /// Covered cells known to be safe.
    Clear,
    /// Naked cells whose own Block should be solved.
    Auto,
    /// Naked cells left over for pairwise solving.
    Hyper,
}

impl QueueKind {
    /// Highest priority first.
    pub const PRIORITY: [QueueKind; 3] = [Self::Clear, Self::Auto, Self::Hyper];
}

/// Ordered set of coordinates waiting to be processed.
#[derive(Clone, Debug)]
pub struct WorkQueue {
    kind: QueueKind,
    entries: Vec<Coord2>,
    selector: DirectionSelector,
    busy: bool,
}

impl WorkQueue {
    pub fn new(kind: QueueKind, selector: DirectionSelector) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            selector,
            busy: false,
        }
    }

    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    pub fn direction(&self) -> Direction {
        self.selector.get()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, coords: Coord2) -> bool {
        self.entries.contains(&coords)
    }

    pub fn as_slice(&self) -> &[Coord2] {
        &self.entries
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub(crate) fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    /// Returns `false` if `coords` was already queued.
    pub fn append(&mut self, coords: Coord2) -> bool {
        if self.contains(coords) {
            return false;
        }
        self.entries.push(coords);
        true
    }

    /// Returns `false` if `coords` was not queued.
    pub fn remove(&mut self, coords: Coord2) -> bool {
        match self.entries.iter().position(|&entry| entry == coords) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn re_orient<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.direction().orient(&mut self.entries, rng);
    }

    /// The entry the current direction would process next.
    pub fn select(&self) -> Option<Coord2> {
        let index = self.direction().pick(self.entries.len())?;
        Some(self.entries[index])
    }

    /// Appends the not yet queued part of `batch`, ordered by the current
    /// direction. Returns what was added.
    pub fn add_batch<R: Rng + ?Sized>(
        &mut self,
        batch: impl IntoIterator<Item = Coord2>,
        rng: &mut R,
    ) -> SmallVec<[Coord2; 8]> {
        let mut fresh: SmallVec<[Coord2; 8]> = SmallVec::new();
        for coords in batch {
            if !self.contains(coords) && !fresh.contains(&coords) {
                fresh.push(coords);
            }
        }
        self.direction().orient(&mut fresh, rng);
        self.entries.extend_from_slice(&fresh);
        fresh
    }

    /// Drops entries with no unknown neighbors left. Returns them.
    pub fn clean_up(&mut self, field: &Field) -> Vec<Coord2> {
        let mut redundant = Vec::new();
        self.entries.retain(|&coords| {
            let useful = field.has_unknown_neighbors(coords);
            if !useful {
                redundant.push(coords);
            }
            useful
        });
        redundant
    }
}
