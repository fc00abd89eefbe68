use crate::*;

/// Cells a deduction proved safe or mined. The two sets never intersect.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Deduction {
    pub clear: NeighborSet,
    pub flag: NeighborSet,
}

impl Deduction {
    pub fn is_empty(&self) -> bool {
        self.clear.is_empty() && self.flag.is_empty()
    }
}

/// Two Blocks whose unknown neighbors partly overlap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Neighborhood {
    a: Block,
    b: Block,
}

impl Neighborhood {
    /// Unknown sets share at least one cell and differ in at least one.
    pub fn overlaps(a: &[Coord2], b: &[Coord2]) -> bool {
        let shared = a.iter().any(|pos| b.contains(pos));
        let differ = a.len() != b.len() || a.iter().any(|pos| !b.contains(pos));
        shared && differ
    }

    /// `None` unless the two Blocks overlap.
    pub fn new(field: &Field, a: Coord2, b: Coord2) -> Option<Self> {
        let a = Block::new(field, a);
        let b = Block::new(field, b);
        Self::overlaps(a.unknown(), b.unknown()).then_some(Self { a, b })
    }

    pub fn a(&self) -> &Block {
        &self.a
    }

    pub fn b(&self) -> &Block {
        &self.b
    }

    /// Unknown neighbors of `a` that `b` does not see.
    pub fn a_only(&self) -> NeighborSet {
        private(&self.a, &self.b)
    }

    /// Unknown neighbors of `b` that `a` does not see.
    pub fn b_only(&self) -> NeighborSet {
        private(&self.b, &self.a)
    }

    pub fn solve(&self) -> Deduction {
        let a_only = self.a_only();
        let b_only = self.b_only();
        let mines_left_a = self.a.mines_left();
        let mines_left_b = self.b.mines_left();

        if mines_left_a - a_only.len() as i16 == mines_left_b {
            Deduction {
                clear: b_only,
                flag: a_only,
            }
        } else if mines_left_b - b_only.len() as i16 == mines_left_a {
            Deduction {
                clear: a_only,
                flag: b_only,
            }
        } else {
            Deduction::default()
        }
    }
}

fn private(this: &Block, other: &Block) -> NeighborSet {
    this.unknown()
        .iter()
        .copied()
        .filter(|pos| !other.unknown().contains(pos))
        .collect()
}
