/// Single coordinate axis used for field width, height, and positions.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Two-dimensional coordinates `(x, y)`.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Whether `coords` lies inside a field of `size`.
pub const fn in_bounds(coords: Coord2, size: Coord2) -> bool {
    coords.0 < size.0 && coords.1 < size.1
}

/// Row-major walk over every coordinate of a field of `size`.
pub fn iter_coords(size: Coord2) -> impl Iterator<Item = Coord2> {
    let (width, height) = size;
    (0..height).flat_map(move |y| (0..width).map(move |x| (x, y)))
}

/// Offsets of the eight surrounding cells, row by row from the north-west.
const OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Iterator over the in-bounds neighbors of a center coordinate.
///
/// Corners yield 3 neighbors, edges 5, everything else 8.
#[derive(Clone, Debug)]
pub struct Neighbors {
    center: Coord2,
    size: Coord2,
    offsets: core::slice::Iter<'static, (i8, i8)>,
}

impl Neighbors {
    pub fn new(center: Coord2, size: Coord2) -> Self {
        Self {
            center,
            size,
            offsets: OFFSETS.iter(),
        }
    }
}

impl Iterator for Neighbors {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        let (x, y) = self.center;
        self.offsets.by_ref().find_map(|&(dx, dy)| {
            let coords = (x.checked_add_signed(dx)?, y.checked_add_signed(dy)?);
            in_bounds(coords, self.size).then_some(coords)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn corner_has_three_neighbors() {
        let found: Vec<_> = Neighbors::new((0, 0), (4, 4)).collect();
        assert_eq!(found, [(1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn edge_and_interior_neighbor_counts() {
        assert_eq!(Neighbors::new((2, 0), (4, 4)).count(), 5);
        assert_eq!(Neighbors::new((3, 2), (4, 4)).count(), 5);
        assert_eq!(Neighbors::new((1, 2), (4, 4)).count(), 8);
    }

    #[test]
    fn single_cell_field_has_no_neighbors() {
        assert_eq!(Neighbors::new((0, 0), (1, 1)).count(), 0);
    }

    #[test]
    fn iter_coords_is_row_major() {
        let all: Vec<_> = iter_coords((2, 2)).collect();
        assert_eq!(all, [(0, 0), (1, 0), (0, 1), (1, 1)]);
    }
}
