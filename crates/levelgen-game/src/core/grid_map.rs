use serde::{Deserialize, Serialize};

use super::pos::Pos;

/// Square boolean map with one cell per grid tile.
///
/// Cells are stored row by row (`y` major). Reads outside of the map never
/// panic: [`GridMap::get`] returns `None` and [`GridMap::is_set`] returns
/// `false`, which lets feature extraction treat the border as a sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridMap {
    size: usize,
    cells: Vec<bool>,
}

impl GridMap {
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![false; size * size],
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn contains(&self, pos: Pos) -> bool {
        self.index(pos).is_some()
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        let x = usize::try_from(pos.x).ok()?;
        let y = usize::try_from(pos.y).ok()?;
        (x < self.size && y < self.size).then_some(y * self.size + x)
    }

    #[must_use]
    pub fn get(&self, pos: Pos) -> Option<bool> {
        self.index(pos).map(|i| self.cells[i])
    }

    #[must_use]
    pub fn is_set(&self, pos: Pos) -> bool {
        self.get(pos).unwrap_or(false)
    }

    /// Sets a cell.
    ///
    /// # Panics
    ///
    /// Panics if `pos` lies outside of the map.
    pub fn set(&mut self, pos: Pos, value: bool) {
        let i = self
            .index(pos)
            .unwrap_or_else(|| panic!("{pos:?} outside of {0}x{0} map", self.size));
        self.cells[i] = value;
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    /// Positions of all set cells, ordered by `x` first and then `y`.
    ///
    /// Nearest-object features break ties by the first candidate found, so
    /// this order is part of their contract.
    pub fn iter_set(&self) -> impl Iterator<Item = Pos> + '_ {
        let size = self.size;
        (0..size).flat_map(move |x| {
            (0..size).filter_map(move |y| {
                self.cells[y * size + x].then(|| cell_pos(x, y))
            })
        })
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn cell_pos(x: usize, y: usize) -> Pos {
    Pos::new(x as i32, y as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_reads_are_none() {
        let map = GridMap::new(3);
        assert_eq!(map.get(Pos::new(-1, 0)), None);
        assert_eq!(map.get(Pos::new(0, 3)), None);
        assert!(!map.is_set(Pos::new(7, 7)));
        assert_eq!(map.get(Pos::new(2, 2)), Some(false));
    }

    #[test]
    fn test_set_and_count() {
        let mut map = GridMap::new(4);
        map.set(Pos::new(1, 2), true);
        map.set(Pos::new(3, 0), true);
        assert!(map.is_set(Pos::new(1, 2)));
        assert_eq!(map.count(), 2);
        map.set(Pos::new(1, 2), false);
        assert_eq!(map.count(), 1);
    }

    #[test]
    fn test_iter_set_is_x_major() {
        let mut map = GridMap::new(3);
        map.set(Pos::new(2, 0), true);
        map.set(Pos::new(0, 2), true);
        map.set(Pos::new(0, 1), true);
        let cells: Vec<_> = map.iter_set().collect();
        assert_eq!(cells, [Pos::new(0, 1), Pos::new(0, 2), Pos::new(2, 0)]);
    }

    #[test]
    #[should_panic(expected = "outside of")]
    fn test_set_out_of_bounds_panics() {
        let mut map = GridMap::new(2);
        map.set(Pos::new(2, 0), true);
    }
}
