use std::ops::{Add, Mul, Sub};

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

/// Integer grid coordinate.
///
/// `x` grows to the right and `y` grows upwards, so [`Direction::Up`] adds one
/// to `y`. Coordinates are signed so that deltas between two positions can be
/// represented with the same type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Sum of both coordinates, keeping their signs.
    ///
    /// Used as a cheap ordering key by the level generator and the
    /// nearest-object features. It is *not* a distance.
    #[must_use]
    pub const fn signed_sum(self) -> i32 {
        self.x + self.y
    }

    /// L1 length of this position seen as a delta.
    #[must_use]
    pub const fn manhattan_len(self) -> i32 {
        self.x.abs() + self.y.abs()
    }

    #[must_use]
    pub const fn manhattan_distance(self, other: Self) -> i32 {
        Self::new(self.x - other.x, self.y - other.y).manhattan_len()
    }

    /// This position and its four orthogonal neighbours.
    ///
    /// Neighbours may lie outside of the map; callers filter as needed.
    #[must_use]
    pub fn with_neighbors(self) -> ArrayVec<Pos, 5> {
        let mut out = ArrayVec::new();
        out.push(self);
        for dir in Direction::ALL {
            out.push(self + dir.delta());
        }
        out
    }
}

impl Add for Pos {
    type Output = Pos;

    fn add(self, rhs: Self) -> Self::Output {
        Pos::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Pos {
    type Output = Pos;

    fn sub(self, rhs: Self) -> Self::Output {
        Pos::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<i32> for Pos {
    type Output = Pos;

    fn mul(self, rhs: i32) -> Self::Output {
        Pos::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::IsVariant)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Up,
        Direction::Left,
        Direction::Down,
    ];

    #[must_use]
    pub const fn delta(self) -> Pos {
        match self {
            Direction::Up => Pos::new(0, 1),
            Direction::Down => Pos::new(0, -1),
            Direction::Left => Pos::new(-1, 0),
            Direction::Right => Pos::new(1, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_sum_keeps_sign() {
        assert_eq!(Pos::new(3, -5).signed_sum(), -2);
        assert_eq!(Pos::new(-1, -1).signed_sum(), -2);
    }

    #[test]
    fn test_manhattan_distance_is_symmetric() {
        let a = Pos::new(0, 0);
        let b = Pos::new(4, -3);
        assert_eq!(a.manhattan_distance(b), 7);
        assert_eq!(b.manhattan_distance(a), 7);
    }

    #[test]
    fn test_with_neighbors_contains_center_first() {
        let center = Pos::new(2, 2);
        let near = center.with_neighbors();
        assert_eq!(near.len(), 5);
        assert_eq!(near[0], center);
        assert!(near.contains(&Pos::new(2, 3)));
        assert!(near.contains(&Pos::new(1, 2)));
        assert!(!near.contains(&Pos::new(3, 3)));
    }

    #[test]
    fn test_direction_up_increases_y() {
        assert_eq!(Pos::ORIGIN + Direction::Up.delta(), Pos::new(0, 1));
        assert_eq!(Pos::ORIGIN + Direction::Down.delta(), Pos::new(0, -1));
    }
}
