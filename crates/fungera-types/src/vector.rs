//! Two-component integer vectors and the four cardinal directions.
//!
//! A [`Vec2`] is `[row, column]`: it is used for grid coordinates, region
//! sizes, direction deltas, and register values alike. Rows grow
//! downwards, so "up" is `(-1, 0)`.
//!
//! Vector arithmetic wraps on overflow. Register values are unbounded
//! organism-controlled data, and a wrapped coordinate is simply out of
//! bounds for every grid operation.

use core::ops::{Add, Sub};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A `[row, column]` integer pair.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Vec2 {
    /// First component (row, vertical axis).
    pub row: i64,
    /// Second component (column, horizontal axis).
    pub col: i64,
}

/// Selects one component of a [`Vec2`].
///
/// Organisms address components with the `x` and `y` opcodes: `x` selects
/// the first component (row) and `y` the second (column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// The first (row) component.
    First,
    /// The second (column) component.
    Second,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0, 0);

    /// Create a vector from its two components.
    pub const fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }

    /// Create a vector with both components set to `value`.
    pub const fn splat(value: i64) -> Self {
        Self::new(value, value)
    }

    /// Whether both components are zero.
    pub const fn is_zero(self) -> bool {
        self.row == 0 && self.col == 0
    }

    /// Whether any component is zero or negative.
    pub const fn has_non_positive(self) -> bool {
        self.row <= 0 || self.col <= 0
    }

    /// The larger of the two components.
    pub const fn max_component(self) -> i64 {
        if self.row >= self.col { self.row } else { self.col }
    }

    /// Maximum-axis (Chebyshev) length: `max(|row|, |col|)`.
    pub const fn chebyshev_norm(self) -> u64 {
        let r = self.row.unsigned_abs();
        let c = self.col.unsigned_abs();
        if r >= c { r } else { c }
    }

    /// Read one component.
    pub const fn component(self, component: Component) -> i64 {
        match component {
            Component::First => self.row,
            Component::Second => self.col,
        }
    }

    /// Mutable access to one component.
    pub const fn component_mut(&mut self, component: Component) -> &mut i64 {
        match component {
            Component::First => &mut self.row,
            Component::Second => &mut self.col,
        }
    }

    /// Component-wise sum, wrapping.
    pub const fn wrapping_add(self, rhs: Self) -> Self {
        Self::new(self.row.wrapping_add(rhs.row), self.col.wrapping_add(rhs.col))
    }

    /// Component-wise difference, wrapping.
    pub const fn wrapping_sub(self, rhs: Self) -> Self {
        Self::new(self.row.wrapping_sub(rhs.row), self.col.wrapping_sub(rhs.col))
    }

    /// `self + delta * steps`, wrapping.
    pub const fn offset(self, delta: Self, steps: i64) -> Self {
        Self::new(
            self.row.wrapping_add(delta.row.wrapping_mul(steps)),
            self.col.wrapping_add(delta.col.wrapping_mul(steps)),
        )
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.wrapping_sub(rhs)
    }
}

impl core::fmt::Display for Vec2 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}, {}]", self.row, self.col)
    }
}

/// One of the four cardinal movement directions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Direction {
    /// `(-1, 0)`
    Up,
    /// `(1, 0)`
    Down,
    /// `(0, 1)`, the direction every organism starts with.
    #[default]
    Right,
    /// `(0, -1)`
    Left,
}

impl Direction {
    /// The unit vector for this direction.
    pub const fn delta(self) -> Vec2 {
        match self {
            Self::Up => Vec2::new(-1, 0),
            Self::Down => Vec2::new(1, 0),
            Self::Right => Vec2::new(0, 1),
            Self::Left => Vec2::new(0, -1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_walks_along_delta() {
        let ip = Vec2::new(10, 10);
        assert_eq!(ip.offset(Direction::Right.delta(), 3), Vec2::new(10, 13));
        assert_eq!(ip.offset(Direction::Up.delta(), 4), Vec2::new(6, 10));
        assert_eq!(ip.offset(Direction::Left.delta(), 0), ip);
    }

    #[test]
    fn chebyshev_norm_takes_largest_axis() {
        assert_eq!(Vec2::new(-7, 3).chebyshev_norm(), 7);
        assert_eq!(Vec2::new(2, -9).chebyshev_norm(), 9);
        assert_eq!(Vec2::ZERO.chebyshev_norm(), 0);
    }

    #[test]
    fn component_access() {
        let mut v = Vec2::new(4, 5);
        assert_eq!(v.component(Component::First), 4);
        assert_eq!(v.component(Component::Second), 5);
        *v.component_mut(Component::Second) = 9;
        assert_eq!(v, Vec2::new(4, 9));
    }

    #[test]
    fn arithmetic_wraps_instead_of_panicking() {
        let v = Vec2::splat(i64::MAX) + Vec2::splat(1);
        assert_eq!(v, Vec2::splat(i64::MIN));
        assert_eq!(Vec2::new(5, 2) - Vec2::new(1, 3), Vec2::new(4, -1));
        assert_eq!(Vec2::new(2, -3).offset(Vec2::new(0, 1), 4), Vec2::new(2, 1));
    }

    #[test]
    fn non_positive_detection() {
        assert!(Vec2::new(0, 3).has_non_positive());
        assert!(Vec2::new(2, -1).has_non_positive());
        assert!(!Vec2::new(2, 2).has_non_positive());
    }
}
