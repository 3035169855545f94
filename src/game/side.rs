/// Field sides
///
/// The field is split into exactly two halves, so per-side data lives in a
/// fixed two-entry map rather than a general collection.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// One half of the field (and the player defending it)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Both sides in processing order
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    /// The other side of the field
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Upper-case label used on the display and overlay
    pub fn label(self) -> &'static str {
        match self {
            Side::Left => "LEFT",
            Side::Right => "RIGHT",
        }
    }

    fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// A value for each side of the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SideMap<T> {
    entries: [T; 2],
}

impl<T> SideMap<T> {
    pub fn new(left: T, right: T) -> Self {
        Self {
            entries: [left, right],
        }
    }

    /// Build both entries from a function of the side
    pub fn from_fn(mut f: impl FnMut(Side) -> T) -> Self {
        Self::new(f(Side::Left), f(Side::Right))
    }

    /// Iterate `(side, value)` pairs, left first
    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        Side::ALL.into_iter().zip(self.entries.iter())
    }

    /// Transform every entry
    pub fn map<U>(self, mut f: impl FnMut(Side, T) -> U) -> SideMap<U> {
        let [left, right] = self.entries;
        SideMap::new(f(Side::Left, left), f(Side::Right, right))
    }
}

impl<T> Index<Side> for SideMap<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        &self.entries[side.index()]
    }
}

impl<T> IndexMut<Side> for SideMap<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        &mut self.entries[side.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite() {
        assert_eq!(Side::Left.opposite(), Side::Right);
        assert_eq!(Side::Right.opposite(), Side::Left);
    }

    #[test]
    fn test_side_map_indexing() {
        let mut map = SideMap::new(1, 2);
        assert_eq!(map[Side::Left], 1);
        assert_eq!(map[Side::Right], 2);

        map[Side::Right] += 10;
        assert_eq!(map[Side::Right], 12);
    }

    #[test]
    fn test_side_map_iter_order() {
        let map = SideMap::from_fn(|side| side.label());
        let collected: Vec<_> = map.iter().map(|(side, label)| (side, *label)).collect();
        assert_eq!(collected, vec![(Side::Left, "LEFT"), (Side::Right, "RIGHT")]);
    }

    #[test]
    fn test_side_serde_lowercase() {
        let json = serde_json::to_string(&Side::Left).unwrap();
        assert_eq!(json, "\"left\"");
    }
}
