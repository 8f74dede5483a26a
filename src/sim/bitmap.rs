//! Row-major boolean bitmap sized to a grid
//!
//! Used both for the grid's derived "blocks field of view" layer and for the
//! visibility result of a field-of-view calculation.

use glam::{IVec2, UVec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitmap {
    size: UVec2,
    bits: Vec<bool>,
}

impl Bitmap {
    /// All-false bitmap
    pub fn new(size: UVec2) -> Self {
        Self {
            size,
            bits: vec![false; (size.x * size.y) as usize],
        }
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.x
    }

    pub fn height(&self) -> u32 {
        self.size.y
    }

    #[inline]
    pub fn in_bounds(&self, pos: IVec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.size.x && (pos.y as u32) < self.size.y
    }

    #[inline]
    fn index(&self, pos: IVec2) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.y as usize * self.size.x as usize + pos.x as usize)
    }

    /// Out-of-bounds reads are false
    #[inline]
    pub fn get(&self, pos: IVec2) -> bool {
        self.index(pos).is_some_and(|i| self.bits[i])
    }

    /// Returns false (and does nothing) when out of bounds
    pub fn set(&mut self, pos: IVec2, value: bool) -> bool {
        match self.index(pos) {
            Some(i) => {
                self.bits[i] = value;
                true
            }
            None => false,
        }
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// Positions of every set bit, row-major
    pub fn iter_set(&self) -> impl Iterator<Item = IVec2> + '_ {
        let width = self.size.x.max(1) as i32;
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(move |(i, _)| IVec2::new(i as i32 % width, i as i32 / width))
    }

    pub fn clear(&mut self) {
        self.bits.fill(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_bounds() {
        let mut bitmap = Bitmap::new(UVec2::new(4, 3));
        assert!(bitmap.set(IVec2::new(3, 2), true));
        assert!(bitmap.get(IVec2::new(3, 2)));
        assert!(!bitmap.set(IVec2::new(4, 0), true));
        assert!(!bitmap.get(IVec2::new(-1, 0)));
        assert_eq!(bitmap.count(), 1);
    }

    #[test]
    fn test_iter_set_row_major() {
        let mut bitmap = Bitmap::new(UVec2::new(3, 3));
        bitmap.set(IVec2::new(2, 0), true);
        bitmap.set(IVec2::new(0, 2), true);
        bitmap.set(IVec2::new(1, 1), true);
        let set: Vec<_> = bitmap.iter_set().collect();
        assert_eq!(
            set,
            vec![IVec2::new(2, 0), IVec2::new(1, 1), IVec2::new(0, 2)]
        );
        bitmap.clear();
        assert_eq!(bitmap.count(), 0);
    }
}
