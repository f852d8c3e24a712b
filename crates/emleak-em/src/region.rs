//! Axis-aligned cubic cell ranges.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The cube `[x, x+t) × [y, y+t) × [z, z+t)` of cell indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cube {
    pub origin: [usize; 3],
    pub thickness: usize,
}

impl Cube {
    pub fn new(origin: [usize; 3], thickness: usize) -> Self {
        Self { origin, thickness }
    }

    /// Check that the cube is non-empty and lies inside `[0, extent)` on
    /// every axis. Overflowing `origin + thickness` counts as out of bounds.
    pub fn validate(&self, extent: usize) -> Result<(), ConfigError> {
        if self.thickness == 0 {
            return Err(ConfigError::EmptyRegion);
        }
        let fits = self.origin.iter().all(|&o| {
            o.checked_add(self.thickness)
                .is_some_and(|end| end <= extent)
        });
        if !fits {
            return Err(ConfigError::RegionOutOfBounds {
                origin: self.origin,
                thickness: self.thickness,
                extent,
            });
        }
        Ok(())
    }

    /// Exclusive end index per axis. Only meaningful once validated.
    pub fn end(&self) -> [usize; 3] {
        self.origin.map(|o| o + self.thickness)
    }

    pub fn contains(&self, i: usize, j: usize, k: usize) -> bool {
        let [x, y, z] = self.origin;
        let t = self.thickness;
        (x..x + t).contains(&i) && (y..y + t).contains(&j) && (z..z + t).contains(&k)
    }

    /// Number of cells covered.
    pub fn cell_count(&self) -> usize {
        self.thickness.pow(3)
    }

    /// Every (i, j, k) inside the cube, `k` fastest.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, usize)> + use<> {
        let [x, y, z] = self.origin;
        let t = self.thickness;
        (x..x + t).flat_map(move |i| (y..y + t).flat_map(move |j| (z..z + t).map(move |k| (i, j, k))))
    }
}
