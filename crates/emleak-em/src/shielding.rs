//! Shielding: damp E and B inside a cubic sub-region.

use crate::error::{ConfigError, Result};
use crate::grid::FieldVolume;
use crate::region::Cube;

/// Fraction of field magnitude kept inside a shield.
pub const DEFAULT_DAMPING: f64 = 0.1;

/// A cube known to fit inside a grid of a given extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShieldingRegion {
    cube: Cube,
    extent: usize,
}

impl ShieldingRegion {
    /// Validate `origin` + `thickness` against `[0, extent)` on every axis.
    pub fn new(origin: [usize; 3], thickness: usize, extent: usize) -> Result<Self> {
        let cube = Cube::new(origin, thickness);
        cube.validate(extent)?;
        Ok(Self { cube, extent })
    }

    pub fn cube(&self) -> Cube {
        self.cube
    }

    pub fn origin(&self) -> [usize; 3] {
        self.cube.origin
    }

    pub fn thickness(&self) -> usize {
        self.cube.thickness
    }

    /// Extent the region was validated against.
    pub fn extent(&self) -> usize {
        self.extent
    }

    pub fn contains(&self, i: usize, j: usize, k: usize) -> bool {
        self.cube.contains(i, j, k)
    }
}

pub fn validate_damping(damping: f64) -> std::result::Result<(), ConfigError> {
    if (0.0..1.0).contains(&damping) {
        Ok(())
    } else {
        Err(ConfigError::InvalidDamping(damping))
    }
}

/// Multiplies E and B by a damping factor inside a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShieldingApplicator {
    damping: f64,
}

impl Default for ShieldingApplicator {
    fn default() -> Self {
        Self {
            damping: DEFAULT_DAMPING,
        }
    }
}

impl ShieldingApplicator {
    pub fn new(damping: f64) -> Result<Self> {
        validate_damping(damping)?;
        Ok(Self { damping })
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Scale every E and B cell of `region` by the damping factor.
    ///
    /// A region validated against a different extent is rechecked against the
    /// volume first, so one that does not fit is rejected with the volume
    /// untouched. Returns the number of cells shielded.
    pub fn apply(&self, volume: &mut FieldVolume, region: &ShieldingRegion) -> Result<usize> {
        let n = volume.extent();
        let cube = region.cube();
        if region.extent() != n {
            cube.validate(n)?;
        }

        let [x0, y0, z0] = cube.origin;
        let [x1, y1, z1] = cube.end();
        for i in x0..x1 {
            for j in y0..y1 {
                let start = (i * n + j) * n;
                let row = start + z0..start + z1;
                for value in &mut volume.electric.as_mut_slice()[row.clone()] {
                    *value *= self.damping;
                }
                for value in &mut volume.magnetic.as_mut_slice()[row] {
                    *value *= self.damping;
                }
            }
        }
        Ok(cube.cell_count())
    }
}

/// Damp `region` of `volume` by `damping`, rejecting bad input before any write.
pub fn apply_shielding(
    volume: &mut FieldVolume,
    region: &ShieldingRegion,
    damping: f64,
) -> Result<usize> {
    ShieldingApplicator::new(damping)?.apply(volume, region)
}
