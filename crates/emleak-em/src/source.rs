//! Initial field conditions and static current-density sources.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::grid::FieldVolume;
use crate::region::Cube;

/// How the volume is seeded before the first step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InitialCondition {
    /// Every field at zero.
    #[default]
    Zero,
    /// Constant E and B everywhere, shell included.
    Uniform { electric: f64, magnetic: f64 },
    /// A single E cell set to `electric`.
    Point { cell: [usize; 3], electric: f64 },
    /// E drawn uniformly from `[-amplitude, amplitude)` with a seeded RNG.
    Noise { amplitude: f64, seed: u64 },
}

fn finite(value: f64, what: &str) -> std::result::Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidInitialCondition(format!(
            "{what} must be finite, got {value}"
        )))
    }
}

impl InitialCondition {
    pub fn validate(&self, extent: usize) -> std::result::Result<(), ConfigError> {
        match *self {
            InitialCondition::Zero => Ok(()),
            InitialCondition::Uniform { electric, magnetic } => {
                finite(electric, "uniform electric value")?;
                finite(magnetic, "uniform magnetic value")
            }
            InitialCondition::Point { cell, electric } => {
                finite(electric, "point electric value")?;
                if cell.iter().any(|&c| c >= extent) {
                    return Err(ConfigError::InvalidInitialCondition(format!(
                        "point {cell:?} lies outside a grid of extent {extent}"
                    )));
                }
                Ok(())
            }
            InitialCondition::Noise { amplitude, .. } => {
                finite(amplitude, "noise amplitude")?;
                if amplitude < 0.0 {
                    return Err(ConfigError::InvalidInitialCondition(format!(
                        "noise amplitude must be non-negative, got {amplitude}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Validate against the volume, then overwrite E and B.
    pub fn apply(&self, volume: &mut FieldVolume) -> Result<()> {
        self.validate(volume.extent())?;
        match *self {
            InitialCondition::Zero => {
                volume.electric.fill(0.0);
                volume.magnetic.fill(0.0);
            }
            InitialCondition::Uniform { electric, magnetic } => {
                volume.electric.fill(electric);
                volume.magnetic.fill(magnetic);
            }
            InitialCondition::Point { cell, electric } => {
                volume.electric.fill(0.0);
                volume.magnetic.fill(0.0);
                let [i, j, k] = cell;
                volume.set_electric(i, j, k, electric)?;
            }
            InitialCondition::Noise { amplitude, seed } => {
                volume.magnetic.fill(0.0);
                if amplitude == 0.0 {
                    volume.electric.fill(0.0);
                } else {
                    let mut rng = StdRng::seed_from_u64(seed);
                    for value in volume.electric.as_mut_slice() {
                        *value = rng.gen_range(-amplitude..amplitude);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Constant current density J over a cubic region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentSource {
    pub region: Cube,
    pub value: f64,
}

impl CurrentSource {
    pub fn new(origin: [usize; 3], thickness: usize, value: f64) -> Self {
        Self {
            region: Cube::new(origin, thickness),
            value,
        }
    }

    pub fn validate(&self, extent: usize) -> std::result::Result<(), ConfigError> {
        self.region.validate(extent)?;
        finite(self.value, "current density")
    }

    /// Write `value` into J for every cell of the region.
    pub fn apply(&self, volume: &mut FieldVolume) -> Result<()> {
        self.validate(volume.extent())?;
        for (i, j, k) in self.region.cells() {
            volume.set_current_density(i, j, k, self.value)?;
        }
        Ok(())
    }
}
