//! Field storage for the FDTD volume.

use crate::error::{ConfigError, EmError, Result};

/// Vacuum permeability μ₀ (H/m).
pub const MU_0: f64 = 1.2566370614e-6;

/// Vacuum permittivity ε₀ (F/m).
pub const EPSILON_0: f64 = 8.854187817e-12;

/// Smallest extent that still leaves one interior cell for the 3-point stencil.
pub const MIN_EXTENT: usize = 3;

/// Number of cells in a cube of extent `n`, rejecting extents whose `n³`
/// values would not fit in one allocation.
pub fn cell_count(n: usize) -> std::result::Result<usize, ConfigError> {
    n.checked_mul(n)
        .and_then(|m| m.checked_mul(n))
        .filter(|&cells| {
            cells
                .checked_mul(std::mem::size_of::<f64>())
                .is_some_and(|bytes| bytes <= isize::MAX as usize)
        })
        .ok_or(ConfigError::GridTooLarge(n))
}

/// Check an extent against both the stencil minimum and the addressable size.
pub fn validate_extent(n: usize) -> std::result::Result<(), ConfigError> {
    if n < MIN_EXTENT {
        return Err(ConfigError::GridTooSmall(n));
    }
    cell_count(n).map(|_| ())
}

/// Cubic 3D array of scalars.
///
/// Storage is row-major with `i` slowest: `idx = (i * n + j) * n + k`, so one
/// `i`-plane is a contiguous run of `n * n` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Array3D {
    n: usize,
    data: Vec<f64>,
}

impl Array3D {
    /// Create a new array filled with zeros.
    pub fn zeros(n: usize) -> Result<Self> {
        Self::filled(n, 0.0)
    }

    /// Create a new array filled with a constant value.
    pub fn filled(n: usize, value: f64) -> Result<Self> {
        let cells = cell_count(n)?;
        Ok(Self {
            n,
            data: vec![value; cells],
        })
    }

    fn from_vec(n: usize, data: Vec<f64>, field: &'static str) -> Result<Self> {
        let expected = cell_count(n)?;
        if data.len() != expected {
            return Err(EmError::ShapeMismatch {
                field,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { n, data })
    }

    /// Extent along each axis.
    #[inline]
    pub fn extent(&self) -> usize {
        self.n
    }

    /// Flat index of (i, j, k). Callers must stay in bounds.
    #[inline]
    pub fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.n && j < self.n && k < self.n);
        (i * self.n + j) * self.n + k
    }

    #[inline]
    fn contains(&self, i: usize, j: usize, k: usize) -> bool {
        i < self.n && j < self.n && k < self.n
    }

    /// Get value at (i, j, k) with bounds checking.
    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<f64> {
        if self.contains(i, j, k) {
            Some(self.data[self.idx(i, j, k)])
        } else {
            None
        }
    }

    /// Get mutable reference at (i, j, k) with bounds checking.
    #[inline]
    pub fn get_mut(&mut self, i: usize, j: usize, k: usize) -> Option<&mut f64> {
        if self.contains(i, j, k) {
            let idx = self.idx(i, j, k);
            Some(&mut self.data[idx])
        } else {
            None
        }
    }

    /// Unchecked-by-contract read used inside stencil loops.
    #[inline]
    pub(crate) fn at(&self, i: usize, j: usize, k: usize) -> f64 {
        self.data[self.idx(i, j, k)]
    }

    /// Raw values in storage order.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Sum all values in the array.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Compute squared norm of all values.
    pub fn norm_squared(&self) -> f64 {
        self.data.iter().map(|&x| x * x).sum()
    }

    /// Largest absolute value, 0 for an all-zero array.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |acc, &x| acc.max(x.abs()))
    }
}

/// Which of the three grids an accessor refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Electric,
    Magnetic,
    CurrentDensity,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Electric => "electric",
            Field::Magnetic => "magnetic",
            Field::CurrentDensity => "current_density",
        }
    }
}

/// The simulated cubic volume: electric field E, magnetic field B and
/// current density J on an `n × n × n` grid.
///
/// All three grids share the extent chosen at construction and are never
/// resized. A private staging grid of the same shape lets a full time step
/// compute the advanced E without disturbing the pre-step values the
/// magnetic update still needs.
#[derive(Debug, Clone)]
pub struct FieldVolume {
    pub(crate) n: usize,
    pub(crate) electric: Array3D,
    pub(crate) magnetic: Array3D,
    pub(crate) current_density: Array3D,
    pub(crate) staging: Array3D,
}

impl FieldVolume {
    /// Allocate a zero-initialised volume with `n` cells per axis.
    pub fn new(n: usize) -> Result<Self> {
        validate_extent(n)?;
        Ok(Self {
            n,
            electric: Array3D::zeros(n)?,
            magnetic: Array3D::zeros(n)?,
            current_density: Array3D::zeros(n)?,
            staging: Array3D::zeros(n)?,
        })
    }

    /// Rebuild a volume from raw buffers in storage order.
    pub fn from_parts(
        n: usize,
        electric: Vec<f64>,
        magnetic: Vec<f64>,
        current_density: Vec<f64>,
    ) -> Result<Self> {
        validate_extent(n)?;
        Ok(Self {
            n,
            electric: Array3D::from_vec(n, electric, Field::Electric.name())?,
            magnetic: Array3D::from_vec(n, magnetic, Field::Magnetic.name())?,
            current_density: Array3D::from_vec(
                n,
                current_density,
                Field::CurrentDensity.name(),
            )?,
            staging: Array3D::zeros(n)?,
        })
    }

    /// Grid extent N (identical on all axes).
    #[inline]
    pub fn extent(&self) -> usize {
        self.n
    }

    /// Number of cells per field (N³).
    pub fn len(&self) -> usize {
        self.electric.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if any index sits on the outer shell (0 or N-1).
    #[inline]
    pub fn is_boundary(&self, i: usize, j: usize, k: usize) -> bool {
        let last = self.n - 1;
        i == 0 || j == 0 || k == 0 || i == last || j == last || k == last
    }

    pub fn grid(&self, field: Field) -> &Array3D {
        match field {
            Field::Electric => &self.electric,
            Field::Magnetic => &self.magnetic,
            Field::CurrentDensity => &self.current_density,
        }
    }

    fn grid_mut(&mut self, field: Field) -> &mut Array3D {
        match field {
            Field::Electric => &mut self.electric,
            Field::Magnetic => &mut self.magnetic,
            Field::CurrentDensity => &mut self.current_density,
        }
    }

    /// Bounds-checked read.
    pub fn get(&self, field: Field, i: usize, j: usize, k: usize) -> Option<f64> {
        self.grid(field).get(i, j, k)
    }

    /// Bounds-checked write.
    pub fn set(&mut self, field: Field, i: usize, j: usize, k: usize, value: f64) -> Result<()> {
        let extent = self.n;
        match self.grid_mut(field).get_mut(i, j, k) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(EmError::IndexOutOfBounds { i, j, k, extent }),
        }
    }

    pub fn electric(&self, i: usize, j: usize, k: usize) -> Option<f64> {
        self.electric.get(i, j, k)
    }

    pub fn magnetic(&self, i: usize, j: usize, k: usize) -> Option<f64> {
        self.magnetic.get(i, j, k)
    }

    pub fn current_density(&self, i: usize, j: usize, k: usize) -> Option<f64> {
        self.current_density.get(i, j, k)
    }

    pub fn set_electric(&mut self, i: usize, j: usize, k: usize, value: f64) -> Result<()> {
        self.set(Field::Electric, i, j, k, value)
    }

    pub fn set_magnetic(&mut self, i: usize, j: usize, k: usize, value: f64) -> Result<()> {
        self.set(Field::Magnetic, i, j, k, value)
    }

    pub fn set_current_density(&mut self, i: usize, j: usize, k: usize, value: f64) -> Result<()> {
        self.set(Field::CurrentDensity, i, j, k, value)
    }

    /// Panics if the three grids disagree on shape. Such a volume cannot be
    /// built through the public constructors, so a failure is a bug.
    pub(crate) fn assert_consistent(&self) {
        assert_eq!(self.electric.extent(), self.n, "electric grid extent mismatch");
        assert_eq!(self.magnetic.extent(), self.n, "magnetic grid extent mismatch");
        assert_eq!(
            self.current_density.extent(),
            self.n,
            "current density grid extent mismatch"
        );
        assert_eq!(self.staging.extent(), self.n, "staging grid extent mismatch");
    }

    /// Total electromagnetic energy: Σ ½(ε₀E² + B²/μ₀)·dx³.
    pub fn field_energy(&self, dx: f64) -> f64 {
        let dv = dx * dx * dx;
        let e_energy = 0.5 * EPSILON_0 * self.electric.norm_squared();
        let b_energy = 0.5 * self.magnetic.norm_squared() / MU_0;
        (e_energy + b_energy) * dv
    }
}

/// Volumes compare equal when E, B and J hold identical values.
impl PartialEq for FieldVolume {
    fn eq(&self, other: &Self) -> bool {
        self.n == other.n
            && self.electric == other.electric
            && self.magnetic == other.magnetic
            && self.current_density == other.current_density
    }
}
