//! FDTD leapfrog updates for the electric and magnetic grids.
//!
//! Both grids are advanced with a centered 3-point stencil on interior cells
//! (indices `1..=n-2` on every axis):
//!
//! ```text
//! curl(F) = (F[i,j+1,k] - F[i,j-1,k]) / 2 - (F[i+1,j,k] - F[i-1,j,k]) / 2
//! E <- E - (dt/dx) curl(B)
//! B <- B + (dt/dx) curl(E) + dt μ₀ J
//! ```
//!
//! Boundary cells are never written; they form the leakage surface.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::grid::{Array3D, FieldVolume, MU_0};

/// How a phase distributes its work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One thread walks every cell.
    #[default]
    Sequential,
    /// Each `i`-plane is handed to a rayon worker. Planes are disjoint, so
    /// every cell has exactly one writer, and the phase returns only after
    /// all planes are done.
    Parallel,
}

/// dt/dx, the dimensionless coefficient applied to each curl.
pub fn stability_number(dt: f64, dx: f64) -> f64 {
    dt / dx
}

/// Check the 3D Courant limit, stability number ≤ 1/√3.
pub fn is_stable(dt: f64, dx: f64) -> bool {
    stability_number(dt, dx) <= 1.0 / 3_f64.sqrt()
}

fn assert_step_params(dt: f64, dx: f64) {
    assert!(
        dt.is_finite() && dt > 0.0,
        "time step must be positive and finite, got {dt}"
    );
    assert!(
        dx.is_finite() && dx > 0.0,
        "grid spacing must be positive and finite, got {dx}"
    );
}

#[inline]
fn curl(f: &Array3D, i: usize, j: usize, k: usize) -> f64 {
    (f.at(i, j + 1, k) - f.at(i, j - 1, k)) / 2.0 - (f.at(i + 1, j, k) - f.at(i - 1, j, k)) / 2.0
}

#[inline]
fn interior(n: usize, x: usize) -> bool {
    x >= 1 && x + 1 < n
}

/// Write the advanced E of plane `i` into `out`; boundary cells copy through.
fn electric_plane(i: usize, out: &mut [f64], e: &Array3D, b: &Array3D, coef: f64) {
    let n = e.extent();
    let plane_inside = interior(n, i);
    for j in 0..n {
        let row_inside = plane_inside && interior(n, j);
        for k in 0..n {
            let old = e.at(i, j, k);
            out[j * n + k] = if row_inside && interior(n, k) {
                old - coef * curl(b, i, j, k)
            } else {
                old
            };
        }
    }
}

/// Advance B of plane `i` in place from E and J.
fn magnetic_plane(
    i: usize,
    plane: &mut [f64],
    e: &Array3D,
    current: &Array3D,
    coef: f64,
    source_coef: f64,
) {
    let n = e.extent();
    if !interior(n, i) {
        return;
    }
    for j in 1..n - 1 {
        for k in 1..n - 1 {
            plane[j * n + k] += coef * curl(e, i, j, k) + source_coef * current.at(i, j, k);
        }
    }
}

/// Applies FDTD time steps to a [`FieldVolume`].
///
/// The updater holds no field state; it borrows the volume exclusively for
/// the duration of each call.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldUpdater {
    pub mode: ExecutionMode,
}

impl FieldUpdater {
    pub fn new(mode: ExecutionMode) -> Self {
        Self { mode }
    }

    pub fn sequential() -> Self {
        Self::new(ExecutionMode::Sequential)
    }

    pub fn parallel() -> Self {
        Self::new(ExecutionMode::Parallel)
    }

    /// Advance E from the current B. Only E changes.
    pub fn update_electric(&self, volume: &mut FieldVolume, dt: f64, dx: f64) {
        assert_step_params(dt, dx);
        volume.assert_consistent();
        self.electric_phase(volume, dt / dx);
        std::mem::swap(&mut volume.electric, &mut volume.staging);
    }

    /// Advance B from the current E and J. Only B changes.
    pub fn update_magnetic(&self, volume: &mut FieldVolume, dt: f64, dx: f64) {
        assert_step_params(dt, dx);
        volume.assert_consistent();
        self.magnetic_phase(volume, dt / dx, dt * MU_0);
    }

    /// One full leapfrog step.
    ///
    /// The E-phase writes the advanced E into staging and completes before the
    /// B-phase starts. The B-phase reads the untouched pre-step E. The step
    /// then commits staging as the new E, so neither update ever sees a value
    /// advanced within the same step.
    pub fn step(&self, volume: &mut FieldVolume, dt: f64, dx: f64) {
        assert_step_params(dt, dx);
        volume.assert_consistent();
        let coef = dt / dx;
        self.electric_phase(volume, coef);
        self.magnetic_phase(volume, coef, dt * MU_0);
        std::mem::swap(&mut volume.electric, &mut volume.staging);
    }

    fn electric_phase(&self, volume: &mut FieldVolume, coef: f64) {
        let n = volume.n;
        let FieldVolume {
            electric,
            magnetic,
            staging,
            ..
        } = volume;
        let (e, b) = (&*electric, &*magnetic);
        let out = staging.as_mut_slice();
        match self.mode {
            ExecutionMode::Sequential => out
                .chunks_mut(n * n)
                .enumerate()
                .for_each(|(i, plane)| electric_plane(i, plane, e, b, coef)),
            ExecutionMode::Parallel => out
                .par_chunks_mut(n * n)
                .enumerate()
                .for_each(|(i, plane)| electric_plane(i, plane, e, b, coef)),
        }
    }

    fn magnetic_phase(&self, volume: &mut FieldVolume, coef: f64, source_coef: f64) {
        let n = volume.n;
        let FieldVolume {
            electric,
            magnetic,
            current_density,
            ..
        } = volume;
        let (e, j) = (&*electric, &*current_density);
        let out = magnetic.as_mut_slice();
        match self.mode {
            ExecutionMode::Sequential => out
                .chunks_mut(n * n)
                .enumerate()
                .for_each(|(i, plane)| magnetic_plane(i, plane, e, j, coef, source_coef)),
            ExecutionMode::Parallel => out
                .par_chunks_mut(n * n)
                .enumerate()
                .for_each(|(i, plane)| magnetic_plane(i, plane, e, j, coef, source_coef)),
        }
    }
}

/// Advance the electric field of `volume` by one update.
pub fn update_electric(volume: &mut FieldVolume, dt: f64, dx: f64) {
    FieldUpdater::default().update_electric(volume, dt, dx);
}

/// Advance the magnetic field of `volume` by one update.
pub fn update_magnetic(volume: &mut FieldVolume, dt: f64, dx: f64) {
    FieldUpdater::default().update_magnetic(volume, dt, dx);
}
