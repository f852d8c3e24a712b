//! Electromagnetic leakage simulation core.
//!
//! A cubic FDTD volume holding scalar electric (E), magnetic (B) and current
//! density (J) grids, advanced with a leapfrog curl stencil, plus the two
//! operations built on top of it:
//! - boundary-shell leakage analysis (Σ|E| over every outer cell)
//! - shielding (damping E and B inside a cubic sub-region)
//!
//! # Example
//!
//! ```
//! use emleak_em::{FieldUpdater, FieldVolume, ShieldingRegion, analyze_leakage, apply_shielding};
//!
//! let mut volume = FieldVolume::new(12).unwrap();
//! volume.set_electric(0, 6, 6, 2.0).unwrap();
//!
//! let updater = FieldUpdater::default();
//! for _ in 0..5 {
//!     updater.step(&mut volume, 1e-9, 1.0);
//! }
//!
//! let before = analyze_leakage(&volume);
//! let region = ShieldingRegion::new([0, 4, 4], 4, volume.extent()).unwrap();
//! apply_shielding(&mut volume, &region, 0.1).unwrap();
//! assert!(analyze_leakage(&volume).leakage < before.leakage);
//! ```

pub mod error;
pub mod fdtd;
pub mod grid;
pub mod leakage;
pub mod region;
pub mod shielding;
pub mod source;

pub use error::{ConfigError, EmError, Result};
pub use fdtd::{
    ExecutionMode, FieldUpdater, is_stable, stability_number, update_electric, update_magnetic,
};
pub use grid::{
    Array3D, EPSILON_0, Field, FieldVolume, MIN_EXTENT, MU_0, cell_count, validate_extent,
};
pub use leakage::{LeakageAnalyzer, LeakageReport, analyze_leakage};
pub use region::Cube;
pub use shielding::{
    DEFAULT_DAMPING, ShieldingApplicator, ShieldingRegion, apply_shielding, validate_damping,
};
pub use source::{CurrentSource, InitialCondition};
