//! File formats for emleak.
//!
//! - [`RunSpec`]: a JSON document describing one simulation run
//! - [`Snapshot`]: a JSON checkpoint of every field buffer in a volume

pub mod error;
pub mod schema;
pub mod snapshot;

pub use error::{FormatError, Result};
pub use schema::{
    FORMAT_VERSION, GridSpec, RunSpec, ShieldingSpec, export_run_spec, load_run_spec,
    save_run_spec,
};
pub use snapshot::{Snapshot, load_snapshot, save_snapshot};
