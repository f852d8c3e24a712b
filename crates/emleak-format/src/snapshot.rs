//! Field checkpoints.
//!
//! Buffers are stored flat in the volume's storage order, `k` fastest.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use emleak_em::{Field, FieldVolume};
use serde::{Deserialize, Serialize};

use crate::error::{FormatError, Result};
use crate::schema::FORMAT_VERSION;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: String,
    pub extent: usize,
    /// Steps executed when the snapshot was taken.
    pub step: usize,
    pub electric: Vec<f64>,
    pub magnetic: Vec<f64>,
    pub current_density: Vec<f64>,
}

impl Snapshot {
    pub fn capture(volume: &FieldVolume, step: usize) -> Self {
        let buffer = |field| volume.grid(field).as_slice().to_vec();
        Self {
            version: FORMAT_VERSION.to_string(),
            extent: volume.extent(),
            step,
            electric: buffer(Field::Electric),
            magnetic: buffer(Field::Magnetic),
            current_density: buffer(Field::CurrentDensity),
        }
    }

    /// Rebuild the volume; every buffer must hold exactly `extent³` values.
    pub fn into_volume(self) -> Result<FieldVolume> {
        if self.version != FORMAT_VERSION {
            return Err(FormatError::InvalidFormat(format!(
                "unsupported snapshot version {:?}",
                self.version
            )));
        }
        Ok(FieldVolume::from_parts(
            self.extent,
            self.electric,
            self.magnetic,
            self.current_density,
        )?)
    }
}

pub fn save_snapshot(path: impl AsRef<Path>, snapshot: &Snapshot) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, snapshot)?;
    writer.flush()?;
    Ok(())
}

pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Snapshot> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emleak_em::{ConfigError, EmError, FieldUpdater, InitialCondition};

    fn evolved() -> FieldVolume {
        let mut volume = FieldVolume::new(6).unwrap();
        InitialCondition::Noise {
            amplitude: 0.5,
            seed: 11,
        }
        .apply(&mut volume)
        .unwrap();
        volume.set_current_density(2, 2, 2, 0.25).unwrap();
        let updater = FieldUpdater::sequential();
        for _ in 0..3 {
            updater.step(&mut volume, 1e-3, 1.0);
        }
        volume
    }

    #[test]
    fn test_restore_reproduces_volume() {
        let volume = evolved();
        let snapshot = Snapshot::capture(&volume, 3);
        assert_eq!(snapshot.extent, 6);
        assert_eq!(snapshot.electric.len(), 216);

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.step, 3);
        assert_eq!(parsed.into_volume().unwrap(), volume);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let mut snapshot = Snapshot::capture(&evolved(), 0);
        snapshot.magnetic.pop();
        assert!(matches!(
            snapshot.into_volume(),
            Err(FormatError::Field(EmError::ShapeMismatch {
                field: "magnetic",
                expected: 216,
                actual: 215
            }))
        ));
    }

    #[test]
    fn test_unaddressable_extent_rejected() {
        let json = r#"{
            "version": "1",
            "extent": 4194304,
            "step": 0,
            "electric": [],
            "magnetic": [],
            "current_density": []
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        let err = snapshot.into_volume().unwrap_err();
        assert!(matches!(
            err,
            FormatError::Field(EmError::Configuration(ConfigError::GridTooLarge(4194304)))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let volume = evolved();
        let path =
            std::env::temp_dir().join(format!("emleak-snapshot-{}.json", std::process::id()));
        save_snapshot(&path, &Snapshot::capture(&volume, 3)).unwrap();
        let loaded = load_snapshot(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.into_volume().unwrap(), volume);
    }
}
