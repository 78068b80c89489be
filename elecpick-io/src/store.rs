//! Per-device JSON annotation records.
//!
//! Each device is stored as `<dir>/<device>.json`:
//!
//! ```json
//! {"device": "grid1", "elecmatrix": [[x, y, z], ...]}
//! ```
//!
//! Writes go to a sibling `.json.tmp` file that is renamed over the record,
//! so a crash never leaves a half-written file behind.
//!
//! A device with no JSON record but a legacy `<device>.mat` file is
//! imported from that file's `elecmatrix`; the next save writes JSON.
//!
//! Device names are case-sensitive but record files may not be, so a name
//! that matches an existing record only up to letter case is rejected.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use elecpick_core::{validate_device_name, AnnotationStore};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::matfile::read_elecmatrix;

/// On-disk body of a device record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub device: String,
    /// Surface RAS coordinates in electrode order.
    pub elecmatrix: Vec<[f64; 3]>,
}

/// [`AnnotationStore`] writing one JSON file per device.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Store records under `dir`. The directory is created on first save.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Store records in the annotation directory of a subject.
    #[must_use]
    pub fn for_subject(subject_dir: &Path, config: &LoaderConfig) -> Self {
        Self::new(config.annotation_path(subject_dir))
    }

    /// Directory holding the records.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record path for `device`.
    ///
    /// # Errors
    /// Returns a core error if the name cannot be used as a file stem, or
    /// [`Error::NameCollision`] if another record differs only in case.
    pub fn record_path(&self, device: &str) -> Result<PathBuf> {
        let name = validate_device_name(device)?;
        let file = format!("{name}.json");
        if let Ok(entries) = fs::read_dir(&self.dir) {
            for entry in entries.flatten() {
                let existing = entry.file_name();
                let Some(existing) = existing.to_str() else {
                    continue;
                };
                if existing != file && existing.eq_ignore_ascii_case(&file) {
                    return Err(Error::NameCollision {
                        device: name.to_string(),
                        existing: entry.path(),
                    });
                }
            }
        }
        Ok(self.dir.join(file))
    }

    /// Read the record for `device`, if it exists.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read(&self, device: &str) -> Result<Option<DeviceRecord>> {
        let path = self.record_path(device)?;
        if !path.is_file() {
            let legacy = path.with_extension("mat");
            if !legacy.is_file() {
                return Ok(None);
            }
            info!("Importing {} from {}", device.trim(), legacy.display());
            return Ok(Some(DeviceRecord {
                device: device.trim().to_string(),
                elecmatrix: read_elecmatrix(&legacy)?,
            }));
        }
        let reader = BufReader::new(File::open(&path)?);
        let record: DeviceRecord = serde_json::from_reader(reader)?;
        if record.device != device.trim() {
            warn!(
                "{} names device {:?}, expected {device:?}",
                path.display(),
                record.device
            );
        }
        Ok(Some(record))
    }

    /// Atomically replace the record for `device`.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be written.
    pub fn write(&self, device: &str, points: &[[f64; 3]]) -> Result<()> {
        let path = self.record_path(device)?;
        fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");

        let record = DeviceRecord {
            device: device.trim().to_string(),
            elecmatrix: points.to_vec(),
        };
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut writer, &record)?;
        writer.flush()?;
        drop(writer);
        fs::rename(&tmp, &path)?;

        debug!("Wrote {} point(s) to {}", points.len(), path.display());
        Ok(())
    }
}

impl AnnotationStore for JsonFileStore {
    fn load(&self, device: &str) -> elecpick_core::Result<Option<Vec<[f64; 3]>>> {
        Ok(self.read(device)?.map(|r| r.elecmatrix))
    }

    fn save(&mut self, device: &str, points: &[[f64; 3]]) -> elecpick_core::Result<()> {
        Ok(self.write(device, points)?)
    }
}
