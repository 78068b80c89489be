//! Named devices and their annotated electrode positions.
//!
//! Every mutation is written through to an [`AnnotationStore`] before the
//! call returns. If the store rejects a write the in-memory change is rolled
//! back, so memory and storage never disagree.

use std::collections::HashMap;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::transform::VoxelTransform;

/// Persistence collaborator keyed by device name.
pub trait AnnotationStore {
    /// Load the persisted point list for `device`, if one exists.
    ///
    /// # Errors
    /// Returns an error if a record exists but cannot be read.
    fn load(&self, device: &str) -> Result<Option<Vec<[f64; 3]>>>;

    /// Replace the persisted point list for `device`.
    ///
    /// # Errors
    /// Returns an error if the record cannot be written.
    fn save(&mut self, device: &str, points: &[[f64; 3]]) -> Result<()>;
}

/// In-memory store for tests and headless sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<String, Vec<[f64; 3]>>,
    writes: usize,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, as if persisted by an earlier session.
    #[must_use]
    pub fn with_record(mut self, device: &str, points: Vec<[f64; 3]>) -> Self {
        self.records.insert(device.to_string(), points);
        self
    }

    /// Current record for `device`.
    #[must_use]
    pub fn record(&self, device: &str) -> Option<&[[f64; 3]]> {
        self.records.get(device).map(Vec::as_slice)
    }

    /// Number of `save` calls so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl AnnotationStore for MemoryStore {
    fn load(&self, device: &str) -> Result<Option<Vec<[f64; 3]>>> {
        Ok(self.records.get(device).cloned())
    }

    fn save(&mut self, device: &str, points: &[[f64; 3]]) -> Result<()> {
        self.records.insert(device.to_string(), points.to_vec());
        self.writes += 1;
        Ok(())
    }
}

/// Index of a device in registration order.
pub type DeviceId = usize;

/// One annotated electrode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationPoint {
    /// Surface RAS position.
    pub anatomical: [f64; 3],
    /// Voxel the overlay marker is centred on.
    pub voxel: [i64; 3],
    /// Session-wide stamp order.
    pub seq: u64,
}

/// A named group of electrodes (grid, strip or depth).
#[derive(Debug, Clone)]
pub struct Device {
    name: String,
    index: DeviceId,
    points: Vec<AnnotationPoint>,
}

impl Device {
    /// Device name as entered by the user.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registration index; also the overlay tag and palette slot.
    #[must_use]
    pub fn index(&self) -> DeviceId {
        self.index
    }

    /// Annotated points in electrode order.
    #[must_use]
    pub fn points(&self) -> &[AnnotationPoint] {
        &self.points
    }

    /// Number of annotated points.
    #[must_use]
    pub fn count(&self) -> usize {
        self.points.len()
    }

    fn anatomical(&self) -> Vec<[f64; 3]> {
        self.points.iter().map(|p| p.anatomical).collect()
    }
}

/// Check that a device name is usable as a record key.
///
/// # Errors
/// Returns [`Error::InvalidDeviceName`] for blank names or names containing
/// path separators or control characters.
pub fn validate_device_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    let bad_char = |c: char| c == '/' || c == '\\' || c.is_control();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." || trimmed.contains(bad_char) {
        return Err(Error::InvalidDeviceName(name.to_string()));
    }
    Ok(trimmed)
}

/// Device table backed by an [`AnnotationStore`].
#[derive(Debug)]
pub struct AnnotationRegistry<S> {
    devices: Vec<Device>,
    store: S,
    next_seq: u64,
}

impl<S: AnnotationStore> AnnotationRegistry<S> {
    /// Create an empty registry over `store`.
    pub fn new(store: S) -> Self {
        Self {
            devices: Vec::new(),
            store,
            next_seq: 0,
        }
    }

    /// Borrow the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Devices in registration order.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Look up a device by id.
    ///
    /// # Errors
    /// Returns [`Error::UnknownDevice`] for ids not issued by this registry.
    pub fn device(&self, id: DeviceId) -> Result<&Device> {
        self.devices.get(id).ok_or(Error::UnknownDevice(id))
    }

    /// Resolve `name` to a device id, registering it if unseen.
    ///
    /// New devices get the next index in registration order; existing
    /// devices keep theirs.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDeviceName`] if `name` fails validation.
    pub fn select_device(&mut self, name: &str) -> Result<DeviceId> {
        let name = validate_device_name(name)?;
        if let Some(device) = self.devices.iter().find(|d| d.name == name) {
            return Ok(device.index);
        }
        let index = self.devices.len();
        self.devices.push(Device {
            name: name.to_string(),
            index,
            points: Vec::new(),
        });
        info!("Registered device {name:?} as #{index}");
        Ok(index)
    }

    /// Load a previously persisted point list into an empty device.
    ///
    /// Points are mapped back to voxels with `transform` so their overlay
    /// markers can be redrawn. Nothing is written back to the store. Returns
    /// the number of points loaded (zero if the device already has points or
    /// no record exists).
    ///
    /// # Errors
    /// Returns [`Error::UnknownDevice`] or a storage error.
    pub fn load_existing(&mut self, id: DeviceId, transform: &VoxelTransform) -> Result<usize> {
        let device = self.devices.get(id).ok_or(Error::UnknownDevice(id))?;
        if !device.points.is_empty() {
            return Ok(0);
        }
        let Some(record) = self.store.load(&device.name)? else {
            return Ok(0);
        };

        let mut points = Vec::with_capacity(record.len());
        for anatomical in record {
            let voxel = transform.to_voxel(anatomical).map(round_voxel);
            points.push(AnnotationPoint {
                anatomical,
                voxel,
                seq: self.next_seq,
            });
            self.next_seq += 1;
        }
        let loaded = points.len();
        let device = &mut self.devices[id];
        device.points = points;
        info!("Loaded {loaded} electrode(s) for {:?}", device.name);
        Ok(loaded)
    }

    /// Append a point to a device and persist the device's full list.
    ///
    /// Returns the 0-based electrode number of the new point.
    ///
    /// # Errors
    /// Returns [`Error::UnknownDevice`] or the store's error; on a store
    /// error the point is not kept.
    pub fn add(&mut self, id: DeviceId, anatomical: [f64; 3], voxel: [i64; 3]) -> Result<usize> {
        let device = self.devices.get_mut(id).ok_or(Error::UnknownDevice(id))?;
        device.points.push(AnnotationPoint {
            anatomical,
            voxel,
            seq: self.next_seq,
        });
        let points = device.anatomical();
        if let Err(e) = self.store.save(&device.name, &points) {
            device.points.pop();
            return Err(e);
        }
        self.next_seq += 1;
        debug!("{} e{} persisted", device.name, points.len() - 1);
        Ok(points.len() - 1)
    }

    /// Remove and return a device's most recent point, persisting the
    /// shortened list.
    ///
    /// # Errors
    /// Returns [`Error::NoAnnotationToRemove`] if the device is empty, or the
    /// store's error (the point is then restored).
    pub fn remove_last(&mut self, id: DeviceId) -> Result<AnnotationPoint> {
        let device = self.devices.get_mut(id).ok_or(Error::UnknownDevice(id))?;
        let point = device.points.pop().ok_or(Error::NoAnnotationToRemove)?;
        let points = device.anatomical();
        if let Err(e) = self.store.save(&device.name, &points) {
            device.points.push(point);
            return Err(e);
        }
        debug!("{} e{} removed", device.name, points.len());
        Ok(point)
    }

    /// Overlay stamps of every point, oldest first, as `(voxel, tag)`.
    pub fn stamps(&self) -> Vec<([i64; 3], f32)> {
        let mut all: Vec<(u64, [i64; 3], f32)> = self
            .devices
            .iter()
            .flat_map(|d| d.points.iter().map(move |p| (p.seq, p.voxel, device_tag(d.index))))
            .collect();
        all.sort_by_key(|(seq, _, _)| *seq);
        all.into_iter().map(|(_, voxel, tag)| (voxel, tag)).collect()
    }
}

/// Overlay value used for a device's markers.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn device_tag(index: DeviceId) -> f32 {
    index as f32
}

/// Round a fractional voxel coordinate to the nearest voxel index.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn round_voxel(v: f64) -> i64 {
    v.round() as i64
}
