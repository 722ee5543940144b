use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A known meter. The link only ever consumes the address; everything
/// else is display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub location: String,
}

impl DeviceRecord {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            address: address.into(),
            location: location.into(),
        }
    }
}

/// Known devices persisted as a JSON array on disk. A missing file reads
/// as an empty registry; the file is created on first write.
pub struct DeviceRegistry {
    path: PathBuf,
}

impl DeviceRegistry {
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// All known devices in insertion order.
    pub fn list(&self) -> Result<Vec<DeviceRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn add(&self, record: DeviceRecord) -> Result<()> {
        let mut devices = self.list()?;
        devices.push(record);
        self.save(&devices)
    }

    pub fn update(&self, record: DeviceRecord) -> Result<()> {
        let mut devices = self.list()?;
        let Some(existing) = devices.iter_mut().find(|d| d.id == record.id) else {
            return Err(AppError::UnknownDevice(record.id.to_string()));
        };
        *existing = record;
        self.save(&devices)
    }

    pub fn remove(&self, id: Uuid) -> Result<()> {
        let mut devices = self.list()?;
        let before = devices.len();
        devices.retain(|d| d.id != id);
        if devices.len() == before {
            return Err(AppError::UnknownDevice(id.to_string()));
        }
        self.save(&devices)
    }

    fn save(&self, devices: &[DeviceRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(devices)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
