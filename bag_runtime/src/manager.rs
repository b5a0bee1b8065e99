//! The storage device registry. Cross-device operations live here: moving
//! an object between devices with rollback, bulk snapshot and restore, and
//! the property peek/poke surface scripts use across device boundaries.

use bag_script::VariableStore;
use log::{debug, warn};

use crate::effect::Effect;
use crate::error::RuntimeError;
use crate::object::BagObject;
use crate::save::ObjectRecord;
use crate::storage::StorageDevice;

#[derive(Default)]
pub struct StorageDevManager {
    devices: Vec<StorageDevice>,
}

impl StorageDevManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StorageDevice> {
        self.devices.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut StorageDevice> {
        self.devices.iter_mut()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.devices.iter().any(|d| d.name() == name)
    }

    pub fn device(&self, name: &str) -> Option<&StorageDevice> {
        self.devices.iter().find(|d| d.name() == name)
    }

    pub fn device_mut(&mut self, name: &str) -> Option<&mut StorageDevice> {
        self.devices.iter_mut().find(|d| d.name() == name)
    }

    pub fn device_at(&self, index: usize) -> Option<&StorageDevice> {
        self.devices.get(index)
    }

    /// First device holding an object of this name, in registration order.
    pub fn device_containing(&self, object: &str) -> Option<&StorageDevice> {
        self.devices.iter().find(|d| d.contains_object(object))
    }

    pub fn register(&mut self, device: StorageDevice) {
        if self.contains(device.name()) {
            warn!("storage device '{}' re-registered, replacing", device.name());
            self.unregister(device.name());
        }
        self.devices.push(device);
    }

    /// Drop a device. A foreign object list is handed back out to the
    /// caller rather than released with the device.
    pub fn unregister(&mut self, name: &str) -> Option<Vec<BagObject>> {
        let at = self.devices.iter().position(|d| d.name() == name)?;
        let mut device = self.devices.remove(at);
        let foreign = device.take_foreign_list();
        device.release_objects();
        foreign
    }

    fn require_mut(&mut self, name: &str) -> Result<&mut StorageDevice, RuntimeError> {
        self.devices
            .iter_mut()
            .find(|d| d.name() == name)
            .ok_or_else(|| RuntimeError::DeviceNotFound(name.to_string()))
    }

    /// Activate `object` in `dst`. The single-device half of a transfer.
    pub fn add_object(
        &mut self,
        dst: &str,
        object: &str,
        vars: &VariableStore,
    ) -> Result<(), RuntimeError> {
        self.require_mut(dst)?.activate_local_object(object, vars)
    }

    /// Deactivate `object` in `src`; returns host effects owed.
    pub fn remove_object(&mut self, src: &str, object: &str) -> Result<Vec<Effect>, RuntimeError> {
        self.require_mut(src)?.deactivate_local_object(object)
    }

    /// Transfer: activate in the destination, then deactivate in the
    /// source. A source failure rolls the destination back so the object
    /// is never live in both devices.
    pub fn move_object(
        &mut self,
        dst: &str,
        src: &str,
        object: &str,
        vars: &VariableStore,
    ) -> Result<Vec<Effect>, RuntimeError> {
        if !self.contains(src) {
            return Err(RuntimeError::DeviceNotFound(src.to_string()));
        }
        self.require_mut(dst)?.activate_local_object(object, vars)?;
        match self.remove_object(src, object) {
            Ok(effects) => Ok(effects),
            Err(err) => {
                debug!("move '{object}' {src}->{dst} failed at source, rolling back");
                if let Ok(device) = self.require_mut(dst) {
                    // Rollback effects are dropped: the activation that is
                    // being undone has not reached the hosts yet.
                    let _ = device.deactivate_local_object(object);
                }
                Err(err)
            }
        }
    }

    /// Snapshot every named object across every device. Anonymous objects
    /// have no stable key and are skipped.
    pub fn save_object_list(&self) -> Vec<ObjectRecord> {
        let mut records = Vec::new();
        for device in &self.devices {
            for object in device.objects() {
                if object.name().is_empty() {
                    continue;
                }
                records.push(ObjectRecord::capture(device.name(), object));
            }
        }
        records
    }

    /// Apply a snapshot. Records addressing devices or objects not
    /// currently loaded are tolerated and skipped.
    pub fn restore_object_list(&mut self, records: &[ObjectRecord]) {
        for record in records {
            if !record.used {
                continue;
            }
            let Some(device) = self.device_mut(&record.sdev) else {
                continue;
            };
            if let Some(object) = device.object_mut(&record.object) {
                record.apply(object);
            }
        }
    }

    /// Cross-device property peek: `STATE`, `PAGE`, and the flag names the
    /// scripts poke.
    pub fn object_value(&self, sdev: &str, object: &str, property: &str) -> Option<i32> {
        let obj = self.device(sdev)?.object(object)?;
        match property {
            "STATE" => Some(obj.state()),
            "PAGE" => Some(obj.float_page() as i32),
            "VISIBLE" => Some(obj.is_visible() as i32),
            "ACTIVE" => Some(obj.is_active() as i32),
            "ATTACHED" => Some(obj.is_attached() as i32),
            "MSGWAITING" => Some(obj.is_msg_waiting() as i32),
            _ => None,
        }
    }

    /// Cross-device property poke; unknown properties report a not-found
    /// style error so script typos surface in the log.
    pub fn set_object_value(
        &mut self,
        sdev: &str,
        object: &str,
        property: &str,
        value: i32,
    ) -> Result<(), RuntimeError> {
        let device = self.require_mut(sdev)?;
        let obj = device
            .object_mut(object)
            .ok_or_else(|| RuntimeError::ObjectNotFound {
                device: sdev.to_string(),
                object: object.to_string(),
            })?;
        match property {
            "STATE" => obj.set_state(value),
            "VISIBLE" => obj.set_visible(value != 0),
            "ACTIVE" => obj.set_active(value != 0),
            "MSGWAITING" => obj.set_msg_waiting(value != 0),
            _ => {
                return Err(RuntimeError::ObjectNotFound {
                    device: sdev.to_string(),
                    object: format!("{object}.{property}"),
                })
            }
        }
        obj.set_dirty(true);
        Ok(())
    }
}
