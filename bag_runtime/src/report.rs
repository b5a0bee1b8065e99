//! JSON-friendly snapshot of a running session, for the CLI and for
//! golden-file style assertions in integration tests.

use serde::Serialize;

use crate::object::BagObject;
use crate::runtime::BagRuntime;
use crate::storage::StorageDevice;

#[derive(Debug, Serialize)]
pub struct ObjectReport {
    pub name: String,
    pub kind: String,
    pub file: String,
    pub state: i32,
    pub active: bool,
    pub attached: bool,
    pub visible: bool,
    pub local: bool,
    pub immediate_run: bool,
    pub float_page: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<[i32; 2]>,
}

impl ObjectReport {
    fn capture(object: &BagObject) -> Self {
        Self {
            name: object.name().to_string(),
            kind: object.kind.tag().to_string(),
            file: object.file_name().to_string(),
            state: object.state(),
            active: object.is_active(),
            attached: object.is_attached(),
            visible: object.is_visible(),
            local: object.is_local(),
            immediate_run: object.is_immediate_run(),
            float_page: object.float_page(),
            position: object.position().map(|p| [p.x, p.y]),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeviceReport {
    pub name: String,
    pub background: String,
    pub disk_id: i32,
    pub closeup: bool,
    pub float_pages: usize,
    pub objects: Vec<ObjectReport>,
}

impl DeviceReport {
    fn capture(device: &StorageDevice) -> Self {
        Self {
            name: device.name().to_string(),
            background: device.background().to_string(),
            disk_id: device.disk_id(),
            closeup: device.is_closeup(),
            float_pages: device.float_pages(),
            objects: device.objects().iter().map(ObjectReport::capture).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VariableReport {
    pub name: String,
    pub value: String,
    pub global: bool,
    pub timer: bool,
    pub random: bool,
    pub constant: bool,
}

#[derive(Debug, Serialize)]
pub struct RuntimeReport {
    pub current_sdev: Option<String>,
    pub turn_count: i64,
    pub pda_mode: String,
    pub pda_position: String,
    pub devices: Vec<DeviceReport>,
    pub variables: Vec<VariableReport>,
}

impl RuntimeReport {
    pub fn capture(runtime: &BagRuntime) -> Self {
        Self {
            current_sdev: runtime.current_sdev().map(str::to_string),
            turn_count: runtime.vars.turn_count(),
            pda_mode: runtime.pda.mode().as_str().to_string(),
            pda_position: runtime.pda.pos().as_str().to_string(),
            devices: runtime.manager.iter().map(DeviceReport::capture).collect(),
            variables: runtime
                .vars
                .iter()
                .map(|v| VariableReport {
                    name: v.name().to_string(),
                    value: v.value().to_string(),
                    global: v.is_global(),
                    timer: v.is_timer(),
                    random: v.is_random(),
                    constant: v.is_constant(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::host::Hosts;

    use super::*;

    #[test]
    fn report_captures_devices_and_variables() {
        let mut runtime = BagRuntime::with_seed(Hosts::default(), 9);
        runtime
            .load_world("BAR_WLD", "{ BKG = BAR.BMP; BMP A = A.BMP POS [1,2]; }", true)
            .expect("load");

        let report = RuntimeReport::capture(&runtime);
        assert_eq!(report.current_sdev.as_deref(), Some("BAR_WLD"));
        assert_eq!(report.devices.len(), 1);
        let device = &report.devices[0];
        assert_eq!(device.background, "BAR.BMP");
        assert_eq!(device.objects[0].position, Some([1, 2]));

        let json = serde_json::to_string_pretty(&report).expect("serialize");
        assert!(json.contains("\"BAR_WLD\""));
        assert!(json.contains("\"TURNCOUNT\""));
    }
}
