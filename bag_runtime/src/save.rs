//! Flat per-object snapshot records. State travels as `(sdev, object)`
//! keyed rows so a snapshot survives worlds being loaded and unloaded
//! around it; records for absent devices are simply carried, not applied.

use serde::{Deserialize, Serialize};

use crate::object::BagObject;

pub const PROP_VISIBLE: u32 = 1 << 0;
pub const PROP_ACTIVE: u32 = 1 << 1;
pub const PROP_LOCAL: u32 = 1 << 2;
pub const PROP_ATTACHED: u32 = 1 << 3;
pub const PROP_IMMEDIATE_RUN: u32 = 1 << 4;
pub const PROP_NEGATIVE: u32 = 1 << 5;
pub const PROP_MODAL: u32 = 1 << 6;
pub const PROP_MSG_WAITING: u32 = 1 << 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub object: String,
    pub sdev: String,
    pub state: i32,
    pub properties: u32,
    pub kind: String,
    pub used: bool,
}

impl ObjectRecord {
    pub fn capture(sdev: &str, object: &BagObject) -> Self {
        Self {
            object: object.name().to_string(),
            sdev: sdev.to_string(),
            state: object.state(),
            properties: pack_properties(object),
            kind: object.kind.tag().to_string(),
            used: true,
        }
    }

    pub fn apply(&self, object: &mut BagObject) {
        object.set_state(self.state);
        apply_properties(object, self.properties);
    }
}

pub fn pack_properties(object: &BagObject) -> u32 {
    let mut word = 0;
    if object.is_visible() {
        word |= PROP_VISIBLE;
    }
    if object.is_active() {
        word |= PROP_ACTIVE;
    }
    if object.is_local() {
        word |= PROP_LOCAL;
    }
    if object.is_attached() {
        word |= PROP_ATTACHED;
    }
    if object.is_immediate_run() {
        word |= PROP_IMMEDIATE_RUN;
    }
    if object.is_negative() {
        word |= PROP_NEGATIVE;
    }
    if object.is_modal() {
        word |= PROP_MODAL;
    }
    if object.is_msg_waiting() {
        word |= PROP_MSG_WAITING;
    }
    word
}

pub fn apply_properties(object: &mut BagObject, word: u32) {
    object.set_visible(word & PROP_VISIBLE != 0);
    object.set_active(word & PROP_ACTIVE != 0);
    object.set_local(word & PROP_LOCAL != 0);
    if word & PROP_ATTACHED != 0 {
        if !object.is_attached() {
            object.attach();
        }
    } else if object.is_attached() {
        object.detach();
    }
    object.set_immediate_run(word & PROP_IMMEDIATE_RUN != 0);
    object.set_negative(word & PROP_NEGATIVE != 0);
    object.set_modal(word & PROP_MODAL != 0);
    object.set_msg_waiting(word & PROP_MSG_WAITING != 0);
}

#[cfg(test)]
mod tests {
    use crate::object::visual::BitmapObject;
    use crate::object::ObjectKind;

    use super::*;

    #[test]
    fn properties_round_trip_through_the_flag_word() {
        let mut object = BagObject::new(ObjectKind::Bitmap(BitmapObject));
        object.set_name("POSTER");
        object.set_active(true);
        object.set_local(true);
        object.attach();
        object.set_msg_waiting(true);
        object.set_state(3);

        let record = ObjectRecord::capture("BAR", &object);
        assert_eq!(record.kind, "BMP");
        assert!(record.properties & PROP_ACTIVE != 0);
        assert!(record.properties & PROP_MSG_WAITING != 0);
        assert!(record.properties & PROP_NEGATIVE == 0);

        let mut fresh = BagObject::new(ObjectKind::Bitmap(BitmapObject));
        fresh.set_name("POSTER");
        record.apply(&mut fresh);
        assert!(fresh.is_active());
        assert!(fresh.is_local());
        assert!(fresh.is_attached());
        assert!(fresh.is_msg_waiting());
        assert_eq!(fresh.state(), 3);
    }

    #[test]
    fn records_serialize_as_json_rows() {
        let mut object = BagObject::new(ObjectKind::Bitmap(BitmapObject));
        object.set_name("POSTER");
        let record = ObjectRecord::capture("BAR", &object);
        let json = serde_json::to_string(&record).expect("serialize");
        let back: ObjectRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, record);
    }
}
