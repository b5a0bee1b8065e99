//! Storage devices: named, ordered containers of scriptable objects. A
//! device owns its object list unless the list was moved in from another
//! owner (the foreign-list case), owns the expression arena its objects'
//! gates index into, and carries the pass re-entrancy state.

use bag_script::{evaluate, Expression, Point, Size, VariableStore};
use log::debug;

use crate::effect::Effect;
use crate::error::RuntimeError;
use crate::host::Renderer;
use crate::object::BagObject;

pub const DEFAULT_BACKGROUND_WIDTH: i32 = 640;
pub const DEFAULT_BACKGROUND_HEIGHT: i32 = 480;

/// Re-entrancy state of the activation pass. An action that triggers
/// another pass on the same device while one is running is skipped, not
/// queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassState {
    #[default]
    Idle,
    Evaluating,
}

pub struct StorageDevice {
    name: String,
    disk_id: i32,
    help_file: String,
    background: String,
    background_size: Size,
    objects: Vec<BagObject>,
    pub expressions: Vec<Expression>,
    foreign_list: bool,
    closeup: bool,
    cic: bool,
    contains_modal: bool,
    first_paint: bool,
    float_pages: usize,
    pub pass_state: PassState,
}

impl StorageDevice {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            disk_id: 0,
            help_file: String::new(),
            background: String::new(),
            background_size: Size::new(DEFAULT_BACKGROUND_WIDTH, DEFAULT_BACKGROUND_HEIGHT),
            objects: Vec::new(),
            expressions: Vec::new(),
            foreign_list: false,
            closeup: false,
            cic: false,
            contains_modal: false,
            first_paint: true,
            float_pages: 0,
            pass_state: PassState::Idle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn disk_id(&self) -> i32 {
        self.disk_id
    }

    pub fn set_disk_id(&mut self, disk_id: i32) {
        self.disk_id = disk_id;
    }

    pub fn help_file(&self) -> &str {
        &self.help_file
    }

    pub fn set_help_file(&mut self, file: impl Into<String>) {
        self.help_file = file.into();
    }

    pub fn background(&self) -> &str {
        &self.background
    }

    pub fn set_background(&mut self, file: impl Into<String>) {
        self.background = file.into();
    }

    pub fn background_size(&self) -> Size {
        self.background_size
    }

    pub fn set_background_size(&mut self, size: Size) {
        self.background_size = size;
    }

    pub fn is_closeup(&self) -> bool {
        self.closeup
    }

    pub fn set_closeup(&mut self, closeup: bool) {
        self.closeup = closeup;
    }

    /// Character-in-closeup devices suppress the PDA surfacing rules.
    pub fn is_cic(&self) -> bool {
        self.cic
    }

    pub fn set_cic(&mut self, cic: bool) {
        self.cic = cic;
    }

    pub fn contains_modal(&self) -> bool {
        self.contains_modal
    }

    pub fn set_contains_modal(&mut self, modal: bool) {
        self.contains_modal = modal;
    }

    /// Re-derive the modal flag from what is actually attached. The parser
    /// seeds it; every pass settles it here.
    pub fn refresh_contains_modal(&mut self) {
        self.contains_modal = self.objects.iter().any(|o| o.is_attached() && o.is_modal());
    }

    /// True until the device has painted once. RUN-declared objects hold
    /// their immediate action until the player has actually seen the scene.
    pub fn awaiting_first_paint(&self) -> bool {
        self.first_paint
    }

    pub fn mark_painted(&mut self) {
        self.first_paint = false;
    }

    pub fn float_pages(&self) -> usize {
        self.float_pages
    }

    pub fn objects(&self) -> &[BagObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut Vec<BagObject> {
        &mut self.objects
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn object(&self, name: &str) -> Option<&BagObject> {
        self.objects.iter().find(|o| o.name() == name)
    }

    pub fn object_mut(&mut self, name: &str) -> Option<&mut BagObject> {
        self.objects.iter_mut().find(|o| o.name() == name)
    }

    pub fn contains_object(&self, name: &str) -> bool {
        self.object(name).is_some()
    }

    /// Topmost object under `point`. Painting goes front-of-list first, so
    /// the hit test walks back to front. Detached objects are never hit;
    /// `active_only` additionally requires the active flag.
    pub fn object_at(&self, point: Point, active_only: bool) -> Option<&BagObject> {
        self.objects
            .iter()
            .rev()
            .find(|o| o.is_attached() && (!active_only || o.is_active()) && o.is_inside(point))
    }

    pub fn add_object(&mut self, object: BagObject) {
        self.objects.push(object);
    }

    /// Remove one object by name, returning it. A foreign list is not ours
    /// to shrink, so removal under one is a no-op.
    pub fn remove_object(&mut self, name: &str) -> Option<BagObject> {
        if self.foreign_list {
            debug!("{}: remove '{}' skipped, object list is foreign", self.name, name);
            return None;
        }
        let at = self.objects.iter().position(|o| o.name() == name)?;
        Some(self.objects.remove(at))
    }

    /// Drop every owned object. Under a foreign list this is a no-op; the
    /// manager hands the list back to its owner instead.
    pub fn release_objects(&mut self) {
        if self.foreign_list {
            return;
        }
        self.objects.clear();
    }

    pub fn has_foreign_list(&self) -> bool {
        self.foreign_list
    }

    /// Adopt a list owned elsewhere (inventory shown inside another scene).
    pub fn set_foreign_list(&mut self, objects: Vec<BagObject>) {
        self.objects = objects;
        self.foreign_list = true;
    }

    /// Hand a foreign list back out, restoring an empty owned list.
    pub fn take_foreign_list(&mut self) -> Option<Vec<BagObject>> {
        if !self.foreign_list {
            return None;
        }
        self.foreign_list = false;
        Some(std::mem::take(&mut self.objects))
    }

    /// Flag-level activation primitive. The gating expression is consulted
    /// before the object is touched; a gated-off object still becomes
    /// active so the next pass re-decides attachment.
    pub fn activate_local_object(
        &mut self,
        name: &str,
        vars: &VariableStore,
    ) -> Result<(), RuntimeError> {
        let gate = match self.object(name) {
            Some(object) => match object.expression() {
                Some(id) => {
                    evaluate(&self.expressions, id, vars, object.is_negative())
                }
                None => true,
            },
            None => {
                return Err(RuntimeError::ObjectNotFound {
                    device: self.name.clone(),
                    object: name.to_string(),
                })
            }
        };
        let object = self
            .object_mut(name)
            .ok_or_else(|| RuntimeError::ObjectNotFound {
                device: String::new(),
                object: name.to_string(),
            })?;
        object.set_local(true);
        object.set_active(true);
        if gate && !object.is_attached() {
            object.attach();
            // A held declaration carries its immediate action; attaching
            // here arms it for the next pass.
            if object.is_immediate_run() {
                object.set_pending_run(true);
            }
        }
        Ok(())
    }

    /// Flag-level deactivation primitive; returns the detach effects owed
    /// to the hosts (a playing sound is stopped).
    pub fn deactivate_local_object(&mut self, name: &str) -> Result<Vec<Effect>, RuntimeError> {
        let device = self.name.clone();
        let object = self
            .object_mut(name)
            .ok_or_else(|| RuntimeError::ObjectNotFound {
                device,
                object: name.to_string(),
            })?;
        object.set_active(false);
        let mut effects = Vec::new();
        if object.is_attached() {
            effects = object.detach_effects();
            object.detach();
        }
        Ok(effects)
    }

    /// One object's share of the activation pass: gate the object at
    /// `index`, flip its flags, and report whether its action should run
    /// now plus any detach effects owed. An attached object that fails the
    /// local-and-gate check is torn down. `sound_playing` exempts a live
    /// sound from teardown; `painted` arms immediate-run actions.
    pub(crate) fn pass_step(
        &mut self,
        index: usize,
        vars: &VariableStore,
        sound_playing: bool,
        painted: bool,
    ) -> (bool, Vec<Effect>) {
        let gate = {
            let object = &self.objects[index];
            object.is_local()
                && match object.expression() {
                    Some(id) => evaluate(&self.expressions, id, vars, object.is_negative()),
                    None => true,
                }
        };
        let object = &mut self.objects[index];
        if gate {
            object.set_active(true);
            if !object.is_attached() {
                object.attach();
                if object.is_immediate_run() {
                    if painted {
                        return (true, Vec::new());
                    }
                    // Fires on the first pass after the device paints.
                    object.set_pending_run(true);
                }
                return (false, Vec::new());
            }
            if painted && object.is_pending_run() {
                object.set_pending_run(false);
                return (true, Vec::new());
            }
            (false, Vec::new())
        } else if object.is_attached() {
            if sound_playing {
                (false, Vec::new())
            } else {
                let effects = object.detach_effects();
                object.detach();
                object.set_active(false);
                (false, effects)
            }
        } else {
            object.set_active(false);
            (false, Vec::new())
        }
    }

    /// Detach everything attached, marking dirty; effects owed to the hosts
    /// come back for the runtime to execute.
    pub fn detach_active_objects(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        for object in self.objects.iter_mut() {
            if object.is_attached() {
                effects.extend(object.detach_effects());
                object.detach();
            }
        }
        self.contains_modal = false;
        effects
    }

    /// Deterministic float layout: attached floating objects flow
    /// left-to-right in list order, wrap at the background width, and page
    /// breaks fall every background-height of accumulated rows.
    pub fn arrange_floaters(&mut self) {
        let page_width = self.background_size.width.max(1);
        let page_height = self.background_size.height.max(1);
        let mut x = 0;
        let mut y = 0;
        let mut row_height = 0;
        let mut last_page = 0usize;
        for object in self.objects.iter_mut() {
            if !object.is_attached() || !object.is_floating() {
                continue;
            }
            let size = object.size();
            let width = size.width.max(1);
            let height = size.height.max(1);
            if x + width > page_width && x > 0 {
                x = 0;
                y += row_height;
                row_height = 0;
            }
            let page = (y / page_height) as usize;
            object.set_float_page(page);
            // Floating placement never survives a save; the position field
            // stays empty so the object floats again next pass.
            object.set_dirty(true);
            last_page = last_page.max(page);
            x += width;
            row_height = row_height.max(height);
        }
        self.float_pages = if self.objects.iter().any(|o| o.is_attached() && o.is_floating()) {
            last_page + 1
        } else {
            0
        };
    }

    /// Renderer pass over attached, visible objects, front of list first.
    pub fn paint_objects(&self, renderer: &dyn Renderer) {
        for object in &self.objects {
            if object.is_attached() && object.is_visible() {
                object.update(renderer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bag_script::Rect;

    use crate::object::{ObjectKind, visual::BitmapObject};

    use super::*;

    fn bitmap(name: &str, rect: Option<Rect>) -> BagObject {
        let mut object = BagObject::new(ObjectKind::Bitmap(BitmapObject));
        object.set_name(name);
        if let Some(rect) = rect {
            object.set_position(rect.origin());
            object.set_size(rect.size());
        }
        object
    }

    #[test]
    fn hit_test_walks_back_to_front() {
        let mut sdev = StorageDevice::new("BAR");
        let mut under = bitmap("UNDER", Some(Rect::new(0, 0, 100, 100)));
        under.set_active(true);
        under.attach();
        let mut over = bitmap("OVER", Some(Rect::new(50, 50, 100, 100)));
        over.set_active(true);
        over.attach();
        sdev.add_object(under);
        sdev.add_object(over);

        let hit = sdev.object_at(Point::new(60, 60), true).expect("hit");
        assert_eq!(hit.name(), "OVER");
        let hit = sdev.object_at(Point::new(10, 10), true).expect("hit");
        assert_eq!(hit.name(), "UNDER");
        assert!(sdev.object_at(Point::new(300, 300), true).is_none());
    }

    #[test]
    fn detached_objects_are_never_hit() {
        let mut sdev = StorageDevice::new("BAR");
        let mut object = bitmap("GHOST", Some(Rect::new(0, 0, 10, 10)));
        object.set_active(true);
        sdev.add_object(object);
        assert!(sdev.object_at(Point::new(5, 5), false).is_none());
    }

    #[test]
    fn foreign_list_blocks_remove_and_release() {
        let mut sdev = StorageDevice::new("PDA_INV");
        sdev.set_foreign_list(vec![bitmap("SPAM", None)]);
        assert!(sdev.remove_object("SPAM").is_none());
        sdev.release_objects();
        assert_eq!(sdev.object_count(), 1);

        let list = sdev.take_foreign_list().expect("foreign list");
        assert_eq!(list.len(), 1);
        assert!(!sdev.has_foreign_list());
        assert_eq!(sdev.object_count(), 0);
    }

    #[test]
    fn floaters_wrap_and_paginate_deterministically() {
        let mut sdev = StorageDevice::new("INV");
        sdev.set_background_size(Size::new(100, 40));
        for name in ["A", "B", "C", "D", "E"] {
            let mut object = bitmap(name, None);
            object.set_size(Size::new(40, 20));
            object.set_active(true);
            object.attach();
            sdev.add_object(object);
        }
        sdev.arrange_floaters();
        // two per 100px row, rows of 20px, page breaks every 40px
        assert_eq!(sdev.object("A").map(BagObject::float_page), Some(0));
        assert_eq!(sdev.object("B").map(BagObject::float_page), Some(0));
        assert_eq!(sdev.object("C").map(BagObject::float_page), Some(0));
        assert_eq!(sdev.object("D").map(BagObject::float_page), Some(0));
        assert_eq!(sdev.object("E").map(BagObject::float_page), Some(1));
        assert_eq!(sdev.float_pages(), 2);

        // second arrangement gives the same answer
        sdev.arrange_floaters();
        assert_eq!(sdev.object("E").map(BagObject::float_page), Some(1));
        assert_eq!(sdev.float_pages(), 2);
    }

    #[test]
    fn pass_tears_down_attached_non_local_objects() {
        // A restored snapshot can leave an object attached without the
        // local flag; the pass must not leave it dangling.
        let mut sdev = StorageDevice::new("BAR");
        let mut object = bitmap("GHOST", None);
        object.set_local(false);
        object.set_active(true);
        object.attach();
        sdev.add_object(object);

        let vars = VariableStore::with_seed(1);
        let (run_now, effects) = sdev.pass_step(0, &vars, false, true);
        assert!(!run_now);
        assert!(effects.is_empty());
        let object = sdev.object("GHOST").expect("present");
        assert!(!object.is_attached());
        assert!(!object.is_active());
    }

    #[test]
    fn modal_flag_follows_what_is_attached() {
        let mut sdev = StorageDevice::new("BAR");
        let mut alert = bitmap("ALERT", None);
        alert.set_modal(true);
        alert.set_active(true);
        alert.attach();
        sdev.add_object(alert);
        sdev.set_contains_modal(true);

        sdev.refresh_contains_modal();
        assert!(sdev.contains_modal());

        sdev.object_mut("ALERT").expect("present").detach();
        sdev.refresh_contains_modal();
        assert!(!sdev.contains_modal());
    }

    #[test]
    fn deactivate_owes_a_stop_for_sounds() {
        use crate::object::media::SoundObject;

        let mut sdev = StorageDevice::new("BAR");
        let mut sound = BagObject::new(ObjectKind::Sound(SoundObject::default()));
        sound.set_name("JUKEBOX");
        sound.set_active(true);
        sound.attach();
        sdev.add_object(sound);

        let effects = sdev.deactivate_local_object("JUKEBOX").expect("present");
        assert_eq!(
            effects,
            vec![Effect::StopSound {
                handle: "JUKEBOX".to_string(),
            }]
        );
        let object = sdev.object("JUKEBOX").expect("present");
        assert!(!object.is_active());
        assert!(!object.is_attached());
    }

    #[test]
    fn activation_misses_report_the_device() {
        let mut sdev = StorageDevice::new("BAR");
        let vars = VariableStore::new();
        let err = sdev
            .activate_local_object("NOBODY", &vars)
            .expect_err("missing object");
        match err {
            RuntimeError::ObjectNotFound { device, object } => {
                assert_eq!(device, "BAR");
                assert_eq!(object, "NOBODY");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
