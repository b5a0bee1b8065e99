//! The session context. One `BagRuntime` owns the variable store, the
//! device registry, the PDA director and the collaborator hosts; nothing
//! in the crate is process-global. The activation pass lives here because
//! running an object can touch variables, other devices and the hosts.

use bag_script::{execute, ScriptStream, VariableStore};
use log::{debug, warn};

use crate::effect::Effect;
use crate::error::RuntimeError;
use crate::host::Hosts;
use crate::manager::StorageDevManager;
use crate::parser::{self, ParseReport, UserObjectFactory};
use crate::pda::{PdaDirector, PdaMode, PdaSwitch};
use crate::save::ObjectRecord;
use crate::storage::{PassState, StorageDevice};

/// Device evaluated every turn, when loaded.
pub const EVENT_WORLD: &str = "EVT_WLD";
/// Device evaluated when the turn counter moves.
pub const TURN_WORLD: &str = "TURN_WLD";

pub struct BagRuntime {
    pub vars: VariableStore,
    pub manager: StorageDevManager,
    pub pda: PdaDirector,
    pub hosts: Hosts,
    current_sdev: Option<String>,
    prev_sdev: Option<String>,
}

impl BagRuntime {
    pub fn new(hosts: Hosts) -> Self {
        Self::with_vars(hosts, VariableStore::new())
    }

    /// Deterministic runtime for tests and reproducible CLI runs.
    pub fn with_seed(hosts: Hosts, seed: u64) -> Self {
        Self::with_vars(hosts, VariableStore::with_seed(seed))
    }

    fn with_vars(hosts: Hosts, mut vars: VariableStore) -> Self {
        let pda = PdaDirector::new();
        pda.seed_variables(&mut vars);
        Self {
            vars,
            manager: StorageDevManager::new(),
            pda,
            hosts,
            current_sdev: None,
            prev_sdev: None,
        }
    }

    pub fn current_sdev(&self) -> Option<&str> {
        self.current_sdev.as_deref()
    }

    /// Parse a world script into a device registered under `name`. A name
    /// already registered reloads in place. With `attach`, the device
    /// becomes current and one activation pass runs.
    pub fn load_world(&mut self, name: &str, text: &str, attach: bool) -> Result<ParseReport, RuntimeError> {
        self.load_world_with(name, text, attach, &|_| None)
    }

    pub fn load_world_with(
        &mut self,
        name: &str,
        text: &str,
        attach: bool,
        user_factory: &UserObjectFactory<'_>,
    ) -> Result<ParseReport, RuntimeError> {
        if self.manager.contains(name) {
            debug!("world '{name}' reloading in place");
            self.manager.unregister(name);
        }
        let mut device = StorageDevice::new(name);
        let mut stream = ScriptStream::new(text);
        let report = parser::parse_world_with(&mut device, &mut stream, &mut self.vars, user_factory);
        for warning in &report.warnings {
            warn!("{name}:{}: {}", warning.line, warning.message);
        }
        for error in &report.errors {
            warn!("{name}:{}: {}", error.line, error.message);
        }
        self.manager.register(device);
        if attach {
            // Reloading the on-screen world must re-run the attach path.
            if self.current_sdev.as_deref() == Some(name) {
                self.current_sdev = None;
            }
            self.set_current_sdev(name)?;
        }
        Ok(report)
    }

    /// Drop a world; scene-local variables go with it.
    pub fn unload_world(&mut self, name: &str) {
        self.manager.unregister(name);
        if self.current_sdev.as_deref() == Some(name) {
            self.current_sdev = None;
        }
        if self.prev_sdev.as_deref() == Some(name) {
            self.prev_sdev = None;
        }
        self.vars.purge_locals();
    }

    /// Make `name` the scene on screen: detach the old device, attach the
    /// new one, and apply the PDA surfacing rules (a plain scene change
    /// drops the PDA; character closeups leave it alone).
    pub fn set_current_sdev(&mut self, name: &str) -> Result<(), RuntimeError> {
        if !self.manager.contains(name) {
            return Err(RuntimeError::DeviceNotFound(name.to_string()));
        }
        if self.current_sdev.as_deref() == Some(name) {
            return Ok(());
        }
        if let Some(old) = self.current_sdev.take() {
            if let Err(err) = self.detach_active_objects(&old) {
                debug!("leaving '{old}': {err}");
            }
            self.prev_sdev = Some(old);
        }
        self.current_sdev = Some(name.to_string());

        let cic = self.manager.device(name).map(StorageDevice::is_cic).unwrap_or(false);
        if !cic && self.pda.mode() != PdaMode::None {
            let switch = self.pda.deactivate(&mut self.vars);
            self.apply_pda_switch(switch);
        }

        self.attach_active_objects(name)
    }

    /// The activation pass. In list order, every local object's gate
    /// decides whether it is live this frame; newly attached objects with
    /// an immediate action run it once the device has painted. Variable
    /// writes made by one action are visible to every later gate in the
    /// same pass. A link traversal ends the pass: the device on screen is
    /// no longer the one being evaluated.
    pub fn attach_active_objects(&mut self, name: &str) -> Result<(), RuntimeError> {
        {
            let device = self
                .manager
                .device_mut(name)
                .ok_or_else(|| RuntimeError::DeviceNotFound(name.to_string()))?;
            if device.pass_state == PassState::Evaluating {
                debug!("{name}: activation pass already running, skipping");
                return Err(RuntimeError::PassInProgress(name.to_string()));
            }
            device.pass_state = PassState::Evaluating;
        }

        let mut index = 0;
        loop {
            // Re-borrow each iteration: an action may have reshaped the
            // device (or dropped it entirely).
            let (object_name, attached_sound, painted) = {
                let Some(device) = self.manager.device(name) else {
                    break;
                };
                if index >= device.object_count() {
                    break;
                }
                let object = &device.objects()[index];
                (
                    object.name().to_string(),
                    object.kind.is_sound() && object.is_attached(),
                    !device.awaiting_first_paint(),
                )
            };
            let sound_playing = attached_sound && self.hosts.audio.is_playing(&object_name);

            let (run_now, detach_effects) = match self.manager.device_mut(name) {
                Some(device) => device.pass_step(index, &self.vars, sound_playing, painted),
                None => break,
            };

            self.execute_effects(detach_effects);

            if run_now {
                // A mid-list anomaly is reported and the pass continues.
                match self.take_run_effects(name, &object_name) {
                    Ok(effects) => {
                        let navigated = effects
                            .iter()
                            .any(|e| matches!(e, Effect::Navigate { .. }));
                        self.execute_effects(effects);
                        if navigated {
                            break;
                        }
                    }
                    Err(err) => debug!("{name}: pass skipped '{object_name}': {err}"),
                }
            }

            index += 1;
        }

        if let Some(device) = self.manager.device_mut(name) {
            device.refresh_contains_modal();
            device.arrange_floaters();
            device.pass_state = PassState::Idle;
        }
        Ok(())
    }

    /// Detach everything in `name`, settling host traffic (sound stops).
    pub fn detach_active_objects(&mut self, name: &str) -> Result<(), RuntimeError> {
        let effects = self
            .manager
            .device_mut(name)
            .ok_or_else(|| RuntimeError::DeviceNotFound(name.to_string()))?
            .detach_active_objects();
        self.execute_effects(effects);
        Ok(())
    }

    /// Paint the current device and run one activation pass. The first
    /// frame arms immediate-run actions for every pass after it.
    pub fn render_frame(&mut self) -> Result<(), RuntimeError> {
        let Some(name) = self.current_sdev.clone() else {
            return Ok(());
        };
        {
            let device = self
                .manager
                .device(&name)
                .ok_or_else(|| RuntimeError::DeviceNotFound(name.clone()))?;
            device.paint_objects(self.hosts.renderer.as_ref());
        }
        if let Some(device) = self.manager.device_mut(&name) {
            device.mark_painted();
        }
        self.attach_active_objects(&name)
    }

    /// One game turn: timers tick, then the event world runs, then the
    /// turn world if the counter actually moved.
    pub fn advance_turn(&mut self) {
        let before = self.vars.turn_count();
        self.vars.advance_turn();
        // Event worlds have no screen, so nothing defers their actions.
        for world in [EVENT_WORLD, TURN_WORLD] {
            if let Some(device) = self.manager.device_mut(world) {
                device.mark_painted();
            }
        }
        if self.manager.contains(EVENT_WORLD) {
            if let Err(err) = self.attach_active_objects(EVENT_WORLD) {
                debug!("event world pass skipped: {err}");
            }
        }
        if self.vars.turn_count() != before && self.manager.contains(TURN_WORLD) {
            if let Err(err) = self.attach_active_objects(TURN_WORLD) {
                debug!("turn world pass skipped: {err}");
            }
        }
    }

    /// Run one object's scripted action by name.
    pub fn run_object(&mut self, device: &str, object: &str) -> Result<(), RuntimeError> {
        let effects = self.take_run_effects(device, object)?;
        self.execute_effects(effects);
        Ok(())
    }

    fn take_run_effects(&mut self, device: &str, object: &str) -> Result<Vec<Effect>, RuntimeError> {
        let sdev = self
            .manager
            .device_mut(device)
            .ok_or_else(|| RuntimeError::DeviceNotFound(device.to_string()))?;
        let obj = sdev
            .object_mut(object)
            .ok_or_else(|| RuntimeError::ObjectNotFound {
                device: device.to_string(),
                object: object.to_string(),
            })?;
        // run() only reads the store; writes come back as effects.
        Ok(obj.run(device, &self.vars))
    }

    pub fn execute_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    pub fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::SetVariable { name, value } => {
                if let Err(err) = self.vars.set_or_add(&name, value) {
                    warn!("variable write failed: {err}");
                }
            }
            Effect::MoveObject { dst, src, object } => {
                match self.manager.move_object(&dst, &src, &object, &self.vars) {
                    Ok(effects) => self.execute_effects(effects),
                    Err(err) => warn!("transfer failed: {err}"),
                }
            }
            Effect::AddObject { dst, object } => {
                if let Err(err) = self.manager.add_object(&dst, &object, &self.vars) {
                    warn!("insert failed: {err}");
                }
            }
            Effect::RemoveObject { src, object } => {
                match self.manager.remove_object(&src, &object) {
                    Ok(effects) => self.execute_effects(effects),
                    Err(err) => warn!("remove failed: {err}"),
                }
            }
            Effect::Navigate {
                target,
                fade_id,
                closeup: _,
            } => {
                if let Some(fade_id) = fade_id {
                    self.hosts.renderer.transition(&target, fade_id);
                }
                if let Err(err) = self.set_current_sdev(&target) {
                    warn!("link traversal failed: {err}");
                }
            }
            Effect::PlaySound {
                handle,
                file,
                volume,
                loops,
            } => self.hosts.audio.play(&handle, &file, volume, loops),
            Effect::StopSound { handle } => self.hosts.audio.stop(&handle),
            Effect::PlayMovie {
                handle,
                file,
                asynch,
            } => self.hosts.movies.play(&handle, &file, asynch),
            Effect::RunExpression { device, expr } => {
                // Arena and store are disjoint borrows; assignments write
                // straight through.
                if let Some(sdev) = self.manager.device(&device) {
                    let _ = execute(&sdev.expressions, expr, &mut self.vars, false);
                } else {
                    warn!("expression device '{device}' not found");
                }
            }
            Effect::ShowPda { mode } => {
                let switch = self.pda.show(mode, &mut self.vars);
                self.apply_pda_switch(switch);
            }
            Effect::HidePda => {
                let switch = self.pda.deactivate(&mut self.vars);
                self.apply_pda_switch(switch);
            }
            Effect::HoldPda => self.pda.hold_current(),
            Effect::RestorePda => {
                let switch = self.pda.restore_held(&mut self.vars);
                self.apply_pda_switch(switch);
            }
            Effect::CloseDevice => {
                if let Some(prev) = self.prev_sdev.clone() {
                    if let Err(err) = self.set_current_sdev(&prev) {
                        warn!("close failed: {err}");
                    }
                }
            }
            Effect::EventLoop { name } => {
                let dismissal = self.hosts.modal.run_until_dismissed(&name);
                debug!("event loop '{name}' ended: {dismissal:?}");
            }
        }
    }

    fn apply_pda_switch(&mut self, switch: PdaSwitch) {
        if let Some(down) = switch.deactivate {
            if self.manager.contains(&down) {
                if let Err(err) = self.detach_active_objects(&down) {
                    debug!("pda switch: {err}");
                }
            }
        }
        if let Some(up) = switch.activate {
            if self.manager.contains(&up) {
                if let Err(err) = self.attach_active_objects(&up) {
                    debug!("pda switch: {err}");
                }
            }
        }
    }

    pub fn save_state(&self) -> Vec<ObjectRecord> {
        self.manager.save_object_list()
    }

    pub fn restore_state(&mut self, records: &[ObjectRecord]) {
        self.manager.restore_object_list(records);
    }
}
