//! PDA mode state machine. The director never touches devices itself; it
//! decides which display device goes down and which comes up, and the
//! runtime applies the switch. Mode and position are mirrored into the
//! variable store so conditions and snapshots observe PDA state like any
//! other script fact.

use bag_script::{Variable, VariableStore};
use log::debug;

pub const PDA_MODE_VAR: &str = "PDAMODE";
pub const PDA_POSITION_VAR: &str = "PDAPOSITION";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PdaMode {
    #[default]
    None,
    Map,
    Inventory,
    Log,
    Movie,
}

impl PdaMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdaMode::None => "NONE",
            PdaMode::Map => "MAP",
            PdaMode::Inventory => "INVENTORY",
            PdaMode::Log => "LOG",
            PdaMode::Movie => "MOVIE",
        }
    }

    pub fn from_str(text: &str) -> Option<Self> {
        match text {
            "NONE" => Some(PdaMode::None),
            "MAP" => Some(PdaMode::Map),
            "INVENTORY" => Some(PdaMode::Inventory),
            "LOG" => Some(PdaMode::Log),
            "MOVIE" => Some(PdaMode::Movie),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PdaPos {
    #[default]
    Uninitialized,
    Up,
    Down,
}

impl PdaPos {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdaPos::Uninitialized => "UNINITIALIZED",
            PdaPos::Up => "UP",
            PdaPos::Down => "DOWN",
        }
    }
}

/// One display-device switch for the runtime to apply: deactivate first,
/// then activate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PdaSwitch {
    pub deactivate: Option<String>,
    pub activate: Option<String>,
}

/// Mode/position state plus the display-device names each mode maps to.
/// One director per runtime; every PDA-capable device shares it.
pub struct PdaDirector {
    mode: PdaMode,
    pos: PdaPos,
    held: Option<PdaMode>,
    map_dev: String,
    inventory_dev: String,
    log_dev: String,
    movie_dev: String,
}

impl Default for PdaDirector {
    fn default() -> Self {
        Self {
            mode: PdaMode::None,
            pos: PdaPos::Uninitialized,
            held: None,
            map_dev: "BPDAMAP_WLD".to_string(),
            inventory_dev: "BPDAINV_WLD".to_string(),
            log_dev: "BPDALOG_WLD".to_string(),
            movie_dev: "BPDAMOO_WLD".to_string(),
        }
    }
}

impl PdaDirector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> PdaMode {
        self.mode
    }

    pub fn pos(&self) -> PdaPos {
        self.pos
    }

    pub fn set_display_devices(
        &mut self,
        map: impl Into<String>,
        inventory: impl Into<String>,
        log: impl Into<String>,
        movie: impl Into<String>,
    ) {
        self.map_dev = map.into();
        self.inventory_dev = inventory.into();
        self.log_dev = log.into();
        self.movie_dev = movie.into();
    }

    fn display_device(&self, mode: PdaMode) -> Option<String> {
        match mode {
            PdaMode::None => None,
            PdaMode::Map => Some(self.map_dev.clone()),
            PdaMode::Inventory => Some(self.inventory_dev.clone()),
            PdaMode::Log => Some(self.log_dev.clone()),
            PdaMode::Movie => Some(self.movie_dev.clone()),
        }
    }

    /// Switch display modes. Raising any mode from a lowered PDA also
    /// brings the PDA up.
    pub fn show(&mut self, mode: PdaMode, vars: &mut VariableStore) -> PdaSwitch {
        if mode == self.mode {
            return PdaSwitch::default();
        }
        debug!("pda mode {} -> {}", self.mode.as_str(), mode.as_str());
        let switch = PdaSwitch {
            deactivate: self.display_device(self.mode),
            activate: self.display_device(mode),
        };
        self.mode = mode;
        if mode != PdaMode::None && self.pos != PdaPos::Up {
            self.set_pos(PdaPos::Up, vars);
        }
        self.write_mode(vars);
        switch
    }

    pub fn show_map(&mut self, vars: &mut VariableStore) -> PdaSwitch {
        self.show(PdaMode::Map, vars)
    }

    pub fn show_inventory(&mut self, vars: &mut VariableStore) -> PdaSwitch {
        self.show(PdaMode::Inventory, vars)
    }

    pub fn show_log(&mut self, vars: &mut VariableStore) -> PdaSwitch {
        self.show(PdaMode::Log, vars)
    }

    pub fn show_movie(&mut self, vars: &mut VariableStore) -> PdaSwitch {
        self.show(PdaMode::Movie, vars)
    }

    /// Back to no display; the PDA drops.
    pub fn deactivate(&mut self, vars: &mut VariableStore) -> PdaSwitch {
        let switch = self.show(PdaMode::None, vars);
        if self.pos == PdaPos::Up {
            self.set_pos(PdaPos::Down, vars);
        }
        switch
    }

    /// Suspend the current mode for a transient overlay (movie playback).
    pub fn hold_current(&mut self) {
        if self.held.is_none() && self.mode != PdaMode::None && self.mode != PdaMode::Movie {
            self.held = Some(self.mode);
        }
    }

    /// Resume whatever `hold_current` put aside; no-op without a held mode.
    pub fn restore_held(&mut self, vars: &mut VariableStore) -> PdaSwitch {
        match self.held.take() {
            Some(mode) => self.show(mode, vars),
            None => self.deactivate(vars),
        }
    }

    pub fn set_pos(&mut self, pos: PdaPos, vars: &mut VariableStore) {
        self.pos = pos;
        let _ = vars.set_or_add(PDA_POSITION_VAR, pos.as_str());
    }

    fn write_mode(&self, vars: &mut VariableStore) {
        let _ = vars.set_or_add(PDA_MODE_VAR, self.mode.as_str());
    }

    /// Seed the mirror variables so scripts can read them before the first
    /// switch. Globals, so they survive world unloads.
    pub fn seed_variables(&self, vars: &mut VariableStore) {
        if !vars.contains(PDA_MODE_VAR) {
            vars.add(Variable::new(PDA_MODE_VAR, self.mode.as_str()).global());
        }
        if !vars.contains(PDA_POSITION_VAR) {
            vars.add(Variable::new(PDA_POSITION_VAR, self.pos.as_str()).global());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn showing_a_mode_switches_devices_and_mirrors_variables() {
        let mut pda = PdaDirector::new();
        let mut vars = VariableStore::with_seed(1);
        pda.seed_variables(&mut vars);
        assert_eq!(vars.value(PDA_MODE_VAR), Some("NONE"));

        let switch = pda.show(PdaMode::Map, &mut vars);
        assert_eq!(switch.deactivate, None);
        assert_eq!(switch.activate.as_deref(), Some("BPDAMAP_WLD"));
        assert_eq!(vars.value(PDA_MODE_VAR), Some("MAP"));
        assert_eq!(vars.value(PDA_POSITION_VAR), Some("UP"));

        let switch = pda.show(PdaMode::Inventory, &mut vars);
        assert_eq!(switch.deactivate.as_deref(), Some("BPDAMAP_WLD"));
        assert_eq!(switch.activate.as_deref(), Some("BPDAINV_WLD"));
    }

    #[test]
    fn showing_the_current_mode_is_a_no_op() {
        let mut pda = PdaDirector::new();
        let mut vars = VariableStore::with_seed(1);
        let _ = pda.show(PdaMode::Log, &mut vars);
        assert_eq!(pda.show(PdaMode::Log, &mut vars), PdaSwitch::default());
    }

    #[test]
    fn hold_and_restore_bracket_a_movie_overlay() {
        let mut pda = PdaDirector::new();
        let mut vars = VariableStore::with_seed(1);
        let _ = pda.show(PdaMode::Inventory, &mut vars);

        pda.hold_current();
        let _ = pda.show(PdaMode::Movie, &mut vars);
        assert_eq!(pda.mode(), PdaMode::Movie);

        let switch = pda.restore_held(&mut vars);
        assert_eq!(pda.mode(), PdaMode::Inventory);
        assert_eq!(switch.deactivate.as_deref(), Some("BPDAMOO_WLD"));
        assert_eq!(switch.activate.as_deref(), Some("BPDAINV_WLD"));
        assert_eq!(vars.value(PDA_MODE_VAR), Some("INVENTORY"));
    }

    #[test]
    fn deactivate_drops_the_pda() {
        let mut pda = PdaDirector::new();
        let mut vars = VariableStore::with_seed(1);
        let _ = pda.show(PdaMode::Map, &mut vars);
        let switch = pda.deactivate(&mut vars);
        assert_eq!(switch.deactivate.as_deref(), Some("BPDAMAP_WLD"));
        assert_eq!(switch.activate, None);
        assert_eq!(vars.value(PDA_POSITION_VAR), Some("DOWN"));
        assert_eq!(vars.value(PDA_MODE_VAR), Some("NONE"));
    }
}
