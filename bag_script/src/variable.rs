use std::cell::RefCell;
use std::collections::HashMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::ScriptError;

/// Name of the per-turn counter every world script can read. It is a timer
/// variable, so `advance_turn` bumps it along with the rest.
pub const TURN_COUNT_VAR: &str = "TURNCOUNT";

/// Name of the pre-seeded random variable.
pub const RANDOM_VAR: &str = "RANDOM";

/// Random reads are taken modulo this bound; world scripts assume a 15-bit
/// range.
pub const RANDOM_RANGE: i64 = 32768;

/// A named mutable value. Values are stored as text and lazily interpreted
/// as numeric when the first character is a digit or sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: String,
    value: String,
    global: bool,
    timer: bool,
    random: bool,
    constant: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            global: false,
            timer: false,
            random: false,
            constant: false,
        }
    }

    pub fn global(mut self) -> Self {
        self.global = true;
        self
    }

    pub fn timer(mut self) -> Self {
        self.timer = true;
        self
    }

    pub fn random(mut self) -> Self {
        self.random = true;
        self
    }

    pub fn constant(mut self) -> Self {
        self.constant = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    pub fn is_timer(&self) -> bool {
        self.timer
    }

    pub fn is_random(&self) -> bool {
        self.random
    }

    pub fn is_constant(&self) -> bool {
        self.constant
    }

    /// True when the stored text reads as a number.
    pub fn is_numeric(&self) -> bool {
        value_is_numeric(&self.value)
    }

    /// The stored value as a number; non-numeric text reads as 0. Random
    /// variables are resolved by the store, not here.
    pub fn num_value(&self) -> i64 {
        parse_num(&self.value)
    }

    pub fn set_value(&mut self, value: impl Into<String>) -> Result<(), ScriptError> {
        if self.constant {
            return Err(ScriptError::ConstantWrite(self.name.clone()));
        }
        self.value = value.into();
        Ok(())
    }

    pub fn set_num_value(&mut self, value: i64) -> Result<(), ScriptError> {
        self.set_value(value.to_string())
    }

    /// One turn tick. Non-numeric timer values restart from zero.
    fn increment(&mut self) {
        self.value = (parse_num(&self.value) + 1).to_string();
    }
}

pub fn value_is_numeric(value: &str) -> bool {
    matches!(value.as_bytes().first(), Some(b'0'..=b'9') | Some(b'+') | Some(b'-'))
}

fn parse_num(value: &str) -> i64 {
    // Leading numeric prefix, trailing junk ignored (atoi semantics).
    let mut end = 0;
    for (i, ch) in value.char_indices() {
        if (i == 0 && (ch == '+' || ch == '-')) || ch.is_ascii_digit() {
            end = i + ch.len_utf8();
        } else {
            break;
        }
    }
    value[..end].parse().unwrap_or(0)
}

/// The process-wide variable store: hashed lookup over insertion-ordered
/// slots. Timer variables are kept at the front of the iteration order so
/// one `advance_turn` sweep touches every timer before any other slot.
pub struct VariableStore {
    slots: Vec<Variable>,
    index: HashMap<String, usize>,
    timer_count: usize,
    rng: RefCell<SmallRng>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }

    /// Deterministic store for tests and reproducible CLI runs.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Self {
        let mut store = Self {
            slots: Vec::new(),
            index: HashMap::new(),
            timer_count: 0,
            rng: RefCell::new(rng),
        };
        // Bookkeeping variables every world script expects to exist.
        store.add(Variable::new(TURN_COUNT_VAR, "0").global().timer());
        store.add(Variable::new(RANDOM_VAR, "0").global().random());
        store
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.slots.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.index.get(name).map(|&i| &self.slots[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        let i = *self.index.get(name)?;
        Some(&mut self.slots[i])
    }

    /// Insert a variable, keeping timers at the front. Re-declaring an
    /// existing name updates the definition in place unless the timer flag
    /// changed, in which case the slot moves across the timer prefix.
    pub fn add(&mut self, var: Variable) {
        if let Some(&i) = self.index.get(var.name()) {
            if self.slots[i].is_timer() == var.is_timer() {
                self.slots[i] = var;
                return;
            }
            self.remove(var.name());
        }
        let at = if var.is_timer() {
            self.timer_count += 1;
            self.timer_count - 1
        } else {
            self.slots.len()
        };
        self.slots.insert(at, var);
        self.rebuild_index();
    }

    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        let i = *self.index.get(name)?;
        let var = self.slots.remove(i);
        if var.is_timer() {
            self.timer_count -= 1;
        }
        self.rebuild_index();
        Some(var)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(Variable::value)
    }

    /// Numeric read. Random variables return a fresh random number instead
    /// of the stored value; this is the one sanctioned side effect of
    /// expression evaluation.
    pub fn num_value(&self, name: &str) -> Option<i64> {
        let var = self.get(name)?;
        if var.is_random() {
            return Some(self.rng.borrow_mut().gen_range(0..RANDOM_RANGE));
        }
        Some(var.num_value())
    }

    /// Write through to an existing variable.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), ScriptError> {
        match self.get_mut(name) {
            Some(var) => var.set_value(value),
            None => Err(ScriptError::UnknownVariable(name.to_string())),
        }
    }

    /// Write, declaring a plain local variable if the name is new.
    pub fn set_or_add(&mut self, name: &str, value: impl Into<String>) -> Result<(), ScriptError> {
        if let Some(var) = self.get_mut(name) {
            return var.set_value(value);
        }
        self.add(Variable::new(name, value));
        Ok(())
    }

    /// Advance one game turn: every timer variable is incremented. Timers
    /// sit at the front of the slot order, so the sweep stops at the first
    /// non-timer slot.
    pub fn advance_turn(&mut self) {
        for var in self.slots.iter_mut() {
            if !var.is_timer() {
                break;
            }
            var.increment();
        }
    }

    pub fn turn_count(&self) -> i64 {
        self.get(TURN_COUNT_VAR).map(Variable::num_value).unwrap_or(0)
    }

    /// Drop scene-local variables at world teardown; globals survive.
    pub fn purge_locals(&mut self) {
        self.slots.retain(Variable::is_global);
        self.timer_count = self.slots.iter().take_while(|v| v.is_timer()).count();
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, v)| (v.name().to_string(), i))
            .collect();
    }
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_interpretation_is_lazy() {
        let var = Variable::new("X", "12abc");
        assert!(var.is_numeric());
        assert_eq!(var.num_value(), 12);

        let var = Variable::new("X", "-4");
        assert_eq!(var.num_value(), -4);

        let var = Variable::new("X", "BARTENDER");
        assert!(!var.is_numeric());
        assert_eq!(var.num_value(), 0);
    }

    #[test]
    fn constants_reject_writes() {
        let mut store = VariableStore::with_seed(1);
        store.add(Variable::new("MAXDISKS", "3").constant());
        let err = store.set("MAXDISKS", "4").expect_err("constant");
        assert!(matches!(err, ScriptError::ConstantWrite(name) if name == "MAXDISKS"));
        assert_eq!(store.value("MAXDISKS"), Some("3"));
    }

    #[test]
    fn timers_stay_at_front_of_iteration_order() {
        let mut store = VariableStore::with_seed(1);
        store.add(Variable::new("SCORE", "0"));
        store.add(Variable::new("FUSE", "10").timer());
        store.add(Variable::new("NAME", "ZIG"));
        store.add(Variable::new("CLOCK", "0").timer());

        let names: Vec<&str> = store.iter().map(Variable::name).collect();
        let first_non_timer = store
            .iter()
            .position(|v| !v.is_timer())
            .expect("store has non-timers");
        assert!(store.iter().take(first_non_timer).all(Variable::is_timer));
        assert!(names.contains(&"FUSE") && names.contains(&"CLOCK"));

        store.advance_turn();
        assert_eq!(store.value("FUSE"), Some("11"));
        assert_eq!(store.value("CLOCK"), Some("1"));
        assert_eq!(store.value("SCORE"), Some("0"));
        assert_eq!(store.turn_count(), 1);
    }

    #[test]
    fn random_reads_are_fresh_and_in_range() {
        let store = VariableStore::with_seed(7);
        let a = store.num_value(RANDOM_VAR).expect("random");
        let b = store.num_value(RANDOM_VAR).expect("random");
        assert!((0..RANDOM_RANGE).contains(&a));
        assert!((0..RANDOM_RANGE).contains(&b));
        // stored text is untouched by reads
        assert_eq!(store.value(RANDOM_VAR), Some("0"));
    }

    #[test]
    fn purge_locals_keeps_globals() {
        let mut store = VariableStore::with_seed(1);
        store.add(Variable::new("INBAR", "1"));
        store.add(Variable::new("VISITED", "1").global());
        store.purge_locals();
        assert!(store.get("INBAR").is_none());
        assert!(store.get("VISITED").is_some());
        assert!(store.get(TURN_COUNT_VAR).is_some());
    }

    #[test]
    fn redeclaring_updates_in_place() {
        let mut store = VariableStore::with_seed(1);
        store.add(Variable::new("SCORE", "0"));
        store.add(Variable::new("SCORE", "5"));
        assert_eq!(store.value("SCORE"), Some("5"));
        assert_eq!(store.iter().filter(|v| v.name() == "SCORE").count(), 1);
    }

    #[test]
    fn redeclaring_across_the_timer_boundary_keeps_timers_ticking() {
        let mut store = VariableStore::with_seed(1);
        store.add(Variable::new("FUSE", "0").timer());
        store.add(Variable::new("CLOCK", "0").timer());

        // FUSE loses its timer flag; CLOCK must keep ticking behind it.
        store.add(Variable::new("FUSE", "0"));
        store.advance_turn();
        assert_eq!(store.value("CLOCK"), Some("1"));
        assert_eq!(store.value("FUSE"), Some("0"));

        // And back: the slot rejoins the timer prefix.
        store.add(Variable::new("FUSE", "0").timer());
        store.advance_turn();
        assert_eq!(store.value("FUSE"), Some("1"));
        assert_eq!(store.value("CLOCK"), Some("2"));
    }
}
