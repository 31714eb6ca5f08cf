//! Live slot state.

use serde_json::Value as Json;

use super::def::SlotDef;
use crate::value::Value;

/// Fill state of a leaf slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    /// No value yet
    #[default]
    Unset,
    /// Value accepted
    Set,
    /// Value accepted and explicitly confirmed
    Confirmed,
}

/// A slot instance: its definition plus fill state.
#[derive(Debug, Clone)]
pub struct Slot {
    /// Definition the slot was instantiated from
    pub def: SlotDef,
    state: SlotState,
    value: Option<Value>,
}

impl Slot {
    pub fn new(def: SlotDef) -> Self {
        Self {
            def,
            state: SlotState::Unset,
            value: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn type_name(&self) -> &str {
        &self.def.type_name
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    /// Current value, if set.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Resolved datum, null when unfilled.
    pub fn resolved(&self) -> Json {
        self.value
            .as_ref()
            .map(|value| value.resolved().clone())
            .unwrap_or(Json::Null)
    }

    pub fn set_value(&mut self, value: Value) {
        self.state = SlotState::Set;
        self.value = Some(value);
    }

    pub fn confirm(&mut self) {
        self.state = SlotState::Confirmed;
    }

    pub fn is_filled(&self) -> bool {
        matches!(self.state, SlotState::Set | SlotState::Confirmed)
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == SlotState::Confirmed
    }

    pub fn reset(&mut self) {
        self.state = SlotState::Unset;
        self.value = None;
    }
}
