//! Frame and slot definitions.

use std::sync::Arc;

use serde_json::{Map, Value as Json};
use thiserror::Error;

use crate::action::Action;
use crate::types::COMPOSITE;

/// Snapshot of slot values, name -> resolved datum (null when unfilled).
pub type SlotValues = Map<String, Json>;

/// Definition errors surfaced when a frame is declared.
#[derive(Debug, Error)]
pub enum DefError {
    #[error("slot '{0}': composite slots must not declare a type")]
    CompositeWithType(String),
    #[error("slot '{0}': composite slots need at least one child")]
    EmptyComposite(String),
    #[error("duplicate slot name '{0}'")]
    DuplicateSlot(String),
}

/// Whether a slot must be filled.
#[derive(Clone)]
pub enum Required {
    Always,
    Never,
    /// Evaluated against the live slot-value snapshot.
    When(Arc<dyn Fn(&SlotValues) -> bool + Send + Sync>),
}

impl Required {
    /// Evaluate against a snapshot.
    pub fn evaluate(&self, values: &SlotValues) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::When(predicate) => predicate(values),
        }
    }
}

impl std::fmt::Debug for Required {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Always => write!(f, "Always"),
            Self::Never => write!(f, "Never"),
            Self::When(_) => write!(f, "When(..)"),
        }
    }
}

/// Prompt for a generated slot dialog.
#[derive(Clone)]
pub enum Prompt {
    /// Literal message id or text
    Text(String),
    /// Derived from the live slot-value snapshot
    Derived(Arc<dyn Fn(&SlotValues) -> String + Send + Sync>),
}

impl std::fmt::Debug for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => write!(f, "Text({text:?})"),
            Self::Derived(_) => write!(f, "Derived(..)"),
        }
    }
}

/// Declaration of one slot.
#[derive(Debug, Clone)]
pub struct SlotDef {
    /// Slot name, unique within the frame
    pub name: String,
    /// Entity type of a leaf; `composite` for structural slots
    pub type_name: String,
    /// Whether the slot must be filled
    pub required: Required,
    /// Explicit resolution dialog
    pub dialog: Option<Action>,
    /// Prompt for the generated dialog when no explicit one is given
    pub prompt: Option<Prompt>,
    /// Child slots; non-empty exactly for composite slots
    pub children: Vec<SlotDef>,
}

impl SlotDef {
    /// A fillable leaf slot.
    pub fn leaf(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            required: Required::Always,
            dialog: None,
            prompt: None,
            children: Vec::new(),
        }
    }

    /// A structural slot grouping children; never itself filled.
    pub fn group(name: impl Into<String>, children: Vec<SlotDef>) -> Self {
        Self {
            name: name.into(),
            type_name: COMPOSITE.to_string(),
            required: Required::Always,
            dialog: None,
            prompt: None,
            children,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = Required::Never;
        self
    }

    /// Make requiredness depend on the live slot-value snapshot.
    pub fn required_when(
        mut self,
        predicate: impl Fn(&SlotValues) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.required = Required::When(Arc::new(predicate));
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(Prompt::Text(prompt.into()));
        self
    }

    pub fn with_derived_prompt(
        mut self,
        derive: impl Fn(&SlotValues) -> String + Send + Sync + 'static,
    ) -> Self {
        self.prompt = Some(Prompt::Derived(Arc::new(derive)));
        self
    }

    pub fn with_dialog(mut self, dialog: Action) -> Self {
        self.dialog = Some(dialog);
        self
    }

    /// True for structural slots.
    pub fn is_composite(&self) -> bool {
        self.type_name == COMPOSITE
    }
}

type ConfirmBuilder = Arc<dyn Fn(&SlotValues) -> Action + Send + Sync>;

/// Declaration of a whole frame.
#[derive(Clone)]
pub struct FrameDef {
    /// Frame name, the key in the context's frame registry
    pub name: String,
    /// Top-level slots
    pub slots: Vec<SlotDef>,
    confirm: Option<ConfirmBuilder>,
}

impl FrameDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: Vec::new(),
            confirm: None,
        }
    }

    /// Append a top-level slot.
    pub fn slot(mut self, slot: SlotDef) -> Self {
        self.slots.push(slot);
        self
    }

    /// Custom confirmation dialog built from the final slot values.
    pub fn with_confirm(
        mut self,
        builder: impl Fn(&SlotValues) -> Action + Send + Sync + 'static,
    ) -> Self {
        self.confirm = Some(Arc::new(builder));
        self
    }

    pub fn confirm_builder(&self) -> Option<&ConfirmBuilder> {
        self.confirm.as_ref()
    }

    /// Check structural invariants: composite slots have children, leaf slots
    /// don't, names are unique across the tree.
    pub fn validate(&self) -> Result<(), DefError> {
        let mut seen = std::collections::HashSet::new();
        fn walk(
            slots: &[SlotDef],
            seen: &mut std::collections::HashSet<String>,
        ) -> Result<(), DefError> {
            for slot in slots {
                if !seen.insert(slot.name.clone()) {
                    return Err(DefError::DuplicateSlot(slot.name.clone()));
                }
                if slot.is_composite() {
                    if slot.children.is_empty() {
                        return Err(DefError::EmptyComposite(slot.name.clone()));
                    }
                } else if !slot.children.is_empty() {
                    return Err(DefError::CompositeWithType(slot.name.clone()));
                }
                walk(&slot.children, seen)?;
            }
            Ok(())
        }
        walk(&self.slots, &mut seen)
    }
}

impl std::fmt::Debug for FrameDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDef")
            .field("name", &self.name)
            .field("slots", &self.slots.len())
            .finish_non_exhaustive()
    }
}
