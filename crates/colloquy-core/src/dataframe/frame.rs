//! Live dataframe instances and their side-command reactor.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::{json, Value as Json};

use super::def::{FrameDef, SlotDef, SlotValues};
use super::slot::Slot;
use crate::action::Action;
use crate::context::Context;
use crate::dialogue::emit_say;
use crate::outcome::Outcome;
use crate::reactor::Reactor;
use crate::types::TypeCatalog;
use crate::value::Value;

/// Aggregate fill state of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fulfillment {
    /// No required, unfilled leaf remains
    Complete,
    /// Every leaf is filled
    Filled,
    /// Some leaves filled, some not
    Partial,
    /// Nothing filled yet
    Empty,
}

impl Fulfillment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Filled => "filled",
            Self::Partial => "partial",
            Self::Empty => "empty",
        }
    }
}

/// A live frame: definition plus per-slot fill state, in declaration
/// pre-order.
#[derive(Debug, Clone)]
pub struct Dataframe {
    def: Arc<FrameDef>,
    slots: Vec<Slot>,
}

impl Dataframe {
    /// Instantiate a frame from its definition.
    pub fn new(def: Arc<FrameDef>) -> Self {
        let mut slots = Vec::new();
        fn push_all(defs: &[SlotDef], slots: &mut Vec<Slot>) {
            for slot_def in defs {
                slots.push(Slot::new(slot_def.clone()));
                push_all(&slot_def.children, slots);
            }
        }
        push_all(&def.slots, &mut slots);
        Self { def, slots }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn def(&self) -> &Arc<FrameDef> {
        &self.def
    }

    /// Slots in declaration pre-order, composites included.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.name() == name)
    }

    /// Case-insensitive lookup, for user-typed slot commands.
    pub fn slot_ci(&self, name: &str) -> Option<&Slot> {
        self.slots
            .iter()
            .find(|slot| slot.name().eq_ignore_ascii_case(name))
    }

    fn slot_mut_ci(&mut self, name: &str) -> Option<&mut Slot> {
        self.slots
            .iter_mut()
            .find(|slot| slot.name().eq_ignore_ascii_case(name))
    }

    /// Store a value into a named slot. Returns false for unknown slots.
    pub fn set_slot(&mut self, name: &str, value: Value) -> bool {
        match self.slot_mut_ci(name) {
            Some(slot) => {
                slot.set_value(value);
                true
            }
            None => false,
        }
    }

    /// Clear a named slot's state and value.
    pub fn reset_slot(&mut self, name: &str) -> bool {
        match self.slot_mut_ci(name) {
            Some(slot) => {
                slot.reset();
                true
            }
            None => false,
        }
    }

    /// Resolved value of a named slot, if the slot exists and is filled.
    pub fn slot_value(&self, name: &str) -> Option<Json> {
        let slot = self.slot_ci(name)?;
        slot.is_filled().then(|| slot.resolved())
    }

    /// Snapshot of all slot values, null for unfilled (composites included).
    pub fn slot_values(&self) -> SlotValues {
        self.slots
            .iter()
            .map(|slot| (slot.name().to_string(), slot.resolved()))
            .collect()
    }

    /// Choice labels for a slot's type, if the catalog describes any.
    pub fn slot_choices(&self, name: &str, types: &TypeCatalog) -> Option<Vec<String>> {
        let slot = self.slot_ci(name)?;
        let entity_type = types.get(slot.type_name())?;
        entity_type.choices().map(|choices| choices.labels())
    }

    /// Next slot to fill: first, in declaration pre-order, that is a leaf,
    /// currently required against the live snapshot, and unfilled.
    pub fn next_slot_to_fill(&self) -> Option<&str> {
        let values = self.slot_values();
        self.slots
            .iter()
            .find(|slot| {
                !slot.def.is_composite()
                    && slot.def.required.evaluate(&values)
                    && !slot.is_filled()
            })
            .map(Slot::name)
    }

    /// True when no required, unfilled leaf remains.
    pub fn is_complete(&self) -> bool {
        self.next_slot_to_fill().is_none()
    }

    /// True when no leaf is filled.
    pub fn is_empty(&self) -> bool {
        self.leaves().all(|slot| !slot.is_filled())
    }

    /// True when every leaf is filled.
    pub fn is_filled(&self) -> bool {
        self.leaves().all(Slot::is_filled)
    }

    pub fn fulfillment(&self) -> Fulfillment {
        if self.is_complete() {
            Fulfillment::Complete
        } else if self.is_filled() {
            Fulfillment::Filled
        } else if self.is_empty() {
            Fulfillment::Empty
        } else {
            Fulfillment::Partial
        }
    }

    /// Reset every slot.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.reset();
        }
    }

    fn leaves(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter(|slot| !slot.def.is_composite())
    }
}

/// A parsed `#verb slot value` request.
#[derive(Debug, Clone, PartialEq)]
struct SlotRequest {
    verb: String,
    slot: String,
    value: String,
}

fn slot_request_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^#\s*(set|reset|showchoices|show)\s+(\S+)\s*(.*)$")
            .expect("slot request pattern")
    })
}

fn parse_slot_request(text: &str) -> Option<SlotRequest> {
    let captures = slot_request_pattern().captures(text.trim())?;
    Some(SlotRequest {
        verb: captures[1].to_lowercase(),
        slot: captures[2].to_string(),
        value: captures[3].trim().to_string(),
    })
}

/// Render a resolved slot value for display.
fn render_value(value: &Json) -> String {
    match value {
        Json::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// The reactor auto-registered while a frame's fill dialogue is active.
///
/// Accepts `#set/#reset/#show/#showchoices <slot> [value]` requests against
/// the live frame; the reaction adjusts or describes the frame and reports
/// back, after which the pending question is re-asked.
pub fn frame_reactor(frame_name: &str) -> Reactor {
    let accept_name = frame_name.to_string();
    let react_name = frame_name.to_string();
    Reactor::new(
        format!("react:dataframe({frame_name})"),
        move |event: &crate::event::Event, ctx: &Context| {
            let request = parse_slot_request(event.text()?)?;
            let frame = ctx.frame(&accept_name)?;
            frame.slot_ci(&request.slot)?;
            Some(Value::Data(json!({
                "verb": request.verb,
                "slot": request.slot,
                "value": request.value,
            })))
        },
        move |matched: Value| {
            let frame_name = react_name.clone();
            Action::from_proc("frame_command", move |ctx| {
                let frame_name = frame_name.clone();
                let matched = matched.clone();
                async move { run_slot_command(ctx, &frame_name, &matched).await }
            })
        },
    )
    .with_icon("⌸")
}

async fn run_slot_command(ctx: Context, frame_name: &str, matched: &Value) -> Outcome {
    let request = matched.resolved();
    let verb = request["verb"].as_str().unwrap_or_default();
    let slot = request["slot"].as_str().unwrap_or_default().to_string();
    let value = request["value"].as_str().unwrap_or_default().to_string();

    let Some(frame) = ctx.frame(frame_name) else {
        return Outcome::failure("frame_not_found", ctx);
    };
    let mut frame = frame.clone();

    let (next_ctx, message) = match verb {
        "set" => {
            frame.set_slot(&slot, Value::from(value.clone()));
            tracing::debug!(frame = frame_name, %slot, %value, "slot set by user request");
            (ctx.with_frame(frame), format!("Changed {slot} to {value}"))
        }
        "reset" => {
            frame.reset_slot(&slot);
            (ctx.with_frame(frame), format!("Reset value for: {slot}"))
        }
        "showchoices" => {
            let message = match frame.slot_choices(&slot, &ctx.conversation.types) {
                Some(choices) => format!("Choices for {slot}: {}", choices.join(", ")),
                None => format!("Can't show choices for {slot}"),
            };
            (ctx, message)
        }
        "show" => {
            let current = frame.slot_value(&slot).unwrap_or(Json::Null);
            (
                ctx,
                format!("The current value of {slot} is: **{}**", render_value(&current)),
            )
        }
        other => (ctx, format!("Unexpected dataframe request: {other}")),
    };

    emit_say(&next_ctx, &message, &Json::Null);
    Outcome::success(true, next_ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::def::SlotDef;

    fn sample_frame() -> Dataframe {
        let def = FrameDef::new("order")
            .slot(SlotDef::group(
                "contact",
                vec![
                    SlotDef::leaf("name", "any"),
                    SlotDef::leaf("phone", "any").optional(),
                ],
            ))
            .slot(SlotDef::leaf("item", "any"));
        Dataframe::new(Arc::new(def))
    }

    #[test]
    fn test_next_slot_skips_composites_and_optionals() {
        let mut frame = sample_frame();
        assert_eq!(frame.next_slot_to_fill(), Some("name"));
        frame.set_slot("name", Value::from("Homer"));
        assert_eq!(frame.next_slot_to_fill(), Some("item"));
    }

    #[test]
    fn test_all_optional_frame_is_complete() {
        let def = FrameDef::new("prefs")
            .slot(SlotDef::leaf("a", "any").optional())
            .slot(SlotDef::leaf("b", "any").optional());
        let frame = Dataframe::new(Arc::new(def));
        assert!(frame.is_complete());
        assert_eq!(frame.fulfillment(), Fulfillment::Complete);
    }

    #[test]
    fn test_dynamic_required_follows_sibling_value() {
        let def = FrameDef::new("transfer")
            .slot(SlotDef::leaf("kind", "any"))
            .slot(
                SlotDef::leaf("phone", "any")
                    .required_when(|values| values.get("kind") == Some(&json!("callback"))),
            );
        let mut frame = Dataframe::new(Arc::new(def));
        frame.set_slot("kind", Value::from("chat"));
        assert!(frame.is_complete());

        frame.set_slot("kind", Value::from("callback"));
        assert_eq!(frame.next_slot_to_fill(), Some("phone"));
        assert!(!frame.is_complete());
    }

    #[test]
    fn test_fulfillment_progression() {
        let mut frame = sample_frame();
        assert_eq!(frame.fulfillment(), Fulfillment::Empty);
        frame.set_slot("name", Value::from("Homer"));
        assert_eq!(frame.fulfillment(), Fulfillment::Partial);
        frame.set_slot("item", Value::from("tea"));
        assert_eq!(frame.fulfillment(), Fulfillment::Complete);
        frame.set_slot("phone", Value::from("555"));
        assert_eq!(frame.fulfillment(), Fulfillment::Complete);
        assert!(frame.is_filled());
    }

    #[test]
    fn test_parse_slot_request_grammar() {
        assert_eq!(
            parse_slot_request("#set name Homer"),
            Some(SlotRequest {
                verb: "set".to_string(),
                slot: "name".to_string(),
                value: "Homer".to_string(),
            })
        );
        assert_eq!(
            parse_slot_request("# SHOW item"),
            Some(SlotRequest {
                verb: "show".to_string(),
                slot: "item".to_string(),
                value: String::new(),
            })
        );
        assert_eq!(parse_slot_request("#help"), None);
        assert_eq!(parse_slot_request("plain text"), None);
    }

    #[test]
    fn test_slot_values_snapshot_includes_unfilled_as_null() {
        let mut frame = sample_frame();
        frame.set_slot("name", Value::from("Homer"));
        let values = frame.slot_values();
        assert_eq!(values.get("name"), Some(&json!("Homer")));
        assert_eq!(values.get("item"), Some(&Json::Null));
        assert_eq!(values.get("contact"), Some(&Json::Null));
    }
}
