//! Dataframes - hierarchical named-value structures driving structured
//! data-collection dialogues.
//!
//! A frame definition declares a slot tree; a live [`Dataframe`] tracks fill
//! state per leaf. Completeness is evaluated against the current value
//! snapshot, so a slot's requiredness may depend on its siblings.

mod def;
mod frame;
mod slot;

pub use def::{DefError, FrameDef, Prompt, Required, SlotDef, SlotValues};
pub use frame::{frame_reactor, Dataframe, Fulfillment};
pub use slot::{Slot, SlotState};
