//! The dialogue layer - IO primitives, the retrying ask protocol, and the
//! dataframe fill protocol, all expressed over the action engine.

mod ask;
mod driver;
mod fill;

pub use ask::{
    action_menu, ask, ask_typed, ask_with, get_yes_no, select, AskParams, Confirm, ExtraChoice,
    MenuChoice, MenuParams, SelectParams, ValueFilter,
};
pub use driver::{ask_once, emit_say, say, say_with, AskOnceParams};
pub use fill::{fill_dataframe, with_dataframe};
