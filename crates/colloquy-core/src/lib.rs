//! Colloquy: an asynchronous action-composition engine for dialogue systems.
//!
//! # Overview
//!
//! The engine is a small monadic control-flow interpreter: units of
//! computation ("actions") that may suspend to wait for an external event,
//! fail recoverably, raise a scoped exception, or be cancelled, composed
//! through a combinator library. On top of it sits a structured slot-filling
//! protocol driving ask/confirm/retry dialogues over hierarchical dataframes.
//!
//! # Module Structure
//!
//! - [`value`]: dynamic values and typed entities
//! - [`outcome`]: the four-way tagged result of one step
//! - [`action`]: the composable unit and its explicit continuations
//! - [`combinators`]: sequencing, alternation, dispatch, loops, env/store
//! - [`task`]: named tracing/exception scopes
//! - [`context`]: the immutable snapshot threaded through execution
//! - [`reactor`]: side-channel event handlers interrupting pending questions
//! - [`dialogue`]: say/ask primitives, the retrying ask protocol, frame fill
//! - [`dataframe`]: slot trees and their fill state
//! - [`agent`]: named bot roots and ask policy
//! - [`conversation`]: the shared handle and registry behind every context
//! - [`channel`]: event source, output sink, trace sink abstractions
//! - [`types`] / [`intent`] / [`messages`]: startup-assembled catalogs
//! - [`testkit`]: scripted conversations and assertions for tests

pub mod action;
pub mod agent;
pub mod channel;
pub mod combinators;
pub mod context;
pub mod conversation;
pub mod dataframe;
pub mod dialogue;
pub mod event;
pub mod intent;
pub mod messages;
pub mod outcome;
pub mod reactor;
pub mod task;
pub mod testkit;
pub mod types;
pub mod value;

pub use action::{Action, ActionInfo, Cont};
pub use agent::{Agent, AgentProfile, AskPolicy, AskPolicyOverride, Policy, PolicyOverride};
pub use channel::{
    CollectingOutput, EventSource, LogTrace, Mailbox, NullOutput, NullTrace, OutputSink,
    ScriptedSource, TraceSink,
};
pub use combinators::{
    alt, alt_for, branch, call, cancel, env_get, env_let, env_set, equals, exec, fail, fail_with,
    frame_get, guard, guard_or, loop_run, loop_while, on_intent, pass, raise, repeat, seq,
    seq_for, slot_get, slot_set, store_get, store_set, succeed, succeed_if, switch, Case,
};
pub use context::{Context, TaskFrame};
pub use conversation::{Conversation, ConversationBuilder, ConversationId, ConversationRegistry};
pub use dataframe::{Dataframe, DefError, FrameDef, Fulfillment, Required, SlotDef, SlotValues};
pub use dialogue::{
    action_menu, ask, ask_once, ask_typed, ask_with, fill_dataframe, get_yes_no, say, say_with,
    select, with_dataframe, AskOnceParams, AskParams, Confirm, ExtraChoice, MenuChoice,
    MenuParams, SelectParams, ValueFilter,
};
pub use event::{BotUtterance, Event, ParsedIntent, Sender, TraceEvent, Utterance};
pub use intent::{IntentCatalog, IntentDef};
pub use messages::{resolve_text, MessageCatalog};
pub use outcome::{Outcome, RUNTIME_FAULT};
pub use reactor::{reactor_from_intent, Reactor, ReactorLevel, ReactorTable};
pub use task::{task, task_with, TaskSpec};
pub use types::{Choices, EntityType, TypeCatalog, COMPOSITE};
pub use value::{equal_values, Entity, Value};
