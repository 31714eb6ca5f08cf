//! The dataframe fill protocol.
//!
//! `fill_dataframe` drives a whole frame to completion: select the next
//! required unfilled leaf in declaration pre-order, run its resolution
//! dialog, store the value, repeat; then confirm the collected values.
//! Slot side-commands stay live for the whole scope through the frame's
//! auto-registered reactor.

use std::sync::Arc;

use serde_json::{json, Value as Json};

use crate::action::{Action, Cont};
use crate::combinators::loop_while;
use crate::dataframe::{frame_reactor, Dataframe, FrameDef, Prompt, SlotValues};
use crate::event::TraceEvent;
use crate::outcome::Outcome;
use crate::reactor::ReactorLevel;
use crate::task::{task_with, TaskSpec};
use crate::value::Value;

use super::ask::{ask_with, get_yes_no, AskParams};

/// Run an action within the scope of a live frame.
///
/// The frame and its side-command reactor exist only for the duration of the
/// built action; both are removed on exit, whatever the outcome.
pub fn with_dataframe(
    def: FrameDef,
    build: impl Fn(&Dataframe) -> Action + Send + Sync + 'static,
) -> Action {
    let def = Arc::new(def);
    let build = Arc::new(build);
    let frame_name = def.name.clone();
    Action::from_proc("with_dataframe", move |ctx| {
        let def = def.clone();
        let build = build.clone();
        async move {
            if let Err(error) = def.validate() {
                return Outcome::exception(
                    "invalid_frame",
                    json!({ "frame": def.name, "error": error.to_string() }),
                    ctx,
                );
            }
            let frame = Dataframe::new(def);
            let name = frame.name().to_string();
            let shadowed = ctx.frame(&name).cloned();

            let mut reactor = frame_reactor(&name);
            reactor.owner = ctx.owner_name();
            ctx.conversation.trace.trace(&TraceEvent::ReactorPushed {
                level: ReactorLevel::Dataframe.as_str().to_string(),
                name: reactor.name.clone(),
            });
            let inner_ctx = ctx
                .with_frame(frame.clone())
                .with_reactor(ReactorLevel::Dataframe, reactor);

            let outcome = build(&frame).run(inner_ctx).await;

            // Scope exit: drop the frame and its reactor, restoring any
            // shadowed frame of the same name.
            outcome.map_ctx(|mut restored| {
                restored.dataframes.remove(&name);
                if let Some(previous) = shadowed.clone() {
                    restored.dataframes.insert(name.clone(), previous);
                }
                restored.reactors.pop(ReactorLevel::Dataframe);
                restored
            })
        }
    })
    .with_info("with_dataframe", vec![frame_name])
}

/// Fill a frame to completion, confirm the collected values, and succeed
/// with the final slot-value snapshot.
pub fn fill_dataframe(def: FrameDef) -> Action {
    with_dataframe(def, |frame| {
        let name = frame.name().to_string();
        task_with(
            TaskSpec::new(
                format!("fill_dataframe:{name}"),
                crate::combinators::seq([
                    Cont::Then(fill_all_slots(&name)),
                    Cont::Then(confirm_frame(&name)),
                ]),
            )
            .with_icon("⌸"),
        )
    })
}

/// Loop filling the next required, unfilled leaf until none remains.
fn fill_all_slots(frame_name: &str) -> Action {
    let cond_name = frame_name.to_string();
    let body_name = frame_name.to_string();

    let incomplete = Action::from_proc("frame_incomplete", move |ctx| {
        let name = cond_name.clone();
        async move {
            match ctx.frame(&name) {
                Some(frame) if !frame.is_complete() => Outcome::success(true, ctx),
                Some(_) => Outcome::failure("frame_complete", ctx),
                None => Outcome::failure("frame_not_found", ctx),
            }
        }
    });

    let fill_next = Action::from_proc("fill_next_slot", move |ctx| {
        let name = body_name.clone();
        async move {
            let Some(frame) = ctx.frame(&name) else {
                return Outcome::failure("frame_not_found", ctx);
            };
            let Some(slot_name) = frame.next_slot_to_fill().map(str::to_string) else {
                return Outcome::success(true, ctx);
            };
            fill_slot(&name, &slot_name).run(ctx.clone()).await
        }
    });

    task_with(
        TaskSpec::new(
            format!("fill_slots:{frame_name}"),
            loop_while(incomplete, fill_next),
        )
        .with_icon("⟳"),
    )
}

/// Resolve one slot: run its dialog and store the accepted value.
fn fill_slot(frame_name: &str, slot_name: &str) -> Action {
    let frame_name = frame_name.to_string();
    let slot_name_outer = slot_name.to_string();
    let inner = Action::from_proc("fill_slot", move |ctx| {
        let frame_name = frame_name.clone();
        let slot_name = slot_name_outer.clone();
        async move {
            let Some(frame) = ctx.frame(&frame_name) else {
                return Outcome::failure("frame_not_found", ctx);
            };
            let Some(slot) = frame.slot(&slot_name) else {
                return Outcome::failure_with_message(
                    "slot_not_found",
                    ctx,
                    format!("no slot {slot_name} in {frame_name}"),
                );
            };
            let dialog = slot
                .def
                .dialog
                .clone()
                .unwrap_or_else(|| slot_ask(frame, &slot_name));

            match dialog.run(ctx.clone()).await {
                Outcome::Success { value, ctx } => {
                    let Some(frame) = ctx.frame(&frame_name) else {
                        return Outcome::failure("frame_not_found", ctx);
                    };
                    let mut frame = frame.clone();
                    frame.set_slot(&slot_name, value.clone());
                    tracing::debug!(frame = %frame_name, slot = %slot_name, "slot filled");
                    Outcome::success(value, ctx.with_frame(frame))
                }
                other => other,
            }
        }
    });
    task_with(TaskSpec::new(format!("fill_slot:{slot_name}"), inner).with_icon("⍇"))
}

/// Generated ask for a slot without an explicit dialog.
fn slot_ask(frame: &Dataframe, slot_name: &str) -> Action {
    let slot = frame.slot(slot_name).expect("slot resolved by caller");
    let prompt = match &slot.def.prompt {
        Some(Prompt::Text(text)) => text.clone(),
        Some(Prompt::Derived(derive)) => derive(&frame.slot_values()),
        None => format!("ask_{}", snake_case(slot_name)),
    };
    ask_with(AskParams::typed(prompt.clone(), slot.type_name()).with_name(prompt))
}

/// Confirm the collected values; succeed with the final snapshot.
fn confirm_frame(frame_name: &str) -> Action {
    let frame_name = frame_name.to_string();
    Action::from_proc("confirm_frame", move |ctx| {
        let frame_name = frame_name.clone();
        async move {
            let Some(frame) = ctx.frame(&frame_name) else {
                return Outcome::failure("frame_not_found", ctx);
            };
            let values = frame.slot_values();
            let dialog = match frame.def().confirm_builder() {
                Some(builder) => builder(&values),
                None => get_yes_no("confirm"),
            };
            match dialog.run(ctx.clone()).await {
                Outcome::Success { ctx: done, .. } => {
                    // Side commands may have adjusted slots during the
                    // confirmation question; report the final state.
                    let values: SlotValues = done
                        .frame(&frame_name)
                        .map(Dataframe::slot_values)
                        .unwrap_or(values);
                    Outcome::success(Value::Data(Json::Object(values)), done)
                }
                Outcome::Failure { ctx, .. } => {
                    Outcome::failure("confirmation_failure", ctx)
                }
                other => other,
            }
        }
    })
}

/// Simplified snake_case for derived message ids: non-alphanumerics become
/// single underscores.
fn snake_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_separator = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_was_separator = false;
        } else if !last_was_separator && !out.is_empty() {
            out.push('_');
            last_was_separator = true;
        }
    }
    if out.ends_with('_') {
        out.pop();
    }
    out
}
