//! The combinator library - control flow built purely from Action
//! primitives.
//!
//! Sequencing (`seq`), alternation (`alt`), dispatch (`switch`), branching
//! (`branch`), loops, folds, guards, plus the environment/store primitives
//! and reactor registration. IO primitives (`say`, `ask_once`) live in the
//! dialogue module.

use std::sync::Arc;

use serde_json::Value as Json;

use crate::action::{apply_cont, Action, Cont};
use crate::context::Context;
use crate::event::TraceEvent;
use crate::outcome::Outcome;
use crate::reactor::{reactor_from_intent, ReactorLevel};
use crate::value::Value;

// ============ primitives ============

/// Action that always succeeds with a value.
pub fn succeed(value: impl Into<Value>) -> Action {
    let value = value.into();
    Action::from_proc("succeed", move |ctx| {
        let value = value.clone();
        async move { Outcome::success(value, ctx) }
    })
}

/// Action that always fails with a reason token.
pub fn fail(reason: impl Into<String>) -> Action {
    let reason = reason.into();
    Action::from_proc("fail", move |ctx| {
        let reason = reason.clone();
        async move { Outcome::failure(reason, ctx) }
    })
}

/// Action that always fails, with a detail message.
pub fn fail_with(reason: impl Into<String>, message: impl Into<String>) -> Action {
    let reason = reason.into();
    let message = message.into();
    Action::from_proc("fail", move |ctx| {
        let reason = reason.clone();
        let message = message.clone();
        async move { Outcome::failure_with_message(reason, ctx, message) }
    })
}

/// Action that cancels the current step.
pub fn cancel(reason: impl Into<String>) -> Action {
    let reason = reason.into();
    Action::from_proc("cancel", move |ctx| {
        let reason = reason.clone();
        async move { Outcome::cancellation(reason, ctx) }
    })
}

/// Action that raises a scoped exception.
pub fn raise(error_type: impl Into<String>, payload: Json) -> Action {
    let error_type = error_type.into();
    Action::from_proc("raise", move |ctx| {
        let error_type = error_type.clone();
        let payload = payload.clone();
        async move { Outcome::exception(error_type, payload, ctx) }
    })
}

/// Run a plain function and succeed with its result.
pub fn exec(f: impl Fn() -> Value + Send + Sync + 'static) -> Action {
    Action::from_proc("exec", move |ctx| {
        let value = f();
        async move { Outcome::success(value, ctx) }
    })
}

/// Turn an async procedure into an action. Alias of [`Action::from_proc`]
/// with a generic op name.
pub fn call<F, Fut>(proc: F) -> Action
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Outcome> + Send + 'static,
{
    Action::from_proc("call", proc)
}

/// Curried acceptor: applies the predicate to a value and succeeds with the
/// original value, failing only when the predicate returns false.
pub fn succeed_if(
    predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
) -> impl Fn(Value) -> Action + Send + Sync + 'static {
    let predicate = Arc::new(predicate);
    move |value: Value| {
        let predicate = predicate.clone();
        Action::from_proc("succeed_if", move |ctx| {
            let passed = predicate(&value);
            let value = value.clone();
            async move {
                if passed {
                    Outcome::success(value, ctx)
                } else {
                    Outcome::failure("predicate_failed", ctx)
                }
            }
        })
    }
}

/// Succeed with the predicate's result unless it is exactly `false`.
pub fn guard(predicate: impl Fn(&Context) -> Value + Send + Sync + 'static) -> Action {
    Action::from_proc("guard", move |ctx| {
        let result = predicate(&ctx);
        async move {
            if result.is_false() {
                Outcome::failure("guard_failed", ctx)
            } else {
                Outcome::success(result, ctx)
            }
        }
    })
    .with_icon("⌲")
}

/// Like [`guard`], but runs a fallback action when the predicate fails.
pub fn guard_or(
    predicate: impl Fn(&Context) -> Value + Send + Sync + 'static,
    fallback: Action,
) -> Action {
    Action::from_proc("guard", move |ctx| {
        let result = predicate(&ctx);
        let fallback = fallback.clone();
        async move {
            if result.is_false() {
                fallback.run(ctx).await
            } else {
                Outcome::success(result, ctx)
            }
        }
    })
    .with_icon("⌲")
}

// ============ sequencing and alternation ============

/// Left-to-right chain: each step sees the prior success value; stops at the
/// first non-success outcome. An empty chain succeeds with null.
pub fn seq(steps: impl IntoIterator<Item = Cont>) -> Action {
    let steps: Vec<Cont> = steps.into_iter().collect();
    Action::from_proc("seq", move |ctx| {
        let steps = steps.clone();
        async move {
            let mut outcome = Outcome::success(Value::null(), ctx);
            for step in steps {
                outcome = apply_cont(outcome, Some(step), None, None).await;
                if !outcome.is_success() {
                    break;
                }
            }
            outcome
        }
    })
    .with_icon("┉")
}

/// Sequential fold over items; stops at the first failure unless
/// `continue_if_failed`. An empty list succeeds with `true`.
pub fn seq_for(
    items: Vec<Json>,
    builder: impl Fn(Json) -> Action + Send + Sync + 'static,
    continue_if_failed: bool,
) -> Action {
    let builder = Arc::new(builder);
    Action::from_proc("seq_for", move |ctx| {
        let items = items.clone();
        let builder = builder.clone();
        async move {
            let mut last: Option<Outcome> = None;
            let mut current_ctx = ctx.clone();
            for item in items {
                let outcome = builder(item).run(current_ctx).await;
                if !outcome.is_success() && !continue_if_failed {
                    return outcome;
                }
                current_ctx = outcome.ctx().clone();
                last = Some(outcome);
            }
            last.unwrap_or_else(|| Outcome::success(true, ctx))
        }
    })
    .with_icon("┉")
}

/// First success wins; each later alternative starts from the context left
/// by the failed earlier one. Only Failure triggers fallthrough; exceptions
/// and cancellations propagate. Zero alternatives fail outright.
pub fn alt(alternatives: Vec<Action>) -> Action {
    Action::from_proc("alt", move |ctx| {
        let alternatives = alternatives.clone();
        async move {
            let mut current_ctx = ctx;
            for alternative in &alternatives {
                match alternative.run(current_ctx.clone()).await {
                    Outcome::Failure { ctx: failed, .. } => current_ctx = failed,
                    other => return other,
                }
            }
            Outcome::failure("alt_exhausted", current_ctx)
        }
    })
    .with_icon("ᗕ")
}

/// First-success-wins fold over items; empty or all-failing fails.
pub fn alt_for(
    items: Vec<Json>,
    builder: impl Fn(Json) -> Action + Send + Sync + 'static,
) -> Action {
    let builder = Arc::new(builder);
    Action::from_proc("alt_for", move |ctx| {
        let items = items.clone();
        let builder = builder.clone();
        async move {
            let mut current_ctx = ctx;
            for item in items {
                match builder(item).run(current_ctx.clone()).await {
                    Outcome::Failure { ctx: failed, .. } => current_ctx = failed,
                    other => return other,
                }
            }
            Outcome::failure("alt_exhausted", current_ctx)
        }
    })
    .with_icon("ᗕ")
}

// ============ dispatch and branching ============

/// One clause of a [`switch`].
#[derive(Clone)]
pub struct Case {
    value: Option<Json>,
    action: Action,
}

impl Case {
    /// Clause matched by resolved-value equality.
    pub fn when(value: impl Into<Json>, action: Action) -> Self {
        Self {
            value: Some(value.into()),
            action,
        }
    }

    /// Fallback clause when no value matches.
    pub fn otherwise(action: Action) -> Self {
        Self {
            value: None,
            action,
        }
    }
}

/// Evaluate the discriminant, compare its success value against each clause
/// in order, and run the first match (or the fallback clause).
pub fn switch(discriminant: Action, cases: Vec<Case>) -> Action {
    Action::from_proc("switch", move |ctx| {
        let discriminant = discriminant.clone();
        let cases = cases.clone();
        async move {
            match discriminant.run(ctx).await {
                Outcome::Success { value, ctx } => {
                    for case in &cases {
                        if let Some(literal) = &case.value {
                            if value.resolved() == literal {
                                return case.action.run(ctx).await;
                            }
                        }
                    }
                    if let Some(fallback) = cases.iter().find(|case| case.value.is_none()) {
                        return fallback.action.run(ctx).await;
                    }
                    Outcome::failure("no_matching_case", ctx)
                }
                Outcome::Failure { ctx, .. } => {
                    Outcome::failure("switch_discriminant_failed", ctx)
                }
                other => other,
            }
        }
    })
}

/// Continuation that coerces any non-exception outcome to success with the
/// outcome's value (null for failures). Default else-branch of [`branch`].
pub fn pass() -> Cont {
    Cont::bind(|value| succeed(value))
}

/// Two-way branch on an action's outcome: success runs `on_success`, failure
/// runs `on_failure`; cancellation and exceptions propagate.
pub fn branch(test: Action, on_success: impl Into<Cont>, on_failure: impl Into<Cont>) -> Action {
    test.fork(Some(on_success.into()), Some(on_failure.into()), None)
        .with_info("branch", vec![])
}

/// Filter by resolved-value equality.
pub fn equals(value: impl Into<Json>, action: Action) -> Action {
    let value = value.into();
    action.filter(move |candidate| candidate.resolved() == &value)
}

// ============ loops ============

/// Unbounded iteration. With `continue_if_failed`, a failing iteration is
/// coerced to success and looping continues forever; otherwise the loop
/// stops at the first failing iteration and succeeds with `true`, keeping
/// the failed iteration's context.
pub fn loop_run(body: Action, continue_if_failed: bool) -> Action {
    Action::from_proc("loop", move |ctx| {
        let body = body.clone();
        async move {
            let mut current_ctx = ctx;
            loop {
                match body.run(current_ctx).await {
                    Outcome::Success { ctx, .. } => current_ctx = ctx,
                    Outcome::Failure { ctx, .. } => {
                        if continue_if_failed {
                            current_ctx = ctx;
                        } else {
                            return Outcome::success(true, ctx);
                        }
                    }
                    other => return other,
                }
            }
        }
    })
    .with_icon("⟳")
}

/// Re-evaluate `cond` before every iteration; body failures are swallowed;
/// only `cond` failing stops the loop. Always succeeds with `true`.
pub fn loop_while(cond: Action, body: Action) -> Action {
    Action::from_proc("loop_while", move |ctx| {
        let cond = cond.clone();
        let body = body.clone();
        async move {
            let mut current_ctx = ctx;
            loop {
                match cond.run(current_ctx).await {
                    Outcome::Success { ctx, .. } => match body.run(ctx).await {
                        Outcome::Success { ctx, .. } | Outcome::Failure { ctx, .. } => {
                            current_ctx = ctx;
                        }
                        other => return other,
                    },
                    Outcome::Failure { ctx, .. } => return Outcome::success(true, ctx),
                    other => return other,
                }
            }
        }
    })
    .with_icon("⟳")
}

/// Run the action exactly `n` times, returning the last result; a failing
/// iteration stops the run. `n <= 0` runs nothing and succeeds with `true`.
pub fn repeat(n: i64, action: Action) -> Action {
    Action::from_proc("repeat", move |ctx| {
        let action = action.clone();
        async move {
            if n <= 0 {
                return Outcome::success(true, ctx);
            }
            let mut current_ctx = ctx;
            let mut outcome;
            let mut remaining = n;
            loop {
                outcome = action.run(current_ctx).await;
                remaining -= 1;
                if remaining == 0 || !outcome.is_success() {
                    return outcome;
                }
                current_ctx = outcome.ctx().clone();
            }
        }
    })
    .with_icon("⟳")
}

// ============ environment and store ============

/// Read a dot-path from the local scope; fails when unset.
pub fn env_get(key: impl Into<String>) -> Action {
    let key = key.into();
    Action::from_proc("env_get", move |ctx| {
        let key = key.clone();
        async move {
            match ctx.env_read(&key) {
                Some(value) => {
                    let value = value.clone();
                    Outcome::success(Value::Data(value), ctx)
                }
                None => Outcome::failure_with_message(
                    "missing_value",
                    ctx,
                    format!("no value for {key}"),
                ),
            }
        }
    })
}

/// Set a dot-path in the local scope; succeeds with the stored value.
pub fn env_set(key: impl Into<String>, value: impl Into<Value>) -> Action {
    let key = key.into();
    let value = value.into();
    Action::from_proc("env_set", move |ctx| {
        let next = ctx.with_env(&key, value.resolved().clone());
        let value = value.clone();
        async move { Outcome::success(value, next) }
    })
}

/// Bind an action's success value to a dot-path in the local scope.
pub fn env_let(key: impl Into<String>, action: Action) -> Action {
    let key = key.into();
    action
        .fork(
            Some(Cont::bind(move |value| env_set(key.clone(), value))),
            None,
            None,
        )
        .with_info("env_let", vec![])
}

/// Read a dot-path from the store; fails when unset.
pub fn store_get(key: impl Into<String>) -> Action {
    let key = key.into();
    Action::from_proc("store_get", move |ctx| {
        let key = key.clone();
        async move {
            match ctx.store_read(&key) {
                Some(value) => {
                    let value = value.clone();
                    Outcome::success(Value::Data(value), ctx)
                }
                None => Outcome::failure_with_message(
                    "missing_value",
                    ctx,
                    format!("no value for {key}"),
                ),
            }
        }
    })
}

/// Set a dot-path in the store; succeeds with the stored value.
pub fn store_set(key: impl Into<String>, value: impl Into<Value>) -> Action {
    let key = key.into();
    let value = value.into();
    Action::from_proc("store_set", move |ctx| {
        let next = ctx.with_store(&key, value.resolved().clone());
        let value = value.clone();
        async move { Outcome::success(value, next) }
    })
}

// ============ dataframes ============

/// Succeed with a live frame's slot-value snapshot.
pub fn frame_get(name: impl Into<String>) -> Action {
    let name = name.into();
    Action::from_proc("frame_get", move |ctx| {
        let name = name.clone();
        async move {
            match ctx.frame(&name) {
                Some(frame) => {
                    let values = frame.slot_values();
                    Outcome::success(Value::Data(Json::Object(values)), ctx)
                }
                None => Outcome::failure("frame_not_found", ctx),
            }
        }
    })
}

/// Read one slot's resolved value from a live frame; fails when unfilled.
pub fn slot_get(frame: impl Into<String>, slot: impl Into<String>) -> Action {
    let frame = frame.into();
    let slot = slot.into();
    Action::from_proc("slot_get", move |ctx| {
        let frame = frame.clone();
        let slot = slot.clone();
        async move {
            let Some(live) = ctx.frame(&frame) else {
                return Outcome::failure("frame_not_found", ctx);
            };
            match live.slot_value(&slot) {
                Some(value) => Outcome::success(Value::Data(value), ctx),
                None => Outcome::failure_with_message(
                    "missing_value",
                    ctx,
                    format!("slot {slot} of {frame} is unfilled"),
                ),
            }
        }
    })
}

/// Store a value into a slot of a live frame; succeeds with the value.
pub fn slot_set(
    frame: impl Into<String>,
    slot: impl Into<String>,
    value: impl Into<Value>,
) -> Action {
    let frame = frame.into();
    let slot = slot.into();
    let value = value.into();
    Action::from_proc("slot_set", move |ctx| {
        let frame_name = frame.clone();
        let slot = slot.clone();
        let value = value.clone();
        async move {
            let Some(live) = ctx.frame(&frame_name) else {
                return Outcome::failure("frame_not_found", ctx);
            };
            let mut live = live.clone();
            if !live.set_slot(&slot, value.clone()) {
                return Outcome::failure_with_message(
                    "slot_not_found",
                    ctx,
                    format!("no slot {slot} in {frame_name}"),
                );
            }
            Outcome::success(value, ctx.with_frame(live))
        }
    })
}

// ============ reactors ============

/// Register a Top-level reactor bound to an intent for the rest of the
/// enclosing scope; succeeds with `true`.
pub fn on_intent(
    intent: impl Into<String>,
    builder: impl Fn(Value) -> Action + Send + Sync + 'static,
) -> Action {
    let template = reactor_from_intent(intent, builder);
    Action::from_proc("on", move |ctx| {
        let mut reactor = template.clone();
        reactor.owner = ctx.owner_name();
        ctx.conversation.trace.trace(&TraceEvent::ReactorPushed {
            level: ReactorLevel::Top.as_str().to_string(),
            name: reactor.name.clone(),
        });
        let next = ctx.with_reactor(ReactorLevel::Top, reactor);
        async move { Outcome::success(true, next) }
    })
    .with_icon("⌮")
}
