//! Action - the composable unit of dialogue computation.
//!
//! An action is an immutable, cheaply cloneable description of one async
//! step `Context -> Outcome`. Composition happens through [`Action::fork`]
//! and the explicit [`Cont`] continuation type: combinator authors pick
//! `Then`/`Bind`/`Map` statically, the engine never inspects a runtime value
//! to guess which one was meant.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::context::Context;
use crate::outcome::{Outcome, RUNTIME_FAULT};
use crate::value::Value;

static NEXT_ACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Boxed async procedure wrapped by an action.
pub type ActionProc = Arc<dyn Fn(Context) -> BoxFuture<'static, Outcome> + Send + Sync>;

/// Introspection record for one action node.
#[derive(Debug, Clone)]
pub struct ActionInfo {
    /// Unique id, for tracing
    pub id: u64,
    /// Operation name
    pub op: String,
    /// Rendered arguments
    pub args: Vec<String>,
    /// Display icon
    pub icon: Option<String>,
}

impl ActionInfo {
    fn new(op: impl Into<String>) -> Self {
        Self {
            id: NEXT_ACTION_ID.fetch_add(1, Ordering::Relaxed),
            op: op.into(),
            args: Vec::new(),
            icon: None,
        }
    }

    /// Render as `op(arg, arg)`.
    pub fn describe(&self) -> String {
        format!("{}({})", self.op, self.args.join(", "))
    }
}

/// Explicit continuation attached to a fork branch.
#[derive(Clone)]
pub enum Cont {
    /// Discard the value and run the action on the outcome's context.
    Then(Action),
    /// Apply the function to the outcome's value (null for non-success
    /// outcomes) and run the resulting action on the outcome's context.
    Bind(Arc<dyn Fn(Value) -> Action + Send + Sync>),
    /// Transform a success value in place; non-success outcomes pass
    /// through unchanged.
    Map(Arc<dyn Fn(Value) -> Value + Send + Sync>),
}

impl Cont {
    /// Bind continuation from a closure.
    pub fn bind(f: impl Fn(Value) -> Action + Send + Sync + 'static) -> Self {
        Self::Bind(Arc::new(f))
    }

    /// Map continuation from a closure.
    pub fn map(f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self::Map(Arc::new(f))
    }
}

impl From<Action> for Cont {
    fn from(action: Action) -> Self {
        Self::Then(action)
    }
}

impl std::fmt::Debug for Cont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Then(action) => write!(f, "Then({})", action.info().describe()),
            Self::Bind(_) => write!(f, "Bind(..)"),
            Self::Map(_) => write!(f, "Map(..)"),
        }
    }
}

/// Dispatch an outcome into fork continuations.
///
/// Exceptions bypass all three branches; they are only intercepted by a
/// node's own handler table.
pub async fn apply_cont(
    outcome: Outcome,
    on_success: Option<Cont>,
    on_fail: Option<Cont>,
    on_cancel: Option<Cont>,
) -> Outcome {
    if outcome.is_exception() {
        return outcome;
    }
    let cont = match &outcome {
        Outcome::Success { .. } => on_success,
        Outcome::Cancellation { .. } => on_cancel,
        _ => on_fail,
    };
    let Some(cont) = cont else {
        return outcome;
    };
    match cont {
        Cont::Then(action) => action.run(outcome.into_ctx()).await,
        Cont::Bind(f) => {
            let value = outcome.value().cloned().unwrap_or_default();
            let ctx = outcome.into_ctx();
            f(value).run(ctx).await
        }
        Cont::Map(f) => match outcome {
            Outcome::Success { value, ctx } => Outcome::Success {
                value: f(value),
                ctx,
            },
            other => other,
        },
    }
}

/// Composable description of one asynchronous computation step.
#[derive(Clone)]
pub struct Action {
    info: Arc<ActionInfo>,
    proc: ActionProc,
    handlers: Arc<HashMap<String, Action>>,
}

impl Action {
    /// Build an action from an async procedure.
    pub fn from_proc<F, Fut>(op: impl Into<String>, proc: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        Self {
            info: Arc::new(ActionInfo::new(op)),
            proc: Arc::new(move |ctx| proc(ctx).boxed()),
            handlers: Arc::new(HashMap::new()),
        }
    }

    /// Introspection record.
    pub fn info(&self) -> &ActionInfo {
        &self.info
    }

    /// Rename the node and attach rendered arguments.
    pub fn with_info(mut self, op: impl Into<String>, args: Vec<String>) -> Self {
        let mut info = ActionInfo::new(op);
        info.id = self.info.id;
        info.args = args;
        info.icon = self.info.icon.clone();
        self.info = Arc::new(info);
        self
    }

    /// Attach a display icon.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        let mut info = (*self.info).clone();
        info.icon = Some(icon.into());
        self.info = Arc::new(info);
        self
    }

    /// Attach an exception handler for an error-type token.
    ///
    /// Only the nearest enclosing node whose table defines the token
    /// intercepts a raised exception.
    pub fn on_exception(mut self, error_type: impl Into<String>, handler: Action) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.insert(error_type.into(), handler);
        self.handlers = Arc::new(handlers);
        self
    }

    /// Run the action against a context.
    pub fn run(&self, ctx: Context) -> BoxFuture<'static, Outcome> {
        let action = self.clone();
        async move { action.run_inner(ctx).await }.boxed()
    }

    async fn run_inner(self, ctx: Context) -> Outcome {
        let saved_focus = ctx.focus.clone();
        let mut inner_ctx = ctx.clone();
        inner_ctx.focus.insert(0, self.info.clone());

        let outcome = match AssertUnwindSafe((self.proc)(inner_ctx)).catch_unwind().await {
            Ok(outcome) => self.handle_exceptions(outcome).await,
            Err(panic) => {
                let message = panic_text(panic);
                tracing::error!(
                    action = %self.info.describe(),
                    focus = ?ctx.focus_trace(),
                    %message,
                    "panic caught at action boundary"
                );
                Outcome::failure_with_message(RUNTIME_FAULT, ctx.clone(), message)
            }
        };

        outcome.map_ctx(|mut restored| {
            restored.focus = saved_focus.clone();
            restored
        })
    }

    /// Apply this node's handler table to an outcome.
    async fn handle_exceptions(&self, outcome: Outcome) -> Outcome {
        if let Outcome::Exception {
            error_type, ctx, ..
        } = &outcome
        {
            if let Some(handler) = self.handlers.get(error_type) {
                tracing::debug!(error_type, "exception intercepted by handler");
                return handler.run(ctx.clone()).await;
            }
        }
        outcome
    }

    /// Fork the result into per-kind continuations.
    pub fn fork(
        &self,
        on_success: Option<Cont>,
        on_fail: Option<Cont>,
        on_cancel: Option<Cont>,
    ) -> Action {
        let prev = self.clone();
        Action::from_proc("fork", move |ctx| {
            let prev = prev.clone();
            let on_success = on_success.clone();
            let on_fail = on_fail.clone();
            let on_cancel = on_cancel.clone();
            async move {
                let outcome = prev.run(ctx).await;
                apply_cont(outcome, on_success, on_fail, on_cancel).await
            }
        })
    }

    /// Sequence: on success, run `next` (value discarded).
    pub fn then(&self, next: Action) -> Action {
        self.fork(Some(Cont::Then(next)), None, None)
            .with_info("then", vec![self.info.describe()])
    }

    /// Monadic bind: on success, build the next action from the value.
    pub fn bind(&self, f: impl Fn(Value) -> Action + Send + Sync + 'static) -> Action {
        self.fork(Some(Cont::bind(f)), None, None)
            .with_info("bind", vec![self.info.describe()])
    }

    /// Transform the success value without touching the context.
    pub fn map(&self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Action {
        self.fork(Some(Cont::map(f)), None, None)
            .with_info("map", vec![self.info.describe()])
    }

    /// On failure, run the fallback against the post-failure context.
    pub fn or_else(&self, fallback: impl Into<Cont>) -> Action {
        self.fork(None, Some(fallback.into()), None)
            .with_info("or_else", vec![self.info.describe()])
    }

    /// On cancellation, run the handler.
    pub fn on_cancel(&self, handler: Action) -> Action {
        self.fork(None, None, Some(Cont::Then(handler)))
            .with_info("on_cancel", vec![self.info.describe()])
    }

    /// Keep success values satisfying the predicate; fail the rest.
    pub fn filter(&self, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Action {
        let prev = self.clone();
        let predicate = Arc::new(predicate);
        Action::from_proc("filter", move |ctx| {
            let prev = prev.clone();
            let predicate = predicate.clone();
            async move {
                match prev.run(ctx).await {
                    Outcome::Success { value, ctx } if !predicate(&value) => {
                        Outcome::failure("filtered_out", ctx)
                    }
                    other => other,
                }
            }
        })
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.info.id)
            .field("op", &self.info.op)
            .finish_non_exhaustive()
    }
}

fn panic_text(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "panic of unknown type".to_string()
    }
}
