//! Task - a named action establishing a tracing and exception scope.
//!
//! Per-invocation state (ask attempt counters and the like) lives in
//! stack-local activation records inside the wrapped procedure; a task value
//! itself carries no mutable run state and may be reused freely.

use crate::action::Action;
use crate::context::TaskFrame;
use crate::event::TraceEvent;
use crate::outcome::Outcome;

/// Specification of a task wrapper.
#[derive(Clone)]
pub struct TaskSpec {
    /// Task name, pushed on the scope stack
    pub name: String,
    /// Display icon
    pub icon: Option<String>,
    /// Wrapped action
    pub action: Action,
    /// Exception handlers scoped to this task
    pub handlers: Vec<(String, Action)>,
}

impl TaskSpec {
    pub fn new(name: impl Into<String>, action: Action) -> Self {
        Self {
            name: name.into(),
            icon: None,
            action,
            handlers: Vec::new(),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn on_exception(mut self, error_type: impl Into<String>, handler: Action) -> Self {
        self.handlers.push((error_type.into(), handler));
        self
    }
}

/// Wrap an action in a named task scope.
pub fn task(name: impl Into<String>, action: Action) -> Action {
    task_with(TaskSpec::new(name, action))
}

/// Wrap an action in a task scope built from a full spec.
pub fn task_with(spec: TaskSpec) -> Action {
    let name = spec.name.clone();
    Action::from_proc("task", move |ctx| {
        let spec = spec.clone();
        async move {
            let saved_tasks = ctx.tasks.clone();
            let frame = TaskFrame {
                name: spec.name.clone(),
                icon: spec.icon.clone(),
            };
            let inner_ctx = ctx.with_task(frame);
            inner_ctx.conversation.trace.trace(&TraceEvent::TaskEnter {
                name: spec.name.clone(),
            });
            tracing::debug!(task = %spec.name, "task enter");

            let mut outcome = spec.action.run(inner_ctx).await;

            if let Outcome::Exception {
                error_type,
                ctx: exception_ctx,
                ..
            } = &outcome
            {
                if let Some((_, handler)) = spec
                    .handlers
                    .iter()
                    .find(|(token, _)| token == error_type)
                {
                    outcome = handler.run(exception_ctx.clone()).await;
                }
            }

            outcome.ctx().conversation.trace.trace(&TraceEvent::TaskLeave {
                name: spec.name.clone(),
            });
            tracing::debug!(task = %spec.name, "task leave");

            outcome.map_ctx(|mut restored| {
                restored.tasks = saved_tasks.clone();
                restored
            })
        }
    })
    .with_info("task", vec![name])
}
