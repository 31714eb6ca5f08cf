//! Agents - named bot roots with their own handlers and ask policy.

use std::sync::Arc;

use serde_json::json;

use crate::action::Action;
use crate::event::TraceEvent;
use crate::outcome::Outcome;
use crate::task::{task_with, TaskSpec};

/// Global ask policy defaults.
#[derive(Debug, Clone)]
pub struct AskPolicy {
    /// Attempt limit before an ask gives up
    pub max_attempts: u32,
    /// Promote exhaustion from Failure to Exception
    pub exception_on_max_attempts: bool,
}

impl Default for AskPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            exception_on_max_attempts: false,
        }
    }
}

/// Conversation-wide policy defaults.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    pub ask: AskPolicy,
}

/// Agent-level ask policy override; unset fields fall through to the global
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct AskPolicyOverride {
    pub max_attempts: Option<u32>,
    pub exception_on_max_attempts: Option<bool>,
}

/// Agent-level policy override.
#[derive(Debug, Clone, Default)]
pub struct PolicyOverride {
    pub ask: AskPolicyOverride,
}

/// The agent profile carried on the context while an agent runs.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub name: String,
    pub icon: Option<String>,
    pub policy: PolicyOverride,
}

/// A named bot root: main action, exception handlers, ask policy.
#[derive(Clone)]
pub struct Agent {
    pub name: String,
    icon: Option<String>,
    policy: PolicyOverride,
    handlers: Vec<(String, Action)>,
    main: Option<Action>,
}

impl Agent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: None,
            policy: PolicyOverride::default(),
            handlers: Vec::new(),
            main: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_policy(mut self, policy: PolicyOverride) -> Self {
        self.policy = policy;
        self
    }

    /// Attach an agent-level exception handler.
    pub fn on_exception(mut self, error_type: impl Into<String>, handler: Action) -> Self {
        self.handlers.push((error_type.into(), handler));
        self
    }

    /// Set the agent's main action.
    pub fn with_main(mut self, main: Action) -> Self {
        self.main = Some(main);
        self
    }

    /// The runnable form of the agent.
    ///
    /// Running it sets the agent profile, wraps `main` in a `<name>:main`
    /// task carrying the agent handlers, and restores the prior profile and
    /// reactor registry on exit. Exceptions no handler intercepts terminate
    /// the step at the conversation boundary.
    pub fn to_action(&self) -> Action {
        let agent = self.clone();
        let op_name = agent.name.clone();
        Action::from_proc("agent", move |ctx| {
            let agent = agent.clone();
            async move {
                let Some(main) = agent.main.clone() else {
                    return Outcome::exception(
                        "agent_without_main",
                        json!({ "agent": agent.name }),
                        ctx,
                    );
                };
                let saved_agent = ctx.agent.clone();
                let saved_reactors = ctx.reactors.clone();

                let profile = Arc::new(AgentProfile {
                    name: agent.name.clone(),
                    icon: agent.icon.clone(),
                    policy: agent.policy.clone(),
                });
                let inner_ctx = ctx.with_agent(Some(profile));
                inner_ctx.conversation.trace.trace(&TraceEvent::AgentEnter {
                    name: agent.name.clone(),
                });
                tracing::debug!(agent = %agent.name, "agent enter");

                let mut spec = TaskSpec::new(format!("{}:main", agent.name), main)
                    .with_icon(agent.icon.clone().unwrap_or_else(|| "⍊".to_string()));
                for (error_type, handler) in &agent.handlers {
                    spec = spec.on_exception(error_type.clone(), handler.clone());
                }
                let outcome = task_with(spec).run(inner_ctx).await;

                outcome.ctx().conversation.trace.trace(&TraceEvent::AgentLeave {
                    name: agent.name.clone(),
                });
                tracing::debug!(agent = %agent.name, "agent leave");

                outcome.map_ctx(|mut restored| {
                    restored.agent = saved_agent.clone();
                    restored.reactors = saved_reactors.clone();
                    restored
                })
            }
        })
        .with_info("agent", vec![op_name])
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}
