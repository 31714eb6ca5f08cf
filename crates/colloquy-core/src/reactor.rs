//! Reactors - side-channel event handlers that can interrupt a pending
//! question.
//!
//! A matched reactor handles the side event and hands its context back to
//! the asker, which then restarts the question from scratch. Reactors never
//! answer the question.

use std::sync::Arc;

use crate::action::Action;
use crate::context::Context;
use crate::event::{Event, TraceEvent};
use crate::outcome::Outcome;
use crate::value::Value;

type AcceptFn = Arc<dyn Fn(&Event, &Context) -> Option<Value> + Send + Sync>;
type ReactionFn = Arc<dyn Fn(Value) -> Action + Send + Sync>;

/// Priority level a reactor is registered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactorLevel {
    /// Explicit registrations, highest priority
    Top,
    /// Auto-registered while a slot-filling dialogue is active
    Dataframe,
}

impl ReactorLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Dataframe => "dataframe",
        }
    }
}

/// An event-triggered side-channel handler.
#[derive(Clone)]
pub struct Reactor {
    /// Reactor name, for tracing
    pub name: String,
    /// Display icon
    pub icon: String,
    /// Owning task or agent at registration time
    pub owner: Option<String>,
    accept: AcceptFn,
    action: ReactionFn,
}

impl Reactor {
    pub fn new(
        name: impl Into<String>,
        accept: impl Fn(&Event, &Context) -> Option<Value> + Send + Sync + 'static,
        action: impl Fn(Value) -> Action + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            icon: "🜙".to_string(),
            owner: None,
            accept: Arc::new(accept),
            action: Arc::new(action),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Try to match an event; a `Some` result wins the dispatch.
    pub fn try_accept(&self, event: &Event, ctx: &Context) -> Option<Value> {
        (self.accept)(event, ctx)
    }

    /// Build the reaction for a match result.
    pub fn reaction(&self, matched: Value) -> Action {
        (self.action)(matched)
    }
}

impl std::fmt::Debug for Reactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reactor")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// Per-level reactor lists, most recently registered first.
#[derive(Debug, Clone, Default)]
pub struct ReactorTable {
    top: Vec<Reactor>,
    dataframe: Vec<Reactor>,
}

impl ReactorTable {
    /// Register a reactor at the front of its level.
    pub fn push(&mut self, level: ReactorLevel, reactor: Reactor) {
        self.level_mut(level).insert(0, reactor);
    }

    /// Remove the most recently registered reactor of a level.
    pub fn pop(&mut self, level: ReactorLevel) -> Option<Reactor> {
        let list = self.level_mut(level);
        if list.is_empty() {
            None
        } else {
            Some(list.remove(0))
        }
    }

    pub fn at_level(&self, level: ReactorLevel) -> &[Reactor] {
        match level {
            ReactorLevel::Top => &self.top,
            ReactorLevel::Dataframe => &self.dataframe,
        }
    }

    fn level_mut(&mut self, level: ReactorLevel) -> &mut Vec<Reactor> {
        match level {
            ReactorLevel::Top => &mut self.top,
            ReactorLevel::Dataframe => &mut self.dataframe,
        }
    }
}

/// Result of dispatching an event through the reactor table.
pub struct ReactorMatch {
    /// Name of the matched reactor
    pub reactor: String,
    /// Outcome of running its reaction
    pub outcome: Outcome,
}

/// Try all reactors against an event: `Top` level first, then `Dataframe`;
/// within a level, most recently registered first. The first accepting
/// reactor wins and its reaction runs against the given context.
pub async fn try_reactors(ctx: &Context, event: &Event) -> Option<ReactorMatch> {
    for level in [ReactorLevel::Top, ReactorLevel::Dataframe] {
        for reactor in ctx.reactors.at_level(level) {
            let Some(matched) = reactor.try_accept(event, ctx) else {
                continue;
            };
            ctx.conversation.trace.trace(&TraceEvent::ReactorMatched {
                level: level.as_str().to_string(),
                name: reactor.name.clone(),
            });
            tracing::debug!(reactor = %reactor.name, level = level.as_str(), "reactor matched");
            let outcome = reactor.reaction(matched).run(ctx.clone()).await;
            return Some(ReactorMatch {
                reactor: reactor.name.clone(),
                outcome,
            });
        }
    }
    None
}

/// Reactor matching a named intent through the conversation's catalog.
pub fn reactor_from_intent(
    intent: impl Into<String>,
    action: impl Fn(Value) -> Action + Send + Sync + 'static,
) -> Reactor {
    let intent = intent.into();
    let accept_intent = intent.clone();
    Reactor::new(
        format!("on:{intent}"),
        move |event: &Event, ctx: &Context| {
            let utterance = event.utterance.as_ref()?;
            ctx.conversation
                .intents
                .match_utterance(utterance, &accept_intent)
        },
        action,
    )
}
