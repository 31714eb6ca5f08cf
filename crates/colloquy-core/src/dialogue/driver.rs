//! IO primitives and the single-question wait loop.
//!
//! `present_and_wait` is the engine's only suspension point: it presents a
//! prompt, awaits the conversation's event source, and dispatches the event
//! through help handling and the reactor table before letting the acceptor
//! consume it. A reactor interruption re-presents the same prompt.

use std::sync::Arc;

use serde_json::Value as Json;

use crate::action::Action;
use crate::context::Context;
use crate::event::{BotUtterance, TraceEvent, Utterance};
use crate::messages::resolve_text;
use crate::outcome::Outcome;
use crate::reactor::try_reactors;
use crate::types::EntityType;
use crate::value::Entity;

use super::ask::ValueFilter;

/// Resolve a message and hand it to the output sink.
///
/// The message is first looked up in the conversation's catalog for the
/// current language; an unresolved key is used verbatim. `#{key}` references
/// interpolate against the message data.
pub fn emit_say(ctx: &Context, message: &str, data: &Json) {
    let key = message.trim();
    let conversation = &ctx.conversation;
    let localized = conversation.messages.resolve(&conversation.language, key);
    let pattern = localized.unwrap_or(key);
    let text = resolve_text(pattern, data);
    let utterance = BotUtterance {
        text,
        key: localized.map(|_| key.to_string()),
    };
    conversation.output.utterance(&utterance);
}

/// Say a message; succeeds with the message itself.
pub fn say(message: impl Into<String>) -> Action {
    say_with(message, Json::Null)
}

/// Say a message with interpolation data; succeeds with the message itself.
pub fn say_with(message: impl Into<String>, data: Json) -> Action {
    let message = message.into();
    Action::from_proc("say", move |ctx| {
        let message = message.clone();
        let data = data.clone();
        async move {
            emit_say(&ctx, &message, &data);
            Outcome::success(message.clone(), ctx)
        }
    })
    .with_icon(">")
}

/// Parses an answer against an expected type and optional value filter.
pub(crate) struct Acceptor {
    entity_type: Arc<EntityType>,
    filter: Option<ValueFilter>,
}

impl Acceptor {
    pub(crate) fn new(entity_type: Arc<EntityType>, filter: Option<ValueFilter>) -> Self {
        Self {
            entity_type,
            filter,
        }
    }

    fn accept(&self, utterance: &Utterance) -> Option<Entity> {
        let entity = utterance.extract_type(&self.entity_type)?;
        if let Some(filter) = &self.filter {
            if !filter(&entity.value) {
                return None;
            }
        }
        Some(entity)
    }
}

/// Outcome of one present-and-wait round.
pub(crate) enum AskWait {
    /// The acceptor consumed the event.
    Accepted { entity: Entity, ctx: Context },
    /// The event was not acceptable.
    Rejected { ctx: Context },
    /// The event source is closed (or out of scripted answers).
    Exhausted { ctx: Context },
}

/// Present a prompt and wait for one consumable answer.
///
/// Help requests and reactor matches are handled inline: they adopt the
/// reaction's context, re-present the prompt, and keep waiting - only a true
/// accept or reject ends the round, so interruptions never consume an ask
/// attempt.
pub(crate) async fn present_and_wait(
    ctx: Context,
    prompt: &str,
    acceptor: &Acceptor,
    data: &Json,
    attempts: u32,
) -> AskWait {
    let mut ctx = ctx;
    let mut prompt_override: Option<String> = None;
    loop {
        let current = prompt_override.as_deref().unwrap_or(prompt);
        emit_say(&ctx, current, data);
        ctx.conversation.trace.trace(&TraceEvent::AskPrompted {
            prompt: current.to_string(),
            attempts,
        });

        let Some(event) = ctx.conversation.source.receive().await else {
            return AskWait::Exhausted { ctx };
        };

        if event.text() == Some("#help") {
            let help_key = format!("{prompt}_help");
            let conversation = &ctx.conversation;
            prompt_override = conversation
                .messages
                .has_message(&conversation.language, &help_key)
                .then_some(help_key);
            continue;
        }

        if let Some(matched) = try_reactors(&ctx, &event).await {
            ctx.conversation.trace.trace(&TraceEvent::AskInterrupted {
                prompt: prompt.to_string(),
            });
            tracing::debug!(reactor = %matched.reactor, "question interrupted, re-asking");
            ctx = matched.outcome.into_ctx();
            prompt_override = None;
            continue;
        }

        let accepted = event
            .utterance
            .as_ref()
            .and_then(|utterance| acceptor.accept(utterance));
        match accepted {
            Some(entity) => {
                ctx.conversation.trace.trace(&TraceEvent::AskAccepted {
                    prompt: prompt.to_string(),
                });
                return AskWait::Accepted { entity, ctx };
            }
            None => {
                ctx.conversation.trace.trace(&TraceEvent::AskRejected {
                    prompt: prompt.to_string(),
                    attempts,
                });
                return AskWait::Rejected { ctx };
            }
        }
    }
}

/// Parameters for the low-level single-round ask.
#[derive(Clone, Default)]
pub struct AskOnceParams {
    /// Expected answer type; empty means `any`
    pub type_name: String,
    /// Extra acceptance predicate over the parsed value
    pub filter: Option<ValueFilter>,
    /// Interpolation data for the prompt
    pub message_data: Json,
}

/// One prompt, one consumable answer: no retries, no confirmation.
pub fn ask_once(message: impl Into<String>, params: AskOnceParams) -> Action {
    let message = message.into();
    Action::from_proc("ask_once", move |ctx| {
        let message = message.clone();
        let params = params.clone();
        async move {
            let type_name = if params.type_name.is_empty() {
                "any"
            } else {
                &params.type_name
            };
            let Some(entity_type) = ctx.conversation.types.get(type_name) else {
                return Outcome::exception(
                    "unknown_type",
                    serde_json::json!({ "type": type_name }),
                    ctx,
                );
            };
            let acceptor = Acceptor::new(entity_type, params.filter.clone());
            match present_and_wait(ctx, &message, &acceptor, &params.message_data, 0).await {
                AskWait::Accepted { entity, ctx } => Outcome::success(entity, ctx),
                AskWait::Rejected { ctx } | AskWait::Exhausted { ctx } => {
                    Outcome::failure("ask_failed", ctx)
                }
            }
        }
    })
    .with_icon("ᗏ")
}
