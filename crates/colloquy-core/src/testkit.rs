//! Test support: scripted conversations, outcome assertions, counter
//! actions.
//!
//! Scripted answers use a small convention: a `{...}` answer is a
//! pre-parsed entity, a `#name` answer is a coded request carrying an
//! intent, anything else is plain text.

use std::sync::{Arc, Mutex};

use serde_json::Value as Json;

use crate::action::Action;
use crate::channel::{CollectingOutput, ScriptedSource};
use crate::combinators::{exec, guard};
use crate::context::Context;
use crate::conversation::Conversation;
use crate::event::{Event, ParsedIntent, Utterance};
use crate::outcome::Outcome;
use crate::value::{Entity, Value};

/// Turn a scripted answer into a user event.
pub fn read_answer(answer: &str) -> Event {
    let text = answer.trim();
    let mut utterance = Utterance::from_text(text);

    if text.starts_with('{') && text.ends_with('}') {
        if let Ok(parsed) = serde_json::from_str::<Json>(text) {
            let entity = Entity::new(
                parsed["text"].as_str().unwrap_or(text),
                parsed["val"].clone(),
                parsed["type"].as_str().unwrap_or("any"),
            );
            utterance.intents.push(ParsedIntent {
                name: "<scripted>".to_string(),
                entities: vec![entity],
                confidence: 1.0,
            });
        }
    } else if let Some(coded) = text.strip_prefix('#') {
        utterance.intents.push(ParsedIntent {
            name: coded.to_string(),
            entities: Vec::new(),
            confidence: 1.0,
        });
    }

    Event::user_utterance(utterance)
}

/// Conversation served from scripted answers, output collected.
pub fn scripted_conversation(answers: &[&str]) -> (Arc<Conversation>, Arc<CollectingOutput>) {
    let output = Arc::new(CollectingOutput::new());
    let source = Arc::new(ScriptedSource::new(
        answers.iter().map(|answer| read_answer(answer)),
    ));
    let conversation = Conversation::builder()
        .source(source)
        .output(output.clone())
        .build();
    (conversation, output)
}

/// Root context over a scripted conversation.
pub fn scripted_context(answers: &[&str]) -> (Context, Arc<CollectingOutput>) {
    let (conversation, output) = scripted_conversation(answers);
    (Context::new(conversation), output)
}

/// Run an action against a scripted context.
pub async fn run_scripted(action: &Action, answers: &[&str]) -> Outcome {
    let (ctx, _) = scripted_context(answers);
    action.run(ctx).await
}

/// Run an action against a scripted context, returning collected output.
pub async fn run_scripted_with_output(
    action: &Action,
    answers: &[&str],
) -> (Outcome, Vec<String>) {
    let (ctx, output) = scripted_context(answers);
    let outcome = action.run(ctx).await;
    (outcome, output.texts())
}

/// Assert success with an expected resolved value.
#[track_caller]
pub fn expect_success(outcome: &Outcome, expected: impl Into<Json>) {
    let expected = expected.into();
    match outcome {
        Outcome::Success { value, .. } => {
            assert_eq!(value.resolved(), &expected, "unexpected success value");
        }
        other => panic!("expected success with {expected}, got {other:?}"),
    }
}

/// Assert failure, optionally with an expected reason token.
#[track_caller]
pub fn expect_failure(outcome: &Outcome, expected_reason: Option<&str>) {
    match outcome {
        Outcome::Failure { reason, .. } => {
            if let Some(expected) = expected_reason {
                assert_eq!(reason, expected, "unexpected failure reason");
            }
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

/// Assert an exception with an expected error type.
#[track_caller]
pub fn expect_exception(outcome: &Outcome, expected_type: &str) {
    match outcome {
        Outcome::Exception { error_type, .. } => {
            assert_eq!(error_type, expected_type, "unexpected error type");
        }
        other => panic!("expected exception {expected_type}, got {other:?}"),
    }
}

/// A bounded counter exposed as actions: `iter` increments until the bound
/// and fails past it, `count` reads the current value.
#[derive(Clone)]
pub struct Counter {
    state: Arc<Mutex<i64>>,
    max: Option<i64>,
}

impl Counter {
    pub fn new(max: Option<i64>) -> Self {
        Self {
            state: Arc::new(Mutex::new(0)),
            max,
        }
    }

    /// Increment action; fails once the bound is reached.
    pub fn iter(&self) -> Action {
        let state = self.state.clone();
        let max = self.max;
        guard(move |_ctx| {
            let mut count = state.lock().expect("counter lock");
            if max.is_some_and(|max| *count >= max) {
                return Value::from(false);
            }
            *count += 1;
            Value::from(*count)
        })
    }

    /// Read action.
    pub fn count(&self) -> Action {
        let state = self.state.clone();
        exec(move || Value::from(*state.lock().expect("counter lock")))
    }

    /// Reset the counter directly.
    pub fn reset(&self) {
        *self.state.lock().expect("counter lock") = 0;
    }

    /// Current value, directly.
    pub fn value(&self) -> i64 {
        *self.state.lock().expect("counter lock")
    }
}
