//! Channel abstractions - how a conversation reaches the outside world.
//!
//! The engine only ever sees three narrow surfaces:
//! - [`EventSource`]: the mailbox the ask boundary waits on
//! - [`OutputSink`]: where resolved bot utterances go
//! - [`TraceSink`]: observational lifecycle notifications
//!
//! Real transports implement these; tests substitute a scripted source and a
//! collecting sink.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::event::{BotUtterance, Event, TraceEvent};

/// Source of incoming conversation events.
///
/// `receive` returns `None` when the source is exhausted or closed; a live
/// mailbox pends until the next event arrives.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Wait for the next event.
    async fn receive(&self) -> Option<Event>;

    /// Deliver an event into the source.
    fn send(&self, event: Event);
}

/// Destination for resolved bot utterances.
pub trait OutputSink: Send + Sync {
    fn utterance(&self, utterance: &BotUtterance);
}

/// Destination for observational lifecycle notifications.
pub trait TraceSink: Send + Sync {
    fn trace(&self, _event: &TraceEvent) {}
}

/// In-process mailbox: one pending receiver, unbounded queue.
#[derive(Default)]
pub struct Mailbox {
    queue: Mutex<VecDeque<Event>>,
    notify: Notify,
    closed: Mutex<bool>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the mailbox; pending and future receives drain the queue and
    /// then return `None`.
    pub fn close(&self) {
        *self.closed.lock().expect("mailbox lock") = true;
        self.notify.notify_waiters();
    }

    fn pop(&self) -> Option<Event> {
        self.queue.lock().expect("mailbox lock").pop_front()
    }

    fn is_closed(&self) -> bool {
        *self.closed.lock().expect("mailbox lock")
    }
}

#[async_trait]
impl EventSource for Mailbox {
    async fn receive(&self) -> Option<Event> {
        loop {
            let notified = self.notify.notified();
            if let Some(event) = self.pop() {
                return Some(event);
            }
            if self.is_closed() {
                return None;
            }
            notified.await;
        }
    }

    fn send(&self, event: Event) {
        self.queue.lock().expect("mailbox lock").push_back(event);
        self.notify.notify_one();
    }
}

/// Pre-loaded event queue for headless runs; never blocks.
pub struct ScriptedSource {
    answers: Mutex<VecDeque<Event>>,
}

impl ScriptedSource {
    pub fn new(answers: impl IntoIterator<Item = Event>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
        }
    }

    /// Number of unconsumed scripted answers.
    pub fn remaining(&self) -> usize {
        self.answers.lock().expect("script lock").len()
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn receive(&self) -> Option<Event> {
        self.answers.lock().expect("script lock").pop_front()
    }

    fn send(&self, event: Event) {
        self.answers.lock().expect("script lock").push_back(event);
    }
}

/// Output sink that discards everything.
pub struct NullOutput;

impl OutputSink for NullOutput {
    fn utterance(&self, _utterance: &BotUtterance) {}
}

/// Output sink that records utterance texts, for assertions.
#[derive(Default)]
pub struct CollectingOutput {
    texts: Mutex<Vec<String>>,
}

impl CollectingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// All texts recorded so far.
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().expect("output lock").clone()
    }

    /// Drop everything recorded so far.
    pub fn clear(&self) {
        self.texts.lock().expect("output lock").clear();
    }
}

impl OutputSink for CollectingOutput {
    fn utterance(&self, utterance: &BotUtterance) {
        self.texts
            .lock()
            .expect("output lock")
            .push(utterance.text.clone());
    }
}

/// Trace sink that discards everything.
pub struct NullTrace;

impl TraceSink for NullTrace {}

/// Trace sink that logs through `tracing` at debug level.
pub struct LogTrace;

impl TraceSink for LogTrace {
    fn trace(&self, event: &TraceEvent) {
        tracing::debug!(?event, "dialogue trace");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Utterance;

    fn user(text: &str) -> Event {
        Event::user_utterance(Utterance::from_text(text))
    }

    #[tokio::test]
    async fn test_mailbox_delivers_in_order() {
        let mailbox = Mailbox::new();
        mailbox.send(user("a"));
        mailbox.send(user("b"));
        assert_eq!(mailbox.receive().await.unwrap().text(), Some("a"));
        assert_eq!(mailbox.receive().await.unwrap().text(), Some("b"));
    }

    #[tokio::test]
    async fn test_mailbox_wakes_pending_receiver() {
        let mailbox = std::sync::Arc::new(Mailbox::new());
        let receiver = {
            let mailbox = mailbox.clone();
            tokio::spawn(async move { mailbox.receive().await })
        };
        tokio::task::yield_now().await;
        mailbox.send(user("late"));
        let event = receiver.await.unwrap().unwrap();
        assert_eq!(event.text(), Some("late"));
    }

    #[tokio::test]
    async fn test_closed_mailbox_drains_then_ends() {
        let mailbox = Mailbox::new();
        mailbox.send(user("last"));
        mailbox.close();
        assert!(mailbox.receive().await.is_some());
        assert!(mailbox.receive().await.is_none());
    }

    #[tokio::test]
    async fn test_scripted_source_exhausts() {
        let source = ScriptedSource::new([user("only")]);
        assert!(source.receive().await.is_some());
        assert!(source.receive().await.is_none());
    }
}
