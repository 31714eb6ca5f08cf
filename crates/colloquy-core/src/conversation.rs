//! Conversations - the shared handle behind every context, plus the
//! registry of live conversations.
//!
//! Catalogs and sinks are assembled once at startup and dependency-injected
//! through the handle; the engine has no process-global state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::agent::Policy;
use crate::channel::{EventSource, Mailbox, NullOutput, NullTrace, OutputSink, TraceSink};
use crate::context::Context;
use crate::intent::IntentCatalog;
use crate::messages::MessageCatalog;
use crate::types::TypeCatalog;

/// Strongly-typed conversation id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Fresh random id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The shared, read-mostly handle carried by every context of one
/// conversation.
pub struct Conversation {
    pub id: ConversationId,
    /// Language used for message resolution
    pub language: String,
    /// Where the ask boundary waits for events
    pub source: Arc<dyn EventSource>,
    /// Where resolved bot utterances go
    pub output: Arc<dyn OutputSink>,
    /// Observational lifecycle sink
    pub trace: Arc<dyn TraceSink>,
    /// Message catalog
    pub messages: Arc<MessageCatalog>,
    /// Entity type catalog
    pub types: Arc<TypeCatalog>,
    /// Intent catalog
    pub intents: Arc<IntentCatalog>,
    /// Global policy defaults
    pub policy: Policy,
}

impl Conversation {
    pub fn builder() -> ConversationBuilder {
        ConversationBuilder::default()
    }

    /// Fresh root context for this conversation.
    pub fn context(self: &Arc<Self>) -> Context {
        Context::new(self.clone())
    }
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("id", &self.id)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

/// Builder assembling a conversation's collaborators.
pub struct ConversationBuilder {
    id: ConversationId,
    language: String,
    source: Option<Arc<dyn EventSource>>,
    output: Option<Arc<dyn OutputSink>>,
    trace: Option<Arc<dyn TraceSink>>,
    messages: Arc<MessageCatalog>,
    types: Arc<TypeCatalog>,
    intents: Arc<IntentCatalog>,
    policy: Policy,
}

impl Default for ConversationBuilder {
    fn default() -> Self {
        Self {
            id: ConversationId::new(),
            language: "en_US".to_string(),
            source: None,
            output: None,
            trace: None,
            messages: Arc::new(MessageCatalog::new()),
            types: Arc::new(TypeCatalog::standard()),
            intents: Arc::new(IntentCatalog::new()),
            policy: Policy::default(),
        }
    }
}

impl ConversationBuilder {
    pub fn id(mut self, id: ConversationId) -> Self {
        self.id = id;
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn source(mut self, source: Arc<dyn EventSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn output(mut self, output: Arc<dyn OutputSink>) -> Self {
        self.output = Some(output);
        self
    }

    pub fn trace(mut self, trace: Arc<dyn TraceSink>) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn messages(mut self, messages: Arc<MessageCatalog>) -> Self {
        self.messages = messages;
        self
    }

    pub fn types(mut self, types: Arc<TypeCatalog>) -> Self {
        self.types = types;
        self
    }

    pub fn intents(mut self, intents: Arc<IntentCatalog>) -> Self {
        self.intents = intents;
        self
    }

    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Finish the handle. Defaults: in-process mailbox, discarded output,
    /// no tracing, standard type catalog, empty message and intent catalogs.
    pub fn build(self) -> Arc<Conversation> {
        Arc::new(Conversation {
            id: self.id,
            language: self.language,
            source: self.source.unwrap_or_else(|| Arc::new(Mailbox::new())),
            output: self.output.unwrap_or_else(|| Arc::new(NullOutput)),
            trace: self.trace.unwrap_or_else(|| Arc::new(NullTrace)),
            messages: self.messages,
            types: self.types,
            intents: self.intents,
            policy: self.policy,
        })
    }
}

/// Registry of live conversations, keyed by id.
#[derive(Default)]
pub struct ConversationRegistry {
    conversations: RwLock<HashMap<ConversationId, Arc<Conversation>>>,
}

impl ConversationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, conversation: Arc<Conversation>) {
        self.conversations
            .write()
            .await
            .insert(conversation.id.clone(), conversation);
    }

    pub async fn get(&self, id: &ConversationId) -> Option<Arc<Conversation>> {
        self.conversations.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &ConversationId) -> Option<Arc<Conversation>> {
        self.conversations.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }
}
