//! Context - the immutable snapshot threaded through action execution.
//!
//! Every update produces a new value (clone-on-write); the read-mostly
//! conversation handle is shared behind an `Arc`. No action may observe a
//! context produced by a sibling branch it did not itself run.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as Json;

use crate::action::ActionInfo;
use crate::agent::AgentProfile;
use crate::conversation::Conversation;
use crate::dataframe::Dataframe;
use crate::reactor::{Reactor, ReactorLevel, ReactorTable};

/// One entry of the task scope stack.
#[derive(Debug, Clone)]
pub struct TaskFrame {
    /// Task name
    pub name: String,
    /// Display icon, if any
    pub icon: Option<String>,
}

/// Immutable snapshot of conversation-local state.
#[derive(Clone)]
pub struct Context {
    /// Local variable scope, dot-path addressable
    pub env: Json,
    /// Longer-lived key/value space (backend-mock state and the like)
    pub store: Json,
    /// Task scope stack, innermost first
    pub tasks: Vec<TaskFrame>,
    /// Action trace stack, innermost first. Diagnostics only - never
    /// affects control flow.
    pub focus: Vec<Arc<ActionInfo>>,
    /// Registered side-channel event handlers, per level
    pub reactors: ReactorTable,
    /// Live slot-filling frames, by name
    pub dataframes: HashMap<String, Dataframe>,
    /// Current agent profile, if any
    pub agent: Option<Arc<AgentProfile>>,
    /// Shared conversation handle (event source, sinks, catalogs, policy)
    pub conversation: Arc<Conversation>,
}

impl Context {
    /// Fresh context bound to a conversation.
    pub fn new(conversation: Arc<Conversation>) -> Self {
        Self {
            env: Json::Object(Default::default()),
            store: Json::Object(Default::default()),
            tasks: Vec::new(),
            focus: Vec::new(),
            reactors: ReactorTable::default(),
            dataframes: HashMap::new(),
            agent: None,
            conversation,
        }
    }

    // ============ env and store access ============

    /// Read a dot-path from the local scope.
    pub fn env_read(&self, path: &str) -> Option<&Json> {
        read_path(&self.env, path)
    }

    /// Set a dot-path in the local scope, returning the updated context.
    pub fn with_env(&self, path: &str, value: Json) -> Self {
        let mut next = self.clone();
        write_path(&mut next.env, path, value);
        next
    }

    /// Read a dot-path from the store.
    pub fn store_read(&self, path: &str) -> Option<&Json> {
        read_path(&self.store, path)
    }

    /// Set a dot-path in the store, returning the updated context.
    pub fn with_store(&self, path: &str, value: Json) -> Self {
        let mut next = self.clone();
        write_path(&mut next.store, path, value);
        next
    }

    // ============ scope stacks ============

    /// Name of the innermost task, if any.
    pub fn current_task(&self) -> Option<&TaskFrame> {
        self.tasks.first()
    }

    /// Owner attribution for registrations: innermost task, else agent.
    pub fn owner_name(&self) -> Option<String> {
        self.current_task()
            .map(|frame| frame.name.clone())
            .or_else(|| self.agent.as_ref().map(|agent| agent.name.clone()))
    }

    /// Push a task frame, returning the updated context.
    pub fn with_task(&self, frame: TaskFrame) -> Self {
        let mut next = self.clone();
        next.tasks.insert(0, frame);
        next
    }

    /// Replace the task stack wholesale (scope restore on task exit).
    pub fn with_tasks(&self, tasks: Vec<TaskFrame>) -> Self {
        let mut next = self.clone();
        next.tasks = tasks;
        next
    }

    // ============ reactors ============

    /// Register a reactor at a level, most-recent-first.
    pub fn with_reactor(&self, level: ReactorLevel, reactor: Reactor) -> Self {
        let mut next = self.clone();
        next.reactors.push(level, reactor);
        next
    }

    /// Replace the reactor table wholesale (scope restore on agent exit).
    pub fn with_reactors(&self, reactors: ReactorTable) -> Self {
        let mut next = self.clone();
        next.reactors = reactors;
        next
    }

    // ============ dataframes ============

    /// Look up a live frame by name.
    pub fn frame(&self, name: &str) -> Option<&Dataframe> {
        self.dataframes.get(name)
    }

    /// Insert or replace a live frame, returning the updated context.
    pub fn with_frame(&self, frame: Dataframe) -> Self {
        let mut next = self.clone();
        next.dataframes.insert(frame.name().to_string(), frame);
        next
    }

    /// Drop a live frame, returning the updated context.
    pub fn without_frame(&self, name: &str) -> Self {
        let mut next = self.clone();
        next.dataframes.remove(name);
        next
    }

    // ============ agent ============

    /// Set the current agent profile.
    pub fn with_agent(&self, agent: Option<Arc<AgentProfile>>) -> Self {
        let mut next = self.clone();
        next.agent = agent;
        next
    }

    /// Render the focus stack for diagnostics, innermost first.
    pub fn focus_trace(&self) -> Vec<String> {
        self.focus.iter().map(|info| info.describe()).collect()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("env", &self.env)
            .field("tasks", &self.tasks)
            .field("focus", &self.focus_trace())
            .field("dataframes", &self.dataframes.keys())
            .finish_non_exhaustive()
    }
}

/// Walk a dot-path through nested JSON objects.
fn read_path<'a>(root: &'a Json, path: &str) -> Option<&'a Json> {
    let mut current = root;
    for key in path.split('.') {
        current = current.as_object()?.get(key)?;
        if current.is_null() {
            return None;
        }
    }
    Some(current)
}

/// Set a dot-path, creating intermediate objects as needed.
fn write_path(root: &mut Json, path: &str, value: Json) {
    let mut current = root;
    let keys: Vec<&str> = path.split('.').collect();
    for key in &keys[..keys.len() - 1] {
        if !current.is_object() {
            *current = Json::Object(Default::default());
        }
        let map = current.as_object_mut().expect("object just ensured");
        current = map
            .entry(key.to_string())
            .or_insert_with(|| Json::Object(Default::default()));
    }
    if !current.is_object() {
        *current = Json::Object(Default::default());
    }
    current
        .as_object_mut()
        .expect("object just ensured")
        .insert(keys[keys.len() - 1].to_string(), value);
}
