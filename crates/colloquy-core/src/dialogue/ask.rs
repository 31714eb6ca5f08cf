//! The retrying ask protocol and the dialogue patterns built on it.

use std::sync::Arc;

use serde_json::{json, Value as Json};

use crate::action::{Action, Cont};
use crate::combinators::{fail, seq, succeed};
use crate::context::Context;
use crate::outcome::Outcome;
use crate::task::{task_with, TaskSpec};
use crate::value::Value;

use super::driver::{present_and_wait, Acceptor, AskWait};

/// Acceptance predicate over a parsed answer value.
pub type ValueFilter = Arc<dyn Fn(&Json) -> bool + Send + Sync>;

/// Confirmation attached to an ask.
#[derive(Clone)]
pub enum Confirm {
    /// Yes/no question built from a message
    Message(String),
    /// Explicit confirmation dialog
    Dialog(Action),
}

/// Full parameter set for [`ask_with`].
#[derive(Clone)]
pub struct AskParams {
    /// Task name; defaults to `ask:<first message>`
    pub name: Option<String>,
    /// Prompt, or progressive prompt variants
    pub messages: Vec<String>,
    /// Expected answer type
    pub type_name: String,
    /// Per-call attempt limit, overriding agent and global policy
    pub max_attempts: Option<u32>,
    /// Per-call escalation policy on exhaustion
    pub exception_on_max_attempts: Option<bool>,
    /// Interpolation data for the prompts
    pub message_data: Json,
    /// Confirmation of the accepted answer
    pub confirm: Option<Confirm>,
    /// Extra acceptance predicate over the parsed value
    pub filter: Option<ValueFilter>,
}

impl AskParams {
    /// Plain ask accepting any answer.
    pub fn message(message: impl Into<String>) -> Self {
        Self::typed(message, "any")
    }

    /// Ask expecting a typed answer.
    pub fn typed(message: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: None,
            messages: vec![message.into()],
            type_name: type_name.into(),
            max_attempts: None,
            exception_on_max_attempts: None,
            message_data: Json::Null,
            confirm: None,
            filter: None,
        }
    }

    /// Replace the prompt with progressive variants, one per retry.
    pub fn with_messages(mut self, messages: Vec<String>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_exception_on_max_attempts(mut self, raise: bool) -> Self {
        self.exception_on_max_attempts = Some(raise);
        self
    }

    pub fn with_data(mut self, data: Json) -> Self {
        self.message_data = data;
        self
    }

    pub fn with_confirm_message(mut self, message: impl Into<String>) -> Self {
        self.confirm = Some(Confirm::Message(message.into()));
        self
    }

    pub fn with_confirm_dialog(mut self, dialog: Action) -> Self {
        self.confirm = Some(Confirm::Dialog(dialog));
        self
    }

    pub fn with_filter(mut self, filter: impl Fn(&Json) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }
}

/// Ask accepting any answer.
pub fn ask(message: impl Into<String>) -> Action {
    ask_with(AskParams::message(message))
}

/// Ask expecting a typed answer.
pub fn ask_typed(message: impl Into<String>, type_name: impl Into<String>) -> Action {
    ask_with(AskParams::typed(message, type_name))
}

/// The full ask protocol: retries with progressive prompts, policy-driven
/// exhaustion, reactor-transparent interruption, optional confirmation.
pub fn ask_with(params: AskParams) -> Action {
    let task_name = params
        .name
        .clone()
        .unwrap_or_else(|| format!("ask:{}", params.messages.first().cloned().unwrap_or_default()));
    let inner = Action::from_proc("ask", move |ctx| {
        let params = params.clone();
        async move { run_ask(ctx, params).await }
    });
    task_with(TaskSpec::new(task_name, inner).with_icon("ᗏ"))
}

async fn run_ask(ctx: Context, params: AskParams) -> Outcome {
    if params.messages.is_empty() {
        return Outcome::exception("ask_without_message", Json::Null, ctx);
    }
    let Some(entity_type) = ctx.conversation.types.get(&params.type_name) else {
        return Outcome::exception("unknown_type", json!({ "type": params.type_name }), ctx);
    };
    let acceptor = Acceptor::new(entity_type, params.filter.clone());

    // Policy precedence: per-call parameter > owning agent > global default.
    let global = ctx.conversation.policy.ask.clone();
    let agent = ctx
        .agent
        .as_ref()
        .map(|profile| profile.policy.ask.clone())
        .unwrap_or_default();
    let max_attempts = params
        .max_attempts
        .or(agent.max_attempts)
        .unwrap_or(global.max_attempts)
        .max(1);
    let exception_on_max = params
        .exception_on_max_attempts
        .or(agent.exception_on_max_attempts)
        .unwrap_or(global.exception_on_max_attempts);

    let mut current_ctx = ctx;
    // Outer loop restarts the whole ask after a failed confirmation.
    loop {
        let mut attempts: u32 = 0;
        let mut message_index: usize = 0;
        let restart_ctx = loop {
            let prompt = prompt_variant(&params.messages, message_index, attempts);
            let wait = present_and_wait(
                current_ctx,
                &prompt,
                &acceptor,
                &params.message_data,
                attempts,
            )
            .await;
            match wait {
                AskWait::Accepted { entity, ctx } => {
                    let Some(confirm) = &params.confirm else {
                        return Outcome::success(entity, ctx);
                    };
                    let dialog = match confirm {
                        Confirm::Message(message) => get_yes_no(message.clone()),
                        Confirm::Dialog(dialog) => dialog.clone(),
                    };
                    match dialog.run(ctx.clone()).await {
                        Outcome::Success {
                            ctx: confirmed_ctx, ..
                        } => return Outcome::success(entity, confirmed_ctx),
                        Outcome::Failure { .. } => {
                            tracing::debug!(%prompt, "confirmation failed, restarting ask");
                            break ctx;
                        }
                        other => return other,
                    }
                }
                AskWait::Exhausted { ctx } => {
                    return Outcome::failure("ask_failed", ctx);
                }
                AskWait::Rejected { ctx } => {
                    if attempts + 1 >= max_attempts {
                        return if exception_on_max {
                            Outcome::exception(
                                "max_attempts",
                                json!({ "attempts": attempts, "max_attempts": max_attempts }),
                                ctx,
                            )
                        } else {
                            Outcome::failure("max_attempts", ctx)
                        };
                    }
                    attempts += 1;
                    message_index = (message_index + 1).min(params.messages.len() - 1);
                    current_ctx = ctx;
                }
            }
        };
        current_ctx = restart_ctx;
    }
}

/// Pick the prompt for the current attempt: progressive variants advance per
/// retry; a lone snake_case message id gets a numbered error suffix instead.
fn prompt_variant(messages: &[String], message_index: usize, attempts: u32) -> String {
    if messages.len() > 1 {
        return messages[message_index.min(messages.len() - 1)].clone();
    }
    let base = &messages[0];
    if attempts > 0 && is_message_key(base) {
        format!("{base}_error_{attempts}")
    } else {
        base.clone()
    }
}

fn is_message_key(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Yes/no question succeeding only on `yes`.
pub fn get_yes_no(message: impl Into<String>) -> Action {
    ask_with(AskParams::typed(message, "yes_no").with_name("get_yes_no"))
        .filter(|value| value.as_str() == Some("yes"))
}

/// One selectable entry of an [`action_menu`].
#[derive(Clone)]
pub struct MenuChoice {
    /// Short key the user can type
    pub key: String,
    /// Full label, also accepted as an answer
    pub label: String,
    /// Action to run on selection
    pub action: Action,
}

impl MenuChoice {
    pub fn new(key: impl ToString, label: impl Into<String>, action: Action) -> Self {
        Self {
            key: key.to_string(),
            label: label.into(),
            action,
        }
    }
}

/// Parameters for [`action_menu`].
#[derive(Clone)]
pub struct MenuParams {
    pub prompt: String,
    pub choices: Vec<MenuChoice>,
    /// Fallback when the reply matches no choice; failing otherwise
    pub on_no_selection: Option<Action>,
}

/// Render numbered choices under a prompt and dispatch on the reply.
pub fn action_menu(params: MenuParams) -> Action {
    let lines: Vec<String> = params
        .choices
        .iter()
        .map(|choice| format!("{}) {}", choice.key, choice.label))
        .collect();
    let message = format!("{}\n{}", params.prompt, lines.join("\n"));
    let choices = params.choices.clone();
    let on_no_selection = params.on_no_selection.clone();

    seq([
        ask(message).into(),
        Cont::bind(move |reply: Value| {
            let text = reply.as_str().unwrap_or_default().to_string();
            let selected = choices
                .iter()
                .find(|choice| choice.key == text || choice.label == text)
                .map(|choice| choice.action.clone());
            selected
                .or_else(|| on_no_selection.clone())
                .unwrap_or_else(|| fail("no_selection"))
        }),
    ])
    .with_info("action_menu", vec![params.prompt])
}

/// An appended free-form choice for [`select`].
#[derive(Clone)]
pub struct ExtraChoice {
    pub label: String,
    pub dialog: Action,
}

/// Parameters for [`select`].
#[derive(Clone)]
pub struct SelectParams {
    pub prompt: String,
    pub choices: Vec<String>,
    /// Extra entry appended after the listed choices
    pub extra_choice: Option<ExtraChoice>,
    /// Dialog to run when the choice list is empty
    pub no_choice_dialog: Option<Action>,
}

/// Pick one value from a list: singleton lists short-circuit, empty lists
/// fall back to the no-choice dialog, everything else renders a menu.
pub fn select(params: SelectParams) -> Action {
    Action::from_proc("select", move |ctx| {
        let params = params.clone();
        async move {
            if params.choices.is_empty() {
                return match &params.no_choice_dialog {
                    Some(dialog) => dialog.run(ctx).await,
                    None => Outcome::failure("no_choice_dialog_undefined", ctx),
                };
            }
            if params.choices.len() == 1 && params.extra_choice.is_none() {
                let only = params.choices[0].clone();
                return Outcome::success(only, ctx);
            }

            let mut menu: Vec<MenuChoice> = params
                .choices
                .iter()
                .enumerate()
                .map(|(index, choice)| {
                    MenuChoice::new(index + 1, choice.clone(), succeed(choice.clone()))
                })
                .collect();
            if let Some(extra) = &params.extra_choice {
                menu.push(MenuChoice::new(
                    menu.len() + 1,
                    extra.label.clone(),
                    extra.dialog.clone(),
                ));
            }
            action_menu(MenuParams {
                prompt: params.prompt.clone(),
                choices: menu,
                on_no_selection: None,
            })
            .run(ctx)
            .await
        }
    })
}
