//! Outcome - the tagged result of running one action.
//!
//! Every run produces exactly one outcome, and the context it carries
//! reflects all side effects accumulated up to the point the outcome was
//! produced - failures included. This is what lets `alt` start its next
//! alternative from post-failure state instead of rolling back.

use serde_json::Value as Json;

use crate::context::Context;
use crate::value::Value;

/// Reserved failure reason for panics caught at the action boundary.
///
/// A host fault is a diagnostic safety net, not part of the recoverable
/// taxonomy: handler tables never intercept it.
pub const RUNTIME_FAULT: &str = "runtime_fault";

/// Result of running one action against a context.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The step completed and produced a value.
    Success {
        /// Forward-flowing value
        value: Value,
        /// Context after the step
        ctx: Context,
    },
    /// Expected, recoverable failure consumed by `alt`/`branch`/loop logic.
    Failure {
        /// Reason token
        reason: String,
        /// Optional human-readable detail
        message: Option<String>,
        /// Context accumulated up to the failure
        ctx: Context,
    },
    /// Abnormal condition, intercepted only by a matching named handler.
    Exception {
        /// Error-type token resolved against handler tables
        error_type: String,
        /// Structured payload for the handler
        payload: Json,
        /// Context accumulated up to the exception
        ctx: Context,
    },
    /// Explicit unwind, caught only by a dedicated cancel continuation.
    Cancellation {
        /// Reason token
        reason: String,
        /// Context accumulated up to the cancellation
        ctx: Context,
    },
}

impl Outcome {
    /// Successful outcome carrying a value.
    pub fn success(value: impl Into<Value>, ctx: Context) -> Self {
        Self::Success {
            value: value.into(),
            ctx,
        }
    }

    /// Recoverable failure with a reason token.
    pub fn failure(reason: impl Into<String>, ctx: Context) -> Self {
        Self::Failure {
            reason: reason.into(),
            message: None,
            ctx,
        }
    }

    /// Recoverable failure with a reason token and a detail message.
    pub fn failure_with_message(
        reason: impl Into<String>,
        ctx: Context,
        message: impl Into<String>,
    ) -> Self {
        Self::Failure {
            reason: reason.into(),
            message: Some(message.into()),
            ctx,
        }
    }

    /// Exception with an error-type token and a payload.
    pub fn exception(error_type: impl Into<String>, payload: Json, ctx: Context) -> Self {
        Self::Exception {
            error_type: error_type.into(),
            payload,
            ctx,
        }
    }

    /// Cooperative cancellation.
    pub fn cancellation(reason: impl Into<String>, ctx: Context) -> Self {
        Self::Cancellation {
            reason: reason.into(),
            ctx,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    pub fn is_exception(&self) -> bool {
        matches!(self, Self::Exception { .. })
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancellation { .. })
    }

    /// The context carried by the outcome, whatever its kind.
    pub fn ctx(&self) -> &Context {
        match self {
            Self::Success { ctx, .. }
            | Self::Failure { ctx, .. }
            | Self::Exception { ctx, .. }
            | Self::Cancellation { ctx, .. } => ctx,
        }
    }

    /// Consume the outcome, returning its context.
    pub fn into_ctx(self) -> Context {
        match self {
            Self::Success { ctx, .. }
            | Self::Failure { ctx, .. }
            | Self::Exception { ctx, .. }
            | Self::Cancellation { ctx, .. } => ctx,
        }
    }

    /// Success value, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Success { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Replace the carried context, keeping the outcome kind.
    pub fn with_ctx(self, new_ctx: Context) -> Self {
        match self {
            Self::Success { value, .. } => Self::Success {
                value,
                ctx: new_ctx,
            },
            Self::Failure {
                reason, message, ..
            } => Self::Failure {
                reason,
                message,
                ctx: new_ctx,
            },
            Self::Exception {
                error_type,
                payload,
                ..
            } => Self::Exception {
                error_type,
                payload,
                ctx: new_ctx,
            },
            Self::Cancellation { reason, .. } => Self::Cancellation {
                reason,
                ctx: new_ctx,
            },
        }
    }

    /// Rewrite the carried context in place.
    pub fn map_ctx(self, f: impl FnOnce(Context) -> Context) -> Self {
        let new_ctx = f(self.ctx().clone());
        self.with_ctx(new_ctx)
    }
}
