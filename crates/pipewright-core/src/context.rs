//! Request-scoped cancellation context.
//!
//! Every request flowing through a chain carries a [`RequestContext`] in its
//! extensions. A context is a node in a tree of cancellation scopes: deriving
//! a child with [`RequestContext::with_cancel`] yields a fresh scope plus the
//! [`CancelTrigger`] that cancels it. Cancelling a scope cancels every scope
//! derived from it, never its parent.
//!
//! ## Root Cancellation
//!
//! [`RequestContext::with_root_cancel`] derives a scope whose trigger is also
//! remembered as the *root* trigger. Every scope derived afterwards carries
//! it, so nested chain layers can retrieve it with
//! [`RequestContext::root_trigger`] and cancel the whole remaining chain.
//!
//! ```
//! use pipewright_core::RequestContext;
//!
//! let (root, _) = RequestContext::background().with_root_cancel();
//! let (local, local_trigger) = root.with_cancel();
//!
//! local_trigger.cancel();
//! assert!(local.is_cancelled());
//! assert!(!root.is_cancelled());
//!
//! root.root_trigger().unwrap().cancel();
//! assert!(root.is_cancelled());
//! ```
//!
//! Cancellation is cooperative: it never interrupts a running step, it only
//! tells later stages not to start.

use crate::error::{ChainError, ChainResult};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// A capability that cancels the scope it was created for.
///
/// Cloning a trigger yields another handle to the same scope.
#[derive(Debug, Clone)]
pub struct CancelTrigger {
    token: CancellationToken,
}

impl CancelTrigger {
    /// Marks the associated scope, and every scope derived from it, as cancelled.
    ///
    /// Cancelling an already cancelled scope has no effect.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true if the associated scope has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Cancellation state attached to a single request.
///
/// Contexts are cheap to clone; clones observe the same scope.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The scope this context observes.
    token: CancellationToken,

    /// Root trigger, only reachable through [`RequestContext::root_trigger`].
    root: Option<CancelTrigger>,
}

impl RequestContext {
    /// Creates a context that is never cancelled.
    #[must_use]
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            root: None,
        }
    }

    /// Derives a child scope and the trigger that cancels it.
    ///
    /// The child keeps any root trigger carried by `self`.
    #[must_use]
    pub fn with_cancel(&self) -> (Self, CancelTrigger) {
        let token = self.token.child_token();
        let trigger = CancelTrigger {
            token: token.clone(),
        };
        let ctx = Self {
            token,
            root: self.root.clone(),
        };
        (ctx, trigger)
    }

    /// Derives a child scope whose trigger becomes the root trigger.
    ///
    /// Any root trigger carried by `self` is replaced for the derived scope.
    #[must_use]
    pub fn with_root_cancel(&self) -> (Self, CancelTrigger) {
        let (mut ctx, trigger) = self.with_cancel();
        ctx.root = Some(trigger.clone());
        (ctx, trigger)
    }

    /// Retrieves the root trigger.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::NotCancelable`] if root cancellation was never
    /// enabled for this request.
    pub fn root_trigger(&self) -> ChainResult<CancelTrigger> {
        self.root.clone().ok_or(ChainError::NotCancelable)
    }

    /// Returns true if a root trigger is attached.
    #[must_use]
    pub fn is_root_cancelable(&self) -> bool {
        self.root.is_some()
    }

    /// Returns true if this scope or any of its ancestors was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns a future that resolves once this scope is cancelled.
    ///
    /// Hosts that impose deadlines can race request work against it.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::background()
    }
}

/// Access to the [`RequestContext`] carried by a request.
pub trait RequestContextExt {
    /// Returns the attached context, or a background context if none is attached.
    fn context(&self) -> RequestContext;

    /// Attaches `ctx`, replacing any previously attached context.
    fn set_context(&mut self, ctx: RequestContext);

    /// Returns this request carrying `ctx`.
    #[must_use]
    fn with_context(self, ctx: RequestContext) -> Self;
}

impl<B> RequestContextExt for http::Request<B> {
    fn context(&self) -> RequestContext {
        self.extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default()
    }

    fn set_context(&mut self, ctx: RequestContext) {
        self.extensions_mut().insert(ctx);
    }

    fn with_context(mut self, ctx: RequestContext) -> Self {
        self.set_context(ctx);
        self
    }
}
