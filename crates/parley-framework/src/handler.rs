//! Handler abstraction.
//!
//! Every callback the framework stores (command handlers, interaction
//! openers and submissions, slash command and event handlers) is an async
//! function taking a single owned context value. The [`Handler`] trait is
//! implemented for all such closures and functions, and [`BoxedHandler`] is
//! the type-erased form kept in registries.
//!
//! ```rust,ignore
//! async fn uptime(conv: Conversation) {
//!     conv.reply("up").await;
//! }
//!
//! let handler: BoxedHandler<Conversation> = into_handler(uptime);
//! ```

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

// ============================================================================
// Handler Trait
// ============================================================================

/// An async callback taking a context of type `C` and producing `O`.
///
/// Implemented automatically for any `Fn(C) -> impl Future<Output = O>`
/// that is `Send + Sync + 'static`.
pub trait Handler<C, O = ()>: Send + Sync + 'static {
    /// Invokes the handler.
    fn call(&self, ctx: C) -> BoxFuture<'static, O>;
}

impl<F, Fut, C, O> Handler<C, O> for F
where
    F: Fn(C) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
{
    fn call(&self, ctx: C) -> BoxFuture<'static, O> {
        Box::pin((self)(ctx))
    }
}

/// A type-erased handler that can be stored in collections.
pub type BoxedHandler<C, O = ()> = Arc<dyn Handler<C, O>>;

/// Converts a handler into its boxed form.
pub fn into_handler<H, C, O>(handler: H) -> BoxedHandler<C, O>
where
    H: Handler<C, O>,
{
    Arc::new(handler)
}
