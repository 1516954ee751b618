//! Per-queue state kept by a [`FakeHub`](crate::FakeHub).
//!
//! The registries are plain single-owner maps. Locking and re-entrancy are
//! the hub's concern: it holds each registry behind its own mutex and never
//! calls user code while a lock is held.

mod messages;
mod replies;
mod subscriptions;

pub use messages::MessageStore;
pub use replies::{ReplyFn, ReplyRegistry};
pub use subscriptions::{SubscriptionFn, SubscriptionRegistry};
