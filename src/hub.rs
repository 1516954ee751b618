// src/hub.rs

//! The fake broker's state.
//!
//! A [`FakeHub`] holds everything a real broker would: queued messages,
//! subscriptions, reply functions used to answer request/reply publishes,
//! and the agent logger. Facades created from the same hub see each other's
//! state exactly as clients connected to one broker would.
//!
//! ## Isolation
//!
//! Tests that run in parallel should construct a hub per test with
//! [`FakeHub::new`] and build their facades with the `with_hub`
//! constructors. Code that cannot be handed a hub uses the process-global
//! one ([`global_hub`]) and calls [`reset`] between tests.
//!
//! ## Semantics
//!
//! - Every operation completes on the caller's thread before returning.
//! - No lock is held while a handler, reply function or completion runs, so
//!   user code may call back into the hub.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::{
    // ---
    log_debug,
    log_info,
    log_warn,
    registry::{MessageStore, ReplyFn, ReplyRegistry, SubscriptionFn, SubscriptionRegistry},
    Delivery,
    DeliveryHandle,
    Error,
    Message,
    Result,
    SubscribeOptions,
    TestLogger,
};

/// Acquire mutex guard, ignoring poisoning
pub(crate) fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// In-process stand-in for a message broker.
///
/// # Example
///
/// ```
/// use mom_double::{FakeHub, RecordingHandle, SubscribeOptions};
/// use serde_json::json;
///
/// let hub = FakeHub::new();
/// hub.define_subscription("jobs", SubscribeOptions::default(), |payload, _delivery| {
///     assert_eq!(payload, json!({"id": 1}));
///     Ok(())
/// });
///
/// hub.send_message("jobs", json!({"id": 1}), RecordingHandle::new()).unwrap();
/// assert!(hub.send_message("nobody", json!(null), RecordingHandle::new()).is_err());
/// ```
#[derive(Debug, Default)]
pub struct FakeHub {
    // ---
    messages: Mutex<MessageStore>,
    subscriptions: Mutex<SubscriptionRegistry>,
    replies: Mutex<ReplyRegistry>,
    logger: Arc<TestLogger>,
}

impl FakeHub {
    /// Create a new, empty hub.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // --------------------
    // Messages
    // --------------------

    /// Record `message` as published on `queue_name`.
    pub fn add_message(&self, queue_name: &str, message: Message) {
        // ---
        log_debug!("enqueue on {queue_name}");
        lock_ignore_poison(&self.messages).enqueue(queue_name, message);
    }

    /// Snapshot of the messages published on `queue_name`.
    pub fn messages(&self, queue_name: &str) -> Vec<Message> {
        lock_ignore_poison(&self.messages)
            .messages_for(queue_name)
            .clone()
    }

    /// Number of messages published on `queue_name`.
    pub fn message_count(&self, queue_name: &str) -> usize {
        lock_ignore_poison(&self.messages).count(queue_name)
    }

    /// Run `f` against the stored messages of `queue_name`.
    ///
    /// For tests that need to edit the recorded messages in place. `f` works
    /// on the queue's messages taken out of the store, so it may call back
    /// into the hub; messages published meanwhile are kept after the edited
    /// ones.
    pub fn with_messages<R>(&self, queue_name: &str, f: impl FnOnce(&mut Vec<Message>) -> R) -> R {
        // ---
        let mut taken = std::mem::take(lock_ignore_poison(&self.messages).messages_for(queue_name));
        let out = f(&mut taken);

        let mut store = lock_ignore_poison(&self.messages);
        let slot = store.messages_for(queue_name);
        taken.append(slot);
        *slot = taken;
        out
    }

    // --------------------
    // Subscriptions
    // --------------------

    /// Subscribe `handler` to `queue_name`, replacing any previous
    /// subscription on that queue.
    pub fn define_subscription<F>(&self, queue_name: &str, options: SubscribeOptions, handler: F)
    where
        F: Fn(Message, &Delivery) -> Result<()> + Send + Sync + 'static,
    {
        // ---
        log_debug!("subscribe to {queue_name} with {options:?}");
        let handler: SubscriptionFn = Arc::new(handler);
        lock_ignore_poison(&self.subscriptions).define(queue_name, options, handler);
    }

    /// Remove the subscription on `queue_name`, then run `completion`.
    ///
    /// `completion` runs whether or not a subscription existed.
    pub fn undefine_subscription(&self, queue_name: &str, completion: impl FnOnce()) {
        // ---
        let _removed = lock_ignore_poison(&self.subscriptions).undefine(queue_name);
        log_debug!("unsubscribe from {queue_name} (was subscribed: {_removed})");
        completion();
    }

    /// Deliver `payload` to the subscriber of `queue_name`.
    ///
    /// `receiver` is wrapped in a [`Delivery`]. Unless the subscription was
    /// made with `auto_ack` set to `false`, the delivery is acknowledged
    /// before the handler runs, so a handler that acknowledges again gets
    /// [`Error::MessageAckedTwice`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSubscribers`] if nothing is subscribed to
    /// `queue_name`, and otherwise whatever the handler returns.
    pub fn send_message(
        &self,
        queue_name: &str,
        payload: impl Into<Message>,
        receiver: impl DeliveryHandle + 'static,
    ) -> Result<()> {
        // ---
        let lookup = lock_ignore_poison(&self.subscriptions).lookup(queue_name);

        let (handler, auto_ack) = match lookup {
            Some(found) => found,
            None => {
                log_warn!("no subscribers on queue: {queue_name}");
                return Err(Error::NoSubscribers(queue_name.to_owned()));
            }
        };

        let delivery = Delivery::new(receiver);
        log_debug!("deliver {} on {queue_name} (auto_ack: {auto_ack})", delivery.tag());

        if auto_ack {
            delivery.ack()?;
        }

        handler(payload.into(), &delivery)
    }

    /// Serialize `payload` and deliver it like [`send_message`](Self::send_message).
    pub fn send_json<T: serde::Serialize>(
        &self,
        queue_name: &str,
        payload: &T,
        receiver: impl DeliveryHandle + 'static,
    ) -> Result<()> {
        let value = serde_json::to_value(payload)?;
        self.send_message(queue_name, value, receiver)
    }

    /// Names of the queues that currently have a subscriber, sorted.
    pub fn subscribed_queues(&self) -> Vec<String> {
        lock_ignore_poison(&self.subscriptions).queue_names()
    }

    /// Options the subscriber of `queue_name` subscribed with.
    pub fn subscription_options(&self, queue_name: &str) -> Option<SubscribeOptions> {
        lock_ignore_poison(&self.subscriptions)
            .options(queue_name)
            .cloned()
    }

    // --------------------
    // Replies
    // --------------------

    /// Answer request/reply publishes on `queue_name` with `reply`.
    ///
    /// Replaces any reply function previously set for the queue. Only
    /// senders that registered an `on_reply` callback receive the reply.
    pub fn set_reply_handler<F>(&self, queue_name: &str, reply: F)
    where
        F: Fn(&Message) -> Result<Message> + Send + Sync + 'static,
    {
        // ---
        log_debug!("reply handler set for {queue_name}");
        let reply: ReplyFn = Arc::new(reply);
        lock_ignore_poison(&self.replies).set(queue_name, reply);
    }

    /// Reply function set for `queue_name`, if any.
    pub fn reply_handler(&self, queue_name: &str) -> Option<ReplyFn> {
        lock_ignore_poison(&self.replies).get(queue_name)
    }

    /// Forget all reply functions. [`reset`](Self::reset) keeps them.
    pub fn clear_reply_handlers(&self) {
        lock_ignore_poison(&self.replies).clear();
    }

    // --------------------
    // Logger & reset
    // --------------------

    /// The logger shared by every agent built on this hub.
    pub fn logger(&self) -> Arc<TestLogger> {
        self.logger.clone()
    }

    /// Clear subscriptions, published messages and captured logs.
    ///
    /// Reply functions are left in place; use
    /// [`clear_reply_handlers`](Self::clear_reply_handlers) to drop them too.
    pub fn reset(&self) {
        // ---
        log_info!("resetting fake hub");
        lock_ignore_poison(&self.subscriptions).clear();
        lock_ignore_poison(&self.messages).clear();
        self.logger.clear();
    }
}

/// Process-global hub used by the facades' plain constructors.
static GLOBAL_HUB: OnceLock<Arc<FakeHub>> = OnceLock::new();

/// The process-global hub, created on first use.
pub fn global_hub() -> Arc<FakeHub> {
    GLOBAL_HUB.get_or_init(FakeHub::new).clone()
}

/// Reset the process-global hub. Call between tests.
pub fn reset() {
    global_hub().reset()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::RecordingHandle;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_send_without_subscriber() {
        // ---
        let hub = FakeHub::new();
        let err = hub
            .send_message("ghost", json!(1), RecordingHandle::new())
            .unwrap_err();
        assert!(matches!(err, Error::NoSubscribers(ref q) if q == "ghost"));
    }

    #[test]
    fn test_auto_ack_happens_before_handler() {
        // ---
        let hub = FakeHub::new();
        let handle = RecordingHandle::new();
        let seen = handle.clone();

        hub.define_subscription("jobs", SubscribeOptions::default(), move |_payload, delivery| {
            assert!(delivery.is_acked());
            assert_eq!(seen.ack_count(), 1);
            Ok(())
        });

        hub.send_message("jobs", json!("work"), handle.clone()).unwrap();
        assert_eq!(handle.ack_count(), 1);
    }

    #[test]
    fn test_handler_errors_propagate() {
        // ---
        let hub = FakeHub::new();
        hub.define_subscription("jobs", SubscribeOptions::default(), |_payload, _delivery| {
            Err(Error::handler("bad payload"))
        });

        let err = hub
            .send_message("jobs", json!(null), RecordingHandle::new())
            .unwrap_err();
        assert!(matches!(err, Error::Handler(ref msg) if msg == "bad payload"));
    }

    #[test]
    fn test_handler_may_reenter_hub() {
        // ---
        let hub = FakeHub::new();
        let inner = hub.clone();

        hub.define_subscription("in", SubscribeOptions::default(), move |payload, _delivery| {
            inner.add_message("out", payload);
            inner.undefine_subscription("in", || {});
            Ok(())
        });

        hub.send_message("in", json!(42), RecordingHandle::new()).unwrap();
        assert_eq!(hub.messages("out"), vec![json!(42)]);
        assert!(hub.subscribed_queues().is_empty());
    }

    #[test]
    fn test_undefine_runs_completion_even_if_absent() {
        // ---
        let hub = FakeHub::new();
        let calls = AtomicUsize::new(0);

        hub.undefine_subscription("never", || {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_send_json() {
        // ---
        #[derive(serde::Serialize)]
        struct Job {
            id: u32,
        }

        let hub = FakeHub::new();
        hub.define_subscription("jobs", SubscribeOptions::default(), |payload, _delivery| {
            assert_eq!(payload, json!({"id": 9}));
            Ok(())
        });
        hub.send_json("jobs", &Job { id: 9 }, RecordingHandle::new()).unwrap();
    }

    #[test]
    fn test_with_messages_edits_in_place() {
        // ---
        let hub = FakeHub::new();
        hub.add_message("q", json!(1));
        hub.add_message("q", json!(2));

        let popped = hub.with_messages("q", |msgs| msgs.remove(0));
        assert_eq!(popped, json!(1));
        assert_eq!(hub.message_count("q"), 1);
    }

    #[test]
    fn test_reset_keeps_reply_handlers() {
        // ---
        let hub = FakeHub::new();
        hub.set_reply_handler("math", |m: &Message| Ok(m.clone()));
        hub.define_subscription("jobs", SubscribeOptions::default(), |_p, _d| Ok(()));
        hub.add_message("jobs", json!(1));
        hub.logger().info("hello");

        hub.reset();

        assert!(hub.subscribed_queues().is_empty());
        assert_eq!(hub.message_count("jobs"), 0);
        assert!(hub.logger().is_empty());
        assert!(hub.reply_handler("math").is_some());

        hub.clear_reply_handlers();
        assert!(hub.reply_handler("math").is_none());
    }
}
