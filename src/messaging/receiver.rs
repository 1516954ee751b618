use std::fmt;
use std::sync::Arc;

use crate::{global_hub, Delivery, FakeHub, Message, RequeueOptions, Result, SubscribeOptions};

/// Callback run when a message exceeds its requeue limit.
pub type RequeueLimitFn = Arc<dyn Fn(&Message) + Send + Sync>;

/// Consumer side of a queue.
///
/// # Example
///
/// ```
/// use mom_double::{FakeHub, Receiver, RecordingHandle, SubscribeOptions};
/// use serde_json::json;
///
/// let hub = FakeHub::new();
/// let receiver = Receiver::with_hub(hub.clone(), "jobs", SubscribeOptions::default());
///
/// receiver.subscribe(|payload, _delivery| {
///     assert_eq!(payload, json!("work"));
///     Ok(())
/// });
/// hub.send_message("jobs", json!("work"), RecordingHandle::new()).unwrap();
///
/// receiver.unsubscribe(|| {});
/// assert!(hub.subscribed_queues().is_empty());
/// ```
#[derive(Clone)]
pub struct Receiver {
    // ---
    hub: Arc<FakeHub>,
    queue_name: String,
    options: SubscribeOptions,
    requeue_options: Option<RequeueOptions>,
    on_requeue_limit: Option<RequeueLimitFn>,
}

impl Receiver {
    /// Create a receiver on the process-global hub.
    pub fn new(queue_name: impl Into<String>, options: SubscribeOptions) -> Self {
        Self::with_hub(global_hub(), queue_name, options)
    }

    /// Create a receiver on `hub`.
    pub fn with_hub(hub: Arc<FakeHub>, queue_name: impl Into<String>, options: SubscribeOptions) -> Self {
        // ---
        Self {
            hub,
            queue_name: queue_name.into(),
            options,
            requeue_options: None,
            on_requeue_limit: None,
        }
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    pub fn options(&self) -> &SubscribeOptions {
        &self.options
    }

    /// Subscribe `handler` to this receiver's queue with its options.
    ///
    /// Replaces whatever was subscribed to the queue before.
    pub fn subscribe<F>(&self, handler: F)
    where
        F: Fn(Message, &Delivery) -> Result<()> + Send + Sync + 'static,
    {
        self.hub
            .define_subscription(&self.queue_name, self.options.clone(), handler);
    }

    /// Drop the queue's subscription, then run `completion`.
    pub fn unsubscribe(&self, completion: impl FnOnce()) {
        self.hub.undefine_subscription(&self.queue_name, completion);
    }

    /// Record requeue parameters. Requeueing is never simulated.
    pub fn set_requeue_parameters(&mut self, options: RequeueOptions) {
        self.requeue_options = Some(options);
    }

    pub fn requeue_parameters(&self) -> Option<&RequeueOptions> {
        self.requeue_options.as_ref()
    }

    /// Record the requeue-limit callback. The fake never calls it.
    pub fn on_requeue_limit<F>(&mut self, handler: F)
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.on_requeue_limit = Some(Arc::new(handler));
    }

    /// The recorded requeue-limit callback, so tests can invoke it by hand.
    pub fn requeue_limit_handler(&self) -> Option<&RequeueLimitFn> {
        self.on_requeue_limit.as_ref()
    }
}

impl fmt::Debug for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("queue_name", &self.queue_name)
            .field("options", &self.options)
            .field("requeue_options", &self.requeue_options)
            .finish_non_exhaustive()
    }
}
