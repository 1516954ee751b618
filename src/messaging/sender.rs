use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::{global_hub, log_debug, FakeHub, Message, ReplyOptions, Result, SenderOptions};

/// Callback receiving the reply to a published request.
pub type ReplyCallback = Arc<dyn Fn(Message) + Send + Sync>;

/// Producer side of a queue.
///
/// Publishing records the message on the hub. When the hub has a reply
/// function for the queue and this sender registered [`on_reply`], the reply
/// is computed and handed to the callback before `publish` returns.
///
/// [`on_reply`]: Sender::on_reply
///
/// # Example
///
/// ```
/// use mom_double::{FakeHub, Message, ReplyOptions, Sender, SenderOptions};
/// use serde_json::json;
/// use std::sync::{Arc, Mutex};
///
/// let hub = FakeHub::new();
/// hub.set_reply_handler("math", |m: &Message| Ok(json!(m["a"].as_i64().unwrap_or(0) + 1)));
///
/// let replies = Arc::new(Mutex::new(Vec::new()));
/// let sink = replies.clone();
///
/// let sender = Sender::build(hub.clone(), "math", SenderOptions::default(), |s| {
///     s.on_reply(ReplyOptions::default(), move |reply| sink.lock().unwrap().push(reply));
/// });
///
/// sender.publish(json!({"a": 41})).unwrap();
/// assert_eq!(*replies.lock().unwrap(), vec![json!(42)]);
/// assert_eq!(sender.count(), 1);
/// ```
#[derive(Clone)]
pub struct Sender {
    // ---
    hub: Arc<FakeHub>,
    queue_name: String,
    options: SenderOptions,
    on_reply: Option<(ReplyOptions, ReplyCallback)>,
}

impl Sender {
    /// Create a sender on the process-global hub.
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self::with_hub(global_hub(), queue_name, SenderOptions::default())
    }

    /// Create a sender with options on the process-global hub.
    pub fn with_options(queue_name: impl Into<String>, options: SenderOptions) -> Self {
        Self::with_hub(global_hub(), queue_name, options)
    }

    /// Create a sender on `hub`.
    pub fn with_hub(hub: Arc<FakeHub>, queue_name: impl Into<String>, options: SenderOptions) -> Self {
        // ---
        Self {
            hub,
            queue_name: queue_name.into(),
            options,
            on_reply: None,
        }
    }

    /// Create a sender on `hub` and configure it with `setup` right away.
    pub fn build<F>(hub: Arc<FakeHub>, queue_name: impl Into<String>, options: SenderOptions, setup: F) -> Self
    where
        F: FnOnce(&mut Sender),
    {
        // ---
        let mut sender = Self::with_hub(hub, queue_name, options);
        setup(&mut sender);
        sender
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    pub fn options(&self) -> &SenderOptions {
        &self.options
    }

    /// Options given with the current `on_reply` callback, if any.
    pub fn reply_options(&self) -> Option<&ReplyOptions> {
        self.on_reply.as_ref().map(|(opts, _)| opts)
    }

    /// Register the callback receiving replies to this sender's publishes.
    ///
    /// Replaces any previously registered callback.
    pub fn on_reply<F>(&mut self, options: ReplyOptions, callback: F)
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        self.on_reply = Some((options, Arc::new(callback)));
    }

    /// Accepted for compatibility. Replies are instant, so the fake never
    /// times out and `handler` is dropped unused.
    pub fn on_timeout<F>(&mut self, _handler: F)
    where
        F: FnOnce(),
    {
    }

    /// Publish `message` on this sender's queue.
    ///
    /// # Errors
    ///
    /// Propagates a failure of the queue's reply function. The message is
    /// recorded even then.
    pub fn publish(&self, message: impl Into<Message>) -> Result<()> {
        self.publish_then(message, || {})
    }

    /// Publish `message`, then run `completion`, then deliver the reply (if
    /// one is due).
    pub fn publish_then(&self, message: impl Into<Message>, completion: impl FnOnce()) -> Result<()> {
        // ---
        let message = message.into();

        // the stored copy is owned by the hub; keep one for the reply
        let request = self.on_reply.as_ref().map(|_| message.clone());

        self.hub.add_message(&self.queue_name, message);
        completion();

        let (Some(request), Some((_, callback))) = (request, self.on_reply.as_ref()) else {
            return Ok(());
        };

        if let Some(reply_fn) = self.hub.reply_handler(&self.queue_name) {
            log_debug!("replying to publish on {}", self.queue_name);
            let reply = reply_fn(&request)?;
            callback(reply);
        }

        Ok(())
    }

    /// Serialize `message` and publish it.
    pub fn publish_json<T: Serialize>(&self, message: &T) -> Result<()> {
        let value = serde_json::to_value(message)?;
        self.publish(value)
    }

    /// Run `completion` with the number of messages published on this queue.
    pub fn message_count(&self, completion: impl FnOnce(usize)) {
        completion(self.count());
    }

    pub fn count(&self) -> usize {
        self.hub.message_count(&self.queue_name)
    }
}

impl fmt::Debug for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("queue_name", &self.queue_name)
            .field("options", &self.options)
            .field("reply_options", &self.reply_options())
            .finish_non_exhaustive()
    }
}
