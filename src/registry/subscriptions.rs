use std::collections::HashMap;
use std::sync::Arc;

use crate::{Delivery, Message, Result, SubscribeOptions};

/// Type-erased subscription handler.
///
/// Called with the delivered payload and the guarded delivery handle.
/// Wrapped in `Arc` so the hub can clone it out of the registry and release
/// its lock before running user code.
pub type SubscriptionFn = Arc<dyn Fn(Message, &Delivery) -> Result<()> + Send + Sync>;

struct Entry {
    handler: SubscriptionFn,
    options: SubscribeOptions,
}

/// One handler per queue, with the options it was subscribed with.
#[derive(Default)]
pub struct SubscriptionRegistry {
    // ---
    entries: HashMap<String, Entry>,
}

impl SubscriptionRegistry {
    /// Subscribe `handler` to `queue_name`, silently replacing any previous
    /// subscription.
    pub fn define(&mut self, queue_name: &str, options: SubscribeOptions, handler: SubscriptionFn) {
        // ---
        self.entries
            .insert(queue_name.to_owned(), Entry { handler, options });
    }

    /// Remove the subscription on `queue_name`.
    ///
    /// Returns whether there was one to remove.
    pub fn undefine(&mut self, queue_name: &str) -> bool {
        self.entries.remove(queue_name).is_some()
    }

    /// Handler and resolved auto-ack flag for `queue_name`.
    pub fn lookup(&self, queue_name: &str) -> Option<(SubscriptionFn, bool)> {
        // ---
        self.entries
            .get(queue_name)
            .map(|entry| (entry.handler.clone(), entry.options.auto_ack()))
    }

    pub fn options(&self, queue_name: &str) -> Option<&SubscribeOptions> {
        self.entries.get(queue_name).map(|entry| &entry.options)
    }

    /// Names of subscribed queues, sorted.
    pub fn queue_names(&self) -> Vec<String> {
        // ---
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(name, entry)| (name, &entry.options)))
            .finish()
    }
}
