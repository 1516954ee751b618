use std::collections::HashMap;
use std::sync::Arc;

use crate::{Message, Result};

/// Function producing the reply to a request published on a queue.
pub type ReplyFn = Arc<dyn Fn(&Message) -> Result<Message> + Send + Sync>;

/// Reply functions used to answer request/reply publishes instantly.
#[derive(Default)]
pub struct ReplyRegistry {
    // ---
    handlers: HashMap<String, ReplyFn>,
}

impl ReplyRegistry {
    /// Register the reply function for `queue_name`, replacing any previous one.
    pub fn set(&mut self, queue_name: &str, reply: ReplyFn) {
        self.handlers.insert(queue_name.to_owned(), reply);
    }

    pub fn get(&self, queue_name: &str) -> Option<ReplyFn> {
        self.handlers.get(queue_name).cloned()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl std::fmt::Debug for ReplyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}
