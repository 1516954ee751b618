use std::collections::HashMap;

use crate::Message;

/// Messages published to each queue, in publish order.
#[derive(Debug, Default)]
pub struct MessageStore {
    // ---
    queues: HashMap<String, Vec<Message>>,
}

impl MessageStore {
    /// Append `message` to `queue_name`, creating the queue if absent.
    pub fn enqueue(&mut self, queue_name: &str, message: Message) {
        self.messages_for(queue_name).push(message);
    }

    /// Messages recorded for `queue_name`, creating an empty queue if absent.
    pub fn messages_for(&mut self, queue_name: &str) -> &mut Vec<Message> {
        // ---
        self.queues.entry(queue_name.to_owned()).or_default()
    }

    pub fn count(&mut self, queue_name: &str) -> usize {
        self.messages_for(queue_name).len()
    }

    /// Drop every queue.
    pub fn clear(&mut self) {
        self.queues.clear();
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enqueue_preserves_order() {
        // ---
        let mut store = MessageStore::default();
        store.enqueue("jobs", json!(1));
        store.enqueue("jobs", json!({"n": 2}));
        store.enqueue("other", json!("x"));

        assert_eq!(store.messages_for("jobs"), &vec![json!(1), json!({"n": 2})]);
        assert_eq!(store.count("other"), 1);
    }

    #[test]
    fn test_unknown_queue_is_empty() {
        // ---
        let mut store = MessageStore::default();
        assert!(store.messages_for("nowhere").is_empty());
        assert_eq!(store.count("nowhere"), 0);
    }

    #[test]
    fn test_clear_drops_all_queues() {
        // ---
        let mut store = MessageStore::default();
        store.enqueue("a", json!(null));
        store.enqueue("b", json!(null));
        store.clear();

        assert_eq!(store.count("a"), 0);
        assert_eq!(store.count("b"), 0);
    }
}
