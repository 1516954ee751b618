//! Agent facade.
//!
//! Stands in for the client library's agent object. Lifecycle hooks either
//! do nothing or call the supplied callback straight away, and the queue
//! factories build [`Sender`]s and [`Receiver`]s bound to the agent's hub.

use std::sync::Arc;

use crate::{
    // ---
    global_hub,
    log_debug,
    AgentOptions,
    FakeHub,
    Receiver,
    Sender,
    SenderOptions,
    SubscribeOptions,
    TestLogger,
};

/// Fake agent.
///
/// # Example
///
/// ```
/// use mom_double::{Agent, FakeHub, SenderOptions};
/// use serde_json::json;
///
/// let agent = Agent::with_hub(FakeHub::new());
/// let mut started = false;
/// agent.acknowledge_start(|| started = true);
/// assert!(started);
///
/// agent.sender("audit", SenderOptions::default()).publish(json!("hi")).unwrap();
/// assert_eq!(agent.hub().message_count("audit"), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Agent {
    // ---
    hub: Arc<FakeHub>,
}

impl Default for Agent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent {
    /// Create an agent on the process-global hub.
    pub fn new() -> Self {
        Self::with_hub(global_hub())
    }

    /// Create an agent on `hub`.
    pub fn with_hub(hub: Arc<FakeHub>) -> Self {
        Self { hub }
    }

    /// Agent-wide option setter. Ignored.
    pub fn options(_options: AgentOptions) {}

    pub fn hub(&self) -> &Arc<FakeHub> {
        &self.hub
    }

    // --------------------
    // Lifecycle
    // --------------------

    /// Signals are never trapped; `handlers` are not installed.
    pub fn run_signal_handlers<H>(&self, _signal: &str, _handlers: &[H]) {}

    pub fn setup_control_queue(&self) {}

    pub fn setup_stats_queue(&self) {}

    pub fn start_keep_alive(&self) {}

    /// Queues declared by the agent. The fake declares none.
    pub fn queues(&self) -> Vec<String> {
        Vec::new()
    }

    /// Run `callback` as if the start acknowledgement had gone out.
    pub fn acknowledge_start(&self, callback: impl FnOnce()) {
        log_debug!("acknowledge start");
        callback();
    }

    /// Run `callback` as if the stop acknowledgement had gone out.
    pub fn acknowledge_stop(&self, callback: impl FnOnce()) {
        log_debug!("acknowledge stop");
        callback();
    }

    // --------------------
    // Queues
    // --------------------

    pub fn receiver(&self, queue_name: impl Into<String>, options: SubscribeOptions) -> Receiver {
        Receiver::with_hub(self.hub.clone(), queue_name, options)
    }

    /// Create a receiver and hand it to `setup` before returning it.
    pub fn receiver_with<F>(&self, queue_name: impl Into<String>, options: SubscribeOptions, setup: F) -> Receiver
    where
        F: FnOnce(&mut Receiver),
    {
        // ---
        let mut receiver = self.receiver(queue_name, options);
        setup(&mut receiver);
        receiver
    }

    pub fn sender(&self, queue_name: impl Into<String>, options: SenderOptions) -> Sender {
        Sender::with_hub(self.hub.clone(), queue_name, options)
    }

    /// Create one sender per queue name, each configured by `setup`.
    pub fn senders<I, S, F>(&self, queue_names: I, options: SenderOptions, mut setup: F) -> Vec<Sender>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnMut(&mut Sender),
    {
        // ---
        queue_names
            .into_iter()
            .map(|name| Sender::build(self.hub.clone(), name, options.clone(), &mut setup))
            .collect()
    }

    // --------------------
    // Logging
    // --------------------

    /// The logger shared through the agent's hub.
    pub fn logger(&self) -> Arc<TestLogger> {
        self.hub.logger()
    }

    /// Same as [`logger`](Self::logger).
    pub fn get_test_logger(&self) -> Arc<TestLogger> {
        self.logger()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::{Level, RecordingHandle};
    use serde_json::json;

    #[test]
    fn test_lifecycle_hooks() {
        // ---
        let agent = Agent::with_hub(FakeHub::new());
        let mut calls = Vec::new();

        Agent::options(AgentOptions::default());
        agent.run_signal_handlers::<fn()>("TERM", &[]);
        agent.setup_control_queue();
        agent.setup_stats_queue();
        agent.start_keep_alive();
        agent.acknowledge_start(|| calls.push("start"));
        agent.acknowledge_stop(|| calls.push("stop"));

        assert_eq!(calls, vec!["start", "stop"]);
        assert!(agent.queues().is_empty());
    }

    #[test]
    fn test_receiver_with_runs_setup() {
        // ---
        let hub = FakeHub::new();
        let agent = Agent::with_hub(hub.clone());

        agent.receiver_with("jobs", SubscribeOptions::default(), |r| {
            r.subscribe(|_payload, _delivery| Ok(()));
        });

        assert_eq!(hub.subscribed_queues(), vec!["jobs".to_string()]);
        hub.send_message("jobs", json!(1), RecordingHandle::new()).unwrap();
    }

    #[test]
    fn test_senders_one_per_queue() {
        // ---
        let agent = Agent::with_hub(FakeHub::new());
        let mut configured = Vec::new();

        let senders = agent.senders(["a", "b", "c"], SenderOptions::default(), |s| {
            configured.push(s.queue_name().to_owned());
        });

        assert_eq!(configured, vec!["a", "b", "c"]);
        let names: Vec<&str> = senders.iter().map(Sender::queue_name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_logger_is_shared_with_hub() {
        // ---
        let hub = FakeHub::new();
        let agent = Agent::with_hub(hub.clone());

        agent.logger().warn("careful");
        assert_eq!(hub.logger().entries(Level::Warn), vec![json!("careful")]);
        assert!(Arc::ptr_eq(&agent.get_test_logger(), &hub.logger()));
    }
}
