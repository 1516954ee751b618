//! Options accepted by the facades.
//!
//! Callers of the real client pass loosely typed option maps. Each options
//! type here names the keys the fake understands and keeps every other key
//! in `extra`, so option maps can be passed through unchanged via
//! `from_value` or built with the `with_*` setters.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;

fn from_json<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

/// Options given to a [`Receiver`](crate::Receiver) and stored with its
/// subscription.
///
/// # Example
///
/// ```
/// use mom_double::SubscribeOptions;
/// use serde_json::json;
///
/// let opts = SubscribeOptions::from_value(json!({"auto_ack": false, "prefetch": 5})).unwrap();
/// assert!(!opts.auto_ack());
/// assert_eq!(opts.extra["prefetch"], json!(5));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscribeOptions {
    // ---
    /// Acknowledge each delivery before the handler sees it.
    ///
    /// Unset means `true`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_ack: Option<bool>,

    /// Keys the fake stores but does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubscribeOptions {
    /// Parse options from a JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        from_json(value)
    }

    /// Resolved auto-ack flag (defaults to `true`).
    pub fn auto_ack(&self) -> bool {
        self.auto_ack.unwrap_or(true)
    }

    /// Set the auto-ack flag explicitly.
    pub fn with_auto_ack(mut self, auto_ack: bool) -> Self {
        self.auto_ack = Some(auto_ack);
        self
    }

    /// Store an uninterpreted option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Options given to a [`Sender`](crate::Sender). Stored, never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderOptions {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SenderOptions {
    /// Parse options from a JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        from_json(value)
    }

    /// Store an uninterpreted option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Options passed along with an `on_reply` callback.
///
/// The fake answers replies instantly, so `timeout_secs` is recorded but
/// never enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyOptions {
    #[serde(rename = "timeout", skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReplyOptions {
    pub fn from_value(value: Value) -> Result<Self> {
        from_json(value)
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

/// Requeue behaviour configured on a [`Receiver`](crate::Receiver).
///
/// Requeueing is not simulated; these values are only kept so tests can
/// check what the code under test asked for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequeueOptions {
    // ---
    /// Maximum number of requeues before the limit handler would fire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    /// Delay between requeues, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,

    /// Backoff strategy name (e.g. `"linear"`, `"exponential"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RequeueOptions {
    pub fn from_value(value: Value) -> Result<Self> {
        from_json(value)
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_delay(mut self, secs: u64) -> Self {
        self.delay = Some(secs);
        self
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }
}

/// Agent-wide options. Accepted and ignored by
/// [`Agent::options`](crate::Agent::options).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentOptions {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AgentOptions {
    pub fn from_value(value: Value) -> Result<Self> {
        from_json(value)
    }
}
