//! In-memory test double for an agent-style message queue client
//!
//! Application code written against agents, senders and receivers can run
//! unchanged in tests against a [`FakeHub`] instead of a broker. Published
//! messages are recorded per queue, subscriptions are invoked synchronously
//! through [`FakeHub::send_message`], request/reply round trips are answered
//! instantly by registered reply functions, and every delivery is guarded so
//! that acknowledging it twice is an error.
//!
//! ```
//! use mom_double::{Agent, Error, FakeHub, RecordingHandle, SubscribeOptions};
//! use serde_json::json;
//!
//! let hub = FakeHub::new();
//! let agent = Agent::with_hub(hub.clone());
//!
//! agent
//!     .receiver("jobs", SubscribeOptions::default())
//!     .subscribe(|_payload, delivery| delivery.ack());
//!
//! // auto-ack already acknowledged the delivery
//! let err = hub.send_message("jobs", json!("work"), RecordingHandle::new()).unwrap_err();
//! assert!(matches!(err, Error::MessageAckedTwice(_)));
//! ```

// Import all sub modules once...
mod agent;
mod domain;
mod hub;
mod logger;
mod macros;
mod messaging;
mod options;
mod registry;

mod error;

#[allow(unused_imports)]
pub(crate) use macros::{log_debug, log_error, log_info, log_warn};

pub(crate) use hub::lock_ignore_poison;

// Re-export main types
pub use agent::Agent;
pub use hub::{global_hub, reset, FakeHub};
pub use messaging::{Receiver, ReplyCallback, RequeueLimitFn, Sender};

pub use error::{Error, Result};
pub use logger::{Level, LevelLog, TestLogger};

pub use options::{
    //
    AgentOptions,
    ReplyOptions,
    RequeueOptions,
    SenderOptions,
    SubscribeOptions,
};

pub use registry::{ReplyFn, SubscriptionFn};

// --- public re-exports
pub use domain::{
    //
    Delivery,
    DeliveryHandle,
    DeliveryHandlePtr,
    DeliveryTag,
    Message,
    RecordingHandle,
};
