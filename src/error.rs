use thiserror::Error;

use crate::DeliveryTag;

/// Errors raised by the fake broker.
///
/// None of these are handled internally; they surface to the test that
/// triggered them.
#[derive(Error, Debug)]
pub enum Error {
    /// A message was sent to a queue nobody subscribed to.
    #[error("no subscribers on queue: {0}")]
    NoSubscribers(String),

    /// A delivery was acknowledged more than once.
    #[error("message was acked twice (delivery {0})")]
    MessageAckedTwice(DeliveryTag),

    /// JSON serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A subscription handler or reply function reported a failure
    #[error("handler error: {0}")]
    Handler(String),
}

impl Error {
    /// Convenience constructor for handler failures raised by test code.
    pub fn handler(msg: impl Into<String>) -> Self {
        Error::Handler(msg.into())
    }
}

/// Result type alias for fake broker operations
pub type Result<T> = std::result::Result<T, Error>;
