//! Domain layer public interface.
//!
//! Abstractions shared by the registries and the facades, independent of
//! how state is stored. All consumers import symbols via this module, not
//! by referencing individual files directly.

mod delivery;

pub use delivery::{
    //
    Delivery,
    DeliveryHandle,
    DeliveryHandlePtr,
    DeliveryTag,
    RecordingHandle,
};

/// An opaque message payload.
///
/// The fake never looks inside a message; it only stores and forwards it.
/// Any JSON-shaped value can be published, from plain strings and numbers
/// to nested objects.
pub type Message = serde_json::Value;
