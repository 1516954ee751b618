// src/domain/delivery.rs

//! Delivered-message handles and the at-most-once acknowledgement guard.
//!
//! A real broker client hands each subscription callback a handle to the
//! delivered message which the application acknowledges when it is done.
//! [`DeliveryHandle`] captures the part of that handle application code
//! relies on, and [`Delivery`] wraps any handle so that acknowledging the
//! same message twice is reported as an error instead of being forwarded.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{log_debug, log_warn, Error, Message, Result};

/// Identifier assigned to every delivery made by the fake broker.
///
/// Tags are opaque and only used to tell deliveries apart in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryTag(String);

impl DeliveryTag {
    /// Generate a new unique delivery tag.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeliveryTag {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for DeliveryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capabilities of a delivered-message handle.
///
/// Only `ack` is required. The remaining operations default to no-ops
/// because the fake never redelivers anything.
pub trait DeliveryHandle: Send + Sync {
    // ---
    /// Acknowledge the message to the broker.
    fn ack(&self);

    /// Reject the message, optionally asking for it to be requeued.
    fn reject(&self, _requeue: bool) {}

    /// Ask the broker to requeue the message.
    fn requeue(&self) {}
}

/// Shared pointer to a type-erased delivery handle.
pub type DeliveryHandlePtr = Arc<dyn DeliveryHandle>;

/// A [`DeliveryHandle`] that only counts what was done to it.
///
/// Handy as the receiver argument of
/// [`FakeHub::send_message`](crate::FakeHub::send_message) when a test
/// wants to assert on how often the wrapped handle was acknowledged.
#[derive(Debug, Default)]
pub struct RecordingHandle {
    acks: AtomicUsize,
    rejects: AtomicUsize,
    requeues: AtomicUsize,
}

impl RecordingHandle {
    /// Create a new recorder wrapped in an `Arc`, ready to be shared.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of acknowledgements that reached this handle.
    pub fn ack_count(&self) -> usize {
        self.acks.load(Ordering::SeqCst)
    }

    /// Number of rejections that reached this handle.
    pub fn reject_count(&self) -> usize {
        self.rejects.load(Ordering::SeqCst)
    }

    /// Number of requeue requests that reached this handle.
    pub fn requeue_count(&self) -> usize {
        self.requeues.load(Ordering::SeqCst)
    }
}

impl DeliveryHandle for RecordingHandle {
    fn ack(&self) {
        self.acks.fetch_add(1, Ordering::SeqCst);
    }

    fn reject(&self, _requeue: bool) {
        self.rejects.fetch_add(1, Ordering::SeqCst);
    }

    fn requeue(&self) {
        self.requeues.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: DeliveryHandle + ?Sized> DeliveryHandle for Arc<T> {
    fn ack(&self) {
        (**self).ack()
    }

    fn reject(&self, requeue: bool) {
        (**self).reject(requeue)
    }

    fn requeue(&self) {
        (**self).requeue()
    }
}

struct DeliveryState {
    tag: DeliveryTag,
    acked: AtomicBool,
    handle: DeliveryHandlePtr,
}

/// A delivered message handle guarded against double acknowledgement.
///
/// Wraps the receiver passed to the broker and forwards every operation to
/// it. `ack` is forwarded only the first time; any later attempt fails with
/// [`Error::MessageAckedTwice`].
///
/// Clones share the same acknowledgement state, so acknowledging through a
/// clone or through [`callback`](Self::callback) counts as acknowledging the
/// original.
///
/// # Example
///
/// ```
/// # use mom_double::{Delivery, RecordingHandle};
/// let handle = RecordingHandle::new();
/// let delivery = Delivery::new(handle.clone());
///
/// delivery.ack().unwrap();
/// assert!(delivery.ack().is_err());
/// assert_eq!(handle.ack_count(), 1);
/// ```
#[derive(Clone)]
pub struct Delivery {
    // ---
    inner: Arc<DeliveryState>,
}

impl Delivery {
    /// Wrap a delivery handle.
    pub fn new(handle: impl DeliveryHandle + 'static) -> Self {
        // ---
        Self::from_ptr(Arc::new(handle))
    }

    /// Wrap an already shared delivery handle.
    pub fn from_ptr(handle: DeliveryHandlePtr) -> Self {
        // ---
        Self {
            inner: Arc::new(DeliveryState {
                tag: DeliveryTag::generate(),
                acked: AtomicBool::new(false),
                handle,
            }),
        }
    }

    /// Acknowledge the message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageAckedTwice`] if this delivery was already
    /// acknowledged, either explicitly or by the broker's auto-ack.
    pub fn ack(&self) -> Result<()> {
        // ---
        let first = self
            .inner
            .acked
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();

        if !first {
            log_warn!("delivery {} acked twice", self.inner.tag);
            return Err(Error::MessageAckedTwice(self.inner.tag.clone()));
        }

        log_debug!("delivery {} acked", self.inner.tag);
        self.inner.handle.ack();
        Ok(())
    }

    /// The acknowledgement as a plain one-argument callback.
    ///
    /// For call sites that expect a function rather than a handle. The
    /// argument is ignored; calling the closure is the same as calling
    /// [`ack`](Self::ack).
    pub fn callback(&self) -> impl Fn(&Message) -> Result<()> + Send + Sync + 'static {
        // ---
        let delivery = self.clone();
        move |_msg: &Message| delivery.ack()
    }

    /// Whether this delivery has been acknowledged.
    pub fn is_acked(&self) -> bool {
        self.inner.acked.load(Ordering::SeqCst)
    }

    /// Tag identifying this delivery.
    pub fn tag(&self) -> &DeliveryTag {
        &self.inner.tag
    }

    /// Forward a rejection to the wrapped handle.
    pub fn reject(&self, requeue: bool) {
        self.inner.handle.reject(requeue)
    }

    /// Forward a requeue request to the wrapped handle.
    pub fn requeue(&self) {
        self.inner.handle.requeue()
    }

    /// The wrapped handle, for capabilities beyond [`DeliveryHandle`].
    pub fn handle(&self) -> &DeliveryHandlePtr {
        &self.inner.handle
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("tag", &self.inner.tag)
            .field("acked", &self.is_acked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_ack_is_forwarded() {
        // ---
        let handle = RecordingHandle::new();
        let delivery = Delivery::new(handle.clone());

        assert!(!delivery.is_acked());
        delivery.ack().unwrap();

        assert!(delivery.is_acked());
        assert_eq!(handle.ack_count(), 1);
    }

    #[test]
    fn test_second_ack_fails_and_is_not_forwarded() {
        // ---
        let handle = RecordingHandle::new();
        let delivery = Delivery::new(handle.clone());

        delivery.ack().unwrap();
        let err = delivery.ack().unwrap_err();

        assert!(matches!(err, Error::MessageAckedTwice(ref tag) if tag == delivery.tag()));
        assert_eq!(handle.ack_count(), 1);
    }

    #[test]
    fn test_callback_shares_ack_state() {
        // ---
        let handle = RecordingHandle::new();
        let delivery = Delivery::new(handle.clone());
        let ack = delivery.callback();

        ack(&json!("ignored")).unwrap();
        assert!(delivery.is_acked());
        assert!(delivery.ack().is_err());
        assert!(ack(&json!(null)).is_err());
        assert_eq!(handle.ack_count(), 1);
    }

    #[test]
    fn test_clones_share_ack_state() {
        // ---
        let delivery = Delivery::new(RecordingHandle::new());
        let copy = delivery.clone();

        copy.ack().unwrap();
        assert!(delivery.ack().is_err());
        assert_eq!(copy.tag(), delivery.tag());
    }

    #[test]
    fn test_reject_and_requeue_are_forwarded() {
        // ---
        let handle = RecordingHandle::new();
        let delivery = Delivery::new(handle.clone());

        delivery.reject(true);
        delivery.requeue();
        delivery.requeue();

        assert_eq!(handle.reject_count(), 1);
        assert_eq!(handle.requeue_count(), 2);
        assert!(!delivery.is_acked());
    }

    #[test]
    fn test_tags_are_unique() {
        // ---
        let a = Delivery::new(RecordingHandle::new());
        let b = Delivery::new(RecordingHandle::new());
        assert_ne!(a.tag(), b.tag());
        assert_eq!(a.tag().as_str().len(), 36);
    }
}
