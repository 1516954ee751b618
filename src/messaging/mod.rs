//! Producer and consumer facades.
//!
//! [`Sender`] and [`Receiver`] mirror the shapes application code uses with
//! the real client. Each is bound to one queue and one
//! [`FakeHub`](crate::FakeHub), and delegates every operation to it.

mod receiver;
mod sender;

pub use receiver::{Receiver, RequeueLimitFn};
pub use sender::{ReplyCallback, Sender};
