//! Transition Notification
//!
//! Every successful lifecycle transition emits one [`TransitionEvent`] to a
//! [`NotificationSink`]. Delivery is fire-and-forget: a sink never blocks,
//! never fails, and never rolls back the transition it describes. Email
//! content, recipients, and delivery are a downstream collaborator's job;
//! the core only states what changed.

mod event;
mod logger;
mod sink;

pub use event::{EntityKind, TransitionEvent};
pub use logger::{Logger, Severity};
pub use sink::{LogSink, MemorySink, NotificationSink, NullSink};
