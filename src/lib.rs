//! tourflow - Approval and resource-allocation core for a tour marketplace
//!
//! Four coupled mechanisms, each an independent state machine over the same
//! correctness pattern (guarded atomic transition against the record store):
//!
//! - Tour listing lifecycle (review, edit-invalidation, two-phase deletion)
//! - Guide account lifecycle (registration review, profile review, deletion)
//! - Promotion slot allocation (capacity-bounded admission control)
//! - Auction engine (monotone highest-bid ladder on bid-type tours)
//!
//! Design principles:
//! - Every state change is one atomic conditional mutation
//! - Racing conflicting transitions resolve to exactly one winner
//! - Losers receive typed errors, never silent overwrites
//! - No retries inside the core; retry policy belongs to the caller
//! - Notification is fire-and-forget and never blocks a transition

pub mod auction;
pub mod errors;
pub mod guide;
pub mod notify;
pub mod promotion;
pub mod store;
pub mod tour;
pub mod transition;

pub use errors::{CoreError, CoreResult};
