//! Tour Auctions
//!
//! Bid-type tours carry [`crate::tour::BidDetails`] and accept bids until
//! their deadline. Acceptance is a single guarded update on the shared tour
//! collection: the deadline check, the strictly-greater comparison against
//! the amount to beat, and the write of the new high bid happen under one
//! lock. Concurrent equal bids therefore resolve to exactly one winner, and
//! the recorded high bid only ever increases.

mod engine;

pub use engine::{AuctionEngine, BidAccepted, BidStanding};
