//! Tour Listing Lifecycle
//!
//! A listing is created `pending` by its guide, reviewed by an admin
//! (approve / reject with reason), and forced back to `pending` by any
//! content edit. An approved listing can only be removed through a
//! two-phase protocol: the guide requests deletion, the listing parks in
//! `pending_deletion`, and an admin either confirms (record removed) or
//! rejects (listing reverts to `approved`). Unapproved listings delete
//! immediately, with no admin gate.
//!
//! Every transition is one guarded atomic mutation: simultaneous
//! conflicting admin actions resolve to exactly one winner.

mod lifecycle;
mod model;

pub use lifecycle::{TourDeletion, TourLifecycle, DELETION_REPEAT};
pub use model::{BidDetails, NewBid, NewTour, Offer, OfferSpec, Tour, TourPatch, TourStatus, TourType};
