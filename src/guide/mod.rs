//! Guide Account Lifecycle
//!
//! Two independent approval axes: the account itself
//! (`unverified/pending → approved | rejected`, admin gate) and the guide's
//! public profile (`profileApproved` flips under admin review, with a
//! stored rejection reason). The axes may sit in different states at the
//! same time.
//!
//! Account deletion follows the same two-phase shape as tour deletion but
//! with two deliberate policy differences: a deletion request needs no
//! particular account status, and re-requesting overwrites the outstanding
//! request instead of conflicting.

mod lifecycle;
mod model;

pub use lifecycle::{GuideLifecycle, DELETION_REPEAT};
pub use model::{DeletionState, Guide, GuideStatus, NewGuide};
