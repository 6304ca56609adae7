//! Promotion Slot Allocation
//!
//! A promotion type carries a fixed number of slots. A slot is occupied by
//! every request that is *active*: status `pending` or `approved`, and not
//! yet past its end date. Admission is the correctness-critical operation:
//! the count of active requests and the insert of the new one happen under
//! one store lock, so N racing reservations against K free slots admit
//! exactly K.
//!
//! Slots release eagerly on rejection and cancellation; expiry by end date
//! is lazy, re-evaluated at every admission.

mod allocator;
mod model;

pub use allocator::{ReserveRequest, SlotAllocator};
pub use model::{PromotionRequest, PromotionType, RequestStatus, Reservation};
