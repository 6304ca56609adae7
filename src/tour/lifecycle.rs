//! Guarded transitions for tour listings.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::model::{BidDetails, NewTour, OfferSpec, Offer, Tour, TourPatch, TourStatus, TourType};
use crate::errors::{CoreError, CoreResult};
use crate::notify::{EntityKind, NotificationSink, TransitionEvent};
use crate::store::{Collection, Outcome, Resolution};
use crate::transition::{RepeatPolicy, TransitionRule};

const ENTITY: &str = "tour";

const APPROVE: TransitionRule<TourStatus> = TransitionRule {
    name: "approve",
    from: &[TourStatus::Pending],
    to: TourStatus::Approved,
};

const REJECT: TransitionRule<TourStatus> = TransitionRule {
    name: "reject",
    from: &[TourStatus::Pending],
    to: TourStatus::Rejected,
};

const RESUBMIT: TransitionRule<TourStatus> = TransitionRule {
    name: "resubmit",
    from: &[TourStatus::Rejected],
    to: TourStatus::Pending,
};

const EDIT: TransitionRule<TourStatus> = TransitionRule {
    name: "edit",
    from: &[TourStatus::Pending, TourStatus::Approved, TourStatus::Rejected],
    to: TourStatus::Pending,
};

const REQUEST_DELETION: TransitionRule<TourStatus> = TransitionRule {
    name: "request_deletion",
    from: &[TourStatus::Approved],
    to: TourStatus::PendingDeletion,
};

// Removal transitions: `to` is never written, only `admit` is used.
const CONFIRM_DELETION: TransitionRule<TourStatus> = TransitionRule {
    name: "confirm_deletion",
    from: &[TourStatus::PendingDeletion],
    to: TourStatus::PendingDeletion,
};

const REJECT_DELETION: TransitionRule<TourStatus> = TransitionRule {
    name: "reject_deletion",
    from: &[TourStatus::PendingDeletion],
    to: TourStatus::Approved,
};

/// A second deletion request on the same tour is a business conflict, not
/// an overwrite. (The guide lifecycle chooses the opposite policy.)
pub const DELETION_REPEAT: RepeatPolicy = RepeatPolicy::Conflict;

/// Outcome of a guide's deletion request.
#[derive(Debug, Clone, PartialEq)]
pub enum TourDeletion {
    /// Tour was approved; it is now parked awaiting admin confirmation.
    AwaitingConfirmation(Tour),
    /// Tour was not approved; it was removed immediately.
    Deleted,
}

/// State machine owner for tour listings.
///
/// Holds the tour collection and emits one [`TransitionEvent`] per
/// committed transition. Methods take the acting guide's id where the
/// operation is owner-restricted.
pub struct TourLifecycle {
    tours: Arc<Collection<Tour>>,
    sink: Arc<dyn NotificationSink>,
}

impl TourLifecycle {
    /// Create a lifecycle over a fresh tour collection.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self::with_collection(Arc::new(Collection::new(ENTITY)), sink)
    }

    /// Create a lifecycle over an existing collection (shared with the
    /// auction engine).
    pub fn with_collection(tours: Arc<Collection<Tour>>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { tours, sink }
    }

    /// The underlying tour collection.
    pub fn collection(&self) -> Arc<Collection<Tour>> {
        Arc::clone(&self.tours)
    }

    fn emit(&self, id: Uuid, from: &str, to: &str, reason: Option<&str>) {
        let mut event = TransitionEvent::new(EntityKind::Tour, id, from, to);
        if let Some(reason) = reason {
            event = event.with_reason(reason);
        }
        self.sink.notify(&event);
    }

    // =========================================================================
    // SUBMISSION & REVIEW
    // =========================================================================

    /// Create a listing in `pending` review.
    pub fn submit(&self, input: NewTour) -> CoreResult<Tour> {
        input.validate()?;

        let now = Utc::now();
        let tour = Tour {
            id: Uuid::new_v4(),
            guide_id: input.guide_id,
            title: input.title,
            description: input.description,
            price: input.price,
            images: input.images,
            status: TourStatus::Pending,
            is_active: false,
            rejection_reason: None,
            tour_type: input.tour_type,
            bid_details: input.bid.map(|bid| BidDetails {
                starting_price: bid.starting_price,
                current_highest_bid: 0,
                highest_bidder_id: None,
                bid_end_date: bid.bid_end_date,
            }),
            offer: None,
            created_at: now,
            updated_at: now,
        };

        self.tours.insert(tour.id, tour.clone())?;
        self.emit(tour.id, "new", TourStatus::Pending.as_str(), None);
        Ok(tour)
    }

    /// Admin approval: `pending → approved`.
    pub fn approve(&self, tour_id: Uuid) -> CoreResult<Tour> {
        let mut from = TourStatus::Pending;
        let tour = self.tours.update(tour_id, |tour| {
            from = tour.status;
            tour.status = APPROVE.apply(ENTITY, tour_id, tour.status)?;
            tour.is_active = true;
            tour.rejection_reason = None;
            tour.updated_at = Utc::now();
            Ok(())
        })?;
        self.emit(tour_id, from.as_str(), tour.status.as_str(), None);
        Ok(tour)
    }

    /// Admin rejection: `pending → rejected`, reason stored on the tour.
    pub fn reject(&self, tour_id: Uuid, reason: &str) -> CoreResult<Tour> {
        let reason = non_empty(reason, "rejection reason")?;
        let mut from = TourStatus::Pending;
        let tour = self.tours.update(tour_id, |tour| {
            from = tour.status;
            tour.status = REJECT.apply(ENTITY, tour_id, tour.status)?;
            tour.is_active = false;
            tour.rejection_reason = Some(reason.clone());
            tour.updated_at = Utc::now();
            Ok(())
        })?;
        self.emit(tour_id, from.as_str(), tour.status.as_str(), Some(&reason));
        Ok(tour)
    }

    /// Guide resubmission after rejection: `rejected → pending`, reason
    /// cleared.
    pub fn resubmit(&self, tour_id: Uuid, guide_id: Uuid) -> CoreResult<Tour> {
        let mut from = TourStatus::Rejected;
        let tour = self.tours.update(tour_id, |tour| {
            owned_by(tour, guide_id)?;
            from = tour.status;
            tour.status = RESUBMIT.apply(ENTITY, tour_id, tour.status)?;
            tour.rejection_reason = None;
            tour.updated_at = Utc::now();
            Ok(())
        })?;
        self.emit(tour_id, from.as_str(), tour.status.as_str(), None);
        Ok(tour)
    }

    /// Owner edit. Fields overwrite, images append, and the listing is
    /// forced back to `pending` with its rejection reason cleared,
    /// whatever state review had left it in.
    pub fn edit(&self, tour_id: Uuid, guide_id: Uuid, patch: TourPatch) -> CoreResult<Tour> {
        let mut from = TourStatus::Pending;
        let tour = self.tours.update(tour_id, |tour| {
            owned_by(tour, guide_id)?;
            from = tour.status;
            let next = EDIT.apply(ENTITY, tour_id, tour.status)?;

            if let Some(title) = &patch.title {
                let title = non_empty(title, "tour title")?;
                tour.title = title;
            }
            if let Some(description) = &patch.description {
                let description = non_empty(description, "tour description")?;
                tour.description = description;
            }
            if let Some(price) = patch.price {
                if price == 0 && tour.tour_type == TourType::Standard {
                    return Err(CoreError::Validation(
                        "tour price must be greater than zero".into(),
                    ));
                }
                tour.price = price;
            }
            tour.images.extend(patch.append_images.iter().cloned());

            tour.status = next;
            tour.is_active = false;
            tour.rejection_reason = None;
            tour.updated_at = Utc::now();
            Ok(())
        })?;
        self.emit(tour_id, from.as_str(), tour.status.as_str(), None);
        Ok(tour)
    }

    // =========================================================================
    // TWO-PHASE DELETION
    // =========================================================================

    /// Guide-initiated deletion.
    ///
    /// Approved listings park in `pending_deletion` and wait for an admin;
    /// a second request while parked is a conflict
    /// ([`DELETION_REPEAT`] = [`RepeatPolicy::Conflict`]). Anything not yet
    /// approved is removed immediately, with no admin gate.
    pub fn request_deletion(&self, tour_id: Uuid, guide_id: Uuid) -> CoreResult<TourDeletion> {
        let mut from = TourStatus::Pending;
        let outcome = self.tours.resolve(tour_id, |tour| {
            owned_by(tour, guide_id)?;
            from = tour.status;
            match tour.status {
                TourStatus::Approved => {
                    let mut draft = tour.clone();
                    draft.status = REQUEST_DELETION.apply(ENTITY, tour_id, tour.status)?;
                    draft.is_active = false;
                    draft.updated_at = Utc::now();
                    Ok(Resolution::Replace(draft))
                }
                TourStatus::PendingDeletion => match DELETION_REPEAT {
                    RepeatPolicy::Conflict => Err(CoreError::Conflict(
                        "tour deletion is already pending confirmation".into(),
                    )),
                    RepeatPolicy::Overwrite => Ok(Resolution::Replace(tour.clone())),
                },
                TourStatus::Pending | TourStatus::Rejected => Ok(Resolution::Remove),
            }
        })?;

        match outcome {
            Outcome::Updated(tour) => {
                self.emit(tour_id, from.as_str(), tour.status.as_str(), None);
                Ok(TourDeletion::AwaitingConfirmation(tour))
            }
            Outcome::Removed(_) => {
                self.emit(tour_id, from.as_str(), "deleted", None);
                Ok(TourDeletion::Deleted)
            }
        }
    }

    /// Admin confirmation: permanently removes a parked listing.
    pub fn confirm_deletion(&self, tour_id: Uuid) -> CoreResult<()> {
        let outcome = self.tours.resolve(tour_id, |tour| {
            CONFIRM_DELETION.admit(ENTITY, tour_id, tour.status)?;
            Ok(Resolution::Remove)
        })?;
        if let Outcome::Removed(tour) = outcome {
            self.emit(tour_id, tour.status.as_str(), "deleted", None);
        }
        Ok(())
    }

    /// Admin refusal of a deletion request: the listing reverts to
    /// `approved`. The reason travels to the guide in the event only; it is
    /// not persisted on the tour.
    pub fn reject_deletion(&self, tour_id: Uuid, reason: &str) -> CoreResult<Tour> {
        let reason = non_empty(reason, "deletion rejection reason")?;
        let mut from = TourStatus::PendingDeletion;
        let tour = self.tours.update(tour_id, |tour| {
            from = tour.status;
            tour.status = REJECT_DELETION.apply(ENTITY, tour_id, tour.status)?;
            tour.is_active = true;
            tour.updated_at = Utc::now();
            Ok(())
        })?;
        self.emit(tour_id, from.as_str(), tour.status.as_str(), Some(&reason));
        Ok(tour)
    }

    // =========================================================================
    // OFFERS
    // =========================================================================

    /// Owner sets a discount offer. Pricing promotions are not reviewed
    /// content: the listing's status is untouched.
    pub fn set_offer(&self, tour_id: Uuid, guide_id: Uuid, spec: OfferSpec) -> CoreResult<Tour> {
        spec.validate()?;
        self.tours.update(tour_id, |tour| {
            owned_by(tour, guide_id)?;
            tour.offer = Some(Offer {
                discount_percentage: spec.discount_percentage,
                start_date: spec.start_date,
                end_date: spec.end_date,
                is_active: true,
            });
            tour.updated_at = Utc::now();
            Ok(())
        })
    }

    /// Owner removes the discount offer.
    pub fn clear_offer(&self, tour_id: Uuid, guide_id: Uuid) -> CoreResult<Tour> {
        self.tours.update(tour_id, |tour| {
            owned_by(tour, guide_id)?;
            tour.offer = None;
            tour.updated_at = Utc::now();
            Ok(())
        })
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Read one tour.
    pub fn get(&self, tour_id: Uuid) -> CoreResult<Tour> {
        self.tours.get(tour_id)
    }

    /// Admin review queue: listings awaiting approval.
    pub fn pending(&self) -> CoreResult<Vec<Tour>> {
        self.tours.filter(|t| t.status == TourStatus::Pending)
    }

    /// Admin deletion queue: listings awaiting deletion confirmation.
    pub fn pending_deletion(&self) -> CoreResult<Vec<Tour>> {
        self.tours.filter(|t| t.status == TourStatus::PendingDeletion)
    }

    /// All listings owned by a guide.
    pub fn for_guide(&self, guide_id: Uuid) -> CoreResult<Vec<Tour>> {
        self.tours.filter(|t| t.guide_id == guide_id)
    }
}

fn owned_by(tour: &Tour, guide_id: Uuid) -> CoreResult<()> {
    if tour.guide_id == guide_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden)
    }
}

fn non_empty(value: &str, what: &str) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CoreError::Validation(format!("{what} must not be empty")))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MemorySink;
    use crate::tour::model::NewBid;
    use chrono::Duration;

    fn lifecycle() -> (TourLifecycle, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (TourLifecycle::new(sink.clone()), sink)
    }

    fn standard_input(guide_id: Uuid) -> NewTour {
        NewTour {
            guide_id,
            title: "Harbour kayak trip".into(),
            description: "Sunset paddle along the breakwater".into(),
            price: 3_000,
            images: vec!["tours/kayak/cover.jpg".into()],
            tour_type: TourType::Standard,
            bid: None,
        }
    }

    fn submitted(lifecycle: &TourLifecycle, guide_id: Uuid) -> Tour {
        lifecycle.submit(standard_input(guide_id)).unwrap()
    }

    #[test]
    fn test_submit_starts_pending() {
        let (lifecycle, sink) = lifecycle();
        let tour = submitted(&lifecycle, Uuid::new_v4());

        assert_eq!(tour.status, TourStatus::Pending);
        assert!(!tour.is_active);
        assert!(tour.rejection_reason.is_none());
        assert_eq!(sink.events()[0].to, "pending");
    }

    #[test]
    fn test_submit_validates_input() {
        let (lifecycle, sink) = lifecycle();
        let mut input = standard_input(Uuid::new_v4());
        input.images.clear();

        assert!(matches!(
            lifecycle.submit(input),
            Err(CoreError::Validation(_))
        ));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_approve_pending() {
        let (lifecycle, _) = lifecycle();
        let tour = submitted(&lifecycle, Uuid::new_v4());

        let approved = lifecycle.approve(tour.id).unwrap();
        assert_eq!(approved.status, TourStatus::Approved);
        assert!(approved.is_active);
    }

    #[test]
    fn test_approve_twice_fails_second_time() {
        let (lifecycle, _) = lifecycle();
        let tour = submitted(&lifecycle, Uuid::new_v4());

        lifecycle.approve(tour.id).unwrap();
        let err = lifecycle.approve(tour.id).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransition {
                current: "approved",
                attempted: "approve",
                ..
            }
        ));
    }

    #[test]
    fn test_reject_requires_reason() {
        let (lifecycle, _) = lifecycle();
        let tour = submitted(&lifecycle, Uuid::new_v4());

        assert!(matches!(
            lifecycle.reject(tour.id, "  "),
            Err(CoreError::Validation(_))
        ));
        // Tour untouched by the failed call.
        assert_eq!(lifecycle.get(tour.id).unwrap().status, TourStatus::Pending);
    }

    #[test]
    fn test_reject_then_resubmit_clears_reason() {
        let (lifecycle, _) = lifecycle();
        let guide_id = Uuid::new_v4();
        let tour = submitted(&lifecycle, guide_id);

        let rejected = lifecycle.reject(tour.id, "missing images").unwrap();
        assert_eq!(rejected.status, TourStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("missing images"));

        let resubmitted = lifecycle.resubmit(tour.id, guide_id).unwrap();
        assert_eq!(resubmitted.status, TourStatus::Pending);
        assert!(resubmitted.rejection_reason.is_none());
    }

    #[test]
    fn test_resubmit_requires_rejected() {
        let (lifecycle, _) = lifecycle();
        let guide_id = Uuid::new_v4();
        let tour = submitted(&lifecycle, guide_id);

        assert!(matches!(
            lifecycle.resubmit(tour.id, guide_id),
            Err(CoreError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_edit_forces_pending_and_appends_images() {
        let (lifecycle, _) = lifecycle();
        let guide_id = Uuid::new_v4();
        let tour = submitted(&lifecycle, guide_id);
        lifecycle.approve(tour.id).unwrap();

        let patch = TourPatch {
            title: Some("Harbour kayak trip, extended".into()),
            append_images: vec!["tours/kayak/route.jpg".into()],
            ..TourPatch::default()
        };
        let edited = lifecycle.edit(tour.id, guide_id, patch).unwrap();

        assert_eq!(edited.status, TourStatus::Pending);
        assert!(!edited.is_active);
        assert_eq!(edited.images.len(), 2);
        assert_eq!(edited.title, "Harbour kayak trip, extended");
    }

    #[test]
    fn test_edit_clears_rejection_reason() {
        let (lifecycle, _) = lifecycle();
        let guide_id = Uuid::new_v4();
        let tour = submitted(&lifecycle, guide_id);
        lifecycle.reject(tour.id, "too short").unwrap();

        let edited = lifecycle
            .edit(
                tour.id,
                guide_id,
                TourPatch {
                    description: Some("Now four hours, with lunch".into()),
                    ..TourPatch::default()
                },
            )
            .unwrap();

        assert_eq!(edited.status, TourStatus::Pending);
        assert!(edited.rejection_reason.is_none());
    }

    #[test]
    fn test_edit_by_non_owner_is_forbidden() {
        let (lifecycle, _) = lifecycle();
        let tour = submitted(&lifecycle, Uuid::new_v4());

        let err = lifecycle
            .edit(tour.id, Uuid::new_v4(), TourPatch::default())
            .unwrap_err();
        assert_eq!(err, CoreError::Forbidden);
    }

    #[test]
    fn test_request_deletion_on_approved_parks_tour() {
        let (lifecycle, _) = lifecycle();
        let guide_id = Uuid::new_v4();
        let tour = submitted(&lifecycle, guide_id);
        lifecycle.approve(tour.id).unwrap();

        match lifecycle.request_deletion(tour.id, guide_id).unwrap() {
            TourDeletion::AwaitingConfirmation(parked) => {
                assert_eq!(parked.status, TourStatus::PendingDeletion);
                assert!(!parked.is_active);
            }
            other => panic!("expected AwaitingConfirmation, got {other:?}"),
        }
    }

    #[test]
    fn test_repeated_deletion_request_conflicts() {
        let (lifecycle, _) = lifecycle();
        let guide_id = Uuid::new_v4();
        let tour = submitted(&lifecycle, guide_id);
        lifecycle.approve(tour.id).unwrap();

        lifecycle.request_deletion(tour.id, guide_id).unwrap();
        let err = lifecycle.request_deletion(tour.id, guide_id).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn test_request_deletion_on_pending_deletes_immediately() {
        let (lifecycle, sink) = lifecycle();
        let guide_id = Uuid::new_v4();
        let tour = submitted(&lifecycle, guide_id);

        assert_eq!(
            lifecycle.request_deletion(tour.id, guide_id).unwrap(),
            TourDeletion::Deleted
        );
        assert!(lifecycle.get(tour.id).is_err());

        let last = sink.events().pop().unwrap();
        assert_eq!(last.from, "pending");
        assert_eq!(last.to, "deleted");
    }

    #[test]
    fn test_confirm_deletion_removes_record() {
        let (lifecycle, _) = lifecycle();
        let guide_id = Uuid::new_v4();
        let tour = submitted(&lifecycle, guide_id);
        lifecycle.approve(tour.id).unwrap();
        lifecycle.request_deletion(tour.id, guide_id).unwrap();

        lifecycle.confirm_deletion(tour.id).unwrap();
        assert!(lifecycle.get(tour.id).is_err());
    }

    #[test]
    fn test_confirm_deletion_requires_pending_deletion() {
        let (lifecycle, _) = lifecycle();
        let tour = submitted(&lifecycle, Uuid::new_v4());

        let err = lifecycle.confirm_deletion(tour.id).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
        assert!(lifecycle.get(tour.id).is_ok());
    }

    #[test]
    fn test_reject_deletion_restores_approved() {
        let (lifecycle, _) = lifecycle();
        let guide_id = Uuid::new_v4();
        let tour = submitted(&lifecycle, guide_id);
        lifecycle.approve(tour.id).unwrap();
        lifecycle.request_deletion(tour.id, guide_id).unwrap();

        let restored = lifecycle
            .reject_deletion(tour.id, "bookings still outstanding")
            .unwrap();
        assert_eq!(restored.status, TourStatus::Approved);
        assert!(restored.is_active);
        // The refusal reason is communicated, not persisted.
        assert!(restored.rejection_reason.is_none());
    }

    #[test]
    fn test_offer_set_and_clear_do_not_touch_status() {
        let (lifecycle, _) = lifecycle();
        let guide_id = Uuid::new_v4();
        let tour = submitted(&lifecycle, guide_id);
        lifecycle.approve(tour.id).unwrap();

        let spec = OfferSpec {
            discount_percentage: 20,
            start_date: chrono::NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            end_date: chrono::NaiveDate::from_ymd_opt(2026, 9, 15).unwrap(),
        };
        let with_offer = lifecycle.set_offer(tour.id, guide_id, spec).unwrap();
        assert_eq!(with_offer.status, TourStatus::Approved);
        assert_eq!(with_offer.offer.as_ref().unwrap().discount_percentage, 20);

        let cleared = lifecycle.clear_offer(tour.id, guide_id).unwrap();
        assert!(cleared.offer.is_none());
        assert_eq!(cleared.status, TourStatus::Approved);
    }

    #[test]
    fn test_bid_tour_submission_carries_details() {
        let (lifecycle, _) = lifecycle();
        let mut input = standard_input(Uuid::new_v4());
        input.tour_type = TourType::Bid;
        input.bid = Some(NewBid {
            starting_price: 10_000,
            bid_end_date: Utc::now() + Duration::days(14),
        });

        let tour = lifecycle.submit(input).unwrap();
        let details = tour.bid_details.unwrap();
        assert_eq!(details.starting_price, 10_000);
        assert_eq!(details.current_highest_bid, 0);
        assert!(details.highest_bidder_id.is_none());
    }

    #[test]
    fn test_admin_queues() {
        let (lifecycle, _) = lifecycle();
        let guide_id = Uuid::new_v4();
        let first = submitted(&lifecycle, guide_id);
        let second = submitted(&lifecycle, guide_id);
        lifecycle.approve(second.id).unwrap();
        lifecycle.request_deletion(second.id, guide_id).unwrap();

        let pending = lifecycle.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, first.id);

        let parked = lifecycle.pending_deletion().unwrap();
        assert_eq!(parked.len(), 1);
        assert_eq!(parked[0].id, second.id);
    }

    #[test]
    fn test_events_carry_reasons() {
        let (lifecycle, sink) = lifecycle();
        let tour = submitted(&lifecycle, Uuid::new_v4());
        lifecycle.reject(tour.id, "blurry cover image").unwrap();

        let last = sink.events().pop().unwrap();
        assert_eq!(last.wire_name(), "TOUR_PENDING_TO_REJECTED");
        assert_eq!(last.reason.as_deref(), Some("blurry cover image"));
    }
}
