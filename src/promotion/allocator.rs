//! Capacity-bounded admission control for promotion requests.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::model::{PromotionRequest, PromotionType, RequestStatus, Reservation};
use crate::errors::{CoreError, CoreResult};
use crate::notify::{EntityKind, NotificationSink, TransitionEvent};
use crate::store::{Collection, Resolution};
use crate::transition::TransitionRule;

const ENTITY: &str = "promotion_request";

const APPROVE: TransitionRule<RequestStatus> = TransitionRule {
    name: "approve",
    from: &[RequestStatus::Pending],
    to: RequestStatus::Approved,
};

const REJECT: TransitionRule<RequestStatus> = TransitionRule {
    name: "reject",
    from: &[RequestStatus::Pending],
    to: RequestStatus::Rejected,
};

// Removal transition: `to` is never written, only `admit` is used.
const CANCEL: TransitionRule<RequestStatus> = TransitionRule {
    name: "cancel",
    from: &[RequestStatus::Pending],
    to: RequestStatus::Pending,
};

/// Input for reserving a promotion slot.
#[derive(Debug, Clone)]
pub struct ReserveRequest {
    pub guide_id: Uuid,
    pub tour_id: Uuid,
    pub promotion_type_id: Uuid,
    pub duration_days: u32,
}

/// Admission controller for promotion slots.
///
/// The capacity check and the insert of the admitted request are one
/// indivisible store operation: two requests racing for the last slot
/// cannot both succeed.
pub struct SlotAllocator {
    types: Arc<Collection<PromotionType>>,
    requests: Arc<Collection<PromotionRequest>>,
    sink: Arc<dyn NotificationSink>,
}

impl SlotAllocator {
    /// Create an allocator with empty type and request collections.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            types: Arc::new(Collection::new("promotion_type")),
            requests: Arc::new(Collection::new(ENTITY)),
            sink,
        }
    }

    /// The underlying request collection.
    pub fn requests(&self) -> Arc<Collection<PromotionRequest>> {
        Arc::clone(&self.requests)
    }

    fn emit(&self, id: Uuid, from: &str, to: &str, reason: Option<&str>) {
        let mut event = TransitionEvent::new(EntityKind::PromotionRequest, id, from, to);
        if let Some(reason) = reason {
            event = event.with_reason(reason);
        }
        self.sink.notify(&event);
    }

    // =========================================================================
    // PROMOTION TYPES
    // =========================================================================

    /// Register a promotion type with a fixed slot capacity.
    pub fn register_type(&self, name: &str, daily_cost: u64, slots: u32) -> CoreResult<PromotionType> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("promotion type name is required".into()));
        }
        if daily_cost == 0 {
            return Err(CoreError::Validation("daily cost must be greater than zero".into()));
        }
        if slots == 0 {
            return Err(CoreError::Validation("slot capacity must be at least one".into()));
        }

        let promotion_type = PromotionType {
            id: Uuid::new_v4(),
            name: name.to_string(),
            daily_cost,
            slots,
            is_active: true,
            created_at: Utc::now(),
        };
        self.types.insert(promotion_type.id, promotion_type.clone())?;
        Ok(promotion_type)
    }

    /// Switch a promotion type on or off for new reservations. Existing
    /// requests are unaffected.
    pub fn set_type_active(&self, type_id: Uuid, is_active: bool) -> CoreResult<PromotionType> {
        self.types.update(type_id, |t| {
            t.is_active = is_active;
            Ok(())
        })
    }

    /// Read one promotion type.
    pub fn get_type(&self, type_id: Uuid) -> CoreResult<PromotionType> {
        self.types.get(type_id)
    }

    // =========================================================================
    // ADMISSION
    // =========================================================================

    /// Reserve a slot by creating a `pending` request.
    ///
    /// Admission counts the type's active requests under the same write
    /// lock that inserts the new record. With K free slots and N racing
    /// callers, exactly K are admitted; the rest fail `SlotsExhausted`.
    pub fn try_reserve(&self, input: ReserveRequest) -> CoreResult<Reservation> {
        if input.duration_days == 0 {
            return Err(CoreError::Validation(
                "promotion duration must be at least one day".into(),
            ));
        }

        let promotion_type = self.types.get(input.promotion_type_id)?;
        if !promotion_type.is_active {
            return Err(CoreError::Validation(
                "promotion type is not accepting requests".into(),
            ));
        }

        // Both factors are caller-controlled; the product must stay in range.
        let total_cost = promotion_type
            .daily_cost
            .checked_mul(u64::from(input.duration_days))
            .ok_or_else(|| {
                CoreError::Validation("promotion cost exceeds the representable range".into())
            })?;

        let now = Utc::now();
        let request = PromotionRequest {
            id: Uuid::new_v4(),
            guide_id: input.guide_id,
            tour_id: input.tour_id,
            promotion_type_id: input.promotion_type_id,
            duration_days: input.duration_days,
            total_cost,
            status: RequestStatus::Pending,
            start_date: None,
            end_date: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        let today = now.date_naive();
        let type_id = input.promotion_type_id;
        let capacity = promotion_type.slots as usize;
        self.requests.insert_admitted(request.id, request.clone(), |all| {
            let active = all
                .values()
                .filter(|r| r.promotion_type_id == type_id && r.is_active(today))
                .count();
            if active >= capacity {
                Err(CoreError::SlotsExhausted)
            } else {
                Ok(())
            }
        })?;

        self.emit(request.id, "new", RequestStatus::Pending.as_str(), None);
        Ok(Reservation { request })
    }

    // =========================================================================
    // SCHEDULING
    // =========================================================================

    /// Admin approval: schedules the promotion window.
    ///
    /// Both dates are required; the window must lie in the future
    /// (`start_date ≥ today`, `end_date > start_date`).
    pub fn approve(
        &self,
        request_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> CoreResult<PromotionRequest> {
        let today = Utc::now().date_naive();
        if start_date < today {
            return Err(CoreError::Validation(
                "promotion start date must not be in the past".into(),
            ));
        }
        if end_date <= start_date {
            return Err(CoreError::Validation(
                "promotion end date must be after the start date".into(),
            ));
        }

        let request = self.requests.update(request_id, |request| {
            request.status = APPROVE.apply(ENTITY, request_id, request.status)?;
            request.start_date = Some(start_date);
            request.end_date = Some(end_date);
            request.rejection_reason = None;
            request.updated_at = Utc::now();
            Ok(())
        })?;
        self.emit(request_id, "pending", request.status.as_str(), None);
        Ok(request)
    }

    /// Admin rejection: the slot releases immediately.
    pub fn reject(&self, request_id: Uuid, reason: &str) -> CoreResult<PromotionRequest> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(CoreError::Validation("rejection reason must not be empty".into()));
        }

        let request = self.requests.update(request_id, |request| {
            request.status = REJECT.apply(ENTITY, request_id, request.status)?;
            request.rejection_reason = Some(reason.to_string());
            request.updated_at = Utc::now();
            Ok(())
        })?;
        self.emit(request_id, "pending", request.status.as_str(), Some(reason));
        Ok(request)
    }

    /// Owner withdrawal of a still-pending request; the record is removed
    /// and the slot releases immediately.
    pub fn cancel(&self, request_id: Uuid, guide_id: Uuid) -> CoreResult<()> {
        self.requests.resolve(request_id, |request| {
            if request.guide_id != guide_id {
                return Err(CoreError::Forbidden);
            }
            CANCEL.admit(ENTITY, request_id, request.status)?;
            Ok(Resolution::Remove)
        })?;
        self.emit(request_id, "pending", "cancelled", None);
        Ok(())
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Read one request.
    pub fn get(&self, request_id: Uuid) -> CoreResult<PromotionRequest> {
        self.requests.get(request_id)
    }

    /// Number of requests currently occupying slots for a type.
    pub fn active_count(&self, type_id: Uuid) -> CoreResult<usize> {
        let today = Utc::now().date_naive();
        Ok(self
            .requests
            .filter(|r| r.promotion_type_id == type_id && r.is_active(today))?
            .len())
    }

    /// All requests placed by a guide.
    pub fn for_guide(&self, guide_id: Uuid) -> CoreResult<Vec<PromotionRequest>> {
        self.requests.filter(|r| r.guide_id == guide_id)
    }
}
