//! Guarded transitions for guide accounts.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::model::{DeletionState, Guide, GuideStatus, NewGuide};
use crate::errors::{CoreError, CoreResult};
use crate::notify::{EntityKind, NotificationSink, TransitionEvent};
use crate::store::{Collection, Outcome, Resolution};
use crate::transition::{RepeatPolicy, StateName, TransitionRule};

const ENTITY: &str = "guide";

const SUBMIT_FOR_REVIEW: TransitionRule<GuideStatus> = TransitionRule {
    name: "submit_for_review",
    from: &[GuideStatus::Unverified],
    to: GuideStatus::Pending,
};

const APPROVE_ACCOUNT: TransitionRule<GuideStatus> = TransitionRule {
    name: "approve",
    from: &[GuideStatus::Unverified, GuideStatus::Pending],
    to: GuideStatus::Approved,
};

const REJECT_ACCOUNT: TransitionRule<GuideStatus> = TransitionRule {
    name: "reject",
    from: &[GuideStatus::Unverified, GuideStatus::Pending],
    to: GuideStatus::Rejected,
};

/// A repeated deletion request overwrites the outstanding one (re-stating
/// the reason), unlike the tour protocol where it conflicts.
pub const DELETION_REPEAT: RepeatPolicy = RepeatPolicy::Overwrite;

/// `from` includes `Requested` because [`DELETION_REPEAT`] is `Overwrite`.
const REQUEST_DELETION: TransitionRule<DeletionState> = TransitionRule {
    name: "request_deletion",
    from: &[DeletionState::Active, DeletionState::Requested],
    to: DeletionState::Requested,
};

const CANCEL_DELETION: TransitionRule<DeletionState> = TransitionRule {
    name: "cancel_deletion",
    from: &[DeletionState::Requested],
    to: DeletionState::Active,
};

const REJECT_DELETION: TransitionRule<DeletionState> = TransitionRule {
    name: "reject_deletion",
    from: &[DeletionState::Requested],
    to: DeletionState::Active,
};

// Removal transition: `to` is never written, only `admit` is used.
const CONFIRM_DELETION: TransitionRule<DeletionState> = TransitionRule {
    name: "confirm_deletion",
    from: &[DeletionState::Requested],
    to: DeletionState::Requested,
};

/// State machine owner for guide accounts.
pub struct GuideLifecycle {
    guides: Arc<Collection<Guide>>,
    sink: Arc<dyn NotificationSink>,
}

impl GuideLifecycle {
    /// Create a lifecycle over a fresh guide collection.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            guides: Arc::new(Collection::new(ENTITY)),
            sink,
        }
    }

    /// The underlying guide collection.
    pub fn collection(&self) -> Arc<Collection<Guide>> {
        Arc::clone(&self.guides)
    }

    fn emit(&self, id: Uuid, from: &str, to: &str, reason: Option<&str>) {
        let mut event = TransitionEvent::new(EntityKind::Guide, id, from, to);
        if let Some(reason) = reason {
            event = event.with_reason(reason);
        }
        self.sink.notify(&event);
    }

    // =========================================================================
    // ACCOUNT AXIS
    // =========================================================================

    /// Register an account in `unverified`.
    pub fn register(&self, input: NewGuide) -> CoreResult<Guide> {
        input.validate()?;

        let now = Utc::now();
        let guide = Guide {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            email: input.email.trim().to_string(),
            status: GuideStatus::Unverified,
            profile_completed: false,
            profile_approved: false,
            profile_rejection_reason: None,
            deletion_requested: false,
            deletion_reason: None,
            deletion_request_date: None,
            created_at: now,
            updated_at: now,
        };

        self.guides.insert(guide.id, guide.clone())?;
        self.emit(guide.id, "new", GuideStatus::Unverified.as_str(), None);
        Ok(guide)
    }

    /// Enter the admin review queue: `unverified → pending`.
    pub fn submit_for_review(&self, guide_id: Uuid) -> CoreResult<Guide> {
        let mut from = GuideStatus::Unverified;
        let guide = self.guides.update(guide_id, |guide| {
            from = guide.status;
            guide.status = SUBMIT_FOR_REVIEW.apply(ENTITY, guide_id, guide.status)?;
            guide.updated_at = Utc::now();
            Ok(())
        })?;
        self.emit(guide_id, from.as_str(), guide.status.as_str(), None);
        Ok(guide)
    }

    /// Admin approval of the account.
    pub fn approve_account(&self, guide_id: Uuid) -> CoreResult<Guide> {
        let mut from = GuideStatus::Pending;
        let guide = self.guides.update(guide_id, |guide| {
            from = guide.status;
            guide.status = APPROVE_ACCOUNT.apply(ENTITY, guide_id, guide.status)?;
            guide.updated_at = Utc::now();
            Ok(())
        })?;
        self.emit(guide_id, from.as_str(), guide.status.as_str(), None);
        Ok(guide)
    }

    /// Admin rejection of the account. The reason travels in the event; the
    /// record keeps no account-level reason field.
    pub fn reject_account(&self, guide_id: Uuid, reason: &str) -> CoreResult<Guide> {
        let reason = non_empty(reason, "rejection reason")?;
        let mut from = GuideStatus::Pending;
        let guide = self.guides.update(guide_id, |guide| {
            from = guide.status;
            guide.status = REJECT_ACCOUNT.apply(ENTITY, guide_id, guide.status)?;
            guide.updated_at = Utc::now();
            Ok(())
        })?;
        self.emit(guide_id, from.as_str(), guide.status.as_str(), Some(&reason));
        Ok(guide)
    }

    // =========================================================================
    // PROFILE AXIS (independent of account status)
    // =========================================================================

    /// Mark the profile filled in. Any completion re-enters review: the
    /// previous approval and rejection reason are reset.
    pub fn complete_profile(&self, guide_id: Uuid) -> CoreResult<Guide> {
        let guide = self.guides.update(guide_id, |guide| {
            guide.profile_completed = true;
            guide.profile_approved = false;
            guide.profile_rejection_reason = None;
            guide.updated_at = Utc::now();
            Ok(())
        })?;
        self.emit(guide_id, "profile_incomplete", "profile_pending", None);
        Ok(guide)
    }

    /// Admin approval of the profile. Clears any stored rejection reason.
    pub fn approve_profile(&self, guide_id: Uuid) -> CoreResult<Guide> {
        let guide = self.guides.update(guide_id, |guide| {
            if !guide.profile_completed {
                return Err(CoreError::InvalidTransition {
                    entity: ENTITY,
                    id: guide_id,
                    current: "profile_incomplete",
                    attempted: "approve_profile",
                });
            }
            guide.profile_approved = true;
            guide.profile_rejection_reason = None;
            guide.updated_at = Utc::now();
            Ok(())
        })?;
        self.emit(guide_id, "profile_pending", "profile_approved", None);
        Ok(guide)
    }

    /// Admin rejection of the profile, reason recorded on the record.
    pub fn reject_profile(&self, guide_id: Uuid, reason: &str) -> CoreResult<Guide> {
        let reason = non_empty(reason, "profile rejection reason")?;
        let guide = self.guides.update(guide_id, |guide| {
            if !guide.profile_completed {
                return Err(CoreError::InvalidTransition {
                    entity: ENTITY,
                    id: guide_id,
                    current: "profile_incomplete",
                    attempted: "reject_profile",
                });
            }
            guide.profile_approved = false;
            guide.profile_rejection_reason = Some(reason.clone());
            guide.updated_at = Utc::now();
            Ok(())
        })?;
        self.emit(
            guide_id,
            "profile_pending",
            "profile_rejected",
            Some(&reason),
        );
        Ok(guide)
    }

    // =========================================================================
    // TWO-PHASE DELETION (no account-status precondition)
    // =========================================================================

    /// Guide requests account deletion. Works from any account status;
    /// re-requesting overwrites the outstanding reason and timestamp
    /// ([`DELETION_REPEAT`] = [`RepeatPolicy::Overwrite`]).
    pub fn request_deletion(&self, guide_id: Uuid, reason: &str) -> CoreResult<Guide> {
        let reason = non_empty(reason, "deletion reason")?;
        let mut from = DeletionState::Active;
        let guide = self.guides.update(guide_id, |guide| {
            from = guide.deletion_state();
            REQUEST_DELETION.admit(ENTITY, guide_id, from)?;
            guide.deletion_requested = true;
            guide.deletion_reason = Some(reason.clone());
            guide.deletion_request_date = Some(Utc::now());
            guide.updated_at = Utc::now();
            Ok(())
        })?;
        self.emit(
            guide_id,
            from.state_name(),
            DeletionState::Requested.state_name(),
            Some(&reason),
        );
        Ok(guide)
    }

    /// Guide withdraws the deletion request; all three deletion fields are
    /// cleared atomically.
    pub fn cancel_deletion(&self, guide_id: Uuid) -> CoreResult<Guide> {
        self.clear_deletion(guide_id, &CANCEL_DELETION, None)
    }

    /// Admin refuses the deletion request. The reason is communicated to
    /// the guide via the event; the deletion fields are cleared.
    pub fn reject_deletion(&self, guide_id: Uuid, reason: &str) -> CoreResult<Guide> {
        let reason = non_empty(reason, "deletion rejection reason")?;
        self.clear_deletion(guide_id, &REJECT_DELETION, Some(reason))
    }

    fn clear_deletion(
        &self,
        guide_id: Uuid,
        rule: &TransitionRule<DeletionState>,
        reason: Option<String>,
    ) -> CoreResult<Guide> {
        let guide = self.guides.update(guide_id, |guide| {
            rule.admit(ENTITY, guide_id, guide.deletion_state())?;
            guide.deletion_requested = false;
            guide.deletion_reason = None;
            guide.deletion_request_date = None;
            guide.updated_at = Utc::now();
            Ok(())
        })?;
        self.emit(
            guide_id,
            DeletionState::Requested.state_name(),
            DeletionState::Active.state_name(),
            reason.as_deref(),
        );
        Ok(guide)
    }

    /// Admin confirms the deletion request: the account is removed
    /// permanently.
    pub fn confirm_deletion(&self, guide_id: Uuid) -> CoreResult<()> {
        let outcome = self.guides.resolve(guide_id, |guide| {
            CONFIRM_DELETION.admit(ENTITY, guide_id, guide.deletion_state())?;
            Ok(Resolution::Remove)
        })?;
        if let Outcome::Removed(_) = outcome {
            self.emit(
                guide_id,
                DeletionState::Requested.state_name(),
                "deleted",
                None,
            );
        }
        Ok(())
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Read one guide.
    pub fn get(&self, guide_id: Uuid) -> CoreResult<Guide> {
        self.guides.get(guide_id)
    }

    /// Admin queue: accounts awaiting review.
    pub fn pending_accounts(&self) -> CoreResult<Vec<Guide>> {
        self.guides.filter(|g| g.status == GuideStatus::Pending)
    }

    /// Admin queue: accounts with an outstanding deletion request.
    pub fn deletion_requests(&self) -> CoreResult<Vec<Guide>> {
        self.guides.filter(|g| g.deletion_requested)
    }

    /// Admin queue: completed profiles awaiting a verdict.
    pub fn pending_profiles(&self) -> CoreResult<Vec<Guide>> {
        self.guides
            .filter(|g| g.profile_completed && !g.profile_approved && g.profile_rejection_reason.is_none())
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
