//! Promotion records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::transition::StateName;

/// Review status of a promotion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Awaiting admin scheduling; occupies a slot
    Pending,
    /// Scheduled; occupies a slot until its end date passes
    Approved,
    /// Declined; the slot is released immediately
    Rejected,
}

impl RequestStatus {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl StateName for RequestStatus {
    fn state_name(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A purchasable promotion placement with a fixed slot capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionType {
    pub id: Uuid,
    pub name: String,
    /// Cost per day of promotion (minor currency units)
    pub daily_cost: u64,
    /// Capacity ceiling for concurrently active requests. Immutable.
    pub slots: u32,
    /// Inactive types accept no new reservations
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A guide's request to promote one tour in one promotion type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionRequest {
    pub id: Uuid,
    pub guide_id: Uuid,
    pub tour_id: Uuid,
    pub promotion_type_id: Uuid,
    /// Requested promotion length in days
    pub duration_days: u32,
    /// `daily_cost × duration_days`, fixed at reservation time
    pub total_cost: u64,
    pub status: RequestStatus,
    /// Set iff `status == approved`
    pub start_date: Option<NaiveDate>,
    /// Set iff `status == approved`
    pub end_date: Option<NaiveDate>,
    /// Set iff `status == rejected`
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PromotionRequest {
    /// Whether this request occupies a slot on `today`.
    ///
    /// Active means not rejected and not expired. Pending requests have no
    /// end date yet and always occupy a slot.
    pub fn is_active(&self, today: NaiveDate) -> bool {
        match self.status {
            RequestStatus::Rejected => false,
            RequestStatus::Pending | RequestStatus::Approved => {
                self.end_date.map_or(true, |end| end > today)
            }
        }
    }
}

/// Proof that a slot was reserved: the created request record.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    /// The pending request now occupying a slot
    pub request: PromotionRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(status: RequestStatus, end_date: Option<NaiveDate>) -> PromotionRequest {
        let now = Utc::now();
        PromotionRequest {
            id: Uuid::new_v4(),
            guide_id: Uuid::new_v4(),
            tour_id: Uuid::new_v4(),
            promotion_type_id: Uuid::new_v4(),
            duration_days: 7,
            total_cost: 7_000,
            status,
            start_date: None,
            end_date,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_pending_request_is_active() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert!(request(RequestStatus::Pending, None).is_active(today));
    }

    #[test]
    fn test_rejected_request_is_never_active() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert!(!request(RequestStatus::Rejected, None).is_active(today));
    }

    #[test]
    fn test_approved_request_expires_by_end_date() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let future = NaiveDate::from_ymd_opt(2026, 9, 6).unwrap();
        let past = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();

        assert!(request(RequestStatus::Approved, Some(future)).is_active(today));
        assert!(!request(RequestStatus::Approved, Some(past)).is_active(today));
        // An end date of exactly today no longer occupies a slot.
        assert!(!request(RequestStatus::Approved, Some(today)).is_active(today));
    }
}
