//! Guide account records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::{CoreError, CoreResult};
use crate::transition::StateName;

/// Account review status of a guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuideStatus {
    /// Registered, not yet submitted for review
    Unverified,
    /// Awaiting admin review
    Pending,
    /// Cleared to operate
    Approved,
    /// Declined by admin
    Rejected,
}

impl GuideStatus {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            GuideStatus::Unverified => "unverified",
            GuideStatus::Pending => "pending",
            GuideStatus::Approved => "approved",
            GuideStatus::Rejected => "rejected",
        }
    }
}

impl StateName for GuideStatus {
    fn state_name(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for GuideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deletion axis of a guide account, derived from the record's deletion
/// fields. Orthogonal to [`GuideStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionState {
    /// No deletion request outstanding
    Active,
    /// Deletion requested, awaiting admin confirmation
    Requested,
}

impl StateName for DeletionState {
    fn state_name(&self) -> &'static str {
        match self {
            DeletionState::Active => "active",
            DeletionState::Requested => "deletion_requested",
        }
    }
}

/// A guide account record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub status: GuideStatus,
    /// Whether the guide has filled in their public profile
    pub profile_completed: bool,
    /// Profile review verdict; independent of `status`
    pub profile_approved: bool,
    /// Set iff the profile was rejected; cleared on approval
    pub profile_rejection_reason: Option<String>,
    /// Deletion request outstanding. Implies `deletion_reason` and
    /// `deletion_request_date` are set.
    pub deletion_requested: bool,
    pub deletion_reason: Option<String>,
    pub deletion_request_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guide {
    /// Current deletion axis of this account.
    pub fn deletion_state(&self) -> DeletionState {
        if self.deletion_requested {
            DeletionState::Requested
        } else {
            DeletionState::Active
        }
    }
}

/// Input for registering a guide account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGuide {
    pub name: String,
    pub email: String,
}

impl NewGuide {
    /// Validate required fields before the record is created.
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("guide name is required".into()));
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(CoreError::Validation("a valid email is required".into()));
        }
        Ok(())
    }
}
