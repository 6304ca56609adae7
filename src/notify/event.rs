//! Lifecycle transition events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of entity a transition event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A tour listing
    Tour,
    /// A guide account
    Guide,
    /// A promotion slot request
    PromotionRequest,
}

impl EntityKind {
    /// Stable lowercase name used in events and errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Tour => "tour",
            EntityKind::Guide => "guide",
            EntityKind::PromotionRequest => "promotion_request",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One successful state transition, as reported to the notification sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    /// Entity kind
    pub entity: EntityKind,
    /// Entity id
    pub entity_id: Uuid,
    /// State before the transition
    pub from: String,
    /// State after the transition (`"deleted"` for removals)
    pub to: String,
    /// Operator-supplied reason, when the transition carries one
    pub reason: Option<String>,
    /// When the transition committed
    pub occurred_at: DateTime<Utc>,
}

impl TransitionEvent {
    /// Build an event for a transition that just committed.
    pub fn new(entity: EntityKind, entity_id: Uuid, from: &str, to: &str) -> Self {
        Self {
            entity,
            entity_id,
            from: from.to_string(),
            to: to.to_string(),
            reason: None,
            occurred_at: Utc::now(),
        }
    }

    /// Attach the operator-supplied reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// SCREAMING_CASE wire name, e.g. `TOUR_PENDING_TO_APPROVED`.
    pub fn wire_name(&self) -> String {
        format!(
            "{}_{}_TO_{}",
            self.entity.as_str().to_uppercase(),
            self.from.to_uppercase(),
            self.to.to_uppercase()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_name_format() {
        let event = TransitionEvent::new(EntityKind::Tour, Uuid::new_v4(), "pending", "approved");
        assert_eq!(event.wire_name(), "TOUR_PENDING_TO_APPROVED");
    }

    #[test]
    fn test_event_serializes_to_json() {
        let event = TransitionEvent::new(EntityKind::Guide, Uuid::new_v4(), "pending", "rejected")
            .with_reason("incomplete documents");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["entity"], "guide");
        assert_eq!(json["from"], "pending");
        assert_eq!(json["to"], "rejected");
        assert_eq!(json["reason"], "incomplete documents");
    }

    #[test]
    fn test_entity_kind_names() {
        assert_eq!(EntityKind::Tour.as_str(), "tour");
        assert_eq!(EntityKind::Guide.as_str(), "guide");
        assert_eq!(EntityKind::PromotionRequest.as_str(), "promotion_request");
    }
}
