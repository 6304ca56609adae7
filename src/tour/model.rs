//! Tour records and input shapes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::{CoreError, CoreResult};
use crate::transition::StateName;

/// Review status of a tour listing.
///
/// `deleted` is terminal and has no variant: a deleted tour is a removed
/// record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourStatus {
    /// Awaiting admin review
    Pending,
    /// Publicly listed
    Approved,
    /// Declined by admin; reason stored on the tour
    Rejected,
    /// Approved tour awaiting admin confirmation of deletion
    PendingDeletion,
}

impl TourStatus {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TourStatus::Pending => "pending",
            TourStatus::Approved => "approved",
            TourStatus::Rejected => "rejected",
            TourStatus::PendingDeletion => "pending_deletion",
        }
    }
}

impl StateName for TourStatus {
    fn state_name(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for TourStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pricing model of a tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourType {
    /// Fixed-price listing
    Standard,
    /// Auctioned listing; customers bid until the deadline
    Bid,
}

/// Auction state carried by bid-type tours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidDetails {
    /// Minimum acceptable first bid (minor currency units)
    pub starting_price: u64,
    /// Highest accepted bid so far; 0 until the first bid lands
    pub current_highest_bid: u64,
    /// Bidder currently winning, if any
    pub highest_bidder_id: Option<Uuid>,
    /// Bids are accepted until this instant (inclusive)
    pub bid_end_date: DateTime<Utc>,
}

impl BidDetails {
    /// The amount a new bid must strictly exceed.
    pub fn winning_amount(&self) -> u64 {
        self.current_highest_bid.max(self.starting_price)
    }

    /// Whether the auction is still accepting bids at `now`.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        now <= self.bid_end_date
    }
}

/// A time-boxed percentage discount on an approved listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Percentage off, strictly between 0 and 100
    pub discount_percentage: u8,
    /// First day the discount applies
    pub start_date: NaiveDate,
    /// Last day the discount applies
    pub end_date: NaiveDate,
    /// Whether the offer is currently switched on
    pub is_active: bool,
}

/// A tour listing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    pub id: Uuid,
    /// Owning guide
    pub guide_id: Uuid,
    pub title: String,
    pub description: String,
    /// Fixed price for standard tours (minor currency units)
    pub price: u64,
    /// Stored image paths; at least one is required at submission
    pub images: Vec<String>,
    pub status: TourStatus,
    /// Mirrors `status == approved` for read-side listing queries
    pub is_active: bool,
    /// Set iff `status == rejected`
    pub rejection_reason: Option<String>,
    pub tour_type: TourType,
    /// Present iff `tour_type == bid`
    pub bid_details: Option<BidDetails>,
    pub offer: Option<Offer>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Auction parameters supplied at submission for bid-type tours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBid {
    /// Minimum acceptable first bid
    pub starting_price: u64,
    /// Deadline after which bids are rejected
    pub bid_end_date: DateTime<Utc>,
}

/// Input for creating a tour listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTour {
    pub guide_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: u64,
    pub images: Vec<String>,
    pub tour_type: TourType,
    /// Required for bid tours, forbidden for standard tours
    pub bid: Option<NewBid>,
}

impl NewTour {
    /// Validate required fields before any record is created.
    pub fn validate(&self) -> CoreResult<()> {
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("tour title is required".into()));
        }
        if self.description.trim().is_empty() {
            return Err(CoreError::Validation("tour description is required".into()));
        }
        if self.images.is_empty() {
            return Err(CoreError::Validation(
                "at least one tour image is required".into(),
            ));
        }
        match (self.tour_type, &self.bid) {
            (TourType::Bid, None) => Err(CoreError::Validation(
                "bid tours require starting price and bid end date".into(),
            )),
            (TourType::Bid, Some(bid)) if bid.starting_price == 0 => Err(CoreError::Validation(
                "starting price must be greater than zero".into(),
            )),
            (TourType::Standard, Some(_)) => Err(CoreError::Validation(
                "standard tours cannot carry bid details".into(),
            )),
            (TourType::Standard, None) if self.price == 0 => Err(CoreError::Validation(
                "tour price must be greater than zero".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// Content patch applied by the owning guide.
///
/// Fields overwrite; images append. Applying any patch forces the listing
/// back to `pending` review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TourPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<u64>,
    #[serde(default)]
    pub append_images: Vec<String>,
}

/// Input for setting a discount offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferSpec {
    pub discount_percentage: u8,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl OfferSpec {
    /// Validate the discount window and percentage.
    pub fn validate(&self) -> CoreResult<()> {
        if self.discount_percentage == 0 || self.discount_percentage >= 100 {
            return Err(CoreError::Validation(
                "discount percentage must be between 1 and 99".into(),
            ));
        }
        if self.end_date <= self.start_date {
            return Err(CoreError::Validation(
                "offer end date must be after the start date".into(),
            ));
        }
        Ok(())
    }
}
