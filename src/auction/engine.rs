//! Bid acceptance over the shared tour collection.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::{CoreError, CoreResult};
use crate::notify::{EntityKind, NotificationSink, TransitionEvent};
use crate::store::Collection;
use crate::tour::Tour;

/// Receipt for an accepted bid.
#[derive(Debug, Clone, PartialEq)]
pub struct BidAccepted {
    pub tour_id: Uuid,
    pub bidder_id: Uuid,
    /// The newly recorded high bid
    pub amount: u64,
    /// High bid this one displaced; 0 if it was the first
    pub previous_highest: u64,
}

/// Read-side snapshot of one auction.
#[derive(Debug, Clone, PartialEq)]
pub struct BidStanding {
    pub tour_id: Uuid,
    pub starting_price: u64,
    /// 0 until the first bid lands
    pub current_highest_bid: u64,
    pub highest_bidder_id: Option<Uuid>,
    pub bid_end_date: DateTime<Utc>,
    /// Whether bids are still being accepted
    pub open: bool,
}

/// Accepts bids on bid-type tours.
///
/// Operates on the same collection as [`crate::tour::TourLifecycle`], so a
/// bid landing and a lifecycle transition on the same tour serialize on the
/// collection's write lock.
pub struct AuctionEngine {
    tours: Arc<Collection<Tour>>,
    sink: Arc<dyn NotificationSink>,
}

impl AuctionEngine {
    /// Create an engine over the lifecycle's tour collection.
    pub fn new(tours: Arc<Collection<Tour>>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { tours, sink }
    }

    /// Place a bid.
    ///
    /// Accepted iff the tour is a bid tour, the deadline has not passed,
    /// and `amount` strictly exceeds the amount to beat (the current high
    /// bid, or the starting price before any bid lands). Ties lose: of two
    /// equal bids racing, whichever commits first wins and the other fails
    /// [`CoreError::BidTooLow`].
    pub fn place_bid(&self, tour_id: Uuid, bidder_id: Uuid, amount: u64) -> CoreResult<BidAccepted> {
        let now = Utc::now();
        let mut previous_highest = 0;

        self.tours.update(tour_id, |tour| {
            let details = tour.bid_details.as_mut().ok_or_else(|| {
                CoreError::Validation("tour does not accept bids".into())
            })?;
            if !details.is_open(now) {
                return Err(CoreError::BiddingClosed);
            }
            let to_beat = details.winning_amount();
            if amount <= to_beat {
                return Err(CoreError::BidTooLow {
                    offered: amount,
                    current: to_beat,
                });
            }
            previous_highest = details.current_highest_bid;
            details.current_highest_bid = amount;
            details.highest_bidder_id = Some(bidder_id);
            tour.updated_at = now;
            Ok(())
        })?;

        let event = TransitionEvent::new(
            EntityKind::Tour,
            tour_id,
            &format!("bid_{previous_highest}"),
            &format!("bid_{amount}"),
        )
        .with_reason(format!("bid placed by {bidder_id}"));
        self.sink.notify(&event);

        Ok(BidAccepted {
            tour_id,
            bidder_id,
            amount,
            previous_highest,
        })
    }

    /// Current standing of one auction.
    pub fn standing(&self, tour_id: Uuid) -> CoreResult<BidStanding> {
        let tour = self.tours.get(tour_id)?;
        let details = tour
            .bid_details
            .ok_or_else(|| CoreError::Validation("tour does not accept bids".into()))?;
        Ok(BidStanding {
            tour_id,
            starting_price: details.starting_price,
            current_highest_bid: details.current_highest_bid,
            highest_bidder_id: details.highest_bidder_id,
            bid_end_date: details.bid_end_date,
            open: details.is_open(Utc::now()),
        })
    }
}
