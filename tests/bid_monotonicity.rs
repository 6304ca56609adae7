//! Bid Monotonicity Tests
//!
//! The recorded high bid only ever increases: a bid commits iff it strictly
//! exceeds the amount to beat at the instant its write lands. Under a storm
//! of concurrent bids the final high bid equals the largest accepted one.

use std::sync::Arc;
use std::thread;

use chrono::{Duration, Utc};
use uuid::Uuid;

use tourflow::auction::AuctionEngine;
use tourflow::errors::CoreError;
use tourflow::notify::NullSink;
use tourflow::tour::{NewBid, NewTour, TourLifecycle, TourType};

fn auction_fixture(starting_price: u64) -> (AuctionEngine, Uuid) {
    let sink = Arc::new(NullSink);
    let lifecycle = TourLifecycle::new(sink.clone());
    let tour = lifecycle
        .submit(NewTour {
            guide_id: Uuid::new_v4(),
            title: "Glacier hike for two".into(),
            description: "Full-day guided crossing with gear included".into(),
            price: 0,
            images: vec!["tours/glacier/cover.jpg".into()],
            tour_type: TourType::Bid,
            bid: Some(NewBid {
                starting_price,
                bid_end_date: Utc::now() + Duration::days(3),
            }),
        })
        .unwrap();
    (AuctionEngine::new(lifecycle.collection(), sink), tour.id)
}

// =============================================================================
// CONCURRENT BIDDING
// =============================================================================

/// A storm of distinct concurrent bids: the final high bid is the maximum
/// of the accepted ones, and every accepted bid displaced a strictly lower
/// amount.
#[test]
fn test_bid_storm_resolves_to_maximum() {
    let (engine, tour_id) = auction_fixture(1_000);
    let engine = Arc::new(engine);

    let mut handles = vec![];
    for i in 1..=16u64 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            engine.place_bid(tour_id, Uuid::new_v4(), 1_000 + i * 100)
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let accepted: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert!(!accepted.is_empty());

    // Every accepted bid strictly beat the amount it displaced.
    for bid in &accepted {
        assert!(bid.amount > bid.previous_highest);
    }

    // The highest submitted bid always lands, whatever the interleaving.
    let standing = engine.standing(tour_id).unwrap();
    assert_eq!(standing.current_highest_bid, 1_000 + 16 * 100);
    assert_eq!(
        standing.current_highest_bid,
        accepted.iter().map(|b| b.amount).max().unwrap()
    );
}

/// Two equal bids racing for the same auction: exactly one is accepted.
#[test]
fn test_equal_concurrent_bids_single_winner() {
    let (engine, tour_id) = auction_fixture(1_000);
    let engine = Arc::new(engine);

    let mut handles = vec![];
    for _ in 0..6 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            engine.place_bid(tour_id, Uuid::new_v4(), 5_000)
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for loser in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(loser, Err(CoreError::BidTooLow { .. })));
    }

    let standing = engine.standing(tour_id).unwrap();
    assert_eq!(standing.current_highest_bid, 5_000);
    assert!(standing.highest_bidder_id.is_some());
}

// =============================================================================
// SEQUENTIAL RULES
// =============================================================================

/// The first bid must strictly exceed the starting price; later bids must
/// strictly exceed the standing high bid.
#[test]
fn test_strictly_increasing_sequence() {
    let (engine, tour_id) = auction_fixture(10_000);

    assert!(matches!(
        engine.place_bid(tour_id, Uuid::new_v4(), 9_000),
        Err(CoreError::BidTooLow { current: 10_000, .. })
    ));
    engine.place_bid(tour_id, Uuid::new_v4(), 10_500).unwrap();
    assert!(matches!(
        engine.place_bid(tour_id, Uuid::new_v4(), 10_500),
        Err(CoreError::BidTooLow { current: 10_500, .. })
    ));
    engine.place_bid(tour_id, Uuid::new_v4(), 11_000).unwrap();

    assert_eq!(engine.standing(tour_id).unwrap().current_highest_bid, 11_000);
}

/// No bid lands after the deadline, however high.
#[test]
fn test_deadline_closes_the_auction() {
    let sink = Arc::new(NullSink);
    let lifecycle = TourLifecycle::new(sink.clone());
    let tour = lifecycle
        .submit(NewTour {
            guide_id: Uuid::new_v4(),
            title: "Sunset sailing".into(),
            description: "Three hours on a vintage ketch".into(),
            price: 0,
            images: vec!["tours/sailing/cover.jpg".into()],
            tour_type: TourType::Bid,
            bid: Some(NewBid {
                starting_price: 2_000,
                bid_end_date: Utc::now() - Duration::minutes(1),
            }),
        })
        .unwrap();
    let engine = AuctionEngine::new(lifecycle.collection(), sink);

    assert_eq!(
        engine.place_bid(tour.id, Uuid::new_v4(), 1_000_000).unwrap_err(),
        CoreError::BiddingClosed
    );
    let standing = engine.standing(tour.id).unwrap();
    assert!(!standing.open);
    assert_eq!(standing.current_highest_bid, 0);
}
