//! Property tests over random booking activity.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rental_booking_rs::{
    BookingState, DeferredDocuments, EngineConfig, Money, NewBooking, RentalEngine, RentalPeriod,
    SafeTimeProvider, TimeSource, TransitionPayload, Uuid, Vehicle,
};

#[derive(Debug, Clone)]
enum Action {
    Create { vehicle: usize, from: u32, days: u32 },
    Validate { pick: usize },
    Cancel { pick: usize },
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0usize..3, 1u32..25, 0u32..6).prop_map(|(vehicle, from, days)| Action::Create { vehicle, from, days }),
        any::<usize>().prop_map(|pick| Action::Validate { pick }),
        any::<usize>().prop_map(|pick| Action::Cancel { pick }),
    ]
}

fn period(from: u32, days: u32) -> RentalPeriod {
    RentalPeriod::new(
        NaiveDate::from_ymd_opt(2024, 3, from).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, from + days).unwrap(),
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// occupying bookings of one vehicle never overlap, whatever the order of
    /// creations, validations and cancellations
    #[test]
    fn prop_occupying_bookings_never_overlap(
        actions in prop::collection::vec(action_strategy(), 1..40),
        drafts_claim in any::<bool>(),
    ) {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap(),
        ));
        let mut config = EngineConfig::standard();
        config.policies.drafts_claim_vehicle = drafts_claim;
        let engine = RentalEngine::new(config, Arc::new(DeferredDocuments::new())).unwrap();
        let fleet: Vec<_> = (0..3)
            .map(|i| {
                engine
                    .add_vehicle(Vehicle::new(format!("V-{i}"), "Logan", Money::from_major(300)))
                    .unwrap()
            })
            .collect();
        let mut created = Vec::new();

        for action in actions {
            match action {
                Action::Create { vehicle, from, days } => {
                    let request = NewBooking::new(Uuid::new_v4(), fleet[vehicle], period(from, days), Money::from_major(300));
                    if let Ok(booking) = engine.create_booking(request, &time) {
                        created.push(booking.id);
                    }
                }
                Action::Validate { pick } if !created.is_empty() => {
                    let id = created[pick % created.len()];
                    let _ = engine.transition(id, BookingState::Validated, TransitionPayload::None, &time);
                }
                Action::Cancel { pick } if !created.is_empty() => {
                    let id = created[pick % created.len()];
                    let _ = engine.transition(id, BookingState::Cancelled, TransitionPayload::Cancellation { reason: None }, &time);
                }
                _ => {}
            }
        }

        for vehicle_id in &fleet {
            let held: Vec<_> = engine
                .bookings_for_vehicle(*vehicle_id)
                .into_iter()
                .filter(|b| b.state.is_occupying())
                .collect();
            for (i, a) in held.iter().enumerate() {
                for b in &held[i + 1..] {
                    prop_assert!(!a.period.overlaps(&b.period));
                }
            }
        }
    }
}
