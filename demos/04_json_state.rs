/// json state - export the engine, store it, bring it back
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rental_booking_rs::{
    BookingState, DeferredDocuments, EngineConfig, EngineState, Money, NewBooking, PaymentMethod,
    PaymentRequest, RentalEngine, RentalPeriod, SafeTimeProvider, TimeSource, TransitionPayload,
    Uuid, Vehicle,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    println!("=== json state ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap(),
    ));

    // configuration is plain json too
    let config = EngineConfig::from_json(&serde_json::to_string(&EngineConfig::strict())?)?;
    let engine = RentalEngine::new(config.clone(), Arc::new(DeferredDocuments::new()))?;

    let car = engine.add_vehicle(Vehicle::new("12345-A-6", "Dacia Logan", Money::from_major(300)))?;
    let period = RentalPeriod::new(
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    )?;
    let booking = engine.create_booking(
        NewBooking::new(Uuid::new_v4(), car, period, Money::from_major(300)),
        &time,
    )?;
    engine.transition(booking.id, BookingState::Validated, TransitionPayload::None, &time)?;
    engine.record_payment(
        PaymentRequest::new(booking.id, Money::from_major(500), period.start(), PaymentMethod::Check)
            .with_check("0042317", "CIH"),
        &time,
    )?;

    let json = serde_json::to_string_pretty(&engine.export_state())?;
    println!("{}\n", json);

    let state: EngineState = serde_json::from_str(&json)?;
    let restored = RentalEngine::from_state(config, Arc::new(DeferredDocuments::new()), state)?;
    let totals = restored.get_totals(booking.id)?;
    println!("restored {}: paid {} remaining {}", booking.reference, totals.paid, totals.remaining);

    Ok(())
}
