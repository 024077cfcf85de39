/// contract lifecycle - from reservation to close, deposit included
use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use rental_booking_rs::{
    BookingState, DeferredDocuments, DepositStatus, EngineConfig, FuelLevel, HandoverKind,
    HandoverRecord, Money, NewBooking, RentalEngine, RentalPeriod, SafeTimeProvider, TimeSource,
    TransitionPayload, Uuid, Vehicle,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    println!("=== contract lifecycle ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();
    let documents = Arc::new(DeferredDocuments::new());
    let engine = RentalEngine::new(EngineConfig::standard(), documents.clone())?;

    let car = engine.add_vehicle(Vehicle::new("12345-A-6", "Dacia Logan", Money::from_major(300)))?;
    let period = RentalPeriod::new(
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    )?;
    let booking = engine.create_booking(
        NewBooking::new(Uuid::new_v4(), car, period, Money::from_major(300))
            .with_deposit(Money::from_major(2000))
            .with_locations("airport", "agency"),
        &time,
    )?;

    // 1. reservation
    println!("1. reservation");
    println!("--------------");
    println!("  reference: {}", booking.reference);
    println!("  state: {}", booking.state);
    println!("  total: {}", booking.totals.total);

    // 2. contract
    println!("\n2. contract");
    println!("-----------");
    let booking = engine.transition(booking.id, BookingState::Validated, TransitionPayload::None, &time)?;
    println!("  state: {}", booking.state);
    println!("  documents requested: {:?}", documents.requested());

    // 3. delivery
    controller.advance(Duration::days(5));
    println!("\n3. delivery on {}", time.now().format("%Y-%m-%d"));
    println!("--------------------------");
    engine.transition(
        booking.id,
        BookingState::Delivered,
        TransitionPayload::Delivery(HandoverRecord {
            kind: HandoverKind::HandedByAgency,
            at: time.now(),
            mileage_km: 42_000,
            fuel_level: FuelLevel::Full,
        }),
        &time,
    )?;
    println!("  vehicle status: {}", engine.vehicle(car)?.status);

    // a late return is billed by extending first
    controller.advance(Duration::days(6));
    let booking = engine.extend(booking.id, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(), &time)?;
    println!("\n  extended to {}: total {}", booking.period.end(), booking.totals.total);

    // 4. return
    println!("\n4. return on {}", time.now().format("%Y-%m-%d"));
    println!("------------------------");
    engine.transition(
        booking.id,
        BookingState::Returned,
        TransitionPayload::Return(HandoverRecord {
            kind: HandoverKind::AtAgency,
            at: time.now(),
            mileage_km: 42_780,
            fuel_level: FuelLevel::ThreeQuarters,
        }),
        &time,
    )?;
    println!("  vehicle status: {}", engine.vehicle(car)?.status);

    // 5. deposit, then close
    println!("\n5. close");
    println!("--------");
    engine.settle_deposit(booking.id, DepositStatus::Refunded, &time)?;
    let booking = engine.transition(booking.id, BookingState::Closed, TransitionPayload::None, &time)?;
    println!("  state: {}", booking.state);
    println!("  vehicle status: {}", engine.vehicle(car)?.status);

    println!("\nevents:");
    for event in engine.take_events() {
        println!("  {:?}", event);
    }

    Ok(())
}
