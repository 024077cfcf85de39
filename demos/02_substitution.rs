/// substitution - replace a broken-down car mid-contract
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rental_booking_rs::{
    BookingState, DeferredDocuments, EngineConfig, FuelLevel, HandoverKind, HandoverRecord, Money,
    NewBooking, PaymentMethod, PaymentRequest, RentalEngine, RentalPeriod, SafeTimeProvider,
    SubstitutionReason, SubstitutionRequest, TimeSource, TransitionPayload, Uuid, Vehicle,
    VehicleStatus,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    println!("=== vehicle substitution ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap(),
    ));
    let engine = RentalEngine::new(EngineConfig::standard(), Arc::new(DeferredDocuments::new()))?;
    let logan = engine.add_vehicle(Vehicle::new("12345-A-6", "Dacia Logan", Money::from_major(300)))?;
    let duster = engine.add_vehicle(Vehicle::new("67890-B-6", "Dacia Duster", Money::from_major(350)))?;

    let period = RentalPeriod::new(
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    )?;
    let booking = engine.create_booking(
        NewBooking::new(Uuid::new_v4(), logan, period, Money::from_major(300))
            .with_surcharge(Money::from_major(50))
            .with_discount(Money::from_major(20)),
        &time,
    )?;
    engine.transition(booking.id, BookingState::Validated, TransitionPayload::None, &time)?;
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
    let receipt = engine.record_payment(
        PaymentRequest::new(booking.id, Money::from_major(1000), period.start(), PaymentMethod::Card),
        &time,
    )?;
    println!("before: total {} paid {} remaining {}",
        receipt.totals.total, receipt.totals.paid, receipt.totals.remaining);

    let booking = engine.substitute_vehicle(
        SubstitutionRequest {
            booking_id: booking.id,
            new_vehicle_id: duster,
            reason: SubstitutionReason::Breakdown,
            new_daily_rate: Money::from_major(350),
            note: Some("warning light on the motorway".to_string()),
        },
        &time,
    )?;
    println!("after:  total {} paid {} remaining {}",
        booking.totals.total, booking.totals.paid, booking.totals.remaining);

    // the broken car goes to the workshop
    engine.set_vehicle_status(logan, VehicleStatus::BrokenDown, &time)?;
    println!("\nlogan: {}", engine.vehicle(logan)?.status);
    println!("duster: {}", engine.vehicle(duster)?.status);

    for record in engine.substitutions(booking.id)? {
        println!("\n{:?} at {}: {} -> {} ({:?})",
            record.reason, record.timestamp, record.old_daily_rate, record.new_daily_rate, record.note);
    }

    Ok(())
}
