/// quick start - book a car, validate the contract and take a payment
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rental_booking_rs::{
    BookingState, DeferredDocuments, EngineConfig, Money, NewBooking, PaymentMethod, PaymentRequest,
    RentalEngine, RentalPeriod, SafeTimeProvider, TimeSource, TransitionPayload, Uuid, Vehicle,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap(),
    ));
    let engine = RentalEngine::new(EngineConfig::standard(), Arc::new(DeferredDocuments::new()))?;

    // one car in the fleet
    let car = engine.add_vehicle(
        Vehicle::new("12345-A-6", "Dacia Logan", Money::from_major(300)).with_category("B"),
    )?;

    // five days in january
    let period = RentalPeriod::new(
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    )?;
    println!("available: {:?}", engine.check_availability(&period, Some("B")));

    let booking = engine.create_booking(
        NewBooking::new(Uuid::new_v4(), car, period, Money::from_major(300))
            .with_surcharge(Money::from_major(50))
            .with_discount(Money::from_major(20))
            .with_deposit(Money::from_major(2000)),
        &time,
    )?;
    engine.transition(booking.id, BookingState::Validated, TransitionPayload::None, &time)?;

    let receipt = engine.record_payment(
        PaymentRequest::new(
            booking.id,
            Money::from_major(1000),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            PaymentMethod::Cash,
        ),
        &time,
    )?;

    // print current state
    println!("{} total {} paid {} remaining {}",
        booking.reference, receipt.totals.total, receipt.totals.paid, receipt.totals.remaining);

    Ok(())
}
