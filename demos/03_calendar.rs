/// calendar - month view of the fleet's bookings
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rental_booking_rs::{
    BookingState, CalendarMonth, DeferredDocuments, EngineConfig, Money, NewBooking, RentalEngine,
    RentalPeriod, SafeTimeProvider, TimeSource, TransitionPayload, Uuid, Vehicle,
};

fn period(from: (u32, u32), to: (u32, u32)) -> Result<RentalPeriod, Box<dyn std::error::Error>> {
    let start = NaiveDate::from_ymd_opt(2024, from.0, from.1).ok_or("bad date")?;
    let end = NaiveDate::from_ymd_opt(2024, to.0, to.1).ok_or("bad date")?;
    Ok(RentalPeriod::new(start, end)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("warn").init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
    ));
    let engine = RentalEngine::new(EngineConfig::standard(), Arc::new(DeferredDocuments::new()))?;
    let cars = [
        engine.add_vehicle(Vehicle::new("12345-A-6", "Dacia Logan", Money::from_major(300)))?,
        engine.add_vehicle(Vehicle::new("67890-B-6", "Dacia Duster", Money::from_major(350)))?,
    ];

    let plan = [
        (cars[0], period((1, 3), (1, 8))?, true),
        (cars[0], period((1, 20), (2, 4))?, false),
        (cars[1], period((1, 12), (1, 14))?, true),
    ];
    for (car, dates, validate) in plan {
        let booking = engine.create_booking(
            NewBooking::new(Uuid::new_v4(), car, dates, Money::from_major(300)),
            &time,
        )?;
        if validate {
            engine.transition(booking.id, BookingState::Validated, TransitionPayload::None, &time)?;
        }
    }

    let month = CalendarMonth::new(2024, 1)?;
    println!("{} .. {}", month.first_day(), month.last_day());
    for bar in engine.calendar(&month) {
        let lead = if bar.starts_before_month { '<' } else { '|' };
        let tail = if bar.ends_after_month { '>' } else { '|' };
        println!(
            "{:>14} {}{}{}{} {}",
            bar.reference,
            " ".repeat(bar.first_column as usize),
            lead,
            "=".repeat(bar.span_days.saturating_sub(2) as usize),
            tail,
            bar.state
        );
    }

    Ok(())
}
