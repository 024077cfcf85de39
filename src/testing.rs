//! Fixtures shared by unit tests.

use chrono::{NaiveDate, TimeZone, Utc};
use hourglass_rs::{SafeTimeProvider, TimeSource};
use uuid::Uuid;

use crate::booking::{Booking, Deposit};
use crate::decimal::Money;
use crate::period::RentalPeriod;
use crate::pricing::Totals;
use crate::types::{BookingKind, BookingState, VehicleId};

pub fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

pub fn january(from: u32, to: u32) -> RentalPeriod {
    RentalPeriod::new(jan(from), jan(to)).unwrap()
}

pub fn clock() -> SafeTimeProvider {
    SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap(),
    ))
}

pub fn booking(vehicle_id: VehicleId, period: RentalPeriod, state: BookingState) -> Booking {
    let now = Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap();
    let mut booking = Booking {
        id: Uuid::new_v4(),
        reference: "CTR-2024-0001".to_string(),
        kind: BookingKind::Standard,
        client_id: Some(Uuid::new_v4()),
        vehicle_id: Some(vehicle_id),
        period,
        pickup_location: None,
        dropoff_location: None,
        daily_rate: Money::from_major(300),
        surcharge: Money::from_major(50),
        discount: Money::from_major(20),
        deposit: Deposit::held(Money::from_major(2000)),
        totals: Totals::default(),
        state,
        delivery: None,
        return_record: None,
        contract_document: None,
        cancellation_reason: None,
        substitutions: Vec::new(),
        created_at: now,
        last_state_change: now,
    };
    booking.recompute_totals(std::iter::empty::<Money>());
    booking
}
