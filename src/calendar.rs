//! Month view of bookings as date-bounded bars.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::booking::Booking;
use crate::errors::{BookingError, Result};
use crate::types::{BookingId, BookingState, VehicleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarMonth {
    first: NaiveDate,
    last: NaiveDate,
}

impl CalendarMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        let first =
            NaiveDate::from_ymd_opt(year, month, 1).ok_or(BookingError::InvalidMonth { year, month })?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.pred_opt())
            .ok_or(BookingError::InvalidMonth { year, month })?;
        Ok(Self { first, last })
    }

    pub fn containing(date: NaiveDate) -> Result<Self> {
        Self::new(date.year(), date.month())
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last
    }

    pub fn days(&self) -> u32 {
        self.last.day()
    }

    /// bars for every booking visible this month, by vehicle then start
    ///
    /// Cancelled bookings and bookings without a vehicle have no bar.
    pub fn project<'a>(&self, bookings: impl IntoIterator<Item = &'a Booking>) -> Vec<CalendarBar> {
        let mut bars: Vec<CalendarBar> = bookings
            .into_iter()
            .filter(|b| b.state != BookingState::Cancelled)
            .filter_map(|b| {
                let vehicle_id = b.vehicle_id?;
                let (first_day, last_day) = b.period.clamp(self.first, self.last)?;
                Some(CalendarBar {
                    booking_id: b.id,
                    reference: b.reference.clone(),
                    vehicle_id,
                    state: b.state,
                    first_day,
                    last_day,
                    first_column: first_day.day0(),
                    span_days: last_day.day() - first_day.day() + 1,
                    starts_before_month: b.period.start() < self.first,
                    ends_after_month: b.period.end() > self.last,
                })
            })
            .collect();
        bars.sort_by(|a, b| {
            (a.vehicle_id, a.first_day, &a.reference).cmp(&(b.vehicle_id, b.first_day, &b.reference))
        });
        bars
    }
}

/// one booking drawn on a month grid; columns are zero-based days
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarBar {
    pub booking_id: BookingId,
    pub reference: String,
    pub vehicle_id: VehicleId,
    pub state: BookingState,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub first_column: u32,
    pub span_days: u32,
    pub starts_before_month: bool,
    pub ends_after_month: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::RentalPeriod;
    use crate::testing::{booking, january};
    use uuid::Uuid;

    #[test]
    fn test_month_bounds() {
        let feb = CalendarMonth::new(2024, 2).unwrap();
        assert_eq!(feb.days(), 29);
        let dec = CalendarMonth::new(2023, 12).unwrap();
        assert_eq!(dec.last_day(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(
            CalendarMonth::new(2024, 13),
            Err(BookingError::InvalidMonth { year: 2024, month: 13 })
        );
    }

    #[test]
    fn test_bars_are_clipped_to_month() {
        let v = Uuid::new_v4();
        let inside = booking(v, january(10, 15), BookingState::Delivered);
        let spanning = booking(
            v,
            RentalPeriod::new(
                NaiveDate::from_ymd_opt(2023, 12, 28).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            )
            .unwrap(),
            BookingState::Closed,
        );
        let month = CalendarMonth::new(2024, 1).unwrap();
        let bars = month.project([&inside, &spanning]);

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].booking_id, spanning.id);
        assert_eq!(bars[0].first_column, 0);
        assert_eq!(bars[0].span_days, 3);
        assert!(bars[0].starts_before_month);
        assert!(!bars[0].ends_after_month);

        assert_eq!(bars[1].first_column, 9);
        assert_eq!(bars[1].span_days, 6);
        assert_eq!(bars[1].state, BookingState::Delivered);
    }

    #[test]
    fn test_cancelled_and_unassigned_are_hidden() {
        let v = Uuid::new_v4();
        let cancelled = booking(v, january(10, 15), BookingState::Cancelled);
        let mut unassigned = booking(v, january(10, 15), BookingState::Draft);
        unassigned.vehicle_id = None;
        let february = booking(
            v,
            RentalPeriod::new(
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 4).unwrap(),
            )
            .unwrap(),
            BookingState::Draft,
        );

        let month = CalendarMonth::containing(NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()).unwrap();
        assert!(month.project([&cancelled, &unassigned, &february]).is_empty());
    }
}
