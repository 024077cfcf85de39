//! Mid-contract vehicle replacement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::availability::{AvailabilityChecker, Occupancy};
use crate::booking::Booking;
use crate::decimal::Money;
use crate::errors::{BookingError, Result};
use crate::types::{BookingId, BookingState, SubstitutionReason, VehicleId};

/// audit record of a vehicle swap, never edited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSubstitutionEvent {
    pub id: Uuid,
    pub booking_id: BookingId,
    pub old_vehicle_id: VehicleId,
    pub new_vehicle_id: VehicleId,
    pub reason: SubstitutionReason,
    pub note: Option<String>,
    pub old_daily_rate: Money,
    pub new_daily_rate: Money,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionRequest {
    pub booking_id: BookingId,
    pub new_vehicle_id: VehicleId,
    pub reason: SubstitutionReason,
    pub new_daily_rate: Money,
    pub note: Option<String>,
}

/// everything a substitution changes, staged before commit
///
/// Both vehicles' statuses are re-projected once the swap is committed, so the
/// incoming one turns rented under a delivered booking.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstitutionPlan {
    pub record: VehicleSubstitutionEvent,
}

impl SubstitutionPlan {
    /// swap vehicle and rate on the booking and append the record
    ///
    /// Totals are not touched here; the caller recomputes them against the
    /// payments already recorded.
    pub fn apply_to(&self, booking: &mut Booking) {
        booking.vehicle_id = Some(self.record.new_vehicle_id);
        booking.daily_rate = self.record.new_daily_rate;
        booking.substitutions.push(self.record.clone());
    }
}

pub fn plan_substitution(
    booking: &Booking,
    request: SubstitutionRequest,
    checker: &AvailabilityChecker<'_>,
    timestamp: DateTime<Utc>,
) -> Result<SubstitutionPlan> {
    if !matches!(booking.state, BookingState::Validated | BookingState::Delivered) {
        return Err(BookingError::SubstitutionNotAllowed {
            booking_id: booking.id,
            state: booking.state,
        });
    }
    if !request.new_daily_rate.is_positive() {
        return Err(BookingError::InvalidDailyRate {
            rate: request.new_daily_rate,
        });
    }
    let old_vehicle_id = booking.vehicle_id.ok_or(BookingError::MissingField {
        booking_id: booking.id,
        field: "vehicle",
    })?;
    if old_vehicle_id == request.new_vehicle_id {
        return Err(BookingError::SameVehicle {
            booking_id: booking.id,
            vehicle_id: old_vehicle_id,
        });
    }

    checker.ensure_status_available(request.new_vehicle_id)?;
    checker.ensure_free(
        request.new_vehicle_id,
        &booking.period,
        Some(booking.id),
        Occupancy::Occupying,
    )?;

    Ok(SubstitutionPlan {
        record: VehicleSubstitutionEvent {
            id: Uuid::new_v4(),
            booking_id: booking.id,
            old_vehicle_id,
            new_vehicle_id: request.new_vehicle_id,
            reason: request.reason,
            note: request.note.filter(|n| !n.trim().is_empty()),
            old_daily_rate: booking.daily_rate,
            new_daily_rate: request.new_daily_rate,
            timestamp,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::{Fleet, Vehicle};
    use crate::testing::{booking, clock, january};
    use crate::types::VehicleStatus;

    fn fleet() -> (Fleet, VehicleId, VehicleId) {
        let mut fleet = Fleet::new();
        let v = fleet
            .insert(
                Vehicle::new("V", "Logan", Money::from_major(300)).with_status(VehicleStatus::Rented),
            )
            .unwrap();
        let w = fleet
            .insert(Vehicle::new("W", "Duster", Money::from_major(350)))
            .unwrap();
        (fleet, v, w)
    }

    fn request(booking: &Booking, vehicle: VehicleId, rate: i64) -> SubstitutionRequest {
        SubstitutionRequest {
            booking_id: booking.id,
            new_vehicle_id: vehicle,
            reason: SubstitutionReason::Breakdown,
            new_daily_rate: Money::from_major(rate),
            note: Some("gearbox".to_string()),
        }
    }

    #[test]
    fn test_delivered_booking_swaps_vehicle_and_rate() {
        let (fleet, v, w) = fleet();
        let mut b = booking(v, january(10, 15), BookingState::Delivered);
        let bookings = vec![b.clone()];
        let checker = AvailabilityChecker::new(&fleet, &bookings);

        let plan = plan_substitution(&b, request(&b, w, 350), &checker, clock().now()).unwrap();
        assert_eq!(plan.record.old_vehicle_id, v);
        assert_eq!(plan.record.old_daily_rate, Money::from_major(300));

        plan.apply_to(&mut b);
        assert_eq!(b.vehicle_id, Some(w));
        assert_eq!(b.daily_rate, Money::from_major(350));
        assert_eq!(b.substitutions.len(), 1);
        // 5 days at 350 + 50 - 20
        let totals = b.recompute_totals([Money::from_major(1000)]);
        assert_eq!(totals.total, Money::from_major(1780));
        assert_eq!(totals.remaining, Money::from_major(780));
    }

    #[test]
    fn test_only_validated_or_delivered() {
        let (fleet, v, w) = fleet();
        let checker = AvailabilityChecker::new(&fleet, Vec::<&Booking>::new());
        for state in [
            BookingState::Draft,
            BookingState::Returned,
            BookingState::Closed,
            BookingState::Cancelled,
        ] {
            let b = booking(v, january(10, 15), state);
            let err = plan_substitution(&b, request(&b, w, 350), &checker, clock().now()).unwrap_err();
            assert_eq!(err, BookingError::SubstitutionNotAllowed { booking_id: b.id, state });
            assert!(err.is_consistency());
        }

        let b = booking(v, january(10, 15), BookingState::Validated);
        assert!(plan_substitution(&b, request(&b, w, 350), &checker, clock().now()).is_ok());
    }

    #[test]
    fn test_rejects_bad_requests() {
        let (fleet, v, w) = fleet();
        let b = booking(v, january(10, 15), BookingState::Delivered);
        let checker = AvailabilityChecker::new(&fleet, Vec::<&Booking>::new());

        let err = plan_substitution(&b, request(&b, w, 0), &checker, clock().now()).unwrap_err();
        assert!(err.is_validation());
        let err = plan_substitution(&b, request(&b, v, 300), &checker, clock().now()).unwrap_err();
        assert!(matches!(err, BookingError::SameVehicle { .. }));
        let err = plan_substitution(&b, request(&b, Uuid::new_v4(), 300), &checker, clock().now())
            .unwrap_err();
        assert!(matches!(err, BookingError::VehicleNotFound { .. }));
    }

    #[test]
    fn test_new_vehicle_must_be_free() {
        let (mut fleet, v, w) = fleet();
        let b = booking(v, january(10, 15), BookingState::Delivered);

        // status check
        fleet.set_status(w, VehicleStatus::Immobilized).unwrap();
        let checker = AvailabilityChecker::new(&fleet, Vec::<&Booking>::new());
        let err = plan_substitution(&b, request(&b, w, 350), &checker, clock().now()).unwrap_err();
        assert!(matches!(
            err,
            BookingError::VehicleNotAvailable { status: VehicleStatus::Immobilized, .. }
        ));

        // interval scan: a later validated contract on W overlaps
        fleet.set_status(w, VehicleStatus::Available).unwrap();
        let other = booking(w, january(14, 18), BookingState::Validated);
        let bookings = vec![b.clone(), other.clone()];
        let checker = AvailabilityChecker::new(&fleet, &bookings);
        let err = plan_substitution(&b, request(&b, w, 350), &checker, clock().now()).unwrap_err();
        assert!(matches!(err, BookingError::VehicleUnavailable { conflicting, .. } if conflicting == other.id));
    }
}
