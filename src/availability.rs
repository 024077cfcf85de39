//! Vehicle availability over a date range.
//!
//! Occupancy is derived from bookings alone: a vehicle is taken for a period
//! when one of its bookings in an occupying state intersects it, boundaries
//! included. The vehicle's own status is only a cached projection.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::booking::Booking;
use crate::errors::{BookingError, Result};
use crate::fleet::{Fleet, Vehicle};
use crate::period::RentalPeriod;
use crate::types::{BookingId, BookingState, VehicleId, VehicleStatus};

/// which bookings count as holding a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    /// validated and delivered bookings
    Occupying,
    /// occupying bookings plus drafts, used when creating a booking
    Claimed,
}

impl Occupancy {
    fn holds(&self, state: BookingState) -> bool {
        match self {
            Occupancy::Occupying => state.is_occupying(),
            Occupancy::Claimed => state.is_occupying() || state == BookingState::Draft,
        }
    }
}

/// read-only view over the fleet and the persisted bookings
pub struct AvailabilityChecker<'a> {
    fleet: &'a Fleet,
    bookings: Vec<&'a Booking>,
}

impl<'a> AvailabilityChecker<'a> {
    pub fn new(fleet: &'a Fleet, bookings: impl IntoIterator<Item = &'a Booking>) -> Self {
        Self {
            fleet,
            bookings: bookings.into_iter().collect(),
        }
    }

    /// vehicles with status available, no occupying booking over `period`,
    /// and, when filtered, tagged with `category`
    ///
    /// An empty set is a normal answer.
    pub fn find_available(&self, period: &RentalPeriod, category: Option<&str>) -> BTreeSet<VehicleId> {
        let available: BTreeSet<VehicleId> = self
            .fleet
            .iter()
            .filter(|v| v.is_available())
            .filter(|v| category.map_or(true, |c| v.in_category(c)))
            .filter(|v| {
                self.conflicting_booking(v.id, period, None, Occupancy::Occupying)
                    .is_none()
            })
            .map(|v| v.id)
            .collect();

        debug!(
            start = %period.start(),
            end = %period.end(),
            category = category.unwrap_or("any"),
            available = available.len(),
            "availability scan"
        );
        available
    }

    /// first booking holding `vehicle_id` over `period`, ignoring `exclude`
    pub fn conflicting_booking(
        &self,
        vehicle_id: VehicleId,
        period: &RentalPeriod,
        exclude: Option<BookingId>,
        occupancy: Occupancy,
    ) -> Option<&'a Booking> {
        self.bookings
            .iter()
            .copied()
            .filter(|b| Some(b.id) != exclude)
            .filter(|b| b.vehicle_id == Some(vehicle_id))
            .filter(|b| occupancy.holds(b.state))
            .find(|b| b.period.overlaps(period))
    }

    /// fails with the conflicting booking when the vehicle is taken
    pub fn ensure_free(
        &self,
        vehicle_id: VehicleId,
        period: &RentalPeriod,
        exclude: Option<BookingId>,
        occupancy: Occupancy,
    ) -> Result<()> {
        match self.conflicting_booking(vehicle_id, period, exclude, occupancy) {
            Some(conflict) => Err(BookingError::VehicleUnavailable {
                vehicle_id,
                start: period.start(),
                end: period.end(),
                conflicting: conflict.id,
            }),
            None => Ok(()),
        }
    }

    /// single-vehicle status check, no interval scan
    pub fn ensure_status_available(&self, vehicle_id: VehicleId) -> Result<&'a Vehicle> {
        let vehicle = self.fleet.get(vehicle_id)?;
        if !vehicle.is_available() {
            return Err(BookingError::VehicleNotAvailable {
                vehicle_id,
                status: vehicle.status,
            });
        }
        Ok(vehicle)
    }

    /// cached status the vehicle should carry on `today`
    ///
    /// Manual statuses stand until fleet administration lifts them. Otherwise
    /// a delivered booking, or a returned one awaiting close, keeps it rented
    /// and a validated contract covering `today` keeps it reserved.
    pub fn projected_status(&self, vehicle_id: VehicleId, today: NaiveDate) -> Result<VehicleStatus> {
        let vehicle = self.fleet.get(vehicle_id)?;
        if vehicle.status.is_manual() {
            return Ok(vehicle.status);
        }
        let held = self.bookings.iter().filter(|b| b.vehicle_id == Some(vehicle_id));
        let mut status = VehicleStatus::Available;
        for booking in held {
            match booking.state {
                BookingState::Delivered | BookingState::Returned => return Ok(VehicleStatus::Rented),
                BookingState::Validated if booking.period.contains(today) => {
                    status = VehicleStatus::Reserved;
                }
                _ => {}
            }
        }
        Ok(status)
    }

    /// delivered booking currently holding the vehicle, if any
    pub fn holder(&self, vehicle_id: VehicleId) -> Option<&'a Booking> {
        self.bookings
            .iter()
            .copied()
            .find(|b| b.vehicle_id == Some(vehicle_id) && b.state == BookingState::Delivered)
    }

    /// the vehicle exists and carries the requested category
    pub fn ensure_category(&self, vehicle_id: VehicleId, category: Option<&str>) -> Result<()> {
        let vehicle = self.fleet.get(vehicle_id)?;
        match category {
            Some(c) if !vehicle.in_category(c) => Err(BookingError::CategoryMismatch {
                vehicle_id,
                category: c.to_string(),
            }),
            _ => Ok(()),
        }
    }
}
