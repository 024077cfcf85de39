use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{BookingError, Result};
use crate::types::{VehicleId, VehicleStatus};

/// vehicle as seen by the booking engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub registration: String,
    pub model: String,
    /// list price, snapshotted into bookings at creation
    pub daily_rate: Money,
    /// cached projection, recomputed from bookings
    pub status: VehicleStatus,
    /// category tags used for assistance-tier matching
    pub categories: BTreeSet<String>,
}

impl Vehicle {
    pub fn new(registration: impl Into<String>, model: impl Into<String>, daily_rate: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            registration: registration.into(),
            model: model.into(),
            daily_rate,
            status: VehicleStatus::Available,
            categories: BTreeSet::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.insert(category.into());
        self
    }

    pub fn with_status(mut self, status: VehicleStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.categories.contains(category)
    }
}

/// registry of vehicles, keyed by id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fleet {
    vehicles: BTreeMap<VehicleId, Vehicle>,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, vehicle: Vehicle) -> Result<VehicleId> {
        if !vehicle.daily_rate.is_positive() {
            return Err(BookingError::InvalidDailyRate {
                rate: vehicle.daily_rate,
            });
        }
        let id = vehicle.id;
        self.vehicles.insert(id, vehicle);
        Ok(id)
    }

    pub fn get(&self, id: VehicleId) -> Result<&Vehicle> {
        self.vehicles
            .get(&id)
            .ok_or(BookingError::VehicleNotFound { id })
    }

    pub fn status(&self, id: VehicleId) -> Result<VehicleStatus> {
        self.get(id).map(|v| v.status)
    }

    pub fn set_status(&mut self, id: VehicleId, status: VehicleStatus) -> Result<VehicleStatus> {
        let vehicle = self
            .vehicles
            .get_mut(&id)
            .ok_or(BookingError::VehicleNotFound { id })?;
        Ok(std::mem::replace(&mut vehicle.status, status))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_status() {
        let mut fleet = Fleet::new();
        let id = fleet
            .insert(Vehicle::new("12345-A-6", "Dacia Logan", Money::from_major(300)).with_category("B"))
            .unwrap();

        assert_eq!(fleet.len(), 1);
        assert!(fleet.get(id).unwrap().in_category("B"));
        assert_eq!(fleet.status(id).unwrap(), VehicleStatus::Available);

        let previous = fleet.set_status(id, VehicleStatus::Rented).unwrap();
        assert_eq!(previous, VehicleStatus::Available);
        assert!(!fleet.get(id).unwrap().is_available());
    }

    #[test]
    fn test_rejects_free_vehicle() {
        let mut fleet = Fleet::new();
        let err = fleet
            .insert(Vehicle::new("1-A-1", "Clio", Money::ZERO))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_unknown_vehicle() {
        let fleet = Fleet::new();
        let err = fleet.get(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, BookingError::VehicleNotFound { .. }));
    }
}
