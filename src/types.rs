use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// unique identifier for a booking
pub type BookingId = Uuid;
/// unique identifier for a vehicle
pub type VehicleId = Uuid;
/// client reference, owned by the client directory
pub type ClientId = Uuid;
/// insurer reference, owned by the insurer directory
pub type InsurerId = Uuid;
/// unique identifier for a payment
pub type PaymentId = Uuid;

/// booking lifecycle state
///
/// `Draft -> Validated -> Delivered -> Returned -> Closed`, with `Cancelled`
/// reachable from `Draft` and `Validated` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingState {
    /// reservation captured, nothing committed yet
    Draft,
    /// contract validated and printable, vehicle reserved for the period
    Validated,
    /// vehicle handed over to the client
    Delivered,
    /// vehicle back, deposit still to be handled
    Returned,
    /// administratively closed
    Closed,
    /// abandoned before delivery
    Cancelled,
}

impl BookingState {
    pub const ALL: [BookingState; 6] = [
        BookingState::Draft,
        BookingState::Validated,
        BookingState::Delivered,
        BookingState::Returned,
        BookingState::Closed,
        BookingState::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Validated => "validated",
            Self::Delivered => "delivered",
            Self::Returned => "returned",
            Self::Closed => "closed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "validated" => Some(Self::Validated),
            "delivered" => Some(Self::Delivered),
            "returned" => Some(Self::Returned),
            "closed" => Some(Self::Closed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// the booking reserves its vehicle for its period
    pub fn is_occupying(&self) -> bool {
        matches!(self, Self::Validated | Self::Delivered)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Cancelled)
    }

    /// dates, rate and pricing can still be edited
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Validated)
    }
}

impl fmt::Display for BookingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// operational status of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    Rented,
    Reserved,
    BrokenDown,
    Immobilized,
    OutOfService,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Rented => "rented",
            Self::Reserved => "reserved",
            Self::BrokenDown => "broken_down",
            Self::Immobilized => "immobilized",
            Self::OutOfService => "out_of_service",
        }
    }

    /// set by fleet administration, never overwritten by the booking projection
    pub fn is_manual(&self) -> bool {
        matches!(self, Self::BrokenDown | Self::Immobilized | Self::OutOfService)
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// deposit (caution) status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    Held,
    Refunded,
    Consumed,
}

/// payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Check,
    Transfer,
    Card,
}

/// how the vehicle changed hands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoverKind {
    /// agency staff brought the vehicle to / collected it from the client
    HandedByAgency,
    /// client came to the agency
    AtAgency,
}

/// fuel gauge reading at handover
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelLevel {
    Empty,
    Quarter,
    Half,
    ThreeQuarters,
    Full,
}

/// why a vehicle was swapped mid-contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstitutionReason {
    Breakdown,
    Accident,
    Maintenance,
    ClientRequest,
    Upgrade,
    Other,
}

/// standard rental or insurer-funded assistance dossier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingKind {
    Standard,
    Assistance {
        insurer_id: Option<InsurerId>,
        /// vehicle category the insurer covers
        rate_category: Option<String>,
    },
}

impl BookingKind {
    pub fn is_assistance(&self) -> bool {
        matches!(self, Self::Assistance { .. })
    }

    /// category used to filter vehicles for this booking
    pub fn category(&self) -> Option<&str> {
        match self {
            Self::Standard => None,
            Self::Assistance { rate_category, .. } => rate_category.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip_names() {
        for state in BookingState::ALL {
            assert_eq!(BookingState::parse(state.as_str()), Some(state));
        }
        assert_eq!(BookingState::parse(" Delivered "), Some(BookingState::Delivered));
        assert_eq!(BookingState::parse("rented"), None);
    }

    #[test]
    fn test_occupying_states() {
        let occupying: Vec<_> = BookingState::ALL
            .into_iter()
            .filter(BookingState::is_occupying)
            .collect();
        assert_eq!(occupying, vec![BookingState::Validated, BookingState::Delivered]);
    }

    #[test]
    fn test_state_serde_names() {
        let json = serde_json::to_string(&BookingState::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
        let status: VehicleStatus = serde_json::from_str("\"out_of_service\"").unwrap();
        assert_eq!(status, VehicleStatus::OutOfService);
        assert!(status.is_manual());
    }

    #[test]
    fn test_assistance_category() {
        let kind = BookingKind::Assistance {
            insurer_id: None,
            rate_category: Some("B".to_string()),
        };
        assert!(kind.is_assistance());
        assert_eq!(kind.category(), Some("B"));
        assert_eq!(BookingKind::Standard.category(), None);
    }
}
