use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::documents::DocumentRef;
use crate::period::RentalPeriod;
use crate::pricing::{compute_totals, PricingInput, Totals};
use crate::substitution::VehicleSubstitutionEvent;
use crate::types::{
    BookingId, BookingKind, BookingState, ClientId, DepositStatus, FuelLevel, HandoverKind,
    VehicleId,
};

/// refundable hold tracked apart from rental charges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub amount: Money,
    pub status: DepositStatus,
}

impl Deposit {
    pub fn held(amount: Money) -> Self {
        Self {
            amount,
            status: DepositStatus::Held,
        }
    }

    pub fn is_held(&self) -> bool {
        self.status == DepositStatus::Held && !self.amount.is_zero()
    }
}

/// vehicle handover at delivery or return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoverRecord {
    pub kind: HandoverKind,
    pub at: DateTime<Utc>,
    pub mileage_km: u32,
    pub fuel_level: FuelLevel,
}

/// a reservation of one vehicle for one client over a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    // identification
    pub id: BookingId,
    pub reference: String,
    pub kind: BookingKind,

    // parties
    pub client_id: Option<ClientId>,
    pub vehicle_id: Option<VehicleId>,

    // period and places
    pub period: RentalPeriod,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,

    // money, rate snapshotted at creation or substitution
    pub daily_rate: Money,
    pub surcharge: Money,
    pub discount: Money,
    pub deposit: Deposit,
    pub totals: Totals,

    // lifecycle
    pub state: BookingState,
    pub delivery: Option<HandoverRecord>,
    pub return_record: Option<HandoverRecord>,
    pub contract_document: Option<DocumentRef>,
    pub cancellation_reason: Option<String>,
    pub substitutions: Vec<VehicleSubstitutionEvent>,

    // dates
    pub created_at: DateTime<Utc>,
    pub last_state_change: DateTime<Utc>,
}

impl Booking {
    pub fn pricing_input(&self) -> PricingInput {
        PricingInput {
            daily_rate: self.daily_rate,
            period: self.period,
            surcharge: self.surcharge,
            discount: self.discount,
        }
    }

    /// refresh the cached totals from the recorded payment amounts
    pub fn recompute_totals<I>(&mut self, payments: I) -> Totals
    where
        I: IntoIterator<Item = Money>,
    {
        self.totals = compute_totals(&self.pricing_input(), payments);
        self.totals
    }

    pub fn update_state(&mut self, new_state: BookingState, timestamp: DateTime<Utc>) {
        self.state = new_state;
        self.last_state_change = timestamp;
    }

    /// occupies `vehicle_id` for its period
    pub fn occupies(&self, vehicle_id: VehicleId) -> bool {
        self.state.is_occupying() && self.vehicle_id == Some(vehicle_id)
    }

    /// first required field still missing before validation
    pub fn missing_for_validation(&self) -> Option<&'static str> {
        if self.client_id.is_none() {
            return Some("client");
        }
        if self.vehicle_id.is_none() {
            return Some("vehicle");
        }
        if let BookingKind::Assistance {
            insurer_id,
            rate_category,
        } = &self.kind
        {
            if insurer_id.is_none() {
                return Some("insurer");
            }
            if rate_category.as_deref().map_or(true, |c| c.trim().is_empty()) {
                return Some("rate category");
            }
        }
        None
    }

    /// closed with the deposit neither refunded nor consumed
    pub fn requires_deposit_disposition(&self) -> bool {
        self.state == BookingState::Closed && self.deposit.is_held()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn sample(kind: BookingKind) -> Booking {
        let now = Utc::now();
        let start = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        Booking {
            id: Uuid::new_v4(),
            reference: "CTR-2024-0001".to_string(),
            kind,
            client_id: Some(Uuid::new_v4()),
            vehicle_id: Some(Uuid::new_v4()),
            period: RentalPeriod::new(start, end).unwrap(),
            pickup_location: None,
            dropoff_location: None,
            daily_rate: Money::from_major(300),
            surcharge: Money::from_major(50),
            discount: Money::from_major(20),
            deposit: Deposit::held(Money::from_major(2000)),
            totals: Totals::default(),
            state: BookingState::Draft,
            delivery: None,
            return_record: None,
            contract_document: None,
            cancellation_reason: None,
            substitutions: Vec::new(),
            created_at: now,
            last_state_change: now,
        }
    }

    #[test]
    fn test_recompute_totals() {
        let mut booking = sample(BookingKind::Standard);
        let totals = booking.recompute_totals([Money::from_major(1000)]);
        assert_eq!(totals.total, Money::from_major(1530));
        assert_eq!(booking.totals.remaining, Money::from_major(530));
    }

    #[test]
    fn test_validation_requirements() {
        let mut booking = sample(BookingKind::Standard);
        assert_eq!(booking.missing_for_validation(), None);
        booking.client_id = None;
        assert_eq!(booking.missing_for_validation(), Some("client"));

        let mut assistance = sample(BookingKind::Assistance {
            insurer_id: Some(Uuid::new_v4()),
            rate_category: Some("  ".to_string()),
        });
        assert_eq!(assistance.missing_for_validation(), Some("rate category"));
        assistance.kind = BookingKind::Assistance {
            insurer_id: None,
            rate_category: Some("B".to_string()),
        };
        assert_eq!(assistance.missing_for_validation(), Some("insurer"));
    }

    #[test]
    fn test_occupies_only_in_occupying_states() {
        let mut booking = sample(BookingKind::Standard);
        let vehicle = booking.vehicle_id.unwrap();
        assert!(!booking.occupies(vehicle));
        booking.update_state(BookingState::Validated, Utc::now());
        assert!(booking.occupies(vehicle));
        assert!(!booking.occupies(Uuid::new_v4()));
        booking.update_state(BookingState::Returned, Utc::now());
        assert!(!booking.occupies(vehicle));
    }

    #[test]
    fn test_deposit_disposition_flag() {
        let mut booking = sample(BookingKind::Standard);
        booking.update_state(BookingState::Closed, Utc::now());
        assert!(booking.requires_deposit_disposition());
        booking.deposit.status = DepositStatus::Refunded;
        assert!(!booking.requires_deposit_disposition());

        // nothing to dispose of
        booking.deposit = Deposit::held(Money::ZERO);
        assert!(!booking.requires_deposit_disposition());
    }
}
