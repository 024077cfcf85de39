use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{
    BookingId, BookingState, DepositStatus, PaymentId, SubstitutionReason, VehicleId,
    VehicleStatus,
};

/// everything the engine commits, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // booking events
    BookingCreated {
        booking_id: BookingId,
        reference: String,
        vehicle_id: Option<VehicleId>,
        start: NaiveDate,
        end: NaiveDate,
        total: Money,
        timestamp: DateTime<Utc>,
    },
    BookingRescheduled {
        booking_id: BookingId,
        start: NaiveDate,
        end: NaiveDate,
        new_total: Money,
        timestamp: DateTime<Utc>,
    },
    PricingAdjusted {
        booking_id: BookingId,
        surcharge: Money,
        discount: Money,
        new_total: Money,
        timestamp: DateTime<Utc>,
    },
    StateChanged {
        booking_id: BookingId,
        old_state: BookingState,
        new_state: BookingState,
        timestamp: DateTime<Utc>,
    },
    ContractDocumentGenerated {
        booking_id: BookingId,
        document: String,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentRecorded {
        booking_id: BookingId,
        payment_id: PaymentId,
        amount: Money,
        remaining: Money,
        timestamp: DateTime<Utc>,
    },
    OverpaymentFlagged {
        booking_id: BookingId,
        excess: Money,
        timestamp: DateTime<Utc>,
    },

    // deposit events
    DepositDispositionRequired {
        booking_id: BookingId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    DepositSettled {
        booking_id: BookingId,
        amount: Money,
        status: DepositStatus,
        timestamp: DateTime<Utc>,
    },

    // vehicle events
    VehicleSubstituted {
        booking_id: BookingId,
        old_vehicle_id: VehicleId,
        new_vehicle_id: VehicleId,
        reason: SubstitutionReason,
        new_total: Money,
        timestamp: DateTime<Utc>,
    },
    VehicleStatusChanged {
        vehicle_id: VehicleId,
        old_status: VehicleStatus,
        new_status: VehicleStatus,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
