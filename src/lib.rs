pub mod availability;
pub mod booking;
pub mod calendar;
pub mod config;
pub mod decimal;
pub mod documents;
pub mod engine;
pub mod errors;
pub mod events;
pub mod fleet;
pub mod ledger;
pub mod lifecycle;
pub mod period;
pub mod pricing;
pub mod substitution;
pub mod types;

#[cfg(test)]
mod testing;

// re-export key types
pub use availability::{AvailabilityChecker, Occupancy};
pub use booking::{Booking, Deposit, HandoverRecord};
pub use calendar::{CalendarBar, CalendarMonth};
pub use config::{BookingPolicies, EngineConfig, OverpaymentPolicy, ReferenceConfig};
pub use decimal::Money;
pub use documents::{DeferredDocuments, DocumentGenerator, DocumentRef};
pub use engine::{EngineState, NewBooking, RentalEngine};
pub use errors::{BookingError, ErrorKind, Result};
pub use events::{Event, EventStore};
pub use fleet::{Fleet, Vehicle};
pub use ledger::{Payment, PaymentLedger, PaymentReceipt, PaymentRequest};
pub use lifecycle::{plan_transition, SideEffect, TransitionPayload, TransitionPlan, TRANSITIONS};
pub use period::RentalPeriod;
pub use pricing::{compute_totals, PricingInput, Totals};
pub use substitution::{SubstitutionRequest, VehicleSubstitutionEvent};
pub use types::{
    BookingId, BookingKind, BookingState, ClientId, DepositStatus, FuelLevel, HandoverKind,
    InsurerId, PaymentId, PaymentMethod, SubstitutionReason, VehicleId, VehicleStatus,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
