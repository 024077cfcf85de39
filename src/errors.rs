use chrono::NaiveDate;
use thiserror::Error;

use crate::decimal::Money;
use crate::types::{BookingId, BookingState, DepositStatus, VehicleId, VehicleStatus};

/// how the caller is expected to react to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// malformed or missing input, re-prompt
    Validation,
    /// unavailable vehicle/dates or transition not allowed from current state
    Conflict,
    /// operation would leave totals, payments or vehicle status inconsistent
    Consistency,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    // validation
    #[error("invalid period: end {end} is before start {start}")]
    InvalidPeriod {
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("booking {booking_id}: missing {field}")]
    MissingField {
        booking_id: BookingId,
        field: &'static str,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("invalid daily rate: {rate}")]
    InvalidDailyRate {
        rate: Money,
    },

    #[error("invalid amount for {field}: {amount}")]
    InvalidAmount {
        field: &'static str,
        amount: Money,
    },

    #[error("booking {booking_id}: total would be negative ({total})")]
    NegativeTotal {
        booking_id: BookingId,
        total: Money,
    },

    #[error("booking {booking_id}: transition to {to} requires a {expected} payload")]
    MissingPayload {
        booking_id: BookingId,
        to: BookingState,
        expected: &'static str,
    },

    #[error("booking {booking_id}: return record is inconsistent with delivery ({message})")]
    InvalidReturnRecord {
        booking_id: BookingId,
        message: String,
    },

    #[error("booking not found: {id}")]
    BookingNotFound {
        id: BookingId,
    },

    #[error("vehicle not found: {id}")]
    VehicleNotFound {
        id: VehicleId,
    },

    #[error("vehicle {vehicle_id} is not in category {category}")]
    CategoryMismatch {
        vehicle_id: VehicleId,
        category: String,
    },

    #[error("booking {booking_id}: deposit can only be refunded or consumed, not set to {status:?}")]
    InvalidDisposition {
        booking_id: BookingId,
        status: DepositStatus,
    },

    #[error("invalid calendar month: {year}-{month}")]
    InvalidMonth {
        year: i32,
        month: u32,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    // conflict
    #[error("booking {booking_id}: invalid transition from {from} to {to}")]
    InvalidTransition {
        booking_id: BookingId,
        from: BookingState,
        to: BookingState,
    },

    #[error("vehicle {vehicle_id} unavailable from {start} to {end}: conflicts with booking {conflicting}")]
    VehicleUnavailable {
        vehicle_id: VehicleId,
        start: NaiveDate,
        end: NaiveDate,
        conflicting: BookingId,
    },

    #[error("vehicle {vehicle_id} is {status}, not available")]
    VehicleNotAvailable {
        vehicle_id: VehicleId,
        status: VehicleStatus,
    },

    #[error("booking {booking_id}: operation '{operation}' not allowed in state {state}")]
    OperationNotAllowed {
        booking_id: BookingId,
        operation: &'static str,
        state: BookingState,
    },

    #[error("booking {booking_id}: payment of {amount} exceeds remaining balance {remaining}")]
    Overpayment {
        booking_id: BookingId,
        amount: Money,
        remaining: Money,
    },

    #[error("booking {booking_id}: deposit is {status:?}, expected held")]
    DepositAlreadySettled {
        booking_id: BookingId,
        status: DepositStatus,
    },

    #[error("booking {booking_id}: deposit still held, refund or consume it before closing")]
    DepositNotSettled {
        booking_id: BookingId,
    },

    // consistency
    #[error("booking {booking_id}: substitution not possible in state {state}")]
    SubstitutionNotAllowed {
        booking_id: BookingId,
        state: BookingState,
    },

    #[error("booking {booking_id}: vehicle {vehicle_id} is already assigned")]
    SameVehicle {
        booking_id: BookingId,
        vehicle_id: VehicleId,
    },

    #[error("booking {booking_id} is cancelled, no payment can be recorded")]
    BookingCancelled {
        booking_id: BookingId,
    },

    #[error("vehicle {vehicle_id} is held by delivered booking {booking_id}")]
    VehicleInUse {
        vehicle_id: VehicleId,
        booking_id: BookingId,
    },

    #[error("booking {booking_id}: contract document generation failed: {message}")]
    DocumentGeneration {
        booking_id: BookingId,
        message: String,
    },

    #[error("inconsistent state: {message}")]
    InconsistentState {
        message: String,
    },
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        use BookingError::*;
        match self {
            InvalidPeriod { .. }
            | MissingField { .. }
            | InvalidPaymentAmount { .. }
            | InvalidDailyRate { .. }
            | InvalidAmount { .. }
            | NegativeTotal { .. }
            | MissingPayload { .. }
            | InvalidReturnRecord { .. }
            | BookingNotFound { .. }
            | VehicleNotFound { .. }
            | CategoryMismatch { .. }
            | InvalidDisposition { .. }
            | InvalidMonth { .. }
            | InvalidConfiguration { .. } => ErrorKind::Validation,

            InvalidTransition { .. }
            | VehicleUnavailable { .. }
            | VehicleNotAvailable { .. }
            | OperationNotAllowed { .. }
            | Overpayment { .. }
            | DepositAlreadySettled { .. }
            | DepositNotSettled { .. } => ErrorKind::Conflict,

            SubstitutionNotAllowed { .. }
            | SameVehicle { .. }
            | BookingCancelled { .. }
            | VehicleInUse { .. }
            | DocumentGeneration { .. }
            | InconsistentState { .. } => ErrorKind::Consistency,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    pub fn is_consistency(&self) -> bool {
        self.kind() == ErrorKind::Consistency
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_transition_error_message_names_booking_and_states() {
        let id = Uuid::new_v4();
        let err = BookingError::InvalidTransition {
            booking_id: id,
            from: BookingState::Closed,
            to: BookingState::Delivered,
        };
        assert!(err.is_conflict());
        let msg = err.to_string();
        assert!(msg.contains(&id.to_string()));
        assert!(msg.contains("from closed to delivered"));
    }

    #[test]
    fn test_kinds() {
        let id = Uuid::new_v4();
        assert!(BookingError::InvalidPaymentAmount { amount: Money::ZERO }.is_validation());
        assert!(BookingError::SubstitutionNotAllowed {
            booking_id: id,
            state: BookingState::Closed,
        }
        .is_consistency());
        let unavailable = BookingError::VehicleUnavailable {
            vehicle_id: id,
            start: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            conflicting: Uuid::new_v4(),
        };
        assert_eq!(unavailable.kind(), ErrorKind::Conflict);
        assert!(unavailable.to_string().contains("2024-01-10"));
    }
}
