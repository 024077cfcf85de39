//! Contract lifecycle.
//!
//! Planning a transition is pure: it checks the transition table and the
//! preconditions of the target state and lists the side effects to run. The
//! engine then runs the fallible effects first and commits the new state only
//! when all of them succeeded.

use serde::{Deserialize, Serialize};

use crate::availability::{AvailabilityChecker, Occupancy};
use crate::booking::{Booking, HandoverRecord};
use crate::config::BookingPolicies;
use crate::decimal::Money;
use crate::errors::{BookingError, Result};
use crate::types::{BookingId, BookingState, VehicleId, VehicleStatus};

use BookingState::*;

/// every allowed `(from, to)` pair; anything else is an invalid transition
pub const TRANSITIONS: [(BookingState, BookingState); 6] = [
    (Draft, Validated),
    (Validated, Delivered),
    (Delivered, Returned),
    (Returned, Closed),
    (Draft, Cancelled),
    (Validated, Cancelled),
];

pub fn is_allowed(from: BookingState, to: BookingState) -> bool {
    TRANSITIONS.contains(&(from, to))
}

/// states reachable from `from` in one step
pub fn next_states(from: BookingState) -> Vec<BookingState> {
    TRANSITIONS
        .iter()
        .filter(|(f, _)| *f == from)
        .map(|(_, t)| *t)
        .collect()
}

/// data carried by a transition request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransitionPayload {
    None,
    Delivery(HandoverRecord),
    Return(HandoverRecord),
    Cancellation { reason: Option<String> },
}

/// work to do alongside the state change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// ask the document collaborator for the printable contract
    GenerateContractDocument,
    SetVehicleStatus {
        vehicle_id: VehicleId,
        status: VehicleStatus,
    },
    /// recompute the vehicle's cached status from its bookings
    ReleaseVehicle { vehicle_id: VehicleId },
    /// deposit still held at close
    FlagDepositDisposition { amount: Money },
}

/// validated transition, ready to be applied
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    pub booking_id: BookingId,
    pub from: BookingState,
    pub to: BookingState,
    pub delivery: Option<HandoverRecord>,
    pub return_record: Option<HandoverRecord>,
    pub cancellation_reason: Option<String>,
    pub effects: Vec<SideEffect>,
}

impl TransitionPlan {
    fn new(booking: &Booking, to: BookingState) -> Self {
        Self {
            booking_id: booking.id,
            from: booking.state,
            to,
            delivery: None,
            return_record: None,
            cancellation_reason: None,
            effects: Vec::new(),
        }
    }

    /// write the non-effect parts of the plan onto the booking
    pub fn apply_to(&self, booking: &mut Booking, timestamp: chrono::DateTime<chrono::Utc>) {
        if let Some(record) = &self.delivery {
            booking.delivery = Some(record.clone());
        }
        if let Some(record) = &self.return_record {
            booking.return_record = Some(record.clone());
        }
        if self.cancellation_reason.is_some() {
            booking.cancellation_reason = self.cancellation_reason.clone();
        }
        booking.update_state(self.to, timestamp);
    }
}

/// check `booking` can move to `to` and describe what that involves
pub fn plan_transition(
    booking: &Booking,
    to: BookingState,
    payload: TransitionPayload,
    checker: &AvailabilityChecker<'_>,
    policies: &BookingPolicies,
) -> Result<TransitionPlan> {
    if !is_allowed(booking.state, to) {
        return Err(BookingError::InvalidTransition {
            booking_id: booking.id,
            from: booking.state,
            to,
        });
    }

    let mut plan = TransitionPlan::new(booking, to);
    match to {
        Validated => plan_validation(booking, checker, &mut plan)?,
        Delivered => {
            let record = match payload {
                TransitionPayload::Delivery(record) => record,
                _ => {
                    return Err(BookingError::MissingPayload {
                        booking_id: booking.id,
                        to,
                        expected: "delivery record",
                    })
                }
            };
            plan_delivery(booking, record, checker, &mut plan)?;
        }
        Returned => {
            let record = match payload {
                TransitionPayload::Return(record) => record,
                _ => {
                    return Err(BookingError::MissingPayload {
                        booking_id: booking.id,
                        to,
                        expected: "return record",
                    })
                }
            };
            plan_return(booking, record, &mut plan)?;
        }
        Closed => plan_close(booking, policies, &mut plan)?,
        Cancelled => {
            if let TransitionPayload::Cancellation { reason } = payload {
                plan.cancellation_reason = reason.filter(|r| !r.trim().is_empty());
            }
            if let Some(vehicle_id) = booking.vehicle_id {
                plan.effects.push(SideEffect::ReleaseVehicle { vehicle_id });
            }
        }
        Draft => {
            return Err(BookingError::InvalidTransition {
                booking_id: booking.id,
                from: booking.state,
                to,
            })
        }
    }
    Ok(plan)
}

fn plan_validation(
    booking: &Booking,
    checker: &AvailabilityChecker<'_>,
    plan: &mut TransitionPlan,
) -> Result<()> {
    if let Some(field) = booking.missing_for_validation() {
        return Err(BookingError::MissingField {
            booking_id: booking.id,
            field,
        });
    }
    let vehicle_id = booking.vehicle_id.ok_or(BookingError::MissingField {
        booking_id: booking.id,
        field: "vehicle",
    })?;
    checker.ensure_category(vehicle_id, booking.kind.category())?;
    // becoming occupying: no other occupying booking may overlap
    checker.ensure_free(vehicle_id, &booking.period, Some(booking.id), Occupancy::Occupying)?;

    plan.effects.push(SideEffect::GenerateContractDocument);
    Ok(())
}

fn plan_delivery(
    booking: &Booking,
    record: HandoverRecord,
    checker: &AvailabilityChecker<'_>,
    plan: &mut TransitionPlan,
) -> Result<()> {
    let vehicle_id = booking.vehicle_id.ok_or(BookingError::MissingField {
        booking_id: booking.id,
        field: "vehicle",
    })?;
    match checker.ensure_status_available(vehicle_id) {
        Ok(_) => {}
        // reserved for this very booking
        Err(BookingError::VehicleNotAvailable {
            status: VehicleStatus::Reserved,
            ..
        }) => {}
        Err(err) => return Err(err),
    }

    plan.delivery = Some(record);
    plan.effects.push(SideEffect::SetVehicleStatus {
        vehicle_id,
        status: VehicleStatus::Rented,
    });
    Ok(())
}

fn plan_return(booking: &Booking, record: HandoverRecord, plan: &mut TransitionPlan) -> Result<()> {
    if let Some(delivery) = &booking.delivery {
        if record.mileage_km < delivery.mileage_km {
            return Err(BookingError::InvalidReturnRecord {
                booking_id: booking.id,
                message: format!(
                    "mileage {} km below delivery mileage {} km",
                    record.mileage_km, delivery.mileage_km
                ),
            });
        }
        if record.at < delivery.at {
            return Err(BookingError::InvalidReturnRecord {
                booking_id: booking.id,
                message: format!("returned at {} before delivery at {}", record.at, delivery.at),
            });
        }
    }
    plan.return_record = Some(record);
    Ok(())
}

fn plan_close(booking: &Booking, policies: &BookingPolicies, plan: &mut TransitionPlan) -> Result<()> {
    if booking.deposit.is_held() {
        if policies.require_deposit_disposition_before_close {
            return Err(BookingError::DepositNotSettled {
                booking_id: booking.id,
            });
        }
        plan.effects.push(SideEffect::FlagDepositDisposition {
            amount: booking.deposit.amount,
        });
    }
    if let Some(vehicle_id) = booking.vehicle_id {
        plan.effects.push(SideEffect::ReleaseVehicle { vehicle_id });
    }
    Ok(())
}
