//! Rental engine: the one entry point for bookings, payments and fleet status.
//!
//! All state sits behind a single lock. Mutations hold the write lock from the
//! availability check through the commit, and stage their changes on copies so
//! a failing step leaves nothing behind.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::availability::{AvailabilityChecker, Occupancy};
use crate::booking::{Booking, Deposit};
use crate::calendar::{CalendarBar, CalendarMonth};
use crate::config::{EngineConfig, OverpaymentPolicy};
use crate::decimal::Money;
use crate::documents::DocumentGenerator;
use crate::errors::{BookingError, Result};
use crate::events::{Event, EventStore};
use crate::fleet::{Fleet, Vehicle};
use crate::ledger::{Payment, PaymentLedger, PaymentReceipt, PaymentRequest};
use crate::lifecycle::{plan_transition, SideEffect, TransitionPayload};
use crate::period::RentalPeriod;
use crate::pricing::{compute_totals, Totals};
use crate::substitution::{plan_substitution, SubstitutionRequest, VehicleSubstitutionEvent};
use crate::types::{
    BookingId, BookingKind, BookingState, ClientId, DepositStatus, InsurerId, VehicleId,
    VehicleStatus,
};

/// booking creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub kind: BookingKind,
    pub client_id: Option<ClientId>,
    pub vehicle_id: Option<VehicleId>,
    pub period: RentalPeriod,
    pub daily_rate: Money,
    pub surcharge: Money,
    pub discount: Money,
    pub deposit: Money,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
}

impl NewBooking {
    pub fn new(client_id: ClientId, vehicle_id: VehicleId, period: RentalPeriod, daily_rate: Money) -> Self {
        Self {
            kind: BookingKind::Standard,
            client_id: Some(client_id),
            vehicle_id: Some(vehicle_id),
            period,
            daily_rate,
            surcharge: Money::ZERO,
            discount: Money::ZERO,
            deposit: Money::ZERO,
            pickup_location: None,
            dropoff_location: None,
        }
    }

    /// insurer-funded booking billed at the insurer's rate category
    pub fn assistance(mut self, insurer_id: InsurerId, rate_category: impl Into<String>) -> Self {
        self.kind = BookingKind::Assistance {
            insurer_id: Some(insurer_id),
            rate_category: Some(rate_category.into()),
        };
        self
    }

    pub fn with_surcharge(mut self, surcharge: Money) -> Self {
        self.surcharge = surcharge;
        self
    }

    pub fn with_discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_deposit(mut self, deposit: Money) -> Self {
        self.deposit = deposit;
        self
    }

    pub fn with_locations(mut self, pickup: impl Into<String>, dropoff: impl Into<String>) -> Self {
        self.pickup_location = Some(pickup.into());
        self.dropoff_location = Some(dropoff.into());
        self
    }

    fn validate(&self, booking_id: BookingId) -> Result<VehicleId> {
        let vehicle_id = self.vehicle_id.ok_or(BookingError::MissingField {
            booking_id,
            field: "vehicle",
        })?;
        if !self.daily_rate.is_positive() {
            return Err(BookingError::InvalidDailyRate {
                rate: self.daily_rate,
            });
        }
        ensure_non_negative("surcharge", self.surcharge)?;
        ensure_non_negative("discount", self.discount)?;
        ensure_non_negative("deposit", self.deposit)?;
        Ok(vehicle_id)
    }
}

fn ensure_non_negative(field: &'static str, amount: Money) -> Result<()> {
    if amount.is_negative() {
        return Err(BookingError::InvalidAmount { field, amount });
    }
    Ok(())
}

fn ensure_total(booking: &Booking) -> Result<()> {
    if booking.totals.total.is_negative() {
        return Err(BookingError::NegativeTotal {
            booking_id: booking.id,
            total: booking.totals.total,
        });
    }
    Ok(())
}

/// serializable copy of everything the engine persists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub fleet: Fleet,
    pub bookings: Vec<Booking>,
    pub payments: Vec<Payment>,
    /// last sequence number issued per `<prefix>-<year>`
    pub sequences: BTreeMap<String, u32>,
}

#[derive(Debug, Default)]
struct Registry {
    fleet: Fleet,
    bookings: BTreeMap<BookingId, Booking>,
    ledger: PaymentLedger,
    sequences: BTreeMap<String, u32>,
    events: EventStore,
}

impl Registry {
    fn booking(&self, id: BookingId) -> Result<&Booking> {
        self.bookings
            .get(&id)
            .ok_or(BookingError::BookingNotFound { id })
    }

    fn checker(&self) -> AvailabilityChecker<'_> {
        AvailabilityChecker::new(&self.fleet, self.bookings.values())
    }

    fn next_reference(&mut self, config: &EngineConfig, assistance: bool, year: i32) -> String {
        let prefix = if assistance {
            &config.reference.assistance_prefix
        } else {
            &config.reference.standard_prefix
        };
        let counter = self.sequences.entry(format!("{prefix}-{year}")).or_insert(0);
        *counter += 1;
        config.reference.format(assistance, year, *counter)
    }

    fn commit_vehicle_status(&mut self, vehicle_id: VehicleId, status: VehicleStatus, timestamp: DateTime<Utc>) {
        let Ok(old_status) = self.fleet.set_status(vehicle_id, status) else {
            return;
        };
        if old_status != status {
            info!(
                vehicle_id = %vehicle_id,
                old_status = %old_status,
                new_status = %status,
                "vehicle status changed"
            );
            self.events.emit(Event::VehicleStatusChanged {
                vehicle_id,
                old_status,
                new_status: status,
                timestamp,
            });
        }
    }

    /// recompute the cached status of one vehicle from committed bookings
    fn project_vehicle(&mut self, vehicle_id: VehicleId, today: NaiveDate, timestamp: DateTime<Utc>) {
        let projected = self.checker().projected_status(vehicle_id, today);
        if let Ok(status) = projected {
            self.commit_vehicle_status(vehicle_id, status, timestamp);
        }
    }

    fn replace_booking(&mut self, booking: Booking) {
        self.bookings.insert(booking.id, booking);
    }
}

/// engine holding fleet, bookings and payments
pub struct RentalEngine {
    config: EngineConfig,
    documents: Arc<dyn DocumentGenerator>,
    inner: RwLock<Registry>,
}

impl RentalEngine {
    pub fn new(config: EngineConfig, documents: Arc<dyn DocumentGenerator>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            documents,
            inner: RwLock::new(Registry::default()),
        })
    }

    /// restore from a persisted state, refusing one that breaks an invariant
    pub fn from_state(
        config: EngineConfig,
        documents: Arc<dyn DocumentGenerator>,
        state: EngineState,
    ) -> Result<Self> {
        config.validate()?;
        let mut registry = Registry {
            fleet: state.fleet,
            bookings: BTreeMap::new(),
            ledger: PaymentLedger::from_payments(state.payments),
            sequences: state.sequences,
            events: EventStore::new(),
        };
        for mut booking in state.bookings {
            if let Some(vehicle_id) = booking.vehicle_id {
                registry.fleet.get(vehicle_id).map_err(|_| BookingError::InconsistentState {
                    message: format!("booking {} refers to unknown vehicle {}", booking.id, vehicle_id),
                })?;
            }
            let amounts_valid = booking.daily_rate.is_positive()
                && !booking.surcharge.is_negative()
                && !booking.discount.is_negative()
                && !booking.deposit.amount.is_negative();
            if !amounts_valid {
                return Err(BookingError::InconsistentState {
                    message: format!("booking {} carries a negative amount or a non-positive rate", booking.id),
                });
            }
            booking.recompute_totals(registry.ledger.amounts_for(booking.id));
            if registry.bookings.insert(booking.id, booking).is_some() {
                return Err(BookingError::InconsistentState {
                    message: "duplicate booking id".to_string(),
                });
            }
        }
        if let Some(orphan) = registry
            .ledger
            .all()
            .iter()
            .find(|p| !registry.bookings.contains_key(&p.booking_id))
        {
            return Err(BookingError::InconsistentState {
                message: format!("payment {} refers to unknown booking {}", orphan.id, orphan.booking_id),
            });
        }
        if let Some(payment) = registry.ledger.all().iter().find(|p| !p.amount.is_positive()) {
            return Err(BookingError::InconsistentState {
                message: format!("payment {} has non-positive amount {}", payment.id, payment.amount),
            });
        }
        {
            let checker = registry.checker();
            for booking in registry.bookings.values().filter(|b| b.state.is_occupying()) {
                if let Some(vehicle_id) = booking.vehicle_id {
                    if let Some(other) =
                        checker.conflicting_booking(vehicle_id, &booking.period, Some(booking.id), Occupancy::Occupying)
                    {
                        return Err(BookingError::InconsistentState {
                            message: format!(
                                "bookings {} and {} overlap on vehicle {}",
                                booking.id, other.id, vehicle_id
                            ),
                        });
                    }
                }
            }
        }

        info!(
            vehicles = registry.fleet.len(),
            bookings = registry.bookings.len(),
            payments = registry.ledger.len(),
            "engine state restored"
        );
        Ok(Self {
            config,
            documents,
            inner: RwLock::new(registry),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // fleet

    pub fn add_vehicle(&self, vehicle: Vehicle) -> Result<VehicleId> {
        let mut registry = self.write();
        let id = registry.fleet.insert(vehicle)?;
        info!(vehicle_id = %id, "vehicle added");
        Ok(id)
    }

    pub fn vehicle(&self, id: VehicleId) -> Result<Vehicle> {
        self.read().fleet.get(id).cloned()
    }

    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.read().fleet.iter().cloned().collect()
    }

    /// manual status change by fleet administration
    pub fn set_vehicle_status(
        &self,
        vehicle_id: VehicleId,
        status: VehicleStatus,
        time_provider: &SafeTimeProvider,
    ) -> Result<VehicleStatus> {
        let mut registry = self.write();
        let previous = registry.fleet.status(vehicle_id)?;
        if status == VehicleStatus::Available {
            if let Some(holder) = registry.checker().holder(vehicle_id) {
                return Err(BookingError::VehicleInUse {
                    vehicle_id,
                    booking_id: holder.id,
                });
            }
        }
        registry.commit_vehicle_status(vehicle_id, status, time_provider.now());
        Ok(previous)
    }

    /// re-project every vehicle's cached status; returns the vehicles that changed
    pub fn refresh_vehicle_statuses(&self, today: NaiveDate, time_provider: &SafeTimeProvider) -> Vec<VehicleId> {
        let mut registry = self.write();
        let now = time_provider.now();
        let changes: Vec<(VehicleId, VehicleStatus)> = {
            let checker = registry.checker();
            registry
                .fleet
                .iter()
                .filter_map(|v| {
                    let projected = checker.projected_status(v.id, today).ok()?;
                    (projected != v.status).then_some((v.id, projected))
                })
                .collect()
        };
        for (vehicle_id, status) in &changes {
            registry.commit_vehicle_status(*vehicle_id, *status, now);
        }
        debug!(%today, changed = changes.len(), "vehicle statuses refreshed");
        changes.into_iter().map(|(id, _)| id).collect()
    }

    // availability

    pub fn check_availability(&self, period: &RentalPeriod, category: Option<&str>) -> Vec<VehicleId> {
        let registry = self.read();
        let available = registry.checker().find_available(period, category);
        available.into_iter().collect()
    }

    pub fn calendar(&self, month: &CalendarMonth) -> Vec<CalendarBar> {
        let registry = self.read();
        month.project(registry.bookings.values())
    }

    // bookings

    /// create a booking in draft
    pub fn create_booking(&self, request: NewBooking, time_provider: &SafeTimeProvider) -> Result<Booking> {
        let booking_id = Uuid::new_v4();
        let vehicle_id = request.validate(booking_id)?;

        let mut registry = self.write();
        let now = time_provider.now();
        {
            let checker = registry.checker();
            let vehicle = registry.fleet.get(vehicle_id)?;
            if vehicle.status.is_manual() {
                return Err(BookingError::VehicleNotAvailable {
                    vehicle_id,
                    status: vehicle.status,
                });
            }
            checker.ensure_category(vehicle_id, request.kind.category())?;
            let occupancy = if self.config.policies.drafts_claim_vehicle {
                Occupancy::Claimed
            } else {
                Occupancy::Occupying
            };
            checker
                .ensure_free(vehicle_id, &request.period, None, occupancy)
                .map_err(|err| {
                    warn!(vehicle_id = %vehicle_id, error = %err, "double booking rejected");
                    err
                })?;
        }

        let mut booking = Booking {
            id: booking_id,
            reference: String::new(),
            kind: request.kind,
            client_id: request.client_id,
            vehicle_id: Some(vehicle_id),
            period: request.period,
            pickup_location: request.pickup_location,
            dropoff_location: request.dropoff_location,
            daily_rate: request.daily_rate,
            surcharge: request.surcharge,
            discount: request.discount,
            deposit: Deposit::held(request.deposit),
            totals: Totals::default(),
            state: BookingState::Draft,
            delivery: None,
            return_record: None,
            contract_document: None,
            cancellation_reason: None,
            substitutions: Vec::new(),
            created_at: now,
            last_state_change: now,
        };
        booking.recompute_totals(std::iter::empty::<Money>());
        ensure_total(&booking)?;
        booking.reference = registry.next_reference(&self.config, booking.kind.is_assistance(), now.year());

        registry.events.emit(Event::BookingCreated {
            booking_id,
            reference: booking.reference.clone(),
            vehicle_id: booking.vehicle_id,
            start: booking.period.start(),
            end: booking.period.end(),
            total: booking.totals.total,
            timestamp: now,
        });
        info!(
            booking_id = %booking_id,
            reference = %booking.reference,
            vehicle_id = %vehicle_id,
            total = %booking.totals.total,
            "booking created"
        );
        registry.replace_booking(booking.clone());
        Ok(booking)
    }

    /// move a booking to `to`, running the transition's side effects
    pub fn transition(
        &self,
        booking_id: BookingId,
        to: BookingState,
        payload: TransitionPayload,
        time_provider: &SafeTimeProvider,
    ) -> Result<Booking> {
        let mut registry = self.write();
        let now = time_provider.now();
        let current = registry.booking(booking_id)?;
        let plan = plan_transition(current, to, payload, &registry.checker(), &self.config.policies)
            .map_err(|err| {
                warn!(booking_id = %booking_id, from = %current.state, to = %to, error = %err, "transition refused");
                err
            })?;
        let mut staged = current.clone();

        // the only fallible effect runs before anything is committed
        if plan.effects.contains(&SideEffect::GenerateContractDocument) {
            let document = self
                .documents
                .generate_contract(&staged)
                .map_err(|message| BookingError::DocumentGeneration {
                    booking_id,
                    message,
                })?;
            staged.contract_document = Some(document);
        }

        plan.apply_to(&mut staged, now);
        registry.replace_booking(staged.clone());
        registry.events.emit(Event::StateChanged {
            booking_id,
            old_state: plan.from,
            new_state: plan.to,
            timestamp: now,
        });

        for effect in &plan.effects {
            match effect {
                SideEffect::GenerateContractDocument => {
                    if let Some(document) = &staged.contract_document {
                        registry.events.emit(Event::ContractDocumentGenerated {
                            booking_id,
                            document: document.name.clone(),
                            timestamp: now,
                        });
                    }
                }
                SideEffect::SetVehicleStatus { vehicle_id, status } => {
                    registry.commit_vehicle_status(*vehicle_id, *status, now);
                }
                SideEffect::ReleaseVehicle { vehicle_id } => {
                    registry.project_vehicle(*vehicle_id, now.date_naive(), now);
                }
                SideEffect::FlagDepositDisposition { amount } => {
                    warn!(booking_id = %booking_id, deposit = %amount, "closed with deposit still held");
                    registry.events.emit(Event::DepositDispositionRequired {
                        booking_id,
                        amount: *amount,
                        timestamp: now,
                    });
                }
            }
        }

        info!(
            booking_id = %booking_id,
            reference = %staged.reference,
            from = %plan.from,
            to = %plan.to,
            "booking transitioned"
        );
        Ok(staged)
    }

    /// move the whole rental period of a draft or validated booking
    pub fn reschedule(
        &self,
        booking_id: BookingId,
        period: RentalPeriod,
        time_provider: &SafeTimeProvider,
    ) -> Result<Booking> {
        let mut registry = self.write();
        let current = registry.booking(booking_id)?;
        if !current.state.is_editable() {
            return Err(BookingError::OperationNotAllowed {
                booking_id,
                operation: "reschedule",
                state: current.state,
            });
        }
        self.change_period(&mut registry, booking_id, period, time_provider.now())
    }

    /// move the end date, also while the vehicle is out
    pub fn extend(
        &self,
        booking_id: BookingId,
        new_end: NaiveDate,
        time_provider: &SafeTimeProvider,
    ) -> Result<Booking> {
        let mut registry = self.write();
        let current = registry.booking(booking_id)?;
        if !(current.state.is_editable() || current.state == BookingState::Delivered) {
            return Err(BookingError::OperationNotAllowed {
                booking_id,
                operation: "extend",
                state: current.state,
            });
        }
        let period = current.period.with_end(new_end)?;
        self.change_period(&mut registry, booking_id, period, time_provider.now())
    }

    fn change_period(
        &self,
        registry: &mut Registry,
        booking_id: BookingId,
        period: RentalPeriod,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        let current = registry.booking(booking_id)?;
        if let Some(vehicle_id) = current.vehicle_id {
            let occupancy = if current.state == BookingState::Draft && self.config.policies.drafts_claim_vehicle {
                Occupancy::Claimed
            } else {
                Occupancy::Occupying
            };
            registry
                .checker()
                .ensure_free(vehicle_id, &period, Some(booking_id), occupancy)?;
        }

        let mut staged = current.clone();
        staged.period = period;
        staged.recompute_totals(registry.ledger.amounts_for(booking_id));
        ensure_total(&staged)?;

        registry.events.emit(Event::BookingRescheduled {
            booking_id,
            start: period.start(),
            end: period.end(),
            new_total: staged.totals.total,
            timestamp: now,
        });
        info!(
            booking_id = %booking_id,
            start = %period.start(),
            end = %period.end(),
            total = %staged.totals.total,
            "booking rescheduled"
        );
        registry.replace_booking(staged.clone());
        Ok(staged)
    }

    /// replace surcharge and discount before the vehicle comes back
    pub fn adjust_pricing(
        &self,
        booking_id: BookingId,
        surcharge: Money,
        discount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<Booking> {
        ensure_non_negative("surcharge", surcharge)?;
        ensure_non_negative("discount", discount)?;

        let mut registry = self.write();
        let current = registry.booking(booking_id)?;
        if !(current.state.is_editable() || current.state == BookingState::Delivered) {
            return Err(BookingError::OperationNotAllowed {
                booking_id,
                operation: "adjust pricing",
                state: current.state,
            });
        }
        let mut staged = current.clone();
        staged.surcharge = surcharge;
        staged.discount = discount;
        staged.recompute_totals(registry.ledger.amounts_for(booking_id));
        ensure_total(&staged)?;

        let now = time_provider.now();
        registry.events.emit(Event::PricingAdjusted {
            booking_id,
            surcharge,
            discount,
            new_total: staged.totals.total,
            timestamp: now,
        });
        info!(booking_id = %booking_id, total = %staged.totals.total, "pricing adjusted");
        registry.replace_booking(staged.clone());
        Ok(staged)
    }

    /// refund or consume the deposit once the vehicle is back
    pub fn settle_deposit(
        &self,
        booking_id: BookingId,
        disposition: DepositStatus,
        time_provider: &SafeTimeProvider,
    ) -> Result<Booking> {
        if disposition == DepositStatus::Held {
            return Err(BookingError::InvalidDisposition {
                booking_id,
                status: disposition,
            });
        }
        let mut registry = self.write();
        let current = registry.booking(booking_id)?;
        if !matches!(
            current.state,
            BookingState::Returned | BookingState::Closed | BookingState::Cancelled
        ) {
            return Err(BookingError::OperationNotAllowed {
                booking_id,
                operation: "settle deposit",
                state: current.state,
            });
        }
        if current.deposit.status != DepositStatus::Held {
            return Err(BookingError::DepositAlreadySettled {
                booking_id,
                status: current.deposit.status,
            });
        }

        let mut staged = current.clone();
        staged.deposit.status = disposition;
        let now = time_provider.now();
        registry.events.emit(Event::DepositSettled {
            booking_id,
            amount: staged.deposit.amount,
            status: disposition,
            timestamp: now,
        });
        info!(
            booking_id = %booking_id,
            amount = %staged.deposit.amount,
            disposition = ?disposition,
            "deposit settled"
        );
        registry.replace_booking(staged.clone());
        Ok(staged)
    }

    // payments

    pub fn record_payment(&self, request: PaymentRequest, time_provider: &SafeTimeProvider) -> Result<PaymentReceipt> {
        request.validate()?;
        let booking_id = request.booking_id;

        let mut registry = self.write();
        let current = registry.booking(booking_id)?;
        match current.state {
            BookingState::Cancelled => return Err(BookingError::BookingCancelled { booking_id }),
            BookingState::Closed if !self.config.policies.accept_payments_after_close => {
                return Err(BookingError::OperationNotAllowed {
                    booking_id,
                    operation: "record payment",
                    state: current.state,
                })
            }
            _ => {}
        }

        let projected = compute_totals(
            &current.pricing_input(),
            registry
                .ledger
                .amounts_for(booking_id)
                .chain(std::iter::once(request.amount)),
        );
        if projected.is_overpaid() && self.config.policies.overpayment == OverpaymentPolicy::Reject {
            warn!(booking_id = %booking_id, amount = %request.amount, "overpayment rejected");
            return Err(BookingError::Overpayment {
                booking_id,
                amount: request.amount,
                remaining: current.totals.remaining,
            });
        }

        let now = time_provider.now();
        let payment = Payment::from_request(request, now)?;
        let mut staged = current.clone();
        registry.ledger.record(payment.clone());
        let totals = staged.recompute_totals(registry.ledger.amounts_for(booking_id));
        registry.replace_booking(staged);

        registry.events.emit(Event::PaymentRecorded {
            booking_id,
            payment_id: payment.id,
            amount: payment.amount,
            remaining: totals.remaining,
            timestamp: now,
        });
        info!(
            booking_id = %booking_id,
            payment_id = %payment.id,
            amount = %payment.amount,
            remaining = %totals.remaining,
            "payment recorded"
        );
        let overpaid = totals.is_overpaid();
        if overpaid {
            warn!(booking_id = %booking_id, excess = %totals.overpayment(), "booking overpaid");
            registry.events.emit(Event::OverpaymentFlagged {
                booking_id,
                excess: totals.overpayment(),
                timestamp: now,
            });
        }
        Ok(PaymentReceipt {
            payment,
            totals,
            overpaid,
        })
    }

    // substitution

    /// swap the vehicle of a validated or delivered booking
    pub fn substitute_vehicle(
        &self,
        request: SubstitutionRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<Booking> {
        let booking_id = request.booking_id;
        let mut registry = self.write();
        let now = time_provider.now();
        let current = registry.booking(booking_id)?;
        let plan = plan_substitution(current, request, &registry.checker(), now).map_err(|err| {
            warn!(booking_id = %booking_id, error = %err, "substitution refused");
            err
        })?;

        let mut staged = current.clone();
        plan.apply_to(&mut staged);
        staged.recompute_totals(registry.ledger.amounts_for(booking_id));
        ensure_total(&staged)?;

        let record = plan.record;
        registry.replace_booking(staged.clone());
        registry.project_vehicle(record.old_vehicle_id, now.date_naive(), now);
        registry.project_vehicle(record.new_vehicle_id, now.date_naive(), now);
        registry.events.emit(Event::VehicleSubstituted {
            booking_id,
            old_vehicle_id: record.old_vehicle_id,
            new_vehicle_id: record.new_vehicle_id,
            reason: record.reason,
            new_total: staged.totals.total,
            timestamp: now,
        });
        info!(
            booking_id = %booking_id,
            old_vehicle_id = %record.old_vehicle_id,
            new_vehicle_id = %record.new_vehicle_id,
            reason = ?record.reason,
            total = %staged.totals.total,
            "vehicle substituted"
        );
        Ok(staged)
    }

    // queries

    pub fn booking(&self, id: BookingId) -> Result<Booking> {
        self.read().booking(id).cloned()
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.read().bookings.values().cloned().collect()
    }

    pub fn bookings_for_vehicle(&self, vehicle_id: VehicleId) -> Vec<Booking> {
        self.read()
            .bookings
            .values()
            .filter(|b| b.vehicle_id == Some(vehicle_id))
            .cloned()
            .collect()
    }

    /// totals recomputed from the ledger, not the cached copy
    pub fn get_totals(&self, booking_id: BookingId) -> Result<Totals> {
        let registry = self.read();
        let booking = registry.booking(booking_id)?;
        Ok(compute_totals(
            &booking.pricing_input(),
            registry.ledger.amounts_for(booking_id),
        ))
    }

    pub fn payments(&self, booking_id: BookingId) -> Result<Vec<Payment>> {
        let registry = self.read();
        registry.booking(booking_id)?;
        Ok(registry.ledger.for_booking(booking_id).cloned().collect())
    }

    pub fn substitutions(&self, booking_id: BookingId) -> Result<Vec<VehicleSubstitutionEvent>> {
        self.read().booking(booking_id).map(|b| b.substitutions.clone())
    }

    pub fn take_events(&self) -> Vec<Event> {
        self.write().events.take_events()
    }

    pub fn export_state(&self) -> EngineState {
        let registry = self.read();
        EngineState {
            fleet: registry.fleet.clone(),
            bookings: registry.bookings.values().cloned().collect(),
            payments: registry.ledger.all().to_vec(),
            sequences: registry.sequences.clone(),
        }
    }
}
