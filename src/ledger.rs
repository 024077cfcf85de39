use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{BookingError, Result};
use crate::pricing::Totals;
use crate::types::{BookingId, PaymentId, PaymentMethod};

/// payment request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub booking_id: BookingId,
    pub amount: Money,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub check_number: Option<String>,
    pub bank: Option<String>,
}

impl PaymentRequest {
    pub fn new(booking_id: BookingId, amount: Money, date: NaiveDate, method: PaymentMethod) -> Self {
        Self {
            booking_id,
            amount,
            date,
            method,
            check_number: None,
            bank: None,
        }
    }

    /// cheque details, kept as given
    pub fn with_check(mut self, number: impl Into<String>, bank: impl Into<String>) -> Self {
        self.check_number = Some(number.into());
        self.bank = Some(bank.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_positive() {
            return Err(BookingError::InvalidPaymentAmount {
                amount: self.amount,
            });
        }
        Ok(())
    }
}

/// a recorded payment, immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub booking_id: BookingId,
    pub amount: Money,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub check_number: Option<String>,
    pub bank: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl Payment {
    pub fn from_request(request: PaymentRequest, recorded_at: DateTime<Utc>) -> Result<Self> {
        request.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            booking_id: request.booking_id,
            amount: request.amount,
            date: request.date,
            method: request.method,
            check_number: request.check_number,
            bank: request.bank,
            recorded_at,
        })
    }
}

/// result of recording a payment
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub totals: Totals,
    /// payments now exceed the total
    pub overpaid: bool,
}

/// append-only payment history for all bookings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentLedger {
    payments: Vec<Payment>,
}

impl PaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_payments(payments: Vec<Payment>) -> Self {
        Self { payments }
    }

    pub fn record(&mut self, payment: Payment) {
        self.payments.push(payment);
    }

    /// payments of a booking in recording order
    pub fn for_booking(&self, booking_id: BookingId) -> impl Iterator<Item = &Payment> + '_ {
        self.payments.iter().filter(move |p| p.booking_id == booking_id)
    }

    pub fn amounts_for(&self, booking_id: BookingId) -> impl Iterator<Item = Money> + '_ {
        self.for_booking(booking_id).map(|p| p.amount)
    }

    pub fn total_for(&self, booking_id: BookingId) -> Money {
        self.amounts_for(booking_id).sum()
    }

    pub fn all(&self) -> &[Payment] {
        &self.payments
    }

    pub fn len(&self) -> usize {
        self.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }
}
