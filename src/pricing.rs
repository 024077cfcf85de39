//! Booking totals.
//!
//! Every path that changes dates, rate, surcharge, discount, payments or the
//! assigned vehicle recomputes totals through [`compute_totals`]; nothing else
//! does arithmetic on booking amounts.

use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::period::RentalPeriod;

/// inputs of the calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingInput {
    pub daily_rate: Money,
    pub period: RentalPeriod,
    pub surcharge: Money,
    pub discount: Money,
}

/// derived figures of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Totals {
    pub duration_days: u32,
    pub subtotal: Money,
    pub total: Money,
    pub paid: Money,
    /// `total - paid`; negative when the client overpaid
    pub remaining: Money,
}

impl Totals {
    pub fn is_overpaid(&self) -> bool {
        self.remaining.is_negative()
    }

    pub fn is_settled(&self) -> bool {
        self.remaining.is_zero()
    }

    /// amount owed back to the client, zero unless overpaid
    pub fn overpayment(&self) -> Money {
        if self.is_overpaid() {
            self.remaining.abs()
        } else {
            Money::ZERO
        }
    }
}

/// pure, idempotent totals computation
///
/// Negative totals are returned as-is; rejecting them is the caller's job.
pub fn compute_totals<I>(input: &PricingInput, payments: I) -> Totals
where
    I: IntoIterator<Item = Money>,
{
    let duration_days = input.period.duration_days();
    let subtotal = input.daily_rate.times_days(duration_days);
    let total = subtotal + input.surcharge - input.discount;
    let paid: Money = payments.into_iter().sum();

    Totals {
        duration_days,
        subtotal,
        total,
        paid,
        remaining: total - paid,
    }
}
