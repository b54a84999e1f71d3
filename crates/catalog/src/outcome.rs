//! Business-rule outcomes.
//!
//! A rejected transition or an inapplicable promo code is a normal result,
//! not an error. Callers that only care whether something happened use
//! [`Outcome::applied`]; the [`Rejection`] keeps the real cause for logs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::plate::PlateStatus;

/// Why an operation did not apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    /// No plate with the requested id.
    NotFound,
    /// The plate exists but its status does not allow the operation.
    WrongState { status: PlateStatus },
    /// The discounted price fell under the minimum allowed sale price.
    BelowPriceFloor { quoted: Decimal, floor: Decimal },
}

impl core::fmt::Display for Rejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Rejection::NotFound => f.write_str("plate not found"),
            Rejection::WrongState { status } => write!(f, "plate is {status}"),
            Rejection::BelowPriceFloor { quoted, floor } => {
                write!(f, "quoted price {quoted} is below the floor {floor}")
            }
        }
    }
}

/// Result of a lifecycle operation or price quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Applied(T),
    NotApplicable(Rejection),
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    /// Collapse to `Option`, treating every rejection alike.
    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(v) => Some(v),
            Outcome::NotApplicable(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Outcome::Applied(_) => None,
            Outcome::NotApplicable(r) => Some(*r),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Applied(v) => Outcome::Applied(f(v)),
            Outcome::NotApplicable(r) => Outcome::NotApplicable(r),
        }
    }
}
