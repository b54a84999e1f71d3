//! Promo-code price quotes and sales figures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::plate::Plate;

/// Promo codes understood by the catalog.
///
/// Codes are matched exactly (case-sensitive). Anything else is `Unrecognized`
/// and leaves the price unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromoCode {
    /// `DISCOUNT`: a flat 25 off.
    FlatDiscount,
    /// `PERCENTOFF`: 15% off.
    PercentOff,
    Unrecognized(String),
}

impl PromoCode {
    pub fn parse(code: &str) -> Self {
        match code {
            "DISCOUNT" => PromoCode::FlatDiscount,
            "PERCENTOFF" => PromoCode::PercentOff,
            other => PromoCode::Unrecognized(other.to_string()),
        }
    }

    /// Price after applying the code, before any floor check.
    ///
    /// `None` when the arithmetic leaves the representable range.
    pub fn apply(&self, price: Decimal) -> Option<Decimal> {
        match self {
            PromoCode::FlatDiscount => price.checked_sub(Decimal::new(25, 0)),
            PromoCode::PercentOff => price.checked_mul(Decimal::new(85, 2)),
            PromoCode::Unrecognized(_) => Some(price),
        }
    }
}

/// A quote that would undercut the minimum sale price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceFloorBreach {
    pub quoted: Decimal,
    pub floor: Decimal,
}

/// Why a quote could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteError {
    BelowFloor(PriceFloorBreach),
    /// Price or floor arithmetic overflowed.
    Overflow,
}

/// Minimum-price rule applied to every promo quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Lowest quote allowed, as a percentage of the list price.
    pub floor_percent: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        // Highest floor that still accepts DISCOUNT (175) and PERCENTOFF (170)
        // on a 200 plate. A 90% floor refuses both.
        Self::with_floor_percent(Decimal::new(85, 0))
    }
}

impl PricingPolicy {
    pub fn with_floor_percent(floor_percent: Decimal) -> Self {
        Self { floor_percent }
    }

    /// Lowest price `list_price` may be quoted at; `None` on overflow.
    pub fn floor(&self, list_price: Decimal) -> Option<Decimal> {
        list_price
            .checked_mul(self.floor_percent)?
            .checked_div(Decimal::ONE_HUNDRED)
    }

    /// Quote `list_price` under `code`, refusing anything below [`Self::floor`].
    pub fn quote(&self, list_price: Decimal, code: &PromoCode) -> Result<Decimal, QuoteError> {
        let quoted = code.apply(list_price).ok_or(QuoteError::Overflow)?;
        let floor = self.floor(list_price).ok_or(QuoteError::Overflow)?;
        if quoted < floor {
            return Err(QuoteError::BelowFloor(PriceFloorBreach { quoted, floor }));
        }
        Ok(quoted)
    }
}

/// Overflow-checked sum; `None` once the total leaves the `Decimal` range.
pub fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

/// Sum of sale prices over sold plates. `None` on overflow.
pub fn total_revenue<'a>(plates: impl IntoIterator<Item = &'a Plate>) -> Option<Decimal> {
    checked_sum(
        plates
            .into_iter()
            .filter(|p| p.is_sold())
            .map(Plate::sale_price),
    )
}

/// Mean profit margin (percent of sale price) over sold plates.
///
/// Sold plates with a zero sale price have no defined margin and are left
/// out of the mean. Returns zero when nothing qualifies, `None` on overflow.
pub fn average_profit_margin<'a>(plates: impl IntoIterator<Item = &'a Plate>) -> Option<Decimal> {
    let mut margins = Vec::new();
    for plate in plates.into_iter().filter(|p| p.is_sold()) {
        if plate.sale_price().is_zero() {
            continue;
        }
        let margin = plate
            .sale_price()
            .checked_sub(plate.purchase_price())?
            .checked_div(plate.sale_price())?
            .checked_mul(Decimal::ONE_HUNDRED)?;
        margins.push(margin);
    }

    if margins.is_empty() {
        return Some(Decimal::ZERO);
    }

    let count = Decimal::from(margins.len() as u64);
    checked_sum(margins)?.checked_div(count)
}
