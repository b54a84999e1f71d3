//! Catalog configuration loaded from the environment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const MAX_PAGE_SIZE_VAR: &str = "PLATES_MAX_PAGE_SIZE";
pub const COMMIT_RETRIES_VAR: &str = "PLATES_COMMIT_RETRIES";
pub const NOTIFY_UNRESERVE_VAR: &str = "PLATES_NOTIFY_UNRESERVE";
pub const PRICE_FLOOR_PERCENT_VAR: &str = "PLATES_PRICE_FLOOR_PERCENT";

/// Runtime knobs for the catalog engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Larger page sizes are clamped to this.
    pub max_page_size: u32,
    /// Extra attempts after a commit conflict before giving up.
    pub commit_retries: u32,
    /// Publish a notification when a reservation is released.
    pub notify_on_unreserve: bool,
    /// Lowest promo quote, as a percentage of the sale price.
    pub price_floor_percent: Decimal,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_page_size: 1000,
            commit_retries: 3,
            notify_on_unreserve: false,
            // PERCENTOFF on a 200 plate quotes 170, exactly 85%.
            price_floor_percent: Decimal::new(85, 0),
        }
    }
}

impl CatalogConfig {
    /// Read from process environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary key lookup (used by `from_env` and tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_page_size: parse_or(&lookup, MAX_PAGE_SIZE_VAR, defaults.max_page_size),
            commit_retries: parse_or(&lookup, COMMIT_RETRIES_VAR, defaults.commit_retries),
            notify_on_unreserve: parse_or(
                &lookup,
                NOTIFY_UNRESERVE_VAR,
                defaults.notify_on_unreserve,
            ),
            price_floor_percent: parse_or(
                &lookup,
                PRICE_FLOOR_PERCENT_VAR,
                defaults.price_floor_percent,
            ),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: core::str::FromStr + core::fmt::Debug,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, ?default, "invalid config value; using default");
                default
            }
        },
    }
}
