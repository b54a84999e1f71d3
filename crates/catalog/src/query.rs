//! Catalog query vocabulary: filter, ordering and pagination.
//!
//! These are plain criteria handed to a store, so the store never sees raw
//! query strings and every backend applies the same matching rules.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use plates_core::{DomainError, DomainResult};

use crate::plate::{Plate, PlateStatus};

/// Which plates a listing, count or aggregate looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateFilter {
    /// Fuzzy name search; `None` or empty matches everything.
    pub search: Option<String>,
    /// Restrict to a single status.
    pub status: Option<PlateStatus>,
}

impl PlateFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// The catalog listing filter: optional search text, optionally only plates for sale.
    pub fn listing(search: Option<&str>, only_for_sale: bool) -> Self {
        Self {
            search: search.filter(|s| !s.is_empty()).map(str::to_string),
            status: only_for_sale.then_some(PlateStatus::ForSale),
        }
    }

    pub fn with_status(status: PlateStatus) -> Self {
        Self {
            search: None,
            status: Some(status),
        }
    }

    pub fn matches(&self, plate: &Plate) -> bool {
        if let Some(status) = self.status {
            if plate.status() != status {
                return false;
            }
        }
        match self.search.as_deref() {
            None | Some("") => true,
            Some(search) => matches_search(plate, search),
        }
    }
}

/// A plate matches when any of these hold:
/// - its registration, spaces removed, contains the search with spaces removed
///   (case-insensitive);
/// - its letters contain the search as typed (case-insensitive);
/// - the decimal form of its numbers contains the search as typed.
///
/// This lets a name like "Danny" find "DA12 NNY".
fn matches_search(plate: &Plate, search: &str) -> bool {
    let needle = search.to_uppercase();

    let registration = plate.registration().replace(' ', "").to_uppercase();
    if registration.contains(&needle.replace(' ', "")) {
        return true;
    }

    if plate.letters().to_uppercase().contains(&needle) {
        return true;
    }

    plate.numbers().to_string().contains(search)
}

/// Listing order. Always ascending; ties keep storage order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlateOrder {
    #[default]
    Registration,
    SalePrice,
}

impl PlateOrder {
    /// `"price"` (any case) orders by sale price; anything else by registration.
    pub fn parse(order_by: Option<&str>) -> Self {
        match order_by {
            Some(s) if s.eq_ignore_ascii_case("price") => PlateOrder::SalePrice,
            _ => PlateOrder::Registration,
        }
    }

    pub fn compare(self, a: &Plate, b: &Plate) -> Ordering {
        match self {
            PlateOrder::Registration => a.registration().cmp(b.registration()),
            PlateOrder::SalePrice => a.sale_price().cmp(&b.sale_price()),
        }
    }
}

/// Validated page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_index: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Validate caller-supplied coordinates; negative or out-of-range values are rejected.
    pub fn new(page_index: i64, page_size: i64) -> DomainResult<Self> {
        let page_index = u32::try_from(page_index)
            .map_err(|_| DomainError::validation(format!("invalid page index: {page_index}")))?;
        let page_size = u32::try_from(page_size)
            .map_err(|_| DomainError::validation(format!("invalid page size: {page_size}")))?;
        Ok(Self {
            page_index,
            page_size,
        })
    }

    /// Cap the page size.
    pub fn clamp(self, max_page_size: u32) -> Self {
        Self {
            page_size: self.page_size.min(max_page_size),
            ..self
        }
    }

    pub fn skip(&self) -> usize {
        (self.page_index as usize).saturating_mul(self.page_size as usize)
    }

    pub fn take(&self) -> usize {
        self.page_size as usize
    }
}

/// One page of a listing plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub page_index: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, total_count: u64, items: Vec<T>) -> Self {
        Self {
            page_index: request.page_index,
            page_size: request.page_size,
            total_count,
            items,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page_index: self.page_index,
            page_size: self.page_size,
            total_count: self.total_count,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}
