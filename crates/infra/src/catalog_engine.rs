//! Catalog engine: the application-level orchestration around a [`PlateStore`].
//!
//! Lifecycle operations run as:
//!
//! ```text
//! reserve / sell / unreserve
//!   ↓
//! 1. Load the plate from the store (fresh read every attempt)
//!   ↓
//! 2. Handle the command (pure decision, produces exactly one event)
//!   ↓
//! 3. Commit plate + audit entry (atomic, optimistic concurrency)
//!   ↓
//! 4. Notify the lifecycle bus (best-effort, never rolls back step 3)
//! ```
//!
//! A missing plate and a plate in the wrong state both surface as
//! [`Outcome::NotApplicable`]; the [`Rejection`] keeps which one it was.
//! Only infrastructure failures and exhausted conflict retries are errors.

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;

use plates_catalog::{
    pricing, AuditLogEntry, NewAuditEntry, NewPlate, Outcome, Page, PageRequest, Plate,
    PlateCommand, PlateFilter, PlateId, PlateOrder, PlateStatus, PricingPolicy, PromoCode,
    QuoteError, Rejection, ReservePlate, SellPlate, UnreservePlate,
};
use plates_core::{AggregateRoot, DomainError, ExpectedVersion};
use plates_events::{execute, EventBus};

use crate::config::CatalogConfig;
use crate::notifications::{LifecycleMessage, LifecycleNotifier};
use crate::plate_store::{PlateStore, StoreError};

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Caller input rejected before touching the store.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Commit conflicts persisted through every retry.
    #[error("concurrent modification of plate {plate_id} after {attempts} attempts")]
    Conflict { plate_id: PlateId, attempts: u32 },

    /// A domain rule broke in a way no caller input explains.
    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CatalogError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Invalid(DomainError::Validation(msg)) => CatalogError::InvalidInput(msg),
            other => CatalogError::Store(other),
        }
    }
}

impl From<DomainError> for CatalogError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                CatalogError::InvalidInput(msg)
            }
            other => CatalogError::Invariant(other.to_string()),
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Plate lifecycle, price quotes and catalog queries over an injected store.
///
/// The engine holds no plate state between calls. `S` is the persistence
/// backend, `B` receives lifecycle notifications after each commit.
#[derive(Debug)]
pub struct CatalogEngine<S, B> {
    store: S,
    notifier: LifecycleNotifier<B>,
    pricing: PricingPolicy,
    config: CatalogConfig,
}

impl<S, B> CatalogEngine<S, B> {
    pub fn new(store: S, bus: B, config: CatalogConfig) -> Self {
        Self {
            store,
            notifier: LifecycleNotifier::new(bus, config.notify_on_unreserve),
            pricing: PricingPolicy::with_floor_percent(config.price_floor_percent),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        self.notifier.bus()
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }
}

impl<S, B> CatalogEngine<S, B>
where
    S: PlateStore,
    B: EventBus<LifecycleMessage>,
{
    /// Reserve a plate that is for sale.
    pub fn reserve(&self, plate_id: PlateId, reserved_by: &str) -> CatalogResult<Outcome<Plate>> {
        self.transition(PlateCommand::ReservePlate(ReservePlate {
            plate_id,
            reserved_by: reserved_by.to_string(),
            occurred_at: Utc::now(),
        }))
    }

    /// Sell a plate that is for sale or reserved.
    pub fn sell(&self, plate_id: PlateId, sold_to: &str) -> CatalogResult<Outcome<Plate>> {
        self.transition(PlateCommand::SellPlate(SellPlate {
            plate_id,
            sold_to: sold_to.to_string(),
            occurred_at: Utc::now(),
        }))
    }

    /// Release a reservation, putting the plate back on sale.
    pub fn unreserve(
        &self,
        plate_id: PlateId,
        unreserved_by: &str,
    ) -> CatalogResult<Outcome<Plate>> {
        self.transition(PlateCommand::UnreservePlate(UnreservePlate {
            plate_id,
            unreserved_by: unreserved_by.to_string(),
            occurred_at: Utc::now(),
        }))
    }

    pub fn add_plate(&self, plate: NewPlate) -> CatalogResult<Plate> {
        let plate = self.store.insert(plate)?;
        tracing::info!(
            plate_id = %plate.id_typed(),
            registration = plate.registration(),
            "plate added"
        );
        Ok(plate)
    }

    pub fn plate(&self, plate_id: PlateId) -> CatalogResult<Option<Plate>> {
        Ok(self.store.find_by_id(plate_id)?)
    }

    /// One page of the catalog plus the total match count.
    ///
    /// Negative coordinates are rejected; page sizes above the configured
    /// maximum are clamped.
    pub fn list_plates(
        &self,
        page_index: i64,
        page_size: i64,
        filter: Option<&str>,
        order_by: Option<&str>,
        only_for_sale: bool,
    ) -> CatalogResult<Page<Plate>> {
        let requested = PageRequest::new(page_index, page_size)?;
        let request = requested.clamp(self.config.max_page_size);
        if request != requested {
            tracing::debug!(
                requested = requested.page_size,
                max = self.config.max_page_size,
                "page size clamped"
            );
        }

        let filter = PlateFilter::listing(filter, only_for_sale);
        let order = PlateOrder::parse(order_by);

        let total_count = self.store.count(&filter)?;
        let items = self
            .store
            .query(&filter, order, request.skip(), request.take())?;

        Ok(Page::new(request, total_count, items))
    }

    /// Sum of sale prices over sold plates.
    pub fn total_revenue(&self) -> CatalogResult<Decimal> {
        let sold = self.sold_plates()?;
        pricing::total_revenue(&sold)
            .ok_or_else(|| CatalogError::Invariant("total revenue overflowed".to_string()))
    }

    /// Mean per-plate margin over sold plates, in percent.
    pub fn average_profit_margin(&self) -> CatalogResult<Decimal> {
        let sold = self.sold_plates()?;
        pricing::average_profit_margin(&sold)
            .ok_or_else(|| CatalogError::Invariant("profit margin overflowed".to_string()))
    }

    /// Quote a plate's price under a promo code. Never mutates the plate.
    pub fn apply_discount(
        &self,
        plate_id: PlateId,
        promo_code: &str,
    ) -> CatalogResult<Outcome<Decimal>> {
        let Some(plate) = self.store.find_by_id(plate_id)? else {
            return Ok(rejected(plate_id, "discount", Rejection::NotFound));
        };
        if !plate.is_for_sale() {
            let rejection = Rejection::WrongState {
                status: plate.status(),
            };
            return Ok(rejected(plate_id, "discount", rejection));
        }

        let code = PromoCode::parse(promo_code);
        match self.pricing.quote(plate.sale_price(), &code) {
            Ok(quoted) => Ok(Outcome::Applied(quoted)),
            Err(QuoteError::BelowFloor(breach)) => {
                let rejection = Rejection::BelowPriceFloor {
                    quoted: breach.quoted,
                    floor: breach.floor,
                };
                Ok(rejected(plate_id, "discount", rejection))
            }
            Err(QuoteError::Overflow) => Err(CatalogError::Invariant(format!(
                "quote for plate {plate_id} overflowed"
            ))),
        }
    }

    /// Audit trail for a plate, newest first. Unknown plates have none.
    pub fn audit_history(&self, plate_id: PlateId) -> CatalogResult<Vec<AuditLogEntry>> {
        Ok(self.store.audit_history(plate_id)?)
    }

    fn sold_plates(&self) -> CatalogResult<Vec<Plate>> {
        Ok(self.store.query(
            &PlateFilter::with_status(PlateStatus::Sold),
            PlateOrder::default(),
            0,
            usize::MAX,
        )?)
    }

    fn transition(&self, mut command: PlateCommand) -> CatalogResult<Outcome<Plate>> {
        let plate_id = command.plate_id();
        let name = command.name();
        let attempts = self.config.commit_retries.saturating_add(1);

        for attempt in 1..=attempts {
            let Some(mut plate) = self.store.find_by_id(plate_id)? else {
                return Ok(rejected(plate_id, name, Rejection::NotFound));
            };
            let loaded = plate.version();

            let events = match execute(&mut plate, &command) {
                Ok(events) => events,
                Err(DomainError::Conflict(_)) => {
                    let rejection = Rejection::WrongState {
                        status: plate.status(),
                    };
                    return Ok(rejected(plate_id, name, rejection));
                }
                Err(other) => return Err(other.into()),
            };
            let [event] = <[_; 1]>::try_from(events).map_err(|events: Vec<_>| {
                CatalogError::Invariant(format!(
                    "{name} produced {} events, expected exactly one",
                    events.len()
                ))
            })?;

            let entry = NewAuditEntry::from(&event);
            match self
                .store
                .commit(&plate, entry, ExpectedVersion::Exact(loaded))
            {
                Ok(committed) => {
                    tracing::info!(
                        %plate_id,
                        command = name,
                        status = %plate.status(),
                        audit_id = committed.id.0,
                        "plate transition committed"
                    );
                    self.notifier.notify(plate.version(), event);
                    return Ok(Outcome::Applied(plate));
                }
                Err(StoreError::Conflict(reason)) => {
                    tracing::warn!(
                        %plate_id,
                        command = name,
                        attempt,
                        %reason,
                        "commit conflict; retrying"
                    );
                    command = command.at(Utc::now());
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(CatalogError::Conflict { plate_id, attempts })
    }
}

fn rejected<T>(plate_id: PlateId, operation: &str, rejection: Rejection) -> Outcome<T> {
    tracing::debug!(%plate_id, operation, %rejection, "not applicable");
    Outcome::NotApplicable(rejection)
}
