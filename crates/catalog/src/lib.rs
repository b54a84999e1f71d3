//! Plate catalog domain module.
//!
//! Business rules for registration plates: the for-sale / reserved / sold
//! lifecycle, the audit trail it produces, promo-code pricing and the catalog
//! query vocabulary. Implemented purely as deterministic domain logic (no IO,
//! no HTTP, no storage).

pub mod audit;
pub mod outcome;
pub mod plate;
pub mod pricing;
pub mod query;

pub use audit::{AuditAction, AuditEntryId, AuditLogEntry, NewAuditEntry};
pub use outcome::{Outcome, Rejection};
pub use plate::{
    NewPlate, Plate, PlateCommand, PlateEvent, PlateId, PlateRecord, PlateReserved, PlateSold,
    PlateState, PlateStatus, PlateUnreserved, Reservation, ReservePlate, SellPlate,
    UnreservePlate, AGGREGATE_TYPE, MAX_PRICE,
};
pub use pricing::{PriceFloorBreach, PricingPolicy, PromoCode, QuoteError};
pub use query::{Page, PageRequest, PlateFilter, PlateOrder};
