use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use plates_core::{Aggregate, AggregateId, AggregateRoot, DomainError, DomainResult};
use plates_events::Event;

/// Stream name used when plate events are wrapped for publication.
pub const AGGREGATE_TYPE: &str = "catalog.plate";

/// Largest purchase or sale price a plate may carry (one trillion).
///
/// Keeps revenue sums and floor arithmetic far inside the `Decimal` range.
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Plate identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlateId(pub AggregateId);

impl PlateId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(AggregateId::new())
    }
}

impl core::fmt::Display for PlateId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for PlateId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<AggregateId>().map(Self)
    }
}

/// Plate status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlateStatus {
    ForSale,
    Reserved,
    Sold,
}

impl PlateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PlateStatus::ForSale => "for_sale",
            PlateStatus::Reserved => "reserved",
            PlateStatus::Sold => "sold",
        }
    }
}

impl core::fmt::Display for PlateStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who holds a plate and since when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub reserved_at: DateTime<Utc>,
    pub reserved_by: String,
}

/// Lifecycle state, carrying only the fields valid for each status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlateState {
    ForSale,
    Reserved {
        reservation: Reservation,
    },
    Sold {
        sold_at: DateTime<Utc>,
        sold_to: String,
    },
}

impl PlateState {
    pub fn status(&self) -> PlateStatus {
        match self {
            PlateState::ForSale => PlateStatus::ForSale,
            PlateState::Reserved { .. } => PlateStatus::Reserved,
            PlateState::Sold { .. } => PlateStatus::Sold,
        }
    }
}

/// Input for adding a plate to the catalog.
///
/// `id` is optional; the store assigns one when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlate {
    #[serde(default)]
    pub id: Option<PlateId>,
    pub registration: String,
    #[serde(default)]
    pub letters: String,
    #[serde(default)]
    pub numbers: u32,
    pub purchase_price: Decimal,
    pub sale_price: Decimal,
}

/// Aggregate root: Plate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plate {
    id: PlateId,
    registration: String,
    letters: String,
    numbers: u32,
    purchase_price: Decimal,
    sale_price: Decimal,
    state: PlateState,
    version: u64,
}

impl Plate {
    /// Create a plate in the `ForSale` state (the only way into existence).
    pub fn create(id: PlateId, new: NewPlate) -> DomainResult<Self> {
        if new.purchase_price < Decimal::ZERO {
            return Err(DomainError::validation("purchase price cannot be negative"));
        }
        if new.sale_price < Decimal::ZERO {
            return Err(DomainError::validation("sale price cannot be negative"));
        }
        if new.purchase_price > MAX_PRICE || new.sale_price > MAX_PRICE {
            return Err(DomainError::validation(format!(
                "prices cannot exceed {MAX_PRICE}"
            )));
        }

        Ok(Self {
            id,
            registration: new.registration,
            letters: new.letters,
            numbers: new.numbers,
            purchase_price: new.purchase_price,
            sale_price: new.sale_price,
            state: PlateState::ForSale,
            version: 0,
        })
    }

    pub fn id_typed(&self) -> PlateId {
        self.id
    }

    pub fn registration(&self) -> &str {
        &self.registration
    }

    pub fn letters(&self) -> &str {
        &self.letters
    }

    pub fn numbers(&self) -> u32 {
        self.numbers
    }

    pub fn purchase_price(&self) -> Decimal {
        self.purchase_price
    }

    pub fn sale_price(&self) -> Decimal {
        self.sale_price
    }

    pub fn state(&self) -> &PlateState {
        &self.state
    }

    pub fn status(&self) -> PlateStatus {
        self.state.status()
    }

    pub fn reservation(&self) -> Option<&Reservation> {
        match &self.state {
            PlateState::Reserved { reservation } => Some(reservation),
            PlateState::ForSale | PlateState::Sold { .. } => None,
        }
    }

    pub fn is_for_sale(&self) -> bool {
        self.status() == PlateStatus::ForSale
    }

    pub fn is_sold(&self) -> bool {
        self.status() == PlateStatus::Sold
    }
}

impl AggregateRoot for Plate {
    type Id = PlateId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Flat view of a plate with nullable lifecycle columns.
///
/// This is the shape external consumers expect: the reservation and sale
/// fields are `None` whenever the status does not carry them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateRecord {
    pub id: PlateId,
    pub registration: String,
    pub letters: String,
    pub numbers: u32,
    pub purchase_price: Decimal,
    pub sale_price: Decimal,
    pub status: PlateStatus,
    pub reserved_at: Option<DateTime<Utc>>,
    pub reserved_by: Option<String>,
    pub sold_at: Option<DateTime<Utc>>,
    pub sold_to: Option<String>,
}

impl From<&Plate> for PlateRecord {
    fn from(plate: &Plate) -> Self {
        let (reserved_at, reserved_by) = match plate.reservation() {
            Some(r) => (Some(r.reserved_at), Some(r.reserved_by.clone())),
            None => (None, None),
        };
        let (sold_at, sold_to) = match &plate.state {
            PlateState::Sold { sold_at, sold_to, .. } => (Some(*sold_at), Some(sold_to.clone())),
            _ => (None, None),
        };

        Self {
            id: plate.id,
            registration: plate.registration.clone(),
            letters: plate.letters.clone(),
            numbers: plate.numbers,
            purchase_price: plate.purchase_price,
            sale_price: plate.sale_price,
            status: plate.status(),
            reserved_at,
            reserved_by,
            sold_at,
            sold_to,
        }
    }
}

/// Command: ReservePlate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservePlate {
    pub plate_id: PlateId,
    pub reserved_by: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SellPlate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellPlate {
    pub plate_id: PlateId,
    pub sold_to: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UnreservePlate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreservePlate {
    pub plate_id: PlateId,
    pub unreserved_by: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlateCommand {
    ReservePlate(ReservePlate),
    SellPlate(SellPlate),
    UnreservePlate(UnreservePlate),
}

impl PlateCommand {
    pub fn plate_id(&self) -> PlateId {
        match self {
            PlateCommand::ReservePlate(c) => c.plate_id,
            PlateCommand::SellPlate(c) => c.plate_id,
            PlateCommand::UnreservePlate(c) => c.plate_id,
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            PlateCommand::ReservePlate(_) => "reserve",
            PlateCommand::SellPlate(_) => "sell",
            PlateCommand::UnreservePlate(_) => "unreserve",
        }
    }

    /// Re-stamp the command with a new business time (used when retrying).
    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        match &mut self {
            PlateCommand::ReservePlate(c) => c.occurred_at = occurred_at,
            PlateCommand::SellPlate(c) => c.occurred_at = occurred_at,
            PlateCommand::UnreservePlate(c) => c.occurred_at = occurred_at,
        }
        self
    }
}

/// Event: PlateReserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateReserved {
    pub plate_id: PlateId,
    pub registration: String,
    pub reserved_by: String,
    pub reserved_at: DateTime<Utc>,
    pub status: PlateStatus,
}

/// Event: PlateSold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateSold {
    pub plate_id: PlateId,
    pub registration: String,
    pub sold_to: String,
    pub sold_at: DateTime<Utc>,
    pub status: PlateStatus,
}

/// Event: PlateUnreserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateUnreserved {
    pub plate_id: PlateId,
    pub registration: String,
    pub unreserved_by: String,
    pub unreserved_at: DateTime<Utc>,
    pub status: PlateStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlateEvent {
    PlateReserved(PlateReserved),
    PlateSold(PlateSold),
    PlateUnreserved(PlateUnreserved),
}

impl PlateEvent {
    pub fn plate_id(&self) -> PlateId {
        match self {
            PlateEvent::PlateReserved(e) => e.plate_id,
            PlateEvent::PlateSold(e) => e.plate_id,
            PlateEvent::PlateUnreserved(e) => e.plate_id,
        }
    }

    pub fn registration(&self) -> &str {
        match self {
            PlateEvent::PlateReserved(e) => &e.registration,
            PlateEvent::PlateSold(e) => &e.registration,
            PlateEvent::PlateUnreserved(e) => &e.registration,
        }
    }

    /// Whoever performed the transition.
    pub fn actor(&self) -> &str {
        match self {
            PlateEvent::PlateReserved(e) => &e.reserved_by,
            PlateEvent::PlateSold(e) => &e.sold_to,
            PlateEvent::PlateUnreserved(e) => &e.unreserved_by,
        }
    }

    pub fn resulting_status(&self) -> PlateStatus {
        match self {
            PlateEvent::PlateReserved(e) => e.status,
            PlateEvent::PlateSold(e) => e.status,
            PlateEvent::PlateUnreserved(e) => e.status,
        }
    }
}

impl Event for PlateEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PlateEvent::PlateReserved(_) => "catalog.plate.reserved",
            PlateEvent::PlateSold(_) => "catalog.plate.sold",
            PlateEvent::PlateUnreserved(_) => "catalog.plate.unreserved",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PlateEvent::PlateReserved(e) => e.reserved_at,
            PlateEvent::PlateSold(e) => e.sold_at,
            PlateEvent::PlateUnreserved(e) => e.unreserved_at,
        }
    }
}

impl Aggregate for Plate {
    type Command = PlateCommand;
    type Event = PlateEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PlateEvent::PlateReserved(e) => {
                self.state = PlateState::Reserved {
                    reservation: Reservation {
                        reserved_at: e.reserved_at,
                        reserved_by: e.reserved_by.clone(),
                    },
                };
            }
            PlateEvent::PlateSold(e) => {
                self.state = PlateState::Sold {
                    sold_at: e.sold_at,
                    sold_to: e.sold_to.clone(),
                };
            }
            PlateEvent::PlateUnreserved(_) => {
                self.state = PlateState::ForSale;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        self.ensure_plate_id(command.plate_id())?;

        match command {
            PlateCommand::ReservePlate(cmd) => self.handle_reserve(cmd),
            PlateCommand::SellPlate(cmd) => self.handle_sell(cmd),
            PlateCommand::UnreservePlate(cmd) => self.handle_unreserve(cmd),
        }
    }
}

impl Plate {
    fn ensure_plate_id(&self, plate_id: PlateId) -> Result<(), DomainError> {
        if self.id != plate_id {
            return Err(DomainError::invariant("plate_id mismatch"));
        }
        Ok(())
    }

    fn handle_reserve(&self, cmd: &ReservePlate) -> Result<Vec<PlateEvent>, DomainError> {
        if self.status() != PlateStatus::ForSale {
            return Err(DomainError::conflict(format!(
                "only plates for sale can be reserved (status: {})",
                self.status()
            )));
        }

        Ok(vec![PlateEvent::PlateReserved(PlateReserved {
            plate_id: self.id,
            registration: self.registration.clone(),
            reserved_by: cmd.reserved_by.clone(),
            reserved_at: cmd.occurred_at,
            status: PlateStatus::Reserved,
        })])
    }

    fn handle_sell(&self, cmd: &SellPlate) -> Result<Vec<PlateEvent>, DomainError> {
        // Reserved and unreserved plates may both be sold directly.
        if self.status() == PlateStatus::Sold {
            return Err(DomainError::conflict("plate is already sold"));
        }

        Ok(vec![PlateEvent::PlateSold(PlateSold {
            plate_id: self.id,
            registration: self.registration.clone(),
            sold_to: cmd.sold_to.clone(),
            sold_at: cmd.occurred_at,
            status: PlateStatus::Sold,
        })])
    }

    fn handle_unreserve(&self, cmd: &UnreservePlate) -> Result<Vec<PlateEvent>, DomainError> {
        if self.status() != PlateStatus::Reserved {
            return Err(DomainError::conflict(format!(
                "only reserved plates can be unreserved (status: {})",
                self.status()
            )));
        }

        Ok(vec![PlateEvent::PlateUnreserved(PlateUnreserved {
            plate_id: self.id,
            registration: self.registration.clone(),
            unreserved_by: cmd.unreserved_by.clone(),
            unreserved_at: cmd.occurred_at,
            status: PlateStatus::ForSale,
        })])
    }
}
