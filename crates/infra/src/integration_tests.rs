//! Integration tests for the catalog pipeline.
//!
//! Tests: CatalogEngine → PlateStore (commit) → EventBus (notification)
//!
//! Verifies:
//! - Lifecycle transitions, their preconditions and audit trail
//! - Listing filter, ordering and pagination semantics
//! - Optimistic concurrency conflicts are retried from a fresh read
//! - A failing notification bus never undoes a commit

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::mpsc;

    use chrono::Utc;
    use rust_decimal::Decimal;

    use plates_catalog::{
        AuditAction, AuditLogEntry, NewAuditEntry, NewPlate, Outcome, Plate, PlateCommand,
        PlateFilter, PlateId, PlateOrder, PlateRecord, PlateStatus, Rejection, SellPlate,
    };
    use plates_core::{AggregateRoot, ExpectedVersion};
    use plates_events::{execute, EventBus, InMemoryEventBus, Subscription};

    use crate::catalog_engine::{CatalogEngine, CatalogError};
    use crate::config::CatalogConfig;
    use crate::notifications::LifecycleMessage;
    use crate::plate_store::{InMemoryPlateStore, PlateStore, StoreError};

    type TestBus = Arc<InMemoryEventBus<LifecycleMessage>>;

    fn setup_with(config: CatalogConfig) -> (CatalogEngine<InMemoryPlateStore, TestBus>, TestBus) {
        let bus: TestBus = Arc::new(InMemoryEventBus::new());
        let engine = CatalogEngine::new(InMemoryPlateStore::new(), bus.clone(), config);
        (engine, bus)
    }

    fn setup() -> (CatalogEngine<InMemoryPlateStore, TestBus>, TestBus) {
        setup_with(CatalogConfig::default())
    }

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn test_plate(registration: &str, letters: &str, numbers: u32, sale_price: i64) -> NewPlate {
        NewPlate {
            id: None,
            registration: registration.to_string(),
            letters: letters.to_string(),
            numbers,
            purchase_price: dec(100),
            sale_price: dec(sale_price),
        }
    }

    fn add<S, B>(engine: &CatalogEngine<S, B>, plate: NewPlate) -> PlateId
    where
        S: PlateStore,
        B: EventBus<LifecycleMessage>,
    {
        engine.add_plate(plate).unwrap().id_typed()
    }

    /// Reserved/sold fields are present exactly when the status carries them.
    fn assert_state_invariants(plate: &Plate) {
        let record = PlateRecord::from(plate);
        match record.status {
            PlateStatus::ForSale => {
                assert!(record.reserved_at.is_none() && record.reserved_by.is_none());
                assert!(record.sold_at.is_none() && record.sold_to.is_none());
            }
            PlateStatus::Reserved => {
                assert!(record.reserved_at.is_some() && record.reserved_by.is_some());
                assert!(record.sold_at.is_none() && record.sold_to.is_none());
            }
            PlateStatus::Sold => {
                assert!(record.reserved_at.is_none() && record.reserved_by.is_none());
                assert!(record.sold_at.is_some() && record.sold_to.is_some());
            }
        }
    }

    fn stored<S: PlateStore, B>(engine: &CatalogEngine<S, B>, id: PlateId) -> Plate {
        engine.store().find_by_id(id).unwrap().unwrap()
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    #[test]
    fn reserve_then_sell_follows_the_lifecycle() {
        let (engine, _bus) = setup();
        let id = add(&engine, test_plate("AB12 CDE", "ABCDE", 12, 200));

        let reserved = engine.reserve(id, "user1").unwrap().applied().unwrap();
        assert_eq!(reserved.status(), PlateStatus::Reserved);
        assert_eq!(reserved.reservation().unwrap().reserved_by, "user1");
        assert_state_invariants(&reserved);

        let sold = engine.sell(id, "buyer1").unwrap().applied().unwrap();
        assert_eq!(sold.status(), PlateStatus::Sold);
        assert_state_invariants(&sold);
        assert_eq!(stored(&engine, id), sold);
    }

    #[test]
    fn sell_is_allowed_straight_from_for_sale() {
        let (engine, _bus) = setup();
        let id = add(&engine, test_plate("AB12 CDE", "ABCDE", 12, 200));

        let sold = engine.sell(id, "buyer1").unwrap().applied().unwrap();
        assert!(sold.is_sold());
        assert!(sold.reservation().is_none());
        assert_state_invariants(&sold);
    }

    #[test]
    fn failed_preconditions_are_not_applicable_and_change_nothing() {
        let (engine, _bus) = setup();
        let id = add(&engine, test_plate("AB12 CDE", "ABCDE", 12, 200));

        // ForSale: unreserve does not apply.
        let before = stored(&engine, id);
        assert!(!engine.unreserve(id, "user1").unwrap().is_applied());
        assert_eq!(stored(&engine, id), before);

        // Reserved: a second reserve does not apply.
        engine.reserve(id, "user1").unwrap();
        let before = stored(&engine, id);
        assert!(!engine.reserve(id, "user2").unwrap().is_applied());
        assert_eq!(stored(&engine, id), before);

        // Sold: nothing applies any more.
        engine.sell(id, "buyer1").unwrap();
        let before = stored(&engine, id);
        assert!(!engine.reserve(id, "user1").unwrap().is_applied());
        assert!(!engine.sell(id, "buyer2").unwrap().is_applied());
        assert!(!engine.unreserve(id, "user1").unwrap().is_applied());
        assert_eq!(stored(&engine, id), before);
        assert_state_invariants(&before);

        assert_eq!(engine.audit_history(id).unwrap().len(), 2);
    }

    #[test]
    fn missing_and_wrong_state_look_alike_but_keep_their_cause() {
        let (engine, _bus) = setup();
        let id = add(&engine, test_plate("AB12 CDE", "ABCDE", 12, 200));
        engine.sell(id, "buyer1").unwrap();

        let missing = engine.sell(PlateId::generate(), "buyer2").unwrap();
        let wrong = engine.sell(id, "buyer2").unwrap();

        assert_eq!(missing.clone().applied(), None);
        assert_eq!(wrong.clone().applied(), None);
        assert_eq!(missing, Outcome::NotApplicable(Rejection::NotFound));
        assert_eq!(
            wrong,
            Outcome::NotApplicable(Rejection::WrongState {
                status: PlateStatus::Sold
            })
        );
    }

    #[test]
    fn unreserve_twice_appends_one_audit_entry() {
        let (engine, _bus) = setup();
        let id = add(&engine, test_plate("AB12 CDE", "ABCDE", 12, 200));
        engine.reserve(id, "user1").unwrap();

        let first = engine.unreserve(id, "user1").unwrap().applied().unwrap();
        assert!(first.is_for_sale());
        assert!(first.reservation().is_none());
        assert_state_invariants(&first);

        assert!(!engine.unreserve(id, "user1").unwrap().is_applied());

        let history = engine.audit_history(id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].action, AuditAction::Unreserved);
    }

    // ---------------------------------------------------------------------
    // Audit trail
    // ---------------------------------------------------------------------

    #[test]
    fn every_transition_is_audited_newest_first() {
        let (engine, _bus) = setup();
        let id = add(&engine, test_plate("AB12 CDE", "ABCDE", 12, 200));

        let mut statuses = Vec::new();
        for outcome in [
            engine.reserve(id, "user1").unwrap(),
            engine.unreserve(id, "user1").unwrap(),
            engine.sell(id, "buyer1").unwrap(),
        ] {
            statuses.push(outcome.applied().unwrap().status());
        }

        let history = engine.audit_history(id).unwrap();
        let actions: Vec<AuditAction> = history.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![AuditAction::Sold, AuditAction::Unreserved, AuditAction::Reserved]
        );

        // statusAfter mirrors the plate status each transition produced.
        let after: Vec<PlateStatus> = history.iter().rev().map(|e| e.status_after).collect();
        assert_eq!(after, statuses);

        assert!(history
            .windows(2)
            .all(|w| w[0].performed_at >= w[1].performed_at));
        assert_eq!(history[0].performed_by, "buyer1");
    }

    #[test]
    fn audit_history_is_per_plate() {
        let (engine, _bus) = setup();
        let a = add(&engine, test_plate("AA11 AAA", "AAA", 11, 200));
        let b = add(&engine, test_plate("BB22 BBB", "BBB", 22, 200));

        engine.reserve(a, "user1").unwrap();
        engine.sell(b, "buyer1").unwrap();

        assert!(engine.audit_history(a).unwrap().iter().all(|e| e.plate_id == a));
        assert_eq!(engine.audit_history(b).unwrap().len(), 1);
        assert!(engine.audit_history(PlateId::generate()).unwrap().is_empty());
    }

    // ---------------------------------------------------------------------
    // Discounts
    // ---------------------------------------------------------------------

    #[test]
    fn promo_codes_quote_without_mutating_the_plate() {
        let (engine, _bus) = setup();
        let id = add(&engine, test_plate("AB12 CDE", "ABCDE", 12, 200));
        let before = stored(&engine, id);

        assert_eq!(engine.apply_discount(id, "DISCOUNT").unwrap(), Outcome::Applied(dec(175)));
        assert_eq!(engine.apply_discount(id, "PERCENTOFF").unwrap(), Outcome::Applied(dec(170)));
        assert_eq!(engine.apply_discount(id, "WHATEVER").unwrap(), Outcome::Applied(dec(200)));

        assert_eq!(stored(&engine, id), before);
        assert!(engine.audit_history(id).unwrap().is_empty());
    }

    #[test]
    fn discount_below_the_floor_is_not_applicable() {
        let (engine, _bus) = setup();
        let id = add(&engine, test_plate("CH34 P", "CHP", 34, 20));

        let outcome = engine.apply_discount(id, "DISCOUNT").unwrap();
        assert!(matches!(
            outcome,
            Outcome::NotApplicable(Rejection::BelowPriceFloor { quoted, .. }) if quoted == dec(-5)
        ));
    }

    #[test]
    fn discount_requires_an_existing_plate_for_sale() {
        let (engine, _bus) = setup();
        let id = add(&engine, test_plate("AB12 CDE", "ABCDE", 12, 200));
        engine.sell(id, "buyer1").unwrap();

        assert_eq!(engine.apply_discount(id, "DISCOUNT").unwrap().applied(), None);
        assert_eq!(
            engine.apply_discount(PlateId::generate(), "DISCOUNT").unwrap(),
            Outcome::NotApplicable(Rejection::NotFound)
        );
    }

    #[test]
    fn floor_percent_comes_from_config() {
        let (engine, _bus) = setup_with(CatalogConfig {
            price_floor_percent: dec(90),
            ..CatalogConfig::default()
        });
        let id = add(&engine, test_plate("AB12 CDE", "ABCDE", 12, 200));

        // 90% of 200 is 180: both promo codes now undercut the floor.
        assert!(!engine.apply_discount(id, "DISCOUNT").unwrap().is_applied());
        assert!(!engine.apply_discount(id, "PERCENTOFF").unwrap().is_applied());
        assert_eq!(engine.apply_discount(id, "NONE").unwrap(), Outcome::Applied(dec(200)));
    }

    // ---------------------------------------------------------------------
    // Listing
    // ---------------------------------------------------------------------

    #[test]
    fn search_matches_letters_or_numbers() {
        let (engine, _bus) = setup();
        let tag = add(&engine, test_plate("T44GUE", "TAG", 44, 200));
        let mab = add(&engine, test_plate("M44BEY", "MAB", 44, 200));

        let page = engine.list_plates(0, 10, Some("TAG"), None, false).unwrap();
        let ids: Vec<PlateId> = page.items.iter().map(Plate::id_typed).collect();
        assert_eq!(ids, vec![tag]);
        assert_eq!(page.total_count, 1);

        let page = engine.list_plates(0, 10, Some("44"), None, false).unwrap();
        let mut ids: Vec<PlateId> = page.items.iter().map(Plate::id_typed).collect();
        ids.sort();
        let mut expected = vec![tag, mab];
        expected.sort();
        assert_eq!(ids, expected);
        assert_eq!(page.total_count, 2);
    }

    #[test]
    fn listing_orders_by_registration_or_price() {
        let (engine, _bus) = setup();
        add(&engine, test_plate("CC33", "CC", 33, 100));
        add(&engine, test_plate("AA11", "AA", 11, 300));
        add(&engine, test_plate("BB22", "BB", 22, 200));

        let regs = |page: plates_catalog::Page<Plate>| -> Vec<String> {
            page.items.iter().map(|p| p.registration().to_string()).collect()
        };

        let by_reg = engine.list_plates(0, 10, None, None, false).unwrap();
        assert_eq!(regs(by_reg), vec!["AA11", "BB22", "CC33"]);

        let by_price = engine.list_plates(0, 10, None, Some("Price"), false).unwrap();
        assert_eq!(regs(by_price), vec!["CC33", "BB22", "AA11"]);
    }

    #[test]
    fn only_for_sale_hides_reserved_and_sold_plates() {
        let (engine, _bus) = setup();
        let open = add(&engine, test_plate("AA11", "AA", 11, 100));
        let held = add(&engine, test_plate("BB22", "BB", 22, 100));
        let gone = add(&engine, test_plate("CC33", "CC", 33, 100));
        engine.reserve(held, "user1").unwrap();
        engine.sell(gone, "buyer1").unwrap();

        let page = engine.list_plates(0, 10, None, None, true).unwrap();
        let ids: Vec<PlateId> = page.items.iter().map(Plate::id_typed).collect();
        assert_eq!(ids, vec![open]);
        assert_eq!(page.total_count, 1);

        assert_eq!(engine.list_plates(0, 10, None, None, false).unwrap().total_count, 3);
    }

    #[test]
    fn pagination_reports_total_alongside_the_page() {
        let (engine, _bus) = setup();
        for reg in ["AA11", "BB22", "CC33", "DD44"] {
            add(&engine, test_plate(reg, "X", 1, 100));
        }

        let first = engine.list_plates(0, 2, None, None, false).unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.total_count, 4);

        let past_end = engine.list_plates(1, 4, None, None, false).unwrap();
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total_count, 4);
    }

    #[test]
    fn negative_pagination_is_invalid_input() {
        let (engine, _bus) = setup();
        add(&engine, test_plate("AA11", "AA", 11, 100));

        assert!(matches!(
            engine.list_plates(-1, 10, None, None, false),
            Err(CatalogError::InvalidInput(_))
        ));
        assert!(matches!(
            engine.list_plates(0, -10, None, None, false),
            Err(CatalogError::InvalidInput(_))
        ));
    }

    #[test]
    fn oversized_page_size_is_clamped() {
        let (engine, _bus) = setup_with(CatalogConfig {
            max_page_size: 2,
            ..CatalogConfig::default()
        });
        for reg in ["AA11", "BB22", "CC33"] {
            add(&engine, test_plate(reg, "X", 1, 100));
        }

        let page = engine.list_plates(0, 1_000_000, None, None, false).unwrap();
        assert_eq!(page.page_size, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_count, 3);
    }

    // ---------------------------------------------------------------------
    // Aggregates
    // ---------------------------------------------------------------------

    #[test]
    fn revenue_and_margin_cover_sold_plates_only() {
        let (engine, _bus) = setup();
        assert_eq!(engine.total_revenue().unwrap(), Decimal::ZERO);
        assert_eq!(engine.average_profit_margin().unwrap(), Decimal::ZERO);

        let sold = add(&engine, test_plate("AA11", "AA", 11, 300));
        add(&engine, test_plate("BB22", "BB", 22, 999));
        engine.sell(sold, "buyer1").unwrap();

        assert_eq!(engine.total_revenue().unwrap(), dec(300));
        // (300 - 100) / 300 * 100
        let margin = engine.average_profit_margin().unwrap();
        assert_eq!(margin.round_dp(2), Decimal::new(6667, 2));
    }

    // ---------------------------------------------------------------------
    // Notifications
    // ---------------------------------------------------------------------

    #[test]
    fn reserve_and_sell_notify_but_unreserve_does_not_by_default() {
        let (engine, bus) = setup();
        let sub = bus.subscribe();
        let id = add(&engine, test_plate("AB12 CDE", "ABCDE", 12, 200));

        engine.reserve(id, "user1").unwrap();
        engine.unreserve(id, "user1").unwrap();
        engine.sell(id, "buyer1").unwrap();

        let messages = sub.drain();
        let statuses: Vec<PlateStatus> = messages
            .iter()
            .map(|m| m.payload().resulting_status())
            .collect();
        assert_eq!(statuses, vec![PlateStatus::Reserved, PlateStatus::Sold]);

        let sold = &messages[1];
        assert_eq!(sold.aggregate_id(), id.0);
        assert_eq!(sold.payload().registration(), "AB12 CDE");
        assert_eq!(sold.payload().actor(), "buyer1");
        assert_eq!(sold.sequence_number(), stored(&engine, id).version());
    }

    #[test]
    fn unreserve_notifies_when_enabled() {
        let (engine, bus) = setup_with(CatalogConfig {
            notify_on_unreserve: true,
            ..CatalogConfig::default()
        });
        let sub = bus.subscribe();
        let id = add(&engine, test_plate("AB12 CDE", "ABCDE", 12, 200));

        engine.reserve(id, "user1").unwrap();
        engine.unreserve(id, "user2").unwrap();

        let messages = sub.drain();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].payload().actor(), "user2");
        assert_eq!(messages[1].payload().resulting_status(), PlateStatus::ForSale);
    }

    #[test]
    fn rejected_transitions_publish_nothing() {
        let (engine, bus) = setup();
        let sub = bus.subscribe();
        let id = add(&engine, test_plate("AB12 CDE", "ABCDE", 12, 200));

        engine.unreserve(id, "user1").unwrap();
        engine.reserve(PlateId::generate(), "user1").unwrap();

        assert!(sub.try_recv().is_err());
    }

    /// A bus whose broker is always down.
    #[derive(Debug, Default)]
    struct FailingBus {
        attempts: AtomicU32,
    }

    impl EventBus<LifecycleMessage> for FailingBus {
        type Error = String;

        fn publish(&self, _message: LifecycleMessage) -> Result<(), Self::Error> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err("broker unreachable".to_string())
        }

        fn subscribe(&self) -> Subscription<LifecycleMessage> {
            let (_tx, rx) = mpsc::channel();
            Subscription::new(rx)
        }
    }

    #[test]
    fn failing_bus_does_not_roll_back_the_commit() {
        let engine = CatalogEngine::new(
            InMemoryPlateStore::new(),
            FailingBus::default(),
            CatalogConfig::default(),
        );
        let id = add(&engine, test_plate("AB12 CDE", "ABCDE", 12, 200));

        let reserved = engine.reserve(id, "user1").unwrap();
        assert!(reserved.is_applied());
        assert_eq!(engine.bus().attempts.load(Ordering::SeqCst), 1);

        assert_eq!(stored(&engine, id).status(), PlateStatus::Reserved);
        assert_eq!(engine.audit_history(id).unwrap().len(), 1);
    }

    // ---------------------------------------------------------------------
    // Concurrency
    // ---------------------------------------------------------------------

    /// Wraps a store and interferes with commits.
    ///
    /// `spurious` commits fail with a conflict without touching the data.
    /// With `rival_sale` set, the first commit is preceded by another caller
    /// selling the plate, so the stored version really moves on.
    #[derive(Debug, Default)]
    struct InterferingStore {
        inner: InMemoryPlateStore,
        spurious: AtomicU32,
        rival_sale: AtomicBool,
        commits: AtomicU32,
    }

    impl InterferingStore {
        fn sell_behind_callers_back(&self, id: PlateId) -> Result<(), StoreError> {
            let mut plate = self.inner.find_by_id(id)?.ok_or(StoreError::NotFound(id))?;
            let loaded = plate.version();
            let cmd = PlateCommand::SellPlate(SellPlate {
                plate_id: id,
                sold_to: "rival".to_string(),
                occurred_at: Utc::now(),
            });
            let events = execute(&mut plate, &cmd).map_err(StoreError::Invalid)?;
            self.inner
                .commit(&plate, NewAuditEntry::from(&events[0]), ExpectedVersion::Exact(loaded))?;
            Ok(())
        }
    }

    impl PlateStore for InterferingStore {
        fn find_by_id(&self, id: PlateId) -> Result<Option<Plate>, StoreError> {
            self.inner.find_by_id(id)
        }

        fn query(
            &self,
            filter: &PlateFilter,
            order: PlateOrder,
            skip: usize,
            take: usize,
        ) -> Result<Vec<Plate>, StoreError> {
            self.inner.query(filter, order, skip, take)
        }

        fn count(&self, filter: &PlateFilter) -> Result<u64, StoreError> {
            self.inner.count(filter)
        }

        fn insert(&self, plate: NewPlate) -> Result<Plate, StoreError> {
            self.inner.insert(plate)
        }

        fn commit(
            &self,
            plate: &Plate,
            entry: NewAuditEntry,
            expected: ExpectedVersion,
        ) -> Result<AuditLogEntry, StoreError> {
            self.commits.fetch_add(1, Ordering::SeqCst);

            if self.rival_sale.swap(false, Ordering::SeqCst) {
                self.sell_behind_callers_back(plate.id_typed())?;
            }
            let spurious = self
                .spurious
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if spurious.is_ok() {
                return Err(StoreError::Conflict("injected".to_string()));
            }

            self.inner.commit(plate, entry, expected)
        }

        fn audit_history(&self, plate_id: PlateId) -> Result<Vec<AuditLogEntry>, StoreError> {
            self.inner.audit_history(plate_id)
        }
    }

    fn interfering_engine(
        store: InterferingStore,
        commit_retries: u32,
    ) -> CatalogEngine<InterferingStore, TestBus> {
        CatalogEngine::new(
            store,
            Arc::new(InMemoryEventBus::new()),
            CatalogConfig {
                commit_retries,
                ..CatalogConfig::default()
            },
        )
    }

    #[test]
    fn transient_conflicts_are_retried() {
        let engine = interfering_engine(
            InterferingStore {
                spurious: AtomicU32::new(2),
                ..InterferingStore::default()
            },
            3,
        );
        let id = add(&engine, test_plate("AB12 CDE", "ABCDE", 12, 200));

        let outcome = engine.reserve(id, "user1").unwrap();
        assert!(outcome.is_applied());
        assert_eq!(engine.store().commits.load(Ordering::SeqCst), 3);
        assert_eq!(engine.audit_history(id).unwrap().len(), 1);
    }

    #[test]
    fn persistent_conflicts_surface_after_the_retry_budget() {
        let engine = interfering_engine(
            InterferingStore {
                spurious: AtomicU32::new(u32::MAX),
                ..InterferingStore::default()
            },
            2,
        );
        let id = add(&engine, test_plate("AB12 CDE", "ABCDE", 12, 200));

        let err = engine.sell(id, "buyer1").unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Conflict { plate_id, attempts: 3 } if plate_id == id
        ));
        assert_eq!(stored(&engine, id).status(), PlateStatus::ForSale);
        assert!(engine.audit_history(id).unwrap().is_empty());
    }

    #[test]
    fn retry_re_evaluates_the_precondition_on_fresh_state() {
        let engine = interfering_engine(
            InterferingStore {
                rival_sale: AtomicBool::new(true),
                ..InterferingStore::default()
            },
            3,
        );
        let id = add(&engine, test_plate("AB12 CDE", "ABCDE", 12, 200));

        // The rival's sale lands between our read and our commit.
        let outcome = engine.reserve(id, "user1").unwrap();
        assert_eq!(
            outcome,
            Outcome::NotApplicable(Rejection::WrongState {
                status: PlateStatus::Sold
            })
        );

        let history = engine.audit_history(id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].performed_by, "rival");
    }

    #[test]
    fn parallel_reservations_let_exactly_one_caller_win() {
        let (engine, _bus) = setup();
        let id = add(&engine, test_plate("AB12 CDE", "ABCDE", 12, 200));
        let engine = Arc::new(engine);

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let engine = engine.clone();
                std::thread::spawn(move || engine.reserve(id, &format!("user{n}")))
            })
            .collect();

        let applied = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| matches!(r, Ok(Outcome::Applied(_))))
            .count();

        assert_eq!(applied, 1);
        assert_eq!(engine.audit_history(id).unwrap().len(), 1);
    }
}
