//! Catalog report command: seed an in-memory catalog from JSON and print one
//! listing page together with the sales figures.
//!
//! ```text
//! plates-report <seed.json> [--filter TEXT] [--order-by KEY] [--only-for-sale]
//!               [--page-index N] [--page-size N]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use plates_catalog::{NewPlate, Outcome, Page, PlateId, PlateRecord};
use plates_events::InMemoryEventBus;
use plates_infra::catalog_engine::CatalogEngine;
use plates_infra::config::CatalogConfig;
use plates_infra::notifications::LifecycleMessage;
use plates_infra::plate_store::InMemoryPlateStore;

pub const DEFAULT_PAGE_SIZE: i64 = 10;

type ReportEngine = CatalogEngine<InMemoryPlateStore, InMemoryEventBus<LifecycleMessage>>;

/// Print one page of the plate catalog with its sales figures.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "plates-report", disable_help_subcommand = true)]
pub struct ReportArgs {
    /// JSON array of plates to seed the catalog with.
    #[arg(value_name = "SEED")]
    pub seed: PathBuf,
    /// Fuzzy match against registration, letters and numbers.
    #[arg(long, value_name = "TEXT")]
    pub filter: Option<String>,
    /// `price` orders by sale price; anything else by registration.
    #[arg(long, value_name = "KEY")]
    pub order_by: Option<String>,
    /// Only list plates currently for sale.
    #[arg(long)]
    pub only_for_sale: bool,
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub page_index: i64,
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, allow_negative_numbers = true)]
    pub page_size: i64,
}

/// One seed entry: a new plate plus where it sits in the lifecycle.
///
/// `reserved_by` reserves the plate after insert; `sold_to` then sells it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedPlate {
    #[serde(flatten)]
    pub plate: NewPlate,
    #[serde(default)]
    pub reserved_by: Option<String>,
    #[serde(default)]
    pub sold_to: Option<String>,
}

/// What the command prints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogReport {
    pub page: Page<PlateRecord>,
    pub total_revenue: Decimal,
    pub average_profit_margin: Decimal,
}

pub fn load_seed(path: &Path) -> anyhow::Result<Vec<SeedPlate>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid seed file {}", path.display()))
}

/// Build a catalog from `plates` and produce the report for `args`.
pub fn report(
    plates: Vec<SeedPlate>,
    args: &ReportArgs,
    config: CatalogConfig,
) -> anyhow::Result<CatalogReport> {
    let engine: ReportEngine =
        CatalogEngine::new(InMemoryPlateStore::new(), InMemoryEventBus::new(), config);

    let seeded = plates.len();
    for seed in plates {
        seed_plate(&engine, seed)?;
    }
    tracing::info!(plates = seeded, "catalog seeded");

    let page = engine
        .list_plates(
            args.page_index,
            args.page_size,
            args.filter.as_deref(),
            args.order_by.as_deref(),
            args.only_for_sale,
        )
        .context("listing failed")?;

    Ok(CatalogReport {
        page: page.map(|plate| PlateRecord::from(&plate)),
        total_revenue: engine.total_revenue()?,
        average_profit_margin: engine.average_profit_margin()?,
    })
}

fn seed_plate(engine: &ReportEngine, seed: SeedPlate) -> anyhow::Result<()> {
    let registration = seed.plate.registration.clone();
    let id: PlateId = engine
        .add_plate(seed.plate)
        .with_context(|| format!("failed to add plate {registration}"))?
        .id_typed();

    if let Some(user) = seed.reserved_by.as_deref() {
        let outcome = engine.reserve(id, user)?;
        ensure_applied(outcome, &registration, "reserve")?;
    }
    if let Some(buyer) = seed.sold_to.as_deref() {
        let outcome = engine.sell(id, buyer)?;
        ensure_applied(outcome, &registration, "sell")?;
    }
    Ok(())
}

fn ensure_applied<T>(outcome: Outcome<T>, registration: &str, step: &str) -> anyhow::Result<()> {
    if let Outcome::NotApplicable(rejection) = outcome {
        bail!("cannot {step} seeded plate {registration}: {rejection}");
    }
    Ok(())
}

pub fn run(args: &ReportArgs, config: CatalogConfig) -> anyhow::Result<CatalogReport> {
    let plates = load_seed(&args.seed)?;
    report(plates, args, config)
}
