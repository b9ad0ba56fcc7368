//! Demo depot driver
//!
//! Builds an in-memory depot (pools, gates, file-backed lease store),
//! seeds inventories, and drives a scripted purchase and sale through the
//! tick loop, writing the audit log. Run with `cargo run`.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use tradepost::exchange::{AuditLog, DepotPools, ExchangeCoordinator, FileLeaseStore, ValveBank};
use tradepost::{AppConfig, Catalog, Inventory, MemoryInventory, ResourceType, TickOutcome};

fn main() -> Result<()> {
    let env = std::env::args().nth(1).unwrap_or_else(|| "dev".to_string());
    let config = AppConfig::load(&env);
    std::fs::create_dir_all(&config.log_dir).context("log dir creation failed")?;
    let _guard = tradepost::logging::init_logging(&config);

    let catalog = Catalog::with_default_prices();

    // Resolve the depot's pool and gate handles. A real deployment wires
    // these to physical containers; the demo keeps everything in memory.
    let supplier = MemoryInventory::new("store");
    let customer = MemoryInventory::new("customer");
    let vault = MemoryInventory::new("vault");
    supplier.seed(ResourceType::ingot("Iron"), 10_000_000);
    supplier.seed(ResourceType::ingot("Gold"), 50_000);
    customer.seed(ResourceType::Currency, 5);
    vault.seed(ResourceType::Currency, 100);

    let pools = DepotPools {
        suppliers: vec![Box::new(supplier.clone())],
        customer: Box::new(customer.clone()),
        vault: Box::new(vault.clone()),
        stage1: Box::new(MemoryInventory::new("stage1")),
        stage2: Box::new(MemoryInventory::new("stage2")),
    };
    let (valves, _) = ValveBank::in_memory();
    let lease_store = FileLeaseStore::new(&config.depot.lease_path);

    let mut coordinator = ExchangeCoordinator::new(
        catalog,
        pools,
        valves,
        Box::new(lease_store),
        &config.depot,
    )
    .context("coordinator initialization failed")?;
    let mut audit = AuditLog::create(&config.depot.audit_log_path)
        .context("audit log creation failed")?;

    info!(controller = %config.depot.controller_id, "depot controller up");

    // Scripted session: buy 2,000,000 Iron for 2, then sell it back for 1.
    coordinator
        .begin_purchase("Iron", 2)
        .context("purchase rejected")?;
    drive(&mut coordinator, &mut audit, config.depot.tick_interval_ms)?;

    coordinator
        .begin_sale("Iron", 1)
        .context("sale rejected")?;
    drive(&mut coordinator, &mut audit, config.depot.tick_interval_ms)?;

    info!(
        customer_iron = customer.amount_of(&ResourceType::ingot("Iron")),
        customer_currency = customer.amount_of(&ResourceType::Currency),
        vault_currency = vault.amount_of(&ResourceType::Currency),
        store_iron = supplier.amount_of(&ResourceType::ingot("Iron")),
        audit_entries = audit.entry_count(),
        "session complete"
    );
    Ok(())
}

/// Tick until the coordinator drains, appending completions to the audit log.
fn drive(
    coordinator: &mut ExchangeCoordinator,
    audit: &mut AuditLog,
    tick_interval_ms: u64,
) -> Result<()> {
    loop {
        let report = coordinator.tick()?;
        for record in &report.completed {
            audit.append(record)?;
            info!(
                id = %record.id,
                direction = %record.direction,
                item = %record.item,
                goods_qty = record.goods_qty,
                currency_qty = record.currency_qty,
                "exchange settled"
            );
        }
        match report.outcome {
            TickOutcome::Idle => return Ok(()),
            TickOutcome::Progressed | TickOutcome::LockHeldElsewhere => {
                thread::sleep(Duration::from_millis(tick_interval_ms));
            }
        }
    }
}
