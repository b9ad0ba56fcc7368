//! Exchange Coordinator
//!
//! One orchestrator object owns the two state-machine value types, the
//! valve bank, the lease lock and the depot pools. It is the per-tick
//! entry point for the surrounding deployment.
//!
//! # Scheduling
//!
//! Every tick the coordinator first takes (or renews) the lease; if the
//! lease is held by another controller the whole invocation is a no-op.
//! Machines are then advanced in a fixed order: Purchase before Sale.
//! Because the four valves form a single shared transport path, only one
//! non-idle machine is granted the path per tick - a Sale armed while a
//! Purchase is mid-flight simply waits, parameters held, until the
//! Purchase returns to Idle. The lease is released only when both
//! machines are Idle.

use tracing::{debug, info};

use super::audit::ExchangeRecord;
use super::error::ExchangeError;
use super::lease::{LeaseLock, LeaseStore};
use super::pools::DepotPools;
use super::purchase::{PurchaseMachine, PurchaseParams};
use super::sale::{SaleMachine, SaleParams};
use super::state::{Direction, ExchangePhase};
use super::transfer::deduct_currency;
use super::valves::ValveBank;
use crate::catalog::Catalog;
use crate::config::DepotConfig;
use crate::core_types::Quantity;
use crate::resource::ResourceType;

/// What a tick invocation amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// This controller held the lease and advanced the machines.
    Progressed,
    /// Lease held by another unexpired owner; invocation was a no-op.
    LockHeldElsewhere,
    /// Nothing in flight; lease released.
    Idle,
}

/// Result of one tick: the outcome plus any exchanges that completed.
#[derive(Debug)]
pub struct TickReport {
    pub outcome: TickOutcome,
    pub completed: Vec<ExchangeRecord>,
}

pub struct ExchangeCoordinator {
    catalog: Catalog,
    pools: DepotPools,
    valves: ValveBank,
    lease: LeaseLock,
    owner_id: String,
    lease_secs: i64,
    purchase: PurchaseMachine,
    sale: SaleMachine,
}

impl ExchangeCoordinator {
    /// Build a coordinator over resolved pool and valve handles.
    ///
    /// Fails with `DeviceMissing` if any configured device is absent -
    /// a fatal initialization condition, never recovered at runtime.
    pub fn new(
        catalog: Catalog,
        pools: DepotPools,
        mut valves: ValveBank,
        lease_store: Box<dyn LeaseStore>,
        config: &DepotConfig,
    ) -> Result<Self, ExchangeError> {
        pools.verify_devices()?;
        valves.verify_devices()?;
        // Idle invariant: no exchange in flight, so no valve may be open.
        valves.close_all();
        Ok(Self {
            catalog,
            pools,
            valves,
            lease: LeaseLock::new(lease_store),
            owner_id: config.controller_id.clone(),
            lease_secs: config.lease_secs,
            purchase: PurchaseMachine::new(),
            sale: SaleMachine::new(),
        })
    }

    /// Busy signal: true while either machine is non-Idle.
    pub fn is_busy(&self) -> bool {
        self.purchase.phase().is_busy() || self.sale.phase().is_busy()
    }

    pub fn purchase_phase(&self) -> ExchangePhase {
        self.purchase.phase()
    }

    pub fn sale_phase(&self) -> ExchangePhase {
        self.sale.phase()
    }

    pub fn valves(&self) -> &ValveBank {
        &self.valves
    }

    pub fn pools(&self) -> &DepotPools {
        &self.pools
    }

    /// Start a purchase: the customer spends `currency_amount` on `item`.
    ///
    /// Runs the pre-checks (stock including the store reserve, deposited
    /// currency) and takes the lease. On any rejection no state mutates
    /// and no valve opens.
    pub fn begin_purchase(
        &mut self,
        item: &str,
        currency_amount: Quantity,
    ) -> Result<(), ExchangeError> {
        if self.purchase.phase().is_busy() {
            return Err(ExchangeError::ExchangeBusy(Direction::Purchase));
        }
        let entry = self
            .catalog
            .entry(item)
            .ok_or_else(|| ExchangeError::UnknownItem(item.to_string()))?;
        let goods = ResourceType::goods(entry.kind, item);

        let goods_qty = self
            .catalog
            .purchase_goods_for(item, currency_amount)
            .unwrap_or(0);
        if currency_amount == 0 || goods_qty == 0 {
            return Err(ExchangeError::ZeroQuantity);
        }

        // The store keeps one currency unit's worth of goods in reserve.
        let reserve = self.catalog.purchase_reserve(item).unwrap_or(0);
        let stock = self.pools.supplier_total(&goods);
        let sellable = stock.saturating_sub(reserve);
        if sellable < goods_qty {
            return Err(ExchangeError::InsufficientSource {
                what: format!("supplier stock of {}", item),
                available: sellable,
                needed: goods_qty,
            });
        }

        let deposited = self.pools.customer.amount_of(&ResourceType::Currency);
        if deposited < currency_amount {
            return Err(ExchangeError::InsufficientSource {
                what: "deposited currency".to_string(),
                available: deposited,
                needed: currency_amount,
            });
        }

        self.take_lease()?;
        self.purchase.begin(PurchaseParams {
            item: item.to_string(),
            goods,
            goods_qty,
            currency_qty: currency_amount,
        });
        Ok(())
    }

    /// Start a sale: the customer surrenders goods for `currency_amount`.
    ///
    /// Pre-checks: deposited goods, vault funds, and store capacity
    /// headroom against the catalog limit.
    pub fn begin_sale(
        &mut self,
        item: &str,
        currency_amount: Quantity,
    ) -> Result<(), ExchangeError> {
        if self.sale.phase().is_busy() {
            return Err(ExchangeError::ExchangeBusy(Direction::Sale));
        }
        let entry = self
            .catalog
            .entry(item)
            .ok_or_else(|| ExchangeError::UnknownItem(item.to_string()))?;
        let goods = ResourceType::goods(entry.kind, item);
        let stock_limit = entry.stock_limit;

        let goods_qty = self
            .catalog
            .sale_goods_for(item, currency_amount)
            .unwrap_or(0);
        if currency_amount == 0 || goods_qty == 0 {
            return Err(ExchangeError::ZeroQuantity);
        }

        let deposited = self.pools.customer.amount_of(&goods);
        if deposited < goods_qty {
            return Err(ExchangeError::InsufficientSource {
                what: format!("deposited {}", item),
                available: deposited,
                needed: goods_qty,
            });
        }

        let stock = self.pools.supplier_total(&goods);
        if stock + goods_qty > stock_limit {
            return Err(ExchangeError::InsufficientCapacity {
                item: item.to_string(),
                stock,
                incoming: goods_qty,
                limit: stock_limit,
            });
        }

        let funds = self.pools.vault.amount_of(&ResourceType::Currency);
        if funds < currency_amount {
            return Err(ExchangeError::InsufficientSource {
                what: "vault currency".to_string(),
                available: funds,
                needed: currency_amount,
            });
        }

        self.take_lease()?;
        self.sale.begin(SaleParams {
            item: item.to_string(),
            goods,
            goods_qty,
            currency_qty: currency_amount,
        });
        Ok(())
    }

    /// One scheduler tick.
    ///
    /// Renews the lease, advances whichever machine currently holds the
    /// shared path (Purchase first), and releases the lease once both
    /// machines are Idle.
    pub fn tick(&mut self) -> Result<TickReport, ExchangeError> {
        if !self.lease.acquire(&self.owner_id, self.lease_secs)? {
            debug!("tick skipped: lease held elsewhere");
            return Ok(TickReport {
                outcome: TickOutcome::LockHeldElsewhere,
                completed: Vec::new(),
            });
        }

        let mut completed = Vec::new();
        // Fixed order: Purchase before Sale. The shared transport path
        // serves one machine per tick.
        if self.purchase.phase().is_busy() {
            if let Some(record) = self.purchase.tick(&mut self.pools, &mut self.valves) {
                completed.push(record);
            }
        } else if self.sale.phase().is_busy() {
            if let Some(record) = self.sale.tick(&mut self.pools, &mut self.valves) {
                completed.push(record);
            }
        }

        let outcome = if self.is_busy() {
            TickOutcome::Progressed
        } else {
            self.lease.release()?;
            TickOutcome::Idle
        };
        Ok(TickReport { outcome, completed })
    }

    /// Guarded single-step currency deduction, outside the staged
    /// protocol. Takes the lease for the duration of the move.
    pub fn deduct_currency(&mut self, amount: Quantity) -> Result<(), ExchangeError> {
        self.take_lease()?;
        let result = deduct_currency(
            self.pools.customer.as_mut(),
            self.pools.vault.as_mut(),
            amount,
        );
        if !self.is_busy() {
            self.lease.release()?;
        }
        result
    }

    fn take_lease(&mut self) -> Result<(), ExchangeError> {
        if self.lease.acquire(&self.owner_id, self.lease_secs)? {
            Ok(())
        } else {
            Err(ExchangeError::LockUnavailable)
        }
    }
}

/// Convenience: drive the coordinator until both machines are Idle.
///
/// Returns all completion records. `max_ticks` bounds runaway transport
/// stalls; hitting the bound is reported as the records seen so far.
pub fn run_to_idle(
    coordinator: &mut ExchangeCoordinator,
    max_ticks: usize,
) -> Result<Vec<ExchangeRecord>, ExchangeError> {
    let mut completed = Vec::new();
    for _ in 0..max_ticks {
        let report = coordinator.tick()?;
        completed.extend(report.completed);
        if report.outcome == TickOutcome::Idle {
            break;
        }
    }
    if coordinator.is_busy() {
        info!(max_ticks, "exchange still in flight at tick bound");
    }
    Ok(completed)
}
