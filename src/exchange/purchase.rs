//! Purchase State Machine
//!
//! Drives the acquisition side of a staged exchange: goods leave the
//! supplier pools for the customer, currency leaves the customer pool for
//! the vault, and both travel through the staging buffers under valve
//! control so the counterparties never see a half-done trade.
//!
//! Staging: supplier → stage1 (goods), customer → stage2 (currency),
//! valves A and C open. Release: stage1 → customer, stage2 → vault,
//! valves B and D open. The machine re-reads buffer contents every tick
//! to decide phase transitions, so an interrupted run resumes from the
//! pools' actual state.

use tracing::{debug, info};

use super::audit::ExchangeRecord;
use super::pools::DepotPools;
use super::state::{Direction, ExchangePhase};
use super::transfer::transfer_up_to;
use super::valves::{Valve, ValveBank};
use crate::core_types::Quantity;
use crate::resource::ResourceType;

/// Captured when all pre-checks pass; immutable once staging begins.
#[derive(Debug, Clone)]
pub struct PurchaseParams {
    pub item: String,
    pub goods: ResourceType,
    pub goods_qty: Quantity,
    pub currency_qty: Quantity,
}

#[derive(Debug, Default)]
pub struct PurchaseMachine {
    phase: ExchangePhase,
    params: Option<PurchaseParams>,
}

impl PurchaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ExchangePhase {
        self.phase
    }

    pub fn params(&self) -> Option<&PurchaseParams> {
        self.params.as_ref()
    }

    /// Arm the machine with pre-validated parameters. Valve work starts
    /// on the next tick; the shared path may still be serving the other
    /// direction when this is called.
    pub(crate) fn begin(&mut self, params: PurchaseParams) {
        debug_assert!(self.phase.is_idle());
        info!(
            item = %params.item,
            goods_qty = params.goods_qty,
            currency_qty = params.currency_qty,
            "purchase staged exchange armed"
        );
        self.params = Some(params);
        self.phase = ExchangePhase::Staging;
    }

    /// Advance one tick. Returns a completion record when the exchange
    /// finishes draining.
    pub(crate) fn tick(
        &mut self,
        pools: &mut DepotPools,
        valves: &mut ValveBank,
    ) -> Option<ExchangeRecord> {
        let params = self.params.clone()?;
        match self.phase {
            ExchangePhase::Idle => None,
            ExchangePhase::Staging => {
                self.tick_staging(&params, pools, valves);
                None
            }
            ExchangePhase::Releasing => self.tick_releasing(&params, pools, valves),
        }
    }

    fn tick_staging(
        &mut self,
        params: &PurchaseParams,
        pools: &mut DepotPools,
        valves: &mut ValveBank,
    ) {
        // Re-assert the staging configuration; opening an open valve is a no-op.
        valves.open(Valve::SupplyFeed);
        valves.open(Valve::CustomerIntake);

        let currency = ResourceType::Currency;
        let DepotPools {
            suppliers,
            customer,
            stage1,
            stage2,
            ..
        } = pools;

        let mut staged_goods = stage1.amount_of(&params.goods);
        if staged_goods < params.goods_qty {
            for supplier in suppliers.iter_mut() {
                if staged_goods >= params.goods_qty {
                    break;
                }
                staged_goods += transfer_up_to(
                    supplier.as_mut(),
                    stage1.as_mut(),
                    &params.goods,
                    params.goods_qty - staged_goods,
                );
            }
        }

        let mut staged_currency = stage2.amount_of(&currency);
        if staged_currency < params.currency_qty {
            staged_currency += transfer_up_to(
                customer.as_mut(),
                stage2.as_mut(),
                &currency,
                params.currency_qty - staged_currency,
            );
        }

        debug!(
            item = %params.item,
            staged_goods,
            goods_target = params.goods_qty,
            staged_currency,
            currency_target = params.currency_qty,
            "purchase staging"
        );

        if staged_goods >= params.goods_qty && staged_currency >= params.currency_qty {
            valves.close(Valve::SupplyFeed);
            valves.close(Valve::CustomerIntake);
            valves.open(Valve::CustomerRelease);
            valves.open(Valve::SettlementDrain);
            self.phase = ExchangePhase::Releasing;
            debug!(item = %params.item, "purchase staging complete, releasing");
        }
    }

    fn tick_releasing(
        &mut self,
        params: &PurchaseParams,
        pools: &mut DepotPools,
        valves: &mut ValveBank,
    ) -> Option<ExchangeRecord> {
        let currency = ResourceType::Currency;
        let DepotPools {
            customer,
            vault,
            stage1,
            stage2,
            ..
        } = pools;

        if valves.is_open(Valve::CustomerRelease) {
            transfer_up_to(
                stage1.as_mut(),
                customer.as_mut(),
                &params.goods,
                params.goods_qty,
            );
        }
        if valves.is_open(Valve::SettlementDrain) {
            transfer_up_to(
                stage2.as_mut(),
                vault.as_mut(),
                &currency,
                params.currency_qty,
            );
        }

        // Both buffers reading zero is the proof the exchange fully drained.
        let goods_left = stage1.amount_of(&params.goods);
        let currency_left = stage2.amount_of(&currency);
        if goods_left > 0 || currency_left > 0 {
            debug!(
                item = %params.item,
                goods_left,
                currency_left,
                "purchase release draining"
            );
            return None;
        }

        valves.close(Valve::CustomerRelease);
        valves.close(Valve::SettlementDrain);
        self.phase = ExchangePhase::Idle;
        self.params = None;
        info!(
            item = %params.item,
            goods_qty = params.goods_qty,
            currency_qty = params.currency_qty,
            "purchase complete"
        );
        Some(ExchangeRecord::success(
            Direction::Purchase,
            params.item.clone(),
            params.goods_qty,
            params.currency_qty,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{Inventory, MemoryInventory};

    fn fixture(supplier_iron: Quantity, customer_currency: Quantity) -> (DepotPools, ValveBank) {
        let iron = ResourceType::ingot("Iron");
        let supplier = MemoryInventory::new("store");
        supplier.seed(iron, supplier_iron);
        let customer = MemoryInventory::new("customer");
        customer.seed(ResourceType::Currency, customer_currency);

        let pools = DepotPools {
            suppliers: vec![Box::new(supplier)],
            customer: Box::new(customer),
            vault: Box::new(MemoryInventory::new("vault")),
            stage1: Box::new(MemoryInventory::new("stage1")),
            stage2: Box::new(MemoryInventory::new("stage2")),
        };
        let (valves, _) = ValveBank::in_memory();
        (pools, valves)
    }

    fn iron_params(goods_qty: Quantity, currency_qty: Quantity) -> PurchaseParams {
        PurchaseParams {
            item: "Iron".to_string(),
            goods: ResourceType::ingot("Iron"),
            goods_qty,
            currency_qty,
        }
    }

    #[test]
    fn test_two_tick_completion_with_fast_transport() {
        let (mut pools, mut valves) = fixture(5_000_000, 2);
        let mut machine = PurchaseMachine::new();
        machine.begin(iron_params(2_000_000, 2));

        assert!(machine.tick(&mut pools, &mut valves).is_none());
        assert_eq!(machine.phase(), ExchangePhase::Releasing);

        let record = machine.tick(&mut pools, &mut valves).unwrap();
        assert_eq!(machine.phase(), ExchangePhase::Idle);
        assert_eq!(record.goods_qty, 2_000_000);
        assert_eq!(record.currency_qty, 2);

        let iron = ResourceType::ingot("Iron");
        assert_eq!(pools.supplier_total(&iron), 3_000_000);
        assert_eq!(pools.customer.amount_of(&iron), 2_000_000);
        assert_eq!(pools.customer.amount_of(&ResourceType::Currency), 0);
        assert_eq!(pools.vault.amount_of(&ResourceType::Currency), 2);
        assert!(pools.stages_empty());
    }

    #[test]
    fn test_staging_spans_multiple_supplier_pools() {
        let iron = ResourceType::ingot("Iron");
        let a = MemoryInventory::new("store-a");
        let b = MemoryInventory::new("store-b");
        a.seed(iron.clone(), 300);
        b.seed(iron.clone(), 900);
        let customer = MemoryInventory::new("customer");
        customer.seed(ResourceType::Currency, 1);

        let mut pools = DepotPools {
            suppliers: vec![Box::new(a), Box::new(b)],
            customer: Box::new(customer),
            vault: Box::new(MemoryInventory::new("vault")),
            stage1: Box::new(MemoryInventory::new("stage1")),
            stage2: Box::new(MemoryInventory::new("stage2")),
        };
        let (mut valves, _) = ValveBank::in_memory();

        let mut machine = PurchaseMachine::new();
        machine.begin(iron_params(1_000, 1));
        machine.tick(&mut pools, &mut valves);
        machine.tick(&mut pools, &mut valves);

        assert_eq!(machine.phase(), ExchangePhase::Idle);
        assert_eq!(pools.customer.amount_of(&iron), 1_000);
        assert_eq!(pools.supplier_total(&iron), 200);
    }

    #[test]
    fn test_slow_transport_stays_in_staging() {
        let iron = ResourceType::ingot("Iron");
        let supplier = MemoryInventory::with_transfer_cap("slow-store", 400);
        supplier.seed(iron, 5_000);
        let customer = MemoryInventory::new("customer");
        customer.seed(ResourceType::Currency, 1);

        let mut pools = DepotPools {
            suppliers: vec![Box::new(supplier)],
            customer: Box::new(customer),
            vault: Box::new(MemoryInventory::new("vault")),
            stage1: Box::new(MemoryInventory::new("stage1")),
            stage2: Box::new(MemoryInventory::new("stage2")),
        };
        let (mut valves, _) = ValveBank::in_memory();

        let mut machine = PurchaseMachine::new();
        machine.begin(iron_params(1_000, 1));

        machine.tick(&mut pools, &mut valves);
        assert_eq!(machine.phase(), ExchangePhase::Staging); // 400 staged
        machine.tick(&mut pools, &mut valves);
        assert_eq!(machine.phase(), ExchangePhase::Staging); // 800 staged
        machine.tick(&mut pools, &mut valves);
        assert_eq!(machine.phase(), ExchangePhase::Releasing); // 1000 staged
        let record = machine.tick(&mut pools, &mut valves).unwrap();
        assert_eq!(record.goods_qty, 1_000);
    }
}
