//! Sale State Machine
//!
//! The disposal-side mirror of the purchase machine: currency leaves the
//! vault for the customer, goods leave the customer pool for the supplier
//! side.
//!
//! Staging: vault → stage1 (currency), customer → stage2 (goods), valves
//! A and C open. Release: stage1 → customer, stage2 → supplier pools,
//! valves B and D open. Returned goods are distributed across the
//! supplier pool set until the target is satisfied or every pool has been
//! tried.

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
pub struct SaleParams {
    pub item: String,
    pub goods: ResourceType,
    pub goods_qty: Quantity,
    pub currency_qty: Quantity,
}

#[derive(Debug, Default)]
pub struct SaleMachine {
    phase: ExchangePhase,
    params: Option<SaleParams>,
}

impl SaleMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ExchangePhase {
        self.phase
    }

    pub fn params(&self) -> Option<&SaleParams> {
        self.params.as_ref()
    }

    /// Arm the machine with pre-validated parameters. Valve work starts
    /// on the next tick.
    pub(crate) fn begin(&mut self, params: SaleParams) {
        debug_assert!(self.phase.is_idle());
        info!(
            item = %params.item,
            goods_qty = params.goods_qty,
            currency_qty = params.currency_qty,
            "sale staged exchange armed"
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
        params: &SaleParams,
        pools: &mut DepotPools,
        valves: &mut ValveBank,
    ) {
        valves.open(Valve::SupplyFeed);
        valves.open(Valve::CustomerIntake);

        let currency = ResourceType::Currency;
        let DepotPools {
            customer,
            vault,
            stage1,
            stage2,
            ..
        } = pools;

        let mut staged_currency = stage1.amount_of(&currency);
        if staged_currency < params.currency_qty {
            staged_currency += transfer_up_to(
                vault.as_mut(),
                stage1.as_mut(),
                &currency,
                params.currency_qty - staged_currency,
            );
        }

        let mut staged_goods = stage2.amount_of(&params.goods);
        if staged_goods < params.goods_qty {
            staged_goods += transfer_up_to(
                customer.as_mut(),
                stage2.as_mut(),
                &params.goods,
                params.goods_qty - staged_goods,
            );
        }

        debug!(
            item = %params.item,
            staged_currency,
            currency_target = params.currency_qty,
            staged_goods,
            goods_target = params.goods_qty,
            "sale staging"
        );

        if staged_currency >= params.currency_qty && staged_goods >= params.goods_qty {
            valves.close(Valve::SupplyFeed);
            valves.close(Valve::CustomerIntake);
            valves.open(Valve::CustomerRelease);
            valves.open(Valve::SettlementDrain);
            self.phase = ExchangePhase::Releasing;
            debug!(item = %params.item, "sale staging complete, releasing");
        }
    }

    fn tick_releasing(
        &mut self,
        params: &SaleParams,
        pools: &mut DepotPools,
        valves: &mut ValveBank,
    ) -> Option<ExchangeRecord> {
        let currency = ResourceType::Currency;
        let DepotPools {
            suppliers,
            customer,
            stage1,
            stage2,
            ..
        } = pools;

        if valves.is_open(Valve::CustomerRelease) {
            transfer_up_to(
                stage1.as_mut(),
                customer.as_mut(),
                &currency,
                params.currency_qty,
            );
        }
        if valves.is_open(Valve::SettlementDrain) {
            let mut returned: Quantity = 0;
            for supplier in suppliers.iter_mut() {
                if returned >= params.goods_qty {
                    break;
                }
                returned += transfer_up_to(
                    stage2.as_mut(),
                    supplier.as_mut(),
                    &params.goods,
                    params.goods_qty - returned,
                );
            }
        }

        let currency_left = stage1.amount_of(&currency);
        let goods_left = stage2.amount_of(&params.goods);
        if currency_left > 0 || goods_left > 0 {
            debug!(
                item = %params.item,
                currency_left,
                goods_left,
                "sale release draining"
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
            "sale complete"
        );
        Some(ExchangeRecord::success(
            Direction::Sale,
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

    fn iron_params(goods_qty: Quantity, currency_qty: Quantity) -> SaleParams {
        SaleParams {
            item: "Iron".to_string(),
            goods: ResourceType::ingot("Iron"),
            goods_qty,
            currency_qty,
        }
    }

    #[test]
    fn test_two_tick_completion_with_fast_transport() {
        let iron = ResourceType::ingot("Iron");
        let supplier = MemoryInventory::new("store");
        let customer = MemoryInventory::new("customer");
        let vault = MemoryInventory::new("vault");
        customer.seed(iron.clone(), 1_200_000);
        vault.seed(ResourceType::Currency, 5);

        let mut pools = DepotPools {
            suppliers: vec![Box::new(supplier)],
            customer: Box::new(customer),
            vault: Box::new(vault),
            stage1: Box::new(MemoryInventory::new("stage1")),
            stage2: Box::new(MemoryInventory::new("stage2")),
        };
        let (mut valves, _) = ValveBank::in_memory();

        let mut machine = SaleMachine::new();
        machine.begin(iron_params(1_200_000, 1));

        assert!(machine.tick(&mut pools, &mut valves).is_none());
        assert_eq!(machine.phase(), ExchangePhase::Releasing);
        let record = machine.tick(&mut pools, &mut valves).unwrap();
        assert_eq!(machine.phase(), ExchangePhase::Idle);
        assert_eq!(record.direction, Direction::Sale);

        assert_eq!(pools.vault.amount_of(&ResourceType::Currency), 4);
        assert_eq!(pools.customer.amount_of(&ResourceType::Currency), 1);
        assert_eq!(pools.customer.amount_of(&iron), 0);
        assert_eq!(pools.supplier_total(&iron), 1_200_000);
        assert!(pools.stages_empty());
    }

    #[test]
    fn test_release_distributes_across_supplier_pools() {
        let iron = ResourceType::ingot("Iron");
        // First supplier's transport accepts 100 units per call; the rest
        // lands in the second pool over subsequent ticks.
        let a = MemoryInventory::new("store-a");
        let b = MemoryInventory::new("store-b");
        let customer = MemoryInventory::new("customer");
        let vault = MemoryInventory::new("vault");
        customer.seed(iron.clone(), 500);
        vault.seed(ResourceType::Currency, 1);

        let stage2 = MemoryInventory::with_transfer_cap("stage2", 100);
        let mut pools = DepotPools {
            suppliers: vec![Box::new(a.clone()), Box::new(b.clone())],
            customer: Box::new(customer),
            vault: Box::new(vault),
            stage1: Box::new(MemoryInventory::new("stage1")),
            stage2: Box::new(stage2),
        };
        let (mut valves, _) = ValveBank::in_memory();

        let mut machine = SaleMachine::new();
        machine.begin(iron_params(500, 1));

        let mut ticks = 0;
        while machine.phase().is_busy() {
            machine.tick(&mut pools, &mut valves);
            ticks += 1;
            assert!(ticks < 20, "sale failed to converge");
        }
        assert_eq!(pools.supplier_total(&iron), 500);
        assert!(pools.stages_empty());
    }
}
