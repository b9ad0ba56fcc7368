//! Resumable transfer primitive and the guarded currency deduction
//!
//! `transfer_up_to` is the only way the core moves resources between
//! pools. It under-promises by contract: moving less than requested -
//! including nothing at all - is not an error, it is the signal that the
//! transport is saturated and the caller should try again next tick. The
//! staging state machines are resumable precisely because of this.

use tracing::{debug, warn};

use super::error::ExchangeError;
use crate::core_types::Quantity;
use crate::inventory::Inventory;
use crate::resource::ResourceType;

/// Move up to `max` units of `resource` from `source` into `dest`.
///
/// Scans the source's stacks; for each matching stack, requests
/// `min(remaining, stack amount)` and verifies the actual delta by
/// re-reading the source's total holding before and after the move.
/// The requested amount is never trusted as the moved amount - the
/// underlying transport may silently move less.
///
/// Returns the cumulative amount actually moved, possibly zero.
pub fn transfer_up_to(
    source: &mut dyn Inventory,
    dest: &mut dyn Inventory,
    resource: &ResourceType,
    max: Quantity,
) -> Quantity {
    let mut moved_total: Quantity = 0;

    for stack in source.stacks() {
        if stack.resource != *resource {
            continue;
        }
        let want = (max - moved_total).min(stack.amount);
        if want == 0 {
            break;
        }

        let before = source.amount_of(resource);
        source.withdraw(resource, want);
        let after = source.amount_of(resource);
        let actual = before.saturating_sub(after);

        if actual > 0 {
            dest.deposit(resource, actual);
            moved_total += actual;
            if moved_total >= max {
                break;
            }
        }
    }

    if moved_total < max {
        debug!(
            source = source.name(),
            dest = dest.name(),
            %resource,
            moved = moved_total,
            requested = max,
            "partial transfer, will resume next tick"
        );
    }
    moved_total
}

/// Best-effort all-or-nothing move of `amount` currency from the customer
/// pool into the vault.
///
/// On a short transfer the partial amount is immediately moved back and
/// the deduction reports failure. Used where a simple guarded move - not
/// a staged exchange - suffices.
pub fn deduct_currency(
    customer: &mut dyn Inventory,
    vault: &mut dyn Inventory,
    amount: Quantity,
) -> Result<(), ExchangeError> {
    let currency = ResourceType::Currency;
    let moved = transfer_up_to(customer, vault, &currency, amount);
    if moved == amount {
        return Ok(());
    }

    if moved > 0 {
        let returned = transfer_up_to(vault, customer, &currency, moved);
        if returned < moved {
            warn!(
                moved,
                returned, "currency rollback itself came up short"
            );
        }
    }
    warn!(
        moved,
        requested = amount,
        "currency deduction short, rolled back"
    );
    Err(ExchangeError::ShortDeduction {
        moved,
        requested: amount,
    })
}
