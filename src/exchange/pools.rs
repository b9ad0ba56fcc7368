//! Depot pool set
//!
//! The five pool roles the exchange core works against. Handles are
//! resolved once at startup by the surrounding deployment and assumed
//! stable for the process lifetime; their absence is a fatal
//! initialization error, not something the core recovers from at runtime.

use super::error::ExchangeError;
use crate::core_types::Quantity;
use crate::inventory::Inventory;
use crate::resource::ResourceType;

/// The depot's storage pools by role.
///
/// The supplier side is a set of pools: goods are staged out of and
/// returned into whichever supplier pools have stock or room.
pub struct DepotPools {
    pub suppliers: Vec<Box<dyn Inventory>>,
    pub customer: Box<dyn Inventory>,
    pub vault: Box<dyn Inventory>,
    pub stage1: Box<dyn Inventory>,
    pub stage2: Box<dyn Inventory>,
}

impl DepotPools {
    /// Initialization check; the core refuses to run without a supplier.
    pub fn verify_devices(&self) -> Result<(), ExchangeError> {
        if self.suppliers.is_empty() {
            return Err(ExchangeError::DeviceMissing("supplier pool".to_string()));
        }
        Ok(())
    }

    /// Total supplier-side holding of a resource type.
    pub fn supplier_total(&self, resource: &ResourceType) -> Quantity {
        self.suppliers.iter().map(|s| s.amount_of(resource)).sum()
    }

    /// True when both staging buffers hold nothing at all.
    pub fn stages_empty(&self) -> bool {
        self.stage1.stacks().is_empty() && self.stage2.stacks().is_empty()
    }
}
