//! Catalog - resource-type registry, exchange rates and stock limits
//!
//! The catalog is built once at load time and consulted as a pure lookup
//! afterwards. It owns the mapping from item identity to [`ResourceType`]
//! (goods category is decided here, never re-derived from string contents
//! per call) plus the per-item buy/sell exchange rates and the store stock
//! limit used by pre-checks.
//!
//! Rates are expressed as goods units per currency unit. Fractional rates
//! are allowed: a rate below 1.0 means several currency units buy a single
//! goods unit.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::core_types::Quantity;
use crate::resource::{ResourceKind, ResourceType};

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub kind: ResourceKind,
    /// Goods units granted per currency unit when the customer buys.
    pub buy_rate: f64,
    /// Goods units required per currency unit when the customer sells.
    pub sell_rate: f64,
    /// Maximum amount of this item the store will hold.
    pub stock_limit: Quantity,
}

/// Item registry and price table.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: FxHashMap<String, CatalogEntry>,
}

/// Default price table for the demo deployment.
///
/// (key, kind, buy rate, sell rate, stock limit)
static DEFAULT_PRICES: Lazy<Vec<(&'static str, ResourceKind, f64, f64, Quantity)>> =
    Lazy::new(|| {
        use ResourceKind::*;
        vec![
            ("Iron", Ingot, 1_000_000.0, 1_200_000.0, 4_500_000_000),
            ("Gold", Ingot, 7_300.0, 8_800.0, 750_000_000),
            ("Silver", Ingot, 75_000.0, 90_000.0, 1_000_000_000),
            ("Nickel", Ingot, 500_000.0, 600_000.0, 500_000_000),
            ("Cobalt", Ingot, 200_000.0, 240_000.0, 1_500_000_000),
            ("Platinum", Ingot, 1_600.0, 1_900.0, 10_000_000),
            ("Silicon", Ingot, 600_000.0, 720_000.0, 2_500_000_000),
            ("Magnesium", Ingot, 6_600.0, 7_900.0, 10_000_000),
            ("Uranium", Ingot, 2_000.0, 2_400.0, 50_000_000),
            ("Computer", Component, 76_400.0, 92_000.0, 5_000_000),
            ("SteelPlate", Component, 30_000.0, 36_000.0, 50_000_000),
            ("Superconductor", Component, 2_200.0, 2_600.0, 1_000_000),
            ("ZoneChip", Component, 0.4, 0.143, 3_500),
            ("AutocannonClip", Ammunition, 1_614.0, 1_937.0, 100_000),
            ("LargeRailgunAmmo", Ammunition, 536.0, 644.0, 100_000),
        ]
    });

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog seeded with the default price table.
    pub fn with_default_prices() -> Self {
        let mut catalog = Self::new();
        for (key, kind, buy, sell, limit) in DEFAULT_PRICES.iter() {
            catalog.insert(*key, *kind, *buy, *sell, *limit);
        }
        catalog
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        kind: ResourceKind,
        buy_rate: f64,
        sell_rate: f64,
        stock_limit: Quantity,
    ) {
        self.entries.insert(
            key.into(),
            CatalogEntry {
                kind,
                buy_rate,
                sell_rate,
                stock_limit,
            },
        );
    }

    pub fn entry(&self, item: &str) -> Option<&CatalogEntry> {
        self.entries.get(item)
    }

    /// Pure lookup from item identity to the core's resource-type selector.
    pub fn resolve(&self, item: &str) -> Option<ResourceType> {
        self.entries
            .get(item)
            .map(|e| ResourceType::goods(e.kind, item))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Goods granted for spending `currency` units on a purchase.
    pub fn purchase_goods_for(&self, item: &str, currency: Quantity) -> Option<Quantity> {
        self.entries
            .get(item)
            .map(|e| (e.buy_rate * currency as f64).floor() as Quantity)
    }

    /// Goods the customer must surrender to earn `currency` units on a sale.
    pub fn sale_goods_for(&self, item: &str, currency: Quantity) -> Option<Quantity> {
        self.entries
            .get(item)
            .map(|e| (e.sell_rate * currency as f64).floor() as Quantity)
    }

    /// Stock the store always retains: one currency unit's worth of goods.
    pub fn purchase_reserve(&self, item: &str) -> Option<Quantity> {
        self.purchase_goods_for(item, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_assigns_kind_once() {
        let catalog = Catalog::with_default_prices();
        assert_eq!(catalog.resolve("Iron"), Some(ResourceType::ingot("Iron")));
        assert_eq!(
            catalog.resolve("AutocannonClip"),
            Some(ResourceType::ammunition("AutocannonClip"))
        );
        assert_eq!(catalog.resolve("NoSuchItem"), None);
    }

    #[test]
    fn test_purchase_quote_scales_linearly() {
        let catalog = Catalog::with_default_prices();
        assert_eq!(catalog.purchase_goods_for("Iron", 2), Some(2_000_000));
        assert_eq!(catalog.sale_goods_for("Iron", 1), Some(1_200_000));
    }

    #[test]
    fn test_fractional_rate_floors() {
        let catalog = Catalog::with_default_prices();
        // 0.4 goods per currency unit: 5 currency buys exactly 2.
        assert_eq!(catalog.purchase_goods_for("ZoneChip", 5), Some(2));
        // 2 currency would floor to 0 - caller rejects zero-quantity trades.
        assert_eq!(catalog.purchase_goods_for("ZoneChip", 2), Some(0));
    }

    #[test]
    fn test_purchase_reserve_is_one_unit_worth() {
        let catalog = Catalog::with_default_prices();
        assert_eq!(catalog.purchase_reserve("Iron"), Some(1_000_000));
        assert_eq!(catalog.purchase_reserve("ZoneChip"), Some(0));
    }
}
