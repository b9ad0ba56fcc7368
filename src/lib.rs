//! tradepost - Staged Goods/Currency Exchange Core
//!
//! A tick-driven controller for depots that trade goods against a
//! currency-equivalent resource over a gated physical transport network.
//!
//! # Modules
//!
//! - [`core_types`] - Core type aliases (Quantity, etc.)
//! - [`resource`] - Closed tagged-variant resource types
//! - [`catalog`] - Item registry, exchange rates, stock limits
//! - [`inventory`] - Storage pool port and in-memory implementation
//! - [`exchange`] - The staged exchange core: valves, lease lock,
//!   resumable transfers, purchase/sale state machines, coordinator
//! - [`config`] - YAML application configuration
//! - [`logging`] - tracing subscriber setup

// Core types - must be first!
pub mod core_types;

pub mod catalog;
pub mod config;
pub mod inventory;
pub mod logging;
pub mod resource;

// The staged exchange core
pub mod exchange;

// Convenient re-exports at crate root
pub use catalog::{Catalog, CatalogEntry};
pub use config::{AppConfig, DepotConfig};
pub use core_types::Quantity;
pub use exchange::{
    AuditLog, DepotPools, Direction, ExchangeCoordinator, ExchangeError, ExchangePhase,
    ExchangeRecord, FileLeaseStore, LeaseLock, LeaseRecord, LeaseStore, MemoryGate,
    MemoryLeaseStore, TickOutcome, TickReport, Valve, ValveBank, run_to_idle,
};
pub use inventory::{Inventory, MemoryInventory, Stack};
pub use resource::{ResourceKind, ResourceType};
