//! Staged Exchange Core
//!
//! Implements the two-phase staged exchange of goods for currency over a
//! gated transport network shared by independent controllers.
//!
//! # Architecture
//!
//! Five pool roles (supplier set, customer-facing, vault, two staging
//! buffers) are connected by a transport path gated with four valves.
//! Only one flow configuration may be active at a time, and a single
//! transport tick may move only part of a requested quantity, so every
//! exchange runs as a resumable two-phase state machine:
//!
//! ```text
//! Idle → Staging → Releasing → Idle
//! ```
//!
//! Staging fills both buffers behind valves A/C; Releasing drains them to
//! the counterparties behind valves B/D. An exchange either fully drains
//! or keeps retrying - there is no partially-committed terminal state.
//!
//! # Safety Invariants
//!
//! 1. **Valve exclusivity**: the open set is always {}, {A, C} or {B, D}
//! 2. **Empty buffers at Idle**: reaching Idle proves the exchange drained
//! 3. **Lease before mutation**: pool and valve mutation only under the
//!    shared lease lock, renewed every tick while busy
//! 4. **Never trust the requested amount**: every move is verified by
//!    re-reading the source pool

pub mod audit;
pub mod coordinator;
pub mod error;
pub mod lease;
pub mod pools;
pub mod purchase;
pub mod sale;
pub mod state;
pub mod transfer;
pub mod valves;


// Re-exports for convenience
pub use audit::{AuditLog, ExchangeRecord};
pub use coordinator::{ExchangeCoordinator, TickOutcome, TickReport, run_to_idle};
pub use error::ExchangeError;
pub use lease::{FileLeaseStore, LeaseLock, LeaseRecord, LeaseStore, MemoryLeaseStore};
pub use pools::DepotPools;
pub use purchase::{PurchaseMachine, PurchaseParams};
pub use sale::{SaleMachine, SaleParams};
pub use state::{Direction, ExchangePhase};
pub use transfer::{deduct_currency, transfer_up_to};
pub use valves::{GateDevice, MemoryGate, Valve, ValveBank};
