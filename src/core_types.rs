//! Core types used throughout the system
//!
//! These are fundamental type aliases used by all modules.
//! They provide semantic meaning and enable future type evolution.

/// Resource quantity - item counts and currency amounts.
///
/// # Constraints:
/// - **Unsigned**: pool holdings can never go negative
/// - **Wide**: bulk goods routinely trade in the billions of units
pub type Quantity = u64;
