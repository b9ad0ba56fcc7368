//! Exchange Error Types

use thiserror::Error;

use super::state::Direction;
use crate::core_types::Quantity;

/// Exchange error types
///
/// Partial transfers are deliberately absent: a transfer primitive that
/// moves less than requested is the expected steady-state signal driving
/// retry-next-tick, not an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    // === Per-tick transient (recovered by retry next tick) ===
    #[error("transport lease held by another controller")]
    LockUnavailable,

    // === Pre-check rejections (no state mutation occurred) ===
    #[error("unknown item: {0}")]
    UnknownItem(String),

    #[error("insufficient {what}: have {available}, need {needed}")]
    InsufficientSource {
        what: String,
        available: Quantity,
        needed: Quantity,
    },

    #[error("store capacity exceeded for {item}: {stock} held + {incoming} incoming > {limit}")]
    InsufficientCapacity {
        item: String,
        stock: Quantity,
        incoming: Quantity,
        limit: Quantity,
    },

    #[error("requested quantity works out to zero")]
    ZeroQuantity,

    #[error("{0} exchange already in flight")]
    ExchangeBusy(Direction),

    // === Deduction helper ===
    #[error("currency deduction came up short: moved {moved} of {requested}, rolled back")]
    ShortDeduction { moved: Quantity, requested: Quantity },

    // === Configuration / fatal ===
    #[error("missing device: {0}")]
    DeviceMissing(String),

    #[error("lease store error: {0}")]
    LeaseIo(String),
}

impl ExchangeError {
    /// Stable code for diagnostics and log filtering.
    pub fn code(&self) -> &'static str {
        match self {
            ExchangeError::LockUnavailable => "LOCK_UNAVAILABLE",
            ExchangeError::UnknownItem(_) => "UNKNOWN_ITEM",
            ExchangeError::InsufficientSource { .. } => "INSUFFICIENT_SOURCE",
            ExchangeError::InsufficientCapacity { .. } => "INSUFFICIENT_CAPACITY",
            ExchangeError::ZeroQuantity => "ZERO_QUANTITY",
            ExchangeError::ExchangeBusy(_) => "EXCHANGE_BUSY",
            ExchangeError::ShortDeduction { .. } => "SHORT_DEDUCTION",
            ExchangeError::DeviceMissing(_) => "DEVICE_MISSING",
            ExchangeError::LeaseIo(_) => "LEASE_IO",
        }
    }

    /// True for conditions a caller resolves by retrying next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExchangeError::LockUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ExchangeError::LockUnavailable.code(), "LOCK_UNAVAILABLE");
        assert_eq!(
            ExchangeError::ExchangeBusy(Direction::Sale).code(),
            "EXCHANGE_BUSY"
        );
        assert_eq!(
            ExchangeError::DeviceMissing("stage1".into()).code(),
            "DEVICE_MISSING"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(ExchangeError::LockUnavailable.is_transient());
        assert!(!ExchangeError::ZeroQuantity.is_transient());
        assert!(
            !ExchangeError::ShortDeduction {
                moved: 2,
                requested: 3
            }
            .is_transient()
        );
    }

    #[test]
    fn test_display() {
        let err = ExchangeError::InsufficientSource {
            what: "supplier stock of Iron".into(),
            available: 10,
            needed: 20,
        };
        assert_eq!(
            err.to_string(),
            "insufficient supplier stock of Iron: have 10, need 20"
        );
    }
}
