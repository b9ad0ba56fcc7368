//! Flow valve control
//!
//! Four binary gates steer the shared transport network. Only one flow
//! configuration may be active at a time; opening both legs of a route
//! simultaneously would let content leak straight through between pools.
//!
//! Reachable configurations are exactly:
//! - all closed (Idle)
//! - A + C open (staging)
//! - B + D open (release)

use std::cell::Cell;
use std::rc::Rc;

use super::error::ExchangeError;

/// The four flow valves, named by the path they gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Valve {
    /// A: supplier pools → stage 1
    SupplyFeed,
    /// B: stage 1 → customer pool
    CustomerRelease,
    /// C: customer pool → stage 2
    CustomerIntake,
    /// D: stage 2 → vault or supplier pools
    SettlementDrain,
}

impl Valve {
    pub const ALL: [Valve; 4] = [
        Valve::SupplyFeed,
        Valve::CustomerRelease,
        Valve::CustomerIntake,
        Valve::SettlementDrain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Valve::SupplyFeed => "supply-feed",
            Valve::CustomerRelease => "customer-release",
            Valve::CustomerIntake => "customer-intake",
            Valve::SettlementDrain => "settlement-drain",
        }
    }

    fn index(&self) -> usize {
        match self {
            Valve::SupplyFeed => 0,
            Valve::CustomerRelease => 1,
            Valve::CustomerIntake => 2,
            Valve::SettlementDrain => 3,
        }
    }
}

/// Physical gate port. Implementations wrap whatever switch the
/// deployment's transport hardware exposes.
pub trait GateDevice {
    fn set_open(&mut self, open: bool);
    fn is_open(&self) -> bool;
}

/// In-memory gate backed by a shared handle, for tests and the demo.
#[derive(Debug, Clone, Default)]
pub struct MemoryGate {
    open: Rc<Cell<bool>>,
}

impl MemoryGate {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GateDevice for MemoryGate {
    fn set_open(&mut self, open: bool) {
        self.open.set(open);
    }

    fn is_open(&self) -> bool {
        self.open.get()
    }
}

/// Idempotent controller over the four valves.
///
/// Operations on an absent device are silently skipped; absence is a
/// missing-device condition surfaced by [`ValveBank::verify_devices`] at
/// initialization, never by the per-valve operations themselves.
pub struct ValveBank {
    gates: [Option<Box<dyn GateDevice>>; 4],
}

impl ValveBank {
    pub fn new(
        supply_feed: Box<dyn GateDevice>,
        customer_release: Box<dyn GateDevice>,
        customer_intake: Box<dyn GateDevice>,
        settlement_drain: Box<dyn GateDevice>,
    ) -> Self {
        Self {
            gates: [
                Some(supply_feed),
                Some(customer_release),
                Some(customer_intake),
                Some(settlement_drain),
            ],
        }
    }

    /// Bank with possibly-absent devices, in [`Valve::ALL`] order.
    pub fn from_devices(gates: [Option<Box<dyn GateDevice>>; 4]) -> Self {
        Self { gates }
    }

    /// Bank of in-memory gates plus handles for external inspection.
    pub fn in_memory() -> (Self, [MemoryGate; 4]) {
        let handles = [
            MemoryGate::new(),
            MemoryGate::new(),
            MemoryGate::new(),
            MemoryGate::new(),
        ];
        let bank = Self::new(
            Box::new(handles[0].clone()),
            Box::new(handles[1].clone()),
            Box::new(handles[2].clone()),
            Box::new(handles[3].clone()),
        );
        (bank, handles)
    }

    /// All four devices must be present before the core may run.
    pub fn verify_devices(&self) -> Result<(), ExchangeError> {
        for valve in Valve::ALL {
            if self.gates[valve.index()].is_none() {
                return Err(ExchangeError::DeviceMissing(format!(
                    "valve {}",
                    valve.as_str()
                )));
            }
        }
        Ok(())
    }

    pub fn open(&mut self, valve: Valve) {
        if let Some(gate) = &mut self.gates[valve.index()] {
            gate.set_open(true);
        }
    }

    pub fn close(&mut self, valve: Valve) {
        if let Some(gate) = &mut self.gates[valve.index()] {
            gate.set_open(false);
        }
    }

    pub fn is_open(&self, valve: Valve) -> bool {
        self.gates[valve.index()]
            .as_ref()
            .is_some_and(|g| g.is_open())
    }

    pub fn close_all(&mut self) {
        for valve in Valve::ALL {
            self.close(valve);
        }
    }

    /// Currently open valves, in [`Valve::ALL`] order.
    pub fn open_set(&self) -> Vec<Valve> {
        Valve::ALL.into_iter().filter(|v| self.is_open(*v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_close_idempotent() {
        let (mut bank, _) = ValveBank::in_memory();
        bank.open(Valve::SupplyFeed);
        bank.open(Valve::SupplyFeed);
        assert!(bank.is_open(Valve::SupplyFeed));

        bank.close(Valve::SupplyFeed);
        bank.close(Valve::SupplyFeed);
        assert!(!bank.is_open(Valve::SupplyFeed));
    }

    #[test]
    fn test_open_set_ordering() {
        let (mut bank, _) = ValveBank::in_memory();
        bank.open(Valve::SettlementDrain);
        bank.open(Valve::CustomerRelease);
        assert_eq!(
            bank.open_set(),
            vec![Valve::CustomerRelease, Valve::SettlementDrain]
        );
    }

    #[test]
    fn test_missing_device_ops_are_silent() {
        let mut bank = ValveBank::from_devices([
            Some(Box::new(MemoryGate::new())),
            None,
            Some(Box::new(MemoryGate::new())),
            None,
        ]);
        // No panic, no effect.
        bank.open(Valve::CustomerRelease);
        assert!(!bank.is_open(Valve::CustomerRelease));
    }

    #[test]
    fn test_verify_devices_reports_missing() {
        let bank = ValveBank::from_devices([Some(Box::new(MemoryGate::new())), None, None, None]);
        let err = bank.verify_devices().unwrap_err();
        assert_eq!(err.code(), "DEVICE_MISSING");

        let (bank, _) = ValveBank::in_memory();
        assert!(bank.verify_devices().is_ok());
    }

    #[test]
    fn test_handles_observe_bank_state() {
        let (mut bank, handles) = ValveBank::in_memory();
        bank.open(Valve::CustomerIntake);
        assert!(handles[2].is_open());
        assert!(!handles[0].is_open());
    }
}
