//! Storage pool port and in-memory implementation
//!
//! Pools are owned by the surrounding deployment; the core only reads and
//! mutates their contents through the [`Inventory`] port. The port is
//! deliberately narrow: a total-holding query, a stack snapshot, a
//! single-stack withdrawal that may silently under-move, and a deposit.
//! The resumable transfer primitive is built on top of it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::core_types::Quantity;
use crate::resource::ResourceType;

/// One contiguous stack of a single resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    pub resource: ResourceType,
    pub amount: Quantity,
}

/// Storage pool port.
///
/// Implementations wrap whatever the deployment's physical containers are.
/// The only trusted read is `amount_of`: `withdraw` reports how much it
/// removed, but the underlying transport may silently move less than
/// requested, so callers must verify the actual delta by re-reading
/// `amount_of` before and after.
pub trait Inventory {
    /// Pool name for logging and diagnostics.
    fn name(&self) -> &str;

    /// Total holding of a resource type across all stacks.
    fn amount_of(&self, resource: &ResourceType) -> Quantity;

    /// Snapshot of the pool's current stacks.
    fn stacks(&self) -> Vec<Stack>;

    /// Remove up to `amount` of `resource` from a single stack.
    ///
    /// Returns the amount the transport claims to have removed. May be
    /// less than requested; never more.
    fn withdraw(&mut self, resource: &ResourceType, amount: Quantity) -> Quantity;

    /// Add `amount` of `resource` to the pool.
    fn deposit(&mut self, resource: &ResourceType, amount: Quantity);
}

/// In-memory pool backed by a shared handle.
///
/// Cloning yields another handle to the same pool, so the deployment can
/// hand a pool to the coordinator and keep a handle for inspection. The
/// model is cooperative and single-threaded, hence `Rc<RefCell<..>>`.
///
/// An optional per-call transfer cap models a rate-limited transport:
/// each `withdraw` call moves at most `cap` units regardless of the
/// requested amount. This is how tests exercise the resumability of the
/// staging protocol.
#[derive(Debug, Clone)]
pub struct MemoryInventory {
    name: Rc<str>,
    inner: Rc<RefCell<Inner>>,
}

#[derive(Debug)]
struct Inner {
    stacks: Vec<Stack>,
    transfer_cap: Option<Quantity>,
}

impl MemoryInventory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().into(),
            inner: Rc::new(RefCell::new(Inner {
                stacks: Vec::new(),
                transfer_cap: None,
            })),
        }
    }

    /// Pool whose transport moves at most `cap` units per withdraw call.
    pub fn with_transfer_cap(name: impl Into<String>, cap: Quantity) -> Self {
        let pool = Self::new(name);
        pool.inner.borrow_mut().transfer_cap = Some(cap);
        pool
    }

    /// Seed the pool with an initial stack (test/demo setup).
    pub fn seed(&self, resource: ResourceType, amount: Quantity) {
        if amount > 0 {
            self.inner.borrow_mut().merge(resource, amount);
        }
    }

    /// True if the pool holds nothing at all.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().stacks.is_empty()
    }
}

impl Inner {
    fn merge(&mut self, resource: ResourceType, amount: Quantity) {
        if let Some(stack) = self.stacks.iter_mut().find(|s| s.resource == resource) {
            stack.amount = stack.amount.saturating_add(amount);
        } else {
            self.stacks.push(Stack { resource, amount });
        }
    }
}

impl Inventory for MemoryInventory {
    fn name(&self) -> &str {
        &self.name
    }

    fn amount_of(&self, resource: &ResourceType) -> Quantity {
        self.inner
            .borrow()
            .stacks
            .iter()
            .filter(|s| s.resource == *resource)
            .map(|s| s.amount)
            .sum()
    }

    fn stacks(&self) -> Vec<Stack> {
        self.inner.borrow().stacks.clone()
    }

    fn withdraw(&mut self, resource: &ResourceType, amount: Quantity) -> Quantity {
        let mut inner = self.inner.borrow_mut();
        let cap = inner.transfer_cap;
        let Some(pos) = inner.stacks.iter().position(|s| s.resource == *resource) else {
            return 0;
        };
        let mut take = amount.min(inner.stacks[pos].amount);
        if let Some(cap) = cap {
            take = take.min(cap);
        }
        inner.stacks[pos].amount -= take;
        if inner.stacks[pos].amount == 0 {
            inner.stacks.remove(pos);
        }
        take
    }

    fn deposit(&mut self, resource: &ResourceType, amount: Quantity) {
        if amount > 0 {
            self.inner.borrow_mut().merge(resource.clone(), amount);
        }
    }
}
