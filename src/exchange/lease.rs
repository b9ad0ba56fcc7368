//! Lease Lock
//!
//! A time-bounded mutual-exclusion token guarding the shared transport
//! path. The record lives in a medium shared by every controller instance
//! (a file, shared memory, an external KV store) behind the [`LeaseStore`]
//! port, because independent controllers may run against the same physical
//! pools. Expiry makes the lock tolerant of crash-without-release: a
//! record whose expiry has passed is treated as absent.
//!
//! The owning controller re-acquires every tick while busy, extending the
//! expiry. That renewal - not one unbroken critical section - is what
//! keeps a multi-tick staged exchange exclusive.
//!
//! Release unconditionally clears the record regardless of current owner
//! (last-writer-wins). A stale controller whose lease just expired can
//! therefore clear a new owner's fresh record; the window is narrow and
//! accepted - see DESIGN.md.

use std::cell::RefCell;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::rc::Rc;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use tracing::debug;

use super::error::ExchangeError;

/// Default lease duration in seconds.
pub const DEFAULT_LEASE_SECS: i64 = 60;

/// Parsed lease record.
///
/// Wire format is two colon-delimited lines:
///
/// ```text
/// Owner:depot-alpha
/// Expires:2026-08-07T12:34:56.000000Z
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseRecord {
    pub owner: String,
    pub expires_at_utc: DateTime<Utc>,
}

impl LeaseRecord {
    /// Parse the two-line record. Returns `None` for empty or malformed
    /// text, which callers treat the same as an absent record.
    pub fn parse(text: &str) -> Option<Self> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let owner_line = lines.next()?;
        let expires_line = lines.next()?;

        let owner = owner_line.strip_prefix("Owner:")?.trim();
        let expires = expires_line.strip_prefix("Expires:")?.trim();
        if owner.is_empty() {
            return None;
        }

        let expires_at_utc = DateTime::parse_from_rfc3339(expires).ok()?.with_timezone(&Utc);
        Some(Self {
            owner: owner.to_string(),
            expires_at_utc,
        })
    }

    pub fn to_text(&self) -> String {
        format!(
            "Owner:{}\nExpires:{}",
            self.owner,
            self.expires_at_utc.to_rfc3339_opts(SecondsFormat::Nanos, true)
        )
    }

    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at_utc
    }
}

/// Shared-medium port for the lease record.
pub trait LeaseStore {
    fn read(&self) -> Result<Option<String>, ExchangeError>;
    fn write(&mut self, text: &str) -> Result<(), ExchangeError>;
    fn clear(&mut self) -> Result<(), ExchangeError>;
}

/// In-memory lease medium backed by a shared handle. Clones share the
/// same record, letting several controller instances contend in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryLeaseStore {
    record: Rc<RefCell<Option<String>>>,
}

impl MemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LeaseStore for MemoryLeaseStore {
    fn read(&self) -> Result<Option<String>, ExchangeError> {
        Ok(self.record.borrow().clone())
    }

    fn write(&mut self, text: &str) -> Result<(), ExchangeError> {
        *self.record.borrow_mut() = Some(text.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ExchangeError> {
        *self.record.borrow_mut() = None;
        Ok(())
    }
}

/// File-backed lease medium for multi-process deployments.
#[derive(Debug, Clone)]
pub struct FileLeaseStore {
    path: PathBuf,
}

impl FileLeaseStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LeaseStore for FileLeaseStore {
    fn read(&self) -> Result<Option<String>, ExchangeError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ExchangeError::LeaseIo(e.to_string())),
        }
    }

    fn write(&mut self, text: &str) -> Result<(), ExchangeError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ExchangeError::LeaseIo(e.to_string()))?;
        }
        std::fs::write(&self.path, text).map_err(|e| ExchangeError::LeaseIo(e.to_string()))
    }

    fn clear(&mut self) -> Result<(), ExchangeError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ExchangeError::LeaseIo(e.to_string())),
        }
    }
}

/// Lease-based mutual exclusion over a [`LeaseStore`].
pub struct LeaseLock {
    store: Box<dyn LeaseStore>,
}

impl LeaseLock {
    pub fn new(store: Box<dyn LeaseStore>) -> Self {
        Self { store }
    }

    /// Try to acquire or renew the lease for `owner`.
    ///
    /// Succeeds when the record is absent, malformed, expired, or already
    /// owned by `owner`; on success a fresh record with
    /// `expiry = now + lease_secs` is written. Fails only against an
    /// unexpired record held by somebody else.
    pub fn acquire(&mut self, owner: &str, lease_secs: i64) -> Result<bool, ExchangeError> {
        self.acquire_at(owner, lease_secs, Utc::now())
    }

    fn acquire_at(
        &mut self,
        owner: &str,
        lease_secs: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, ExchangeError> {
        if let Some(text) = self.store.read()?
            && let Some(existing) = LeaseRecord::parse(&text)
            && !existing.is_expired(now)
            && existing.owner != owner
        {
            debug!(
                holder = %existing.owner,
                expires = %existing.expires_at_utc,
                "lease held elsewhere"
            );
            return Ok(false);
        }

        let record = LeaseRecord {
            owner: owner.to_string(),
            expires_at_utc: now + Duration::seconds(lease_secs),
        };
        self.store.write(&record.to_text())?;
        Ok(true)
    }

    /// Clear the record, no questions asked (last-writer-wins).
    pub fn release(&mut self) -> Result<(), ExchangeError> {
        self.store.clear()
    }

    /// Current record, if any parses.
    pub fn current(&self) -> Result<Option<LeaseRecord>, ExchangeError> {
        Ok(self.store.read()?.and_then(|t| LeaseRecord::parse(&t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_over(store: &MemoryLeaseStore) -> LeaseLock {
        LeaseLock::new(Box::new(store.clone()))
    }

    #[test]
    fn test_record_text_roundtrip() {
        let record = LeaseRecord {
            owner: "depot-alpha".to_string(),
            expires_at_utc: Utc::now(),
        };
        let parsed = LeaseRecord::parse(&record.to_text()).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(LeaseRecord::parse("").is_none());
        assert!(LeaseRecord::parse("Owner:alpha").is_none());
        assert!(LeaseRecord::parse("Owner:alpha\nExpires:not-a-time").is_none());
        assert!(LeaseRecord::parse("Holder:alpha\nExpires:2026-01-01T00:00:00Z").is_none());
    }

    #[test]
    fn test_mutual_exclusion_unexpired() {
        let store = MemoryLeaseStore::new();
        let mut alpha = lock_over(&store);
        let mut beta = lock_over(&store);

        assert!(alpha.acquire("alpha", 60).unwrap());
        assert!(!beta.acquire("beta", 60).unwrap());
        // Holder itself still gets through.
        assert!(alpha.acquire("alpha", 60).unwrap());
    }

    #[test]
    fn test_expired_record_is_up_for_grabs() {
        let store = MemoryLeaseStore::new();
        let mut alpha = lock_over(&store);
        let mut beta = lock_over(&store);

        let now = Utc::now();
        assert!(alpha.acquire_at("alpha", 60, now).unwrap());
        // Past the expiry, a different owner takes over without a release.
        let later = now + Duration::seconds(61);
        assert!(beta.acquire_at("beta", 60, later).unwrap());
        assert_eq!(beta.current().unwrap().unwrap().owner, "beta");
    }

    #[test]
    fn test_renewal_extends_expiry_monotonically() {
        let store = MemoryLeaseStore::new();
        let mut lock = lock_over(&store);

        let now = Utc::now();
        assert!(lock.acquire_at("alpha", 60, now).unwrap());
        let first = lock.current().unwrap().unwrap().expires_at_utc;

        for i in 1..5 {
            let tick = now + Duration::seconds(i);
            assert!(lock.acquire_at("alpha", 60, tick).unwrap());
            let renewed = lock.current().unwrap().unwrap().expires_at_utc;
            assert!(renewed > first);
            assert_eq!(renewed, tick + Duration::seconds(60));
        }
    }

    #[test]
    fn test_release_clears_regardless_of_owner() {
        let store = MemoryLeaseStore::new();
        let mut alpha = lock_over(&store);
        let mut beta = lock_over(&store);

        assert!(alpha.acquire("alpha", 60).unwrap());
        beta.release().unwrap();
        assert!(alpha.current().unwrap().is_none());
        assert!(beta.acquire("beta", 60).unwrap());
    }

    #[test]
    fn test_malformed_record_treated_as_absent() {
        let store = MemoryLeaseStore::new();
        let mut raw = store.clone();
        raw.write("garbage").unwrap();

        let mut lock = lock_over(&store);
        assert!(lock.acquire("alpha", 60).unwrap());
        assert_eq!(lock.current().unwrap().unwrap().owner, "alpha");
    }

    #[test]
    fn test_file_store_roundtrip() {
        let path = std::env::temp_dir().join(format!("tradepost-lease-{}", ulid::Ulid::new()));
        let mut store = FileLeaseStore::new(&path);
        assert_eq!(store.read().unwrap(), None);

        store.write("Owner:alpha\nExpires:2026-01-01T00:00:00Z").unwrap();
        assert!(store.read().unwrap().unwrap().starts_with("Owner:alpha"));

        store.clear().unwrap();
        assert_eq!(store.read().unwrap(), None);
        // Clearing an absent record stays quiet.
        store.clear().unwrap();
    }
}
