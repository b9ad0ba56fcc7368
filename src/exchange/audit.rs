//! Audit Log - transaction-completion records
//!
//! One timestamped CSV line per completed staged exchange.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;

use super::state::Direction;
use crate::core_types::Quantity;

/// Emitted once per completed staged exchange.
#[derive(Debug, Clone)]
pub struct ExchangeRecord {
    pub id: ulid::Ulid,
    pub direction: Direction,
    pub item: String,
    pub goods_qty: Quantity,
    pub currency_qty: Quantity,
    pub success: bool,
}

impl ExchangeRecord {
    pub fn success(
        direction: Direction,
        item: impl Into<String>,
        goods_qty: Quantity,
        currency_qty: Quantity,
    ) -> Self {
        Self {
            id: ulid::Ulid::new(),
            direction,
            item: item.into(),
            goods_qty,
            currency_qty,
            success: true,
        }
    }
}

/// Writes exchange records to a CSV file.
pub struct AuditLog {
    file: File,
    entry_count: u64,
}

impl AuditLog {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        writeln!(file, "timestamp,id,direction,item,goods_qty,currency_qty,success")?;
        Ok(Self {
            file,
            entry_count: 0,
        })
    }

    pub fn append(&mut self, record: &ExchangeRecord) -> io::Result<()> {
        writeln!(
            self.file,
            "{},{},{},{},{},{},{}",
            Utc::now().to_rfc3339(),
            record.id,
            record.direction,
            record.item,
            record.goods_qty,
            record.currency_qty,
            record.success
        )?;
        self.entry_count += 1;
        Ok(())
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_counts_entries() {
        let path = std::env::temp_dir().join(format!("tradepost-audit-{}.csv", ulid::Ulid::new()));
        let mut log = AuditLog::create(&path).unwrap();
        assert_eq!(log.entry_count(), 0);

        log.append(&ExchangeRecord::success(Direction::Purchase, "Iron", 2_000_000, 2))
            .unwrap();
        log.append(&ExchangeRecord::success(Direction::Sale, "Gold", 8_800, 1))
            .unwrap();
        assert_eq!(log.entry_count(), 2);

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 3); // header + 2 records
        assert!(written.contains("PURCHASE,Iron,2000000,2,true"));
    }

    #[test]
    fn test_record_ids_are_unique() {
        let a = ExchangeRecord::success(Direction::Purchase, "Iron", 1, 1);
        let b = ExchangeRecord::success(Direction::Purchase, "Iron", 1, 1);
        assert_ne!(a.id, b.id);
    }
}
