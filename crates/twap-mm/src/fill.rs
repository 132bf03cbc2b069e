//! Fill handling and execution history.
//!
//! The provider never writes fills itself. Collaborators report executed
//! trades through `FillHandler`; `FillLedger` keeps recent sell volume so
//! the schedule can see what was actually sold in earlier buckets.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracing::{debug, warn};

use twap_core::{OrderSide, Size, Trade};

use crate::error::{MmError, MmResult};

/// Receives executed trades.
pub trait FillHandler: Send + Sync {
    /// Returns whether the trade was recorded.
    fn handle_fill(&self, trade: &Trade) -> MmResult<bool>;
}

/// Read access to executed sell volume.
pub trait ExecutionHistory: Send + Sync {
    /// Instant from which every sell fill is known. Volume before it is
    /// unknown, not zero.
    fn observed_since(&self) -> DateTime<Utc>;

    /// Base volume sold in `[start, end)`.
    fn base_sold_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> MmResult<Size>;
}

#[derive(Debug, Clone)]
struct LedgerEntry {
    trade_id: String,
    timestamp: DateTime<Utc>,
    base_volume: Size,
}

/// In-memory record of recent sell fills.
#[derive(Debug)]
pub struct FillLedger {
    entries: RwLock<Vec<LedgerEntry>>,
    retention: Duration,
    observed_since: DateTime<Utc>,
}

impl Default for FillLedger {
    /// A ledger watching from now.
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl FillLedger {
    /// Create a ledger that sees every fill from `observed_since` on.
    pub fn new(observed_since: DateTime<Utc>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            retention: Duration::days(2),
            observed_since,
        }
    }

    /// Keep fills for `retention` behind the newest one.
    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Number of fills currently held.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl FillHandler for FillLedger {
    fn handle_fill(&self, trade: &Trade) -> MmResult<bool> {
        if trade.side != OrderSide::Sell {
            debug!(trade_id = %trade.trade_id, side = %trade.side, "Ignoring non-sell fill");
            return Ok(false);
        }
        if !trade.base_volume.is_positive() {
            return Err(MmError::Fill(format!(
                "trade {} has non-positive base volume {}",
                trade.trade_id, trade.base_volume
            )));
        }

        let mut entries = self.entries.write();
        if entries.iter().any(|e| e.trade_id == trade.trade_id) {
            warn!(trade_id = %trade.trade_id, "Duplicate fill ignored");
            return Ok(false);
        }

        entries.push(LedgerEntry {
            trade_id: trade.trade_id.clone(),
            timestamp: trade.timestamp,
            base_volume: trade.base_volume,
        });

        let newest = entries
            .iter()
            .map(|e| e.timestamp)
            .max()
            .unwrap_or(trade.timestamp);
        let cutoff = newest - self.retention;
        entries.retain(|e| e.timestamp >= cutoff);

        debug!(
            trade_id = %trade.trade_id,
            base_volume = %trade.base_volume,
            held = entries.len(),
            "Recorded sell fill"
        );
        Ok(true)
    }
}

impl ExecutionHistory for FillLedger {
    fn observed_since(&self) -> DateTime<Utc> {
        self.observed_since
    }

    fn base_sold_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> MmResult<Size> {
        Ok(self
            .entries
            .read()
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp < end)
            .map(|e| e.base_volume)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use twap_core::Price;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 9, hour, min, 0).unwrap()
    }

    fn ledger() -> FillLedger {
        FillLedger::new(at(0, 0))
    }

    fn sell(id: &str, ts: DateTime<Utc>, volume: rust_decimal::Decimal) -> Trade {
        Trade {
            trade_id: id.to_string(),
            timestamp: ts,
            side: OrderSide::Sell,
            price: Price::new(dec!(1)),
            base_volume: Size::new(volume),
            fee: rust_decimal::Decimal::ZERO,
        }
    }

    #[test]
    fn test_sums_fills_in_half_open_window() {
        let ledger = ledger();
        ledger.handle_fill(&sell("a", at(1, 0), dec!(10))).unwrap();
        ledger.handle_fill(&sell("b", at(1, 59), dec!(5))).unwrap();
        ledger.handle_fill(&sell("c", at(2, 0), dec!(7))).unwrap();

        assert_eq!(
            ledger.base_sold_between(at(1, 0), at(2, 0)).unwrap(),
            Size::new(dec!(15))
        );
        assert_eq!(
            ledger.base_sold_between(at(2, 0), at(3, 0)).unwrap(),
            Size::new(dec!(7))
        );
    }

    #[test]
    fn test_ignores_buys_and_duplicates() {
        let ledger = ledger();
        let mut buy = sell("b1", at(1, 0), dec!(3));
        buy.side = OrderSide::Buy;
        assert!(!ledger.handle_fill(&buy).unwrap());
        assert!(ledger.handle_fill(&sell("s1", at(1, 0), dec!(3))).unwrap());
        assert!(!ledger.handle_fill(&sell("s1", at(1, 0), dec!(3))).unwrap());

        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_rejects_empty_fill() {
        let ledger = ledger();
        assert!(ledger.handle_fill(&sell("z", at(1, 0), dec!(0))).is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_prunes_old_fills() {
        let ledger = ledger().with_retention(Duration::hours(1));
        ledger.handle_fill(&sell("old", at(0, 0), dec!(1))).unwrap();
        ledger.handle_fill(&sell("new", at(2, 0), dec!(1))).unwrap();
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_reports_observation_start() {
        let ledger = FillLedger::new(at(12, 0));
        assert_eq!(ledger.observed_since(), at(12, 0));
        assert!(FillLedger::default().observed_since() <= Utc::now());
    }
}
