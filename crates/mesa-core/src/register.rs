//! # Cash Register
//!
//! Reconciliation for the caja registradora.
//!
//! ```text
//! open(float) ──► sales / incomes / expenses / extractions ──► close(counted)
//!                                                                   │
//!                      expected = float + cash in − cash out ◄──────┘
//!                      difference = counted − expected
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::CashRegister;

/// Counted cash against what the ledger says should be in the drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Reconciliation {
    pub expected: Money,
    pub counted: Money,
    /// Positive when there is more cash than expected.
    pub difference: Money,
}

impl Reconciliation {
    pub fn is_balanced(&self) -> bool {
        self.difference.is_zero()
    }
}

pub fn reconcile(expected: Money, counted: Money) -> Reconciliation {
    Reconciliation {
        expected,
        counted,
        difference: counted - expected,
    }
}

/// Close record written when no register was open.
///
/// Opened and closed at the same instant, with the counted amount as float,
/// so closing never fails.
pub fn synthetic_close(
    id: impl Into<String>,
    restaurant_id: impl Into<String>,
    now: DateTime<Utc>,
    counted: Money,
) -> CashRegister {
    CashRegister {
        id: id.into(),
        restaurant_id: restaurant_id.into(),
        opening_cents: counted.cents(),
        opened_at: now,
        closing_cents: Some(counted.cents()),
        closed_at: Some(now),
        withdrawn_cents: 0,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile() {
        let r = reconcile(Money::from_cents(10_000), Money::from_cents(9_500));
        assert_eq!(r.difference.cents(), -500);
        assert!(!r.is_balanced());
        assert!(reconcile(Money::from_cents(1), Money::from_cents(1)).is_balanced());
    }

    #[test]
    fn test_synthetic_close_has_equal_timestamps() {
        let now = Utc::now();
        let reg = synthetic_close("c-1", "r", now, Money::from_cents(7_000));
        assert_eq!(Some(reg.opened_at), reg.closed_at);
        assert_eq!(reg.opening_cents, 7_000);
        assert_eq!(reg.closing_cents, Some(7_000));
        assert!(!reg.is_open());
    }
}
