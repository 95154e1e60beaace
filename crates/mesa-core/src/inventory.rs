//! # Inventory Module
//!
//! Plans the stock decrement that follows a sale.
//!
//! ## Matching
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sold line "Coca Cola 500"                                              │
//! │        │ normalize: lowercase, fold accents, collapse spaces            │
//! │        ▼                                                                │
//! │  drinks ──► exact match? ──► substring either way? ──► first hit wins   │
//! │        │ no drink matched                                               │
//! │        ▼                                                                │
//! │  raw materials ──► same rules                                           │
//! │        │ nothing matched                                                │
//! │        ▼                                                                │
//! │  unmatched (logged by the caller, line skipped)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The plan is computed on a working copy so repeated lines for the same item
//! accumulate. Stock never goes below zero.
//!
//! Applying a plan is not idempotent: the same sale applied twice decrements
//! twice.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::types::{Drink, OrderLine, RawMaterial};
use crate::validation::fold_lowercase;

// =============================================================================
// Types
// =============================================================================

/// Which stock table an item lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum StockTarget {
    Drink,
    RawMaterial,
}

/// New stock level for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockChange {
    pub target: StockTarget,
    pub id: String,
    pub name: String,
    pub previous: i64,
    pub new_stock: i64,
}

impl StockChange {
    /// Units actually removed (less than sold when the floor was hit).
    pub fn decremented(&self) -> i64 {
        self.previous - self.new_stock
    }
}

/// Result of planning a decrement: what to write and what was not found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockPlan {
    pub changes: Vec<StockChange>,
    pub unmatched: Vec<String>,
}

impl StockPlan {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

// =============================================================================
// Name Matching
// =============================================================================

/// Lowercases, folds accents and collapses whitespace.
///
/// ## Example
/// ```rust
/// use mesa_core::inventory::normalize_name;
///
/// assert_eq!(normalize_name("  Agua   Mineral SIN gas "), "agua mineral sin gas");
/// assert_eq!(normalize_name("Limón"), "limon");
/// ```
pub fn normalize_name(name: &str) -> String {
    fold_lowercase(name)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Index of the best candidate for `name`.
///
/// An exact normalized match wins; otherwise the first candidate whose name
/// contains, or is contained in, the query. Empty names never match.
pub fn find_match<T>(name: &str, candidates: &[T], name_of: impl Fn(&T) -> &str) -> Option<usize> {
    let query = normalize_name(name);
    if query.is_empty() {
        return None;
    }

    let normalized: Vec<String> = candidates.iter().map(|c| normalize_name(name_of(c))).collect();

    normalized.iter().position(|c| *c == query).or_else(|| {
        normalized
            .iter()
            .position(|c| !c.is_empty() && (c.contains(&query) || query.contains(c.as_str())))
    })
}

// =============================================================================
// Planning
// =============================================================================

/// Plans the decrement for `lines` against the current stock.
pub fn plan_stock_decrement(
    lines: &[OrderLine],
    drinks: &[Drink],
    raw_materials: &[RawMaterial],
) -> StockPlan {
    let mut plan = StockPlan::default();
    let mut slots: HashMap<(StockTarget, usize), usize> = HashMap::new();

    for line in lines {
        let hit = find_match(&line.name, drinks, |d| d.name.as_str())
            .map(|i| (StockTarget::Drink, i))
            .or_else(|| {
                find_match(&line.name, raw_materials, |r| r.name.as_str())
                    .map(|i| (StockTarget::RawMaterial, i))
            });

        let Some(key) = hit else {
            plan.unmatched.push(line.name.clone());
            continue;
        };

        let slot = *slots.entry(key).or_insert_with(|| {
            let (target, index) = key;
            let (id, name, stock) = match target {
                StockTarget::Drink => {
                    let d = &drinks[index];
                    (d.id.clone(), d.name.clone(), d.stock)
                }
                StockTarget::RawMaterial => {
                    let r = &raw_materials[index];
                    (r.id.clone(), r.name.clone(), r.stock)
                }
            };
            plan.changes.push(StockChange {
                target,
                id,
                name,
                previous: stock,
                new_stock: stock,
            });
            plan.changes.len() - 1
        });

        let change = &mut plan.changes[slot];
        change.new_stock = (change.new_stock - line.quantity.max(0)).max(0);
    }

    plan
}

// =============================================================================
// Unit Tests
// =============================================================================
