//! # Payments Summary
//!
//! Pure aggregation behind `GET /api/pagos-resumen`.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  seven fetches (concurrent, in the API layer)                           │
//! │                                                                         │
//! │  open register ─┐                                                       │
//! │  virtual moves ─┼──► dinero   { efectivo, virtual, total, cajaAbierta } │
//! │  incomes ───────┼──► ingresos { total, cantidad, recientes }            │
//! │  expenses ──────┼──► egresos  { total, cantidad, recientes }            │
//! │  mesa tickets ──┤                                                       │
//! │  takeaway ──────┼──► ventas   { efectivo, virtual, total, cantidad,     │
//! │  delivery ──────┘               porTipo }                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - `dinero.efectivo` is the opening float of the open register plus cash
//!   incomes minus cash expenses. Incomes without a method count as cash.
//! - The float never shows up in `ventas`.
//! - `ventas.total` is always `ventas.efectivo + ventas.virtual`.
//! - With no tickets in the period, sales are rebuilt from `venta` incomes.
//!   Legacy incomes without a method only count when their reason names an
//!   order type.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{
    CashRegister, Expense, Income, IncomeSource, OrderKind, PaymentMethod, Ticket,
    VirtualMovement,
};
use crate::validation::fold_lowercase;

/// Words that mark a legacy income as a sale.
pub const SALE_KEYWORDS: [&str; 5] = ["mesa", "takeaway", "delivery", "venta", "pedido"];

// =============================================================================
// Input & Output
// =============================================================================

/// Everything the summary needs, already scoped to one restaurant and period.
#[derive(Debug, Clone, Default)]
pub struct SummaryInput {
    pub open_register: Option<CashRegister>,
    pub virtual_movements: Vec<VirtualMovement>,
    pub incomes: Vec<Income>,
    pub expenses: Vec<Expense>,
    pub mesa_tickets: Vec<Ticket>,
    pub takeaway_tickets: Vec<Ticket>,
    pub delivery_tickets: Vec<Ticket>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentsSummary {
    pub dinero: CashPosition,
    pub ingresos: LedgerBucket<Income>,
    pub egresos: LedgerBucket<Expense>,
    pub ventas: SalesBreakdown,
}

/// Money on hand right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashPosition {
    #[serde(rename = "efectivo")]
    pub cash: Money,
    #[serde(rename = "virtual")]
    pub virtual_balance: Money,
    pub total: Money,
    #[serde(rename = "cajaAbierta")]
    pub register_open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerBucket<T> {
    pub total: Money,
    #[serde(rename = "cantidad")]
    pub count: usize,
    /// Most recent first, truncated.
    #[serde(rename = "recientes")]
    pub recent: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesBreakdown {
    #[serde(rename = "efectivo")]
    pub cash: Money,
    #[serde(rename = "virtual")]
    pub virtual_sales: Money,
    pub total: Money,
    #[serde(rename = "cantidad")]
    pub count: usize,
    #[serde(rename = "porTipo")]
    pub by_kind: SalesByKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesByKind {
    pub mesa: Money,
    pub takeaway: Money,
    pub delivery: Money,
}

impl SalesByKind {
    fn add(&mut self, kind: OrderKind, amount: Money) {
        match kind {
            OrderKind::Mesa => self.mesa += amount,
            OrderKind::Takeaway => self.takeaway += amount,
            OrderKind::Delivery => self.delivery += amount,
        }
    }
}

impl SalesBreakdown {
    fn add(&mut self, method: PaymentMethod, kind: Option<OrderKind>, amount: Money) {
        match method {
            PaymentMethod::Efectivo => self.cash += amount,
            PaymentMethod::Virtual => self.virtual_sales += amount,
        }
        if let Some(kind) = kind {
            self.by_kind.add(kind, amount);
        }
        self.count += 1;
        self.total = self.cash + self.virtual_sales;
    }
}

// =============================================================================
// Aggregation
// =============================================================================

/// Builds the summary. `recent_limit` caps both `recientes` lists.
pub fn compute_summary(input: SummaryInput, recent_limit: usize) -> PaymentsSummary {
    let SummaryInput {
        open_register,
        virtual_movements,
        incomes,
        expenses,
        mesa_tickets,
        takeaway_tickets,
        delivery_tickets,
    } = input;

    let dinero = cash_position(open_register.as_ref(), &virtual_movements, &incomes, &expenses);

    let tickets: Vec<&Ticket> = mesa_tickets
        .iter()
        .chain(takeaway_tickets.iter())
        .chain(delivery_tickets.iter())
        .collect();

    let ventas = if tickets.is_empty() {
        sales_from_incomes(&incomes)
    } else {
        sales_from_tickets(&tickets)
    };

    PaymentsSummary {
        dinero,
        ingresos: bucket(incomes, recent_limit, |i| i.amount(), |i| i.created_at),
        egresos: bucket(expenses, recent_limit, |e| e.amount(), |e| e.created_at),
        ventas,
    }
}

fn cash_position(
    open_register: Option<&CashRegister>,
    virtual_movements: &[VirtualMovement],
    incomes: &[Income],
    expenses: &[Expense],
) -> CashPosition {
    let float = open_register.map(CashRegister::opening).unwrap_or_default();

    let cash_in: Money = incomes
        .iter()
        .filter(|i| i.payment_method != Some(PaymentMethod::Virtual))
        .map(Income::amount)
        .sum();

    let cash_out: Money = expenses
        .iter()
        .filter(|e| e.account == PaymentMethod::Efectivo)
        .map(Expense::amount)
        .sum();

    let cash = float + cash_in - cash_out;
    let virtual_balance: Money = virtual_movements
        .iter()
        .map(|m| Money::from_cents(m.amount_cents))
        .sum();

    CashPosition {
        cash,
        virtual_balance,
        total: cash + virtual_balance,
        register_open: open_register.is_some(),
    }
}

fn sales_from_tickets(tickets: &[&Ticket]) -> SalesBreakdown {
    let mut ventas = SalesBreakdown::default();
    for ticket in tickets {
        ventas.add(ticket.payment_method, Some(ticket.kind), ticket.total());
    }
    ventas
}

fn sales_from_incomes(incomes: &[Income]) -> SalesBreakdown {
    let mut ventas = SalesBreakdown::default();

    for income in incomes {
        let folded = fold_lowercase(&income.reason);
        let method = match (income.payment_method, income.source) {
            (Some(method), IncomeSource::Venta) => method,
            (None, _) if mentions_sale(&folded) => PaymentMethod::Efectivo,
            _ => continue,
        };
        ventas.add(method, kind_from_reason(&folded), income.amount());
    }

    ventas
}

/// Whether an already folded reason names an order type or a sale.
pub fn mentions_sale(folded_reason: &str) -> bool {
    SALE_KEYWORDS.iter().any(|k| folded_reason.contains(k))
}

fn kind_from_reason(folded_reason: &str) -> Option<OrderKind> {
    OrderKind::ALL
        .into_iter()
        .find(|kind| folded_reason.contains(kind.as_str()))
}

fn bucket<T, A, D>(mut entries: Vec<T>, limit: usize, amount: A, date: D) -> LedgerBucket<T>
where
    A: Fn(&T) -> Money,
    D: Fn(&T) -> chrono::DateTime<chrono::Utc>,
{
    let total = entries.iter().map(&amount).sum();
    let count = entries.len();

    entries.sort_by_key(|e| std::cmp::Reverse(date(e)));
    entries.truncate(limit);

    LedgerBucket {
        total,
        count,
        recent: entries,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
