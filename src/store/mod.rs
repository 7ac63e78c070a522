//! Read-side collaborators of the report pipeline.
//!
//! The pipeline never talks to storage directly. It goes through three
//! traits:
//!
//! - [`OrderSource`] supplies the candidate orders for a filter set.
//! - [`Ledger`] answers set-based sums over adjustments.
//! - [`Catalog`] resolves definition records by id.
//!
//! Two implementations ship with the crate: [`MemoryStore`] over a
//! [`Dataset`](crate::model::Dataset) and [`SqliteStore`] over a SQLite file.

mod memory;
mod query;
mod sqlite;

pub use memory::MemoryStore;
pub use query::{AmountQuery, ReportFilters};
pub use sqlite::SqliteStore;

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::model::{
    AdjustmentId, Enterprise, EnterpriseFee, EnterpriseFeeId, EnterpriseId, Order, OrderCycle,
    OrderCycleId, OrderId, TaxRate, TaxRateId,
};

/// Errors raised by stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid decimal in {column}: {value}")]
    InvalidDecimal { column: &'static str, value: String },

    #[error("Invalid value in {column}: {value}")]
    InvalidValue { column: &'static str, value: String },

    #[error("Ledger schema version {found} does not match expected {expected}")]
    SchemaVersion { found: i32, expected: i32 },

    #[error("Adjustment {adjustment} names order {declared} but belongs to order {order}")]
    OrderMismatch {
        adjustment: AdjustmentId,
        declared: OrderId,
        order: OrderId,
    },

    #[error("Failed to determine ledger directory")]
    NoLedgerDir,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Opaque "can this caller see order X" capability.
pub trait OrderPermission {
    fn can_view(&self, order: &Order) -> bool;
}

impl<F> OrderPermission for F
where
    F: Fn(&Order) -> bool,
{
    fn can_view(&self, order: &Order) -> bool {
        self(order)
    }
}

/// Permission that sees every order.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl OrderPermission for AllowAll {
    fn can_view(&self, _order: &Order) -> bool {
        true
    }
}

/// Supplies the orders a report runs over.
pub trait OrderSource {
    /// Completed orders matching the order-level filters that the caller is
    /// permitted to see, fully loaded with line items and adjustments.
    fn search(
        &self,
        filters: &ReportFilters,
        permission: &dyn OrderPermission,
    ) -> StoreResult<Vec<Order>>;
}

/// Read-only monetary ledger of adjustments.
pub trait Ledger {
    /// Exact sum of the selected adjustment amounts; zero when nothing matches.
    fn amount_sum(&self, query: &AmountQuery) -> StoreResult<Decimal>;

    /// Ids of the selected adjustments.
    fn adjustment_ids(&self, query: &AmountQuery) -> StoreResult<BTreeSet<AdjustmentId>>;
}

/// Point reads of definition records. Missing records are `None`.
pub trait Catalog {
    fn enterprise(&self, id: EnterpriseId) -> StoreResult<Option<Enterprise>>;

    fn enterprise_fee(&self, id: EnterpriseFeeId) -> StoreResult<Option<EnterpriseFee>>;

    fn tax_rate(&self, id: TaxRateId) -> StoreResult<Option<TaxRate>>;

    fn order_cycle(&self, id: OrderCycleId) -> StoreResult<Option<OrderCycle>>;
}
