//! # fee-report
//!
//! Enterprise fee and tax aggregation for marketplace order reporting.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Order Fact Source                        │
//! │   (filters + permission → completed orders)              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [extract + fan-out]
//! ┌─────────────────────────────────────────────────────────┐
//! │   (order, fee, tax rate | null, supplier) tuples         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [group + ledger totals]
//! ┌─────────────────────────────────────────────────────────┐
//! │   GroupKey → distinct orders → exact decimal totals      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [project + assemble]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Detail rows + distributor/producer/order cycle         │
//! │   summary rows                                           │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod store;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::model::{
        Adjustable, Adjustment, Dataset, Enterprise, EnterpriseFee, LineItem, Order, OrderCycle,
        Originator, TaxRate,
    };
    pub use crate::pipeline::{
        build_report, run_report, GroupKey, ReportError, ReportOptions, ReportResult, Totals,
    };
    pub use crate::report::{GroupingLevel, OutputFormat, ReportOutput, ReportRow, RowKind};
    pub use crate::store::{
        AllowAll, Catalog, Ledger, MemoryStore, OrderPermission, OrderSource, ReportFilters,
        SqliteStore,
    };
}

pub use pipeline::{build_report, run_report, ReportOptions};
pub use report::ReportOutput;
pub use store::ReportFilters;
