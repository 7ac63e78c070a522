//! Read-only domain records consumed by the report pipeline.

pub mod catalog;
pub mod dataset;
pub mod order;
pub mod types;

pub use catalog::{Enterprise, EnterpriseFee, OrderCycle, TaxRate};
pub use dataset::Dataset;
pub use order::{Adjustable, Adjustment, LineItem, Order, Originator};
pub use types::{
    AdjustmentId, AdjustmentKind, EnterpriseFeeId, EnterpriseId, FeeType, LineItemId,
    OrderCycleId, OrderId, TaxRateId,
};
