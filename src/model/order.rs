//! Orders, line items and adjustments.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{
    AdjustmentId, AdjustmentKind, EnterpriseFeeId, EnterpriseId, LineItemId, OrderCycleId,
    OrderId, TaxRateId,
};

/// A placed order, read-only for reporting purposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub number: String,
    pub distributor_id: EnterpriseId,
    pub order_cycle_id: OrderCycleId,
    /// Orders without a completion time are still in checkout.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    /// Every adjustment belonging to this order, including ones charged on
    /// line items or on other adjustments.
    #[serde(default)]
    pub adjustments: Vec<Adjustment>,
}

impl Order {
    /// Distinct suppliers of this order's line items, in id order.
    pub fn supplier_ids(&self) -> BTreeSet<EnterpriseId> {
        self.line_items.iter().map(|item| item.supplier_id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub supplier_id: EnterpriseId,
}

/// A monetary delta attached to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub id: AdjustmentId,
    pub order_id: OrderId,
    pub amount: Decimal,
    pub originator: Originator,
    pub adjustable: Adjustable,
    /// Set on tax adjustments whose amount is already embedded in the
    /// adjustable's price.
    #[serde(default)]
    pub included: bool,
    #[serde(default)]
    pub label: String,
}

impl Adjustment {
    pub fn kind(&self) -> AdjustmentKind {
        self.originator.kind()
    }
}

/// The definition that caused an adjustment to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Originator {
    EnterpriseFee(EnterpriseFeeId),
    TaxRate(TaxRateId),
}

impl Originator {
    pub fn kind(&self) -> AdjustmentKind {
        match self {
            Originator::EnterpriseFee(_) => AdjustmentKind::EnterpriseFee,
            Originator::TaxRate(_) => AdjustmentKind::Tax,
        }
    }

    /// The raw id of the originating definition.
    pub fn raw_id(&self) -> i64 {
        match self {
            Originator::EnterpriseFee(id) => id.0,
            Originator::TaxRate(id) => id.0,
        }
    }
}

/// What an adjustment is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Adjustable {
    Order(OrderId),
    LineItem(LineItemId),
    Adjustment(AdjustmentId),
}

impl Adjustable {
    pub fn type_name(&self) -> &'static str {
        match self {
            Adjustable::Order(_) => "order",
            Adjustable::LineItem(_) => "line_item",
            Adjustable::Adjustment(_) => "adjustment",
        }
    }

    pub fn raw_id(&self) -> i64 {
        match self {
            Adjustable::Order(id) => id.0,
            Adjustable::LineItem(id) => id.0,
            Adjustable::Adjustment(id) => id.0,
        }
    }
}
