//! Report rows as handed to renderers.

mod render;

pub use render::{render, render_json, render_text, OutputFormat};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::pipeline::{GroupKey, Totals};

/// Output column names, in display order.
pub const COLUMN_NAMES: [&str; 13] = [
    "distributor",
    "producer",
    "producer_tax_status",
    "order_cycle",
    "enterprise_fee_name",
    "enterprise_fee_type",
    "enterprise_fee_owner",
    "tax_category",
    "tax_rate_name",
    "tax_rate",
    "total_excl_tax",
    "tax",
    "total_incl_tax",
];

/// Level of the distributor → producer → order cycle hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingLevel {
    Distributor,
    Producer,
    OrderCycle,
}

impl GroupingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupingLevel::Distributor => "distributor",
            GroupingLevel::Producer => "producer",
            GroupingLevel::OrderCycle => "order_cycle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    /// One row per group key.
    Detail,
    /// Totals over everything under one node of the hierarchy.
    Summary(GroupingLevel),
}

impl RowKind {
    pub fn label(&self) -> String {
        match self {
            RowKind::Detail => "detail".to_string(),
            RowKind::Summary(level) => format!("summary:{}", level.as_str()),
        }
    }
}

/// Flat column values of a row. Unknown references stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Columns {
    pub distributor: Option<String>,
    pub producer: Option<String>,
    pub producer_tax_status: Option<bool>,
    pub order_cycle: Option<String>,
    pub enterprise_fee_name: Option<String>,
    pub enterprise_fee_type: Option<String>,
    pub enterprise_fee_owner: Option<String>,
    pub tax_category: Option<String>,
    pub tax_rate_name: Option<String>,
    pub tax_rate: Option<Decimal>,
    pub totals: Totals,
}

impl Columns {
    /// Values in [`COLUMN_NAMES`] order. Decimals are strings to keep them
    /// exact.
    pub fn values(&self) -> [Value; 13] {
        let text = |v: &Option<String>| v.clone().map_or(Value::Null, Value::String);
        let decimal = |d: Decimal| Value::String(d.to_string());
        [
            text(&self.distributor),
            text(&self.producer),
            self.producer_tax_status.map_or(Value::Null, Value::Bool),
            text(&self.order_cycle),
            text(&self.enterprise_fee_name),
            text(&self.enterprise_fee_type),
            text(&self.enterprise_fee_owner),
            text(&self.tax_category),
            text(&self.tax_rate_name),
            self.tax_rate.map_or(Value::Null, decimal),
            decimal(self.totals.total_excl_tax()),
            decimal(self.totals.tax()),
            decimal(self.totals.total_incl_tax()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub kind: RowKind,
    /// Set on detail rows only.
    pub key: Option<GroupKey>,
    pub columns: Columns,
}

impl ReportRow {
    pub fn is_summary(&self) -> bool {
        matches!(self.kind, RowKind::Summary(_))
    }

    pub fn totals(&self) -> Totals {
        self.columns.totals
    }

    /// Field name → value mapping of this row.
    pub fn record(&self) -> Map<String, Value> {
        COLUMN_NAMES
            .iter()
            .zip(self.columns.values())
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }
}

/// Ordered rows of one report run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportOutput {
    pub rows: Vec<ReportRow>,
}

impl ReportOutput {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn detail_rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|row| !row.is_summary())
    }

    pub fn summary_rows(&self, level: GroupingLevel) -> impl Iterator<Item = &ReportRow> {
        self.rows
            .iter()
            .filter(move |row| row.kind == RowKind::Summary(level))
    }
}
