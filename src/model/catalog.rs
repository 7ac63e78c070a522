//! Definition records looked up by id while projecting rows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{EnterpriseFeeId, EnterpriseId, FeeType, OrderCycleId, TaxRateId};

/// A distributor, producer or fee owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enterprise {
    pub id: EnterpriseId,
    pub name: String,
    /// Whether the enterprise is registered to charge sales tax.
    #[serde(default)]
    pub charges_sales_tax: bool,
}

/// A fee definition owned by an enterprise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnterpriseFee {
    pub id: EnterpriseFeeId,
    pub name: String,
    pub fee_type: FeeType,
    pub owner_id: EnterpriseId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRate {
    pub id: TaxRateId,
    pub name: String,
    /// Rate as a fraction, e.g. `0.1` for 10%.
    pub amount: Decimal,
    #[serde(default)]
    pub tax_category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCycle {
    pub id: OrderCycleId,
    pub name: String,
    #[serde(default)]
    pub orders_open_at: Option<DateTime<Utc>>,
}
