//! A self-contained snapshot of orders and definitions.
//!
//! Datasets are the interchange format for loading a ledger: the CLI reads
//! them from JSON and both stores can be built from one.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::catalog::{Enterprise, EnterpriseFee, OrderCycle, TaxRate};
use super::order::Order;
use crate::store::{StoreError, StoreResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub enterprises: Vec<Enterprise>,
    pub order_cycles: Vec<OrderCycle>,
    pub enterprise_fees: Vec<EnterpriseFee>,
    pub tax_rates: Vec<TaxRate>,
    pub orders: Vec<Order>,
}

impl Dataset {
    /// Parse a dataset from a JSON string.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let dataset: Self = serde_json::from_str(json)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Check that every adjustment names the order it is nested under.
    pub fn validate(&self) -> StoreResult<()> {
        for order in &self.orders {
            let stray = order.adjustments.iter().find(|a| a.order_id != order.id);
            if let Some(adjustment) = stray {
                return Err(StoreError::OrderMismatch {
                    adjustment: adjustment.id,
                    declared: adjustment.order_id,
                    order: order.id,
                });
            }
        }
        Ok(())
    }

    /// Read a dataset from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Number of adjustments across all orders.
    pub fn adjustment_count(&self) -> usize {
        self.orders.iter().map(|o| o.adjustments.len()).sum()
    }
}
