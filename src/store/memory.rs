//! In-memory store built from a [`Dataset`].

use std::collections::{BTreeSet, HashMap};

use rust_decimal::Decimal;

use super::{
    AmountQuery, Catalog, Ledger, OrderPermission, OrderSource, ReportFilters, StoreResult,
};
use crate::model::{
    Adjustment, AdjustmentId, Dataset, Enterprise, EnterpriseFee, EnterpriseFeeId, EnterpriseId,
    Order, OrderCycle, OrderCycleId, TaxRate, TaxRateId,
};

/// Holds a whole dataset in memory and answers every store trait from it.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    orders: Vec<Order>,
    enterprises: HashMap<EnterpriseId, Enterprise>,
    enterprise_fees: HashMap<EnterpriseFeeId, EnterpriseFee>,
    tax_rates: HashMap<TaxRateId, TaxRate>,
    order_cycles: HashMap<OrderCycleId, OrderCycle>,
}

impl MemoryStore {
    /// Adjustments are owned by the order they are nested under, whatever
    /// their `order_id` says.
    pub fn new(dataset: Dataset) -> Self {
        let mut orders = dataset.orders;
        for order in &mut orders {
            let order_id = order.id;
            for adjustment in &mut order.adjustments {
                adjustment.order_id = order_id;
            }
        }

        Self {
            orders,
            enterprises: dataset
                .enterprises
                .into_iter()
                .map(|e| (e.id, e))
                .collect(),
            enterprise_fees: dataset
                .enterprise_fees
                .into_iter()
                .map(|f| (f.id, f))
                .collect(),
            tax_rates: dataset.tax_rates.into_iter().map(|t| (t.id, t)).collect(),
            order_cycles: dataset
                .order_cycles
                .into_iter()
                .map(|oc| (oc.id, oc))
                .collect(),
        }
    }

    fn selected<'a>(&'a self, query: &'a AmountQuery) -> impl Iterator<Item = &'a Adjustment> {
        self.orders
            .iter()
            .filter(move |order| query.order_ids.contains(&order.id))
            .flat_map(|order| order.adjustments.iter())
            .filter(move |adjustment| query.matches(adjustment))
    }
}

impl OrderSource for MemoryStore {
    fn search(
        &self,
        filters: &ReportFilters,
        permission: &dyn OrderPermission,
    ) -> StoreResult<Vec<Order>> {
        Ok(self
            .orders
            .iter()
            .filter(|order| filters.matches_order(order) && permission.can_view(order))
            .cloned()
            .collect())
    }
}

impl Ledger for MemoryStore {
    fn amount_sum(&self, query: &AmountQuery) -> StoreResult<Decimal> {
        Ok(self.selected(query).map(|a| a.amount).sum())
    }

    fn adjustment_ids(&self, query: &AmountQuery) -> StoreResult<BTreeSet<AdjustmentId>> {
        Ok(self.selected(query).map(|a| a.id).collect())
    }
}

impl Catalog for MemoryStore {
    fn enterprise(&self, id: EnterpriseId) -> StoreResult<Option<Enterprise>> {
        Ok(self.enterprises.get(&id).cloned())
    }

    fn enterprise_fee(&self, id: EnterpriseFeeId) -> StoreResult<Option<EnterpriseFee>> {
        Ok(self.enterprise_fees.get(&id).cloned())
    }

    fn tax_rate(&self, id: TaxRateId) -> StoreResult<Option<TaxRate>> {
        Ok(self.tax_rates.get(&id).cloned())
    }

    fn order_cycle(&self, id: OrderCycleId) -> StoreResult<Option<OrderCycle>> {
        Ok(self.order_cycles.get(&id).cloned())
    }
}
