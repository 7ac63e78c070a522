//! Column projection.
//!
//! Resolves the ids inside a [`GroupKey`] to display values. Every lookup is
//! a point read against the [`Catalog`], memoized for the duration of one
//! report so repeated keys do not re-read the store.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use tracing::warn;

use super::aggregate::{GroupKey, Totals};
use crate::model::{
    Enterprise, EnterpriseFee, EnterpriseFeeId, EnterpriseId, OrderCycle, OrderCycleId, TaxRate,
    TaxRateId,
};
use crate::report::Columns;
use crate::store::{Catalog, StoreResult};

/// Ordering of detail rows: distributor name, producer name, order cycle
/// start, order cycle name, fee name, tax rate name. Ids break ties so rows
/// of different records with equal names never interleave.
pub type SortKey = (
    Option<String>,
    EnterpriseId,
    Option<String>,
    EnterpriseId,
    Option<DateTime<Utc>>,
    Option<String>,
    OrderCycleId,
    Option<String>,
    EnterpriseFeeId,
    Option<String>,
    Option<TaxRateId>,
);

pub struct Projector<'c, C: ?Sized> {
    catalog: &'c C,
    enterprises: HashMap<EnterpriseId, Option<Enterprise>>,
    fees: HashMap<EnterpriseFeeId, Option<EnterpriseFee>>,
    tax_rates: HashMap<TaxRateId, Option<TaxRate>>,
    order_cycles: HashMap<OrderCycleId, Option<OrderCycle>>,
}

impl<'c, C> Projector<'c, C>
where
    C: Catalog + ?Sized,
{
    pub fn new(catalog: &'c C) -> Self {
        Self {
            catalog,
            enterprises: HashMap::new(),
            fees: HashMap::new(),
            tax_rates: HashMap::new(),
            order_cycles: HashMap::new(),
        }
    }

    pub fn enterprise(&mut self, id: EnterpriseId) -> StoreResult<Option<Enterprise>> {
        let catalog = self.catalog;
        lookup(&mut self.enterprises, id, "enterprise", |id| catalog.enterprise(id))
    }

    pub fn enterprise_fee(&mut self, id: EnterpriseFeeId) -> StoreResult<Option<EnterpriseFee>> {
        let catalog = self.catalog;
        lookup(&mut self.fees, id, "enterprise fee", |id| {
            catalog.enterprise_fee(id)
        })
    }

    pub fn tax_rate(&mut self, id: TaxRateId) -> StoreResult<Option<TaxRate>> {
        let catalog = self.catalog;
        lookup(&mut self.tax_rates, id, "tax rate", |id| catalog.tax_rate(id))
    }

    pub fn order_cycle(&mut self, id: OrderCycleId) -> StoreResult<Option<OrderCycle>> {
        let catalog = self.catalog;
        lookup(&mut self.order_cycles, id, "order cycle", |id| {
            catalog.order_cycle(id)
        })
    }

    /// Named columns for a detail row.
    pub fn project(&mut self, key: &GroupKey, totals: Totals) -> StoreResult<Columns> {
        let distributor = self.enterprise(key.distributor_id)?;
        let producer = self.enterprise(key.supplier_id)?;
        let order_cycle = self.order_cycle(key.order_cycle_id)?;
        let fee = self.enterprise_fee(key.enterprise_fee_id)?;
        let fee_owner = match &fee {
            Some(fee) => self.enterprise(fee.owner_id)?,
            None => None,
        };
        let tax_rate = match key.tax_rate_id {
            Some(id) => self.tax_rate(id)?,
            None => None,
        };

        Ok(Columns {
            distributor: distributor.map(|e| e.name),
            producer_tax_status: producer.as_ref().map(|e| e.charges_sales_tax),
            producer: producer.map(|e| e.name),
            order_cycle: order_cycle.map(|oc| oc.name),
            enterprise_fee_name: fee.as_ref().map(|f| f.name.clone()),
            enterprise_fee_type: fee.as_ref().map(|f| f.fee_type.to_string()),
            enterprise_fee_owner: fee_owner.map(|e| e.name),
            tax_category: tax_rate.as_ref().and_then(|t| t.tax_category.clone()),
            tax_rate_name: tax_rate.as_ref().map(|t| t.name.clone()),
            tax_rate: tax_rate.map(|t| t.amount),
            totals,
        })
    }

    pub fn sort_key(&mut self, key: &GroupKey, columns: &Columns) -> StoreResult<SortKey> {
        let opens_at = self
            .order_cycle(key.order_cycle_id)?
            .and_then(|oc| oc.orders_open_at);
        Ok((
            columns.distributor.clone(),
            key.distributor_id,
            columns.producer.clone(),
            key.supplier_id,
            opens_at,
            columns.order_cycle.clone(),
            key.order_cycle_id,
            columns.enterprise_fee_name.clone(),
            key.enterprise_fee_id,
            columns.tax_rate_name.clone(),
            key.tax_rate_id,
        ))
    }
}

fn lookup<K, V, F>(
    cache: &mut HashMap<K, Option<V>>,
    id: K,
    what: &'static str,
    read: F,
) -> StoreResult<Option<V>>
where
    K: Copy + Eq + Hash + std::fmt::Display,
    V: Clone,
    F: FnOnce(K) -> StoreResult<Option<V>>,
{
    if let Some(cached) = cache.get(&id) {
        return Ok(cached.clone());
    }
    let value = read(id)?;
    if value.is_none() {
        warn!(%id, "{} not found, reporting empty fields", what);
    }
    cache.insert(id, value.clone());
    Ok(value)
}
