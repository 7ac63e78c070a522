//! Grouping and ledger-backed aggregation.
//!
//! Totals are never folded from in-memory amounts. Every total is read from
//! the [`Ledger`] for a [`TotalsScope`] of distinct order ids, fee ids and
//! tax rate ids, so the same scope always yields the same decimal result no
//! matter how many tuples referenced each order.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::fanout::FanoutTuple;
use crate::model::{EnterpriseFeeId, EnterpriseId, Order, OrderCycleId, OrderId, TaxRateId};
use crate::store::{AmountQuery, Ledger, StoreResult};

/// Identifies one detail row of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GroupKey {
    pub tax_rate_id: Option<TaxRateId>,
    pub enterprise_fee_id: EnterpriseFeeId,
    pub supplier_id: EnterpriseId,
    pub distributor_id: EnterpriseId,
    pub order_cycle_id: OrderCycleId,
}

/// Fan-out tuples sharing a [`GroupKey`].
#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a> {
    pub key: GroupKey,
    /// One entry per contributing tuple; the same order may repeat.
    pub orders: Vec<&'a Order>,
}

impl Group<'_> {
    pub fn order_ids(&self) -> BTreeSet<OrderId> {
        self.orders.iter().map(|order| order.id).collect()
    }

    pub fn scope(&self) -> TotalsScope {
        TotalsScope {
            order_ids: self.order_ids(),
            enterprise_fee_ids: BTreeSet::from([self.key.enterprise_fee_id]),
            tax_rate_ids: self.key.tax_rate_id.into_iter().collect(),
        }
    }
}

/// Group tuples by key. Groups come back in key order.
pub fn group_tuples<'a>(tuples: impl IntoIterator<Item = FanoutTuple<'a>>) -> Vec<Group<'a>> {
    let mut groups: BTreeMap<GroupKey, Vec<&'a Order>> = BTreeMap::new();
    for tuple in tuples {
        groups.entry(tuple.group_key()).or_default().push(tuple.order);
    }

    debug!(groups = groups.len(), "grouped fan-out tuples");
    groups
        .into_iter()
        .map(|(key, orders)| Group { key, orders })
        .collect()
}

/// Monetary totals of one row.
///
/// Only constructible through [`Totals::new`], which derives
/// `total_incl_tax` so the accounting identity always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
    total_excl_tax: Decimal,
    tax: Decimal,
    total_incl_tax: Decimal,
}

impl Totals {
    pub fn new(total_excl_tax: Decimal, tax: Decimal) -> Self {
        Self {
            total_excl_tax,
            tax,
            total_incl_tax: total_excl_tax + tax,
        }
    }

    pub fn total_excl_tax(&self) -> Decimal {
        self.total_excl_tax
    }

    pub fn tax(&self) -> Decimal {
        self.tax
    }

    pub fn total_incl_tax(&self) -> Decimal {
        self.total_incl_tax
    }
}

/// The set of orders, fees and tax rates a total is computed over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TotalsScope {
    pub order_ids: BTreeSet<OrderId>,
    pub enterprise_fee_ids: BTreeSet<EnterpriseFeeId>,
    /// Empty when the scope only covers untaxed fees.
    pub tax_rate_ids: BTreeSet<TaxRateId>,
}

impl TotalsScope {
    /// Union of several scopes.
    pub fn union<'s>(scopes: impl IntoIterator<Item = &'s TotalsScope>) -> Self {
        let mut merged = TotalsScope::default();
        for scope in scopes {
            merged.order_ids.extend(scope.order_ids.iter().copied());
            merged
                .enterprise_fee_ids
                .extend(scope.enterprise_fee_ids.iter().copied());
            merged.tax_rate_ids.extend(scope.tax_rate_ids.iter().copied());
        }
        merged
    }
}

/// Read the totals of `scope` from the ledger.
///
/// - `total_excl_tax`: fee adjustments minus tax already included in them
/// - `tax`: tax adjustments of the scope's rates charged on those fees
pub fn compute_totals<L>(ledger: &L, scope: &TotalsScope) -> StoreResult<Totals>
where
    L: Ledger + ?Sized,
{
    if scope.order_ids.is_empty() || scope.enterprise_fee_ids.is_empty() {
        return Ok(Totals::default());
    }

    let order_ids = scope.order_ids.iter().copied();
    let fee_query =
        AmountQuery::fees(order_ids.clone()).for_fees(scope.enterprise_fee_ids.iter().copied());
    let fee_total = ledger.amount_sum(&fee_query)?;
    let fee_adjustment_ids = ledger.adjustment_ids(&fee_query)?;

    let included_tax = ledger.amount_sum(
        &AmountQuery::taxes(order_ids.clone())
            .on_adjustments(fee_adjustment_ids.iter().copied())
            .included(true),
    )?;

    let tax = if scope.tax_rate_ids.is_empty() {
        Decimal::ZERO
    } else {
        ledger.amount_sum(
            &AmountQuery::taxes(order_ids)
                .for_tax_rates(scope.tax_rate_ids.iter().copied())
                .on_adjustments(fee_adjustment_ids),
        )?
    };

    Ok(Totals::new(fee_total - included_tax, tax))
}
