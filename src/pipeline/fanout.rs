//! Join/fan-out stage.
//!
//! Each order is expanded by three flat-maps:
//!
//! ```text
//! Order ─[join_fees]─▶ FeeTuple ─[join_tax_rates]─▶ TaxedFeeTuple ─[join_suppliers]─▶ FanoutTuple
//! ```
//!
//! An order whose line items come from two suppliers duplicates every
//! fee/tax outcome into two tuples: fees are attributed to every supplier of
//! the order, not to the supplier owning the fee.

use std::collections::HashMap;

use tracing::debug;

use super::aggregate::GroupKey;
use super::extract::{enterprise_fee_adjustments, tax_rates_for};
use crate::model::{AdjustmentId, EnterpriseFeeId, EnterpriseId, Order, TaxRateId};
use crate::store::{Catalog, ReportFilters, StoreResult};

/// Stage one: an order joined with one of its enterprise fees.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeTuple<'a> {
    pub order: &'a Order,
    pub enterprise_fee_id: EnterpriseFeeId,
    pub adjustment_ids: Vec<AdjustmentId>,
}

/// Stage two: a fee joined with one tax outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxedFeeTuple<'a> {
    pub order: &'a Order,
    pub enterprise_fee_id: EnterpriseFeeId,
    pub tax_rate_id: Option<TaxRateId>,
}

/// Stage three: a taxed fee joined with one supplier of the order.
#[derive(Debug, Clone, PartialEq)]
pub struct FanoutTuple<'a> {
    pub order: &'a Order,
    pub enterprise_fee_id: EnterpriseFeeId,
    pub tax_rate_id: Option<TaxRateId>,
    pub supplier_id: EnterpriseId,
}

impl FanoutTuple<'_> {
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            tax_rate_id: self.tax_rate_id,
            enterprise_fee_id: self.enterprise_fee_id,
            supplier_id: self.supplier_id,
            distributor_id: self.order.distributor_id,
            order_cycle_id: self.order.order_cycle_id,
        }
    }
}

pub fn join_fees(order: &Order) -> Vec<FeeTuple<'_>> {
    enterprise_fee_adjustments(order)
        .into_iter()
        .map(|fee| FeeTuple {
            order,
            enterprise_fee_id: fee.enterprise_fee_id,
            adjustment_ids: fee.adjustment_ids,
        })
        .collect()
}

pub fn join_tax_rates(tuple: FeeTuple<'_>) -> Vec<TaxedFeeTuple<'_>> {
    tax_rates_for(tuple.order, &tuple.adjustment_ids)
        .into_iter()
        .map(|tax_rate_id| TaxedFeeTuple {
            order: tuple.order,
            enterprise_fee_id: tuple.enterprise_fee_id,
            tax_rate_id,
        })
        .collect()
}

pub fn join_suppliers(tuple: TaxedFeeTuple<'_>) -> Vec<FanoutTuple<'_>> {
    tuple
        .order
        .supplier_ids()
        .into_iter()
        .map(|supplier_id| FanoutTuple {
            order: tuple.order,
            enterprise_fee_id: tuple.enterprise_fee_id,
            tax_rate_id: tuple.tax_rate_id,
            supplier_id,
        })
        .collect()
}

/// Run all three joins over `orders`.
pub fn fan_out(orders: &[Order]) -> Vec<FanoutTuple<'_>> {
    let tuples: Vec<_> = orders
        .iter()
        .flat_map(join_fees)
        .flat_map(join_tax_rates)
        .flat_map(join_suppliers)
        .collect();
    debug!(orders = orders.len(), tuples = tuples.len(), "fanned out orders");
    tuples
}

/// Narrow tuples by the producer, fee and fee-owner filters.
///
/// Fee owners are resolved through the catalog once per fee. A fee whose
/// definition is missing has no owner and fails any owner filter.
pub fn retain_matching<'a, C>(
    tuples: Vec<FanoutTuple<'a>>,
    filters: &ReportFilters,
    catalog: &C,
) -> StoreResult<Vec<FanoutTuple<'a>>>
where
    C: Catalog + ?Sized,
{
    if !filters.has_tuple_filters() {
        return Ok(tuples);
    }

    let mut owners: HashMap<EnterpriseFeeId, Option<EnterpriseId>> = HashMap::new();
    let mut kept = Vec::with_capacity(tuples.len());
    let before = tuples.len();

    for tuple in tuples {
        if !filters.allows_producer(tuple.supplier_id)
            || !filters.allows_enterprise_fee(tuple.enterprise_fee_id)
        {
            continue;
        }
        if !filters.fee_owner_ids.is_empty() {
            let owner = match owners.get(&tuple.enterprise_fee_id) {
                Some(owner) => *owner,
                None => {
                    let owner = catalog
                        .enterprise_fee(tuple.enterprise_fee_id)?
                        .map(|fee| fee.owner_id);
                    owners.insert(tuple.enterprise_fee_id, owner);
                    owner
                }
            };
            if !filters.allows_fee_owner(owner) {
                continue;
            }
        }
        kept.push(tuple);
    }

    debug!(before, after = kept.len(), "filtered fan-out tuples");
    Ok(kept)
}
