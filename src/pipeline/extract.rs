//! Adjustment extraction.
//!
//! Reads fee and tax adjustments straight off a loaded order. Every
//! adjustment of an order carries the order's id, so adjustments charged on
//! line items or on other adjustments are already part of
//! `order.adjustments`.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Adjustable, AdjustmentId, EnterpriseFeeId, Order, Originator, TaxRateId};

/// The enterprise-fee adjustments of one order that share an originator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeAdjustments {
    pub enterprise_fee_id: EnterpriseFeeId,
    pub adjustment_ids: Vec<AdjustmentId>,
}

/// Enterprise-fee adjustments of `order`, grouped by fee and ordered by fee id.
pub fn enterprise_fee_adjustments(order: &Order) -> Vec<FeeAdjustments> {
    let mut by_fee: BTreeMap<EnterpriseFeeId, Vec<AdjustmentId>> = BTreeMap::new();
    for adjustment in &order.adjustments {
        if let Originator::EnterpriseFee(fee_id) = adjustment.originator {
            by_fee.entry(fee_id).or_default().push(adjustment.id);
        }
    }

    by_fee
        .into_iter()
        .map(|(enterprise_fee_id, adjustment_ids)| FeeAdjustments {
            enterprise_fee_id,
            adjustment_ids,
        })
        .collect()
}

/// Distinct tax rates charged on any of `adjustment_ids`.
///
/// Returns `[None]` when no tax was charged, so a fee without tax still
/// yields exactly one outcome.
pub fn tax_rates_for(order: &Order, adjustment_ids: &[AdjustmentId]) -> Vec<Option<TaxRateId>> {
    let rates: BTreeSet<TaxRateId> = order
        .adjustments
        .iter()
        .filter_map(|adjustment| match (adjustment.originator, adjustment.adjustable) {
            (Originator::TaxRate(rate_id), Adjustable::Adjustment(target))
                if adjustment_ids.contains(&target) =>
            {
                Some(rate_id)
            }
            _ => None,
        })
        .collect();

    if rates.is_empty() {
        vec![None]
    } else {
        rates.into_iter().map(Some).collect()
    }
}
