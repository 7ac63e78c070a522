//! Query descriptions passed to stores.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    Adjustable, Adjustment, AdjustmentId, AdjustmentKind, EnterpriseFeeId, EnterpriseId, Order,
    OrderCycleId, OrderId, TaxRateId,
};

/// Filters selecting which orders and fan-out tuples a report covers.
///
/// Empty id lists mean "no restriction". The date range is inclusive and
/// applies to `completed_at`; orders that never completed are never
/// reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportFilters {
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub distributor_ids: Vec<EnterpriseId>,
    pub order_cycle_ids: Vec<OrderCycleId>,
    pub producer_ids: Vec<EnterpriseId>,
    pub enterprise_fee_ids: Vec<EnterpriseFeeId>,
    pub fee_owner_ids: Vec<EnterpriseId>,
}

impl ReportFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed_between(mut self, start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Self {
        self.start_at = Some(start_at);
        self.end_at = Some(end_at);
        self
    }

    pub fn with_distributors(mut self, ids: impl IntoIterator<Item = EnterpriseId>) -> Self {
        self.distributor_ids.extend(ids);
        self
    }

    pub fn with_order_cycles(mut self, ids: impl IntoIterator<Item = OrderCycleId>) -> Self {
        self.order_cycle_ids.extend(ids);
        self
    }

    pub fn with_producers(mut self, ids: impl IntoIterator<Item = EnterpriseId>) -> Self {
        self.producer_ids.extend(ids);
        self
    }

    pub fn with_enterprise_fees(mut self, ids: impl IntoIterator<Item = EnterpriseFeeId>) -> Self {
        self.enterprise_fee_ids.extend(ids);
        self
    }

    pub fn with_fee_owners(mut self, ids: impl IntoIterator<Item = EnterpriseId>) -> Self {
        self.fee_owner_ids.extend(ids);
        self
    }

    /// Order-level part of the filter, applied by order sources.
    pub fn matches_order(&self, order: &Order) -> bool {
        let Some(completed_at) = order.completed_at else {
            return false;
        };
        if self.start_at.is_some_and(|start| completed_at < start) {
            return false;
        }
        if self.end_at.is_some_and(|end| completed_at > end) {
            return false;
        }
        allows(&self.distributor_ids, &order.distributor_id)
            && allows(&self.order_cycle_ids, &order.order_cycle_id)
    }

    pub fn allows_producer(&self, id: EnterpriseId) -> bool {
        allows(&self.producer_ids, &id)
    }

    pub fn allows_enterprise_fee(&self, id: EnterpriseFeeId) -> bool {
        allows(&self.enterprise_fee_ids, &id)
    }

    /// `None` stands for a fee whose definition could not be found.
    pub fn allows_fee_owner(&self, owner: Option<EnterpriseId>) -> bool {
        if self.fee_owner_ids.is_empty() {
            return true;
        }
        owner.is_some_and(|id| self.fee_owner_ids.contains(&id))
    }

    /// Whether any tuple-level filter is set.
    pub fn has_tuple_filters(&self) -> bool {
        !(self.producer_ids.is_empty()
            && self.enterprise_fee_ids.is_empty()
            && self.fee_owner_ids.is_empty())
    }
}

fn allows<T: PartialEq>(ids: &[T], id: &T) -> bool {
    ids.is_empty() || ids.contains(id)
}

/// A set-based selection of adjustments in the ledger.
///
/// `None` leaves a dimension unrestricted; an empty set matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountQuery {
    pub kind: AdjustmentKind,
    pub order_ids: BTreeSet<OrderId>,
    pub originator_ids: Option<BTreeSet<i64>>,
    pub adjustable_ids: Option<BTreeSet<AdjustmentId>>,
    pub included: Option<bool>,
}

impl AmountQuery {
    pub fn new(kind: AdjustmentKind, order_ids: impl IntoIterator<Item = OrderId>) -> Self {
        Self {
            kind,
            order_ids: order_ids.into_iter().collect(),
            originator_ids: None,
            adjustable_ids: None,
            included: None,
        }
    }

    /// Enterprise-fee adjustments of the given orders.
    pub fn fees(order_ids: impl IntoIterator<Item = OrderId>) -> Self {
        Self::new(AdjustmentKind::EnterpriseFee, order_ids)
    }

    /// Tax adjustments of the given orders.
    pub fn taxes(order_ids: impl IntoIterator<Item = OrderId>) -> Self {
        Self::new(AdjustmentKind::Tax, order_ids)
    }

    pub fn for_fees(mut self, ids: impl IntoIterator<Item = EnterpriseFeeId>) -> Self {
        self.originator_ids = Some(ids.into_iter().map(|id| id.0).collect());
        self
    }

    pub fn for_tax_rates(mut self, ids: impl IntoIterator<Item = TaxRateId>) -> Self {
        self.originator_ids = Some(ids.into_iter().map(|id| id.0).collect());
        self
    }

    /// Restrict to adjustments charged on one of the given adjustments.
    pub fn on_adjustments(mut self, ids: impl IntoIterator<Item = AdjustmentId>) -> Self {
        self.adjustable_ids = Some(ids.into_iter().collect());
        self
    }

    pub fn included(mut self, included: bool) -> Self {
        self.included = Some(included);
        self
    }

    /// Whether the query can only ever select nothing.
    pub fn is_empty(&self) -> bool {
        self.order_ids.is_empty()
            || self.originator_ids.as_ref().is_some_and(|ids| ids.is_empty())
            || self.adjustable_ids.as_ref().is_some_and(|ids| ids.is_empty())
    }

    pub fn matches(&self, adjustment: &Adjustment) -> bool {
        if adjustment.kind() != self.kind || !self.order_ids.contains(&adjustment.order_id) {
            return false;
        }
        if let Some(originators) = &self.originator_ids {
            if !originators.contains(&adjustment.originator.raw_id()) {
                return false;
            }
        }
        if let Some(adjustables) = &self.adjustable_ids {
            match adjustment.adjustable {
                Adjustable::Adjustment(id) if adjustables.contains(&id) => {}
                _ => return false,
            }
        }
        if let Some(included) = self.included {
            if adjustment.included != included {
                return false;
            }
        }
        true
    }
}
