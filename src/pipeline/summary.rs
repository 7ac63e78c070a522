//! Hierarchical assembly of detail and summary rows.
//!
//! Sorted detail rows are walked as a tree, distributor → producer → order
//! cycle. Each closed node emits a summary row whose totals are re-read from
//! the ledger over the union of its children's scopes.

use super::aggregate::{compute_totals, GroupKey, TotalsScope};
use crate::report::{Columns, GroupingLevel, ReportRow, RowKind};
use crate::store::{Ledger, StoreResult};

/// A projected detail row together with the scope its totals came from.
#[derive(Debug, Clone)]
pub struct DetailRow {
    pub key: GroupKey,
    pub scope: TotalsScope,
    pub columns: Columns,
}

impl DetailRow {
    fn into_row(self) -> ReportRow {
        ReportRow {
            kind: RowKind::Detail,
            key: Some(self.key),
            columns: self.columns,
        }
    }
}

/// Emit `details` in order, appending summary rows when `with_summaries`.
///
/// `details` must already be sorted so that rows of one distributor, and of
/// one producer and order cycle within it, are contiguous.
pub fn assemble<L>(
    details: Vec<DetailRow>,
    ledger: &L,
    with_summaries: bool,
) -> StoreResult<Vec<ReportRow>>
where
    L: Ledger + ?Sized,
{
    if !with_summaries {
        return Ok(details.into_iter().map(DetailRow::into_row).collect());
    }

    let mut rows = Vec::with_capacity(details.len() * 2);
    for distributor in details.chunk_by(|a, b| a.key.distributor_id == b.key.distributor_id) {
        for producer in distributor.chunk_by(|a, b| a.key.supplier_id == b.key.supplier_id) {
            for cycle in producer.chunk_by(|a, b| a.key.order_cycle_id == b.key.order_cycle_id) {
                rows.extend(cycle.iter().cloned().map(DetailRow::into_row));
                rows.push(summary_row(cycle, GroupingLevel::OrderCycle, ledger)?);
            }
            rows.push(summary_row(producer, GroupingLevel::Producer, ledger)?);
        }
        rows.push(summary_row(distributor, GroupingLevel::Distributor, ledger)?);
    }

    Ok(rows)
}

fn summary_row<L>(children: &[DetailRow], level: GroupingLevel, ledger: &L) -> StoreResult<ReportRow>
where
    L: Ledger + ?Sized,
{
    let scope = TotalsScope::union(children.iter().map(|row| &row.scope));
    let totals = compute_totals(ledger, &scope)?;

    // Children of one node agree on every column above its level.
    let first = children.first().map(|row| &row.columns);
    let pick = |f: fn(&Columns) -> Option<String>| first.and_then(f);
    let mut columns = Columns {
        distributor: pick(|c| c.distributor.clone()),
        totals,
        ..Default::default()
    };
    if level >= GroupingLevel::Producer {
        columns.producer = pick(|c| c.producer.clone());
        columns.producer_tax_status = first.and_then(|c| c.producer_tax_status);
    }
    if level >= GroupingLevel::OrderCycle {
        columns.order_cycle = pick(|c| c.order_cycle.clone());
    }

    Ok(ReportRow {
        kind: RowKind::Summary(level),
        key: None,
        columns,
    })
}
