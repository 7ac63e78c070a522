//! The enterprise fee / tax report pipeline.
//!
//! ```text
//! OrderSource::search ─▶ fan_out ─▶ retain_matching ─▶ group_tuples
//!        ─▶ compute_totals (Ledger) ─▶ Projector (Catalog) ─▶ sort ─▶ assemble
//! ```
//!
//! Every stage is a pure function over the previous stage's output plus
//! read-only store calls. Store failures propagate unchanged; missing
//! definitions only blank out columns.
//!
//! # Example
//!
//! ```ignore
//! use fee_report::pipeline::{run_report, ReportOptions};
//! use fee_report::store::{AllowAll, MemoryStore, ReportFilters};
//!
//! let store = MemoryStore::new(dataset);
//! let output = run_report(&store, &ReportFilters::new(), &AllowAll, &ReportOptions::default())?;
//! for row in &output.rows {
//!     println!("{:?}", row.record());
//! }
//! ```

pub mod aggregate;
pub mod extract;
pub mod fanout;
pub mod project;
pub mod summary;

pub use aggregate::{compute_totals, group_tuples, Group, GroupKey, Totals, TotalsScope};
pub use extract::{enterprise_fee_adjustments, tax_rates_for, FeeAdjustments};
pub use fanout::{fan_out, join_fees, join_suppliers, join_tax_rates, retain_matching, FanoutTuple};
pub use project::Projector;

use tracing::{debug, info_span};

use crate::model::Order;
use crate::report::ReportOutput;
use crate::store::{Catalog, Ledger, OrderPermission, OrderSource, ReportFilters, StoreError};
use summary::{assemble, DetailRow};

/// Errors surfaced by a report run.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ReportResult<T> = Result<T, ReportError>;

/// Options for a report run.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Emit distributor, producer and order cycle summary rows.
    pub summary_rows: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { summary_rows: true }
    }
}

impl ReportOptions {
    pub fn with_summary_rows(mut self, summary_rows: bool) -> Self {
        self.summary_rows = summary_rows;
        self
    }
}

/// Search orders through `store` and build the report from them.
pub fn run_report<S>(
    store: &S,
    filters: &ReportFilters,
    permission: &dyn OrderPermission,
    options: &ReportOptions,
) -> ReportResult<ReportOutput>
where
    S: OrderSource + Ledger + Catalog + ?Sized,
{
    let span = info_span!("enterprise_fee_report");
    let _guard = span.enter();

    let orders = store.search(filters, permission)?;
    build_report(&orders, filters, store, store, options)
}

/// Build the report over an already fetched order set.
///
/// The orders are trusted as given; no permission check happens here.
pub fn build_report<L, C>(
    orders: &[Order],
    filters: &ReportFilters,
    ledger: &L,
    catalog: &C,
    options: &ReportOptions,
) -> ReportResult<ReportOutput>
where
    L: Ledger + ?Sized,
    C: Catalog + ?Sized,
{
    if orders.is_empty() {
        debug!("no orders matched, empty report");
        return Ok(ReportOutput::default());
    }

    let tuples = retain_matching(fan_out(orders), filters, catalog)?;
    let groups = group_tuples(tuples);

    let mut projector = Projector::new(catalog);
    let mut details = Vec::with_capacity(groups.len());
    for group in &groups {
        let scope = group.scope();
        let totals = compute_totals(ledger, &scope)?;
        let columns = projector.project(&group.key, totals)?;
        let sort_key = projector.sort_key(&group.key, &columns)?;
        details.push((
            sort_key,
            DetailRow {
                key: group.key,
                scope,
                columns,
            },
        ));
    }
    details.sort_by(|a, b| a.0.cmp(&b.0));

    let details: Vec<DetailRow> = details.into_iter().map(|(_, row)| row).collect();
    let detail_count = details.len();
    let rows = assemble(details, ledger, options.summary_rows)?;
    debug!(
        orders = orders.len(),
        detail_rows = detail_count,
        rows = rows.len(),
        "built report"
    );

    Ok(ReportOutput { rows })
}
