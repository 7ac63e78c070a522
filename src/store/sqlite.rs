//! SQLite-backed ledger.
//!
//! Stores orders, adjustments and definition records in a single SQLite
//! file (by default `~/.fee-report/ledger.db`).
//!
//! # Design
//!
//! - Monetary amounts are stored as decimal text and summed in Rust with
//!   `rust_decimal`, never with SQLite's floating point `SUM`.
//! - Timestamps use rusqlite's chrono support.
//! - Versioned: opening a file with a different schema version is an error.
//! - Id lists are bound in chunks to stay under SQLite's variable limit.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::{
    AmountQuery, Catalog, Ledger, OrderPermission, OrderSource, ReportFilters, StoreError,
    StoreResult,
};
use crate::model::{
    Adjustable, Adjustment, AdjustmentId, AdjustmentKind, Dataset, Enterprise, EnterpriseFee,
    EnterpriseFeeId, EnterpriseId, FeeType, LineItem, LineItemId, Order, OrderCycle,
    OrderCycleId, OrderId, Originator, TaxRate, TaxRateId,
};

/// Current ledger schema version. Bump this when the table layout changes.
const LEDGER_VERSION: i32 = 1;

/// Upper bound on ids bound into a single `IN (...)` list.
const MAX_BIND_IDS: usize = 500;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS enterprises (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        charges_sales_tax INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS order_cycles (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        orders_open_at TEXT
    );

    CREATE TABLE IF NOT EXISTS enterprise_fees (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        fee_type TEXT NOT NULL,
        owner_id INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tax_rates (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        amount TEXT NOT NULL,
        tax_category TEXT
    );

    CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY,
        number TEXT NOT NULL,
        distributor_id INTEGER NOT NULL,
        order_cycle_id INTEGER NOT NULL,
        completed_at TEXT
    );

    CREATE TABLE IF NOT EXISTS line_items (
        id INTEGER PRIMARY KEY,
        order_id INTEGER NOT NULL,
        supplier_id INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS adjustments (
        id INTEGER PRIMARY KEY,
        order_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        originator_type TEXT NOT NULL,
        originator_id INTEGER NOT NULL,
        adjustable_type TEXT NOT NULL,
        adjustable_id INTEGER NOT NULL,
        included INTEGER NOT NULL DEFAULT 0,
        label TEXT NOT NULL DEFAULT ''
    );

    CREATE INDEX IF NOT EXISTS idx_line_items_order ON line_items (order_id);
    CREATE INDEX IF NOT EXISTS idx_adjustments_order ON adjustments (order_id, originator_type);
";

/// SQLite implementation of every store trait.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a ledger database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        debug!(path = %path.display(), "opened ledger");
        Ok(store)
    }

    /// Open an in-memory ledger (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Default ledger location: `~/.fee-report/ledger.db`.
    pub fn default_path() -> StoreResult<PathBuf> {
        let base = dirs::home_dir().ok_or(StoreError::NoLedgerDir)?;
        Ok(base.join(".fee-report").join("ledger.db"))
    }

    fn init(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA)?;

        let stored_version: Option<String> = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
                row.get(0)
            })
            .optional()?;

        match stored_version {
            Some(v) => {
                let found = v.parse().map_err(|_| StoreError::InvalidValue {
                    column: "meta.version",
                    value: v.clone(),
                })?;
                if found != LEDGER_VERSION {
                    return Err(StoreError::SchemaVersion {
                        found,
                        expected: LEDGER_VERSION,
                    });
                }
            }
            None => {
                self.conn.execute(
                    "INSERT INTO meta (key, value) VALUES ('version', ?)",
                    params![LEDGER_VERSION.to_string()],
                )?;
            }
        }

        Ok(())
    }

    /// Load a dataset in a single transaction. Existing rows with the same
    /// ids are replaced; a re-imported order's line items and adjustments
    /// are replaced as a whole.
    pub fn import(&mut self, dataset: &Dataset) -> StoreResult<()> {
        dataset.validate()?;
        let tx = self.conn.transaction()?;

        for enterprise in &dataset.enterprises {
            tx.execute(
                "INSERT OR REPLACE INTO enterprises (id, name, charges_sales_tax) VALUES (?, ?, ?)",
                params![enterprise.id.0, enterprise.name, enterprise.charges_sales_tax],
            )?;
        }

        for cycle in &dataset.order_cycles {
            tx.execute(
                "INSERT OR REPLACE INTO order_cycles (id, name, orders_open_at) VALUES (?, ?, ?)",
                params![cycle.id.0, cycle.name, cycle.orders_open_at],
            )?;
        }

        for fee in &dataset.enterprise_fees {
            tx.execute(
                "INSERT OR REPLACE INTO enterprise_fees (id, name, fee_type, owner_id) \
                 VALUES (?, ?, ?, ?)",
                params![fee.id.0, fee.name, fee.fee_type.as_str(), fee.owner_id.0],
            )?;
        }

        for rate in &dataset.tax_rates {
            tx.execute(
                "INSERT OR REPLACE INTO tax_rates (id, name, amount, tax_category) \
                 VALUES (?, ?, ?, ?)",
                params![rate.id.0, rate.name, rate.amount.to_string(), rate.tax_category],
            )?;
        }

        for order in &dataset.orders {
            tx.execute(
                "INSERT OR REPLACE INTO orders \
                 (id, number, distributor_id, order_cycle_id, completed_at) \
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    order.id.0,
                    order.number,
                    order.distributor_id.0,
                    order.order_cycle_id.0,
                    order.completed_at
                ],
            )?;
            tx.execute("DELETE FROM line_items WHERE order_id = ?", params![order.id.0])?;
            tx.execute("DELETE FROM adjustments WHERE order_id = ?", params![order.id.0])?;

            for item in &order.line_items {
                tx.execute(
                    "INSERT OR REPLACE INTO line_items (id, order_id, supplier_id) VALUES (?, ?, ?)",
                    params![item.id.0, order.id.0, item.supplier_id.0],
                )?;
            }

            for adjustment in &order.adjustments {
                tx.execute(
                    "INSERT OR REPLACE INTO adjustments \
                     (id, order_id, amount, originator_type, originator_id, \
                      adjustable_type, adjustable_id, included, label) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    params![
                        adjustment.id.0,
                        order.id.0,
                        adjustment.amount.to_string(),
                        originator_type(adjustment.kind()),
                        adjustment.originator.raw_id(),
                        adjustment.adjustable.type_name(),
                        adjustment.adjustable.raw_id(),
                        adjustment.included,
                        adjustment.label
                    ],
                )?;
            }
        }

        tx.commit()?;
        info!(
            orders = dataset.orders.len(),
            adjustments = dataset.adjustment_count(),
            "imported dataset"
        );
        Ok(())
    }

    /// Completed order headers (no line items or adjustments). Short id
    /// filters narrow the query; callers still apply
    /// [`ReportFilters::matches_order`] to the result.
    fn order_headers(&self, filters: &ReportFilters) -> StoreResult<Vec<Order>> {
        let mut sql = String::from(
            "SELECT id, number, distributor_id, order_cycle_id, completed_at \
             FROM orders WHERE completed_at IS NOT NULL",
        );
        let mut values = Vec::new();
        if filters.distributor_ids.len() <= MAX_BIND_IDS {
            push_in(
                &mut sql,
                &mut values,
                "distributor_id",
                filters.distributor_ids.iter().map(|id| id.0),
            );
        }
        if filters.order_cycle_ids.len() <= MAX_BIND_IDS {
            push_in(
                &mut sql,
                &mut values,
                "order_cycle_id",
                filters.order_cycle_ids.iter().map(|id| id.0),
            );
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self.conn.prepare(&sql)?;
        let orders = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(Order {
                    id: OrderId(row.get(0)?),
                    number: row.get(1)?,
                    distributor_id: EnterpriseId(row.get(2)?),
                    order_cycle_id: OrderCycleId(row.get(3)?),
                    completed_at: row.get::<_, Option<DateTime<Utc>>>(4)?,
                    line_items: Vec::new(),
                    adjustments: Vec::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    fn load_children(&self, orders: &mut [Order]) -> StoreResult<()> {
        let index: HashMap<OrderId, usize> = orders
            .iter()
            .enumerate()
            .map(|(i, order)| (order.id, i))
            .collect();
        let ids: Vec<i64> = orders.iter().map(|order| order.id.0).collect();

        for chunk in ids.chunks(MAX_BIND_IDS) {
            let mut sql =
                String::from("SELECT id, order_id, supplier_id FROM line_items WHERE 1");
            let mut values = Vec::new();
            push_in(&mut sql, &mut values, "order_id", chunk.iter().copied());
            sql.push_str(" ORDER BY id");

            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), |row| {
                    Ok((
                        OrderId(row.get(1)?),
                        LineItem {
                            id: LineItemId(row.get(0)?),
                            supplier_id: EnterpriseId(row.get(2)?),
                        },
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            for (order_id, item) in rows {
                if let Some(&i) = index.get(&order_id) {
                    orders[i].line_items.push(item);
                }
            }

            let mut sql = String::from(
                "SELECT id, order_id, amount, originator_type, originator_id, \
                 adjustable_type, adjustable_id, included, label FROM adjustments WHERE 1",
            );
            let mut values = Vec::new();
            push_in(&mut sql, &mut values, "order_id", chunk.iter().copied());
            sql.push_str(" ORDER BY id");

            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), |row| {
                    Ok(AdjustmentRow {
                        id: row.get(0)?,
                        order_id: row.get(1)?,
                        amount: row.get(2)?,
                        originator_type: row.get(3)?,
                        originator_id: row.get(4)?,
                        adjustable_type: row.get(5)?,
                        adjustable_id: row.get(6)?,
                        included: row.get(7)?,
                        label: row.get(8)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            for row in rows {
                let adjustment = row.into_adjustment()?;
                if let Some(&i) = index.get(&adjustment.order_id) {
                    orders[i].adjustments.push(adjustment);
                }
            }
        }

        Ok(())
    }

    /// `(id, amount)` of every adjustment the query selects.
    ///
    /// Kind, orders and the included flag are filtered in SQL. Originator
    /// and adjustable restrictions are applied to the fetched rows, so only
    /// order ids are ever bound and they go in chunks.
    fn select_amounts(&self, query: &AmountQuery) -> StoreResult<Vec<(AdjustmentId, Decimal)>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i64> = query.order_ids.iter().map(|id| id.0).collect();
        let mut selected = Vec::new();

        for chunk in order_ids.chunks(MAX_BIND_IDS) {
            let mut sql = String::from(
                "SELECT id, amount, originator_id, adjustable_type, adjustable_id \
                 FROM adjustments WHERE originator_type = ?",
            );
            let mut values = vec![Value::Text(originator_type(query.kind).to_string())];
            push_in(&mut sql, &mut values, "order_id", chunk.iter().copied());
            if let Some(included) = query.included {
                sql.push_str(" AND included = ?");
                values.push(Value::Integer(i64::from(included)));
            }

            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            for (id, amount, originator_id, adjustable_type, adjustable_id) in rows {
                if let Some(originators) = &query.originator_ids {
                    if !originators.contains(&originator_id) {
                        continue;
                    }
                }
                if let Some(adjustables) = &query.adjustable_ids {
                    if adjustable_type != "adjustment"
                        || !adjustables.contains(&AdjustmentId(adjustable_id))
                    {
                        continue;
                    }
                }
                selected.push((AdjustmentId(id), parse_decimal("adjustments.amount", &amount)?));
            }
        }

        Ok(selected)
    }
}

impl OrderSource for SqliteStore {
    fn search(
        &self,
        filters: &ReportFilters,
        permission: &dyn OrderPermission,
    ) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .order_headers(filters)?
            .into_iter()
            .filter(|order| filters.matches_order(order))
            .collect();
        self.load_children(&mut orders)?;

        let candidates = orders.len();
        orders.retain(|order| permission.can_view(order));
        debug!(candidates, visible = orders.len(), "searched orders");
        Ok(orders)
    }
}

impl Ledger for SqliteStore {
    fn amount_sum(&self, query: &AmountQuery) -> StoreResult<Decimal> {
        Ok(self
            .select_amounts(query)?
            .into_iter()
            .map(|(_, amount)| amount)
            .sum())
    }

    fn adjustment_ids(&self, query: &AmountQuery) -> StoreResult<BTreeSet<AdjustmentId>> {
        Ok(self
            .select_amounts(query)?
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }
}

impl Catalog for SqliteStore {
    fn enterprise(&self, id: EnterpriseId) -> StoreResult<Option<Enterprise>> {
        let enterprise = self
            .conn
            .query_row(
                "SELECT name, charges_sales_tax FROM enterprises WHERE id = ?",
                params![id.0],
                |row| {
                    Ok(Enterprise {
                        id,
                        name: row.get(0)?,
                        charges_sales_tax: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(enterprise)
    }

    fn enterprise_fee(&self, id: EnterpriseFeeId) -> StoreResult<Option<EnterpriseFee>> {
        let row = self
            .conn
            .query_row(
                "SELECT name, fee_type, owner_id FROM enterprise_fees WHERE id = ?",
                params![id.0],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(name, fee_type, owner_id)| {
            let fee_type = FeeType::from_str(&fee_type).map_err(|_| StoreError::InvalidValue {
                column: "enterprise_fees.fee_type",
                value: fee_type.clone(),
            })?;
            Ok(EnterpriseFee {
                id,
                name,
                fee_type,
                owner_id: EnterpriseId(owner_id),
            })
        })
        .transpose()
    }

    fn tax_rate(&self, id: TaxRateId) -> StoreResult<Option<TaxRate>> {
        let row = self
            .conn
            .query_row(
                "SELECT name, amount, tax_category FROM tax_rates WHERE id = ?",
                params![id.0],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(name, amount, tax_category)| {
            Ok(TaxRate {
                id,
                name,
                amount: parse_decimal("tax_rates.amount", &amount)?,
                tax_category,
            })
        })
        .transpose()
    }

    fn order_cycle(&self, id: OrderCycleId) -> StoreResult<Option<OrderCycle>> {
        let cycle = self
            .conn
            .query_row(
                "SELECT name, orders_open_at FROM order_cycles WHERE id = ?",
                params![id.0],
                |row| {
                    Ok(OrderCycle {
                        id,
                        name: row.get(0)?,
                        orders_open_at: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(cycle)
    }
}

/// Raw `adjustments` row before its polymorphic references are decoded.
struct AdjustmentRow {
    id: i64,
    order_id: i64,
    amount: String,
    originator_type: String,
    originator_id: i64,
    adjustable_type: String,
    adjustable_id: i64,
    included: bool,
    label: String,
}

impl AdjustmentRow {
    fn into_adjustment(self) -> StoreResult<Adjustment> {
        let originator = match self.originator_type.as_str() {
            "enterprise_fee" => Originator::EnterpriseFee(EnterpriseFeeId(self.originator_id)),
            "tax_rate" => Originator::TaxRate(TaxRateId(self.originator_id)),
            _ => {
                return Err(StoreError::InvalidValue {
                    column: "adjustments.originator_type",
                    value: self.originator_type,
                })
            }
        };
        let adjustable = match self.adjustable_type.as_str() {
            "order" => Adjustable::Order(OrderId(self.adjustable_id)),
            "line_item" => Adjustable::LineItem(LineItemId(self.adjustable_id)),
            "adjustment" => Adjustable::Adjustment(AdjustmentId(self.adjustable_id)),
            _ => {
                return Err(StoreError::InvalidValue {
                    column: "adjustments.adjustable_type",
                    value: self.adjustable_type,
                })
            }
        };

        Ok(Adjustment {
            id: AdjustmentId(self.id),
            order_id: OrderId(self.order_id),
            amount: parse_decimal("adjustments.amount", &self.amount)?,
            originator,
            adjustable,
            included: self.included,
            label: self.label,
        })
    }
}

fn originator_type(kind: AdjustmentKind) -> &'static str {
    match kind {
        AdjustmentKind::EnterpriseFee => "enterprise_fee",
        AdjustmentKind::Tax => "tax_rate",
    }
}

fn parse_decimal(column: &'static str, value: &str) -> StoreResult<Decimal> {
    Decimal::from_str(value).map_err(|_| StoreError::InvalidDecimal {
        column,
        value: value.to_string(),
    })
}

/// Append ` AND column IN (?, ...)` and bind the ids.
fn push_in(
    sql: &mut String,
    values: &mut Vec<Value>,
    column: &str,
    ids: impl IntoIterator<Item = i64>,
) {
    let start = values.len();
    values.extend(ids.into_iter().map(Value::Integer));
    let count = values.len() - start;
    if count == 0 {
        return;
    }
    let placeholders = vec!["?"; count].join(", ");
    sql.push_str(&format!(" AND {} IN ({})", column, placeholders));
}
