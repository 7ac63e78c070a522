//! Shared dataset builder for integration tests.

#![allow(dead_code)]

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use fee_report::model::{
    Adjustable, Adjustment, AdjustmentId, Dataset, Enterprise, EnterpriseFee, EnterpriseFeeId,
    EnterpriseId, FeeType, LineItem, LineItemId, Order, OrderCycle, OrderCycleId, OrderId,
    Originator, TaxRate, TaxRateId,
};
use fee_report::store::MemoryStore;
use rust_decimal::Decimal;

pub const HUB: EnterpriseId = EnterpriseId(1);
pub const FARM_ONE: EnterpriseId = EnterpriseId(2);
pub const FARM_TWO: EnterpriseId = EnterpriseId(3);
pub const OTHER_HUB: EnterpriseId = EnterpriseId(4);

pub const WEEK_ONE: OrderCycleId = OrderCycleId(1);
pub const WEEK_TWO: OrderCycleId = OrderCycleId(2);

pub const PACKING: EnterpriseFeeId = EnterpriseFeeId(1);
pub const DELIVERY: EnterpriseFeeId = EnterpriseFeeId(2);

pub const GST: TaxRateId = TaxRateId(1);
pub const LEVY: TaxRateId = TaxRateId(2);

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
}

/// Builds a [`Dataset`] with auto-assigned line item and adjustment ids.
pub struct Fixture {
    pub dataset: Dataset,
    next_id: i64,
}

impl Fixture {
    pub fn empty() -> Self {
        Self {
            dataset: Dataset::default(),
            next_id: 1000,
        }
    }

    /// Hub "Green Hub" distributing for "Farm One" and "Farm Two", two order
    /// cycles, a packing and a delivery fee, and two tax rates.
    pub fn new() -> Self {
        let mut fixture = Self::empty();
        fixture.enterprise(HUB, "Green Hub", true);
        fixture.enterprise(FARM_ONE, "Farm One", true);
        fixture.enterprise(FARM_TWO, "Farm Two", false);
        fixture.enterprise(OTHER_HUB, "Apple Hub", false);
        fixture.order_cycle(WEEK_ONE, "Week 1", Some(day(1)));
        fixture.order_cycle(WEEK_TWO, "Week 2", Some(day(8)));
        fixture.fee(PACKING, "Packing", FeeType::Packing, HUB);
        fixture.fee(DELIVERY, "Delivery", FeeType::Transport, HUB);
        fixture.tax_rate(GST, "GST 10%", "0.10", Some("Fees"));
        fixture.tax_rate(LEVY, "Levy 5%", "0.05", None);
        fixture
    }

    fn next(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn enterprise(&mut self, id: EnterpriseId, name: &str, charges_sales_tax: bool) {
        self.dataset.enterprises.push(Enterprise {
            id,
            name: name.to_string(),
            charges_sales_tax,
        });
    }

    pub fn order_cycle(&mut self, id: OrderCycleId, name: &str, opens: Option<DateTime<Utc>>) {
        self.dataset.order_cycles.push(OrderCycle {
            id,
            name: name.to_string(),
            orders_open_at: opens,
        });
    }

    pub fn fee(&mut self, id: EnterpriseFeeId, name: &str, fee_type: FeeType, owner: EnterpriseId) {
        self.dataset.enterprise_fees.push(EnterpriseFee {
            id,
            name: name.to_string(),
            fee_type,
            owner_id: owner,
        });
    }

    pub fn tax_rate(&mut self, id: TaxRateId, name: &str, rate: &str, category: Option<&str>) {
        self.dataset.tax_rates.push(TaxRate {
            id,
            name: name.to_string(),
            amount: dec(rate),
            tax_category: category.map(str::to_string),
        });
    }

    /// A completed order with one line item per entry of `suppliers`.
    pub fn order(
        &mut self,
        id: i64,
        distributor: EnterpriseId,
        cycle: OrderCycleId,
        suppliers: &[EnterpriseId],
    ) -> OrderId {
        let line_items = suppliers
            .iter()
            .map(|&supplier_id| LineItem {
                id: LineItemId(self.next()),
                supplier_id,
            })
            .collect();
        self.dataset.orders.push(Order {
            id: OrderId(id),
            number: format!("R{:03}", id),
            distributor_id: distributor,
            order_cycle_id: cycle,
            completed_at: Some(day(10)),
            line_items,
            adjustments: Vec::new(),
        });
        OrderId(id)
    }

    pub fn completed_at(&mut self, order: OrderId, at: Option<DateTime<Utc>>) {
        self.order_mut(order).completed_at = at;
    }

    pub fn fee_adjustment(&mut self, order: OrderId, fee: EnterpriseFeeId, amount: &str) -> AdjustmentId {
        self.adjust(
            order,
            amount,
            Originator::EnterpriseFee(fee),
            Adjustable::Order(order),
            false,
        )
    }

    pub fn tax_adjustment(
        &mut self,
        order: OrderId,
        on: AdjustmentId,
        rate: TaxRateId,
        amount: &str,
        included: bool,
    ) -> AdjustmentId {
        self.adjust(
            order,
            amount,
            Originator::TaxRate(rate),
            Adjustable::Adjustment(on),
            included,
        )
    }

    fn adjust(
        &mut self,
        order: OrderId,
        amount: &str,
        originator: Originator,
        adjustable: Adjustable,
        included: bool,
    ) -> AdjustmentId {
        let id = AdjustmentId(self.next());
        self.order_mut(order).adjustments.push(Adjustment {
            id,
            order_id: order,
            amount: dec(amount),
            originator,
            adjustable,
            included,
            label: String::new(),
        });
        id
    }

    fn order_mut(&mut self, id: OrderId) -> &mut Order {
        self.dataset
            .orders
            .iter_mut()
            .find(|order| order.id == id)
            .expect("order must be added before its adjustments")
    }

    pub fn store(&self) -> MemoryStore {
        MemoryStore::new(self.dataset.clone())
    }
}
