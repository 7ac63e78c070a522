//! Grouping and ledger totals.

#[path = "../common/mod.rs"]
mod common;

use std::collections::BTreeSet;

use common::*;
use fee_report::model::{EnterpriseFeeId, OrderId, TaxRateId};
use fee_report::pipeline::{compute_totals, fan_out, group_tuples, Totals, TotalsScope};
use rust_decimal::Decimal;

fn scope(orders: &[i64], fees: &[EnterpriseFeeId], rates: &[TaxRateId]) -> TotalsScope {
    TotalsScope {
        order_ids: orders.iter().copied().map(OrderId).collect(),
        enterprise_fee_ids: fees.iter().copied().collect(),
        tax_rate_ids: rates.iter().copied().collect(),
    }
}

#[test]
fn test_groups_collect_distinct_orders_per_key() {
    let mut fixture = Fixture::new();
    let first = fixture.order(1, HUB, WEEK_ONE, &[FARM_ONE, FARM_TWO]);
    fixture.fee_adjustment(first, PACKING, "1.00");
    let second = fixture.order(2, HUB, WEEK_ONE, &[FARM_ONE]);
    fixture.fee_adjustment(second, PACKING, "2.00");
    fixture.fee_adjustment(second, PACKING, "3.00");

    let orders = fixture.dataset.orders.clone();
    let groups = group_tuples(fan_out(&orders));

    assert_eq!(groups.len(), 2);
    let farm_one = groups
        .iter()
        .find(|g| g.key.supplier_id == FARM_ONE)
        .unwrap();
    assert_eq!(farm_one.order_ids(), BTreeSet::from([OrderId(1), OrderId(2)]));
    let farm_two = groups
        .iter()
        .find(|g| g.key.supplier_id == FARM_TWO)
        .unwrap();
    assert_eq!(farm_two.order_ids(), BTreeSet::from([OrderId(1)]));

    let group_scope = farm_one.scope();
    assert_eq!(group_scope.enterprise_fee_ids, BTreeSet::from([PACKING]));
    assert!(group_scope.tax_rate_ids.is_empty());
}

#[test]
fn test_totals_sum_every_fee_adjustment_of_the_scope() {
    let mut fixture = Fixture::new();
    let first = fixture.order(1, HUB, WEEK_ONE, &[FARM_ONE]);
    let fee = fixture.fee_adjustment(first, PACKING, "2.00");
    fixture.tax_adjustment(first, fee, GST, "0.20", false);
    fixture.fee_adjustment(first, PACKING, "3.00");
    fixture.fee_adjustment(first, DELIVERY, "100.00");
    let second = fixture.order(2, HUB, WEEK_ONE, &[FARM_ONE]);
    fixture.fee_adjustment(second, PACKING, "5.00");

    let store = fixture.store();
    let totals = compute_totals(&store, &scope(&[1, 2], &[PACKING], &[GST])).unwrap();

    assert_eq!(totals.total_excl_tax(), dec("10.00"));
    assert_eq!(totals.tax(), dec("0.20"));
    assert_eq!(totals.total_incl_tax(), dec("10.20"));
}

#[test]
fn test_included_tax_is_subtracted_whatever_the_rate() {
    let mut fixture = Fixture::new();
    let order = fixture.order(1, HUB, WEEK_ONE, &[FARM_ONE]);
    let fee = fixture.fee_adjustment(order, PACKING, "11.50");
    fixture.tax_adjustment(order, fee, GST, "1.00", true);
    fixture.tax_adjustment(order, fee, LEVY, "0.50", true);

    let store = fixture.store();

    // The GST row still excludes the levy from its fee total.
    let gst_only = compute_totals(&store, &scope(&[1], &[PACKING], &[GST])).unwrap();
    assert_eq!(gst_only.total_excl_tax(), dec("10.00"));
    assert_eq!(gst_only.tax(), dec("1.00"));

    let both = compute_totals(&store, &scope(&[1], &[PACKING], &[GST, LEVY])).unwrap();
    assert_eq!(both.total_excl_tax(), dec("10.00"));
    assert_eq!(both.tax(), dec("1.50"));
    assert_eq!(both.total_incl_tax(), dec("11.50"));
}

#[test]
fn test_untaxed_scope_has_zero_tax() {
    let mut fixture = Fixture::new();
    let order = fixture.order(1, HUB, WEEK_ONE, &[FARM_ONE]);
    let fee = fixture.fee_adjustment(order, PACKING, "10.00");
    fixture.tax_adjustment(order, fee, GST, "1.00", false);

    let store = fixture.store();
    let totals = compute_totals(&store, &scope(&[1], &[PACKING], &[])).unwrap();

    assert_eq!(totals.total_excl_tax(), dec("10.00"));
    assert_eq!(totals.tax(), Decimal::ZERO);
}

#[test]
fn test_tax_on_other_fees_is_not_counted() {
    let mut fixture = Fixture::new();
    let order = fixture.order(1, HUB, WEEK_ONE, &[FARM_ONE]);
    fixture.fee_adjustment(order, PACKING, "10.00");
    let delivery = fixture.fee_adjustment(order, DELIVERY, "4.00");
    fixture.tax_adjustment(order, delivery, GST, "0.40", false);

    let store = fixture.store();
    let totals = compute_totals(&store, &scope(&[1], &[PACKING], &[GST])).unwrap();

    assert_eq!(totals.total_excl_tax(), dec("10.00"));
    assert_eq!(totals.tax(), Decimal::ZERO);
}

#[test]
fn test_empty_scope_is_zero() {
    let store = Fixture::new().store();
    assert_eq!(
        compute_totals(&store, &TotalsScope::default()).unwrap(),
        Totals::default()
    );
    assert_eq!(
        compute_totals(&store, &scope(&[99], &[PACKING], &[GST])).unwrap(),
        Totals::default()
    );
}

#[test]
fn test_union_scope_is_not_the_sum_of_its_parts() {
    let mut fixture = Fixture::new();
    let order = fixture.order(1, HUB, WEEK_ONE, &[FARM_ONE]);
    let fee = fixture.fee_adjustment(order, PACKING, "10.00");
    fixture.tax_adjustment(order, fee, GST, "1.00", false);
    fixture.tax_adjustment(order, fee, LEVY, "0.50", false);

    let store = fixture.store();
    let gst = scope(&[1], &[PACKING], &[GST]);
    let levy = scope(&[1], &[PACKING], &[LEVY]);

    let gst_totals = compute_totals(&store, &gst).unwrap();
    let levy_totals = compute_totals(&store, &levy).unwrap();
    let union_totals = compute_totals(&store, &TotalsScope::union([&gst, &levy])).unwrap();

    assert_eq!(
        gst_totals.total_excl_tax() + levy_totals.total_excl_tax(),
        dec("20.00")
    );
    assert_eq!(union_totals.total_excl_tax(), dec("10.00"));
    assert_eq!(union_totals.tax(), dec("1.50"));
}
