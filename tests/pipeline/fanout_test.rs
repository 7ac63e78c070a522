//! Fan-out joins and tuple filtering.

#[path = "../common/mod.rs"]
mod common;

use common::*;
use fee_report::model::{EnterpriseFeeId, FeeType, OrderId};
use fee_report::pipeline::{fan_out, join_fees, retain_matching, FanoutTuple, GroupKey};
use fee_report::store::ReportFilters;

fn summarize(tuples: &[FanoutTuple<'_>]) -> Vec<(i64, i64, Option<i64>, i64)> {
    tuples
        .iter()
        .map(|t| {
            (
                t.order.id.0,
                t.enterprise_fee_id.0,
                t.tax_rate_id.map(|id| id.0),
                t.supplier_id.0,
            )
        })
        .collect()
}

#[test]
fn test_tuple_count_is_fees_times_tax_outcomes_times_suppliers() {
    let mut fixture = Fixture::new();
    let order = fixture.order(1, HUB, WEEK_ONE, &[FARM_ONE, FARM_TWO, FARM_ONE]);
    let packing = fixture.fee_adjustment(order, PACKING, "10.00");
    fixture.tax_adjustment(order, packing, GST, "1.00", false);
    fixture.tax_adjustment(order, packing, LEVY, "0.50", false);
    fixture.fee_adjustment(order, DELIVERY, "3.00");

    let orders = fixture.dataset.orders.clone();
    let tuples = fan_out(&orders);

    // Packing: two rates; delivery: untaxed. Two distinct suppliers.
    assert_eq!(tuples.len(), (2 + 1) * 2);
    assert_eq!(
        summarize(&tuples),
        vec![
            (1, 1, Some(1), 2),
            (1, 1, Some(1), 3),
            (1, 1, Some(2), 2),
            (1, 1, Some(2), 3),
            (1, 2, None, 2),
            (1, 2, None, 3),
        ]
    );
}

#[test]
fn test_repeated_fee_adjustments_collapse_into_one_fee_tuple() {
    let mut fixture = Fixture::new();
    let order = fixture.order(1, HUB, WEEK_ONE, &[FARM_ONE]);
    let first = fixture.fee_adjustment(order, PACKING, "1.00");
    let second = fixture.fee_adjustment(order, PACKING, "2.00");

    let fees = join_fees(&fixture.dataset.orders[0]);
    assert_eq!(fees.len(), 1);
    assert_eq!(fees[0].enterprise_fee_id, PACKING);
    assert_eq!(fees[0].adjustment_ids, vec![first, second]);
}

#[test]
fn test_orders_without_fees_or_items_yield_nothing() {
    let mut fixture = Fixture::new();
    fixture.order(1, HUB, WEEK_ONE, &[FARM_ONE]);
    let empty = fixture.order(2, HUB, WEEK_ONE, &[]);
    fixture.fee_adjustment(empty, PACKING, "5.00");

    let orders = fixture.dataset.orders.clone();
    assert!(fan_out(&orders).is_empty());
    assert!(fan_out(&[]).is_empty());
}

#[test]
fn test_tax_on_another_adjustment_is_not_attributed_to_fee() {
    let mut fixture = Fixture::new();
    let order = fixture.order(1, HUB, WEEK_ONE, &[FARM_ONE]);
    fixture.fee_adjustment(order, PACKING, "10.00");
    // Tax charged on the delivery adjustment only.
    let unrelated = fixture.fee_adjustment(order, DELIVERY, "0.00");
    fixture.tax_adjustment(order, unrelated, GST, "0.00", false);

    let orders = fixture.dataset.orders.clone();
    let tuples = fan_out(&orders);
    let packing: Vec<_> = tuples
        .iter()
        .filter(|t| t.enterprise_fee_id == PACKING)
        .collect();
    assert_eq!(packing.len(), 1);
    assert_eq!(packing[0].tax_rate_id, None);
}

#[test]
fn test_group_key_takes_distributor_and_cycle_from_order() {
    let mut fixture = Fixture::new();
    let order = fixture.order(7, OTHER_HUB, WEEK_TWO, &[FARM_TWO]);
    let fee = fixture.fee_adjustment(order, DELIVERY, "1.00");
    fixture.tax_adjustment(order, fee, LEVY, "0.05", false);

    let orders = fixture.dataset.orders.clone();
    let tuples = fan_out(&orders);
    assert_eq!(tuples.len(), 1);
    assert_eq!(tuples[0].order.id, OrderId(7));
    assert_eq!(
        tuples[0].group_key(),
        GroupKey {
            tax_rate_id: Some(LEVY),
            enterprise_fee_id: DELIVERY,
            supplier_id: FARM_TWO,
            distributor_id: OTHER_HUB,
            order_cycle_id: WEEK_TWO,
        }
    );
}

#[test]
fn test_retain_matching_by_producer_fee_and_owner() {
    let mut fixture = Fixture::new();
    fixture.fee(EnterpriseFeeId(3), "Farm levy", FeeType::Admin, FARM_ONE);
    let order = fixture.order(1, HUB, WEEK_ONE, &[FARM_ONE, FARM_TWO]);
    fixture.fee_adjustment(order, PACKING, "1.00");
    fixture.fee_adjustment(order, EnterpriseFeeId(3), "2.00");
    fixture.fee_adjustment(order, EnterpriseFeeId(404), "3.00");

    let store = fixture.store();
    let orders = fixture.dataset.orders.clone();
    let run = |filters: ReportFilters| {
        summarize(&retain_matching(fan_out(&orders), &filters, &store).unwrap())
    };

    assert_eq!(run(ReportFilters::new()).len(), 6);

    assert_eq!(
        run(ReportFilters::new().with_producers([FARM_TWO])),
        vec![(1, 1, None, 3), (1, 3, None, 3), (1, 404, None, 3)]
    );

    assert_eq!(
        run(ReportFilters::new().with_enterprise_fees([EnterpriseFeeId(3)])),
        vec![(1, 3, None, 2), (1, 3, None, 3)]
    );

    // The fee without a definition has no owner and never passes.
    assert_eq!(
        run(ReportFilters::new().with_fee_owners([FARM_ONE, HUB])),
        vec![(1, 1, None, 2), (1, 1, None, 3), (1, 3, None, 2), (1, 3, None, 3)]
    );

    assert_eq!(
        run(ReportFilters::new()
            .with_fee_owners([FARM_ONE])
            .with_producers([FARM_ONE])),
        vec![(1, 3, None, 2)]
    );
}
