//! Property tests over randomly generated order sets.

#[path = "../common/mod.rs"]
mod common;

use std::collections::{BTreeMap, BTreeSet};

use common::*;
use fee_report::model::{EnterpriseFeeId, EnterpriseId, Order, OrderCycleId, TaxRateId};
use fee_report::pipeline::{build_report, fan_out, ReportOptions};
use fee_report::report::GroupingLevel;
use fee_report::store::{MemoryStore, ReportFilters};
use proptest::prelude::*;
use rust_decimal::Decimal;

const DISTRIBUTORS: [EnterpriseId; 2] = [HUB, OTHER_HUB];
const SUPPLIERS: [EnterpriseId; 2] = [FARM_ONE, FARM_TWO];
const CYCLES: [OrderCycleId; 2] = [WEEK_ONE, WEEK_TWO];
const FEES: [EnterpriseFeeId; 2] = [PACKING, DELIVERY];
const RATES: [TaxRateId; 2] = [GST, LEVY];

#[derive(Debug, Clone)]
struct TaxSpec {
    rate: usize,
    cents: i64,
    included: bool,
}

#[derive(Debug, Clone)]
struct FeeSpec {
    fee: usize,
    cents: i64,
    taxes: Vec<TaxSpec>,
}

#[derive(Debug, Clone)]
struct OrderSpec {
    distributor: usize,
    cycle: usize,
    suppliers: Vec<usize>,
    fees: Vec<FeeSpec>,
}

fn tax_spec() -> impl Strategy<Value = TaxSpec> {
    (0..RATES.len(), 0..500i64, any::<bool>()).prop_map(|(rate, cents, included)| TaxSpec {
        rate,
        cents,
        included,
    })
}

fn fee_spec() -> impl Strategy<Value = FeeSpec> {
    (
        0..FEES.len(),
        0..5_000i64,
        prop::collection::vec(tax_spec(), 0..3),
    )
        .prop_map(|(fee, cents, taxes)| FeeSpec { fee, cents, taxes })
}

fn order_spec() -> impl Strategy<Value = OrderSpec> {
    (
        0..DISTRIBUTORS.len(),
        0..CYCLES.len(),
        prop::collection::vec(0..SUPPLIERS.len(), 0..4),
        prop::collection::vec(fee_spec(), 0..4),
    )
        .prop_map(|(distributor, cycle, suppliers, fees)| OrderSpec {
            distributor,
            cycle,
            suppliers,
            fees,
        })
}

fn money(cents: i64) -> String {
    Decimal::new(cents, 2).to_string()
}

fn build(specs: &[OrderSpec]) -> (Vec<Order>, MemoryStore) {
    let mut fixture = Fixture::new();
    for (i, spec) in specs.iter().enumerate() {
        let suppliers: Vec<_> = spec.suppliers.iter().map(|&s| SUPPLIERS[s]).collect();
        let order = fixture.order(
            i as i64 + 1,
            DISTRIBUTORS[spec.distributor],
            CYCLES[spec.cycle],
            &suppliers,
        );
        for fee in &spec.fees {
            let adjustment = fixture.fee_adjustment(order, FEES[fee.fee], &money(fee.cents));
            for tax in &fee.taxes {
                fixture.tax_adjustment(
                    order,
                    adjustment,
                    RATES[tax.rate],
                    &money(tax.cents),
                    tax.included,
                );
            }
        }
    }
    (fixture.dataset.orders.clone(), fixture.store())
}

fn expected_tuple_count(spec: &OrderSpec) -> usize {
    let suppliers: BTreeSet<_> = spec.suppliers.iter().collect();
    let mut rates_by_fee: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for fee in &spec.fees {
        rates_by_fee
            .entry(fee.fee)
            .or_default()
            .extend(fee.taxes.iter().map(|t| t.rate));
    }
    rates_by_fee
        .values()
        .map(|rates| rates.len().max(1))
        .sum::<usize>()
        * suppliers.len()
}

/// Distributor totals straight from the generated amounts.
fn expected_distributor_totals(specs: &[OrderSpec], distributor: usize) -> (Decimal, Decimal) {
    let mut excl = Decimal::ZERO;
    let mut tax = Decimal::ZERO;
    for spec in specs
        .iter()
        .filter(|s| s.distributor == distributor && !s.suppliers.is_empty())
    {
        for fee in &spec.fees {
            excl += Decimal::new(fee.cents, 2);
            for t in &fee.taxes {
                tax += Decimal::new(t.cents, 2);
                if t.included {
                    excl -= Decimal::new(t.cents, 2);
                }
            }
        }
    }
    (excl, tax)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_every_row_balances(specs in prop::collection::vec(order_spec(), 0..6)) {
        let (orders, store) = build(&specs);
        let output = build_report(
            &orders,
            &ReportFilters::new(),
            &store,
            &store,
            &ReportOptions::default(),
        )
        .unwrap();

        for row in &output.rows {
            let totals = row.totals();
            prop_assert_eq!(totals.total_excl_tax() + totals.tax(), totals.total_incl_tax());
        }
    }

    #[test]
    fn prop_fan_out_size(specs in prop::collection::vec(order_spec(), 0..6)) {
        let (orders, _) = build(&specs);
        let expected: usize = specs.iter().map(expected_tuple_count).sum();
        prop_assert_eq!(fan_out(&orders).len(), expected);
    }

    #[test]
    fn prop_input_order_does_not_matter(specs in prop::collection::vec(order_spec(), 0..6)) {
        let (orders, store) = build(&specs);
        let mut reversed = orders.clone();
        reversed.reverse();

        let options = ReportOptions::default();
        let filters = ReportFilters::new();
        let forward = build_report(&orders, &filters, &store, &store, &options).unwrap();
        let backward = build_report(&reversed, &filters, &store, &store, &options).unwrap();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn prop_distributor_summary_matches_raw_amounts(
        specs in prop::collection::vec(order_spec(), 0..6)
    ) {
        let (orders, store) = build(&specs);
        let output = build_report(
            &orders,
            &ReportFilters::new(),
            &store,
            &store,
            &ReportOptions::default(),
        )
        .unwrap();

        for row in output.summary_rows(GroupingLevel::Distributor) {
            let distributor = match row.columns.distributor.as_deref() {
                Some("Green Hub") => 0,
                Some("Apple Hub") => 1,
                other => panic!("unexpected distributor {:?}", other),
            };
            let (excl, tax) = expected_distributor_totals(&specs, distributor);
            prop_assert_eq!(row.totals().total_excl_tax(), excl);
            prop_assert_eq!(row.totals().tax(), tax);
        }
    }
}
