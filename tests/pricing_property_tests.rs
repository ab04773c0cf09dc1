//! Property-based tests for the pricing calculator.
//!
//! The totals feed financial documents, so the invariants here must hold for
//! every well-formed snapshot, not just the handful of fixtures in the unit
//! tests: order independence, component decomposition, non-negativity and
//! referential transparency.
use procurement_approval::document::{
    AdditionalCost, Document, ItemRef, LineItem, PurchaseRequestLine, QuotationLine,
    QuotationStatus, ShippingLeg,
};
use procurement_approval::pricing;
use proptest::prelude::*;
use rust_decimal::Decimal;

// PROPERTY TEST STRATEGIES

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0u64..=10_000_000u64).prop_map(Decimal::from)
}

fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1u64..=500u64).prop_map(Decimal::from)
}

fn shipping_strategy() -> impl Strategy<Value = Vec<ShippingLeg>> {
    prop::collection::vec(
        (0u64..=500_000u64).prop_map(|price| ShippingLeg {
            shipping_method_code: "SEA-FCL".into(),
            price: Decimal::from(price),
        }),
        0..3,
    )
}

fn additional_cost_strategy() -> impl Strategy<Value = Vec<AdditionalCost>> {
    prop::collection::vec(
        (0u64..=200_000u64).prop_map(|cost| AdditionalCost {
            name: "handling".into(),
            additional_cost: Decimal::from(cost),
        }),
        0..3,
    )
}

fn quotation_line_strategy() -> impl Strategy<Value = LineItem> {
    (
        amount_strategy(),
        quantity_strategy(),
        shipping_strategy(),
        additional_cost_strategy(),
        (0u64..=100_000u64).prop_map(Decimal::from),
    )
        .prop_map(
            |(item_price, quantity, shipping, additional_cost, unit_margin_price)| {
                LineItem::Quotation(QuotationLine {
                    item: ItemRef {
                        code: "ITM-P".into(),
                        name: "Proptest Item".into(),
                        unit: "pcs".into(),
                        price: item_price,
                    },
                    quantity,
                    item_price,
                    shipping,
                    additional_cost,
                    unit_margin_price,
                })
            },
        )
}

fn quotation_strategy() -> impl Strategy<Value = Document> {
    (
        prop::collection::vec(quotation_line_strategy(), 0..8),
        (0u64..=1_000u64).prop_map(Decimal::from),
    )
        .prop_map(|(lines, rounding_up)| {
            let mut doc =
                Document::quotation("QT-PROP", QuotationStatus::Pending).with_rounding_up(rounding_up);
            doc.items = lines;
            doc
        })
}

// PROPERTY TESTS

proptest! {
    /// Sums are commutative: reordering line items never changes the total.
    #[test]
    fn prop_grand_total_is_order_independent(doc in quotation_strategy()) {
        let mut reordered = doc.clone();
        reordered.items.reverse();
        prop_assert_eq!(pricing::grand_total(&doc), pricing::grand_total(&reordered));

        if doc.items.len() > 1 {
            let mut rotated = doc.clone();
            rotated.items.rotate_left(1);
            prop_assert_eq!(pricing::grand_total(&doc), pricing::grand_total(&rotated));
        }
    }

    /// The grand total decomposes exactly into its component sums.
    #[test]
    fn prop_grand_total_decomposes(doc in quotation_strategy()) {
        let components = pricing::items_total(&doc.items)
            + doc.items.iter().map(pricing::shipping_total).sum::<Decimal>()
            + doc.items.iter().map(pricing::additional_cost_total).sum::<Decimal>()
            + doc.items.iter().map(pricing::margin_total).sum::<Decimal>()
            + doc.rounding_up;

        prop_assert_eq!(pricing::grand_total(&doc), components);
    }

    /// Non-negative inputs can never produce a negative total.
    #[test]
    fn prop_totals_are_never_negative(doc in quotation_strategy()) {
        prop_assert!(pricing::grand_total(&doc) >= Decimal::ZERO);
        for line in &doc.items {
            prop_assert!(pricing::line_total(line) >= Decimal::ZERO);
        }
    }

    /// Same snapshot in, same figures out: no hidden clock or randomness.
    #[test]
    fn prop_pricing_is_deterministic(doc in quotation_strategy()) {
        prop_assert_eq!(pricing::grand_total(&doc), pricing::grand_total(&doc));
        prop_assert_eq!(pricing::subtotal(&doc), pricing::subtotal(&doc));
    }

    /// The quoted-price breakdown agrees with the line-level calculator.
    #[test]
    fn prop_quoted_breakdown_matches_line_total(line in quotation_line_strategy()) {
        let LineItem::Quotation(quotation_line) = &line else {
            unreachable!("strategy only builds quotation lines");
        };
        let quoted = pricing::total_quoted_price(quotation_line);

        prop_assert_eq!(quoted.item_price, line.item_price() * line.quantity());
        prop_assert_eq!(quoted.shipping_price, pricing::shipping_total(&line));
        prop_assert_eq!(quoted.additional_cost, pricing::additional_cost_total(&line));
        prop_assert_eq!(quoted.margin_price, pricing::margin_total(&line));
        prop_assert_eq!(quoted.quoted_price, pricing::line_total(&line));
    }

    /// A purchase-request line with the same figures prices identically to a
    /// quotation line; the margin fields are parallel, not divergent.
    #[test]
    fn prop_margin_formulas_are_parallel(
        item_price in amount_strategy(),
        quantity in quantity_strategy(),
        margin in (0u64..=100_000u64).prop_map(Decimal::from),
        presummed in (0u64..=200_000u64).prop_map(Decimal::from),
    ) {
        let item = ItemRef {
            code: "ITM-P".into(),
            name: "Proptest Item".into(),
            unit: "pcs".into(),
            price: item_price,
        };
        let pr = LineItem::PurchaseRequest(PurchaseRequestLine {
            item: item.clone(),
            quantity,
            item_price,
            shipping: vec![],
            total_additional_cost: presummed,
            margin_price: margin,
        });
        let quotation = LineItem::Quotation(QuotationLine {
            item,
            quantity,
            item_price,
            shipping: vec![],
            additional_cost: vec![AdditionalCost {
                name: "bundled".into(),
                additional_cost: presummed,
            }],
            unit_margin_price: margin,
        });

        prop_assert_eq!(pricing::line_total(&pr), pricing::line_total(&quotation));
    }
}

mod tax_rounding {
    use super::*;
    use rust_decimal_macros::dec;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        /// Tax always lands on a whole rupiah and within half a rupiah of the
        /// exact product.
        #[test]
        fn prop_tax_rounds_to_minor_unit(
            subtotal in amount_strategy(),
            tax_percent in (0u64..=40u64).prop_map(Decimal::from),
        ) {
            let tax = pricing::tax_amount(subtotal, tax_percent);
            let exact = subtotal * tax_percent / dec!(100);

            prop_assert_eq!(tax, tax.trunc(), "tax must have no fractional part");
            prop_assert!((tax - exact).abs() <= dec!(0.5));
        }
    }
}

#[test]
fn validated_documents_pass_pricing_smoke() {
    // anchor for the strategies: a freshly built strategy document validates
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    let mut runner = TestRunner::default();
    for _ in 0..16 {
        let doc = quotation_strategy()
            .new_tree(&mut runner)
            .unwrap()
            .current();
        assert!(doc.validate().is_ok());
        let _ = pricing::grand_total(&doc);
    }
}
