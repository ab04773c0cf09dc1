//! Pure pricing derivations over document snapshots.
//!
//! Every function here is referentially transparent and does no I/O.
//! Totals must reproduce the backend's figures exactly, so all
//! arithmetic is decimal and the only rounding point is the tax amount
//! (IDR has no minor unit, so tax rounds to a whole rupiah).
use crate::document::{Document, LineItem, QuotationLine};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Sum of `item_price * quantity` over all lines. Zero for empty input.
pub fn items_total(items: &[LineItem]) -> Decimal {
    items
        .iter()
        .map(|line| line.item_price() * line.quantity())
        .sum()
}

/// Sum of the per-leg shipping prices of one line. A line may have no legs.
pub fn shipping_total(line: &LineItem) -> Decimal {
    let legs = match line {
        LineItem::PurchaseRequest(line) => &line.shipping,
        LineItem::Quotation(line) => &line.shipping,
        LineItem::Invoice(_) => return Decimal::ZERO,
    };
    legs.iter().map(|leg| leg.price).sum()
}

/// Additional costs of one line. Quotation lines carry named entries, the
/// purchase-request API pre-sums them into a single field; both produce the
/// same semantic total.
pub fn additional_cost_total(line: &LineItem) -> Decimal {
    match line {
        LineItem::PurchaseRequest(line) => line.total_additional_cost,
        LineItem::Quotation(line) => line
            .additional_cost
            .iter()
            .map(|cost| cost.additional_cost)
            .sum(),
        LineItem::Invoice(_) => Decimal::ZERO,
    }
}

/// Per-unit margin scaled by quantity. Same formula for both kinds, the
/// field just lives under a different name in each schema.
pub fn margin_total(line: &LineItem) -> Decimal {
    match line {
        LineItem::PurchaseRequest(line) => line.margin_price * line.quantity,
        LineItem::Quotation(line) => line.unit_margin_price * line.quantity,
        LineItem::Invoice(_) => Decimal::ZERO,
    }
}

/// Full contribution of one line to the document total.
pub fn line_total(line: &LineItem) -> Decimal {
    line.item_price() * line.quantity()
        + shipping_total(line)
        + additional_cost_total(line)
        + margin_total(line)
}

/// Pre-tax, pre-rounding sum over all lines.
pub fn subtotal(document: &Document) -> Decimal {
    document.items.iter().map(line_total).sum()
}

/// `subtotal * tax_percent / 100`, rounded to the nearest whole rupiah.
pub fn tax_amount(subtotal: Decimal, tax_percent: Decimal) -> Decimal {
    (subtotal * tax_percent / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// The document total: subtotal, plus tax when the document is taxed, plus
/// the document-level rounding-up amount.
pub fn grand_total(document: &Document) -> Decimal {
    let base = subtotal(document);
    let tax = if document.is_taxed {
        tax_amount(base, document.tax_percent)
    } else {
        Decimal::ZERO
    };
    base + tax + document.rounding_up
}

/// The quoted-price breakdown the API exposes per quotation line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotedPrice {
    pub item_price: Decimal,
    pub shipping_price: Decimal,
    pub additional_cost: Decimal,
    pub margin_price: Decimal,
    pub rounding_up: Decimal,
    pub quoted_price: Decimal,
}

/// Breakdown of one quotation line's total quoted price. Rounding-up is a
/// document-level adjustment and stays zero per line.
pub fn total_quoted_price(line: &QuotationLine) -> QuotedPrice {
    let item_price = line.item_price * line.quantity;
    let shipping_price: Decimal = line.shipping.iter().map(|leg| leg.price).sum();
    let additional_cost: Decimal = line
        .additional_cost
        .iter()
        .map(|cost| cost.additional_cost)
        .sum();
    let margin_price = line.unit_margin_price * line.quantity;

    QuotedPrice {
        item_price,
        shipping_price,
        additional_cost,
        margin_price,
        rounding_up: Decimal::ZERO,
        quoted_price: item_price + shipping_price + additional_cost + margin_price,
    }
}
