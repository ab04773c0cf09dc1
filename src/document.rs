//! Document aggregate: statuses, line items and the append-only reason log.
//!
//! Each document kind carries its own closed status enum so an unhandled
//! status is a compile error rather than a stray string at runtime. Line
//! items are explicit tagged variants; a purchase-request line and a
//! quotation line are never told apart by probing for fields.
use crate::error::DocumentError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    PurchaseRequest,
    Quotation,
    Invoice,
    PurchaseOrder,
    Tracking,
}

impl DocumentKind {
    /// Path segment under the dashboard API routes.
    pub fn api_path(self) -> &'static str {
        match self {
            DocumentKind::PurchaseRequest => "purchase-request",
            DocumentKind::Quotation => "quotation",
            DocumentKind::Invoice => "invoice",
            DocumentKind::PurchaseOrder => "purchase-order",
            DocumentKind::Tracking => "tracking",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::PurchaseRequest => "purchase request",
            DocumentKind::Quotation => "quotation",
            DocumentKind::Invoice => "invoice",
            DocumentKind::PurchaseOrder => "purchase order",
            DocumentKind::Tracking => "tracking record",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseRequestStatus {
    Draft,
    Pending,
    Approved,
    Declined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    Draft,
    Pending,
    Qualified,
    Unqualified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    Paid,
}

/// Driven by external fulfilment, observe-only here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Draft,
    Pending,
    Purchased,
}

/// Driven by external fulfilment, observe-only here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    Preparing,
    InTransit,
    PartiallyArrived,
    Completed,
    Cancelled,
}

/// A document's status, tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum Status {
    PurchaseRequest(PurchaseRequestStatus),
    Quotation(QuotationStatus),
    Invoice(InvoiceStatus),
    PurchaseOrder(PurchaseOrderStatus),
    Tracking(TrackingStatus),
}

impl Status {
    pub fn kind(self) -> DocumentKind {
        match self {
            Status::PurchaseRequest(_) => DocumentKind::PurchaseRequest,
            Status::Quotation(_) => DocumentKind::Quotation,
            Status::Invoice(_) => DocumentKind::Invoice,
            Status::PurchaseOrder(_) => DocumentKind::PurchaseOrder,
            Status::Tracking(_) => DocumentKind::Tracking,
        }
    }

    /// The wire spelling of the status, as the API expects it.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::PurchaseRequest(PurchaseRequestStatus::Draft) => "draft",
            Status::PurchaseRequest(PurchaseRequestStatus::Pending) => "pending",
            Status::PurchaseRequest(PurchaseRequestStatus::Approved) => "approved",
            Status::PurchaseRequest(PurchaseRequestStatus::Declined) => "declined",
            Status::Quotation(QuotationStatus::Draft) => "draft",
            Status::Quotation(QuotationStatus::Pending) => "pending",
            Status::Quotation(QuotationStatus::Qualified) => "qualified",
            Status::Quotation(QuotationStatus::Unqualified) => "unqualified",
            Status::Invoice(InvoiceStatus::Unpaid) => "unpaid",
            Status::Invoice(InvoiceStatus::Paid) => "paid",
            Status::PurchaseOrder(PurchaseOrderStatus::Draft) => "draft",
            Status::PurchaseOrder(PurchaseOrderStatus::Pending) => "pending",
            Status::PurchaseOrder(PurchaseOrderStatus::Purchased) => "purchased",
            Status::Tracking(TrackingStatus::Preparing) => "preparing",
            Status::Tracking(TrackingStatus::InTransit) => "in_transit",
            Status::Tracking(TrackingStatus::PartiallyArrived) => "partially_arrived",
            Status::Tracking(TrackingStatus::Completed) => "completed",
            Status::Tracking(TrackingStatus::Cancelled) => "cancelled",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog item snapshot. The catalog itself is owned elsewhere; the price
/// here is the base price at the time the document was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub code: String,
    pub name: String,
    pub unit: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingLeg {
    pub shipping_method_code: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalCost {
    pub name: String,
    pub additional_cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequestLine {
    pub item: ItemRef,
    pub quantity: Decimal,
    /// Unit price frozen at document creation.
    pub item_price: Decimal,
    #[serde(default)]
    pub shipping: Vec<ShippingLeg>,
    /// The purchase-request API pre-sums additional costs into one field.
    #[serde(default)]
    pub total_additional_cost: Decimal,
    /// Margin per unit.
    #[serde(default)]
    pub margin_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationLine {
    pub item: ItemRef,
    pub quantity: Decimal,
    /// Unit price frozen at document creation.
    pub item_price: Decimal,
    #[serde(default)]
    pub shipping: Vec<ShippingLeg>,
    /// The quotation API keeps additional costs as named entries.
    #[serde(default)]
    pub additional_cost: Vec<AdditionalCost>,
    /// Margin per unit (the source schema's `unit_quoted_price.margin_price`).
    #[serde(default)]
    pub unit_margin_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub item: ItemRef,
    pub quantity: Decimal,
    pub item_price: Decimal,
}

/// One row of a document. The discriminant is explicit; callers match on the
/// variant instead of guessing the shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineItem {
    PurchaseRequest(PurchaseRequestLine),
    Quotation(QuotationLine),
    Invoice(InvoiceLine),
}

impl LineItem {
    pub fn kind(&self) -> DocumentKind {
        match self {
            LineItem::PurchaseRequest(_) => DocumentKind::PurchaseRequest,
            LineItem::Quotation(_) => DocumentKind::Quotation,
            LineItem::Invoice(_) => DocumentKind::Invoice,
        }
    }

    pub fn item(&self) -> &ItemRef {
        match self {
            LineItem::PurchaseRequest(line) => &line.item,
            LineItem::Quotation(line) => &line.item,
            LineItem::Invoice(line) => &line.item,
        }
    }

    pub fn quantity(&self) -> Decimal {
        match self {
            LineItem::PurchaseRequest(line) => line.quantity,
            LineItem::Quotation(line) => line.quantity,
            LineItem::Invoice(line) => line.quantity,
        }
    }

    pub fn item_price(&self) -> Decimal {
        match self {
            LineItem::PurchaseRequest(line) => line.item_price,
            LineItem::Quotation(line) => line.item_price,
            LineItem::Invoice(line) => line.item_price,
        }
    }
}

/// Append-only decline/transition log entry. Entries are never mutated,
/// reordered or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonEntry {
    pub reason: String,
    pub reviewed_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub code: String,
    #[serde(flatten)]
    pub status: Status,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub reasons: Vec<ReasonEntry>,
    #[serde(default)]
    pub margin_percent: Decimal,
    #[serde(default)]
    pub tax_percent: Decimal,
    #[serde(default)]
    pub is_taxed: bool,
    #[serde(default)]
    pub rounding_up: Decimal,
    /// Set when a quotation qualifies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_order_code: Option<String>,
    /// Set when an invoice is paid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_bank_account_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
    /// Server-side cached total, kept for display only. Totals are always
    /// recomputed from the line items when the two disagree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grand_total_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(code: impl Into<String>, status: Status) -> Self {
        let now = Utc::now();
        Self {
            code: code.into(),
            status,
            items: Vec::new(),
            reasons: Vec::new(),
            margin_percent: Decimal::ZERO,
            tax_percent: Decimal::ZERO,
            is_taxed: false,
            rounding_up: Decimal::ZERO,
            purchase_order_code: None,
            paid_bank_account_id: None,
            paid_date: None,
            grand_total_price: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn purchase_request(code: impl Into<String>, status: PurchaseRequestStatus) -> Self {
        Self::new(code, Status::PurchaseRequest(status))
    }

    pub fn quotation(code: impl Into<String>, status: QuotationStatus) -> Self {
        Self::new(code, Status::Quotation(status))
    }

    pub fn invoice(code: impl Into<String>, status: InvoiceStatus) -> Self {
        Self::new(code, Status::Invoice(status))
    }

    pub fn with_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_margin_percent(mut self, percent: Decimal) -> Self {
        self.margin_percent = percent;
        self
    }

    pub fn with_tax(mut self, percent: Decimal) -> Self {
        self.tax_percent = percent;
        self.is_taxed = true;
        self
    }

    pub fn with_rounding_up(mut self, amount: Decimal) -> Self {
        self.rounding_up = amount;
        self
    }

    pub fn kind(&self) -> DocumentKind {
        self.status.kind()
    }

    /// Check the aggregate invariants: positive quantities, non-negative
    /// prices, and line items that belong to this document kind.
    pub fn validate(&self) -> Result<(), DocumentError> {
        let kind = self.kind();
        for line in &self.items {
            let item_code = line.item().code.clone();
            if line.kind() != kind {
                return Err(DocumentError::ForeignLineItem { kind, item_code });
            }
            if line.quantity() <= Decimal::ZERO {
                return Err(DocumentError::NonPositiveQuantity { item_code });
            }
            if line.item_price() < Decimal::ZERO || has_negative_charge(line) {
                return Err(DocumentError::NegativePrice { item_code });
            }
        }
        Ok(())
    }

    /// Recomputed total; the source of truth over `grand_total_price`.
    pub fn grand_total(&self) -> Decimal {
        crate::pricing::grand_total(self)
    }
}

fn has_negative_charge(line: &LineItem) -> bool {
    match line {
        LineItem::PurchaseRequest(line) => {
            line.shipping.iter().any(|leg| leg.price < Decimal::ZERO)
                || line.total_additional_cost < Decimal::ZERO
                || line.margin_price < Decimal::ZERO
        }
        LineItem::Quotation(line) => {
            line.shipping.iter().any(|leg| leg.price < Decimal::ZERO)
                || line
                    .additional_cost
                    .iter()
                    .any(|cost| cost.additional_cost < Decimal::ZERO)
                || line.unit_margin_price < Decimal::ZERO
        }
        LineItem::Invoice(_) => false,
    }
}
