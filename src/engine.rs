//! Status transition engine.
//!
//! `transition` is a pure function from `(snapshot, action, actor, instant)`
//! to a new snapshot. It performs no I/O and keeps no state, so an identical
//! call can be retried safely; whether the result is persisted is the
//! orchestrator's business.
use crate::actor::{self, Actor};
use crate::document::{
    Document, DocumentKind, InvoiceStatus, PurchaseRequestStatus, QuotationStatus, ReasonEntry,
    Status,
};
use crate::error::TransitionError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// How a decline resolves. The first pair belongs to purchase requests, the
/// second to quotations; the engine rejects a mismatched pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclineType {
    Decline,
    DeclineToDraft,
    Unqualified,
    UnqualifiedDraft,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Approve {
        purchase_order_code: Option<String>,
    },
    Decline {
        reason: String,
        decline_type: DeclineType,
    },
    MarkPaid {
        bank_account_id: i64,
        paid_date: NaiveDate,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Approve { .. } => "approve",
            Action::Decline { .. } => "decline",
            Action::MarkPaid { .. } => "mark_paid",
        }
    }
}

/// Capability token an actor must hold to perform `action` on `kind`.
/// `None` means the action simply does not exist for that kind.
fn required_capability(kind: DocumentKind, action: &Action) -> Option<&'static str> {
    match (kind, action) {
        (DocumentKind::PurchaseRequest, Action::Approve { .. } | Action::Decline { .. }) => {
            Some(actor::PR_APPROVAL)
        }
        (DocumentKind::Quotation, Action::Approve { .. } | Action::Decline { .. }) => {
            Some(actor::QUOTATION_APPROVAL)
        }
        (DocumentKind::Invoice, Action::MarkPaid { .. }) => Some(actor::INVOICE_PAYMENT),
        _ => None,
    }
}

/// Validate and apply one status change, returning the new snapshot.
///
/// The caller supplies the transition instant so the engine stays
/// deterministic; it never reads the clock itself.
pub fn transition(
    document: &Document,
    action: &Action,
    actor: &Actor,
    at: DateTime<Utc>,
) -> Result<Document, TransitionError> {
    document.validate()?;

    // Reason emptiness is rejected up front, for every kind and status.
    if let Action::Decline { reason, .. } = action {
        if reason.trim().is_empty() {
            return Err(TransitionError::Validation { field: "reason" });
        }
    }

    let kind = document.kind();
    let invalid = || TransitionError::InvalidTransition {
        kind,
        action: action.name(),
        status: document.status.as_str(),
    };

    let capability = required_capability(kind, action).ok_or_else(invalid)?;
    if !actor.can(capability) {
        return Err(TransitionError::Unauthorized {
            kind,
            action: action.name(),
        });
    }

    let next_status = match (document.status, action) {
        (Status::PurchaseRequest(PurchaseRequestStatus::Pending), Action::Approve { .. }) => {
            Status::PurchaseRequest(PurchaseRequestStatus::Approved)
        }
        (
            Status::PurchaseRequest(PurchaseRequestStatus::Pending),
            Action::Decline { decline_type, .. },
        ) => match decline_type {
            DeclineType::Decline => Status::PurchaseRequest(PurchaseRequestStatus::Declined),
            DeclineType::DeclineToDraft => Status::PurchaseRequest(PurchaseRequestStatus::Draft),
            _ => return Err(TransitionError::Validation {
                field: "decline_type",
            }),
        },
        (
            Status::Quotation(QuotationStatus::Pending),
            Action::Approve {
                purchase_order_code,
            },
        ) => {
            let po = purchase_order_code.as_deref().map(str::trim).unwrap_or("");
            if po.is_empty() {
                return Err(TransitionError::Validation {
                    field: "purchase_order_code",
                });
            }
            Status::Quotation(QuotationStatus::Qualified)
        }
        (Status::Quotation(QuotationStatus::Pending), Action::Decline { decline_type, .. }) => {
            match decline_type {
                DeclineType::Unqualified => Status::Quotation(QuotationStatus::Unqualified),
                DeclineType::UnqualifiedDraft => Status::Quotation(QuotationStatus::Draft),
                _ => return Err(TransitionError::Validation {
                    field: "decline_type",
                }),
            }
        }
        (Status::Invoice(InvoiceStatus::Unpaid), Action::MarkPaid { bank_account_id, .. }) => {
            if *bank_account_id <= 0 {
                return Err(TransitionError::Validation {
                    field: "paid_bank_account_id",
                });
            }
            Status::Invoice(InvoiceStatus::Paid)
        }
        _ => return Err(invalid()),
    };

    let mut next = document.clone();
    next.status = next_status;
    match action {
        Action::Approve {
            purchase_order_code: Some(po),
        } => {
            next.purchase_order_code = Some(po.trim().to_string());
        }
        Action::Approve { .. } => {}
        Action::Decline { reason, .. } => {
            next.reasons.push(ReasonEntry {
                reason: reason.trim().to_string(),
                reviewed_by: actor.name.clone(),
                created_at: at,
            });
        }
        Action::MarkPaid {
            bank_account_id,
            paid_date,
        } => {
            next.paid_bank_account_id = Some(*bank_account_id);
            next.paid_date = Some(*paid_date);
        }
    }
    next.updated_at = at;

    Ok(next)
}
