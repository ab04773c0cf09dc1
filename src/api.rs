//! Wire payloads and the remote persistence collaborator.
//!
//! The backend owns every document; this module only mirrors its JSON
//! contract. Reads come back as `{data: ...}` envelopes, writes return
//! `{success, message, data}` and a non-success envelope is surfaced as
//! [`ApiError::Rejected`] so callers can show the server's message.
use crate::document::{Document, DocumentKind};
use crate::engine::Action;
use crate::error::ApiError;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Body of the approval write, `PUT {base}/dashboard/{kind}/{code}/approval`.
/// Optional fields are omitted rather than sent as null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_order_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_bank_account_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
}

impl ApprovalRequest {
    /// Build the write body from an already-applied transition. `next` is
    /// the engine's output snapshot, so its status is the target status.
    pub fn from_transition(next: &Document, action: &Action) -> Self {
        let mut request = ApprovalRequest {
            status: next.status.as_str().to_string(),
            reason: None,
            purchase_order_code: None,
            paid_bank_account_id: None,
            paid_date: None,
        };
        match action {
            Action::Approve { .. } => {
                request.purchase_order_code = next.purchase_order_code.clone();
            }
            Action::Decline { reason, .. } => {
                request.reason = Some(reason.trim().to_string());
            }
            Action::MarkPaid {
                bank_account_id,
                paid_date,
            } => {
                request.paid_bank_account_id = Some(*bank_account_id);
                request.paid_date = Some(*paid_date);
            }
        }
        request
    }
}

/// Selection input for marking an invoice paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: i64,
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
}

#[derive(Debug, Deserialize)]
struct FetchEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct WriteEnvelope {
    #[serde(default = "success_default")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Document>,
}

// A 2xx body without an explicit flag counts as success.
fn success_default() -> bool {
    true
}

/// The remote persistence API, as seen by the orchestrator. Implemented by
/// [`HttpPersistence`] in production and by in-memory fakes in tests.
#[async_trait]
pub trait PersistenceApi: Send + Sync {
    async fn fetch_document(&self, kind: DocumentKind, code: &str) -> Result<Document, ApiError>;

    async fn push_approval(
        &self,
        kind: DocumentKind,
        code: &str,
        request: &ApprovalRequest,
    ) -> Result<Document, ApiError>;

    async fn list_bank_accounts(&self) -> Result<Vec<BankAccount>, ApiError>;
}

/// Reqwest-backed client for the dashboard API, authenticated with a bearer
/// token held by the caller's secure storage.
pub struct HttpPersistence {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpPersistence {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn document_url(&self, kind: DocumentKind, code: &str) -> String {
        format!("{}/dashboard/{}/{}", self.base_url, kind.api_path(), code)
    }
}

#[async_trait]
impl PersistenceApi for HttpPersistence {
    async fn fetch_document(&self, kind: DocumentKind, code: &str) -> Result<Document, ApiError> {
        let response = self
            .client
            .get(self.document_url(kind, code))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Rejected(format!(
                "fetch {code} returned {}",
                response.status()
            )));
        }

        let envelope: FetchEnvelope<Document> = response.json().await?;
        Ok(envelope.data)
    }

    async fn push_approval(
        &self,
        kind: DocumentKind,
        code: &str,
        request: &ApprovalRequest,
    ) -> Result<Document, ApiError> {
        let url = format!("{}/approval", self.document_url(kind, code));
        let response = self
            .client
            .put(url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;

        let http_status = response.status();
        let envelope: WriteEnvelope = response.json().await?;

        if !http_status.is_success() || !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| format!("approval write returned {http_status}"));
            return Err(ApiError::Rejected(message));
        }

        envelope.data.ok_or_else(|| {
            ApiError::MalformedResponse("approval response carried no document".into())
        })
    }

    async fn list_bank_accounts(&self) -> Result<Vec<BankAccount>, ApiError> {
        let response = self
            .client
            .get(format!("{}/dashboard/bank", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Rejected(format!(
                "bank list returned {}",
                response.status()
            )));
        }

        let envelope: FetchEnvelope<Vec<BankAccount>> = response.json().await?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{InvoiceStatus, QuotationStatus};
    use crate::engine::DeclineType;

    #[test]
    fn decline_body_carries_only_status_and_reason() {
        let doc = Document::quotation("QT-200", QuotationStatus::Unqualified);
        let action = Action::Decline {
            reason: "budget exceeded".into(),
            decline_type: DeclineType::Unqualified,
        };

        let body = serde_json::to_value(ApprovalRequest::from_transition(&doc, &action)).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "status": "unqualified",
                "reason": "budget exceeded",
            })
        );
    }

    #[test]
    fn mark_paid_body_serializes_date_as_ymd() {
        let mut doc = Document::invoice("INV-200", InvoiceStatus::Paid);
        doc.paid_bank_account_id = Some(5);
        let action = Action::MarkPaid {
            bank_account_id: 5,
            paid_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        };

        let body = serde_json::to_value(ApprovalRequest::from_transition(&doc, &action)).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "status": "paid",
                "paid_bank_account_id": 5,
                "paid_date": "2024-03-15",
            })
        );
    }

    #[test]
    fn qualified_body_links_the_purchase_order() {
        let mut doc = Document::quotation("QT-201", QuotationStatus::Qualified);
        doc.purchase_order_code = Some("PO-2024-001".into());
        let action = Action::Approve {
            purchase_order_code: Some("PO-2024-001".into()),
        };

        let request = ApprovalRequest::from_transition(&doc, &action);
        assert_eq!(request.status, "qualified");
        assert_eq!(request.purchase_order_code.as_deref(), Some("PO-2024-001"));
    }

    #[test]
    fn write_envelope_defaults_to_success() {
        let envelope: WriteEnvelope = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(envelope.success);

        let rejected: WriteEnvelope =
            serde_json::from_str(r#"{"success": false, "message": "no access"}"#).unwrap();
        assert!(!rejected.success);
        assert_eq!(rejected.message.as_deref(), Some("no access"));
    }
}
