//! Workflow orchestrator: user action -> transition engine -> remote write
//! -> cache refresh.
//!
//! The engine is pure, so the only suspension point is the persistence call.
//! Nothing is written to the cache until the server confirms; a failed write
//! leaves the cached snapshot exactly as it was.
use crate::actor::Actor;
use crate::api::{ApprovalRequest, BankAccount, PersistenceApi};
use crate::document::{Document, DocumentKind};
use crate::engine::{self, Action, DeclineType};
use crate::error::{ApiError, WorkflowError};
use backoff::ExponentialBackoff;
use backoff::future::retry;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;

pub struct WorkflowService {
    api: Arc<dyn PersistenceApi>,
    cache: Arc<sled::Db>,
}

impl WorkflowService {
    pub fn new(api: Arc<dyn PersistenceApi>, cache: Arc<sled::Db>) -> Self {
        Self { api, cache }
    }

    fn cache_key(kind: DocumentKind, code: &str) -> String {
        format!("{}/{}", kind.api_path(), code)
    }

    /// Load a document snapshot, serving from the cache when present.
    pub async fn load_document(
        &self,
        kind: DocumentKind,
        code: &str,
    ) -> Result<Document, WorkflowError> {
        let key = Self::cache_key(kind, code);
        if let Some(bytes) = self.cache.get(&key)? {
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let document = self.api.fetch_document(kind, code).await?;
        self.cache.insert(key, serde_json::to_vec(&document)?)?;
        Ok(document)
    }

    /// Drop a cached snapshot so the next read hits the server.
    pub fn invalidate(&self, kind: DocumentKind, code: &str) -> Result<(), WorkflowError> {
        self.cache.remove(Self::cache_key(kind, code))?;
        Ok(())
    }

    /// Run one transition end to end: validate it locally, persist it, and
    /// replace the cached snapshot with the server's confirmed one.
    pub async fn apply(
        &self,
        kind: DocumentKind,
        code: &str,
        action: Action,
        actor: &Actor,
    ) -> Result<Document, WorkflowError> {
        let current = self.load_document(kind, code).await?;
        let next = engine::transition(&current, &action, actor, Utc::now())?;
        let request = ApprovalRequest::from_transition(&next, &action);

        let saved = self
            .push_with_retry(kind, code, &request)
            .await
            .inspect_err(|err| {
                tracing::warn!(code, kind = %kind, error = %err, "approval write failed");
            })?;

        // Invalidate-and-replace with the confirmed snapshot.
        let key = Self::cache_key(kind, code);
        self.cache.remove(&key)?;
        self.cache.insert(key, serde_json::to_vec(&saved)?)?;

        tracing::info!(
            code,
            kind = %kind,
            action = action.name(),
            status = saved.status.as_str(),
            "transition applied"
        );
        Ok(saved)
    }

    /// Bounded exponential backoff around the write. Only transport-level
    /// failures are transient; the server's rejections come back untouched.
    async fn push_with_retry(
        &self,
        kind: DocumentKind,
        code: &str,
        request: &ApprovalRequest,
    ) -> Result<Document, ApiError> {
        let policy = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(10)),
            ..Default::default()
        };

        retry(policy, || async {
            self.api
                .push_approval(kind, code, request)
                .await
                .map_err(|err| {
                    if err.is_transient() {
                        backoff::Error::transient(err)
                    } else {
                        backoff::Error::permanent(err)
                    }
                })
        })
        .await
    }

    pub async fn approve_purchase_request(
        &self,
        code: &str,
        actor: &Actor,
    ) -> Result<Document, WorkflowError> {
        self.apply(
            DocumentKind::PurchaseRequest,
            code,
            Action::Approve {
                purchase_order_code: None,
            },
            actor,
        )
        .await
    }

    pub async fn decline_purchase_request(
        &self,
        code: &str,
        reason: impl Into<String>,
        decline_type: DeclineType,
        actor: &Actor,
    ) -> Result<Document, WorkflowError> {
        self.apply(
            DocumentKind::PurchaseRequest,
            code,
            Action::Decline {
                reason: reason.into(),
                decline_type,
            },
            actor,
        )
        .await
    }

    pub async fn approve_quotation(
        &self,
        code: &str,
        purchase_order_code: impl Into<String>,
        actor: &Actor,
    ) -> Result<Document, WorkflowError> {
        self.apply(
            DocumentKind::Quotation,
            code,
            Action::Approve {
                purchase_order_code: Some(purchase_order_code.into()),
            },
            actor,
        )
        .await
    }

    pub async fn decline_quotation(
        &self,
        code: &str,
        reason: impl Into<String>,
        decline_type: DeclineType,
        actor: &Actor,
    ) -> Result<Document, WorkflowError> {
        self.apply(
            DocumentKind::Quotation,
            code,
            Action::Decline {
                reason: reason.into(),
                decline_type,
            },
            actor,
        )
        .await
    }

    pub async fn mark_invoice_paid(
        &self,
        code: &str,
        bank_account_id: i64,
        paid_date: NaiveDate,
        actor: &Actor,
    ) -> Result<Document, WorkflowError> {
        self.apply(
            DocumentKind::Invoice,
            code,
            Action::MarkPaid {
                bank_account_id,
                paid_date,
            },
            actor,
        )
        .await
    }

    /// Bank accounts offered as the selection input for `mark_invoice_paid`.
    pub async fn bank_accounts(&self) -> Result<Vec<BankAccount>, WorkflowError> {
        Ok(self.api.list_bank_accounts().await?)
    }
}
