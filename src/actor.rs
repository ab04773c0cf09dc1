//! The acting user and their capability allow-list.
//!
//! A capability is a short token such as `pr-approval`; the backend hands the
//! authenticated user a list of frontend paths (`/pr-approval/:prId`, ...)
//! and an actor may perform an action iff one of those paths contains the
//! required token. This is a plain allow-list check, not an RBAC engine.
use serde::{Deserialize, Serialize};

pub const PR_APPROVAL: &str = "pr-approval";
pub const QUOTATION_APPROVAL: &str = "quotation-approval";
pub const INVOICE_PAYMENT: &str = "invoice-payment";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub frontend_path: Vec<String>,
}

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frontend_path: Vec::new(),
        }
    }

    /// Grant a capability by adding a path carrying its token.
    pub fn allow(mut self, capability: &str) -> Self {
        self.frontend_path.push(format!("/{capability}/:id"));
        self
    }

    pub fn can(&self, capability: &str) -> bool {
        self.frontend_path
            .iter()
            .any(|path| path.contains(capability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_is_substring_based() {
        let actor = Actor {
            name: "Reviewer".into(),
            frontend_path: vec!["/pr-approval/:prId".into(), "/dashboard".into()],
        };

        assert!(actor.can(PR_APPROVAL));
        assert!(!actor.can(QUOTATION_APPROVAL));
        assert!(!actor.can(INVOICE_PAYMENT));
    }

    #[test]
    fn allow_grants_capability() {
        let actor = Actor::new("Reviewer").allow(INVOICE_PAYMENT);
        assert!(actor.can(INVOICE_PAYMENT));
    }
}
