//! Approval workflow core for procurement documents.
//!
//! Purchase requests, quotations and invoices move through small per-kind
//! status machines; role-gated actions drive the transitions and the pricing
//! derivations must match the backend's figures exactly. The engine and the
//! pricing calculator are pure; talking to the backend and caching snapshots
//! is the service layer's job.

pub mod actor;
pub mod api;
pub mod document;
pub mod engine;
pub mod error;
pub mod pricing;
pub mod service;
pub mod utils;
