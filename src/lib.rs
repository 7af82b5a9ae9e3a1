//! openclaw-gate - request-admission policy for an intercepting HTTPS proxy
//!
//! For every intercepted request the proxy engine asks this crate whether to
//! forward it or to answer with a canned rejection.
//!
//! # Features
//!
//! - **Domain allow-list**: default-deny; a host passes if it equals an allowed
//!   domain or is a subdomain of one. Loaded from CSV and reloadable at runtime
//!   with an atomic swap.
//! - **Gmail write guard**: reads pass, while sending, trashing and deleting
//!   messages, threads and drafts is blocked.
//! - **Audit trail**: one `ALLOWED` / `BLOCKED` line per decision through
//!   pluggable sinks.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use openclaw_gate::{AllowlistStore, PolicyEngine, RequestInfo, WriteGuard};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let allowlist = Arc::new(AllowlistStore::open("allowed_domains.csv"));
//!     let engine = PolicyEngine::new(allowlist, WriteGuard::gmail()?);
//!
//!     let request = RequestInfo::new(
//!         "POST",
//!         "https",
//!         "gmail.googleapis.com",
//!         None,
//!         "/gmail/v1/users/me/messages/send",
//!         None,
//!     );
//!     if let Some(rejection) = engine.evaluate(&request).rejection() {
//!         println!("{} {}", rejection.status, rejection.body);
//!     }
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod hook;
pub mod policy;
pub mod reload;

#[cfg(test)]
mod test_support;

pub use audit::{AuditEntry, AuditLogger, AuditSink, MemorySink, TracingSink};
pub use config::Config;
pub use error::{Error, Result};
pub use hook::RequestHook;
pub use policy::{
    AllowlistStore, Decision, DomainSet, PolicyEngine, Rejection, RequestInfo, Verdict,
    WriteGuard,
};
pub use reload::ReloadWatcher;
