//! Admission policy: domain allow-list and Gmail write guard

pub mod allowlist;
mod engine;
mod request;
pub mod write_guard;

pub use allowlist::{AllowlistStore, DomainSet};
pub use engine::{
    Decision, PolicyEngine, Rejection, Verdict, DOMAIN_REJECTION, OPERATION_REJECTION,
};
pub use request::RequestInfo;
pub use write_guard::{Exactness, WriteGuard, WritePatternRule, WriteRuleSpec};
