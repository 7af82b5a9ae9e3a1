//! Request admission: domain gate followed by the write-operation gate.

use hyper::StatusCode;
use serde::Serialize;
use std::sync::Arc;

use super::allowlist::AllowlistStore;
use super::request::RequestInfo;
use super::write_guard::WriteGuard;
use crate::config::Config;
use crate::error::Result;

/// Outcome of evaluating one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Allow,
    BlockByDomain,
    BlockByOperation,
}

/// What the proxy engine sends back instead of forwarding a blocked request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub status: StatusCode,
    pub reason: &'static str,
    pub body: &'static str,
}

pub const DOMAIN_REJECTION: Rejection = Rejection {
    status: StatusCode::FORBIDDEN,
    reason: "host not in allow-list",
    body: "Access Denied by OpenClaw Proxy",
};

pub const OPERATION_REJECTION: Rejection = Rejection {
    status: StatusCode::FORBIDDEN,
    reason: "blocked write operation",
    body: "Gmail write operation blocked by OpenClaw Proxy (read-only mode)",
};

impl Verdict {
    pub fn is_allowed(self) -> bool {
        matches!(self, Verdict::Allow)
    }

    /// The response to substitute, or None when the request is forwarded
    pub fn rejection(self) -> Option<Rejection> {
        match self {
            Verdict::Allow => None,
            Verdict::BlockByDomain => Some(DOMAIN_REJECTION),
            Verdict::BlockByOperation => Some(OPERATION_REJECTION),
        }
    }
}

/// A verdict together with the request it was reached for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision<'a> {
    pub request: RequestInfo<'a>,
    pub verdict: Verdict,
}

impl Decision<'_> {
    pub fn is_allowed(&self) -> bool {
        self.verdict.is_allowed()
    }

    pub fn rejection(&self) -> Option<Rejection> {
        self.verdict.rejection()
    }
}

/// Composes the allow-list and the write guard into one decision.
///
/// Evaluation performs no I/O and takes no locks; the engine can be shared
/// across any number of request tasks.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    allowlist: Arc<AllowlistStore>,
    write_guard: WriteGuard,
}

impl PolicyEngine {
    pub fn new(allowlist: Arc<AllowlistStore>, write_guard: WriteGuard) -> Self {
        Self {
            allowlist,
            write_guard,
        }
    }

    /// Build the engine described by a configuration, loading the allow-list
    pub fn from_config(config: &Config) -> Result<Self> {
        let allowlist = Arc::new(AllowlistStore::open(&config.allowlist.domains_file));
        let write_guard = if config.write_guard.enabled {
            WriteGuard::with_prefix(&config.write_guard.api_prefix)?
        } else {
            WriteGuard::disabled()
        };

        tracing::info!(
            domains = allowlist.len(),
            write_rules = write_guard.rule_count(),
            "Policy engine initialized"
        );
        Ok(Self::new(allowlist, write_guard))
    }

    pub fn evaluate<'a>(&self, request: &RequestInfo<'a>) -> Decision<'a> {
        let verdict = if !self.allowlist.is_allowed(request.host) {
            Verdict::BlockByDomain
        } else if self.write_guard.is_blocked(request.method, request.path) {
            Verdict::BlockByOperation
        } else {
            Verdict::Allow
        };

        Decision {
            request: request.clone(),
            verdict,
        }
    }

    pub fn allowlist(&self) -> &Arc<AllowlistStore> {
        &self.allowlist
    }

    pub fn write_guard(&self) -> &WriteGuard {
        &self.write_guard
    }
}
