//! Per-request hook called by the proxy engine before forwarding

use std::sync::Arc;

use super::response::{rejection_response, RejectionResponse};
use crate::audit::{AuditEntry, AuditSink};
use crate::policy::{Decision, PolicyEngine, RequestInfo};

/// Evaluates intercepted requests and records every decision.
///
/// The policy engine stays free of I/O; audit sinks are injected here.
pub struct RequestHook {
    engine: Arc<PolicyEngine>,
    sinks: Vec<Arc<dyn AuditSink>>,
    log_allowed_requests: bool,
    log_blocked_requests: bool,
}

impl RequestHook {
    pub fn new(engine: Arc<PolicyEngine>) -> Self {
        Self {
            engine,
            sinks: Vec::new(),
            log_allowed_requests: true,
            log_blocked_requests: true,
        }
    }

    pub fn with_request_logging(mut self, log_allowed: bool, log_blocked: bool) -> Self {
        self.log_allowed_requests = log_allowed;
        self.log_blocked_requests = log_blocked;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn engine(&self) -> &Arc<PolicyEngine> {
        &self.engine
    }

    /// Evaluate a request and record the decision.
    pub fn decide<'a>(&self, request: &RequestInfo<'a>) -> Decision<'a> {
        let decision = self.engine.evaluate(request);

        let log = if decision.is_allowed() {
            self.log_allowed_requests
        } else {
            self.log_blocked_requests
        };
        if log && !self.sinks.is_empty() {
            let entry = AuditEntry::from_decision(&decision);
            for sink in &self.sinks {
                sink.record(&entry);
            }
        }

        decision
    }

    /// Returns the response to send instead of forwarding, or None to forward.
    pub fn on_request(&self, request: &RequestInfo<'_>) -> Option<RejectionResponse> {
        self.decide(request)
            .rejection()
            .map(|rejection| rejection_response(&rejection))
    }
}
