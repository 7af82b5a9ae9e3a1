//! Audit records for request decisions and the sinks that write them.

use serde::Serialize;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use crate::config::AuditFormat;
use crate::policy::{Decision, Verdict};

/// Event type for an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    RequestAllowed,
    RequestBlocked,
}

/// Decision outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditDecision {
    Allowed,
    Blocked,
}

/// Reason for the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditReason {
    DomainAllowed,
    DomainNotAllowed,
    GmailWriteBlocked,
}

/// A single audit log entry.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub timestamp: String,
    pub event: AuditEvent,
    pub method: String,
    pub url: String,
    pub host: String,
    pub decision: AuditDecision,
    pub reason: AuditReason,
}

impl AuditEntry {
    /// Build the entry for a decision, stamped with the current time.
    pub fn from_decision(decision: &Decision<'_>) -> Self {
        let (event, audit_decision, reason) = match decision.verdict {
            Verdict::Allow => (
                AuditEvent::RequestAllowed,
                AuditDecision::Allowed,
                AuditReason::DomainAllowed,
            ),
            Verdict::BlockByDomain => (
                AuditEvent::RequestBlocked,
                AuditDecision::Blocked,
                AuditReason::DomainNotAllowed,
            ),
            Verdict::BlockByOperation => (
                AuditEvent::RequestBlocked,
                AuditDecision::Blocked,
                AuditReason::GmailWriteBlocked,
            ),
        };

        Self {
            timestamp: now_iso8601(),
            event,
            method: decision.request.method.to_string(),
            url: decision.request.full_url(),
            host: decision.request.host.to_string(),
            decision: audit_decision,
            reason,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.decision == AuditDecision::Blocked
    }

    /// The human-readable audit line, e.g. `BLOCKED GMAIL WRITE: POST https://...`
    pub fn summary(&self) -> String {
        let label = match self.reason {
            AuditReason::DomainAllowed => "ALLOWED",
            AuditReason::DomainNotAllowed => "BLOCKED",
            AuditReason::GmailWriteBlocked => "BLOCKED GMAIL WRITE",
        };
        format!("{}: {} {}", label, self.method, self.url)
    }
}

/// Returns the current UTC time as an ISO 8601 / RFC 3339 string.
pub fn now_iso8601() -> String {
    let now = time::OffsetDateTime::now_utc();
    now.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Destination for audit entries. Implementations must never fail the
/// request path: errors are reported through `tracing` and swallowed.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: &AuditEntry);
}

/// Emits each entry as a log line: info for allowed, warn for blocked.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn record(&self, entry: &AuditEntry) {
        if entry.is_blocked() {
            tracing::warn!("{}", entry.summary());
        } else {
            tracing::info!("{}", entry.summary());
        }
    }
}

/// Audit logger that appends entries to a file.
///
/// Uses `std::fs::File` with a `std::sync::Mutex` since writes are small
/// and fast.
pub struct AuditLogger {
    writer: Mutex<std::io::BufWriter<std::fs::File>>,
    format: AuditFormat,
}

impl AuditLogger {
    /// Open (or create) the audit log file in append mode.
    pub fn open(path: impl AsRef<Path>, format: AuditFormat) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            writer: Mutex::new(std::io::BufWriter::new(file)),
            format,
        })
    }

    fn render(&self, entry: &AuditEntry) -> Option<String> {
        match self.format {
            AuditFormat::Text => Some(format!("{} - {}", entry.timestamp, entry.summary())),
            AuditFormat::Jsonl => match serde_json::to_string(entry) {
                Ok(j) => Some(j),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize audit entry");
                    None
                }
            },
        }
    }
}

impl AuditSink for AuditLogger {
    fn record(&self, entry: &AuditEntry) {
        use std::io::Write;
        let Some(line) = self.render(entry) else {
            return;
        };

        let mut writer = match self.writer.lock() {
            Ok(w) => w,
            Err(e) => {
                tracing::error!(error = %e, "Failed to lock audit log writer");
                return;
            }
        };
        if let Err(e) = writeln!(writer, "{}", line) {
            tracing::error!(error = %e, "Failed to write audit entry");
            return;
        }
        if let Err(e) = writer.flush() {
            tracing::error!(error = %e, "Failed to flush audit log");
        }
    }
}

/// Keeps the most recent entries in memory.
pub struct MemorySink {
    buffer: Mutex<VecDeque<AuditEntry>>,
    capacity: usize,
}

impl MemorySink {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        match self.buffer.lock() {
            Ok(buffer) => buffer.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl AuditSink for MemorySink {
    fn record(&self, entry: &AuditEntry) {
        let Ok(mut buffer) = self.buffer.lock() else {
            tracing::error!("Failed to lock in-memory audit buffer");
            return;
        };
        if self.capacity == 0 {
            return;
        }
        if buffer.len() >= self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(entry.clone());
    }
}
