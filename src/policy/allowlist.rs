//! Domain allow-list with suffix-aware matching and atomic reload.

use arc_swap::ArcSwap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Column holding one domain per record in the allow-list source.
pub const DOMAIN_COLUMN: &str = "domain";

/// An immutable set of allowed root domains.
#[derive(Debug, Clone, Default)]
pub struct DomainSet {
    domains: HashSet<Box<str>>,
}

impl DomainSet {
    /// An empty set, which denies every host.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check whether `host` is one of the domains or a subdomain of one.
    ///
    /// Matching is case-sensitive and label-aligned: `example.com` allows
    /// `example.com` and `api.example.com` but not `notexample.com`.
    pub fn is_allowed(&self, host: &str) -> bool {
        if self.domains.is_empty() || host.is_empty() {
            return false;
        }

        // Every suffix that follows a '.' is a candidate parent domain
        let mut part = host;
        loop {
            if self.domains.contains(part) {
                return true;
            }
            match part.find('.') {
                Some(idx) => part = &part[idx + 1..],
                None => return false,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.domains.contains(domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(|d| d.as_ref())
    }
}

impl<S: Into<String>> FromIterator<S> for DomainSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let domains = iter
            .into_iter()
            .map(Into::into)
            .filter(|d| !d.is_empty())
            .map(String::into_boxed_str)
            .collect();
        Self { domains }
    }
}

/// Load the allow-list from a CSV file with a `domain` header column.
///
/// Records with a missing or empty `domain` field are skipped. A missing
/// file is not an error: it yields an empty set and a warning, so the proxy
/// still boots and denies all traffic.
pub fn load(source: impl AsRef<Path>) -> Result<DomainSet> {
    let source = source.as_ref();

    let file = match std::fs::File::open(source) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(
                path = %source.display(),
                "Domains file not found, using empty allow-list"
            );
            return Ok(DomainSet::empty());
        }
        Err(e) => return Err(Error::load(source, e.to_string())),
    };

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| Error::load(source, e.to_string()))?;
    let Some(column) = headers.iter().position(|h| h == DOMAIN_COLUMN) else {
        tracing::warn!(
            path = %source.display(),
            "Domains file has no `domain` column, using empty allow-list"
        );
        return Ok(DomainSet::empty());
    };

    let mut domains = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::load(source, e.to_string()))?;
        if let Some(domain) = record.get(column).filter(|d| !d.is_empty()) {
            domains.push(domain.to_string());
        }
    }

    let set: DomainSet = domains.into_iter().collect();
    tracing::info!(
        path = %source.display(),
        domains = set.len(),
        "Allow-list loaded"
    );
    Ok(set)
}

/// Shared, reloadable allow-list.
///
/// Lookups read the currently published [`DomainSet`]; a reload builds the
/// replacement fully before publishing it with a single pointer swap, so a
/// concurrent reader sees either the old set or the new one.
#[derive(Debug)]
pub struct AllowlistStore {
    source: Option<PathBuf>,
    active: ArcSwap<DomainSet>,
}

impl AllowlistStore {
    /// Open a store backed by a CSV source and perform the initial load.
    ///
    /// A source that cannot be read falls back to an empty (deny-all) set.
    pub fn open(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let initial = load_or_empty(&source);
        Self {
            source: Some(source),
            active: ArcSwap::from_pointee(initial),
        }
    }

    /// Create a store from domains held in memory. Reloading it is a no-op.
    pub fn in_memory<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source: None,
            active: ArcSwap::from_pointee(domains.into_iter().collect()),
        }
    }

    pub fn is_allowed(&self, host: &str) -> bool {
        self.active.load().is_allowed(host)
    }

    /// Re-read the source and publish the result. Returns the new domain count.
    pub fn reload(&self) -> usize {
        let Some(source) = &self.source else {
            tracing::debug!("Allow-list has no source, reload skipped");
            return self.len();
        };

        let next = load_or_empty(source);
        let count = next.len();
        self.replace(next);
        count
    }

    /// Publish a fully built set in place of the current one.
    pub fn replace(&self, set: DomainSet) {
        self.active.store(Arc::new(set));
    }

    /// The currently published set. Repeated lookups against the returned
    /// snapshot are unaffected by concurrent reloads.
    pub fn snapshot(&self) -> Arc<DomainSet> {
        self.active.load_full()
    }

    pub fn len(&self) -> usize {
        self.active.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.load().is_empty()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

fn load_or_empty(source: &Path) -> DomainSet {
    match load(source) {
        Ok(set) => set,
        Err(e) => {
            tracing::warn!(error = %e, "Allow-list load failed, denying all traffic");
            DomainSet::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::capture_logs;

    fn set(domains: &[&str]) -> DomainSet {
        domains.iter().copied().collect()
    }

    #[test]
    fn test_exact_and_subdomain_match() {
        let s = set(&["example.com"]);
        assert!(s.is_allowed("example.com"));
        assert!(s.is_allowed("api.example.com"));
        assert!(s.is_allowed("a.b.example.com"));
    }

    #[test]
    fn test_suffix_without_dot_boundary_rejected() {
        let s = set(&["example.com"]);
        assert!(!s.is_allowed("notexample.com"));
        assert!(!s.is_allowed("example.com.evil"));
        assert!(!s.is_allowed("com"));
    }

    #[test]
    fn test_case_sensitive() {
        let s = set(&["google.com"]);
        assert!(!s.is_allowed("Mail.Google.com"));
        assert!(s.is_allowed("Mail.google.com"));
    }

    #[test]
    fn test_empty_set_denies_all() {
        let s = DomainSet::empty();
        assert!(!s.is_allowed("example.com"));
        assert!(!s.is_allowed(""));
    }

    #[test]
    fn test_empty_host_never_allowed() {
        assert!(!set(&["example.com"]).is_allowed(""));
    }

    #[test]
    fn test_empty_domains_dropped() {
        let s = set(&["", "example.com", "example.com"]);
        assert_eq!(s.len(), 1);
        assert!(!s.contains(""));
    }

    #[test]
    fn test_load_csv_skips_blank_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("allowed_domains.csv");
        std::fs::write(&path, "domain,note\ngoogle.com,mail\n,empty\ngithub.com\n").unwrap();

        let s = load(&path).unwrap();
        assert_eq!(s.len(), 2);
        assert!(s.contains("google.com"));
        assert!(s.contains("github.com"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let s = load(dir.path().join("absent.csv")).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn test_load_missing_file_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        let logs = capture_logs(|| {
            assert!(load(&path).unwrap().is_empty());
        });

        let line = logs
            .line_containing("Domains file not found, using empty allow-list")
            .unwrap();
        assert!(line.contains("WARN"), "{line}");
        assert!(line.contains("absent.csv"), "{line}");
    }

    #[test]
    fn test_load_without_domain_column_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts.csv");
        std::fs::write(&path, "host\nexample.com\n").unwrap();
        assert!(load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_load_invalid_utf8_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, b"domain\n\xff\xfe.com\n").unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }

    #[test]
    fn test_store_reload_swaps_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("allowed_domains.csv");
        std::fs::write(&path, "domain\nold.example\n").unwrap();

        let store = AllowlistStore::open(&path);
        assert!(store.is_allowed("old.example"));

        std::fs::write(&path, "domain\nnew.example\nother.example\n").unwrap();
        assert_eq!(store.reload(), 2);
        assert!(!store.is_allowed("old.example"));
        assert!(store.is_allowed("api.new.example"));
    }

    #[test]
    fn test_store_reload_failure_denies_all() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("allowed_domains.csv");
        std::fs::write(&path, "domain\nexample.com\n").unwrap();

        let store = AllowlistStore::open(&path);
        assert_eq!(store.len(), 1);

        std::fs::write(&path, b"domain\n\xff\n").unwrap();
        assert_eq!(store.reload(), 0);
        assert!(!store.is_allowed("example.com"));
    }

    #[test]
    fn test_in_memory_reload_keeps_set() {
        let store = AllowlistStore::in_memory(["example.com"]);
        assert_eq!(store.reload(), 1);
        assert!(store.is_allowed("example.com"));
        assert!(store.source().is_none());
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let store = AllowlistStore::in_memory(["a.example"]);
        let snap = store.snapshot();
        store.replace(set(&["b.example"]));
        assert!(snap.is_allowed("a.example"));
        assert!(!store.is_allowed("a.example"));
        assert!(store.is_allowed("b.example"));
    }
}
