//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temp directory holding an allow-list CSV and, optionally, a config file.
pub struct Fixture {
    pub dir: TempDir,
    pub domains_path: PathBuf,
}

impl Fixture {
    pub fn new(domains: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let domains_path = dir.path().join("allowed_domains.csv");
        let fixture = Self { dir, domains_path };
        fixture.write_domains(domains);
        fixture
    }

    /// Replace the domains file atomically (write to a temp file, then rename).
    pub fn write_domains(&self, domains: &[&str]) {
        write_atomically(&self.domains_path, &domains_csv(domains));
    }

    /// Write a config file pointing at this fixture's domains file.
    pub fn write_config(&self, extra: &str) -> PathBuf {
        let path = self.dir.path().join("openclaw.toml");
        let content = format!(
            "[allowlist]\ndomains_file = {:?}\nwatch = false\n\n{}",
            self.domains_path.display().to_string(),
            extra
        );
        std::fs::write(&path, content).unwrap();
        path
    }
}

pub fn domains_csv(domains: &[&str]) -> String {
    let mut csv = String::from("domain\n");
    for d in domains {
        csv.push_str(d);
        csv.push('\n');
    }
    csv
}

pub fn write_atomically(path: &Path, content: &str) {
    let tmp = path.with_extension("csv.tmp");
    std::fs::write(&tmp, content).unwrap();
    std::fs::rename(&tmp, path).unwrap();
}
