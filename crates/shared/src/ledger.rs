use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only list of post URLs that have been fully processed. Read once
/// at startup; appended only after publish and notify both succeed, so an
/// aborted run leaves the post eligible for reselection.
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A missing ledger file reads as an empty set.
    pub fn load(&self) -> Result<HashSet<String>> {
        if !self.path.exists() {
            return Ok(HashSet::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read ledger: {}", self.path.display()))?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    pub fn append(&self, url: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open ledger: {}", self.path.display()))?;
        writeln!(file, "{}", url).context("Failed to append to ledger")?;
        Ok(())
    }
}

/// Record a run's published chunk group for manual inspection. Never read
/// back by the pipeline.
pub fn append_audit(path: &Path, url: &str, parts: &[String]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open audit log: {}", path.display()))?;

    writeln!(
        file,
        "URL: {} at {}",
        url,
        Utc::now().format("%Y-%m-%d %H:%M:%S")
    )?;
    for part in parts {
        writeln!(file, "************")?;
        writeln!(file, "{}", part)?;
    }
    writeln!(file, "\n\n\n\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("ledger-test-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_missing_ledger_reads_as_empty() {
        let ledger = Ledger::new(temp_path("missing"));
        assert!(ledger.load().unwrap().is_empty());
    }

    #[test]
    fn test_append_then_load_round_trip() {
        let path = temp_path("round-trip");
        let _ = fs::remove_file(&path);

        let ledger = Ledger::new(&path);
        ledger.append("https://example.com/a").unwrap();
        ledger.append("https://example.com/b").unwrap();

        let used = ledger.load().unwrap();
        assert_eq!(used.len(), 2);
        assert!(used.contains("https://example.com/a"));
        assert!(used.contains("https://example.com/b"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_trims_and_skips_blank_lines() {
        let path = temp_path("blank-lines");
        fs::write(&path, "https://example.com/a \n\n  https://example.com/b\n").unwrap();

        let used = Ledger::new(&path).load().unwrap();
        assert_eq!(used.len(), 2);
        assert!(used.contains("https://example.com/a"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_audit_log_records_url_and_parts() {
        let path = temp_path("audit");
        let _ = fs::remove_file(&path);

        append_audit(
            &path,
            "https://example.com/p",
            &["one".to_string(), "two".to_string()],
        )
        .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("URL: https://example.com/p"));
        assert!(content.contains("************\none\n"));
        assert!(content.contains("************\ntwo\n"));

        let _ = fs::remove_file(&path);
    }
}
