//! `s3://bucket/key` locators.

use std::fmt;

use crate::error::{Error, Result};

const SCHEME: &str = "s3://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub bucket: String,
    pub key: String,
}

impl Locator {
    pub fn parse(input: &str) -> Result<Self> {
        let rest = input
            .strip_prefix(SCHEME)
            .ok_or_else(|| Error::InvalidLocator(input.to_string()))?;
        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(Error::InvalidLocator(input.to_string()));
        }
        Ok(Self { bucket: bucket.to_string(), key: key.to_string() })
    }

    /// Wildcard keys and keys ending in `/` address a set of objects.
    pub fn is_prefix(&self) -> bool {
        self.key.contains('*') || self.key.ends_with('/') || self.key.is_empty()
    }

    /// Listing prefix with trailing wildcards removed.
    pub fn prefix(&self) -> &str {
        self.key.trim_end_matches('*')
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}{}/{}", self.bucket, self.key)
    }
}

/// Human-readable size with one decimal, e.g. `1.5 KB`.
pub fn format_file_size(size_bytes: u64) -> String {
    if size_bytes == 0 {
        return "0 B".to_string();
    }
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = size_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bucket_and_key() {
        let loc = Locator::parse("s3://sales-bucket/2024/orders/*").expect("parse");
        assert_eq!(loc.bucket, "sales-bucket");
        assert_eq!(loc.key, "2024/orders/*");
        assert!(loc.is_prefix());
        assert_eq!(loc.prefix(), "2024/orders/");
        assert_eq!(loc.to_string(), "s3://sales-bucket/2024/orders/*");
    }

    #[test]
    fn single_object_is_not_a_prefix() {
        let loc = Locator::parse("s3://b/data/file.parquet").expect("parse");
        assert!(!loc.is_prefix());
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(matches!(Locator::parse("/local/path"), Err(Error::InvalidLocator(_))));
        assert!(matches!(Locator::parse("s3:///key"), Err(Error::InvalidLocator(_))));
    }

    #[test]
    fn formats_sizes() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512.0 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024), "5.0 GB");
    }
}
