//! Buffer directory sizing for eviction checks.

use std::path::Path;
use walkdir::WalkDir;

/// Cumulative size in bytes of all files under `dir`. Unreadable entries are
/// skipped; a missing directory counts as empty.
pub fn dir_size_bytes(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}

/// Directory size in decimal megabytes, matching the threshold unit of the
/// pre/post size flags (bytes * 1e-6, not MiB).
pub fn dir_megabytes(dir: &Path) -> f64 {
    dir_size_bytes(dir) as f64 * 1e-6
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn sums_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a"), vec![0u8; 100]).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b"), vec![0u8; 50]).unwrap();
        assert_eq!(dir_size_bytes(dir.path()), 150);
    }

    #[test]
    fn missing_dir_is_empty() {
        assert_eq!(dir_size_bytes(Path::new("/nonexistent/cruncher-size-test")), 0);
    }

    #[test]
    fn megabytes_are_decimal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a"), vec![0u8; 500_000]).unwrap();
        let mb = dir_megabytes(dir.path());
        assert!((mb - 0.5).abs() < 1e-9);
    }
}
