//! Directory mode: build a job list from a source tree.
//!
//! Walks the source directory, selects TIFF inputs, and emits one convert
//! command per file. The destination mirrors the file's relative path under
//! the destination directory with a `.jpg` extension.

use anyhow::{Context, Result};
use std::path::Path;
use walkdir::WalkDir;

use super::{JobIo, JobSpec};

/// Extensions treated as conversion inputs (case-insensitive).
const TIFF_EXTENSIONS: [&str; 2] = ["tif", "tiff"];

/// Scan `source` for TIFF files and build convert specs targeting `dest`.
/// Specs are sorted by input path so submission order is deterministic.
pub fn scan_source_tree(source: &Path, dest: &Path, staging_tool: &str) -> Result<Vec<JobSpec>> {
    let mut specs = Vec::new();
    for entry in WalkDir::new(source) {
        let entry =
            entry.with_context(|| format!("failed to walk source tree {}", source.display()))?;
        if !entry.file_type().is_file() || !is_tiff(entry.path()) {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("path {} escapes source tree", entry.path().display()))?;
        let output = dest.join(rel).with_extension("jpg");
        specs.push(convert_spec(staging_tool, entry.path(), &output));
    }
    specs.sort_by(|a, b| a.tokens.cmp(&b.tokens));
    tracing::debug!(count = specs.len(), source = %source.display(), "scanned source tree");
    Ok(specs)
}

fn is_tiff(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TIFF_EXTENSIONS.iter().any(|t| e.eq_ignore_ascii_case(t)))
        .unwrap_or(false)
}

/// Token layout must keep input/output at the fixed positions the job-list
/// parser documents (`parse::INPUT_TOKEN` / `parse::OUTPUT_TOKEN`).
fn convert_spec(tool: &str, input: &Path, output: &Path) -> JobSpec {
    let tokens = vec![
        tool.to_string(),
        "convert".to_string(),
        input.to_string_lossy().into_owned(),
        "-compress".to_string(),
        "jpeg".to_string(),
        "-quality".to_string(),
        "90".to_string(),
        output.to_string_lossy().into_owned(),
    ];
    JobSpec {
        tokens,
        io: Some(JobIo {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobspec::parse::{INPUT_TOKEN, OUTPUT_TOKEN};
    use std::fs;

    #[test]
    fn scan_selects_tiffs_and_mirrors_layout() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("sub")).unwrap();
        fs::write(src.path().join("a.tif"), b"x").unwrap();
        fs::write(src.path().join("sub/b.TIFF"), b"x").unwrap();
        fs::write(src.path().join("notes.txt"), b"x").unwrap();

        let specs = scan_source_tree(src.path(), dest.path(), "magick").unwrap();
        assert_eq!(specs.len(), 2);
        let io = specs[0].io.as_ref().unwrap();
        assert_eq!(io.input, src.path().join("a.tif"));
        assert_eq!(io.output, dest.path().join("a.jpg"));
        let io = specs[1].io.as_ref().unwrap();
        assert_eq!(io.output, dest.path().join("sub/b.jpg"));
    }

    #[test]
    fn convert_spec_matches_parser_grammar() {
        let spec = convert_spec("magick", Path::new("/s/a.tif"), Path::new("/o/a.jpg"));
        assert_eq!(spec.tokens[INPUT_TOKEN], "/s/a.tif");
        assert_eq!(spec.tokens[OUTPUT_TOKEN], "/o/a.jpg");
    }

    #[test]
    fn scan_empty_tree_is_empty() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let specs = scan_source_tree(src.path(), dest.path(), "magick").unwrap();
        assert!(specs.is_empty());
    }
}
