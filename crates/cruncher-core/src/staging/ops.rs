//! Command tokens for staging copy/delete/move sub-commands.
//!
//! Staging actions run as external commands through the same `Execution`
//! wrapper as conversion jobs, so every buffer operation shows up in the
//! run log with captured output and a timestamp.

use std::path::Path;

#[cfg(unix)]
pub fn copy_tokens(src: &Path, dst: &Path) -> Vec<String> {
    vec!["cp".into(), arg(src), arg(dst)]
}

#[cfg(unix)]
pub fn delete_tokens(path: &Path) -> Vec<String> {
    vec!["rm".into(), "-f".into(), arg(path)]
}

#[cfg(unix)]
pub fn move_tokens(src: &Path, dst: &Path) -> Vec<String> {
    vec!["mv".into(), arg(src), arg(dst)]
}

#[cfg(windows)]
pub fn copy_tokens(src: &Path, dst: &Path) -> Vec<String> {
    vec!["cmd".into(), "/C".into(), "copy".into(), "/Y".into(), arg(src), arg(dst)]
}

#[cfg(windows)]
pub fn delete_tokens(path: &Path) -> Vec<String> {
    vec!["cmd".into(), "/C".into(), "del".into(), "/Q".into(), arg(path)]
}

#[cfg(windows)]
pub fn move_tokens(src: &Path, dst: &Path) -> Vec<String> {
    vec!["cmd".into(), "/C".into(), "move".into(), "/Y".into(), arg(src), arg(dst)]
}

fn arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn unix_tokens() {
        assert_eq!(
            copy_tokens(Path::new("/a"), Path::new("/b")),
            vec!["cp", "/a", "/b"]
        );
        assert_eq!(delete_tokens(Path::new("/a")), vec!["rm", "-f", "/a"]);
        assert_eq!(
            move_tokens(Path::new("/a"), Path::new("/b")),
            vec!["mv", "/a", "/b"]
        );
    }
}
