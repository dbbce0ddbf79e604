//! Local staging paths for in-flight items.
//!
//! The staging file lives under the cache directory at a deterministic
//! path derived from the item's relative path, so an interrupted run
//! finds the same file again on resume. Segments are sanitized for
//! filesystem safety; destination paths on the remote side keep the
//! exact original names.

use std::path::{Path, PathBuf};

use crate::relpath::RelativePath;

/// Deterministic local staging path for an item.
pub fn staging_path(cache_dir: &Path, relative_path: &RelativePath) -> PathBuf {
    let mut path = cache_dir.to_path_buf();
    for segment in relative_path.segments() {
        path.push(sanitize_segment(segment));
    }
    path
}

/// Replace characters invalid on common filesystems, preserving Unicode.
///
/// Mirrors the behavior the sync has always had: `<>:"|?*\` become
/// underscores, runs of underscores collapse, leading/trailing dots,
/// spaces, and underscores are trimmed.
pub fn sanitize_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut last_was_underscore = false;
    for c in segment.chars() {
        let mapped = match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\\' | '/' => '_',
            '\n' | '\r' => ' ',
            other => other,
        };
        if mapped == '_' {
            if !last_was_underscore {
                out.push('_');
            }
            last_was_underscore = true;
        } else {
            out.push(mapped);
            last_was_underscore = false;
        }
    }
    let trimmed = out.trim_matches(|c| c == '.' || c == ' ' || c == '_');
    if trimmed.is_empty() {
        // Fully-invalid names still need a stable stand-in.
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_invalid_chars() {
        assert_eq!(sanitize_segment("a<b>c.mp4"), "a_b_c.mp4");
        assert_eq!(sanitize_segment("what?.mp4"), "what_.mp4");
    }

    #[test]
    fn test_sanitize_collapses_underscores() {
        assert_eq!(sanitize_segment("a<>:b.mp4"), "a_b.mp4");
    }

    #[test]
    fn test_sanitize_trims_edges() {
        assert_eq!(sanitize_segment(" .name. "), "name");
        assert_eq!(sanitize_segment("_under_"), "under");
    }

    #[test]
    fn test_sanitize_preserves_unicode() {
        assert_eq!(sanitize_segment("Занятие 1.mp4"), "Занятие 1.mp4");
    }

    #[test]
    fn test_sanitize_all_invalid_yields_placeholder() {
        assert_eq!(sanitize_segment("***"), "_");
    }

    #[test]
    fn test_staging_path_joins_sanitized_segments() {
        let rel = RelativePath::parse("Folder: A/video?.mp4").unwrap();
        let path = staging_path(Path::new("/cache"), &rel);
        assert_eq!(path, PathBuf::from("/cache/Folder_ A/video_.mp4"));
    }

    #[test]
    fn test_staging_path_is_deterministic() {
        let rel = RelativePath::parse("A/B/v.mp4").unwrap();
        let a = staging_path(Path::new("/cache"), &rel);
        let b = staging_path(Path::new("/cache"), &rel);
        assert_eq!(a, b);
    }
}
