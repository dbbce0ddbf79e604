//! Slash-separated relative paths rooted at the traversal root.
//!
//! A [`RelativePath`] is an immutable sequence of non-empty segments.
//! Equality and hashing are segment-wise, so the same path always maps to
//! the same ledger entry regardless of how it was built.

use std::fmt;

use thiserror::Error;

/// Video file extensions considered media leaves, matched
/// case-insensitively against the final path segment.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mkv", "mov", "webm", "flv", "wmv", "m4v", "3gp", "ogv",
];

/// A malformed relative path: empty input, or an empty segment produced by
/// leading/trailing/doubled separators.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid relative path {raw:?}: {reason}")]
pub struct InvalidPath {
    pub raw: String,
    pub reason: &'static str,
}

/// An ordered sequence of path segments relative to the traversal root.
///
/// The root itself is the empty path. Construct via [`RelativePath::root`],
/// [`RelativePath::parse`], or [`RelativePath::join`]; immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelativePath {
    segments: Vec<String>,
}

impl RelativePath {
    /// The empty path (the traversal root).
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parse a slash-separated path. Fails on empty input and on empty
    /// segments (leading, trailing, or doubled slashes).
    pub fn parse(raw: &str) -> Result<Self, InvalidPath> {
        if raw.is_empty() {
            return Err(InvalidPath {
                raw: raw.to_string(),
                reason: "path is empty",
            });
        }
        let mut segments = Vec::new();
        for segment in raw.split('/') {
            if segment.is_empty() {
                return Err(InvalidPath {
                    raw: raw.to_string(),
                    reason: "empty path segment",
                });
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Append a child name, yielding a new path. The name must be a single
    /// non-empty segment without separators.
    pub fn join(&self, child: &str) -> Result<Self, InvalidPath> {
        if child.is_empty() {
            return Err(InvalidPath {
                raw: child.to_string(),
                reason: "empty path segment",
            });
        }
        if child.contains('/') {
            return Err(InvalidPath {
                raw: child.to_string(),
                reason: "segment contains separator",
            });
        }
        let mut segments = self.segments.clone();
        segments.push(child.to_string());
        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The final segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The path with the final segment removed; the root's parent is the root.
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    /// Whether `prefix` is an ancestor of (or equal to) this path,
    /// compared segment-wise. The root is a prefix of everything.
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    /// Case-insensitive extension match against an allow-list of extensions
    /// given without the leading dot.
    pub fn has_media_extension(&self, extensions: &[&str]) -> bool {
        let Some(name) = self.file_name() else {
            return false;
        };
        let lower = name.to_ascii_lowercase();
        extensions
            .iter()
            .any(|ext| match lower.strip_suffix(ext) {
                Some(stem) => stem.ends_with('.'),
                None => false,
            })
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}
