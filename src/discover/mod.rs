//! Remote tree discovery — linearizes a nested public folder into an
//! ordered, path-qualified work list.
//!
//! The walk is depth-first pre-order: at each folder the Structure
//! Provider's reported child order is authoritative, folders are recursed
//! into in place, and only media leaves are emitted. The resulting
//! `discovery_order` is the canonical processing order for the whole run;
//! the ledger, not re-discovery, is what makes a later run resumable.

pub mod error;

use std::collections::HashSet;

use async_trait::async_trait;

pub use error::DiscoverError;

use crate::relpath::{RelativePath, VIDEO_EXTENSIONS};

/// Maximum folder nesting accepted before discovery aborts with
/// [`DiscoverError::StructureTooDeep`].
pub const MAX_DEPTH: usize = 64;

/// One direct child of a remote folder, as reported by the provider.
#[derive(Debug, Clone)]
pub struct ChildEntry {
    pub name: String,
    pub is_folder: bool,
    /// Opaque handle the provider/transport can resolve later.
    pub locator: String,
    /// Byte size for files, when the provider reports one.
    pub size: Option<u64>,
}

/// A discovered media leaf, immutable once emitted.
#[derive(Debug, Clone)]
pub struct SourceItem {
    pub relative_path: RelativePath,
    pub remote_locator: String,
    pub size_hint: Option<u64>,
    /// Monotonic position in the linearized tree; the canonical total
    /// order over items for the run.
    pub discovery_order: u64,
}

impl SourceItem {
    /// The item's final path segment.
    pub fn name(&self) -> &str {
        // A leaf always has at least one segment.
        self.relative_path.file_name().unwrap_or_default()
    }
}

/// Capability for enumerating a remote folder's direct children.
///
/// The order returned is the authoritative display order at that folder
/// level and is preserved by [`linearize`].
#[async_trait]
pub trait StructureProvider: Send + Sync {
    async fn list_children(&self, folder_locator: &str) -> Result<Vec<ChildEntry>, DiscoverError>;
}

/// Walk the tree rooted at `root_locator` and return all media leaves in
/// depth-first pre-order.
///
/// Call once per run: resumability comes from the ledger, not from
/// re-linearization. Any listing failure aborts the whole walk — a
/// partial tree is never returned.
pub async fn linearize(
    provider: &dyn StructureProvider,
    root_locator: &str,
) -> Result<Vec<SourceItem>, DiscoverError> {
    struct Node {
        path: RelativePath,
        locator: String,
        is_folder: bool,
        size: Option<u64>,
        depth: usize,
    }

    let mut items: Vec<SourceItem> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut stack = vec![Node {
        path: RelativePath::root(),
        locator: root_locator.to_string(),
        is_folder: true,
        size: None,
        depth: 0,
    }];

    while let Some(node) = stack.pop() {
        if node.is_folder {
            if node.depth >= MAX_DEPTH {
                return Err(DiscoverError::StructureTooDeep {
                    path: node.path.to_string(),
                    max: MAX_DEPTH,
                });
            }
            let children = provider.list_children(&node.locator).await?;
            // Reversed so the stack pops children in reported order.
            for child in children.into_iter().rev() {
                let path = node.path.join(&child.name)?;
                stack.push(Node {
                    path,
                    locator: child.locator,
                    is_folder: child.is_folder,
                    size: child.size,
                    depth: node.depth + 1,
                });
            }
        } else {
            if !node.path.has_media_extension(VIDEO_EXTENSIONS) {
                tracing::trace!(path = %node.path, "skipping non-media leaf");
                continue;
            }
            if !seen.insert(node.path.to_string()) {
                tracing::warn!(path = %node.path, "duplicate leaf reported, keeping first");
                continue;
            }
            items.push(SourceItem {
                discovery_order: items.len() as u64,
                relative_path: node.path,
                remote_locator: node.locator,
                size_hint: node.size,
            });
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory provider: maps a folder locator to its children.
    struct FakeProvider {
        folders: HashMap<String, Vec<ChildEntry>>,
        fail_on: Option<String>,
    }

    impl FakeProvider {
        fn new() -> Self {
            Self {
                folders: HashMap::new(),
                fail_on: None,
            }
        }

        fn folder(mut self, locator: &str, children: Vec<ChildEntry>) -> Self {
            self.folders.insert(locator.to_string(), children);
            self
        }
    }

    fn file(name: &str) -> ChildEntry {
        ChildEntry {
            name: name.to_string(),
            is_folder: false,
            locator: format!("loc:{name}"),
            size: Some(1024),
        }
    }

    fn dir(name: &str, locator: &str) -> ChildEntry {
        ChildEntry {
            name: name.to_string(),
            is_folder: true,
            locator: locator.to_string(),
            size: None,
        }
    }

    #[async_trait]
    impl StructureProvider for FakeProvider {
        async fn list_children(
            &self,
            folder_locator: &str,
        ) -> Result<Vec<ChildEntry>, DiscoverError> {
            if self.fail_on.as_deref() == Some(folder_locator) {
                return Err(DiscoverError::DiscoveryFailed {
                    path: folder_locator.to_string(),
                    source: anyhow::anyhow!("listing refused"),
                });
            }
            self.folders
                .get(folder_locator)
                .cloned()
                .ok_or_else(|| DiscoverError::DiscoveryFailed {
                    path: folder_locator.to_string(),
                    source: anyhow::anyhow!("unknown folder"),
                })
        }
    }

    fn paths(items: &[SourceItem]) -> Vec<String> {
        items.iter().map(|i| i.relative_path.to_string()).collect()
    }

    #[tokio::test]
    async fn test_linearize_preorder_with_filtering() {
        // root/{v1.mp4, Folder1/{v2.mp4, Subfolder/{v3.mp4, notes.txt}}}
        let provider = FakeProvider::new()
            .folder("root", vec![file("v1.mp4"), dir("Folder1", "f1")])
            .folder("f1", vec![file("v2.mp4"), dir("Subfolder", "sub")])
            .folder("sub", vec![file("v3.mp4"), file("notes.txt")]);

        let items = linearize(&provider, "root").await.unwrap();
        assert_eq!(
            paths(&items),
            ["v1.mp4", "Folder1/v2.mp4", "Folder1/Subfolder/v3.mp4"]
        );
        let orders: Vec<u64> = items.iter().map(|i| i.discovery_order).collect();
        assert_eq!(orders, [0, 1, 2]);
    }

    #[tokio::test]
    async fn test_linearize_recurses_before_later_siblings() {
        // Pre-order: a folder's entire subtree precedes its later siblings.
        let provider = FakeProvider::new()
            .folder("root", vec![dir("A", "a"), file("last.mp4")])
            .folder("a", vec![file("first.mp4"), file("second.mp4")]);

        let items = linearize(&provider, "root").await.unwrap();
        assert_eq!(paths(&items), ["A/first.mp4", "A/second.mp4", "last.mp4"]);
    }

    #[tokio::test]
    async fn test_linearize_empty_tree() {
        let provider = FakeProvider::new()
            .folder("root", vec![dir("Docs", "docs")])
            .folder("docs", vec![file("readme.pdf")]);
        let items = linearize(&provider, "root").await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_linearize_non_media_does_not_block_siblings() {
        let provider = FakeProvider::new()
            .folder(
                "root",
                vec![file("skip.txt"), dir("Videos", "v"), file("end.mp4")],
            )
            .folder("v", vec![file("a.mkv")]);
        let items = linearize(&provider, "root").await.unwrap();
        assert_eq!(paths(&items), ["Videos/a.mkv", "end.mp4"]);
    }

    #[tokio::test]
    async fn test_linearize_listing_failure_aborts() {
        let mut provider = FakeProvider::new()
            .folder("root", vec![file("ok.mp4"), dir("Broken", "broken")]);
        provider.fail_on = Some("broken".to_string());

        let err = linearize(&provider, "root").await.unwrap_err();
        assert!(matches!(err, DiscoverError::DiscoveryFailed { .. }));
    }

    #[tokio::test]
    async fn test_linearize_depth_guard() {
        // A chain of folders one deeper than the cap.
        let mut provider = FakeProvider::new();
        for depth in 0..=MAX_DEPTH {
            let locator = format!("d{depth}");
            let child = format!("d{}", depth + 1);
            provider
                .folders
                .insert(locator, vec![dir("deeper", &child)]);
        }
        let err = linearize(&provider, "d0").await.unwrap_err();
        assert!(matches!(err, DiscoverError::StructureTooDeep { .. }));
    }

    #[tokio::test]
    async fn test_linearize_skips_duplicate_leaves() {
        let provider = FakeProvider::new()
            .folder("root", vec![file("v.mp4"), file("v.mp4")]);
        let items = linearize(&provider, "root").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].discovery_order, 0);
    }

    #[tokio::test]
    async fn test_linearize_invalid_child_name() {
        let provider = FakeProvider::new().folder(
            "root",
            vec![ChildEntry {
                name: "bad/name.mp4".to_string(),
                is_folder: false,
                locator: "x".to_string(),
                size: None,
            }],
        );
        let err = linearize(&provider, "root").await.unwrap_err();
        assert!(matches!(err, DiscoverError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_source_item_carries_locator_and_size() {
        let provider = FakeProvider::new().folder("root", vec![file("v1.mp4")]);
        let items = linearize(&provider, "root").await.unwrap();
        assert_eq!(items[0].remote_locator, "loc:v1.mp4");
        assert_eq!(items[0].size_hint, Some(1024));
        assert_eq!(items[0].name(), "v1.mp4");
    }
}
