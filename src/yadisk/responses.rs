//! Serde models for the Yandex Disk REST API.
//!
//! Only the fields the mirror reads are declared; everything else in the
//! responses is ignored.

use serde::Deserialize;

/// A resource returned by `GET /public/resources`. For folders the
/// listing of direct children arrives in `_embedded`.
#[derive(Debug, Deserialize)]
pub struct PublicResource {
    #[serde(rename = "_embedded")]
    pub embedded: Option<ResourceList>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// One page of a folder listing.
#[derive(Debug, Deserialize)]
pub struct ResourceList {
    #[serde(default)]
    pub items: Vec<ResourceItem>,
    pub total: u64,
    pub offset: u64,
}

/// One child of a public folder.
#[derive(Debug, Deserialize)]
pub struct ResourceItem {
    pub name: String,
    /// Path of the item inside the public resource, e.g. `/Folder1/v2.mp4`.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: Option<u64>,
}

impl ResourceItem {
    pub fn is_folder(&self) -> bool {
        self.kind == "dir"
    }
}

/// An operation handle: the actual transfer goes to `href`.
#[derive(Debug, Deserialize)]
pub struct HrefResponse {
    pub href: String,
}

/// Error body the API returns alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error: String,
}
