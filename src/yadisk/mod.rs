//! Yandex Disk REST client.
//!
//! One client serves both sides of the mirror: the public-folder API
//! (no auth) for discovery and downloads, and the private Disk API
//! (OAuth) for folder creation and uploads. Downloads and uploads go
//! through an href indirection — the metadata endpoint returns the
//! actual transfer URL.

pub mod responses;

use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Body, Client, Response, StatusCode};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::discover::{ChildEntry, DiscoverError, StructureProvider};
use crate::pipeline::{BlobTransport, TransferError};

use responses::{ApiError, HrefResponse, PublicResource};

const API_BASE: &str = "https://cloud-api.yandex.net/v1/disk";
const LIST_PAGE_SIZE: u64 = 200;
const HTTP_TIMEOUT: Duration = Duration::from_secs(30 * 60);

pub struct DiskClient {
    http: Client,
    base_url: String,
    /// The shared link of the source folder.
    public_key: String,
    /// OAuth token for the destination Disk; absent in list-only mode.
    token: Option<String>,
}

impl DiskClient {
    pub fn new(public_key: &str, token: Option<&str>) -> anyhow::Result<Self> {
        // Generous timeout: single-request transfers of multi-GB videos.
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: API_BASE.to_string(),
            public_key: public_key.to_string(),
            token: token.map(str::to_string),
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn auth_header(&self) -> Result<String, TransferError> {
        match &self.token {
            Some(token) => Ok(format!("OAuth {token}")),
            None => Err(TransferError::Api(
                "no OAuth token configured for the destination Disk".into(),
            )),
        }
    }

    /// Resolve the transfer URL for downloading one public file.
    async fn download_href(&self, path: &str) -> Result<String, TransferError> {
        let url = format!("{}/public/resources/download", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("public_key", self.public_key.as_str()), ("path", path)])
            .send()
            .await
            .map_err(|source| TransferError::Http {
                context: format!("download link for {path}"),
                source,
            })?;
        let response = check_status(response, &format!("download link for {path}")).await?;
        let href: HrefResponse = response.json().await.map_err(|source| TransferError::Http {
            context: format!("download link for {path}"),
            source,
        })?;
        Ok(href.href)
    }

    /// Resolve the transfer URL for uploading to one private path.
    async fn upload_href(&self, dest: &str) -> Result<String, TransferError> {
        let url = format!("{}/resources/upload", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header()?)
            .query(&[("path", dest), ("overwrite", "true")])
            .send()
            .await
            .map_err(|source| TransferError::Http {
                context: format!("upload link for {dest}"),
                source,
            })?;
        let response = check_status(response, &format!("upload link for {dest}")).await?;
        let href: HrefResponse = response.json().await.map_err(|source| TransferError::Http {
            context: format!("upload link for {dest}"),
            source,
        })?;
        Ok(href.href)
    }
}

/// Reject non-2xx responses, pulling the API's message into the error.
async fn check_status(response: Response, context: &str) -> Result<Response, TransferError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body: ApiError = response.json().await.unwrap_or(ApiError {
        message: String::new(),
        error: String::new(),
    });
    if body.message.is_empty() {
        Err(TransferError::HttpStatus {
            status: status.as_u16(),
            context: context.to_string(),
        })
    } else {
        Err(TransferError::Api(format!(
            "{context}: {} [{}] ({})",
            body.message,
            body.error,
            status.as_u16()
        )))
    }
}

#[async_trait]
impl StructureProvider for DiskClient {
    async fn list_children(&self, folder_locator: &str) -> Result<Vec<ChildEntry>, DiscoverError> {
        let fail = |source: anyhow::Error| DiscoverError::DiscoveryFailed {
            path: folder_locator.to_string(),
            source,
        };

        let url = format!("{}/public/resources", self.base_url);
        let limit = LIST_PAGE_SIZE.to_string();
        let mut children = Vec::new();
        let mut offset: u64 = 0;
        loop {
            let offset_param = offset.to_string();
            let response = self
                .http
                .get(&url)
                .query(&[
                    ("public_key", self.public_key.as_str()),
                    ("path", folder_locator),
                    ("limit", limit.as_str()),
                    ("offset", offset_param.as_str()),
                ])
                .send()
                .await
                .map_err(|e| fail(anyhow::Error::new(e).context("listing request failed")))?;

            let status = response.status();
            if !status.is_success() {
                return Err(fail(anyhow::anyhow!("listing returned HTTP {status}")));
            }
            let resource: PublicResource = response
                .json()
                .await
                .map_err(|e| fail(anyhow::Error::new(e).context("malformed listing response")))?;

            let Some(listing) = resource.embedded else {
                return Err(fail(anyhow::anyhow!(
                    "resource is not a folder (type {:?})",
                    resource.kind
                )));
            };
            let page_len = listing.items.len() as u64;
            for item in listing.items {
                children.push(ChildEntry {
                    is_folder: item.is_folder(),
                    locator: item.path,
                    name: item.name,
                    size: item.size,
                });
            }

            offset = listing.offset + page_len;
            if page_len == 0 || offset >= listing.total {
                break;
            }
        }
        Ok(children)
    }
}

#[async_trait]
impl BlobTransport for DiskClient {
    async fn fetch(&self, locator: &str, dest: &Path) -> Result<(), TransferError> {
        let href = self.download_href(locator).await?;
        let response = self
            .http
            .get(&href)
            .send()
            .await
            .map_err(|source| TransferError::Http {
                context: format!("download of {locator}"),
                source,
            })?;
        let response = check_status(response, &format!("download of {locator}")).await?;

        // Stream into a .part sibling, renamed into place when complete,
        // so an interrupted download never looks like a finished one.
        let part = dest.with_extension("part");
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&part)
            .await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| TransferError::Http {
                context: format!("download of {locator}"),
                source,
            })?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&part, dest).await?;
        Ok(())
    }

    async fn store(&self, local: &Path, dest: &str) -> Result<(), TransferError> {
        let href = self.upload_href(dest).await?;
        let file = tokio::fs::File::open(local).await?;
        let len = file.metadata().await?.len();
        let body = Body::wrap_stream(ReaderStream::new(file));
        let response = self
            .http
            .put(&href)
            .header(reqwest::header::CONTENT_LENGTH, len)
            .body(body)
            .send()
            .await
            .map_err(|source| TransferError::Http {
                context: format!("upload of {dest}"),
                source,
            })?;
        check_status(response, &format!("upload of {dest}")).await?;
        Ok(())
    }

    async fn ensure_folder(&self, dest: &str) -> Result<(), TransferError> {
        let url = format!("{}/resources", self.base_url);
        let response = self
            .http
            .put(&url)
            .header("Authorization", self.auth_header()?)
            .query(&[("path", dest)])
            .send()
            .await
            .map_err(|source| TransferError::Http {
                context: format!("creating folder {dest}"),
                source,
            })?;
        // 201 created it, 409 means it already exists. Both are success.
        if response.status() == StatusCode::CONFLICT {
            return Ok(());
        }
        check_status(response, &format!("creating folder {dest}")).await?;
        Ok(())
    }
}
