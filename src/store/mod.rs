//! Object store listing.
//!
//! [`ObjectPager`] is the seam over a paginated listing API (S3's
//! `ListObjectsV2` shape). [`ObjectStoreLister`] walks every page and returns
//! one flat list.

mod local;

pub use local::LocalBucket;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Errors raised by an object store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure while reading or writing an object.
    #[error("object store I/O error at `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Object key that cannot be mapped to a single object.
    #[error("invalid object key `{0}`")]
    InvalidKey(String),

    /// Listing backend rejected the request.
    #[error("object listing failed: {0}")]
    Listing(String),
}

/// One object as reported by a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
}

/// A single page of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    pub contents: Vec<ObjectSummary>,
    /// More pages remain.
    pub is_truncated: bool,
    pub next_continuation_token: Option<String>,
}

/// A listed object in the shape the rosbag API returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub original_filename: String,
    pub size: u64,
    /// Name of the bucket holding the object.
    pub filepath: String,
}

/// Paginated listing over one bucket.
#[async_trait]
pub trait ObjectPager: Send + Sync {
    fn bucket(&self) -> &str;

    /// Fetches the page after `continuation_token`, or the first page when
    /// the token is `None`.
    async fn list_page(&self, continuation_token: Option<String>) -> Result<ObjectPage, StoreError>;
}

pub struct ObjectStoreLister<'a, P: ?Sized> {
    pager: &'a P,
}

impl<'a, P> ObjectStoreLister<'a, P>
where
    P: ObjectPager + ?Sized,
{
    pub fn new(pager: &'a P) -> Self {
        Self { pager }
    }

    /// Lists every object in the bucket, in page order.
    ///
    /// Pages are fetched one after another until the pager reports no
    /// truncation. The first page is always requested, so an empty bucket is
    /// one call. A failing page aborts the whole listing.
    pub async fn list_all(&self) -> Result<Vec<ObjectEntry>, StoreError> {
        let bucket = self.pager.bucket().to_string();
        let mut contents = Vec::new();
        let mut continuation_token = None;
        let mut pages = 0usize;

        loop {
            let page = self.pager.list_page(continuation_token.take()).await?;
            pages += 1;
            debug!(
                bucket = %bucket,
                page = pages,
                objects = page.contents.len(),
                truncated = page.is_truncated,
                "listed object page"
            );

            contents.extend(page.contents.into_iter().map(|object| ObjectEntry {
                original_filename: object.key,
                size: object.size,
                filepath: bucket.clone(),
            }));
            continuation_token = page.next_continuation_token;

            if !page.is_truncated {
                break;
            }
        }

        Ok(contents)
    }
}
