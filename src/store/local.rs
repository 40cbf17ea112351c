use super::{ObjectPage, ObjectPager, ObjectSummary, StoreError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// A bucket backed by a flat directory.
///
/// Object keys are file names inside `root`. Listing is ordered by key and
/// the continuation token is the last key of the previous page.
#[derive(Debug, Clone)]
pub struct LocalBucket {
    name: String,
    root: PathBuf,
    page_size: usize,
}

impl LocalBucket {
    pub async fn open(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        page_size: usize,
    ) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self {
            name: name.into(),
            root,
            page_size: page_size.max(1),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty()
            || key == "."
            || key == ".."
            || key.contains('/')
            || key.contains('\\')
        {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }

    /// Opens `key` for writing, truncating any previous object.
    pub async fn create(&self, key: &str) -> Result<fs::File, StoreError> {
        let path = self.object_path(key)?;
        fs::File::create(&path)
            .await
            .map_err(|source| StoreError::Io { path, source })
    }

    pub async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.object_path(key)?;
        let mut file = self.create(key).await?;
        file.write_all(bytes).await.map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        file.flush()
            .await
            .map_err(|source| StoreError::Io { path, source })
    }

    /// Removes `key`; a missing object is not an error.
    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.object_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    async fn read_objects(&self) -> Result<Vec<ObjectSummary>, StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.root.clone(),
            source,
        };

        let mut entries = fs::read_dir(&self.root).await.map_err(io_err)?;
        let mut objects = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let metadata = entry.metadata().await.map_err(io_err)?;
            if !metadata.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(key) => objects.push(ObjectSummary {
                    key,
                    size: metadata.len(),
                }),
                Err(name) => warn!(?name, "skipping object with non UTF-8 key"),
            }
        }
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}

#[async_trait]
impl ObjectPager for LocalBucket {
    fn bucket(&self) -> &str {
        &self.name
    }

    async fn list_page(&self, continuation_token: Option<String>) -> Result<ObjectPage, StoreError> {
        let objects = self.read_objects().await?;
        let mut remaining: Vec<ObjectSummary> = match continuation_token.as_deref() {
            Some(token) => objects.into_iter().filter(|o| o.key.as_str() > token).collect(),
            None => objects,
        };

        let is_truncated = remaining.len() > self.page_size;
        remaining.truncate(self.page_size);
        let next_continuation_token = if is_truncated {
            remaining.last().map(|o| o.key.clone())
        } else {
            None
        };

        debug!(
            bucket = %self.name,
            objects = remaining.len(),
            is_truncated,
            "read local bucket page"
        );

        Ok(ObjectPage {
            contents: remaining,
            is_truncated,
            next_continuation_token,
        })
    }
}
