//! Local picture buffer backed by a folder on disk
//!
//! The camera may write into nested, time-bucketed subfolders, so listing is
//! a deep scan. Results are sorted by path to give every pass the same order.

use std::{
    future::Future,
    path::{Path, PathBuf},
    pin::Pin,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use camvault_core::ports::{BufferedPicture, IPictureBuffer};
use tracing::{debug, warn};

/// Folder the camera writes captured pictures into
#[derive(Debug, Clone)]
pub struct LocalPictureBuffer {
    root: PathBuf,
}

impl LocalPictureBuffer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn walk_directory<'a>(
        &'a self,
        dir: &'a Path,
        pictures: &'a mut Vec<BufferedPicture>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut entries = tokio::fs::read_dir(dir)
                .await
                .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let metadata = match entry.metadata().await {
                    Ok(m) => m,
                    Err(err) => {
                        // Removed between read_dir and stat
                        warn!(path = %path.display(), %err, "Skipping unreadable entry");
                        continue;
                    }
                };

                if metadata.is_dir() {
                    self.walk_directory(&path, pictures).await?;
                } else if metadata.is_file() {
                    pictures.push(BufferedPicture {
                        path,
                        size: metadata.len(),
                    });
                }
            }
            Ok(())
        })
    }
}

#[async_trait]
impl IPictureBuffer for LocalPictureBuffer {
    async fn list(&self) -> Result<Vec<BufferedPicture>> {
        if !tokio::fs::try_exists(&self.root).await.unwrap_or(false) {
            debug!(root = %self.root.display(), "Picture buffer does not exist yet");
            return Ok(Vec::new());
        }

        let mut pictures = Vec::new();
        self.walk_directory(&self.root, &mut pictures).await?;
        pictures.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(count = pictures.len(), "Enumerated picture buffer");
        Ok(pictures)
    }

    async fn read(&self, picture: &BufferedPicture) -> Result<Vec<u8>> {
        tokio::fs::read(&picture.path)
            .await
            .with_context(|| format!("Failed to read {}", picture.path.display()))
    }

    async fn remove(&self, picture: &BufferedPicture) -> Result<()> {
        tokio::fs::remove_file(&picture.path)
            .await
            .with_context(|| format!("Failed to delete {}", picture.path.display()))
    }
}
