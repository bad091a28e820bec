//! Picture buffer port (driven/secondary port)
//!
//! The camera writes captured pictures into a local folder, possibly in
//! nested time-bucketed subfolders. The upload pipeline only needs to
//! enumerate, read and delete those files; naming and placement belong to
//! the camera.

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;

/// A captured picture waiting in the local buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedPicture {
    /// Absolute path of the file
    pub path: PathBuf,
    /// Size in bytes at enumeration time
    pub size: u64,
}

/// Local folder of captured pictures
#[async_trait]
pub trait IPictureBuffer: Send + Sync {
    /// Enumerates every file under the buffer, recursively, in a stable order
    async fn list(&self) -> Result<Vec<BufferedPicture>>;

    /// Reads a picture's content
    async fn read(&self, picture: &BufferedPicture) -> Result<Vec<u8>>;

    /// Deletes a picture from the buffer
    async fn remove(&self, picture: &BufferedPicture) -> Result<()>;
}
