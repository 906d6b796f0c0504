//! Directory-backed cache: one file per key, named exactly as the key.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::CacheError;

// Distinguishes in-flight writes of the same key.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// A cache rooted at a single directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Opens a cache in `dir`, creating the directory if needed.
    pub async fn create(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!(path = %dir.display(), "file cache ready");
        Ok(Self { dir })
    }

    /// The directory entries are stored in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reads the entry for `key`. A missing file is `Ok(None)`.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.entry_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces the entry for `key` with `value`.
    ///
    /// The bytes go to a temporary file in the same directory which is then
    /// renamed over the entry, so readers see either the old value or the
    /// new one and never a partial write.
    pub async fn put(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let path = self.entry_path(key)?;
        let tmp = self.dir.join(format!(
            ".{key}.{}.{}.tmp",
            std::process::id(),
            WRITE_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = tokio::fs::write(&tmp, value).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::debug!(key, size = value.len(), "cached record file");
        Ok(())
    }

    // Keys must be one plain path component so they cannot leave `dir`.
    fn entry_path(&self, key: &str) -> Result<PathBuf, CacheError> {
        let plain = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\', '\0']);
        if !plain {
            return Err(CacheError::InvalidKey {
                key: key.to_owned(),
            });
        }
        Ok(self.dir.join(key))
    }
}
