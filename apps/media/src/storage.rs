//! On-disk layout:
//!
//! ```text
//! {root}/uploads/{family}/{file_id}.{ext}
//! {root}/results/{job_id}.{ext}
//! ```

use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::ops::Family;

const MAX_EXTENSION_LEN: usize = 8;

#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub file_id: Uuid,
    pub filename: String,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn ensure_layout(&self) -> std::io::Result<()> {
        for family in Family::ALL {
            tokio::fs::create_dir_all(self.uploads_dir(family)).await?;
        }
        tokio::fs::create_dir_all(self.results_dir()).await
    }

    fn uploads_dir(&self, family: Family) -> PathBuf {
        self.root.join("uploads").join(family.as_str())
    }

    fn results_dir(&self) -> PathBuf {
        self.root.join("results")
    }

    pub async fn save_upload(
        &self,
        family: Family,
        original_name: &str,
        data: Bytes,
    ) -> std::io::Result<StoredFile> {
        let file_id = Uuid::new_v4();
        let dir = self.uploads_dir(family);
        tokio::fs::create_dir_all(&dir).await?;

        let stored = dir.join(format!("{file_id}.{}", extension_of(original_name)));
        tokio::fs::write(&stored, &data).await?;

        Ok(StoredFile {
            file_id,
            filename: original_name.to_string(),
            size: data.len() as u64,
        })
    }

    /// Resolves an upload by id regardless of its stored extension.
    pub async fn find_upload(&self, family: Family, file_id: Uuid) -> std::io::Result<Option<PathBuf>> {
        let mut entries = match tokio::fs::read_dir(self.uploads_dir(family)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let wanted = file_id.to_string();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.file_stem().and_then(|s| s.to_str()) == Some(wanted.as_str()) {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    pub async fn write_result(
        &self,
        job_id: Uuid,
        extension: &str,
        data: &[u8],
    ) -> std::io::Result<PathBuf> {
        let dir = self.results_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("{job_id}.{extension}"));
        tokio::fs::write(&path, data).await?;
        Ok(path)
    }
}

/// Lowercased alphanumeric extension of the client's filename, or `bin`.
fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| "bin".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_sanitised() {
        assert_eq!(extension_of("take.WAV"), "wav");
        assert_eq!(extension_of("notes"), "bin");
        assert_eq!(extension_of("../../etc/passwd"), "bin");
        assert_eq!(extension_of("x.t$t"), "bin");
    }

    #[tokio::test]
    async fn test_saved_upload_is_found_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        storage.ensure_layout().await.unwrap();

        let stored = storage
            .save_upload(Family::Text, "cv.txt", Bytes::from_static(b"hello"))
            .await
            .unwrap();
        assert_eq!(stored.size, 5);

        let path = storage
            .find_upload(Family::Text, stored.file_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tokio::fs::read(path).await.unwrap(), b"hello");

        // Uploads are scoped per family.
        assert!(storage
            .find_upload(Family::Audio, stored.file_id)
            .await
            .unwrap()
            .is_none());
    }
}
