use crate::error::{AccountError, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A file received in a multipart form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Writes uploaded files to a local directory
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Store `file` under a name no other upload can collide with and return
    /// the path it was written to.
    pub async fn save(&self, file: &UploadedFile) -> Result<PathBuf> {
        if file.content.len() > self.max_bytes {
            return Err(AccountError::FileSave(format!(
                "File too large. Max size: {} bytes",
                self.max_bytes
            )));
        }

        let file_name = format!("{}{}", Uuid::new_v4(), sanitize_file_name(&file.file_name));
        let path = self.dir.join(file_name);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AccountError::FileSave(format!("Directory creation error: {}", e)))?;

        tokio::fs::write(&path, &file.content)
            .await
            .map_err(|e| AccountError::FileSave(format!("File write error: {}", e)))?;

        tracing::debug!(path = %path.display(), bytes = file.content.len(), "upload stored");

        Ok(path)
    }

    /// Best-effort removal of a stored upload
    pub async fn remove(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove upload");
        }
    }
}

/// Keep only the final path component of a client-supplied file name
fn sanitize_file_name(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .filter(|base| !base.is_empty() && *base != "." && *base != "..")
        .unwrap_or("upload")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("accounts-uploads-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("avatar.png"), "avatar.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_file_name(".."), "upload");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = temp_dir();
        let store = UploadStore::new(&dir, 1024);
        let file = UploadedFile {
            file_name: "avatar.png".to_string(),
            content: b"png-bytes".to_vec(),
        };

        let path = store.save(&file).await.unwrap();
        assert!(path.starts_with(&dir));
        assert!(path.to_string_lossy().ends_with("avatar.png"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"png-bytes");

        store.remove(&path).await;
        assert!(!path.exists());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_same_name_does_not_collide() {
        let dir = temp_dir();
        let store = UploadStore::new(&dir, 1024);
        let file = UploadedFile {
            file_name: "avatar.png".to_string(),
            content: b"a".to_vec(),
        };

        let first = store.save(&file).await.unwrap();
        let second = store.save(&file).await.unwrap();
        assert_ne!(first, second);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_oversized_file_rejected() {
        let store = UploadStore::new(temp_dir(), 4);
        let file = UploadedFile {
            file_name: "big.bin".to_string(),
            content: vec![0u8; 5],
        };

        assert!(matches!(
            store.save(&file).await,
            Err(AccountError::FileSave(_))
        ));
    }
}
