use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::AppError;
use crate::forms::UploadedFile;

/// URL prefix under which the media root is served.
pub const MEDIA_URL: &str = "/media";

/// Subdirectory of the media root holding project images.
pub const PROJECT_UPLOAD_DIR: &str = "projects";

/// Detect the image format from the file's leading bytes.
/// Returns the canonical extension, or `None` for anything that is not a supported image.
pub fn sniff_image(data: &[u8]) -> Option<&'static str> {
    match data {
        [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, ..] => Some("png"),
        [0xff, 0xd8, 0xff, ..] => Some("jpg"),
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some("gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("webp"),
        _ => None,
    }
}

/// Local filesystem storage for uploaded files.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the media root and upload directories if missing.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.root.join(PROJECT_UPLOAD_DIR)).await
    }

    /// Store a validated image and return its path relative to the media root.
    ///
    /// The stored name is generated; the client-supplied filename is never
    /// used on disk.
    pub async fn save_image(&self, upload: &UploadedFile) -> Result<String, AppError> {
        let ext = sniff_image(&upload.data)
            .ok_or_else(|| AppError::BadRequest("Upload is not a supported image".to_string()))?;
        let relative = format!("{PROJECT_UPLOAD_DIR}/{}.{ext}", Uuid::now_v7());
        let target = self.root.join(&relative);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create media dir: {e}")))?;
        }
        tokio::fs::write(&target, &upload.data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write upload: {e}")))?;

        tracing::debug!(path = %relative, bytes = upload.size(), "Stored upload");
        Ok(relative)
    }

    /// Remove a stored file. Missing files are not an error.
    pub async fn delete(&self, relative: &str) {
        if relative.split('/').any(|part| part == ".." || part.is_empty()) {
            tracing::warn!(path = %relative, "Refusing to delete suspicious media path");
            return;
        }
        match tokio::fs::remove_file(self.root.join(relative)).await {
            Ok(()) => tracing::debug!(path = %relative, "Deleted upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %relative, "Failed to delete upload: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    const PNG_1X1: &[u8] = &[
        0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
        0x52,
    ];

    #[test]
    fn sniffs_known_formats() {
        assert_eq!(sniff_image(PNG_1X1), Some("png"));
        assert_eq!(sniff_image(&[0xff, 0xd8, 0xff, 0xe0]), Some("jpg"));
        assert_eq!(sniff_image(b"GIF89a...."), Some("gif"));
        assert_eq!(sniff_image(b"RIFF\x10\x00\x00\x00WEBPVP8 "), Some("webp"));
        assert_eq!(sniff_image(b"%PDF-1.7"), None);
        assert_eq!(sniff_image(b""), None);
    }

    #[tokio::test]
    async fn save_and_delete_image() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());
        let upload = UploadedFile {
            filename: "../../etc/evil.png".to_string(),
            content_type: Some("image/png".to_string()),
            data: Bytes::from_static(PNG_1X1),
        };

        let relative = storage.save_image(&upload).await.unwrap();
        assert!(relative.starts_with("projects/"));
        assert!(relative.ends_with(".png"));
        assert!(!relative.contains("evil"));
        assert!(dir.path().join(&relative).exists());

        storage.delete(&relative).await;
        assert!(!dir.path().join(&relative).exists());
    }

    #[tokio::test]
    async fn non_image_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());
        let upload = UploadedFile {
            filename: "notes.png".to_string(),
            content_type: None,
            data: Bytes::from_static(b"plain text"),
        };
        assert!(storage.save_image(&upload).await.is_err());
    }
}
