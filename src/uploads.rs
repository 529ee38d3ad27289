//! Photo files on local disk, served back under `/uploads`.

use std::path::{Component, Path, PathBuf};

use axum::body::Bytes;
use tracing::{debug, error, warn};

use crate::error::{ApiError, ApiResult};

pub const PUBLIC_PREFIX: &str = "/uploads";
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

/// A file part pulled out of a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Lowercased extension with its dot, if it is an accepted image type.
    pub fn image_extension(&self) -> ApiResult<String> {
        let extension = Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            Ok(format!(".{extension}"))
        } else {
            Err(ApiError::bad_request(format!(
                "{}: '{}' is not a supported image (jpg, jpeg, png, gif, bmp)",
                self.field, self.file_name
            )))
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes `bytes` to `<root>/<folder>/<name>` and returns its public URL.
    pub async fn save(&self, folder: &str, name: &str, bytes: &[u8]) -> ApiResult<String> {
        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            error!("cannot create upload directory {}: {}", dir.display(), e);
            ApiError::internal("Failed to store uploaded file")
        })?;

        let path = dir.join(name);
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            error!("cannot write upload {}: {}", path.display(), e);
            ApiError::internal("Failed to store uploaded file")
        })?;

        debug!("stored upload at {}", path.display());
        Ok(format!("{PUBLIC_PREFIX}/{folder}/{name}"))
    }

    /// Best effort removal of a file previously returned by [`MediaStore::save`].
    pub async fn remove(&self, url: &str) {
        let Some(path) = self.resolve(url) else {
            warn!("refusing to remove upload outside the media root: {}", url);
            return;
        };
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("could not remove upload {}: {}", path.display(), e);
        }
    }

    fn resolve(&self, url: &str) -> Option<PathBuf> {
        let relative = Path::new(url.strip_prefix(PUBLIC_PREFIX)?.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> UploadedFile {
        UploadedFile {
            field: "photos".into(),
            file_name: name.into(),
            bytes: Bytes::from_static(b"img"),
        }
    }

    #[test]
    fn accepts_known_image_extensions_case_insensitively() {
        assert_eq!(upload("kemeja.PNG").image_extension().unwrap(), ".png");
        assert_eq!(upload("a.b.jpeg").image_extension().unwrap(), ".jpeg");
    }

    #[test]
    fn rejects_other_files() {
        assert!(upload("script.sh").image_extension().is_err());
        assert!(upload("noextension").image_extension().is_err());
    }

    #[test]
    fn resolve_stays_inside_root() {
        let store = MediaStore::new("/srv/uploads");
        assert_eq!(
            store.resolve("/uploads/products/1_2.png"),
            Some(PathBuf::from("/srv/uploads/products/1_2.png"))
        );
        assert_eq!(store.resolve("/uploads/../etc/passwd"), None);
        assert_eq!(store.resolve("/elsewhere/x.png"), None);
    }

    #[tokio::test]
    async fn save_then_remove() {
        let root = std::env::temp_dir().join(format!("evermos-media-{}", uuid::Uuid::new_v4()));
        let store = MediaStore::new(&root);

        let url = store.save("shops", "shop_1.png", b"png").await.unwrap();
        assert_eq!(url, "/uploads/shops/shop_1.png");
        assert!(root.join("shops/shop_1.png").exists());

        store.remove(&url).await;
        assert!(!root.join("shops/shop_1.png").exists());
        let _ = std::fs::remove_dir_all(root);
    }
}
