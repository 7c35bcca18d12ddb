//! Storage for uploaded event images.
//!
//! Images land on disk under the configured static directory at a
//! deterministic path derived from the sanitized original filename. The
//! relative public path is what gets persisted on the event row; the files
//! themselves are served by `ServeDir`.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::UploadConfig;

const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("image filename is empty or unusable")]
    BadFilename,
    #[error("unsupported image type: {0} (accepted: png, jpg, jpeg)")]
    UnsupportedType(String),
    #[error("failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct ImageStore {
    dir: PathBuf,
    public_prefix: String,
}

impl ImageStore {
    pub fn new(config: &UploadConfig) -> Self {
        ImageStore {
            dir: Path::new(&config.static_root).join(&config.image_subdir),
            public_prefix: format!("{}/{}", config.static_root, config.image_subdir),
        }
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Write the uploaded bytes and return the relative path to persist.
    pub async fn save(&self, original_name: &str, data: &[u8]) -> Result<String, UploadError> {
        let name = sanitize_filename(original_name).ok_or(UploadError::BadFilename)?;

        let extension = name.rsplit('.').next().unwrap_or_default().to_lowercase();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(UploadError::UnsupportedType(extension));
        }

        tokio::fs::write(self.dir.join(&name), data).await?;
        Ok(format!("{}/{}", self.public_prefix, name))
    }

    /// Delete a previously stored image, addressed by the relative path
    /// `save` returned. Used when a row mutation fails after the file was
    /// already written, so the upload does not end up orphaned.
    pub async fn remove(&self, public_path: &str) -> std::io::Result<()> {
        match stored_file_name(public_path) {
            Some(name) => tokio::fs::remove_file(self.dir.join(name)).await,
            None => Ok(()),
        }
    }
}

fn stored_file_name(public_path: &str) -> Option<&str> {
    let name = public_path.rsplit('/').next().unwrap_or_default();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Reduce a client-supplied filename to a safe single path component:
/// directory parts are dropped, whitespace becomes underscores, anything
/// outside `[A-Za-z0-9._-]` is removed, leading dots are stripped.
/// Returns None when nothing usable remains.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(sanitize_filename("poster.png").as_deref(), Some("poster.png"));
    }

    #[test]
    fn path_components_are_dropped() {
        assert_eq!(
            sanitize_filename("../../etc/passwd.png").as_deref(),
            Some("passwd.png")
        );
        assert_eq!(
            sanitize_filename("C:\\Users\\evil\\shot.jpg").as_deref(),
            Some("shot.jpg")
        );
    }

    #[test]
    fn spaces_become_underscores() {
        assert_eq!(
            sanitize_filename("band photo final.jpeg").as_deref(),
            Some("band_photo_final.jpeg")
        );
    }

    #[test]
    fn hidden_and_empty_names_are_rejected() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("..."), None);
        assert_eq!(sanitize_filename(".hidden").as_deref(), Some("hidden"));
    }

    #[test]
    fn odd_characters_are_removed() {
        assert_eq!(
            sanitize_filename("gig@#$%.jpg").as_deref(),
            Some("gig.jpg")
        );
    }

    #[test]
    fn stored_file_name_takes_final_component() {
        assert_eq!(
            stored_file_name("static/img/events/poster.png"),
            Some("poster.png")
        );
        assert_eq!(stored_file_name("poster.png"), Some("poster.png"));
        assert_eq!(stored_file_name("static/img/events/"), None);
        assert_eq!(stored_file_name(""), None);
    }

    #[tokio::test]
    async fn save_and_remove_round_trip() {
        let root = std::env::temp_dir().join(format!("gigbook-uploads-{}", std::process::id()));
        let config = UploadConfig {
            static_root: root.to_string_lossy().into_owned(),
            image_subdir: "img/events".to_string(),
        };
        let store = ImageStore::new(&config);
        store.ensure_dir().await.unwrap();

        let path = store.save("poster.png", &[1, 2, 3]).await.unwrap();
        assert!(path.ends_with("img/events/poster.png"));

        let on_disk = root.join("img/events/poster.png");
        assert!(on_disk.exists());

        store.remove(&path).await.unwrap();
        assert!(!on_disk.exists());

        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
