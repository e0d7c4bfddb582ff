//! On-disk corpus layout: an `images/` folder of raw items and a
//! `pretrained_features/` folder of per-item feature records.

use std::path::{Path, PathBuf};

use crate::types::{CorpusResult, ItemId};

/// Subfolder holding the raw image files.
const IMAGES_DIR: &str = "images";

/// Subfolder holding one feature record per item.
const FEATURES_DIR: &str = "pretrained_features";

/// A corpus root folder and its two well-known subfolders.
#[derive(Debug, Clone)]
pub struct CorpusLayout {
    root: PathBuf,
    images: PathBuf,
    features: PathBuf,
}

/// One enumerated corpus item: its identity and the image file backing it.
#[derive(Debug, Clone)]
pub struct CorpusItem {
    pub id: ItemId,
    pub image_path: PathBuf,
}

impl CorpusLayout {
    /// Point at a corpus root. Does not touch the filesystem.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let images = root.join(IMAGES_DIR);
        let features = root.join(FEATURES_DIR);
        Self {
            root,
            images,
            features,
        }
    }

    /// Create the `images/` and `pretrained_features/` subfolders.
    pub fn init(&self) -> CorpusResult<()> {
        std::fs::create_dir_all(&self.images)?;
        std::fs::create_dir_all(&self.features)?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images_dir(&self) -> &Path {
        &self.images
    }

    pub fn features_dir(&self) -> &Path {
        &self.features
    }

    /// Enumerate the corpus items, sorted by identity.
    ///
    /// Sorting makes the row order stable across platforms; filesystem
    /// enumeration order is not guaranteed and must never leak into
    /// matrix row assignment.
    pub fn items(&self) -> CorpusResult<Vec<CorpusItem>> {
        let mut items = Vec::new();

        for entry in std::fs::read_dir(&self.images)? {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type()?.is_file() || !is_supported_image(&path) {
                continue;
            }
            match ItemId::from_path(&path) {
                Some(id) => items.push(CorpusItem {
                    id,
                    image_path: path,
                }),
                None => {
                    tracing::warn!("Skipping image with unusable filename: {}", path.display());
                }
            }
        }

        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    /// Identities of all corpus items, sorted.
    pub fn item_ids(&self) -> CorpusResult<Vec<ItemId>> {
        Ok(self.items()?.into_iter().map(|item| item.id).collect())
    }

    /// Resolve an identity back to its image file, whatever the extension.
    pub fn find_image(&self, id: &ItemId) -> CorpusResult<Option<PathBuf>> {
        for entry in std::fs::read_dir(&self.images)? {
            let path = entry?.path();
            if is_supported_image(&path) && ItemId::from_path(&path).as_ref() == Some(id) {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }
}

/// Check if a file path points to a supported image format.
pub fn is_supported_image(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    matches!(
        ext.as_str(),
        "png" | "jpg" | "jpeg" | "webp" | "gif" | "bmp" | "tiff" | "tif"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_items_sorted_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CorpusLayout::open(dir.path());
        layout.init().unwrap();

        touch(&layout.images_dir().join("c_image.jpg"));
        touch(&layout.images_dir().join("a_image.png"));
        touch(&layout.images_dir().join("b_image.jpg"));

        let items = layout.items().unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a_image", "b_image", "c_image"]);
    }

    #[test]
    fn test_items_skip_unsupported_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CorpusLayout::open(dir.path());
        layout.init().unwrap();

        touch(&layout.images_dir().join("kept.jpg"));
        touch(&layout.images_dir().join("notes.txt"));
        touch(&layout.images_dir().join("metadata.csv"));

        let items = layout.items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id.as_str(), "kept");
    }

    #[test]
    fn test_find_image_resolves_extension() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CorpusLayout::open(dir.path());
        layout.init().unwrap();

        touch(&layout.images_dir().join("sample.webp"));

        let found = layout.find_image(&ItemId::new("sample")).unwrap().unwrap();
        assert_eq!(found.extension().unwrap(), "webp");
        assert!(layout.find_image(&ItemId::new("absent")).unwrap().is_none());
    }

    #[test]
    fn test_supported_formats() {
        assert!(is_supported_image(Path::new("test.png")));
        assert!(is_supported_image(Path::new("test.JPG")));
        assert!(is_supported_image(Path::new("test.webp")));
        assert!(!is_supported_image(Path::new("test.txt")));
        assert!(!is_supported_image(Path::new("test.pickle")));
    }
}
