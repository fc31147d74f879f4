use std::path::{Path, PathBuf};

use scene_contracts::category::ProductCategory;

use super::{ReferenceImage, ReferenceSupplier};
use crate::asset::{mime_for_path, ImageAsset};

const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Loads `<root>/maison/*` for every category, sorted by file name.
#[derive(Debug, Clone)]
pub struct DirectoryReferences {
    root: PathBuf,
}

impl DirectoryReferences {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn maison_dir(&self) -> PathBuf {
        self.root.join("maison")
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn load_directory(dir: &Path) -> Vec<ReferenceImage> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            tracing::warn!(dir = %dir.display(), error = %err, "reference directory unreadable");
            return Vec::new();
        }
    };
    let mut paths = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file() && is_supported(path))
        .collect::<Vec<_>>();
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        match std::fs::read(&path) {
            Ok(bytes) => out.push(ReferenceImage {
                name,
                asset: ImageAsset::new(bytes, mime_for_path(&path).unwrap_or("image/jpeg")),
            }),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping unreadable reference image");
            }
        }
    }
    out
}

impl ReferenceSupplier for DirectoryReferences {
    fn references(&self, category: ProductCategory) -> Vec<ReferenceImage> {
        let refs = load_directory(&self.maison_dir());
        tracing::debug!(category = %category, count = refs.len(), "reference images loaded");
        refs
    }
}

/// Supplies nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReferences;

impl ReferenceSupplier for NoReferences {
    fn references(&self, _category: ProductCategory) -> Vec<ReferenceImage> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use scene_contracts::category::ProductCategory;

    use super::{DirectoryReferences, NoReferences};
    use crate::adapters::ReferenceSupplier;

    #[test]
    fn loads_supported_images_sorted_by_name() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let maison = temp.path().join("maison");
        std::fs::create_dir_all(&maison)?;
        std::fs::write(maison.join("02.png"), b"two")?;
        std::fs::write(maison.join("01.JPG"), b"one")?;
        std::fs::write(maison.join("03.webp"), b"three")?;
        std::fs::write(maison.join("notes.txt"), b"skip")?;
        std::fs::write(temp.path().join("root-level.jpg"), b"ignored")?;

        let supplier = DirectoryReferences::new(temp.path());
        let refs = supplier.references(ProductCategory::Shelf);
        let names: Vec<&str> = refs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["01.JPG", "02.png", "03.webp"]);
        assert_eq!(refs[0].asset.mime(), "image/jpeg");
        assert_eq!(refs[2].asset.mime(), "image/webp");
        assert_eq!(
            supplier.references(ProductCategory::WallArt).len(),
            refs.len()
        );
        Ok(())
    }

    #[test]
    fn missing_directory_is_empty() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let supplier = DirectoryReferences::new(temp.path().join("nowhere"));
        assert!(supplier.references(ProductCategory::WallArt).is_empty());
        assert!(NoReferences.references(ProductCategory::Shelf).is_empty());
        Ok(())
    }
}
