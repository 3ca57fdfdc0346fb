use crate::error::DiscoveryError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg"];

/// Suffix match on the lowercased file name, so a bare `.jpg` counts too.
pub fn is_image(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .map(|name| IMAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)))
        .unwrap_or(false)
}

/// Image files directly inside `dir`, sorted by path. A missing directory
/// has no images; any other listing failure is an error.
pub fn discover_images(dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let err = |source: std::io::Error| DiscoveryError {
        path: dir.to_path_buf(),
        source,
    };
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::warn!("input directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(err(e)),
    };
    let mut images = Vec::new();
    for entry in entries {
        let entry = entry.map_err(err)?;
        let path = entry.path();
        if !is_image(&path) {
            continue;
        }
        let file_type = entry.file_type().map_err(err)?;
        if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn matches_extensions_case_insensitively() {
        for name in ["a.png", "b.JPG", "c.Jpeg", "dir/d.jpeg", ".jpg", ".PNG"] {
            assert!(is_image(Path::new(name)), "{name}");
        }
        for name in ["a.gif", "png", "notes.txt", "a.png.bak", "photojpg"] {
            assert!(!is_image(Path::new(name)), "{name}");
        }
    }

    #[test]
    fn lists_sorted_images_only() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        for name in ["b.jpg", "a.PNG", "c.jpeg", ".jpg", "readme.md", "clip.mp4"] {
            std::fs::write(dir.path().join(name), b"")?;
        }
        std::fs::create_dir(dir.path().join("album.jpg"))?;
        std::fs::create_dir(dir.path().join("nested"))?;
        std::fs::write(dir.path().join("nested/deep.jpg"), b"")?;

        let images = discover_images(dir.path())?;
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![".jpg", "a.PNG", "b.jpg", "c.jpeg"]);
        Ok(())
    }

    #[test]
    fn missing_directory_is_empty() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        assert!(discover_images(&dir.path().join("nope"))?.is_empty());
        Ok(())
    }

    #[test]
    fn file_as_directory_is_an_error() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let file = dir.path().join("photos");
        std::fs::write(&file, b"not a dir")?;
        assert!(discover_images(&file).is_err());
        Ok(())
    }
}
