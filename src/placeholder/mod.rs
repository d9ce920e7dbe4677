//! Placeholder file lifecycle.
//!
//! A placeholder is a copy of one small video kept under the placeholder
//! roots, exposed to Plex through a symlink inside the library folder. Plex
//! indexes the symlink, so the title shows up as playable before any real
//! file exists.

use crate::config::{LibraryTarget, PlaceholderConfig};
use placeholdarr_common::paths::{season_folder_name, PlaceholderNaming};
use placeholdarr_common::{Error, Result};
use std::io;
use std::path::{Path, PathBuf};

/// A provisioned placeholder: the backing copy and the library symlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderAsset {
    pub backing: PathBuf,
    pub link: PathBuf,
}

impl PlaceholderAsset {
    /// Folder holding the backing copy
    pub fn backing_dir(&self) -> &Path {
        self.backing.parent().unwrap_or(&self.backing)
    }

    /// Library folder holding the symlink, the path Plex should rescan
    pub fn library_dir(&self) -> &Path {
        self.link.parent().unwrap_or(&self.link)
    }
}

/// Result of [`Provisioner::cleanup`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupOutcome {
    /// Placeholders deleted by this call
    pub removed: usize,
    /// A non-placeholder media file sits in the folder
    pub has_real_file: bool,
}

#[derive(Debug, Clone)]
pub struct Provisioner {
    source: PathBuf,
    naming: PlaceholderNaming,
}

impl Provisioner {
    pub fn new(source: impl Into<PathBuf>, naming: PlaceholderNaming) -> Self {
        Self {
            source: source.into(),
            naming,
        }
    }

    pub fn from_config(config: &PlaceholderConfig) -> Self {
        Self::new(config.source.clone(), config.naming.clone())
    }

    pub fn naming(&self) -> &PlaceholderNaming {
        &self.naming
    }

    /// `mkdir -p`
    pub fn ensure_dir(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir).map_err(|e| Error::provision("create directory", e))
    }

    /// Copy the placeholder source to `dest` unless something is already there.
    ///
    /// Returns whether a copy was made.
    pub fn copy_placeholder(&self, dest: &Path) -> Result<bool> {
        if dest.exists() {
            return Ok(false);
        }
        std::fs::copy(&self.source, dest).map_err(|e| Error::provision("copy placeholder", e))?;
        Ok(true)
    }

    /// Create `link` pointing at `target` unless `link` already exists.
    ///
    /// A dangling symlink counts as existing.
    pub fn link(&self, target: &Path, link: &Path) -> Result<bool> {
        if link.symlink_metadata().is_ok() {
            return Ok(false);
        }
        symlink(target, link).map_err(|e| Error::provision("create symlink", e))?;
        Ok(true)
    }

    fn provision(&self, backing_dir: &Path, library_dir: &Path, file_name: &str) -> Result<PlaceholderAsset> {
        self.ensure_dir(backing_dir)?;
        self.ensure_dir(library_dir)?;

        let asset = PlaceholderAsset {
            backing: backing_dir.join(file_name),
            link: library_dir.join(file_name),
        };

        let copied = self.copy_placeholder(&asset.backing)?;
        let linked = self.link(&asset.backing, &asset.link)?;

        tracing::debug!(
            backing = %asset.backing.display(),
            link = %asset.link.display(),
            copied,
            linked,
            "Placeholder provisioned"
        );

        Ok(asset)
    }

    /// Provision the placeholder for one movie folder.
    pub fn provision_movie(&self, target: &LibraryTarget, folder_name: &str) -> Result<PlaceholderAsset> {
        self.provision(
            &target.placeholder_root.join(folder_name),
            &target.library_root.join(folder_name),
            &self.naming.file_name,
        )
    }

    /// Provision the multi-episode placeholder covering one season.
    pub fn provision_season(
        &self,
        target: &LibraryTarget,
        series_folder: &str,
        series_title: &str,
        season_number: i32,
        episode_count: usize,
    ) -> Result<PlaceholderAsset> {
        let season_dir = season_folder_name(season_number);
        let file_name = self
            .naming
            .season_file_name(series_title, season_number, episode_count);

        self.provision(
            &target.placeholder_root.join(series_folder).join(&season_dir),
            &target.library_root.join(series_folder).join(&season_dir),
            &file_name,
        )
    }

    /// Delete the placeholders in `dir` if a real media file sits beside them.
    ///
    /// Placeholders are never removed from a folder that holds nothing else.
    /// Calling this again after a successful cleanup is a no-op. A missing
    /// folder is treated as empty.
    pub fn cleanup(&self, dir: &Path) -> Result<CleanupOutcome> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CleanupOutcome::default()),
            Err(e) => return Err(Error::Io(e)),
        };

        let mut placeholders = Vec::new();
        let mut has_real_file = false;

        for entry in entries {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                continue;
            }

            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') {
                continue;
            }

            if self.naming.is_placeholder_name(&name) {
                placeholders.push(entry.path());
            } else {
                has_real_file = true;
            }
        }

        if !has_real_file {
            if !placeholders.is_empty() {
                tracing::info!(dir = %dir.display(), "No real file beside placeholder, keeping it");
            }
            return Ok(CleanupOutcome::default());
        }

        let mut removed = 0;
        for path in placeholders {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "Removed placeholder");
                    removed += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }

        Ok(CleanupOutcome {
            removed,
            has_real_file,
        })
    }

    /// `rm -rf` a backing folder. Returns `false` if it was already gone.
    pub fn remove_backing_folder(&self, dir: &Path) -> Result<bool> {
        match std::fs::remove_dir_all(dir) {
            Ok(()) => {
                tracing::info!(dir = %dir.display(), "Removed placeholder folder");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use placeholdarr_common::MediaKind;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        provisioner: Provisioner,
        target: LibraryTarget,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source.mp4");
        std::fs::write(&source, b"placeholder").unwrap();

        let target = LibraryTarget {
            kind: MediaKind::Movie,
            library_id: 1,
            tag: "ondemand".into(),
            placeholder_root: tmp.path().join("placeholders"),
            library_root: tmp.path().join("library"),
        };

        Fixture {
            provisioner: Provisioner::new(source, PlaceholderNaming::default()),
            target,
            _tmp: tmp,
        }
    }

    #[test]
    fn test_provision_movie() {
        let f = fixture();
        let asset = f.provisioner.provision_movie(&f.target, "Heat (1995)").unwrap();

        assert_eq!(asset.backing, f.target.placeholder_root.join("Heat (1995)/dummy.mp4"));
        assert_eq!(asset.link, f.target.library_root.join("Heat (1995)/dummy.mp4"));
        assert_eq!(std::fs::read(&asset.link).unwrap(), b"placeholder");
        assert!(asset.link.symlink_metadata().unwrap().file_type().is_symlink());

        // Second run leaves everything in place
        let again = f.provisioner.provision_movie(&f.target, "Heat (1995)").unwrap();
        assert_eq!(again, asset);
    }

    #[test]
    fn test_provision_season() {
        let f = fixture();
        let asset = f
            .provisioner
            .provision_season(&f.target, "Dark", "Dark", 2, 8)
            .unwrap();

        assert_eq!(
            asset.link,
            f.target.library_root.join("Dark/Season 2/Dark - s02e01-e08 - dummy.mp4")
        );
        assert!(asset.backing.exists());
        assert_eq!(asset.library_dir(), f.target.library_root.join("Dark/Season 2"));
    }

    #[test]
    fn test_missing_source_is_provision_error() {
        let f = fixture();
        let provisioner = Provisioner::new("/nonexistent/source.mp4", PlaceholderNaming::default());
        let err = provisioner.provision_movie(&f.target, "Heat (1995)").unwrap_err();
        assert!(matches!(err, Error::Provision { step: "copy placeholder", .. }));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn test_cleanup_keeps_lone_placeholder() {
        let f = fixture();
        let asset = f.provisioner.provision_movie(&f.target, "Heat (1995)").unwrap();

        let outcome = f.provisioner.cleanup(asset.library_dir()).unwrap();
        assert_eq!(outcome, CleanupOutcome::default());
        assert!(asset.link.symlink_metadata().is_ok());
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let f = fixture();
        let asset = f.provisioner.provision_movie(&f.target, "Heat (1995)").unwrap();
        std::fs::write(asset.library_dir().join("Heat (1995).mkv"), b"real").unwrap();

        let first = f.provisioner.cleanup(asset.library_dir()).unwrap();
        assert_eq!(first.removed, 1);
        assert!(first.has_real_file);
        assert!(asset.link.symlink_metadata().is_err());

        let second = f.provisioner.cleanup(asset.library_dir()).unwrap();
        assert_eq!(second.removed, 0);
        assert!(second.has_real_file);
        assert!(asset.library_dir().join("Heat (1995).mkv").exists());
    }

    #[test]
    fn test_cleanup_ignores_hidden_files_and_missing_dirs() {
        let f = fixture();
        let asset = f.provisioner.provision_movie(&f.target, "Heat (1995)").unwrap();
        std::fs::write(asset.library_dir().join(".DS_Store"), b"").unwrap();

        assert!(!f.provisioner.cleanup(asset.library_dir()).unwrap().has_real_file);
        assert_eq!(
            f.provisioner.cleanup(Path::new("/nonexistent/folder")).unwrap(),
            CleanupOutcome::default()
        );
    }

    #[test]
    fn test_remove_backing_folder() {
        let f = fixture();
        let asset = f.provisioner.provision_movie(&f.target, "Heat (1995)").unwrap();

        assert!(f.provisioner.remove_backing_folder(asset.backing_dir()).unwrap());
        assert!(!asset.backing_dir().exists());
        assert!(!f.provisioner.remove_backing_folder(asset.backing_dir()).unwrap());
    }
}
