//! Directory source for the gallery.
//!
//! This module provides the `FileScanner` struct which handles:
//! - Directory walking using walkdir
//! - Image detection by file extension
//! - Stable, path-sorted reference lists
//! - Progress reporting via channels

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::task;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::models::MediaRef;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff"];

/// Returns `true` for extensions the decoder can handle.
pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
}

/// Configuration for the file scanner.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to scan directories recursively.
    pub recursive: bool,
    /// Maximum directory depth (0 = unlimited).
    pub max_depth: usize,
    /// Whether to follow symbolic links.
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            max_depth: 0, // unlimited
            follow_symlinks: false,
        }
    }
}

/// Progress information sent during scanning.
#[derive(Debug, Clone)]
pub enum ScanProgress {
    Started { path: PathBuf },
    Discovered { path: PathBuf },
    FileError { path: PathBuf, error: String },
    Completed { total: usize, errors: usize },
}

/// Result of a completed scan operation.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub total_files: usize,
    pub error_count: usize,
    /// Paths of all discovered images, in reference order.
    pub paths: Vec<PathBuf>,
}

pub struct FileScanner {
    config: ScanConfig,
}

impl FileScanner {
    pub fn new() -> Self {
        Self {
            config: ScanConfig::default(),
        }
    }

    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Scans a directory and returns its images as an ordered reference list.
    pub async fn scan(&self, dir: &Path) -> Result<Vec<MediaRef>> {
        let dir = dir.to_path_buf();
        let config = self.config.clone();

        let (refs, _) = task::spawn_blocking(move || Self::scan_sync(&dir, &config, None))
            .await
            .context("Scan task panicked")??;
        Ok(refs)
    }

    /// Scans a directory with progress reporting via a channel.
    pub fn scan_with_progress(
        &self,
        dir: PathBuf,
    ) -> (
        mpsc::Receiver<ScanProgress>,
        task::JoinHandle<Result<(Vec<MediaRef>, ScanResult)>>,
    ) {
        let config = self.config.clone();
        let (tx, rx) = mpsc::channel(100);

        let handle = task::spawn_blocking(move || Self::scan_sync(&dir, &config, Some(tx)));

        let wrapped_handle =
            task::spawn(async move { handle.await.context("Scan task panicked")? });

        (rx, wrapped_handle)
    }

    fn scan_sync(
        dir: &Path,
        config: &ScanConfig,
        tx: Option<mpsc::Sender<ScanProgress>>,
    ) -> Result<(Vec<MediaRef>, ScanResult)> {
        let send = |progress: ScanProgress| {
            if let Some(tx) = &tx {
                let _ = tx.blocking_send(progress);
            }
        };

        info!("Starting scan of {:?}", dir);
        send(ScanProgress::Started {
            path: dir.to_path_buf(),
        });

        let (entries, errors) = Self::discover_files(dir, config)?;
        for (path, error) in &errors {
            send(ScanProgress::FileError {
                path: path.clone(),
                error: error.clone(),
            });
        }

        let mut refs = Vec::with_capacity(entries.len());
        let mut paths = Vec::with_capacity(entries.len());
        for entry in entries {
            send(ScanProgress::Discovered {
                path: entry.path.clone(),
            });
            refs.push(entry.to_media_ref());
            paths.push(entry.path);
        }

        let result = ScanResult {
            total_files: refs.len(),
            error_count: errors.len(),
            paths,
        };
        send(ScanProgress::Completed {
            total: result.total_files,
            errors: result.error_count,
        });
        info!(
            "Scan complete: {} images, {} errors",
            result.total_files, result.error_count
        );

        Ok((refs, result))
    }

    /// Discovers all image files in a directory, sorted by path.
    fn discover_files(
        dir: &Path,
        config: &ScanConfig,
    ) -> Result<(Vec<DiscoveredEntry>, Vec<(PathBuf, String)>)> {
        if !dir.is_dir() {
            bail!("{} is not a directory", dir.display());
        }

        let mut walker = WalkDir::new(dir).follow_links(config.follow_symlinks);
        if !config.recursive {
            walker = walker.max_depth(1);
        } else if config.max_depth > 0 {
            walker = walker.max_depth(config.max_depth);
        }

        let mut entries = Vec::new();
        let mut errors = Vec::new();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    warn!("Failed to read {:?}: {}", path, e);
                    errors.push((path, e.to_string()));
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !is_image_extension(ext) {
                debug!("Skipping non-image {:?}", path);
                continue;
            }

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            entries.push(DiscoveredEntry {
                path: path.to_path_buf(),
                size,
            });
        }

        // Sort by path for consistent ordering
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        Ok((entries, errors))
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct DiscoveredEntry {
    path: PathBuf,
    size: u64,
}

impl DiscoveredEntry {
    fn to_media_ref(&self) -> MediaRef {
        let mut metadata = Map::new();
        if let Some(stem) = self.path.file_stem().and_then(|s| s.to_str()) {
            metadata.insert("title".into(), Value::from(stem));
        }
        if let Some(name) = self.path.file_name().and_then(|s| s.to_str()) {
            metadata.insert("fileName".into(), Value::from(name));
        }
        metadata.insert("bytes".into(), Value::from(self.size));

        MediaRef::new(self.path.to_string_lossy().as_ref()).with_metadata(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::test_support::png_bytes;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn create_test_image(path: &Path) {
        fs::write(path, png_bytes(2, 1)).unwrap();
    }

    #[test]
    fn test_scan_config_default() {
        let config = ScanConfig::default();
        assert!(!config.recursive);
        assert_eq!(config.max_depth, 0);
        assert!(!config.follow_symlinks);
    }

    #[test]
    fn test_image_extension() {
        assert!(is_image_extension("JPG"));
        assert!(is_image_extension("webp"));
        assert!(!is_image_extension("mp4"));
        assert!(!is_image_extension(""));
    }

    #[test]
    fn test_discover_files_empty_dir() {
        let dir = tempdir().unwrap();
        let (entries, errors) =
            FileScanner::discover_files(dir.path(), &ScanConfig::default()).unwrap();
        assert!(entries.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_discover_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(FileScanner::discover_files(&missing, &ScanConfig::default()).is_err());
    }

    #[test]
    fn test_discover_files_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        create_test_image(&dir.path().join("b.png"));
        create_test_image(&dir.path().join("a.png"));
        File::create(dir.path().join("notes.txt")).unwrap();

        let (entries, _) =
            FileScanner::discover_files(dir.path(), &ScanConfig::default()).unwrap();
        let names: Vec<_> = entries
            .iter()
            .map(|e| e.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_discover_files_recursive() {
        let dir = tempdir().unwrap();
        let subdir = dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();

        create_test_image(&dir.path().join("root.png"));
        create_test_image(&subdir.join("nested.png"));

        let config = ScanConfig {
            recursive: true,
            ..Default::default()
        };
        let (entries, _) = FileScanner::discover_files(dir.path(), &config).unwrap();
        assert_eq!(entries.len(), 2);

        let (entries, _) =
            FileScanner::discover_files(dir.path(), &ScanConfig::default()).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_scan_builds_refs_with_metadata() {
        let dir = tempdir().unwrap();
        create_test_image(&dir.path().join("sunset.png"));

        let refs = FileScanner::new().scan(dir.path()).await.unwrap();
        assert_eq!(refs.len(), 1);
        assert!(refs[0].source_ref.ends_with("sunset.png"));
        assert_eq!(refs[0].metadata["title"], "sunset");
        assert_eq!(refs[0].metadata["fileName"], "sunset.png");
    }

    #[tokio::test]
    async fn test_scan_with_progress() {
        let dir = tempdir().unwrap();
        create_test_image(&dir.path().join("one.png"));
        create_test_image(&dir.path().join("two.png"));

        let (mut rx, handle) = FileScanner::new().scan_with_progress(dir.path().to_path_buf());
        let (refs, result) = handle.await.unwrap().unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(result.total_files, 2);
        assert_eq!(result.error_count, 0);

        let mut discovered = 0;
        let mut completed = false;
        while let Some(progress) = rx.recv().await {
            match progress {
                ScanProgress::Discovered { .. } => discovered += 1,
                ScanProgress::Completed { total, .. } => {
                    assert_eq!(total, 2);
                    completed = true;
                }
                _ => {}
            }
        }
        assert_eq!(discovered, 2);
        assert!(completed);
    }
}
