//! Example image galleries, one per feature tab
//!
//! Examples live under `<examples_dir>/<feature slug>/`. Only files found by
//! the scan can be served, so a request can never name a path outside it.

use crate::{
    error::{Result, StudioError},
    types::Feature,
};
use serde::Serialize;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Examples shown per gallery page
pub const EXAMPLES_PER_PAGE: usize = 5;

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "webp", "bmp", "tiff"];

/// One selectable example
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExampleImage {
    /// File name, used as the lookup key
    pub name: String,
    #[serde(skip)]
    pub path: PathBuf,
}

/// Example images for every feature
#[derive(Debug, Clone, Default)]
pub struct ExampleCatalog {
    examples: HashMap<Feature, Vec<ExampleImage>>,
}

impl ExampleCatalog {
    /// Catalog without any examples
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Scan `root/<slug>` for every feature; missing directories yield empty galleries
    #[must_use]
    pub fn scan<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        let mut examples = HashMap::new();

        for feature in Feature::ALL {
            let dir = root.join(feature.slug());
            let found = Self::scan_dir(&dir);
            debug!(feature = %feature, count = found.len(), dir = %dir.display(), "Scanned examples");
            examples.insert(feature, found);
        }

        Self { examples }
    }

    fn scan_dir(dir: &Path) -> Vec<ExampleImage> {
        if !dir.is_dir() {
            return Vec::new();
        }

        let mut found: Vec<ExampleImage> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable example entry: {}", e);
                    None
                },
            })
            .filter(|entry| entry.file_type().is_file() && Self::is_image(entry.path()))
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                Some(ExampleImage {
                    name,
                    path: entry.into_path(),
                })
            })
            .collect();

        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    fn is_image(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
    }

    /// All examples for `feature`
    #[must_use]
    pub fn list(&self, feature: Feature) -> &[ExampleImage] {
        self.examples.get(&feature).map(Vec::as_slice).unwrap_or_default()
    }

    /// One page (zero-based) of examples for `feature`
    #[must_use]
    pub fn page(&self, feature: Feature, page: usize) -> &[ExampleImage] {
        let all = self.list(feature);
        let start = page.saturating_mul(EXAMPLES_PER_PAGE).min(all.len());
        let end = (start + EXAMPLES_PER_PAGE).min(all.len());
        all.get(start..end).unwrap_or(&[])
    }

    /// Number of pages for `feature` (at least one)
    #[must_use]
    pub fn page_count(&self, feature: Feature) -> usize {
        self.list(feature).len().div_ceil(EXAMPLES_PER_PAGE).max(1)
    }

    #[must_use]
    pub fn find(&self, feature: Feature, name: &str) -> Option<&ExampleImage> {
        self.list(feature).iter().find(|example| example.name == name)
    }

    /// Read the bytes of a scanned example
    ///
    /// # Errors
    /// - `Validation` if `name` is not part of the gallery
    /// - `Io` if the file disappeared or cannot be read
    pub fn load(&self, feature: Feature, name: &str) -> Result<Vec<u8>> {
        let example = self.find(feature, name).ok_or_else(|| {
            StudioError::validation(format!("Unknown example '{}' for {}", name, feature))
        })?;
        std::fs::read(&example.path)
            .map_err(|e| StudioError::file_io_error("read example", &example.path, &e))
    }
}
