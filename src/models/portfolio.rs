//! Portfolio listings supplied by the content layer.
//!
//! Sets group images under a title; the gallery only ever sees the flattened,
//! ordered reference list. Per-image fields fall back to the owning set's
//! values when absent.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::MediaRef;

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("failed to read portfolio {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid portfolio JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioImage {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens: Option<String>,
    /// Either a number or a free-form string in the source data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aperture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shutter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSet {
    pub set_title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub other: Option<String>,
    #[serde(default)]
    pub images: Vec<PortfolioImage>,
}

impl PortfolioSet {
    /// Fill the image's missing fields from this set.
    fn inherit(&self, img: &PortfolioImage) -> PortfolioImage {
        let mut merged = img.clone();
        merged.title.get_or_insert_with(|| self.set_title.clone());
        if merged.description.is_none() {
            merged.description = self.description.clone();
        }
        merged.tags.get_or_insert_with(|| self.tags.clone());
        if merged.other.is_none() {
            merged.other = self.other.clone();
        }
        if merged.date.is_none() {
            merged.date = self.year.map(|y| format!("{y}-01-01"));
        }
        merged
    }
}

/// Parses a JSON array of sets.
pub fn load_sets(path: &Path) -> Result<Vec<PortfolioSet>, PortfolioError> {
    let text = std::fs::read_to_string(path).map_err(|source| PortfolioError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let sets: Vec<PortfolioSet> = serde_json::from_str(&text)?;
    debug!(?path, sets = sets.len(), "Loaded portfolio");
    Ok(sets)
}

/// Flattens sets into the ordered reference list consumed by the resolver.
pub fn flatten_sets<'a>(sets: impl IntoIterator<Item = &'a PortfolioSet>) -> Vec<MediaRef> {
    let mut refs = Vec::new();
    for set in sets {
        for img in &set.images {
            let merged = set.inherit(img);
            let metadata = match serde_json::to_value(&merged) {
                Ok(Value::Object(mut map)) => {
                    map.remove("src");
                    map
                }
                Ok(_) => Default::default(),
                Err(e) => {
                    warn!(src = %img.src, error = %e, "Dropping unserializable metadata");
                    Default::default()
                }
            };
            refs.push(MediaRef::new(merged.src.as_str()).with_metadata(metadata));
        }
    }
    refs
}

/// Keeps only the sets whose titles appear in `titles`, preserving set order.
pub fn select_sets<'a>(sets: &'a [PortfolioSet], titles: &[&str]) -> Vec<&'a PortfolioSet> {
    sets.iter()
        .filter(|s| titles.contains(&s.set_title.as_str()))
        .collect()
}
