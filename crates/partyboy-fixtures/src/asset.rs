use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ProvisionError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    RawFile,
    ZipArchive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub source_url: String,
    pub local_name: String,
    pub kind: AssetKind,
}

impl Asset {
    pub fn raw_file(source_url: impl Into<String>, local_name: impl Into<String>) -> Self {
        Asset {
            source_url: source_url.into(),
            local_name: local_name.into(),
            kind: AssetKind::RawFile,
        }
    }

    pub fn zip_archive(source_url: impl Into<String>, canonical_name: impl Into<String>) -> Self {
        Asset {
            source_url: source_url.into(),
            local_name: canonical_name.into(),
            kind: AssetKind::ZipArchive,
        }
    }

    /// Final on-disk form: the file itself, or the normalized directory for archives.
    pub fn final_path(&self, dest_dir: &Path) -> PathBuf {
        dest_dir.join(&self.local_name)
    }

    /// Where the response body is written before any unpacking.
    pub fn download_path(&self, dest_dir: &Path) -> PathBuf {
        match self.kind {
            AssetKind::RawFile => self.final_path(dest_dir),
            AssetKind::ZipArchive => dest_dir.join(format!("{}.zip", self.local_name)),
        }
    }

    pub fn is_present(&self, dest_dir: &Path) -> bool {
        self.final_path(dest_dir).exists()
    }
}

/// Ordered assets with unique local names.
#[derive(Debug, Clone, Default)]
pub struct AssetSet {
    assets: Vec<Asset>,
}

impl AssetSet {
    pub fn new(assets: Vec<Asset>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for asset in &assets {
            if !seen.insert(asset.local_name.as_str()) {
                return Err(ProvisionError::DuplicateAsset {
                    name: asset.local_name.clone(),
                });
            }
        }
        Ok(AssetSet { assets })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Asset> {
        self.assets.iter()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl<'a> IntoIterator for &'a AssetSet {
    type Item = &'a Asset;
    type IntoIter = std::slice::Iter<'a, Asset>;

    fn into_iter(self) -> Self::IntoIter {
        self.assets.iter()
    }
}
