use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::archive;
use crate::asset::{Asset, AssetKind, AssetSet};
use crate::error::{IoResultExt as _, Result};
use crate::fetch::{Fetch, TrustPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheOutcome {
    Skipped,
    Fetched,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetStatus {
    pub name: String,
    pub kind: AssetKind,
    pub path: PathBuf,
    pub present: bool,
}

/// Presence-only cache over a [`Fetch`] implementation.
///
/// An asset whose final form exists is never fetched or checked again, so a
/// truncated file left by an interrupted download is treated as complete.
pub struct AssetCache<'a> {
    fetcher: &'a dyn Fetch,
    trust: &'a TrustPolicy,
}

impl<'a> AssetCache<'a> {
    pub fn new(fetcher: &'a dyn Fetch, trust: &'a TrustPolicy) -> Self {
        AssetCache { fetcher, trust }
    }

    pub fn ensure(&self, asset: &Asset, dest_dir: &Path) -> Result<CacheOutcome> {
        if asset.is_present(dest_dir) {
            tracing::info!(asset = %asset.local_name, "skipping, already found");
            return Ok(CacheOutcome::Skipped);
        }

        tracing::info!(asset = %asset.local_name, url = %asset.source_url, "fetching");
        let download = asset.download_path(dest_dir);
        let mode = self.trust.mode_for(&asset.source_url);
        self.fetcher.fetch(&asset.source_url, &download, mode)?;

        if asset.kind == AssetKind::ZipArchive {
            archive::normalize(&download, dest_dir, &asset.local_name)?;
        }
        tracing::info!(asset = %asset.local_name, "fetched");
        Ok(CacheOutcome::Fetched)
    }

    /// Ensures every asset in declaration order, stopping at the first failure.
    pub fn provision(
        &self,
        assets: &AssetSet,
        dest_dir: &Path,
    ) -> Result<Vec<(String, CacheOutcome)>> {
        std::fs::create_dir_all(dest_dir)
            .with_io_context(|| format!("create dir {}", dest_dir.display()))?;
        let mut outcomes = Vec::with_capacity(assets.len());
        for asset in assets {
            let outcome = self.ensure(asset, dest_dir)?;
            outcomes.push((asset.local_name.clone(), outcome));
        }
        Ok(outcomes)
    }
}

pub fn status(assets: &AssetSet, dest_dir: &Path) -> Vec<AssetStatus> {
    assets
        .iter()
        .map(|asset| AssetStatus {
            name: asset.local_name.clone(),
            kind: asset.kind,
            path: asset.final_path(dest_dir),
            present: asset.is_present(dest_dir),
        })
        .collect()
}
