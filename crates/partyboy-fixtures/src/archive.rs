use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Component, Path, PathBuf};

use zip::ZipArchive;

use crate::error::{IoResultExt as _, ProvisionError, Result};

#[derive(Debug)]
struct Member {
    index: usize,
    rel: PathBuf,
    is_dir: bool,
}

/// Extracts `zip_path` into `dest_dir`, renames the archive's single top-level
/// directory to `canonical_name` and deletes the archive.
///
/// Not atomic: on failure whatever was already extracted stays on disk, and so
/// does the archive.
pub fn normalize(zip_path: &Path, dest_dir: &Path, canonical_name: &str) -> Result<PathBuf> {
    let f = File::open(zip_path).with_io_context(|| format!("open {}", zip_path.display()))?;
    let mut z = ZipArchive::new(f).map_err(|source| ProvisionError::Archive {
        path: zip_path.to_path_buf(),
        source,
    })?;

    let members = list_members(&mut z, zip_path)?;
    let root = top_level_dir(&members).map_err(|roots| ProvisionError::AmbiguousArchiveLayout {
        path: zip_path.to_path_buf(),
        roots,
    })?;

    let target = dest_dir.join(canonical_name);
    if root != canonical_name && target.exists() {
        return Err(ProvisionError::Io {
            context: format!("rename {root} -> {}", target.display()),
            source: std::io::Error::new(std::io::ErrorKind::AlreadyExists, "target exists"),
        });
    }

    extract(&mut z, zip_path, &members, dest_dir)?;

    if root != canonical_name {
        let extracted = dest_dir.join(&root);
        std::fs::rename(&extracted, &target).with_io_context(|| {
            format!("rename {} -> {}", extracted.display(), target.display())
        })?;
    }
    std::fs::remove_file(zip_path)
        .with_io_context(|| format!("remove {}", zip_path.display()))?;

    tracing::info!(
        archive = %zip_path.display(),
        extracted = %root,
        canonical = canonical_name,
        "normalized archive"
    );
    Ok(target)
}

fn list_members(z: &mut ZipArchive<File>, zip_path: &Path) -> Result<Vec<Member>> {
    let mut out = Vec::with_capacity(z.len());
    for index in 0..z.len() {
        let file = z.by_index(index).map_err(|source| ProvisionError::Archive {
            path: zip_path.to_path_buf(),
            source,
        })?;
        let rel = sanitize_entry(zip_path, file.name())?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        out.push(Member {
            index,
            rel,
            is_dir: file.is_dir(),
        });
    }
    Ok(out)
}

/// The first path component shared by every member, or every distinct first
/// component when there is no single one. A file sitting at the top level
/// means there is no wrapping directory.
fn top_level_dir(members: &[Member]) -> std::result::Result<String, Vec<String>> {
    let mut roots = BTreeSet::new();
    let mut loose_file = false;
    for member in members {
        let mut components = member.rel.components();
        let Some(first) = components.next() else {
            continue;
        };
        roots.insert(first.as_os_str().to_string_lossy().into_owned());
        if !member.is_dir && components.next().is_none() {
            loose_file = true;
        }
    }
    if !loose_file && roots.len() == 1 {
        if let Some(root) = roots.pop_first() {
            return Ok(root);
        }
    }
    Err(roots.into_iter().collect())
}

fn extract(
    z: &mut ZipArchive<File>,
    zip_path: &Path,
    members: &[Member],
    dest_dir: &Path,
) -> Result<()> {
    for member in members {
        let out_path = dest_dir.join(&member.rel);
        if member.is_dir {
            std::fs::create_dir_all(&out_path)
                .with_io_context(|| format!("create dir {}", out_path.display()))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .with_io_context(|| format!("create dir {}", parent.display()))?;
        }
        let mut file = z
            .by_index(member.index)
            .map_err(|source| ProvisionError::Archive {
                path: zip_path.to_path_buf(),
                source,
            })?;
        let mut out = File::create(&out_path)
            .with_io_context(|| format!("create {}", out_path.display()))?;
        std::io::copy(&mut file, &mut out)
            .with_io_context(|| format!("write {}", out_path.display()))?;
    }
    Ok(())
}

fn sanitize_entry(zip_path: &Path, name: &str) -> Result<PathBuf> {
    let unsafe_entry = || ProvisionError::UnsafeArchiveEntry {
        path: zip_path.to_path_buf(),
        entry: name.to_string(),
    };
    let mut out = PathBuf::new();
    for c in Path::new(name).components() {
        match c {
            Component::Prefix(_) | Component::RootDir | Component::ParentDir => {
                return Err(unsafe_entry())
            }
            Component::CurDir => {}
            Component::Normal(p) => out.push(p),
        }
    }
    Ok(out)
}
