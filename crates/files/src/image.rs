//! Validated references to volumetric image files.
//!
//! An [`ImageFile`] can only be constructed for a path that exists, carries a recognised image
//! suffix, and whose header parses as NIfTI-1. External tools never validate their inputs, so
//! every image is wrapped in this type before it is placed on a command line.
//!
//! # Header/image pairs
//!
//! For `.img`/`.img.gz` data files the header is read from the sibling `.hdr`/`.hdr.gz`.
//! Copies and moves of a pair carry the companion file along.

use crate::constants::NIFTI1_MAGIC;
use crate::paths::{image_suffix, output_prefix, with_suffix};
use crate::{FilesError, FilesResult};
use nifti::NiftiHeader;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A volumetric image whose existence and header have been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Canonical absolute path to the image
    path: PathBuf,
}

impl ImageFile {
    /// Opens and validates an image file.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - the path does not exist (`NotFound`)
    /// - the suffix is not a recognised image suffix (`InvalidFormat`)
    /// - the header cannot be parsed or has the wrong magic (`InvalidHeader`, `InvalidMagic`)
    pub fn open(path: &Path) -> FilesResult<Self> {
        if !path.is_file() {
            return Err(FilesError::NotFound(path.to_path_buf()));
        }

        let suffix =
            image_suffix(path).ok_or_else(|| FilesError::InvalidFormat(path.to_path_buf()))?;

        let header_path = match suffix {
            ".img" | ".img.gz" => find_companion(path, suffix)
                .ok_or_else(|| FilesError::NotFound(replace_suffix(path, suffix, ".hdr")))?,
            _ => path.to_path_buf(),
        };
        validate_header(&header_path)?;

        Ok(Self {
            path: path.canonicalize()?,
        })
    }

    /// Returns the canonical path of the image.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the image path with its recognised suffix stripped.
    #[must_use]
    pub fn prefix(&self) -> PathBuf {
        output_prefix(&self.path)
    }

    /// Consumes the wrapper and returns the path.
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.path
    }

    /// Copies the image to `dest` and returns the validated copy.
    ///
    /// The destination must carry the same image suffix as the source so the bytes written
    /// match the container the name promises.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidFormat` for a mismatched destination suffix, or an I/O error
    /// if the copy fails.
    pub fn copy_to(&self, dest: &Path) -> FilesResult<ImageFile> {
        let suffix = self.check_destination(dest)?;
        create_parent(dest)?;

        fs::copy(&self.path, dest)?;
        if let Some(companion) = find_companion(&self.path, suffix) {
            let companion_suffix = image_suffix(&companion).unwrap_or(suffix);
            fs::copy(&companion, replace_suffix(dest, suffix, companion_suffix))?;
        }

        ImageFile::open(dest)
    }

    /// Moves the image to `dest` and returns the validated result.
    ///
    /// Falls back to copy-then-remove when a rename is not possible (e.g. across devices).
    ///
    /// # Errors
    ///
    /// Same conditions as [`ImageFile::copy_to`].
    pub fn move_to(self, dest: &Path) -> FilesResult<ImageFile> {
        let suffix = self.check_destination(dest)?;
        create_parent(dest)?;

        let companion = find_companion(&self.path, suffix);
        rename_or_copy(&self.path, dest)?;
        if let Some(companion) = companion {
            let companion_suffix = image_suffix(&companion).unwrap_or(suffix);
            rename_or_copy(&companion, &replace_suffix(dest, suffix, companion_suffix))?;
        }

        ImageFile::open(dest)
    }

    fn check_destination(&self, dest: &Path) -> FilesResult<&'static str> {
        let suffix = image_suffix(&self.path)
            .ok_or_else(|| FilesError::InvalidFormat(self.path.clone()))?;
        if image_suffix(dest) != Some(suffix) {
            return Err(FilesError::InvalidFormat(dest.to_path_buf()));
        }
        Ok(suffix)
    }
}

impl AsRef<Path> for ImageFile {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

fn validate_header(path: &Path) -> FilesResult<()> {
    let header = NiftiHeader::from_file(path).map_err(|source| FilesError::InvalidHeader {
        path: path.to_path_buf(),
        source,
    })?;

    if !NIFTI1_MAGIC.iter().any(|magic| header.magic == **magic) {
        return Err(FilesError::InvalidMagic(path.to_path_buf()));
    }
    Ok(())
}

/// Replaces a known suffix of `path` with `new_suffix`.
fn replace_suffix(path: &Path, suffix: &str, new_suffix: &str) -> PathBuf {
    let raw = path.to_string_lossy();
    let stem = raw.strip_suffix(suffix).unwrap_or(raw.as_ref());
    with_suffix(Path::new(stem), new_suffix)
}

/// Finds the other half of a header/image pair, gzipped or not.
fn find_companion(path: &Path, suffix: &str) -> Option<PathBuf> {
    let candidates: &[&str] = match suffix {
        ".hdr" | ".hdr.gz" => &[".img", ".img.gz"],
        ".img" | ".img.gz" => &[".hdr", ".hdr.gz"],
        _ => return None,
    };
    candidates
        .iter()
        .map(|candidate| replace_suffix(path, suffix, candidate))
        .find(|candidate| candidate.is_file())
}

fn create_parent(dest: &Path) -> FilesResult<()> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn rename_or_copy(src: &Path, dest: &Path) -> FilesResult<()> {
    if fs::rename(src, dest).is_err() {
        fs::copy(src, dest)?;
        fs::remove_file(src)?;
    }
    Ok(())
}
