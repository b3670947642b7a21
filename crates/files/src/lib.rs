//! anat-seg File Guards
//!
//! This crate validates the files handed to and produced by the external neuroimaging tools.
//!
//! ## Design Principles
//!
//! - External tools never validate their inputs, so every image is checked before it is used
//! - An image must exist, carry a recognised suffix, and have a parseable NIfTI-1 header
//! - Output prefixes are derived by stripping recognised suffixes, never arbitrary extensions
//! - Tool-specific suffixes (`_restore`, `_mask`, `_pve_0`, …) are appended to a prefix
//!
//! ## Recognised Formats
//!
//! ```text
//! image.nii.gz      single-file NIfTI, gzipped
//! image.nii         single-file NIfTI
//! image.hdr(.gz)    header of a header/image pair
//! image.img(.gz)    data of a header/image pair (header read from the sibling .hdr)
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use anat_seg_files::{output_prefix, with_suffix, ImageFile};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let image = ImageFile::open(Path::new("sub-01_T1w.nii.gz"))?;
//! let prefix = output_prefix(image.path());
//! let restore = with_suffix(&prefix, "_restore.nii.gz");
//! # Ok(())
//! # }
//! ```

mod constants;
mod image;
mod paths;

pub use constants::{DEFAULT_IMAGE_SUFFIX, IMAGE_SUFFIXES};
pub use image::ImageFile;
pub use paths::{absolute, has_image_suffix, image_suffix, output_prefix, require_file, with_suffix};

use std::path::PathBuf;

/// Errors that can occur while validating or moving files
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// A required file does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The path does not carry a recognised volumetric image suffix
    #[error("Unrecognised or invalid image format: {}", .0.display())]
    InvalidFormat(PathBuf),

    /// The file has an image suffix but its header is not NIfTI
    #[error("Invalid NIfTI header in {}: {source}", path.display())]
    InvalidHeader {
        path: PathBuf,
        #[source]
        source: nifti::NiftiError,
    },

    /// The header parsed but its magic string is not NIfTI-1
    #[error("Invalid NIfTI magic in {}", .0.display())]
    InvalidMagic(PathBuf),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for file guard operations.
pub type FilesResult<T> = Result<T, FilesError>;

/// Minimal NIfTI fixtures shared by this crate's tests and the pipeline crate's tests.
#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::path::Path;

    /// Bytes of a minimal little-endian NIfTI-1 volume (2x2x2, uint8).
    pub fn minimal_nifti_bytes() -> Vec<u8> {
        let mut buf = vec![0u8; 352];
        buf[0..4].copy_from_slice(&348i32.to_le_bytes());
        let dim: [i16; 8] = [3, 2, 2, 2, 1, 1, 1, 1];
        for (i, d) in dim.iter().enumerate() {
            buf[40 + i * 2..42 + i * 2].copy_from_slice(&d.to_le_bytes());
        }
        buf[70..72].copy_from_slice(&2i16.to_le_bytes());
        buf[72..74].copy_from_slice(&8i16.to_le_bytes());
        for i in 0..8 {
            buf[76 + i * 4..80 + i * 4].copy_from_slice(&1.0f32.to_le_bytes());
        }
        buf[108..112].copy_from_slice(&352.0f32.to_le_bytes());
        buf[112..116].copy_from_slice(&1.0f32.to_le_bytes());
        buf[344..348].copy_from_slice(b"n+1\0");
        buf.extend_from_slice(&[0u8; 8]);
        buf
    }

    /// Gzipped minimal NIfTI volume.
    pub fn minimal_nifti_gz() -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&minimal_nifti_bytes()).unwrap();
        enc.finish().unwrap()
    }

    /// Writes a minimal NIfTI volume, gzipped when the path ends in `.gz`.
    ///
    /// Missing parent directories are created.
    pub fn write_nifti(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        if path.to_string_lossy().ends_with(".gz") {
            std::fs::write(path, minimal_nifti_gz()).unwrap();
        } else {
            std::fs::write(path, minimal_nifti_bytes()).unwrap();
        }
    }
}
