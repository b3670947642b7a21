/// Recognised volumetric image suffixes, longest compound suffix first.
///
/// Order matters: `output_prefix` strips the first suffix in this list that matches, so a
/// two-part extension must come before the single-part extension it ends with.
pub const IMAGE_SUFFIXES: &[&str] = &[".nii.gz", ".hdr.gz", ".img.gz", ".nii", ".hdr", ".img"];

/// Suffix FSL tools write when no explicit image extension is requested.
pub const DEFAULT_IMAGE_SUFFIX: &str = ".nii.gz";

/// Valid NIfTI-1 magic strings (single file and header/image pair).
pub(crate) const NIFTI1_MAGIC: [&[u8; 4]; 2] = [b"n+1\0", b"ni1\0"];
