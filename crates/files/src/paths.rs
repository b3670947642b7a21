//! Pure path helpers for the FSL output-prefix naming convention.

use crate::constants::IMAGE_SUFFIXES;
use crate::{FilesError, FilesResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Returns the recognised image suffix of `path`, if any.
///
/// The longest compound suffix wins, so `brain.nii.gz` reports `.nii.gz` rather than `.gz`.
pub fn image_suffix(path: &Path) -> Option<&'static str> {
    let name = path.file_name()?.to_str()?;
    IMAGE_SUFFIXES
        .iter()
        .copied()
        .find(|suffix| name.len() > suffix.len() && name.ends_with(suffix))
}

/// Returns `true` if `path` ends in a recognised volumetric image suffix.
pub fn has_image_suffix(path: &Path) -> bool {
    image_suffix(path).is_some()
}

/// Computes the output prefix FSL tools expect by stripping recognised image suffixes.
///
/// Stripping repeats until no recognised suffix remains, so applying this function to its own
/// output is a no-op. Paths without a recognised suffix are returned unchanged.
///
/// # Examples
///
/// ```
/// use anat_seg_files::output_prefix;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(output_prefix(Path::new("out/anat.nii.gz")), PathBuf::from("out/anat"));
/// assert_eq!(output_prefix(Path::new("out/anat")), PathBuf::from("out/anat"));
/// ```
pub fn output_prefix(path: &Path) -> PathBuf {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return path.to_path_buf();
    };

    let mut stem = name;
    while let Some(suffix) = IMAGE_SUFFIXES
        .iter()
        .find(|suffix| stem.len() > suffix.len() && stem.ends_with(*suffix))
    {
        stem = &stem[..stem.len() - suffix.len()];
    }

    if stem.len() == name.len() {
        return path.to_path_buf();
    }
    path.with_file_name(stem)
}

/// Appends a naming-convention suffix (e.g. `_mask.nii.gz`) to an output prefix.
pub fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = prefix.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Confirms that a regular file exists and returns its canonical path.
///
/// # Errors
///
/// Returns `FilesError::NotFound` if the path does not exist or is not a file.
pub fn require_file(path: &Path) -> FilesResult<PathBuf> {
    if !path.is_file() {
        return Err(FilesError::NotFound(path.to_path_buf()));
    }
    Ok(path.canonicalize()?)
}

/// Returns the absolute form of a path that may not exist yet.
///
/// Unlike `canonicalize`, this does not touch the filesystem beyond reading the current
/// working directory, so it can be used for tool output paths.
pub fn absolute(path: &Path) -> FilesResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_image_suffix_prefers_compound() {
        assert_eq!(image_suffix(Path::new("a/brain.nii.gz")), Some(".nii.gz"));
        assert_eq!(image_suffix(Path::new("a/brain.nii")), Some(".nii"));
        assert_eq!(image_suffix(Path::new("a/brain.hdr.gz")), Some(".hdr.gz"));
        assert_eq!(image_suffix(Path::new("a/brain.img")), Some(".img"));
        assert_eq!(image_suffix(Path::new("a/brain.mat")), None);
        assert_eq!(image_suffix(Path::new("a/brain.gz")), None);
    }

    #[test]
    fn test_bare_suffix_is_not_an_image() {
        assert!(!has_image_suffix(Path::new(".nii")));
        assert!(!has_image_suffix(Path::new("dir/.nii.gz")));
    }

    #[test]
    fn test_output_prefix_strips_compound_suffix() {
        assert_eq!(
            output_prefix(Path::new("/data/out/anat_brain.nii.gz")),
            PathBuf::from("/data/out/anat_brain")
        );
        assert_eq!(
            output_prefix(Path::new("anat_brain.hdr")),
            PathBuf::from("anat_brain")
        );
    }

    #[test]
    fn test_output_prefix_leaves_unknown_extensions() {
        assert_eq!(
            output_prefix(Path::new("xfm/linear.mat")),
            PathBuf::from("xfm/linear.mat")
        );
        assert_eq!(
            output_prefix(Path::new("sub-01.v2")),
            PathBuf::from("sub-01.v2")
        );
    }

    #[test]
    fn test_output_prefix_is_idempotent() {
        let inputs = [
            "out/anat.nii.gz",
            "out/anat.nii",
            "out/anat.nii.nii.gz",
            "out/anat",
            "out/template-to-native_space-native_xfm-nonlinear_warp",
        ];
        for input in inputs {
            let once = output_prefix(Path::new(input));
            let twice = output_prefix(&once);
            assert_eq!(once, twice, "prefix not idempotent for {}", input);
        }
    }

    #[test]
    fn test_with_suffix_appends_to_prefix() {
        let prefix = PathBuf::from("/out/fast_segmentation");
        assert_eq!(
            with_suffix(&prefix, "_pve_0.nii.gz"),
            PathBuf::from("/out/fast_segmentation_pve_0.nii.gz")
        );
    }

    #[test]
    fn test_require_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("xfm.mat");
        std::fs::write(&file, "1 0 0 0\n").unwrap();

        assert!(require_file(&file).unwrap().is_absolute());
        assert!(matches!(
            require_file(&temp.path().join("missing.mat")),
            Err(FilesError::NotFound(_))
        ));
        assert!(matches!(
            require_file(temp.path()),
            Err(FilesError::NotFound(_))
        ));
    }

    #[test]
    fn test_absolute_keeps_absolute_paths() {
        let p = Path::new("/tmp/out/anat.nii.gz");
        assert_eq!(absolute(p).unwrap(), p);
        assert!(absolute(Path::new("relative/anat")).unwrap().is_absolute());
    }
}
