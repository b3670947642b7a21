//! Core runtime configuration.
//!
//! This module defines configuration that is resolved once at process startup and then passed
//! into the pipelines. Environment variables are read by the binary only; the pipelines receive
//! plain values.
//!
//! Two layers exist:
//! - [`CoreConfig`]: process-wide settings (where the atlas bundle lives)
//! - [`PipelineConfig`]: one segmentation run, built from [`SegmentationOptions`] with the
//!   neonate-dependent defaults applied

use crate::constants::{
    ADULT_CLASSES, ADULT_FRAC_INT, DEFAULT_ATLAS_DIR, NEONATE_CLASSES, NEONATE_FRAC_INT,
    UNC_ATLAS_ARCHIVES, UNC_ATLAS_DIR_NAME,
};
use crate::{SegError, SegResult};
use std::fmt;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    atlas_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(atlas_dir: PathBuf) -> Self {
        Self { atlas_dir }
    }

    /// Directory that holds the atlas bundle (unpacked or archived).
    pub fn atlas_dir(&self) -> &Path {
        &self.atlas_dir
    }
}

/// Resolve the atlas root directory without reading environment variables.
///
/// If `override_dir` is provided, it must be an existing directory. Otherwise this searches for
/// `atlases/` relative to the current working directory and then walks up from
/// `CARGO_MANIFEST_DIR`. When nothing is found the relative default is returned; the neonatal
/// pipeline reports a missing bundle when it actually needs it.
pub fn resolve_atlas_dir(override_dir: Option<PathBuf>) -> SegResult<PathBuf> {
    fn looks_like_atlas_dir(path: &Path) -> bool {
        path.join(UNC_ATLAS_DIR_NAME).is_dir()
            || UNC_ATLAS_ARCHIVES
                .iter()
                .any(|archive| path.join(archive).is_file())
    }

    if let Some(atlas_dir) = override_dir {
        if atlas_dir.is_dir() {
            return Ok(atlas_dir);
        }
        return Err(SegError::InvalidInput(format!(
            "atlas directory override is not a directory: {}",
            atlas_dir.display()
        )));
    }

    let cwd_relative = PathBuf::from(DEFAULT_ATLAS_DIR);
    if looks_like_atlas_dir(&cwd_relative) {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join(DEFAULT_ATLAS_DIR);
        if looks_like_atlas_dir(&candidate) {
            return Ok(candidate);
        }
    }

    Ok(cwd_relative)
}

/// Input image contrast, as understood by the tissue classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Modality {
    T1w,
    T2w,
    Pd,
}

impl Modality {
    /// Numeric code passed to `fast --type`.
    pub const fn code(self) -> u8 {
        match self {
            Self::T1w => 1,
            Self::T2w => 2,
            Self::Pd => 3,
        }
    }
}

impl TryFrom<u8> for Modality {
    type Error = SegError;

    fn try_from(code: u8) -> SegResult<Self> {
        match code {
            1 => Ok(Self::T1w),
            2 => Ok(Self::T2w),
            3 => Ok(Self::Pd),
            other => Err(SegError::InvalidInput(format!(
                "image type must be 1 (T1w), 2 (T2w) or 3 (PD), got {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::T1w => "T1w",
            Self::T2w => "T2w",
            Self::Pd => "PD",
        })
    }
}

/// Bias-field correction method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BiasCorrection {
    /// Skip bias correction entirely.
    None,
    /// FSL's FAST bias estimation.
    #[default]
    Fsl,
    /// ANTs' N4BiasFieldCorrection.
    N4,
}

impl BiasCorrection {
    /// Select the method from the command-line flags. `no_bias` wins over `n4`.
    pub fn from_flags(no_bias: bool, n4: bool) -> Self {
        match (no_bias, n4) {
            (true, _) => Self::None,
            (false, true) => Self::N4,
            (false, false) => Self::Fsl,
        }
    }
}

/// Options for one run as supplied by the caller, before defaults are applied.
#[derive(Clone, Debug, Default)]
pub struct SegmentationOptions {
    pub image: PathBuf,
    pub out: PathBuf,
    pub frac_int: Option<f64>,
    pub n4: bool,
    pub no_bias: bool,
    pub modality: Option<u8>,
    pub classes: Option<u8>,
    pub priors: Vec<PathBuf>,
    pub neonate: bool,
}

/// Fully resolved configuration for one segmentation run.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    image: PathBuf,
    out_dir: PathBuf,
    frac_int: f64,
    bias: BiasCorrection,
    modality: Modality,
    classes: u8,
    priors: Option<[PathBuf; 3]>,
    neonate: bool,
}

impl PipelineConfig {
    /// Apply the neonate-dependent defaults and validate the options.
    ///
    /// Defaults: fractional intensity 0.5 (0.3 for neonates), modality T1w (T2w), classes 3 (5).
    /// Any explicitly supplied value overrides its default.
    ///
    /// # Errors
    ///
    /// Returns `SegError::InvalidInput` if the fractional intensity is outside `0..=1`, the
    /// modality code is unknown, the class count is zero, or priors are supplied but are not
    /// exactly three images.
    pub fn from_options(options: SegmentationOptions) -> SegResult<Self> {
        let (default_frac, default_modality, default_classes) = if options.neonate {
            (NEONATE_FRAC_INT, Modality::T2w, NEONATE_CLASSES)
        } else {
            (ADULT_FRAC_INT, Modality::T1w, ADULT_CLASSES)
        };

        let frac_int = options.frac_int.unwrap_or(default_frac);
        if !(0.0..=1.0).contains(&frac_int) {
            return Err(SegError::InvalidInput(format!(
                "fractional intensity must be between 0 and 1, got {}",
                frac_int
            )));
        }

        let modality = options
            .modality
            .map(Modality::try_from)
            .transpose()?
            .unwrap_or(default_modality);

        let classes = options.classes.unwrap_or(default_classes);
        if classes == 0 {
            return Err(SegError::InvalidInput(
                "number of tissue classes must be at least 1".into(),
            ));
        }

        let priors = match <[PathBuf; 3]>::try_from(options.priors) {
            Ok(priors) => Some(priors),
            Err(priors) if priors.is_empty() => None,
            Err(priors) => {
                return Err(SegError::InvalidInput(format!(
                    "exactly three prior images are required, got {}",
                    priors.len()
                )))
            }
        };

        Ok(Self {
            image: options.image,
            out_dir: options.out,
            frac_int,
            bias: BiasCorrection::from_flags(options.no_bias, options.n4),
            modality,
            classes,
            priors,
            neonate: options.neonate,
        })
    }

    pub fn image(&self) -> &Path {
        &self.image
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn frac_int(&self) -> f64 {
        self.frac_int
    }

    pub fn bias(&self) -> BiasCorrection {
        self.bias
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn classes(&self) -> u8 {
        self.classes
    }

    pub fn priors(&self) -> Option<&[PathBuf; 3]> {
        self.priors.as_ref()
    }

    pub fn neonate(&self) -> bool {
        self.neonate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options(neonate: bool) -> SegmentationOptions {
        SegmentationOptions {
            image: PathBuf::from("sub-01_T1w.nii.gz"),
            out: PathBuf::from("out"),
            neonate,
            ..Default::default()
        }
    }

    #[test]
    fn test_adult_defaults() {
        let config = PipelineConfig::from_options(options(false)).unwrap();

        assert_eq!(config.frac_int(), 0.5);
        assert_eq!(config.modality(), Modality::T1w);
        assert_eq!(config.modality().code(), 1);
        assert_eq!(config.classes(), 3);
        assert_eq!(config.bias(), BiasCorrection::Fsl);
        assert!(config.priors().is_none());
        assert!(!config.neonate());
    }

    #[test]
    fn test_neonate_defaults() {
        let config = PipelineConfig::from_options(options(true)).unwrap();

        assert_eq!(config.frac_int(), 0.3);
        assert_eq!(config.modality(), Modality::T2w);
        assert_eq!(config.modality().code(), 2);
        assert_eq!(config.classes(), 5);
        assert!(config.neonate());
    }

    #[test]
    fn test_explicit_values_override_neonate_defaults() {
        let config = PipelineConfig::from_options(SegmentationOptions {
            frac_int: Some(0.45),
            modality: Some(1),
            classes: Some(4),
            ..options(true)
        })
        .unwrap();

        assert_eq!(config.frac_int(), 0.45);
        assert_eq!(config.modality(), Modality::T1w);
        assert_eq!(config.classes(), 4);
    }

    #[test]
    fn test_single_override_keeps_other_defaults() {
        let config = PipelineConfig::from_options(SegmentationOptions {
            classes: Some(3),
            ..options(true)
        })
        .unwrap();

        assert_eq!(config.frac_int(), 0.3);
        assert_eq!(config.modality(), Modality::T2w);
        assert_eq!(config.classes(), 3);
    }

    #[test]
    fn test_bias_flag_selection() {
        assert_eq!(BiasCorrection::from_flags(false, false), BiasCorrection::Fsl);
        assert_eq!(BiasCorrection::from_flags(false, true), BiasCorrection::N4);
        assert_eq!(BiasCorrection::from_flags(true, false), BiasCorrection::None);
        assert_eq!(BiasCorrection::from_flags(true, true), BiasCorrection::None);
    }

    #[test]
    fn test_invalid_frac_int() {
        let result = PipelineConfig::from_options(SegmentationOptions {
            frac_int: Some(1.5),
            ..options(false)
        });
        assert!(matches!(result, Err(SegError::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_modality_code() {
        let result = PipelineConfig::from_options(SegmentationOptions {
            modality: Some(4),
            ..options(false)
        });
        assert!(matches!(result, Err(SegError::InvalidInput(_))));
    }

    #[test]
    fn test_zero_classes_rejected() {
        let result = PipelineConfig::from_options(SegmentationOptions {
            classes: Some(0),
            ..options(false)
        });
        assert!(matches!(result, Err(SegError::InvalidInput(_))));
    }

    #[test]
    fn test_priors_must_be_three() {
        let two = PipelineConfig::from_options(SegmentationOptions {
            priors: vec![PathBuf::from("csf.nii.gz"), PathBuf::from("gm.nii.gz")],
            ..options(false)
        });
        assert!(matches!(two, Err(SegError::InvalidInput(_))));

        let three = PipelineConfig::from_options(SegmentationOptions {
            priors: vec![
                PathBuf::from("csf.nii.gz"),
                PathBuf::from("gm.nii.gz"),
                PathBuf::from("wm.nii.gz"),
            ],
            ..options(false)
        })
        .unwrap();
        let priors = three.priors().unwrap();
        assert_eq!(priors[0], PathBuf::from("csf.nii.gz"));
        assert_eq!(priors[2], PathBuf::from("wm.nii.gz"));
    }

    #[test]
    fn test_resolve_atlas_dir_override() {
        let temp = TempDir::new().unwrap();
        let resolved = resolve_atlas_dir(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(resolved, temp.path());

        let missing = temp.path().join("missing");
        assert!(matches!(
            resolve_atlas_dir(Some(missing)),
            Err(SegError::InvalidInput(_))
        ));
    }
}
