//! Constants used throughout the anat-seg core crate.
//!
//! This module contains all file names, tool names and fixed tool parameters so the naming
//! contract with downstream consumers lives in one place.

/// Name of the per-run log file created inside the output directory.
pub const LOG_FILENAME: &str = "anat_seg.log";

/// Environment variable overriding the atlas root directory.
pub const ATLAS_DIR_ENV: &str = "ANAT_SEG_ATLAS_DIR";

/// Default directory (relative to the working directory or the workspace) holding atlases.
pub const DEFAULT_ATLAS_DIR: &str = "atlases";

/// Directory name of the unpacked UNC neonatal atlas bundle.
pub const UNC_ATLAS_DIR_NAME: &str = "UNC_infant_atlas_2020";

/// Archive names the UNC neonatal atlas bundle may be distributed under, in lookup order.
pub const UNC_ATLAS_ARCHIVES: [&str; 3] = ["UNC.tar.gz", "UNC.tgz", "UNC.tar"];

/// Path of the template volumes inside the unpacked atlas bundle.
pub const UNC_TEMPLATE_SUBDIR: [&str; 2] = ["atlas", "templates"];

pub const UNC_TEMPLATE_HEAD: &str = "infant-neo-withSkull.nii.gz";
pub const UNC_TEMPLATE_BRAIN: &str = "infant-neo-withCerebellum.nii.gz";
pub const UNC_TEMPLATE_GM: &str = "infant-neo-seg-gm.nii.gz";
pub const UNC_TEMPLATE_WM: &str = "infant-neo-seg-wm.nii.gz";
pub const UNC_TEMPLATE_CSF: &str = "infant-neo-seg-csf.nii.gz";

/// Output prefix of the bias-corrected anatomical image.
pub const ANAT_PREFIX: &str = "anat";

/// Skull-stripped anatomical image.
pub const ANAT_BRAIN_FILENAME: &str = "anat_brain.nii.gz";

/// Output prefix of the tissue classifier.
pub const FAST_PREFIX: &str = "fast_segmentation";

pub const LINEAR_XFM_FILENAME: &str = "template-to-native_space-native_xfm-linear.nii.gz";
pub const NONLINEAR_XFM_FILENAME: &str = "template-to-native_space-native_xfm-nonlinear.nii.gz";
pub const NONLINEAR_WARP_PREFIX: &str = "template-to-native_space-native_xfm-nonlinear_warp";
pub const WARPED_GM_FILENAME: &str =
    "template-to-native_space-native_xfm-nonlinear_tissue-gm.nii.gz";
pub const WARPED_WM_FILENAME: &str =
    "template-to-native_space-native_xfm-nonlinear_tissue-wm.nii.gz";
pub const WARPED_CSF_FILENAME: &str =
    "template-to-native_space-native_xfm-nonlinear_tissue-csf.nii.gz";

/// Final neonatal tissue maps.
pub const NATIVE_CSF_FILENAME: &str = "fast_segmentation_space-native_tissue-csf.nii.gz";
pub const NATIVE_GM_FILENAME: &str = "fast_segmentation_space-native_tissue-gm.nii.gz";
pub const NATIVE_WM_FILENAME: &str = "fast_segmentation_space-native_tissue-wm.nii.gz";

/// Naming-convention suffixes appended to output prefixes.
pub const RESTORE_SUFFIX: &str = "_restore.nii.gz";
pub const BIAS_FIELD_SUFFIX: &str = "_bias_field.nii.gz";
pub const MASK_SUFFIX: &str = "_mask.nii.gz";
pub const PVE_MARKER: &str = "_pve_";
pub const MIXEL_MARKER: &str = "_mixel";
pub const FIELD_SUFFIX: &str = "_field.nii.gz";
pub const FIELD_COEFF_SUFFIX: &str = "_field_coeff.nii.gz";
pub const MATRIX_SUFFIX: &str = ".mat";

/// Executable names of ANTs' N4, in the order they are probed.
pub const N4_CANDIDATES: [&str; 2] = ["N4BiasFieldCorrection", "N4"];

/// Loose fractional intensity used for the rough mask that drives N4.
pub const N4_MASK_FRAC_INT: f64 = 0.1;

/// Fixed N4 optimisation schedule.
pub const N4_CONVERGENCE: &str = "[50x50x50,0.001]";
pub const N4_SHRINK_FACTOR: &str = "2";
pub const N4_HISTOGRAM_SHARPENING: &str = "[100,3]";
pub const N4_SPLINE_DISTANCE: &str = "[0.15,0.01,200]";

/// Degrees of freedom for the template-to-subject affine registration.
pub const NEONATAL_AFFINE_DOF: u8 = 12;

pub const ADULT_FRAC_INT: f64 = 0.5;
pub const NEONATE_FRAC_INT: f64 = 0.3;
pub const ADULT_CLASSES: u8 = 3;
pub const NEONATE_CLASSES: u8 = 5;
