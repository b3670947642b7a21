//! Bias-field correction.
//!
//! Two back ends produce the same output contract, `<prefix>_restore.nii.gz` and
//! `<prefix>_bias_field.nii.gz`:
//! - FSL: `fast -b -B` run in a scratch directory
//! - N4: ANTs' `N4BiasFieldCorrection` (also packaged as `N4`), masked by a loose `bet`
//!
//! Both expect a full-head image; a skull-stripped input gives a poor field estimate.

use crate::command::{path_arg, ToolCommand};
use crate::config::BiasCorrection;
use crate::constants::{
    BIAS_FIELD_SUFFIX, N4_CANDIDATES, N4_CONVERGENCE, N4_HISTOGRAM_SHARPENING, N4_MASK_FRAC_INT,
    N4_SHRINK_FACTOR, N4_SPLINE_DISTANCE, RESTORE_SUFFIX,
};
use crate::fsl::bet;
use crate::workdir::scratch_dir;
use crate::{RunContext, SegError, SegResult};
use anat_seg_files::{with_suffix, ImageFile};
use std::path::{Path, PathBuf};

/// Bias-corrected image and the estimated field.
#[derive(Clone, Debug)]
pub struct BiasCorrected {
    pub restore: ImageFile,
    pub bias_field: ImageFile,
}

/// Corrects `image` with `method`, writing outputs under the prefix of `out`.
///
/// Returns `None` without running anything when `method` is [`BiasCorrection::None`].
pub fn biascorr(
    ctx: &RunContext,
    image: &ImageFile,
    out: &Path,
    method: BiasCorrection,
) -> SegResult<Option<BiasCorrected>> {
    let corrected = match method {
        BiasCorrection::None => return Ok(None),
        BiasCorrection::Fsl => fsl_biascorr(ctx, image, out)?,
        BiasCorrection::N4 => n4_biascorr(ctx, image, out)?,
    };
    tracing::info!(
        "bias-corrected image written to {}",
        corrected.restore.path().display()
    );
    Ok(Some(corrected))
}

fn fsl_biascorr(ctx: &RunContext, image: &ImageFile, out: &Path) -> SegResult<BiasCorrected> {
    let prefix = crate::fsl::prepare_prefix(out)?;
    let scratch = scratch_dir(prefix.parent().unwrap_or(Path::new(".")), "biascorr")?;
    let tmp_prefix = scratch.path().join("fast");

    ToolCommand::new("fast")
        .args(["-b", "-B", "-o"])
        .arg(path_arg(&tmp_prefix))
        .arg(path_arg(image.path()))
        .run(ctx)?;

    collect_outputs(
        &with_suffix(&tmp_prefix, RESTORE_SUFFIX),
        &with_suffix(&tmp_prefix, BIAS_FIELD_SUFFIX),
        &prefix,
    )
}

fn n4_biascorr(ctx: &RunContext, image: &ImageFile, out: &Path) -> SegResult<BiasCorrected> {
    let program = ctx
        .toolchain()
        .first_available(&N4_CANDIDATES)
        .ok_or_else(|| SegError::Dependency(N4_CANDIDATES[0].to_string()))?;

    let prefix = crate::fsl::prepare_prefix(out)?;
    let scratch = scratch_dir(prefix.parent().unwrap_or(Path::new(".")), "biascorr")?;
    let brain = bet(ctx, image, &scratch.path().join("brain"), N4_MASK_FRAC_INT, true)?;
    let mask = brain
        .mask
        .map(|mask| ImageFile::open(&mask))
        .transpose()?
        .ok_or_else(|| SegError::InvalidInput("brain extraction produced no mask".into()))?;

    let tmp_restore: PathBuf = scratch.path().join("restore.nii.gz");
    let tmp_bias: PathBuf = scratch.path().join("bias.nii.gz");

    ToolCommand::new(program)
        .arg("-i")
        .arg(path_arg(image.path()))
        .arg("-x")
        .arg(path_arg(mask.path()))
        .arg("-o")
        .arg(format!(
            "[{},{}]",
            path_arg(&tmp_restore),
            path_arg(&tmp_bias)
        ))
        .args(["-c", N4_CONVERGENCE])
        .args(["-s", N4_SHRINK_FACTOR])
        .args(["-b", N4_HISTOGRAM_SHARPENING])
        .args(["-t", N4_SPLINE_DISTANCE])
        .run(ctx)?;

    collect_outputs(&tmp_restore, &tmp_bias, &prefix)
}

/// Validates the scratch outputs and copies them next to `prefix`.
fn collect_outputs(restore: &Path, bias: &Path, prefix: &Path) -> SegResult<BiasCorrected> {
    let restore = ImageFile::open(restore)?;
    let bias_field = ImageFile::open(bias)?;
    Ok(BiasCorrected {
        restore: restore.copy_to(&with_suffix(prefix, RESTORE_SUFFIX))?,
        bias_field: bias_field.copy_to(&with_suffix(prefix, BIAS_FIELD_SUFFIX))?,
    })
}
