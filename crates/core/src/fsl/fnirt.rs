//! Non-linear registration with `fnirt`.

use super::{prepare_prefix, WarpConvention, WarpField};
use crate::command::{path_arg, ToolCommand};
use crate::constants::{FIELD_COEFF_SUFFIX, FIELD_SUFFIX};
use crate::{RunContext, SegResult};
use anat_seg_files::{require_file, with_suffix, ImageFile, DEFAULT_IMAGE_SUFFIX};
use std::path::{Path, PathBuf};

/// Which optional outputs to request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FnirtOutputs {
    /// Warped input image, `<prefix>.nii.gz`.
    pub image: bool,
    /// Displacement field, `<prefix>_field.nii.gz`.
    pub field: bool,
    /// Spline coefficients, `<prefix>_field_coeff.nii.gz`.
    pub coefficients: bool,
}

impl FnirtOutputs {
    pub const fn all() -> Self {
        Self {
            image: true,
            field: true,
            coefficients: true,
        }
    }
}

/// Outputs of a non-linear registration; unrequested outputs are `None`.
#[derive(Clone, Debug)]
pub struct NonlinearRegistration {
    pub image: Option<ImageFile>,
    pub field: Option<WarpField>,
    pub coefficients: Option<ImageFile>,
}

/// Non-linearly registers `image` to `reference`, optionally starting from an affine `.mat`.
pub fn fnirt(
    ctx: &RunContext,
    image: &ImageFile,
    reference: &ImageFile,
    affine: Option<&Path>,
    out: &Path,
    outputs: FnirtOutputs,
) -> SegResult<NonlinearRegistration> {
    let affine = affine.map(require_file).transpose()?;
    let prefix = prepare_prefix(out)?;

    let requested = |wanted: bool, suffix: &str| wanted.then(|| with_suffix(&prefix, suffix));
    let image_out = requested(outputs.image, DEFAULT_IMAGE_SUFFIX);
    let field_out = requested(outputs.field, FIELD_SUFFIX);
    let coeff_out = requested(outputs.coefficients, FIELD_COEFF_SUFFIX);

    let mut cmd = ToolCommand::new("fnirt")
        .arg(format!("--in={}", path_arg(image.path())))
        .arg(format!("--ref={}", path_arg(reference.path())))
        .arg("-v");
    let flags: [(&str, Option<&PathBuf>); 4] = [
        ("--aff", affine.as_ref()),
        ("--iout", image_out.as_ref()),
        ("--fout", field_out.as_ref()),
        ("--cout", coeff_out.as_ref()),
    ];
    for (flag, path) in flags {
        if let Some(path) = path {
            cmd = cmd.arg(format!("{}={}", flag, path_arg(path)));
        }
    }
    cmd.run(ctx)?;

    let open = |path: Option<PathBuf>| path.as_deref().map(ImageFile::open).transpose();
    Ok(NonlinearRegistration {
        image: open(image_out)?,
        field: open(field_out)?
            .map(|field| WarpField::new(field.into_path_buf(), WarpConvention::Absolute)),
        coefficients: open(coeff_out)?,
    })
}
