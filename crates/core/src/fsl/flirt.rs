//! Linear (affine) registration with `flirt`.

use super::prepare_prefix;
use crate::command::{path_arg, ToolCommand};
use crate::constants::MATRIX_SUFFIX;
use crate::{RunContext, SegError, SegResult};
use anat_seg_files::{
    absolute, output_prefix, require_file, with_suffix, ImageFile, DEFAULT_IMAGE_SUFFIX,
};
use std::path::{Path, PathBuf};

/// Where the estimated transformation matrix goes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MatrixOutput {
    /// No matrix is written.
    #[default]
    None,
    /// `<out prefix>.mat`, or `xfm-linear_dof-<dof>.mat` next to the input image when there is
    /// no output image.
    Derived,
    /// `<prefix of path>.mat`.
    Path(PathBuf),
}

/// Outputs of a linear registration.
#[derive(Clone, Debug)]
pub struct LinearRegistration {
    pub image: Option<ImageFile>,
    pub matrix: Option<PathBuf>,
}

/// Registers `image` to `reference` with `dof` degrees of freedom.
pub fn flirt(
    ctx: &RunContext,
    image: &ImageFile,
    reference: &ImageFile,
    out: Option<&Path>,
    matrix: MatrixOutput,
    dof: u8,
) -> SegResult<LinearRegistration> {
    if !matches!(dof, 6 | 7 | 9 | 12) {
        return Err(SegError::InvalidInput(format!(
            "degrees of freedom must be 6, 7, 9 or 12, got {}",
            dof
        )));
    }

    let out_image = out
        .map(|out| prepare_prefix(out).map(|prefix| with_suffix(&prefix, DEFAULT_IMAGE_SUFFIX)))
        .transpose()?;

    let matrix_path = match matrix {
        MatrixOutput::None => None,
        MatrixOutput::Derived => Some(match &out_image {
            Some(out_image) => with_suffix(&output_prefix(out_image), MATRIX_SUFFIX),
            None => image
                .path()
                .with_file_name(format!("xfm-linear_dof-{}{}", dof, MATRIX_SUFFIX)),
        }),
        MatrixOutput::Path(path) => Some(with_suffix(
            &absolute(&strip_matrix_suffix(&path))?,
            MATRIX_SUFFIX,
        )),
    };

    let mut cmd = ToolCommand::new("flirt")
        .arg("-in")
        .arg(path_arg(image.path()))
        .arg("-ref")
        .arg(path_arg(reference.path()))
        .arg("-dof")
        .arg(dof.to_string())
        .arg("-v");
    if let Some(out_image) = &out_image {
        cmd = cmd.arg("-out").arg(path_arg(out_image));
    }
    if let Some(matrix_path) = &matrix_path {
        cmd = cmd.arg("-omat").arg(path_arg(matrix_path));
    }
    cmd.run(ctx)?;

    Ok(LinearRegistration {
        image: out_image.as_deref().map(ImageFile::open).transpose()?,
        matrix: matrix_path.as_deref().map(require_file).transpose()?,
    })
}

fn strip_matrix_suffix(path: &Path) -> PathBuf {
    let prefix = output_prefix(path);
    match prefix.to_str().and_then(|p| p.strip_suffix(MATRIX_SUFFIX)) {
        Some(stripped) if !stripped.is_empty() => PathBuf::from(stripped),
        _ => prefix,
    }
}
