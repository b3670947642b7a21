//! Warp composition and convention conversion with `convertwarp`.

use super::{prepare_prefix, WarpConvention, WarpField};
use crate::command::{path_arg, ToolCommand};
use crate::{RunContext, SegResult};
use anat_seg_files::{require_file, with_suffix, ImageFile, DEFAULT_IMAGE_SUFFIX};
use std::path::{Path, PathBuf};

/// Optional extra transforms folded into the output warp.
#[derive(Clone, Debug, Default)]
pub struct WarpComposition {
    /// Applied after the first warp.
    pub warp2: Option<WarpField>,
    /// Affine applied before the first warp.
    pub premat: Option<PathBuf>,
}

/// Writes `<out>.nii.gz`: `warp` (plus any composed transforms) in `convention`.
pub fn convertwarp(
    ctx: &RunContext,
    warp: &WarpField,
    reference: &ImageFile,
    out: &Path,
    compose: &WarpComposition,
    convention: WarpConvention,
) -> SegResult<WarpField> {
    let warp1 = ImageFile::open(&warp.path)?;
    let warp2 = compose
        .warp2
        .as_ref()
        .map(|w| ImageFile::open(&w.path))
        .transpose()?;
    let premat = compose.premat.as_deref().map(require_file).transpose()?;
    let out = with_suffix(&prepare_prefix(out)?, DEFAULT_IMAGE_SUFFIX);

    let mut cmd = ToolCommand::new("convertwarp")
        .arg("-v")
        .arg(format!("--warp1={}", path_arg(warp1.path())))
        .arg(format!("--out={}", path_arg(&out)))
        .arg(format!("--ref={}", path_arg(reference.path())));
    if let Some(warp2) = &warp2 {
        cmd = cmd.arg(format!("--warp2={}", path_arg(warp2.path())));
    }
    if let Some(premat) = &premat {
        cmd = cmd.arg(format!("--premat={}", path_arg(premat)));
    }
    cmd.arg(convention.flag()).run(ctx)?;

    let field = ImageFile::open(&out)?;
    Ok(WarpField::new(field.into_path_buf(), convention))
}
