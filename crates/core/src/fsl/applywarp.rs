//! Resampling through a warp with `applywarp`.

use super::{prepare_prefix, WarpConvention, WarpField};
use crate::command::{path_arg, ToolCommand};
use crate::{RunContext, SegResult};
use anat_seg_files::{with_suffix, ImageFile, DEFAULT_IMAGE_SUFFIX};
use std::path::Path;

/// Resamples `image` into the space of `reference`, through `warp` when given.
///
/// The displacement convention flag follows the warp; without a warp it is absolute.
pub fn applywarp(
    ctx: &RunContext,
    image: &ImageFile,
    reference: &ImageFile,
    out: &Path,
    warp: Option<&WarpField>,
) -> SegResult<ImageFile> {
    let field = warp.map(|w| ImageFile::open(&w.path)).transpose()?;
    let convention = warp.map_or(WarpConvention::Absolute, |w| w.convention);
    let out = with_suffix(&prepare_prefix(out)?, DEFAULT_IMAGE_SUFFIX);

    let mut cmd = ToolCommand::new("applywarp")
        .arg("-v")
        .arg(format!("--in={}", path_arg(image.path())))
        .arg(format!("--ref={}", path_arg(reference.path())))
        .arg(format!("--out={}", path_arg(&out)));
    if let Some(field) = &field {
        cmd = cmd.arg(format!("--warp={}", path_arg(field.path())));
    }
    cmd.arg(convention.flag()).run(ctx)?;

    Ok(ImageFile::open(&out)?)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::{context, fake_tools, read_log, write_nifti};
    use tempfile::TempDir;

    fn image(dir: &Path, name: &str) -> ImageFile {
        let path = dir.join(name);
        write_nifti(&path);
        ImageFile::open(&path).unwrap()
    }

    #[test]
    fn test_applywarp_uses_warp_convention() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path(), &[&fake_tools().fsl]);
        let gm = image(temp.path(), "infant-neo-seg-gm.nii.gz");
        let reference = image(temp.path(), "anat_brain.nii.gz");
        let field = image(temp.path(), "warp.nii.gz");
        let warp = WarpField::new(field.path().to_path_buf(), WarpConvention::Relative);

        let warped = applywarp(
            &ctx,
            &gm,
            &reference,
            &temp.path().join("warped_gm.nii.gz"),
            Some(&warp),
        )
        .unwrap();

        assert_eq!(warped.path().file_name().unwrap(), "warped_gm.nii.gz");
        let expected = format!(
            "applywarp -v --in={} --ref={} --out={} --warp={} --rel",
            gm,
            reference,
            temp.path().join("warped_gm.nii.gz").display(),
            field
        );
        assert!(read_log(&ctx).contains(&expected));
    }

    #[test]
    fn test_applywarp_without_warp_is_absolute() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path(), &[&fake_tools().fsl]);
        let input = image(temp.path(), "input.nii.gz");
        let reference = image(temp.path(), "ref.nii.gz");

        applywarp(&ctx, &input, &reference, &temp.path().join("resampled"), None).unwrap();

        let log = read_log(&ctx);
        assert!(!log.contains("--warp="));
        assert!(log.contains(" --abs\n"));
    }
}
