//! Brain extraction with `bet`.

use super::prepare_prefix;
use crate::command::{path_arg, ToolCommand};
use crate::constants::MASK_SUFFIX;
use crate::{RunContext, SegError, SegResult};
use anat_seg_files::{with_suffix, ImageFile, DEFAULT_IMAGE_SUFFIX};
use std::path::{Path, PathBuf};

/// Outputs of a brain extraction.
#[derive(Clone, Debug)]
pub struct BrainExtraction {
    pub brain: ImageFile,
    /// Predicted `<prefix>_mask.nii.gz`; not checked for existence.
    pub mask: Option<PathBuf>,
}

/// Skull-strips `image` with the robust centre estimation flag.
///
/// `frac_int` is the fractional intensity threshold: smaller values give a larger brain outline.
///
/// # Errors
///
/// `SegError::InvalidInput` if `frac_int` is outside `0..=1`, otherwise any error from running
/// the tool or validating the extracted brain.
pub fn bet(
    ctx: &RunContext,
    image: &ImageFile,
    out: &Path,
    frac_int: f64,
    mask: bool,
) -> SegResult<BrainExtraction> {
    if !(0.0..=1.0).contains(&frac_int) {
        return Err(SegError::InvalidInput(format!(
            "fractional intensity must be between 0 and 1, got {}",
            frac_int
        )));
    }

    let prefix = prepare_prefix(out)?;
    ToolCommand::new("bet")
        .arg(path_arg(image.path()))
        .arg(path_arg(&prefix))
        .args(["-f".to_string(), frac_int.to_string(), "-R".to_string()])
        .arg_if(mask, "-m")
        .run(ctx)?;

    let brain = ImageFile::open(&with_suffix(&prefix, DEFAULT_IMAGE_SUFFIX))?;
    Ok(BrainExtraction {
        brain,
        mask: mask.then(|| with_suffix(&prefix, MASK_SUFFIX)),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::{context, fake_tools, read_log, write_nifti};
    use tempfile::TempDir;

    #[test]
    fn test_bet_with_mask() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path(), &[&fake_tools().fsl]);
        let input = temp.path().join("sub-01_T2w.nii.gz");
        write_nifti(&input);
        let image = ImageFile::open(&input).unwrap();

        let out = temp.path().join("anat_brain.nii.gz");
        let result = bet(&ctx, &image, &out, 0.3, true).unwrap();

        assert_eq!(
            result.brain.path().file_name().unwrap(),
            "anat_brain.nii.gz"
        );
        assert_eq!(result.mask, Some(temp.path().join("anat_brain_mask.nii.gz")));

        let log = read_log(&ctx);
        let expected = format!(
            "bet {} {} -f 0.3 -R -m",
            image.path().display(),
            temp.path().join("anat_brain").display()
        );
        assert!(log.contains(&expected), "log was: {log}");
    }

    #[test]
    fn test_bet_without_mask() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path(), &[&fake_tools().fsl]);
        let input = temp.path().join("input.nii.gz");
        write_nifti(&input);
        let image = ImageFile::open(&input).unwrap();

        let result = bet(&ctx, &image, &temp.path().join("brain"), 0.5, false).unwrap();

        assert!(result.mask.is_none());
        assert!(!temp.path().join("brain_mask.nii.gz").exists());
        assert!(read_log(&ctx).contains("-f 0.5 -R\n"));
    }

    #[test]
    fn test_bet_rejects_frac_out_of_range() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path(), &[&fake_tools().fsl]);
        let input = temp.path().join("input.nii.gz");
        write_nifti(&input);
        let image = ImageFile::open(&input).unwrap();

        let result = bet(&ctx, &image, &temp.path().join("brain"), 1.2, true);
        assert!(matches!(result, Err(SegError::InvalidInput(_))));
        assert!(read_log(&ctx).is_empty());
    }
}
