//! Segmentation pipelines.
//!
//! Both pipelines are straight sequences of tool invocations. Each step feeds the next, and the
//! first failure aborts the run; files written by earlier steps stay on disk.
//!
//! - [`seg`]: generic (adult/paediatric) segmentation
//! - [`neo_seg`]: neonatal segmentation guided by the UNC infant atlas
//!
//! [`segment`] picks one from the configuration and times the run.

use crate::atlas::load_unc_atlas;
use crate::biascorr::biascorr;
use crate::config::{CoreConfig, PipelineConfig};
use crate::constants::{
    ANAT_BRAIN_FILENAME, ANAT_PREFIX, FAST_PREFIX, LINEAR_XFM_FILENAME, NATIVE_CSF_FILENAME,
    NATIVE_GM_FILENAME, NATIVE_WM_FILENAME, NEONATAL_AFFINE_DOF, NONLINEAR_WARP_PREFIX,
    NONLINEAR_XFM_FILENAME, WARPED_CSF_FILENAME, WARPED_GM_FILENAME, WARPED_WM_FILENAME,
};
use crate::fsl::{
    applywarp, bet, convertwarp, fast, flirt, fnirt, FnirtOutputs, FslMaths, MatrixOutput,
    WarpComposition, WarpConvention,
};
use crate::workdir::ensure_dir;
use crate::{RunContext, SegError, SegResult};
use anat_seg_files::ImageFile;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Result of a segmentation run.
#[derive(Clone, Debug)]
pub enum SegmentationOutput {
    /// Classifier outputs as produced: partial-volume maps, then the mixel-type map.
    Generic(Vec<PathBuf>),
    Neonatal(NeonatalTissues),
}

impl SegmentationOutput {
    /// All output files, in reporting order.
    pub fn files(&self) -> Vec<PathBuf> {
        match self {
            Self::Generic(files) => files.clone(),
            Self::Neonatal(tissues) => vec![
                tissues.csf.path().to_path_buf(),
                tissues.gm.path().to_path_buf(),
                tissues.wm.path().to_path_buf(),
                tissues.mixeltype.path().to_path_buf(),
            ],
        }
    }
}

/// Final tissue maps of the neonatal pipeline, in subject space.
#[derive(Clone, Debug)]
pub struct NeonatalTissues {
    pub csf: ImageFile,
    pub gm: ImageFile,
    pub wm: ImageFile,
    pub mixeltype: ImageFile,
}

/// Positions of each tissue in the classifier's ordered output list.
///
/// The neonatal mapping was established empirically for five-class T2w runs with atlas priors;
/// it is checked against the number of outputs before use, not against the classifier's own
/// class semantics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NeonatalOutputMap {
    /// Number of outputs the mapping applies to.
    pub expected: usize,
    pub csf: usize,
    /// Summed, then median filtered.
    pub wm: [usize; 2],
    /// Mean filtered.
    pub gm: usize,
    pub mixeltype: usize,
}

impl NeonatalOutputMap {
    pub const DEFAULT: Self = Self {
        expected: 6,
        csf: 0,
        wm: [1, 2],
        gm: 3,
        mixeltype: 5,
    };

    fn validate(&self, found: usize) -> SegResult<()> {
        let in_range = [self.csf, self.wm[0], self.wm[1], self.gm, self.mixeltype]
            .iter()
            .all(|&index| index < self.expected);
        if !in_range || found != self.expected {
            return Err(SegError::UnexpectedOutputs {
                expected: self.expected,
                found,
            });
        }
        Ok(())
    }
}

impl Default for NeonatalOutputMap {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Runs the pipeline selected by `config`, logging start, end and elapsed time.
pub fn segment(
    ctx: &RunContext,
    config: &PipelineConfig,
    core: &CoreConfig,
) -> SegResult<SegmentationOutput> {
    let pipeline = if config.neonate() { "neonatal" } else { "generic" };
    let started = Instant::now();

    tracing::info!("starting {} segmentation of {}", pipeline, config.image().display());
    ctx.log().log(&format!(
        "starting {} segmentation of {}",
        pipeline,
        config.image().display()
    ))?;

    let output = if config.neonate() {
        SegmentationOutput::Neonatal(neo_seg(ctx, config, core.atlas_dir())?)
    } else {
        SegmentationOutput::Generic(seg(ctx, config)?)
    };

    let elapsed = started.elapsed().as_secs_f64();
    tracing::info!("{} segmentation finished in {:.1}s", pipeline, elapsed);
    ctx.log().log(&format!(
        "{} segmentation finished in {:.1}s",
        pipeline, elapsed
    ))?;
    Ok(output)
}

/// Bias correction (unless disabled), brain extraction and tissue classification.
///
/// Returns the classifier outputs unchanged.
pub fn seg(ctx: &RunContext, config: &PipelineConfig) -> SegResult<Vec<PathBuf>> {
    let out_dir = config.out_dir();
    ensure_dir(out_dir)?;
    let image = ImageFile::open(config.image())?;

    let priors = config
        .priors()
        .map(|[csf, gm, wm]| -> SegResult<[ImageFile; 3]> {
            Ok([
                ImageFile::open(csf)?,
                ImageFile::open(gm)?,
                ImageFile::open(wm)?,
            ])
        })
        .transpose()?;

    let anat = bias_corrected(ctx, config, &image, out_dir)?;
    let brain = bet(
        ctx,
        &anat,
        &out_dir.join(ANAT_BRAIN_FILENAME),
        config.frac_int(),
        true,
    )?;

    let outputs = fast(
        ctx,
        &[brain.brain],
        &out_dir.join(FAST_PREFIX),
        config.modality(),
        config.classes(),
        priors.as_ref(),
    )?;
    Ok(outputs.files())
}

/// Atlas-guided neonatal segmentation.
///
/// The atlas is resolved before anything else, so a missing bundle fails before any tool runs.
pub fn neo_seg(
    ctx: &RunContext,
    config: &PipelineConfig,
    atlas_dir: &Path,
) -> SegResult<NeonatalTissues> {
    let atlas = load_unc_atlas(ctx, atlas_dir)?;

    let out_dir = config.out_dir();
    ensure_dir(out_dir)?;
    let image = ImageFile::open(config.image())?;

    let anat = bias_corrected(ctx, config, &image, out_dir)?;
    let brain = bet(
        ctx,
        &anat,
        &out_dir.join(ANAT_BRAIN_FILENAME),
        config.frac_int(),
        true,
    )?
    .brain;

    let linear = flirt(
        ctx,
        &atlas.brain,
        &brain,
        Some(&out_dir.join(LINEAR_XFM_FILENAME)),
        MatrixOutput::Derived,
        NEONATAL_AFFINE_DOF,
    )?;
    let matrix = linear.matrix.ok_or_else(|| {
        SegError::InvalidInput("linear registration produced no matrix".into())
    })?;

    let nonlinear = fnirt(
        ctx,
        &atlas.head,
        &anat,
        Some(&matrix),
        &out_dir.join(NONLINEAR_XFM_FILENAME),
        FnirtOutputs::all(),
    )?;
    let field = nonlinear.field.ok_or_else(|| {
        SegError::InvalidInput("non-linear registration produced no field".into())
    })?;

    let warp = convertwarp(
        ctx,
        &field,
        &anat,
        &out_dir.join(NONLINEAR_WARP_PREFIX),
        &WarpComposition::default(),
        WarpConvention::Relative,
    )?;

    let warped = |template: &ImageFile, name: &str| {
        applywarp(ctx, template, &brain, &out_dir.join(name), Some(&warp))
    };
    let gm_prior = warped(&atlas.gm, WARPED_GM_FILENAME)?;
    let wm_prior = warped(&atlas.wm, WARPED_WM_FILENAME)?;
    let csf_prior = warped(&atlas.csf, WARPED_CSF_FILENAME)?;

    let outputs = fast(
        ctx,
        std::slice::from_ref(&brain),
        &out_dir.join(FAST_PREFIX),
        config.modality(),
        config.classes(),
        Some(&[csf_prior, gm_prior, wm_prior]),
    )?;

    assemble_neonatal_tissues(ctx, &outputs.files(), out_dir, &NeonatalOutputMap::DEFAULT)
}

/// Builds the final CSF, GM and WM maps from the classifier outputs.
///
/// CSF is moved from its position, GM is mean filtered, and WM is the median-filtered sum of its
/// two components. Running this again over the same outputs gives the same files.
pub fn assemble_neonatal_tissues(
    ctx: &RunContext,
    outputs: &[PathBuf],
    out_dir: &Path,
    map: &NeonatalOutputMap,
) -> SegResult<NeonatalTissues> {
    map.validate(outputs.len())?;

    let csf_dest = out_dir.join(NATIVE_CSF_FILENAME);
    let csf_src = &outputs[map.csf];
    let csf = if !csf_src.exists() && csf_dest.is_file() {
        ImageFile::open(&csf_dest)?
    } else {
        ctx.log().log(&format!(
            "moving {} to {}",
            csf_src.display(),
            csf_dest.display()
        ))?;
        ImageFile::open(csf_src)?.move_to(&csf_dest)?
    };

    let gm = FslMaths::new(&ImageFile::open(&outputs[map.gm])?, None)
        .mean_filter()
        .run(ctx, &out_dir.join(NATIVE_GM_FILENAME), None)?;

    let wm = FslMaths::new(&ImageFile::open(&outputs[map.wm[0]])?, None)
        .add(ImageFile::open(&outputs[map.wm[1]])?)
        .median_filter()
        .run(ctx, &out_dir.join(NATIVE_WM_FILENAME), None)?;

    let mixeltype = ImageFile::open(&outputs[map.mixeltype])?;

    Ok(NeonatalTissues {
        csf,
        gm,
        wm,
        mixeltype,
    })
}

fn bias_corrected(
    ctx: &RunContext,
    config: &PipelineConfig,
    image: &ImageFile,
    out_dir: &Path,
) -> SegResult<ImageFile> {
    Ok(
        match biascorr(ctx, image, &out_dir.join(ANAT_PREFIX), config.bias())? {
            Some(corrected) => corrected.restore,
            None => image.clone(),
        },
    )
}
