//! # anat-seg core
//!
//! Tissue segmentation of structural brain MRI by orchestrating FSL and ANTs.
//!
//! This crate contains the pipeline logic:
//! - Typed wrappers around `bet`, `fast`, `flirt`, `fnirt`, `convertwarp`, `applywarp` and
//!   `fslmaths` ([`fsl`])
//! - Bias-field correction with FSL or N4 ([`biascorr`])
//! - The generic and neonatal pipelines ([`segmentation`])
//!
//! Every voxel-level computation happens in the external tools. Each wrapper and pipeline takes
//! a [`RunContext`] holding the per-run log file and the toolchain used to find executables.
//!
//! **No CLI concerns**: argument parsing and environment handling belong in the `anat_seg`
//! binary.

pub mod atlas;
pub mod biascorr;
pub mod command;
pub mod config;
pub mod constants;
pub mod error;
pub mod fsl;
pub mod log;
pub mod segmentation;
pub mod workdir;

#[cfg(all(test, unix))]
pub(crate) mod test_support;

pub use atlas::{load_unc_atlas, UncAtlas};
pub use biascorr::{biascorr, BiasCorrected};
pub use command::{RunContext, ToolCommand, Toolchain};
pub use config::{
    resolve_atlas_dir, BiasCorrection, CoreConfig, Modality, PipelineConfig, SegmentationOptions,
};
pub use error::{SegError, SegResult};
pub use log::LogFile;
pub use segmentation::{
    neo_seg, seg, segment, NeonatalOutputMap, NeonatalTissues, SegmentationOutput,
};
