//! Wrappers around individual FSL command-line tools.
//!
//! Each wrapper turns a handful of typed parameters into one [`ToolCommand`], runs it through the
//! [`RunContext`], and returns the output files the tool is documented to produce. Inputs are
//! [`ImageFile`]s, so nothing unvalidated reaches a command line.
//!
//! [`ToolCommand`]: crate::command::ToolCommand
//! [`RunContext`]: crate::RunContext
//! [`ImageFile`]: anat_seg_files::ImageFile

pub mod applywarp;
pub mod bet;
pub mod convertwarp;
pub mod fast;
pub mod flirt;
pub mod fnirt;
pub mod fslmaths;

pub use applywarp::applywarp;
pub use bet::{bet, BrainExtraction};
pub use convertwarp::{convertwarp, WarpComposition};
pub use fast::{fast, FastOutputs};
pub use flirt::{flirt, LinearRegistration, MatrixOutput};
pub use fnirt::{fnirt, FnirtOutputs, NonlinearRegistration};
pub use fslmaths::{DataType, FslMaths, MathOp, Operand};

use crate::workdir::ensure_dir;
use crate::SegResult;
use anat_seg_files::{absolute, output_prefix};
use std::path::{Path, PathBuf};

/// Displacement convention of a warp field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarpConvention {
    /// Each voxel holds the destination coordinate.
    Absolute,
    /// Each voxel holds a displacement from its own coordinate.
    Relative,
}

impl WarpConvention {
    /// The `--abs`/`--rel` flag understood by `convertwarp` and `applywarp`.
    pub const fn flag(self) -> &'static str {
        match self {
            Self::Absolute => "--abs",
            Self::Relative => "--rel",
        }
    }
}

/// A displacement-field image tagged with its convention.
///
/// The two conventions are not interchangeable; only `convertwarp` changes one into the other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WarpField {
    pub path: PathBuf,
    pub convention: WarpConvention,
}

impl WarpField {
    pub fn new(path: PathBuf, convention: WarpConvention) -> Self {
        Self { path, convention }
    }
}

/// Absolute output prefix for `out`, with its parent directory created.
pub(crate) fn prepare_prefix(out: &Path) -> SegResult<PathBuf> {
    let prefix = absolute(&output_prefix(out))?;
    if let Some(parent) = prefix.parent() {
        ensure_dir(parent)?;
    }
    Ok(prefix)
}
