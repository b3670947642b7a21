//! Voxel-wise image arithmetic with `fslmaths`.
//!
//! [`FslMaths`] collects an ordered list of [`MathOp`]s and only turns them into a command line
//! when [`FslMaths::run`] is given the output path. Operands are checked when they are built, so
//! a bad operand never reaches the tool.
//!
//! ```no_run
//! # use anat_seg_core::fsl::{FslMaths, Operand};
//! # use anat_seg_core::RunContext;
//! # use anat_seg_files::ImageFile;
//! # fn demo(ctx: &RunContext, a: &ImageFile, b: ImageFile) -> anat_seg_core::SegResult<()> {
//! let wm = FslMaths::new(a, None)
//!     .add(Operand::Image(b))
//!     .median_filter()
//!     .run(ctx, std::path::Path::new("wm.nii.gz"), None)?;
//! # Ok(())
//! # }
//! ```

use super::prepare_prefix;
use crate::command::{path_arg, ToolCommand};
use crate::{RunContext, SegError, SegResult};
use anat_seg_files::{with_suffix, ImageFile, DEFAULT_IMAGE_SUFFIX};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Voxel datatypes for `-dt` and `-odt`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    Char,
    Short,
    Int,
    Float,
    Double,
    /// Keep the datatype of the input image.
    Input,
}

impl DataType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Float => "float",
            Self::Double => "double",
            Self::Input => "input",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = SegError;

    fn from_str(s: &str) -> SegResult<Self> {
        match s {
            "char" => Ok(Self::Char),
            "short" => Ok(Self::Short),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "double" => Ok(Self::Double),
            "input" => Ok(Self::Input),
            other => Err(SegError::InvalidInput(format!(
                "unknown datatype: {}",
                other
            ))),
        }
    }
}

/// Right-hand side of a binary operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Scalar(f64),
    Image(ImageFile),
}

impl Operand {
    /// A scalar operand; rejects NaN and infinities.
    pub fn scalar(value: f64) -> SegResult<Self> {
        if !value.is_finite() {
            return Err(SegError::Type(format!("{} is not a finite number", value)));
        }
        Ok(Self::Scalar(value))
    }

    /// Interprets `text` as a number, or failing that as an image path.
    ///
    /// # Errors
    ///
    /// `SegError::Type` if `text` is neither a finite number nor a readable image.
    pub fn parse(text: &str) -> SegResult<Self> {
        if let Ok(value) = text.trim().parse::<f64>() {
            return Self::scalar(value);
        }
        ImageFile::open(Path::new(text)).map(Self::Image).map_err(|err| {
            SegError::Type(format!(
                "{} is neither a number nor an image file ({})",
                text, err
            ))
        })
    }

    fn to_arg(&self) -> String {
        match self {
            Self::Scalar(value) => value.to_string(),
            Self::Image(image) => path_arg(image.path()),
        }
    }
}

impl From<ImageFile> for Operand {
    fn from(image: ImageFile) -> Self {
        Self::Image(image)
    }
}

/// One `fslmaths` operation.
#[derive(Clone, Debug, PartialEq)]
pub enum MathOp {
    ThresholdPercentile(f64),
    Threshold(f64),
    Mask(ImageFile),
    Erode,
    MeanFilter,
    MedianFilter,
    Add(Operand),
    Sub(Operand),
    Mul(Operand),
    Div(Operand),
}

impl MathOp {
    fn push_args(&self, args: &mut Vec<String>) {
        let (flag, value) = match self {
            Self::ThresholdPercentile(pct) => ("-thrP", Some(pct.to_string())),
            Self::Threshold(value) => ("-thr", Some(value.to_string())),
            Self::Mask(mask) => ("-mas", Some(path_arg(mask.path()))),
            Self::Erode => ("-ero", None),
            Self::MeanFilter => ("-fmean", None),
            Self::MedianFilter => ("-fmedian", None),
            Self::Add(operand) => ("-add", Some(operand.to_arg())),
            Self::Sub(operand) => ("-sub", Some(operand.to_arg())),
            Self::Mul(operand) => ("-mul", Some(operand.to_arg())),
            Self::Div(operand) => ("-div", Some(operand.to_arg())),
        };
        args.push(flag.to_string());
        args.extend(value);
    }
}

/// Builder for one `fslmaths` invocation.
#[derive(Clone, Debug)]
pub struct FslMaths {
    image: ImageFile,
    input_dt: Option<DataType>,
    ops: Vec<MathOp>,
}

impl FslMaths {
    /// Starts a pipeline on `image`, optionally forcing the internal datatype.
    pub fn new(image: &ImageFile, input_dt: Option<DataType>) -> Self {
        Self {
            image: image.clone(),
            input_dt,
            ops: Vec::new(),
        }
    }

    pub fn op(mut self, op: MathOp) -> Self {
        self.ops.push(op);
        self
    }

    pub fn ops(&self) -> &[MathOp] {
        &self.ops
    }

    /// Zeroes voxels below `pct` percent of the robust intensity range.
    pub fn threshold_percentile(self, pct: f64) -> Self {
        self.op(MathOp::ThresholdPercentile(pct))
    }

    pub fn threshold(self, value: f64) -> Self {
        self.op(MathOp::Threshold(value))
    }

    pub fn mask(self, mask: ImageFile) -> Self {
        self.op(MathOp::Mask(mask))
    }

    /// Erodes `repeat` times.
    pub fn erode(mut self, repeat: usize) -> Self {
        self.ops.extend(std::iter::repeat(MathOp::Erode).take(repeat));
        self
    }

    pub fn mean_filter(self) -> Self {
        self.op(MathOp::MeanFilter)
    }

    pub fn median_filter(self) -> Self {
        self.op(MathOp::MedianFilter)
    }

    pub fn add(self, operand: impl Into<Operand>) -> Self {
        self.op(MathOp::Add(operand.into()))
    }

    pub fn sub(self, operand: impl Into<Operand>) -> Self {
        self.op(MathOp::Sub(operand.into()))
    }

    pub fn mul(self, operand: impl Into<Operand>) -> Self {
        self.op(MathOp::Mul(operand.into()))
    }

    pub fn div(self, operand: impl Into<Operand>) -> Self {
        self.op(MathOp::Div(operand.into()))
    }

    /// Command that would write to `out` (already resolved to its final file name).
    fn command(&self, out: &Path, output_dt: Option<DataType>) -> ToolCommand {
        let mut args = Vec::new();
        if let Some(dt) = self.input_dt {
            args.push("-dt".to_string());
            args.push(dt.to_string());
        }
        args.push(path_arg(self.image.path()));
        for op in &self.ops {
            op.push_args(&mut args);
        }
        args.push(path_arg(out));
        if let Some(dt) = output_dt {
            args.push("-odt".to_string());
            args.push(dt.to_string());
        }
        ToolCommand::new("fslmaths").args(args)
    }

    /// Runs the accumulated operations and writes `<out prefix>.nii.gz`.
    pub fn run(
        &self,
        ctx: &RunContext,
        out: &Path,
        output_dt: Option<DataType>,
    ) -> SegResult<ImageFile> {
        let out = with_suffix(&prepare_prefix(out)?, DEFAULT_IMAGE_SUFFIX);
        self.command(&out, output_dt).run(ctx)?;
        Ok(ImageFile::open(&out)?)
    }
}
