//! Tissue classification with `fast`.

use super::prepare_prefix;
use crate::command::{path_arg, ToolCommand};
use crate::config::Modality;
use crate::constants::{MIXEL_MARKER, PVE_MARKER};
use crate::{RunContext, SegError, SegResult};
use anat_seg_files::{has_image_suffix, ImageFile};
use std::path::{Path, PathBuf};

/// Files emitted by one classifier run.
#[derive(Clone, Debug)]
pub struct FastOutputs {
    /// Partial-volume estimates, ordered by class index.
    pub pve: Vec<ImageFile>,
    pub mixeltype: Option<ImageFile>,
}

impl FastOutputs {
    /// Partial-volume maps in order, followed by the mixel-type map.
    pub fn files(&self) -> Vec<PathBuf> {
        self.pve
            .iter()
            .chain(self.mixeltype.iter())
            .map(|image| image.path().to_path_buf())
            .collect()
    }
}

/// Classifies already bias-corrected, skull-stripped `images` into `classes` tissue types.
///
/// Every image is one channel. `priors` are CSF, GM and WM probability maps in subject space.
pub fn fast(
    ctx: &RunContext,
    images: &[ImageFile],
    out: &Path,
    modality: Modality,
    classes: u8,
    priors: Option<&[ImageFile; 3]>,
) -> SegResult<FastOutputs> {
    if images.is_empty() {
        return Err(SegError::InvalidInput(
            "tissue classification needs at least one image".into(),
        ));
    }
    if classes == 0 {
        return Err(SegError::InvalidInput(
            "number of tissue classes must be at least 1".into(),
        ));
    }

    let prefix = prepare_prefix(out)?;
    let mut cmd = ToolCommand::new("fast").args([
        "--nobias".to_string(),
        format!("--channels={}", images.len()),
        format!("--class={}", classes),
        format!("--type={}", modality.code()),
        format!("--out={}", path_arg(&prefix)),
    ]);
    if let Some(priors) = priors {
        cmd = cmd
            .arg("-A")
            .args(priors.iter().map(|prior| path_arg(prior.path())));
    }
    cmd.args(images.iter().map(|image| path_arg(image.path())))
        .run(ctx)?;

    discover_outputs(&prefix, classes)
}

/// Collects `<prefix>_pve_<n>` for `n < classes` and the mixel-type map.
///
/// Maps with a higher index are leftovers of an earlier run with more classes and are ignored.
fn discover_outputs(prefix: &Path, classes: u8) -> SegResult<FastOutputs> {
    let dir = prefix.parent().unwrap_or_else(|| Path::new("."));
    let stem = prefix
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let pve_start = format!("{}{}", stem, PVE_MARKER);
    let mixel_start = format!("{}{}", stem, MIXEL_MARKER);

    let mut pve = Vec::new();
    let mut mixel = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(SegError::DirRead)? {
        let path = entry.map_err(SegError::DirRead)?.path();
        if !path.is_file() || !has_image_suffix(&path) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(rest) = name.strip_prefix(&pve_start) {
            match pve_index(rest) {
                Some(index) if index < u32::from(classes) => pve.push((index, path)),
                _ => tracing::debug!("ignoring stale classifier output {}", path.display()),
            }
        } else if name.starts_with(&mixel_start) {
            mixel.push(path);
        }
    }
    pve.sort();
    mixel.sort();

    tracing::debug!(
        "classifier produced {} partial-volume maps under {}",
        pve.len(),
        prefix.display()
    );

    Ok(FastOutputs {
        pve: pve
            .iter()
            .map(|(_, path)| ImageFile::open(path))
            .collect::<Result<_, _>>()?,
        mixeltype: mixel
            .first()
            .map(|path| ImageFile::open(path))
            .transpose()?,
    })
}

/// Class index at the start of `rest`, e.g. `2` for `2.nii.gz`.
fn pve_index(rest: &str) -> Option<u32> {
    let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    rest[..digits].parse().ok()
}
