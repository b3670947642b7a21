//! UNC neonatal atlas bundle.
//!
//! The bundle is expected at `<atlas root>/UNC_infant_atlas_2020/atlas/templates/`. When the
//! directory is missing but an archive (`UNC.tar.gz`, `UNC.tgz` or `UNC.tar`) sits in the atlas
//! root, it is unpacked in place on first use.

use crate::constants::{
    UNC_ATLAS_ARCHIVES, UNC_ATLAS_DIR_NAME, UNC_TEMPLATE_BRAIN, UNC_TEMPLATE_CSF,
    UNC_TEMPLATE_GM, UNC_TEMPLATE_HEAD, UNC_TEMPLATE_SUBDIR, UNC_TEMPLATE_WM,
};
use crate::{RunContext, SegError, SegResult};
use anat_seg_files::ImageFile;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// The five template volumes of the UNC neonatal atlas.
#[derive(Clone, Debug)]
pub struct UncAtlas {
    /// Full-head template.
    pub head: ImageFile,
    /// Skull-stripped template (with cerebellum).
    pub brain: ImageFile,
    pub gm: ImageFile,
    pub wm: ImageFile,
    pub csf: ImageFile,
}

/// Directory holding the template volumes for an atlas root.
pub fn template_dir(atlas_dir: &Path) -> PathBuf {
    UNC_TEMPLATE_SUBDIR
        .iter()
        .fold(atlas_dir.join(UNC_ATLAS_DIR_NAME), |dir, part| dir.join(part))
}

/// Loads the atlas, unpacking the bundled archive when the templates are not there yet.
///
/// # Errors
///
/// `SegError::AtlasUnavailable` if the templates are missing and no archive provides them.
pub fn load_unc_atlas(ctx: &RunContext, atlas_dir: &Path) -> SegResult<UncAtlas> {
    let templates = template_dir(atlas_dir);

    if !templates_present(&templates) {
        let archive = UNC_ATLAS_ARCHIVES
            .iter()
            .map(|name| atlas_dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                SegError::AtlasUnavailable(format!(
                    "{} not found and no atlas archive in {}",
                    templates.display(),
                    atlas_dir.display()
                ))
            })?;

        tracing::info!("extracting atlas archive {}", archive.display());
        ctx.log()
            .log(&format!("extracting atlas archive {}", archive.display()))?;
        extract_archive(&archive, atlas_dir)?;

        if !templates_present(&templates) {
            return Err(SegError::AtlasUnavailable(format!(
                "{} does not contain {}",
                archive.display(),
                templates.display()
            )));
        }
    }

    let open = |name: &str| ImageFile::open(&templates.join(name));
    Ok(UncAtlas {
        head: open(UNC_TEMPLATE_HEAD)?,
        brain: open(UNC_TEMPLATE_BRAIN)?,
        gm: open(UNC_TEMPLATE_GM)?,
        wm: open(UNC_TEMPLATE_WM)?,
        csf: open(UNC_TEMPLATE_CSF)?,
    })
}

fn templates_present(templates: &Path) -> bool {
    [
        UNC_TEMPLATE_HEAD,
        UNC_TEMPLATE_BRAIN,
        UNC_TEMPLATE_GM,
        UNC_TEMPLATE_WM,
        UNC_TEMPLATE_CSF,
    ]
    .iter()
    .all(|name| templates.join(name).is_file())
}

/// Unpacks a `.tar.gz`, `.tgz` or `.tar` archive into `dest`.
pub fn extract_archive(archive: &Path, dest: &Path) -> SegResult<()> {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let extract_err = |source: std::io::Error| SegError::AtlasExtract {
        path: archive.to_path_buf(),
        source,
    };
    let file = File::open(archive).map_err(extract_err)?;
    let reader: Box<dyn Read> = if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Box::new(GzDecoder::new(file))
    } else if name.ends_with(".tar") {
        Box::new(file)
    } else {
        return Err(SegError::AtlasUnavailable(format!(
            "unsupported archive format: {}",
            archive.display()
        )));
    };

    tar::Archive::new(reader).unpack(dest).map_err(extract_err)
}
