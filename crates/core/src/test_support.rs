//! Test fixtures: stand-in tool executables and run contexts.
//!
//! NIfTI volumes come from `anat_seg_files::test_support`.
//!
//! The stand-in tools are small `sh` scripts that parse the same flags as the real FSL/ANTs
//! binaries and copy a fixture volume to every output path they are asked for. They are written
//! once per test binary so no script is ever being written while another test forks.

use crate::command::Toolchain;
use crate::log::LogFile;
use crate::RunContext;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;

pub use anat_seg_files::test_support::{minimal_nifti_gz, write_nifti};

const BET: &str = r#"#!/bin/sh
cp "@FIXTURE@" "$2.nii.gz" || exit 1
for a in "$@"; do
  if [ "$a" = "-m" ]; then cp "@FIXTURE@" "$2_mask.nii.gz" || exit 1; fi
done
"#;

const FAST: &str = r#"#!/bin/sh
out=""; classes=3; bias=0; prev=""
for a in "$@"; do
  case "$a" in
    --out=*) out="${a#--out=}" ;;
    --class=*) classes="${a#--class=}" ;;
    -b) bias=1 ;;
  esac
  if [ "$prev" = "-o" ]; then out="$a"; fi
  prev="$a"
done
if [ "$bias" = 1 ]; then
  cp "@FIXTURE@" "${out}_restore.nii.gz" && cp "@FIXTURE@" "${out}_bias_field.nii.gz"
  exit $?
fi
i=0
while [ "$i" -lt "$classes" ]; do
  cp "@FIXTURE@" "${out}_pve_${i}.nii.gz" || exit 1
  i=$((i + 1))
done
cp "@FIXTURE@" "${out}_mixeltype.nii.gz" && cp "@FIXTURE@" "${out}_seg.nii.gz" && cp "@FIXTURE@" "${out}_pveseg.nii.gz"
"#;

const FLIRT: &str = r#"#!/bin/sh
prev=""
for a in "$@"; do
  case "$prev" in
    -out) cp "@FIXTURE@" "$a" || exit 1 ;;
    -omat) printf '1 0 0 0\n0 1 0 0\n0 0 1 0\n0 0 0 1\n' > "$a" || exit 1 ;;
  esac
  prev="$a"
done
"#;

const FNIRT: &str = r#"#!/bin/sh
for a in "$@"; do
  case "$a" in
    --iout=*) cp "@FIXTURE@" "${a#--iout=}" || exit 1 ;;
    --fout=*) cp "@FIXTURE@" "${a#--fout=}" || exit 1 ;;
    --cout=*) cp "@FIXTURE@" "${a#--cout=}" || exit 1 ;;
  esac
done
"#;

const WRITE_OUT_FLAG: &str = r#"#!/bin/sh
for a in "$@"; do
  case "$a" in
    --out=*) cp "@FIXTURE@" "${a#--out=}" || exit 1 ;;
  esac
done
"#;

const FSLMATHS: &str = r#"#!/bin/sh
out=""; skip=0
for a in "$@"; do
  if [ "$skip" = 1 ]; then skip=0; continue; fi
  if [ "$a" = "-odt" ]; then skip=1; continue; fi
  out="$a"
done
cp "@FIXTURE@" "$out"
"#;

const N4: &str = r#"#!/bin/sh
prev=""
for a in "$@"; do
  if [ "$prev" = "-o" ]; then
    v="${a#?}"; v="${v%?}"
    cp "@FIXTURE@" "${v%%,*}" && cp "@FIXTURE@" "${v#*,}" || exit 1
  fi
  prev="$a"
done
"#;

const BROKEN: &str = r#"#!/bin/sh
echo "simulated failure" >&2
exit 3
"#;

const SAY: &str = r#"#!/bin/sh
echo "hello stdout $*"
echo "hello stderr" >&2
"#;

const INTERLEAVE: &str = r#"#!/bin/sh
echo "first on stdout"
echo "second on stderr" >&2
echo "third on stdout"
"#;

/// Directories of stand-in executables, one per packaging flavour.
pub struct FakeTools {
    _root: TempDir,
    /// bet, fast, flirt, fnirt, convertwarp, applywarp, fslmaths
    pub fsl: PathBuf,
    /// N4BiasFieldCorrection
    pub ants: PathBuf,
    /// N4 (dHCP packaging)
    pub dhcp: PathBuf,
    /// fast and fslmaths that always fail
    pub broken: PathBuf,
    /// say and interleave (print to both streams), fail (exits 3), not_exec (mode 0644)
    pub misc: PathBuf,
}

fn install(dir: &Path, name: &str, template: &str, fixture: &Path) {
    let path = dir.join(name);
    let script = template.replace("@FIXTURE@", &fixture.to_string_lossy());
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// Returns the shared stand-in tools, creating them on first use.
pub fn fake_tools() -> &'static FakeTools {
    static TOOLS: OnceLock<FakeTools> = OnceLock::new();
    TOOLS.get_or_init(|| {
        let root = TempDir::new().unwrap();
        let fixture = root.path().join("fixture.nii.gz");
        write_nifti(&fixture);

        let dirs: Vec<PathBuf> = ["fsl", "ants", "dhcp", "broken", "misc"]
            .iter()
            .map(|name| {
                let dir = root.path().join(name);
                std::fs::create_dir_all(&dir).unwrap();
                dir
            })
            .collect();

        let fsl = &dirs[0];
        install(fsl, "bet", BET, &fixture);
        install(fsl, "fast", FAST, &fixture);
        install(fsl, "flirt", FLIRT, &fixture);
        install(fsl, "fnirt", FNIRT, &fixture);
        install(fsl, "convertwarp", WRITE_OUT_FLAG, &fixture);
        install(fsl, "applywarp", WRITE_OUT_FLAG, &fixture);
        install(fsl, "fslmaths", FSLMATHS, &fixture);

        install(&dirs[1], "N4BiasFieldCorrection", N4, &fixture);
        install(&dirs[2], "N4", N4, &fixture);

        install(&dirs[3], "fast", BROKEN, &fixture);
        install(&dirs[3], "fslmaths", BROKEN, &fixture);

        install(&dirs[4], "say", SAY, &fixture);
        install(&dirs[4], "interleave", INTERLEAVE, &fixture);
        install(&dirs[4], "fail", BROKEN, &fixture);
        std::fs::write(dirs[4].join("not_exec"), "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(
            dirs[4].join("not_exec"),
            std::fs::Permissions::from_mode(0o644),
        )
        .unwrap();

        FakeTools {
            fsl: dirs[0].clone(),
            ants: dirs[1].clone(),
            dhcp: dirs[2].clone(),
            broken: dirs[3].clone(),
            misc: dirs[4].clone(),
            _root: root,
        }
    })
}

/// Creates a run context logging to `<dir>/anat_seg.log` with the given search path.
pub fn context(dir: &Path, search_path: &[&Path]) -> RunContext {
    std::fs::create_dir_all(dir).unwrap();
    let log = LogFile::open(&dir.join("anat_seg.log")).unwrap();
    let toolchain = Toolchain::with_search_path(search_path.iter().map(|p| p.to_path_buf()));
    RunContext::new(log, toolchain)
}

/// Reads back the log of a context created by [`context`].
pub fn read_log(ctx: &RunContext) -> String {
    std::fs::read_to_string(ctx.log().path()).unwrap()
}
