use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use anat_seg_core::constants::{ATLAS_DIR_ENV, LOG_FILENAME};
use anat_seg_core::workdir::ensure_dir;
use anat_seg_core::{
    resolve_atlas_dir, segment, CoreConfig, LogFile, PipelineConfig, RunContext,
    SegmentationOptions, Toolchain,
};

#[derive(Parser, Debug)]
#[command(name = "anat_seg")]
#[command(version)]
#[command(about = "Segment structural brain MRI into CSF, gray matter and white matter")]
struct Cli {
    /// Input anatomical image (NIfTI)
    #[arg(short = 'i', long)]
    image: PathBuf,
    /// Output directory (created if absent)
    #[arg(short = 'o', long = "output-dir")]
    output_dir: PathBuf,
    /// Fractional intensity threshold (0->1); smaller values give larger brain outlines
    /// [default: 0.5, or 0.3 with --neonate]
    #[arg(short = 'f', long = "frac-int")]
    frac_int: Option<f64>,
    /// Use ANTs' N4 instead of FSL for bias-field correction
    #[arg(long = "N4")]
    n4: bool,
    /// Skip bias-field correction
    #[arg(long = "no-bias")]
    no_bias: bool,
    /// Image type: 1 = T1w, 2 = T2w, 3 = PD [default: 1, or 2 with --neonate]
    #[arg(short = 't', long = "type", value_parser = clap::value_parser!(u8).range(1..=3))]
    modality: Option<u8>,
    /// Number of tissue classes [default: 3, or 5 with --neonate]
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..))]
    classes: Option<u8>,
    /// Tissue prior image, in CSF, GM, WM order (repeat three times)
    #[arg(short = 'p', long = "priors")]
    priors: Vec<PathBuf>,
    /// Atlas-guided segmentation for neonates
    #[arg(long)]
    neonate: bool,
}

impl Cli {
    fn into_options(self) -> SegmentationOptions {
        SegmentationOptions {
            image: self.image,
            out: self.output_dir,
            frac_int: self.frac_int,
            n4: self.n4,
            no_bias: self.no_bias,
            modality: self.modality,
            classes: self.classes,
            priors: self.priors,
            neonate: self.neonate,
        }
    }
}

/// Entry point for the `anat_seg` command.
///
/// With no arguments the help text is printed to stderr and the process exits with status 1.
///
/// # Environment Variables
/// - `ANAT_SEG_ATLAS_DIR`: directory holding the UNC neonatal atlas (or its archive)
/// - `RUST_LOG`: console log filter (default: `anat_seg=info`)
fn main() -> anyhow::Result<()> {
    if std::env::args_os().len() <= 1 {
        eprintln!("{}", Cli::command().render_help());
        std::process::exit(1);
    }
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("anat_seg=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let atlas_override = std::env::var_os(ATLAS_DIR_ENV).map(PathBuf::from);
    let core = CoreConfig::new(resolve_atlas_dir(atlas_override)?);
    let config = PipelineConfig::from_options(cli.into_options())?;

    ensure_dir(config.out_dir())?;
    let log = LogFile::open(&config.out_dir().join(LOG_FILENAME))?;
    log.log(&format!("anat_seg v{}", env!("CARGO_PKG_VERSION")))?;

    tracing::info!("++ anat_seg v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("++ Writing outputs to {}", config.out_dir().display());

    let ctx = RunContext::new(log, Toolchain::from_env());
    let output = segment(&ctx, &config, &core)?;

    for file in output.files() {
        println!("{}", file.display());
    }

    Ok(())
}
