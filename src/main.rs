use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};

use hdr_fusion_rs::image_pipeline::{
    AveragingPlan, ExposureSchedule, FusionConfig, HdrConfig, HdrPipeline, OutputConfig, TiffCompression,
};
use hdr_fusion_rs::logger;

use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "hdr-fusion")]
#[command(version, about = "Fuse exposure brackets into HDR images and average repeated acquisitions", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate blank and background-subtracted signal HDR images in an image folder
    Generate {
        /// Folder containing the run's frames
        #[arg(value_name = "DIR")]
        image_dir: PathBuf,

        /// The run has no leading test bracket (blank is the first bracket)
        #[arg(long)]
        skip_test_bracket: bool,

        #[command(flatten)]
        schedule: ScheduleArgs,

        #[command(flatten)]
        fusion: FusionArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Regenerate the HDR images of every cycle in a run folder
    Reprocess {
        /// Run folder containing "NNN - *" cycle folders
        #[arg(value_name = "RUN_DIR")]
        run_dir: PathBuf,

        #[command(flatten)]
        schedule: ScheduleArgs,

        #[command(flatten)]
        fusion: FusionArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Fuse each consecutive bracket of autofocus frames on its own
    Autofocus {
        /// Folder containing the autofocus frames
        #[arg(value_name = "RAW_DIR")]
        raw_dir: PathBuf,

        /// Folder to write the HDR images to
        #[arg(value_name = "OUT_DIR")]
        output_dir: PathBuf,

        #[command(flatten)]
        schedule: ScheduleArgs,

        #[command(flatten)]
        fusion: FusionArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Average repeated blank and signal acquisitions per bracket position
    Average {
        /// Folder containing the acquisitions
        #[arg(value_name = "DIR")]
        image_dir: PathBuf,

        /// Blank exposure suffixes
        #[arg(long, value_name = "CSV", default_value = "6, 12, 18, 24")]
        blank: String,

        /// Signal exposure suffixes
        #[arg(long, value_name = "CSV", default_value = "30, 36, 42, 48")]
        signal: String,

        /// Number of brackets in each acquisition
        #[arg(long, value_name = "N", default_value = "6")]
        brackets: String,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct ScheduleArgs {
    /// Exposure lengths (ms), longest first
    #[arg(long, value_name = "CSV", default_value = "7272, 3636, 1818, 909, 455, 228")]
    exposures: String,

    /// LED intensities (mA), one per exposure
    #[arg(long, value_name = "CSV", default_value = "12.4, 12.4, 12.4, 12.4, 12.4, 12.4")]
    intensities: String,
}

#[derive(Args)]
struct FusionArgs {
    /// Bit depth used for the default saturation threshold [default: read from each frame]
    #[arg(long, value_name = "BITS")]
    bit_depth: Option<u32>,

    /// Raw value above which a pixel counts as saturated
    #[arg(long, value_name = "VALUE")]
    saturation_threshold: Option<u32>,

    /// Bit depth of the written HDR images
    #[arg(long, value_name = "BITS", default_value_t = 16)]
    output_bit_depth: u32,
}

#[derive(Args)]
struct OutputArgs {
    /// TIFF compression of written images
    #[arg(long, value_enum, default_value = "none")]
    compression: CompressionArg,

    /// Apply horizontal differencing before compression
    #[arg(long)]
    predictor: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CompressionArg {
    None,
    Lzw,
    DeflateFast,
    Deflate,
    DeflateBest,
}

impl From<CompressionArg> for TiffCompression {
    fn from(value: CompressionArg) -> Self {
        match value {
            CompressionArg::None => TiffCompression::None,
            CompressionArg::Lzw => TiffCompression::Lzw,
            CompressionArg::DeflateFast => TiffCompression::DeflateFast,
            CompressionArg::Deflate => TiffCompression::DeflateBalanced,
            CompressionArg::DeflateBest => TiffCompression::DeflateBest,
        }
    }
}

impl ScheduleArgs {
    fn parse(&self) -> anyhow::Result<ExposureSchedule> {
        Ok(ExposureSchedule::from_csv(&self.exposures, &self.intensities)?)
    }
}

impl FusionArgs {
    fn parse(&self) -> anyhow::Result<FusionConfig> {
        let mut builder = FusionConfig::builder().target_bit_depth(self.output_bit_depth);
        if let Some(bits) = self.bit_depth {
            builder = builder.source_bit_depth(bits);
        }
        if let Some(threshold) = self.saturation_threshold {
            builder = builder.saturation_threshold(threshold);
        }
        Ok(builder.build()?)
    }
}

impl OutputArgs {
    fn build(&self) -> OutputConfig {
        OutputConfig::builder()
            .compression(self.compression.into())
            .predictor(self.predictor.then_some(2))
            .build()
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Generate {
            image_dir,
            skip_test_bracket,
            schedule,
            fusion,
            output,
        } => {
            let config = HdrConfig::builder()
                .schedule(schedule.parse()?)
                .fusion(fusion.parse()?)
                .output(output.build())
                .skip_test_bracket(skip_test_bracket)
                .build();
            let result = HdrPipeline::new(config)
                .generate_in_place(&image_dir)
                .with_context(|| format!("HDR generation failed for {}", image_dir.display()))?;
            info!(
                unresolved_blank = result.blank_report.unresolved_pixels,
                unresolved_signal = result.signal_report.unresolved_pixels,
                "HDR images written to {}",
                image_dir.display()
            );
        }
        Commands::Reprocess {
            run_dir,
            schedule,
            fusion,
            output,
        } => {
            let config = HdrConfig::builder()
                .schedule(schedule.parse()?)
                .fusion(fusion.parse()?)
                .output(output.build())
                .build();
            let report = HdrPipeline::new(config)
                .reprocess_run_folder(&run_dir)
                .with_context(|| format!("Reprocessing failed for {}", run_dir.display()))?;
            for failure in &report.failures {
                warn!("{}: {}", failure.cycle, failure.error);
            }
            if !report.is_complete() {
                anyhow::bail!(
                    "{} of {} cycles failed",
                    report.failures.len(),
                    report.failures.len() + report.processed.len()
                );
            }
            info!(cycles = report.processed.len(), "Run reprocessed");
        }
        Commands::Autofocus {
            raw_dir,
            output_dir,
            schedule,
            fusion,
            output,
        } => {
            let config = HdrConfig::builder()
                .schedule(schedule.parse()?)
                .fusion(fusion.parse()?)
                .output(output.build())
                .build();
            let written = HdrPipeline::new(config)
                .generate_autofocus_hdr_images(&raw_dir, &output_dir)
                .context("Autofocus HDR generation failed")?;
            info!(images = written.len(), "Autofocus HDR images written");
        }
        Commands::Average {
            image_dir,
            blank,
            signal,
            brackets,
            output,
        } => {
            let plan = AveragingPlan::from_csv(&blank, &signal, &brackets)?;
            let config = HdrConfig::builder().output(output.build()).build();
            let written = HdrPipeline::new(config)
                .average_acquisitions(&image_dir, &plan)
                .with_context(|| format!("Averaging failed for {}", image_dir.display()))?;
            info!(images = written.len(), "Averaged images written");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
