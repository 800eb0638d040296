use argh::FromArgs;
use std::path::PathBuf;

use synthset::{
    batch::{sampling::CameraSampler, BatchConfig, PluginRegistry},
    export::{
        assemble::assemble_archive,
        colmap::{export_colmap, ColmapOptions, PoseSource, SparseLayout},
        idr::export_idr,
        nsvf::{export_nsvf, NsvfAddressing, NsvfOptions, PoseEncoding},
    },
    io::record::{Dataset, ImageSource},
    linalg::quat::QuaternionFormula,
};

/// Convert rendered batches into reconstruction datasets
#[derive(FromArgs)]
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Colmap(ColmapArgs),
    Nsvf(NsvfArgs),
    Idr(IdrArgs),
    Assemble(AssembleArgs),
    Plan(PlanArgs),
}

/// Export a batch as a COLMAP text model
#[derive(FromArgs)]
#[argh(subcommand, name = "colmap")]
struct ColmapArgs {
    /// path to the batch directory
    #[argh(positional)]
    batch: PathBuf,

    /// path to the output directory
    #[argh(positional)]
    output: PathBuf,

    /// read poses from the projection matrices
    #[argh(switch)]
    from_projection: bool,

    /// write the model to sparse/manually_created
    #[argh(switch)]
    manually_created: bool,

    /// use the largest-diagonal quaternion formula
    #[argh(switch)]
    robust_quaternion: bool,

    /// the id of the first image
    #[argh(option, default = "0")]
    first_image_id: u32,
}

/// Export a batch in the NSVF layout
#[derive(FromArgs)]
#[argh(subcommand, name = "nsvf")]
struct NsvfArgs {
    /// path to the batch directory
    #[argh(positional)]
    batch: PathBuf,

    /// path to the output directory
    #[argh(positional)]
    output: PathBuf,

    /// train fraction; names files 0_<idx> and 1_<idx> when set
    #[argh(option)]
    split: Option<f64>,

    /// seed of the train/test split
    #[argh(option)]
    seed: Option<u64>,

    /// write camera-to-world poses instead of projection matrices
    #[argh(switch)]
    camera_to_world: bool,

    /// copy the plain renders instead of the masked images
    #[argh(switch)]
    unmasked: bool,
}

/// Export a batch in the IDR layout
#[derive(FromArgs)]
#[argh(subcommand, name = "idr")]
struct IdrArgs {
    /// path to the batch directory
    #[argh(positional)]
    batch: PathBuf,

    /// path to the output directory
    #[argh(positional)]
    output: PathBuf,
}

/// Pack every batch of a directory into one npz archive
#[derive(FromArgs)]
#[argh(subcommand, name = "assemble")]
struct AssembleArgs {
    /// directory holding the batch_* directories
    #[argh(positional)]
    input: PathBuf,

    /// path to the output .npz file
    #[argh(positional)]
    output: PathBuf,
}

/// Validate a batch configuration and print its camera locations
#[derive(FromArgs)]
#[argh(subcommand, name = "plan")]
struct PlanArgs {
    /// path to the JSON batch configuration
    #[argh(positional)]
    config: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    match args.command {
        Command::Colmap(args) => {
            let dataset = Dataset::from_batch(&args.batch)?;
            let options = ColmapOptions {
                pose_source: if args.from_projection {
                    PoseSource::Projection
                } else {
                    PoseSource::Extrinsics
                },
                first_image_id: args.first_image_id,
                quaternion: if args.robust_quaternion {
                    QuaternionFormula::LargestDiagonal
                } else {
                    QuaternionFormula::Trace
                },
                sparse_layout: if args.manually_created {
                    SparseLayout::ManuallyCreated
                } else {
                    SparseLayout::Numbered
                },
                ..Default::default()
            };
            let report = export_colmap(&dataset, &args.output, &options, None)?;
            log::info!(
                "exported {} images to {}, skipped {:?}",
                report.exported.len(),
                report.sparse_dir.display(),
                report.skipped
            );
        }
        Command::Nsvf(args) => {
            let dataset = Dataset::from_batch(&args.batch)?;
            let options = NsvfOptions {
                addressing: match args.split {
                    Some(fraction) => NsvfAddressing::Split { fraction },
                    None => NsvfAddressing::Plain,
                },
                seed: args.seed,
                pose_encoding: if args.camera_to_world {
                    PoseEncoding::CameraToWorld
                } else {
                    PoseEncoding::LiftedProjection
                },
                image_source: if args.unmasked {
                    ImageSource::Render
                } else {
                    ImageSource::Masked
                },
            };
            let report = export_nsvf(&dataset, &args.output, &options)?;
            log::info!(
                "exported {} views, skipped {:?}",
                report.written.len(),
                report.skipped
            );
        }
        Command::Idr(args) => {
            let dataset = Dataset::from_batch(&args.batch)?;
            let report = export_idr(&dataset, &args.output)?;
            log::info!(
                "exported {} views (normalized: {}), skipped {:?}",
                report.written.len(),
                report.normalized,
                report.skipped
            );
        }
        Command::Assemble(args) => {
            let report = assemble_archive(&args.input, &args.output)?;
            log::info!(
                "packed {} images of {}x{} from {} batches, focal {}",
                report.num_images,
                report.image_size.width,
                report.image_size.height,
                report.batches.len(),
                report.focal
            );
        }
        Command::Plan(args) => {
            let config = BatchConfig::from_file(&args.config)?;
            PluginRegistry::builtin().create_all(&config.plugins)?;

            let mut sampler = CameraSampler::new(config.placement.resolve()?);
            for index in 0..config.num_views {
                let [x, y, z] = sampler.location(index, config.num_views)?;
                println!("{index:03} {x:.6} {y:.6} {z:.6}");
            }
        }
    }

    Ok(())
}
