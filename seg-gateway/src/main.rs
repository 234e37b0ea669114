mod client;
mod codec;
mod config;
mod error;
mod http_api;
mod orchestrator;
mod probe;
#[cfg(test)]
mod testutil;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use client::InferenceClient;
use config::Config;
use orchestrator::Orchestrator;
use seg_core::{ModelVariant, RunMode, RunOutput, SegmentationResult};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Inference backend origin. Falls back to SEG_BACKEND_URL, then the
    /// built-in default.
    #[arg(long)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway HTTP server
    Serve {
        #[arg(long, default_value = "0.0.0.0:3000")]
        bind: String,
    },
    /// Check which backend paths respond
    Probe,
    /// Segment one image file and write the returned mask/overlay PNGs
    Segment {
        #[arg(long)]
        image: PathBuf,
        #[arg(long, default_value = "unet")]
        model: String,
        /// Run both model variants concurrently and report both
        #[arg(long)]
        compare: bool,
        /// Directory for the returned PNGs
        #[arg(long, default_value = "out")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = Config::new(Config::resolve_origin(args.backend_url));
    let client = InferenceClient::new(&config)?;
    let orchestrator = Arc::new(Orchestrator::new(client));

    let command = args.command.unwrap_or(Commands::Serve {
        bind: "0.0.0.0:3000".to_string(),
    });

    match command {
        Commands::Serve { bind } => {
            info!(backend = %config.backend_origin, "starting segmentation gateway");
            let state = http_api::AppState::new(&config, orchestrator)?;
            http_api::start_server(&bind, state).await
        }
        Commands::Probe => {
            let probe_client = reqwest::Client::builder()
                .connect_timeout(config.probe_timeout)
                .timeout(config.probe_timeout)
                .build()?;
            let report = probe::probe_backend(&probe_client, &config.backend_origin).await;
            if report.reachable {
                println!("Backend reachable at {}", config.backend_origin);
                println!("Responding paths: {}", report.responding_paths.join(", "));
            } else {
                println!("Backend unreachable at {}", config.backend_origin);
            }
            Ok(())
        }
        Commands::Segment {
            image,
            model,
            compare,
            output,
        } => segment_file(&orchestrator, &image, &model, compare, &output).await,
    }
}

async fn segment_file(
    orchestrator: &Orchestrator,
    image: &Path,
    model: &str,
    compare: bool,
    output: &Path,
) -> anyhow::Result<()> {
    let encoded = codec::encode_image_file(image)?;
    info!(
        backend = orchestrator.client().origin(),
        image = %image.display(),
        "image encoded, submitting"
    );

    let mode = if compare {
        RunMode::Compare
    } else {
        RunMode::Single(ModelVariant::parse(model))
    };

    match orchestrator.run(&encoded, mode).await? {
        RunOutput::Single(result) => {
            let variant = ModelVariant::parse(model);
            write_result(&result, variant, output)?;
            print_metrics(variant.label(), &result);
        }
        RunOutput::Compare(paired) => {
            for variant in ModelVariant::ALL {
                let result = paired.get(variant);
                write_result(result, variant, output)?;
                print_metrics(variant.label(), result);
            }
        }
    }
    Ok(())
}

fn write_result(
    result: &SegmentationResult,
    variant: ModelVariant,
    output: &Path,
) -> error::Result<()> {
    std::fs::create_dir_all(output)?;
    let mask_path = output.join(format!("{}_mask.png", variant.backend_id()));
    let overlay_path = output.join(format!("{}_overlay.png", variant.backend_id()));
    std::fs::write(&mask_path, codec::decode_payload(&result.mask_image)?)?;
    std::fs::write(&overlay_path, codec::decode_payload(&result.segmented_image)?)?;
    println!("Wrote {} and {}", mask_path.display(), overlay_path.display());
    Ok(())
}

fn print_metrics(label: &str, result: &SegmentationResult) {
    println!(
        "{label}: IoU {:.3}  Dice {:.3}  Pixel accuracy {:.3}  ({:.2}s)",
        result.metrics.iou, result.metrics.dice, result.metrics.pixel_accuracy, result.processing_time
    );
}
