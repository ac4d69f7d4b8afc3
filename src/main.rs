use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcret::cli;
use mcret::evaluation::{DEFAULT_LOGIT_SCALE, EXPECTED_CAPTIONS};

#[derive(Parser)]
#[command(name = "mcret")]
#[command(about = "Multicaption video-text retrieval evaluation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute retrieval metrics from pre-extracted feature files
    Eval {
        /// Path to video features (safetensors)
        #[arg(long)]
        video_features: String,

        /// Path to text features (safetensors)
        #[arg(long)]
        text_features: String,

        /// Tensor name inside the video feature file (if it holds several)
        #[arg(long)]
        video_tensor: Option<String>,

        /// Tensor name inside the text feature file (if it holds several)
        #[arg(long)]
        text_tensor: Option<String>,

        /// Captions per video
        #[arg(long, default_value_t = EXPECTED_CAPTIONS)]
        captions_per_item: usize,

        /// Similarity scaling factor
        #[arg(long, default_value_t = DEFAULT_LOGIT_SCALE)]
        logit_scale: f64,

        /// Print metrics as a JSON line instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List available compute devices
    Devices,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcret=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Eval {
            video_features,
            text_features,
            video_tensor,
            text_tensor,
            captions_per_item,
            logit_scale,
            json,
        } => {
            cli::eval(
                video_features,
                text_features,
                video_tensor,
                text_tensor,
                captions_per_item,
                logit_scale,
                json,
            )?;
        }

        Commands::Devices => {
            cli::devices()?;
        }
    }

    Ok(())
}
