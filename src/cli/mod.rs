// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands each command to its use
// case in Layer 2. Results are reported with println!; progress
// goes through tracing.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, SampleArgs, SynthesizeArgs, TrainArgs, UpscaleArgs};

use crate::infra::pretrained::WeightStatus;

#[derive(Parser, Debug)]
#[command(
    name = "gan-playground",
    version = "0.1.0",
    about = "Train a digit GAN, upscale images with ESRGAN and sample a pretrained DCGAN."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the matching use case; the CLI never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)      => run_train(args),
            Commands::Sample(args)     => run_sample(args),
            Commands::Upscale(args)    => run_upscale(args),
            Commands::Synthesize(args) => run_synthesize(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on digits in: {}", args.data_dir);
    let checkpoint_dir = args.checkpoint_dir.clone();

    let history = TrainUseCase::new(args.into()).execute()?;

    if let Some(last) = history.last() {
        println!(
            "Training complete. Final D(x)={:.3}, D(G(z))={:.3}. Checkpoints in '{}'.",
            last.d_real, last.d_fake, checkpoint_dir
        );
    }
    Ok(())
}

fn run_sample(args: SampleArgs) -> Result<()> {
    use crate::application::sample_use_case::SampleUseCase;

    let path = SampleUseCase::new(args.into()).execute()?;
    println!("Samples written to '{}'", path.display());
    Ok(())
}

fn run_upscale(args: UpscaleArgs) -> Result<()> {
    use crate::application::upscale_use_case::UpscaleUseCase;

    let report = UpscaleUseCase::new(args.into()).execute()?;
    println!(
        "Upscaled image ({}x{}) written to '{}'",
        report.width, report.height, report.output.display()
    );
    if let Some(cmp) = &report.compare {
        println!("Comparison written to '{}'", cmp.display());
    }
    warn_if_random(&report.weights);
    Ok(())
}

fn run_synthesize(args: SynthesizeArgs) -> Result<()> {
    use crate::application::synthesize_use_case::SynthesizeUseCase;

    let (path, status) = SynthesizeUseCase::new(args.into()).execute()?;
    println!("Images written to '{}'", path.display());
    warn_if_random(&status);
    Ok(())
}

fn warn_if_random(status: &WeightStatus) {
    if !status.is_loaded() {
        println!("Note: no pretrained weights were loaded, the output comes from random weights.");
    }
}
