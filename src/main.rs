mod config;
mod inference;
mod input;
mod metrics;
mod model;
mod pipeline;
mod report;
mod tracing;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::{
    ContainerPaths, DEFAULT_GROUND_TRUTH_DIR, DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR, Device,
    EvalPaths,
};
use crate::inference::IdentityDehazer;
use crate::metrics::frechet::{
    DEFAULT_BATCH_SIZE, DEFAULT_DIMS, DEFAULT_WORKERS, FidParams, FrechetFid, PrecomputedFeatures,
};
use crate::model::final_score::{final_score_from_json, score_or_zero};
use crate::pipeline::stage1_cases::run_stage1;
use crate::pipeline::stage4_fid::calculate_fid_score;
use crate::pipeline::stage5_aggregate::{Stage5Inputs, run_stage5};
use crate::pipeline::stage6_report::{Stage6Input, write_reports};
use crate::pipeline::{PipelineError, evaluate_case};

#[derive(Debug, Parser)]
#[command(name = "dehaze-eval", version, about = "Score dehazed cardiac ultrasound images")]
struct Cli {
    /// Debug-level logging (RUST_LOG overrides).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute per-case metrics, aggregates and the final score.
    Evaluate(EvaluateArgs),
    /// Compute the final score of an aggregates JSON file.
    Score {
        #[arg(long)]
        aggregates: PathBuf,
    },
    /// Run the inference container skeleton.
    Infer {
        #[arg(long, env = "DEHAZE_INPUT", default_value = DEFAULT_INPUT_DIR)]
        input: PathBuf,
        #[arg(long, env = "DEHAZE_OUTPUT", default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,
        #[arg(long, value_enum, default_value_t = Device::Cpu)]
        device: Device,
    },
}

#[derive(Debug, clap::Args)]
struct EvaluateArgs {
    /// Dehazed predictions (plain images or `<name>/output.mha`).
    #[arg(long)]
    predictions: PathBuf,
    /// Original hazy inputs, matched to predictions by case id.
    #[arg(long)]
    hazy: PathBuf,
    /// Ternary masks (255 foreground, 128 background, 0 ignored).
    #[arg(long)]
    masks: PathBuf,
    #[arg(long, env = "DEHAZE_GROUND_TRUTH", default_value = DEFAULT_GROUND_TRUTH_DIR)]
    ground_truth: PathBuf,
    /// JSON object of precomputed feature vectors; without it FID is absent.
    #[arg(long)]
    fid_features: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,
    #[arg(long, value_enum, default_value_t = Device::Cpu)]
    device: Device,
    #[arg(long, default_value_t = DEFAULT_DIMS)]
    dims: usize,
    /// Dice mean measured by an external segmentation model.
    #[arg(long)]
    dice_mean: Option<f64>,
    /// ASD mean measured by an external segmentation model.
    #[arg(long)]
    asd_mean: Option<f64>,
    #[arg(long)]
    out: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    crate::tracing::init(cli.verbose);
    if let Err(err) = run(cli.command) {
        ::tracing::error!("{err}");
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Evaluate(args) => run_evaluate(args).map_err(|e| e.to_string()),
        Command::Score { aggregates } => run_score(&aggregates),
        Command::Infer {
            input,
            output,
            device,
        } => {
            let paths = ContainerPaths { input, output };
            let n = inference::run(&paths, &IdentityDehazer, device).map_err(|e| e.to_string())?;
            ::tracing::info!("wrote {} predictions", n);
            Ok(())
        }
    }
}

fn run_evaluate(args: EvaluateArgs) -> Result<(), PipelineError> {
    let paths = EvalPaths {
        predictions: args.predictions,
        hazy: args.hazy,
        masks: args.masks,
        ground_truth: args.ground_truth,
        out_dir: args.out,
    };
    let params = FidParams {
        batch_size: args.batch_size,
        workers: args.workers,
        device: args.device,
        dims: args.dims,
    };

    let stage1 = run_stage1(&paths)?;

    let mut cases = BTreeMap::new();
    for case in &stage1.cases {
        let metrics = evaluate_case(case)?;
        cases.insert(case.id.clone(), metrics);
    }

    let (fid, fid_source) = match &args.fid_features {
        Some(features_path) => {
            let features = PrecomputedFeatures::load(features_path)?;
            ::tracing::info!(
                "loaded {} precomputed feature vectors from {}",
                features.len(),
                features_path.display()
            );
            let backend = FrechetFid::new(features);
            let fid = calculate_fid_score(
                std::slice::from_ref(&paths.predictions),
                &paths.ground_truth,
                &backend,
                &params,
            )?;
            (Some(fid), format!("precomputed ({})", features_path.display()))
        }
        None => {
            ::tracing::warn!(
                "no --fid-features given; FID is absent for {} prediction files",
                stage1.prediction_files.len()
            );
            (None, "absent".to_string())
        }
    };

    let stage5 = run_stage5(&Stage5Inputs {
        cases: &cases,
        fid,
        dice_mean: args.dice_mean,
        asd_mean: args.asd_mean,
    });

    write_reports(
        &Stage6Input {
            cases: &cases,
            aggregate: &stage5,
            n_cases_with_mask: stage1.cases.iter().filter(|c| c.mask.is_some()).count(),
            n_cases_with_hazy: stage1.cases.iter().filter(|c| c.hazy.is_some()).count(),
            fid_source,
        },
        &paths.out_dir,
    )?;

    println!("{:.6}", stage5.final_score.value);
    Ok(())
}

/// Accepts a bare aggregate record or a `metrics.json` with an `aggregates` key.
fn run_score(path: &Path) -> Result<(), String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| format!("{}: {e}", path.display()))?;
    let record = select_aggregates(&value);
    if let Ok(score) = final_score_from_json(record) {
        ::tracing::info!(
            "group1 {:.4}, group2 {:.4}, group3 {:.4}",
            score.group1,
            score.group2,
            score.group3
        );
    }
    println!("{:.6}", score_or_zero(record));
    Ok(())
}

fn select_aggregates(value: &serde_json::Value) -> &serde_json::Value {
    match value.get("aggregates") {
        Some(inner) if inner.is_object() => inner,
        _ => value,
    }
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
