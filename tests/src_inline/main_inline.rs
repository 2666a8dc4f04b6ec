use clap::Parser;
use serde_json::json;

use super::*;

#[test]
fn test_evaluate_args_defaults() {
    let cli = Cli::try_parse_from([
        "dehaze-eval",
        "evaluate",
        "--predictions",
        "pred",
        "--hazy",
        "hazy",
        "--masks",
        "masks",
        "--ground-truth",
        "gt",
        "--out",
        "out",
    ])
    .unwrap();
    assert!(!cli.verbose);
    let Command::Evaluate(args) = cli.command else {
        panic!("expected evaluate");
    };
    assert_eq!(args.predictions, PathBuf::from("pred"));
    assert_eq!(args.ground_truth, PathBuf::from("gt"));
    assert_eq!(args.batch_size, DEFAULT_BATCH_SIZE);
    assert_eq!(args.dims, DEFAULT_DIMS);
    assert_eq!(args.device, Device::Cpu);
    assert_eq!(args.fid_features, None);
    assert_eq!(args.dice_mean, None);
}

#[test]
fn test_infer_device_and_verbose() {
    let cli = Cli::try_parse_from([
        "dehaze-eval",
        "infer",
        "--input",
        "in",
        "--output",
        "out",
        "--device",
        "cuda",
        "-v",
    ])
    .unwrap();
    assert!(cli.verbose);
    match cli.command {
        Command::Infer {
            input,
            output,
            device,
        } => {
            assert_eq!(input, PathBuf::from("in"));
            assert_eq!(output, PathBuf::from("out"));
            assert_eq!(device, Device::Cuda);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_unknown_device_is_rejected() {
    let parsed = Cli::try_parse_from(["dehaze-eval", "infer", "--device", "tpu"]);
    assert!(parsed.is_err());
}

#[test]
fn test_select_aggregates_accepts_both_shapes() {
    let bare = json!({"fid": 20.0});
    assert_eq!(select_aggregates(&bare), &bare);

    let report = json!({"case": {}, "aggregates": {"fid": 20.0}, "final_score": 13.2});
    assert_eq!(select_aggregates(&report), &json!({"fid": 20.0}));

    let odd = json!({"aggregates": 3});
    assert_eq!(select_aggregates(&odd), &odd);
}
