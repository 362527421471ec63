//! Command line parsing and end-to-end runs.

use betarat::{Hyp2F1Choice, Prior};
use betarat_cli::cli::Hyp2F1Arg;
use betarat_cli::{Cli, Command, run};
use clap::Parser;

fn run_to_string(argv: &[&str]) -> String {
    let cli = Cli::try_parse_from(argv).unwrap();
    let mut out = Vec::new();
    run(&cli, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_ppf_defaults() {
    let cli = Cli::try_parse_from(["betarat", "ppf", "5", "5", "10", "10"]).unwrap();
    let Command::Ppf(args) = &cli.command else {
        panic!("expected ppf, got {:?}", cli.command);
    };
    assert_eq!(args.q, 0.05);
    assert!(!args.optim);
    assert_eq!(args.h_init, None);
    assert_eq!(args.table.counts(), (5.0, 5.0, 10.0, 10.0));

    let config = args.table.config().unwrap();
    assert_eq!(config.prior, Prior::UNIFORM);
    assert!(!config.no_inverting);
}

#[test]
fn test_prior_flags() {
    let cli = Cli::try_parse_from(["betarat", "cdf", "1", "2", "3", "4", "--jeff"]).unwrap();
    assert_eq!(cli.command.table().config().unwrap().prior, Prior::JEFFREYS);

    let cli = Cli::try_parse_from(["betarat", "map", "1", "2", "3", "4", "--rare"]).unwrap();
    assert_eq!(cli.command.table().config().unwrap().prior, Prior::RARE);

    let cli = Cli::try_parse_from([
        "betarat", "cdf", "1", "2", "3", "4", "--prior", "0.25", "2", "0.5",
    ])
    .unwrap();
    let Command::Cdf(args) = &cli.command else {
        panic!("expected cdf");
    };
    assert_eq!(args.w, 0.5);
    assert_eq!(args.table.config().unwrap().prior, Prior::new(0.25, 2.0));
}

#[test]
fn test_priors_are_mutually_exclusive() {
    assert!(Cli::try_parse_from(["betarat", "ppf", "1", "2", "3", "4", "--jeff", "--rare"]).is_err());
    assert!(
        Cli::try_parse_from(["betarat", "ppf", "1", "2", "3", "4", "--jeff", "--prior", "1", "1"])
            .is_err()
    );
}

#[test]
fn test_missing_counts_rejected() {
    assert!(Cli::try_parse_from(["betarat", "ppf", "1", "2", "3"]).is_err());
    assert!(Cli::try_parse_from(["betarat", "ppf", "1", "2", "3", "-4"]).is_err());
}

#[test]
fn test_hyp2f1_flag() {
    let cli =
        Cli::try_parse_from(["betarat", "map", "1", "2", "3", "4", "--hyp2f1", "auto"]).unwrap();
    assert_eq!(cli.command.table().hyp2f1, Some(Hyp2F1Arg::Auto));
    assert_eq!(cli.command.table().config().unwrap().hyp2f1, Hyp2F1Choice::Auto);
}

#[test]
fn test_invalid_h_init_is_reported() {
    let cli = Cli::try_parse_from(["betarat", "ppf", "5", "5", "10", "10", "--h-init", "2"]).unwrap();
    let mut out = Vec::new();
    assert!(run(&cli, &mut out).is_err());
}

#[test]
fn test_cdf_run() {
    let output = run_to_string(&["betarat", "cdf", "5", "5", "10", "10"]);
    let value: f64 = output
        .trim()
        .strip_prefix("CDF(1) = ")
        .unwrap()
        .parse()
        .unwrap();
    assert!((value - 0.5).abs() < 1e-4);
}

#[test]
fn test_ppf_optim_run() {
    let output = run_to_string(&["betarat", "ppf", "5", "5", "10", "10", "--optim", "0.5"]);
    let value: f64 = output
        .trim()
        .strip_prefix("PPF(0.5) = ")
        .unwrap()
        .parse()
        .unwrap();
    assert!((value - 1.0).abs() < 1e-3);
}

#[test]
fn test_verbose_run_reports_orientation() {
    let output = run_to_string(&["betarat", "map", "10", "5", "40", "45", "-v", "--log-transformed"]);
    assert!(output.contains("Inverted?: true"), "{output}");
    assert!(output.contains("LT-MAP = "), "{output}");
    assert!(output.contains("Time taken:"), "{output}");
}

#[test]
fn test_config_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("betarat.toml");
    std::fs::write(&path, "no_inverting = true\n\n[prior]\nsuccesses = 0.0\nfailures = 0.0\n").unwrap();

    let cli = Cli::try_parse_from([
        "betarat",
        "cdf",
        "10",
        "5",
        "40",
        "45",
        "--config",
        path.to_str().unwrap(),
        "-v",
    ])
    .unwrap();
    let config = cli.command.table().config().unwrap();
    assert_eq!(config.prior, Prior::NONE);
    assert!(config.no_inverting);

    let mut out = Vec::new();
    run(&cli, &mut out).unwrap();
    assert!(String::from_utf8(out).unwrap().contains("Inverted?: false"));
}
