//! Command line definitions.

use std::path::PathBuf;

use anyhow::Result;
use betarat::{Config, Hyp2F1Choice, Prior};
use clap::{Args, Parser, Subcommand, ValueEnum};

const TABLE: &str = "
For the table

                X1   X2
         succ   a    b
         fail   c    d

compute the PPF, CDF or MAP of the Beta ratio distribution X1/X2.";

/// Bayesian contingency table statistics from the ratio of two Beta posteriors
#[derive(Debug, Parser)]
#[command(name = "betarat")]
#[command(version, about, long_about = TABLE)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Quantile ppf(q) of X1/X2
    Ppf(PpfArgs),

    /// Distribution function cdf(w) of X1/X2
    Cdf(CdfArgs),

    /// Mode of X1/X2
    Map(MapArgs),
}

impl Command {
    pub fn table(&self) -> &TableArgs {
        match self {
            Command::Ppf(args) => &args.table,
            Command::Cdf(args) => &args.table,
            Command::Map(args) => &args.table,
        }
    }
}

/// Table counts and model options shared by every subcommand.
#[derive(Debug, Args)]
pub struct TableArgs {
    /// Successes in X1
    pub a: u64,

    /// Successes in X2
    pub b: u64,

    /// Failures in X1
    pub c: u64,

    /// Failures in X2
    pub d: u64,

    /// Beta prior added to both groups [default: 1 1]
    #[arg(long, num_args = 2, value_names = ["SUCC", "FAIL"], group = "prior_choice")]
    pub prior: Option<Vec<f64>>,

    /// Use the Jeffreys prior Beta(0.5, 0.5)
    #[arg(long, group = "prior_choice")]
    pub jeff: bool,

    /// Use the prior Beta(0.5, 1.0): failures more likely than successes
    #[arg(long, group = "prior_choice")]
    pub rare: bool,

    /// Never switch to the X2/X1 orientation for quantiles
    #[arg(long)]
    pub no_inverting: bool,

    /// 2F1 implementation used by the density
    #[arg(long, value_enum)]
    pub hyp2f1: Option<Hyp2F1Arg>,

    /// Debug logging, orientation and timing
    #[arg(short, long)]
    pub verbose: bool,

    /// TOML configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Hyp2F1Arg {
    /// Factored form for integer failure shapes, series otherwise
    Auto,
    /// General series
    Series,
    /// Recursively factored form, integer failure shapes only
    Factored,
}

impl From<Hyp2F1Arg> for Hyp2F1Choice {
    fn from(arg: Hyp2F1Arg) -> Self {
        match arg {
            Hyp2F1Arg::Auto => Hyp2F1Choice::Auto,
            Hyp2F1Arg::Series => Hyp2F1Choice::Series,
            Hyp2F1Arg::Factored => Hyp2F1Choice::Factored,
        }
    }
}

#[derive(Debug, Args)]
pub struct PpfArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Initial step in (0, 1) of the Simpson integrator [default: 0.005]
    #[arg(long)]
    pub h_init: Option<f64>,

    /// Solve cdf(x) = q by root finding instead
    #[arg(long)]
    pub optim: bool,

    /// Quantile level
    #[arg(default_value_t = 0.05)]
    pub q: f64,
}

#[derive(Debug, Args)]
pub struct CdfArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Upper limit of integration
    #[arg(default_value_t = 1.0)]
    pub w: f64,
}

#[derive(Debug, Args)]
pub struct MapArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Mode of the log-transformed density instead
    #[arg(long)]
    pub log_transformed: bool,
}

impl TableArgs {
    /// Configuration file (or defaults) with the flags applied on top.
    pub fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(prior) = &self.prior {
            config.prior = Prior::new(prior[0], prior[1]);
        } else if self.jeff {
            config.prior = Prior::JEFFREYS;
        } else if self.rare {
            config.prior = Prior::RARE;
        }
        if self.no_inverting {
            config.no_inverting = true;
        }
        if let Some(hyp2f1) = self.hyp2f1 {
            config.hyp2f1 = hyp2f1.into();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn counts(&self) -> (f64, f64, f64, f64) {
        (self.a as f64, self.b as f64, self.c as f64, self.d as f64)
    }
}
