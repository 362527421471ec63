//! Subcommand execution.

use std::io::Write;
use std::time::Instant;

use anyhow::Result;
use betarat::{BetaRatio, Config, PpfMethod};
use tracing::info;

use crate::cli::{CdfArgs, Cli, Command, MapArgs, PpfArgs, TableArgs};

/// Run the parsed command, writing its result to `out`.
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    let table = cli.command.table();
    let start = Instant::now();

    match &cli.command {
        Command::Ppf(args) => ppf(args, out)?,
        Command::Cdf(args) => cdf(args, out)?,
        Command::Map(args) => map(args, out)?,
    }

    if table.verbose {
        writeln!(out, "Time taken: {:.3} sec\n", start.elapsed().as_secs_f64())?;
    }
    Ok(())
}

fn build(table: &TableArgs, config: &Config, out: &mut impl Write) -> Result<BetaRatio> {
    let (a, b, c, d) = table.counts();
    let ratio = BetaRatio::from_config(a, b, c, d, config)?;
    info!(%ratio, "distribution ready");
    if table.verbose {
        writeln!(out, "Inverted?: {}", ratio.is_inverted())?;
    }
    Ok(ratio)
}

fn ppf<W: Write>(args: &PpfArgs, out: &mut W) -> Result<()> {
    let mut config = args.table.config()?;
    if let Some(h_init) = args.h_init {
        config.quant.h_init = h_init;
        config.validate()?;
    }
    if !(args.q > 0.0 && args.q < 1.0) {
        anyhow::bail!("q must be in range (0, 1), got {}", args.q);
    }
    let method = if args.optim { PpfMethod::Optim } else { config.ppf_method };

    let ratio = build(&args.table, &config, out)?;
    let result = ratio.ppf(args.q, method, &config)?;

    writeln!(out, "\nPPF({}) = {}\n", args.q, result)?;
    Ok(())
}

fn cdf<W: Write>(args: &CdfArgs, out: &mut W) -> Result<()> {
    let config = args.table.config()?;
    let ratio = build(&args.table, &config, out)?;
    let result = ratio.cdf_with_config(args.w, &config.cdf);

    writeln!(out, "\nCDF({}) = {}\n", args.w, result)?;
    Ok(())
}

fn map<W: Write>(args: &MapArgs, out: &mut W) -> Result<()> {
    let config = args.table.config()?;
    let ratio = build(&args.table, &config, out)?;

    if args.log_transformed {
        let result = ratio.lt_map_with_config(&config.map);
        writeln!(out, "\nLT-MAP = {}\n", result)?;
    } else {
        let result = ratio.map_with_config(&config.map);
        writeln!(out, "\nMAP = {}\n", result)?;
    }
    Ok(())
}
