use crate::curve::DEFAULT_EXPONENTS;
use crate::DEFAULT_OUTPUT_DIR;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// File the `curve` command writes into its output directory
pub const CURVE_SAMPLES_CSV: &str = "bonding_curve_samples.csv";

#[derive(Parser)]
#[command(about, long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run every scenario through the harness and report on the results.
    Analyze(AnalyzeArgs),
    /// Sample the price curve for a set of exponents and write it as a table.
    Curve(CurveArgs),
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// TOML file with `[[scenario]]` entries. The built-in batch is used when not given.
    #[arg(long)]
    pub scenarios: Option<PathBuf>,

    /// Directory the tables and report are written to.
    #[arg(long, env = "SALE_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Foundry profile the harness runs under.
    #[arg(long, env = "FOUNDRY_PROFILE", default_value = sale_harness::config::DEFAULT_PROFILE)]
    pub profile: String,

    /// The harness executable, resolved on `PATH` if not a path.
    #[arg(long, default_value = sale_harness::config::DEFAULT_BINARY)]
    pub harness_bin: String,

    /// Directory to run the harness in, usually the contracts project root.
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// Replay recorded output from this directory instead of running the harness.
    ///
    /// Recordings are named like the files written by `--keep-raw-output`.
    #[arg(long, conflicts_with_all = ["harness_bin", "project_dir"])]
    pub replay_dir: Option<PathBuf>,

    /// Keep each scenario's raw output next to the report.
    #[arg(long, default_value = "false")]
    pub keep_raw_output: bool,

    /// Log report artifacts that could not be written instead of failing.
    #[arg(long, env = "IGNORE_REPORT_ERRORS", default_value = "false")]
    pub ignore_report_errors: bool,
}

#[derive(Args)]
pub struct CurveArgs {
    /// Curve exponent to sample, can be given multiple times.
    #[arg(long = "exponent", default_values_t = DEFAULT_EXPONENTS)]
    pub exponents: Vec<f64>,

    /// Supply at which the curve reaches its maximum price.
    #[arg(long, default_value = "100000000")]
    pub max_supply: f64,

    /// Price at maximum supply, in ETH.
    #[arg(long, default_value = "0.1")]
    pub max_price: f64,

    /// Number of evenly spaced supply points to sample.
    #[arg(long, default_value = "1000")]
    pub points: usize,

    /// Directory the samples are written to.
    #[arg(long, env = "SALE_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn analyze_defaults() {
        let args = CliArgs::try_parse_from(["sale-summariser", "analyze"]).unwrap();
        let Command::Analyze(args) = args.command else {
            panic!("Expected analyze");
        };

        assert_eq!(None, args.scenarios);
        assert_eq!("forge", args.harness_bin);
        assert!(!args.keep_raw_output);
        assert_eq!(None, args.replay_dir);
    }

    #[test]
    fn replay_conflicts_with_harness_options() {
        let result = CliArgs::try_parse_from([
            "sale-summariser",
            "analyze",
            "--replay-dir",
            "recorded",
            "--harness-bin",
            "/opt/forge",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn repeated_exponents() {
        let args = CliArgs::try_parse_from([
            "sale-summariser",
            "curve",
            "--exponent",
            "1",
            "--exponent",
            "2.5",
            "--points",
            "5",
        ])
        .unwrap();
        let Command::Curve(args) = args.command else {
            panic!("Expected curve");
        };

        assert_eq!(vec![1.0, 2.5], args.exponents);
        assert_eq!(5, args.points);
        assert_eq!(0.1, args.max_price);
    }

    #[test]
    fn curve_default_exponents() {
        let args = CliArgs::try_parse_from(["sale-summariser", "curve"]).unwrap();
        let Command::Curve(args) = args.command else {
            panic!("Expected curve");
        };
        assert_eq!(DEFAULT_EXPONENTS.to_vec(), args.exponents);
    }
}
