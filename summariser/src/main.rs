use anyhow::{anyhow, Context};
use clap::Parser;
use sale_harness::{ForgeHarness, HarnessConfig, ReplayHarness};
use sale_model::{default_scenarios, load_scenario_file};
use sale_summariser::cli::{AnalyzeArgs, CliArgs, Command, CurveArgs, CURVE_SAMPLES_CSV};
use sale_summariser::curve::sample_curves;
use sale_summariser::report::{plain_table, write_csv_file};
use sale_summariser::{run_pipeline, PipelineOptions, PipelineOutput};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    match args.command {
        Command::Analyze(args) => analyze(args),
        Command::Curve(args) => curve(args),
    }
}

fn analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let scenarios = match &args.scenarios {
        Some(path) => load_scenario_file(path)
            .with_context(|| format!("Failed to load scenarios from {}", path.display()))?,
        None => default_scenarios(),
    };
    log::info!("Loaded {} scenarios", scenarios.len());

    let options = PipelineOptions {
        output_dir: args.output_dir.clone(),
        keep_raw_output: args.keep_raw_output,
    };

    let output = match &args.replay_dir {
        Some(dir) => {
            log::info!("Replaying recorded output from {}", dir.display());
            run_pipeline(ReplayHarness::new(dir), &scenarios, &options)?
        }
        None => {
            let mut config = HarnessConfig::default()
                .binary(args.harness_bin.clone())
                .profile(args.profile.clone());
            if let Some(dir) = &args.project_dir {
                config = config.working_dir(dir.clone());
            }
            let harness = ForgeHarness::new(config).context("Cannot run scenarios")?;
            run_pipeline(harness, &scenarios, &options)?
        }
    };

    print_summary(&output)?;

    // If any artifact failed and errors should not explicitly be ignored, return an error
    let failures = &output.report.failures;
    if !failures.is_empty() {
        let error_message = format!(
            "{} out of {} report artifacts failed:\n{:#?}",
            failures.len(),
            failures.len() + output.report.written.len(),
            failures
        );

        if args.ignore_report_errors {
            log::warn!("{}", error_message);
        } else {
            return Err(anyhow!(error_message));
        }
    }

    Ok(())
}

fn print_summary(output: &PipelineOutput) -> anyhow::Result<()> {
    println!("{}", plain_table(&output.dataset.summary)?);
    for skipped in &output.dataset.skipped {
        println!("Skipped {}: {}", skipped.scenario_name, skipped.reason);
    }
    for path in &output.report.written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn curve(args: CurveArgs) -> anyhow::Result<()> {
    let samples = sample_curves(&args.exponents, args.max_supply, args.max_price, args.points)
        .context("Failed to sample curves")?;

    let path = args.output_dir.join(CURVE_SAMPLES_CSV);
    write_csv_file(&path, &samples)?;
    println!("Wrote {}", path.display());

    Ok(())
}
