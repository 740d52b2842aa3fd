use anyhow::Context;
use polars::prelude::*;
use sale_harness::ReplayHarness;
use sale_model::{PurchaseOutcome, ScenarioSpec};
use sale_summariser::report::{NARRATIVE_MD, PURCHASE_CSV, REPORT_JSON, SUMMARY_CSV};
use sale_summariser::{
    run_pipeline, AggregateError, PipelineOptions, SkipReason, RAW_OUTPUT_DIR, SCENARIO,
    TOKENS_PER_ETH,
};
use std::path::{Path, PathBuf};

const STANDARD: &str = include_str!("../test_data/standard_sale.log");
const QUADRATIC: &str = include_str!("../test_data/quadratic_sale.log");
const COMPILE_FAILURE: &str = include_str!("../test_data/compile_failure.log");

fn scenarios() -> Vec<ScenarioSpec> {
    vec![
        ScenarioSpec::new("Standard"),
        ScenarioSpec::new("Quadratic Curve").with_param("exponent", 2_000_000_000_000_000_000u128),
        ScenarioSpec::new("Broken Build").with_param("initial_tokens", 500u64),
        ScenarioSpec::new("Never Recorded"),
    ]
}

/// Lay out recordings the way the replay harness expects them
fn record(dir: &Path, outputs: &[(&ScenarioSpec, &str)]) -> ReplayHarness {
    let harness = ReplayHarness::new(dir);
    for (spec, text) in outputs {
        std::fs::write(harness.recording_path(spec), text).unwrap();
    }
    harness
}

fn recorded_batch(dir: &Path) -> (Vec<ScenarioSpec>, ReplayHarness) {
    let specs = scenarios();
    let harness = record(
        dir,
        &[
            (&specs[0], STANDARD),
            (&specs[1], QUADRATIC),
            (&specs[2], COMPILE_FAILURE),
        ],
    );
    (specs, harness)
}

fn options(output_dir: PathBuf) -> PipelineOptions {
    PipelineOptions {
        output_dir,
        keep_raw_output: false,
    }
}

fn str_values(frame: &DataFrame, column: &str) -> Vec<String> {
    frame
        .column(column)
        .unwrap()
        .str()
        .unwrap()
        .into_no_null_iter()
        .map(str::to_string)
        .collect()
}

#[test]
fn replayed_batch() -> anyhow::Result<()> {
    env_logger::try_init().ok();

    let recordings = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    let (specs, harness) = recorded_batch(recordings.path());

    let output = run_pipeline(harness, &specs, &options(out.path().to_path_buf()))?;

    let dataset = &output.dataset;
    assert_eq!(
        vec!["Standard", "Quadratic Curve"],
        str_values(&dataset.summary, SCENARIO)
    );
    assert_eq!(
        vec!["100000000000000", "100000000000000"],
        str_values(&dataset.summary, "Initial Price (wei)")
    );

    assert_eq!(2, dataset.skipped.len());
    assert_eq!("Broken Build", dataset.skipped[0].scenario_name);
    assert_eq!(
        SkipReason::NoSummary { exit_code: Some(0) },
        dataset.skipped[0].reason
    );
    assert_eq!("Never Recorded", dataset.skipped[1].scenario_name);
    assert!(matches!(
        dataset.skipped[1].reason,
        SkipReason::LaunchFailed(_)
    ));

    // Purchases stay with the scenario that made them
    assert_eq!(
        vec!["Standard", "Standard", "Standard", "Quadratic Curve", "Quadratic Curve"],
        str_values(&dataset.purchases, "scenario")
    );
    assert_eq!(
        PurchaseOutcome::Complete { count: 3 },
        dataset.results[0].purchase_outcome()
    );
    assert_eq!(
        PurchaseOutcome::Incomplete {
            parsed: 2,
            dropped: 1
        },
        dataset.results[1].purchase_outcome()
    );

    let ratios = output
        .enriched
        .purchases
        .column(TOKENS_PER_ETH)?
        .f64()?
        .into_no_null_iter()
        .collect::<Vec<_>>();
    assert!((ratios[0] - 40.0).abs() < 1e-9);
    assert!(ratios[4].is_nan());

    let eth_raised = output
        .enriched
        .stats
        .get("ETH Raised (ETH)")
        .context("ETH raised stats")?;
    assert!((eth_raised.mean - 30.0).abs() < 1e-9);
    assert!((eth_raised.min - 10.0).abs() < 1e-9);
    assert!((eth_raised.max - 50.0).abs() < 1e-9);

    assert!(output.report.is_complete());
    for artifact in [SUMMARY_CSV, PURCHASE_CSV, NARRATIVE_MD, REPORT_JSON] {
        assert!(out.path().join(artifact).is_file(), "{artifact} missing");
    }

    let narrative = std::fs::read_to_string(out.path().join(NARRATIVE_MD))?;
    assert!(narrative.contains("- Starting price range: 0.000100 ETH to 0.000100 ETH"));
    assert!(narrative.contains("- Final price range: 0.000400 ETH to 0.000900 ETH"));
    assert!(narrative.contains("- Average price increase: 550.00%"));
    assert!(narrative.contains("- Total ETH raised (average): 30.0000 ETH"));
    assert!(narrative.contains("- Standard: 3 purchases"));
    assert!(narrative.contains("- Quadratic Curve: 2 purchases parsed, 1 incomplete purchase blocks dropped"));
    assert!(narrative.contains("- Broken Build: no sale summary in output"));

    Ok(())
}

#[test]
fn tables_are_identical_across_runs() -> anyhow::Result<()> {
    let recordings = tempfile::tempdir()?;
    let first_out = tempfile::tempdir()?;
    let second_out = tempfile::tempdir()?;
    let (specs, harness) = recorded_batch(recordings.path());

    run_pipeline(&harness, &specs, &options(first_out.path().to_path_buf()))?;
    run_pipeline(&harness, &specs, &options(second_out.path().to_path_buf()))?;

    for artifact in [SUMMARY_CSV, PURCHASE_CSV] {
        assert_eq!(
            std::fs::read(first_out.path().join(artifact))?,
            std::fs::read(second_out.path().join(artifact))?,
            "{artifact} differs between runs"
        );
    }
    Ok(())
}

#[test]
fn kept_raw_output_can_be_replayed() -> anyhow::Result<()> {
    let recordings = tempfile::tempdir()?;
    let first_out = tempfile::tempdir()?;
    let second_out = tempfile::tempdir()?;
    let (specs, harness) = recorded_batch(recordings.path());

    run_pipeline(
        harness,
        &specs,
        &PipelineOptions {
            output_dir: first_out.path().to_path_buf(),
            keep_raw_output: true,
        },
    )?;

    let kept = ReplayHarness::new(first_out.path().join(RAW_OUTPUT_DIR));
    assert!(kept.recording_path(&specs[0]).is_file());
    // Output without a summary is kept too, it is what needs auditing
    assert!(kept.recording_path(&specs[2]).is_file());

    let replayed = run_pipeline(kept, &specs, &options(second_out.path().to_path_buf()))?;
    assert_eq!(2, replayed.dataset.results.len());
    assert_eq!(
        std::fs::read(first_out.path().join(SUMMARY_CSV))?,
        std::fs::read(second_out.path().join(SUMMARY_CSV))?
    );
    Ok(())
}

#[test]
fn charts_in_output_dir_are_linked() -> anyhow::Result<()> {
    let recordings = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    std::fs::write(out.path().join("price_progression.png"), b"png")?;
    std::fs::write(out.path().join("eth_raised.png"), b"png")?;
    let (specs, harness) = recorded_batch(recordings.path());

    run_pipeline(harness, &specs, &options(out.path().to_path_buf()))?;

    let narrative = std::fs::read_to_string(out.path().join(NARRATIVE_MD))?;
    let eth_raised = narrative
        .find("![Eth Raised](eth_raised.png)")
        .context("ETH raised chart")?;
    let progression = narrative
        .find("![Price Progression](price_progression.png)")
        .context("Price progression chart")?;
    assert!(eth_raised < progression);
    Ok(())
}

#[test]
fn nothing_usable_is_an_empty_batch() -> anyhow::Result<()> {
    let recordings = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    let spec = ScenarioSpec::new("Broken Build");
    let harness = record(recordings.path(), &[(&spec, COMPILE_FAILURE)]);

    let err = run_pipeline(harness, &[spec], &options(out.path().join("report")))
        .expect_err("Nothing to report on");

    match err.downcast_ref::<AggregateError>() {
        Some(AggregateError::EmptyBatch { skipped }) => assert_eq!(1, skipped.len()),
        other => panic!("Expected an empty batch, got {other:?}"),
    }
    assert!(!out.path().join("report").exists());
    Ok(())
}
