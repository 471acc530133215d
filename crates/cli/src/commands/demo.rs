//! `demo` command implementation.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{AppConfig, ContractError};
use observability::TimingStats;
use serde::Serialize;
use tracing::{info, instrument, warn};
use verifier::scenarios::{self, Scenario, ScenarioContext, SCENARIOS};

use crate::cli::DemoArgs;
use crate::error::CliError;

/// Outcome of one scenario run
#[derive(Debug, Serialize)]
struct ScenarioReport {
    name: &'static str,
    description: &'static str,
    items: Vec<String>,
    elapsed_ms: f64,
    #[serde(skip)]
    elapsed: Duration,
    verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct DemoSummary {
    scenarios: Vec<ScenarioReport>,
    passed: usize,
    failed: usize,
    timing: String,
}

/// Execute the `demo` command
pub async fn run_demo(args: &DemoArgs, loaded: Result<AppConfig, ContractError>) -> Result<()> {
    let config = loaded.context("Failed to load configuration")?;

    let mut ctx = ScenarioContext::from_engine(&config.engine);
    if let Some(delay_ms) = args.delay_ms {
        ctx.delay = Duration::from_millis(delay_ms);
    }

    let selected: Vec<&'static Scenario> = match args.scenario {
        Some(ref name) => vec![scenarios::find(name).ok_or_else(|| CliError::unknown_scenario(name))?],
        None => SCENARIOS.iter().collect(),
    };

    info!(
        scenarios = selected.len(),
        delay_ms = ctx.delay.as_millis() as u64,
        pool_size = ctx.pool.size(),
        "Running demo scenarios"
    );

    let mut timing = TimingStats::default();
    let mut reports = Vec::with_capacity(selected.len());
    for scenario in selected {
        let report = run_scenario(scenario, &ctx).await;
        timing.record(report.elapsed);
        observability::record_scenario_duration_ms(scenario.name, report.elapsed_ms);
        reports.push(report);
    }

    let failed: Vec<&str> = reports
        .iter()
        .filter(|r| !r.verified)
        .map(|r| r.name)
        .collect();

    let summary = DemoSummary {
        passed: reports.len() - failed.len(),
        failed: failed.len(),
        timing: timing.summary().to_string(),
        scenarios: Vec::new(),
    };

    if args.json {
        let summary = DemoSummary {
            scenarios: reports,
            ..summary
        };
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialize demo results")?;
        println!("{}", json);
    } else {
        print_reports(&reports, &summary);
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(CliError::scenario_failed(failed.join(", ")).into())
    }
}

/// Collect the rendered output, then replay the scenario's own verification
#[instrument(skip(scenario, ctx), fields(scenario = scenario.name))]
async fn run_scenario(scenario: &'static Scenario, ctx: &ScenarioContext) -> ScenarioReport {
    let started = Instant::now();
    let collected = scenario.build(ctx).collect_list().await;
    let elapsed = started.elapsed();
    let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

    let (items, mut error) = match collected {
        Ok(items) => (items, None),
        Err(e) => (Vec::new(), Some(e.to_string())),
    };
    if error.is_none() {
        if let Err(e) = scenario.verify(ctx).await {
            error = Some(e.to_string());
        }
    }

    match error {
        Some(ref e) => warn!(error = %e, "Scenario failed"),
        None => info!(items = items.len(), elapsed_ms, "Scenario verified"),
    }

    ScenarioReport {
        name: scenario.name,
        description: scenario.description,
        items,
        elapsed_ms,
        elapsed,
        verified: error.is_none(),
        error,
    }
}

fn print_reports(reports: &[ScenarioReport], summary: &DemoSummary) {
    for report in reports {
        println!("▶ {} ({})", report.name, report.description);
        println!("   ├─ Output: [{}]", report.items.join(", "));
        println!("   ├─ Elapsed: {:.1} ms", report.elapsed_ms);
        match report.error {
            Some(ref e) => println!("   └─ ✗ {}", e),
            None => println!("   └─ ✓ verified"),
        }
        println!();
    }

    println!(
        "{} passed, {} failed; {}",
        summary.passed, summary.failed, summary.timing
    );
}
