//! Smurf Detection Pipeline - Main Entry Point
//!
//! Resolves a player, runs the full fetch-and-score pipeline once, and
//! prints the analysis as JSON.

use anyhow::{bail, Context, Result};
use smurf_detection_pipeline::{
    config::AppConfig, AnalysisOptions, AnalysisOrchestrator, PipelineMetrics,
    RateLimitedGateway, TieredCache,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration before logging so the level comes from it
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(_) => {
            let mut config = AppConfig::default();
            config.riot.api_key = std::env::var("RIOT_API_KEY").unwrap_or_default();
            config
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                format!("smurf_detection_pipeline={}", config.logging.level).parse()?,
            ),
        )
        .init();

    info!("Starting smurf detection pipeline");

    let (target, options) = parse_args()?;

    let metrics = Arc::new(PipelineMetrics::new());
    let cache = Arc::new(TieredCache::new(
        &config.cache.dir,
        config.cache.max_memory_entries,
    ));
    let gateway = Arc::new(RateLimitedGateway::new(
        config.riot.clone(),
        config.cache.clone(),
        cache.clone(),
        metrics.clone(),
    )?);
    let orchestrator = AnalysisOrchestrator::new(gateway, cache, &config, metrics.clone());
    info!(
        max_rps = config.riot.max_requests_per_second,
        fast_mode = options.fast_mode,
        "Pipeline components initialized"
    );

    let result = orchestrator
        .get_unified_analysis(&target, &options)
        .await
        .context("analysis failed")?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    metrics.print_summary();

    Ok(())
}

/// `smurf-detection-pipeline <puuid|name> [--riot-id game#tag] [--matches N] [--fast] [--refresh]`
fn parse_args() -> Result<(String, AnalysisOptions)> {
    let mut args = std::env::args().skip(1);
    let Some(target) = args.next() else {
        bail!("usage: smurf-detection-pipeline <puuid|name> [--riot-id game#tag] [--matches N] [--fast] [--refresh]");
    };

    let mut options = AnalysisOptions::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--fast" => options.fast_mode = true,
            "--refresh" => options.force_refresh = true,
            "--riot-id" => {
                options.riot_id = Some(args.next().context("--riot-id needs a value")?)
            }
            "--matches" => {
                let value = args.next().context("--matches needs a value")?;
                options.match_count = Some(value.parse().context("--matches must be a number")?);
            }
            "--region" => options.region = Some(args.next().context("--region needs a value")?),
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok((target, options))
}
