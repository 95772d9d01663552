//! Invocation handling.
//!
//! Decodes one invocation payload and routes it:
//! - a payload with a `rules` key is a direct-evaluation request and
//!   produces a [`DirectResponse`]
//! - anything else is a batch trigger and runs the ingestion pipeline
//!
//! Components are built from `SiftConfig` per invocation. Nothing is kept in
//! process-wide state.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::io::AsyncReadExt;

use sift_core::config::SiftConfig;
use sift_core::types::{DirectResponse, DirectTestCase, TriggerEvent};
use sift_log_pipeline::{
    DirectEvaluator, IngestionPipeline, IngestionPipelineBuilder, Invocation, JsonLinesForwarder,
    LocalObjectStore, LocalResultSink, PipelineConfig, RuleEngine, RunSummary, YamlRuleCompiler,
};

/// Pipeline type wired with the built-in components.
pub type LocalPipeline =
    IngestionPipeline<LocalObjectStore, RuleEngine, JsonLinesForwarder, LocalResultSink>;

/// Result of one invocation.
#[derive(Debug)]
pub enum Outcome {
    /// Direct-evaluation verdicts, to be printed on stdout.
    Direct(DirectResponse),
    /// Batch run summary.
    Batch(RunSummary),
}

/// Reads the invocation payload from a file, or from stdin when `source` is `-`.
pub async fn read_payload(source: &str) -> Result<Value> {
    let raw = if source == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("failed to read invocation payload from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("failed to read invocation payload from {source}"))?
    };

    serde_json::from_str(&raw).context("invocation payload is not valid JSON")
}

/// Routes one invocation payload.
pub async fn handle(config: &SiftConfig, payload: Value) -> Result<Outcome> {
    let invocation = Invocation::from_value(payload)?;
    tracing::info!(kind = invocation.kind(), "handling invocation");

    match invocation {
        Invocation::Direct(case) => run_direct(&case).map(Outcome::Direct),
        Invocation::Batch(trigger) => run_batch(config, &trigger).await.map(Outcome::Batch),
    }
}

/// Evaluates a single rule against the request's events.
pub fn run_direct(case: &DirectTestCase) -> Result<DirectResponse> {
    let response = DirectEvaluator::new(YamlRuleCompiler::new()).run(case)?;
    tracing::info!(events = response.events.len(), "direct evaluation complete");
    Ok(response)
}

/// Runs the ingestion pipeline for a batch trigger.
pub async fn run_batch(config: &SiftConfig, trigger: &TriggerEvent) -> Result<RunSummary> {
    let pipeline = build_pipeline(config).await?;
    let summary = pipeline.run(trigger).await?;
    Ok(summary)
}

/// Builds the pipeline from configuration, loading rules from `ingest.rule_dir`.
pub async fn build_pipeline(config: &SiftConfig) -> Result<LocalPipeline> {
    let pipeline_config = PipelineConfig::from_core(config);

    let mut engine = RuleEngine::new();
    let loaded = engine
        .load_rules_from_dir(Path::new(&pipeline_config.rule_dir))
        .await
        .with_context(|| format!("failed to load rules from {}", pipeline_config.rule_dir))?;
    if loaded == 0 {
        tracing::warn!(dir = %pipeline_config.rule_dir, "no detection rules registered");
    }

    let pipeline = IngestionPipelineBuilder::new()
        .store(Arc::new(LocalObjectStore::new(&pipeline_config.storage_root)))
        .dispatcher(Arc::new(engine))
        .forwarder(Arc::new(JsonLinesForwarder::new(&pipeline_config.spool_dir)))
        .sink(Arc::new(LocalResultSink::new(&pipeline_config.output_dir)))
        .config(pipeline_config)
        .build()
        .context("failed to build ingestion pipeline")?;

    Ok(pipeline)
}
