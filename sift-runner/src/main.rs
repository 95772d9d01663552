use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use sift_core::config::SiftConfig;
use sift_core::error::{ConfigError, SiftError};
use sift_runner::cli::{DEFAULT_CONFIG_PATH, RunnerCli};
use sift_runner::handler::{self, Outcome};
use sift_runner::{logging, metrics_export};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = RunnerCli::parse();

    // 설정 로드 (파일 + 환경변수), 기본 경로에 파일이 없으면 기본값 사용
    let (mut config, used_defaults) = match SiftConfig::load(&cli.config).await {
        Ok(config) => (config, false),
        Err(SiftError::Config(ConfigError::FileNotFound { .. }))
            if cli.config == Path::new(DEFAULT_CONFIG_PATH) =>
        {
            let mut config = SiftConfig::default();
            config.apply_env_overrides();
            (config, true)
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to load {}", cli.config.display()));
        }
    };

    // CLI 오버라이드
    if let Some(level) = cli.log_level {
        config.general.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.general.log_format = format;
    }
    config.validate().context("invalid configuration")?;

    if cli.validate {
        println!("configuration is valid");
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    if used_defaults {
        tracing::warn!(
            path = %cli.config.display(),
            "config file not found, using defaults"
        );
    }

    let metrics_handle = if config.metrics.enabled {
        Some(metrics_export::install_metrics_recorder()?)
    } else {
        None
    };

    tracing::info!("sift-runner starting");

    let payload = handler::read_payload(&cli.event).await?;
    let result = handler::handle(&config, payload).await;

    // 실패한 실행의 메트릭도 기록
    if let Some(handle) = &metrics_handle
        && !config.metrics.textfile_path.is_empty()
        && let Err(e) =
            metrics_export::write_textfile(handle, Path::new(&config.metrics.textfile_path)).await
    {
        tracing::error!(error = %e, "failed to write metrics textfile");
    }

    match result? {
        Outcome::Direct(response) => {
            let body = serde_json::to_string(&response)
                .context("failed to serialize direct evaluation response")?;
            println!("{body}");
        }
        Outcome::Batch(summary) => {
            tracing::info!(
                objects = summary.objects_read,
                parse_errors = summary.parse_errors,
                matched = summary.matched_payloads,
                forwarded = summary.forwarded,
                "batch run complete"
            );
        }
    }

    tracing::info!("sift-runner finished");
    Ok(())
}
