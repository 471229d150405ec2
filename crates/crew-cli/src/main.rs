use std::sync::Arc;
use std::time::Duration;

use analysis_orchestrator::{AnalysisOrchestrator, AnalysisStatus};
use anyhow::Result;
use crew_client::CrewClient;

mod config;

use config::CliConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env, init tracing
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    // 2. Symbol from argv; the service expects upper-case tickers
    let symbol = std::env::args()
        .nth(1)
        .map(|s| s.trim().to_uppercase())
        .unwrap_or_default();
    if symbol.is_empty() {
        eprintln!("Usage: crew-cli <SYMBOL>");
        std::process::exit(2);
    }

    // 3. Load configuration
    let config = CliConfig::from_env()?;
    tracing::info!("Analysis service: {}", config.api_base_url);
    tracing::info!("  Poll interval: {}s", config.poll_interval_seconds);
    tracing::info!("  Request timeout: {}s", config.request_timeout_seconds);

    let client = CrewClient::new(
        config.api_base_url.clone(),
        Duration::from_secs(config.request_timeout_seconds),
    );

    // 4. Startup connectivity check (warn-only, the run itself will fail
    // loudly if the service stays down)
    match client.health().await {
        Ok(true) => tracing::info!("Startup check: analysis service OK"),
        Ok(false) => tracing::warn!("Startup check: analysis service degraded"),
        Err(e) => tracing::warn!("Startup check: analysis service unreachable ({})", e),
    }

    let mut orchestrator = AnalysisOrchestrator::new(
        Arc::new(client),
        Duration::from_secs(config.poll_interval_seconds),
    );

    // 5. Log status transitions while the run is in flight
    let mut status_rx = orchestrator.subscribe();
    let status_logger = tokio::spawn(async move {
        let mut last: Option<AnalysisStatus> = None;
        while status_rx.changed().await.is_ok() {
            let status = status_rx.borrow_and_update().status;
            if last != Some(status) {
                tracing::info!("Status: {}", status);
                last = Some(status);
            }
        }
    });

    let snapshot = orchestrator.analyze_to_completion(&symbol).await?;
    status_logger.abort();

    match snapshot.status {
        AnalysisStatus::Completed => {
            let metrics = snapshot.metrics.unwrap_or_default();
            println!("== {} analysis ==", symbol);
            print_metric("Recommendation", metrics.recommendation.as_deref());
            print_metric("Confidence", metrics.confidence.as_deref());
            print_dollar_metric("Current price", metrics.current_price.as_deref());
            print_dollar_metric("Price target", metrics.price_target.as_deref());
            print_metric("RSI (14)", metrics.rsi.as_deref());
            print_metric("P/E ratio", metrics.pe_ratio.as_deref());
            println!();
            println!("{}", snapshot.raw_report.unwrap_or_default());
            Ok(())
        }
        AnalysisStatus::Failed => {
            tracing::error!(
                "Analysis failed: {}",
                snapshot.error.as_deref().unwrap_or("unknown error")
            );
            std::process::exit(1);
        }
        other => {
            tracing::error!("Analysis ended unexpectedly while {}", other);
            std::process::exit(1);
        }
    }
}

fn print_metric(label: &str, value: Option<&str>) {
    println!("{:<16} {}", label, value.unwrap_or("n/a"));
}

fn print_dollar_metric(label: &str, value: Option<&str>) {
    match value {
        Some(v) => println!("{:<16} ${}", label, v),
        None => println!("{:<16} n/a", label),
    }
}
