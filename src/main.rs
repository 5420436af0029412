use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;
use wallet_risk::io::{read_wallet_ids, write_stream, ResultWriter};
use wallet_risk::{
    AppError, Config, EtherscanLedger, KnownContractRegistry, LedgerReader, Pipeline,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let registry = match load_registry(&config) {
        Ok(r) => Arc::new(r),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let ledger = match build_ledger(&config) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to initialize ledger reader: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&config, ledger, registry)
        .await
        .context("scoring run failed")
    {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_registry(config: &Config) -> Result<KnownContractRegistry, AppError> {
    match &config.registry_file {
        Some(path) => {
            let registry = KnownContractRegistry::from_csv_path(path)?;
            tracing::info!(
                "Loaded {} DeFi contracts from {}",
                registry.len(),
                path.display()
            );
            Ok(registry)
        }
        None => Ok(KnownContractRegistry::builtin()),
    }
}

fn build_ledger(config: &Config) -> Result<Arc<dyn LedgerReader>, AppError> {
    Ok(Arc::new(EtherscanLedger::from_config(config)?))
}

/// Resolves on Ctrl-C. If the handler cannot be installed the run is never interrupted.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn run(
    config: &Config,
    ledger: Arc<dyn LedgerReader>,
    registry: Arc<KnownContractRegistry>,
) -> Result<(), AppError> {
    let wallets = read_wallet_ids(&config.input_csv)?;
    let wallet_count = wallets.len();
    tracing::info!(
        "Loaded {} wallet addresses from {}",
        wallet_count,
        config.input_csv.display()
    );

    let mut writer = ResultWriter::create(&config.output_csv)?;

    let pipeline = Pipeline::new(ledger, registry, config.max_workers);
    let started = Instant::now();

    let outcome = write_stream(pipeline.stream(wallets), &mut writer, ctrl_c()).await?;
    let summary = outcome.summary;
    if outcome.interrupted {
        tracing::warn!(
            "Interrupted after {}/{} wallets; flushed completed rows",
            summary.total,
            wallet_count
        );
    }

    let elapsed = started.elapsed();
    tracing::info!(
        "Processed {} wallets in {:.2}s ({:.2}s per wallet)",
        summary.total,
        elapsed.as_secs_f64(),
        elapsed.as_secs_f64() / summary.total.max(1) as f64
    );
    tracing::info!(
        "Bands: low={} medium={} high={} (inactive={}, degraded={})",
        summary.low,
        summary.medium,
        summary.high,
        summary.inactive,
        summary.degraded
    );
    tracing::info!(
        "Saved {} rows to {}",
        writer.rows_written(),
        config.output_csv.display()
    );

    Ok(())
}
