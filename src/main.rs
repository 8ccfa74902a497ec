use anyhow::{Context, Result};
use orders_etl::{config::DEFAULT_CONFIG_FILE, pipeline, PipelineConfig};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let cfg = PipelineConfig::load_or_default(DEFAULT_CONFIG_FILE)
        .with_context(|| format!("loading {DEFAULT_CONFIG_FILE}"))?;
    info!(
        archive = %cfg.archive_path.display(),
        table = %cfg.table_name,
        target = %cfg.connection,
        policy = %cfg.insert_policy,
        "configured"
    );

    // ─── 3) run ──────────────────────────────────────────────────────
    match pipeline::run(&cfg) {
        Ok(report) => {
            info!(
                rows = report.rows_loaded,
                columns = ?report.columns,
                "data loaded into table {}",
                cfg.table_name
            );
            Ok(())
        }
        Err(e) => {
            error!(stage = %e.stage(), "{e}");
            Err(e).context("pipeline aborted")
        }
    }
}
