use anyhow::Context;
use database::{CsvExport, Database, TrendStore};
use sentiment_engine::{GuardedClassifier, LexiconModel};
use social_client::{FetchPolicy, RateLimitedFetcher, XApiClient};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use trend_pipeline::{
    render_history, BackgroundService, Pipeline, PipelineRun, PipelineSettings, RunReport,
};
use trendwatch_core::{AppConfig, CoreError, ErrorReporter};

/// Used when `RUST_LOG` is unset. `trendwatch` also matches `trendwatch_core`.
const DEFAULT_LOG_FILTER: &str =
    "trendwatch=info,trend_pipeline=info,social_client=info,database=info,sentiment_engine=warn";

/// Logs the stored trend after every successful run.
struct ReportingRun<'a, P> {
    pipeline: P,
    store: &'a Database,
}

impl<P: PipelineRun> PipelineRun for ReportingRun<'_, P> {
    async fn run_once(&mut self) -> Result<RunReport, CoreError> {
        let report = self.pipeline.run_once().await?;
        match self.store.history().await {
            Ok(history) => info!("Sentiment trend:\n{}", render_history(&history)),
            Err(e) => warn!("Could not read trend history: {}", e),
        }
        Ok(report)
    }
}

fn log_credentials(config: &AppConfig) {
    let presence = |v: &Option<String>| if v.is_some() { "present" } else { "missing" };
    let creds = &config.credentials;
    info!("Bearer token: {}", presence(&creds.bearer_token));
    info!("User access token: {}", presence(&creds.user_access_token));
    info!("User id: {}", presence(&creds.user_id));
    if !creds.engagement_enabled() {
        warn!("User credentials incomplete; liking posts is disabled");
    }
}

fn fatal(reporter: &ErrorReporter, error: impl Into<CoreError>) -> anyhow::Error {
    let error = error.into();
    reporter.report_error(&error);
    anyhow::Error::new(error)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loaded before the subscriber so RUST_LOG may come from .env.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    info!("Starting trendwatch - keyword sentiment tracker");

    let run_once = std::env::args().skip(1).any(|arg| arg == "--once");
    let reporter = ErrorReporter::new();

    let config = AppConfig::load().map_err(|e| fatal(&reporter, e))?;
    log_credentials(&config);

    let bearer = config
        .require_bearer_token()
        .map_err(|e| fatal(&reporter, e))?
        .to_string();
    let mut client =
        XApiClient::new(&config.api_base_url, bearer).map_err(|e| fatal(&reporter, e))?;
    if let (Some(token), Some(user_id)) = (
        config.credentials.user_access_token.clone(),
        config.credentials.user_id.clone(),
    ) {
        client = client.with_user_context(token, user_id);
    }
    let engagement = config
        .credentials
        .engagement_enabled()
        .then_some(&client);

    let db = Database::open(config.database_url.clone())
        .await
        .map_err(|e| fatal(&reporter, e))
        .context("opening trend database")?;
    let csv = CsvExport::new(&config.csv_path);

    let fetcher = RateLimitedFetcher::new(&client, FetchPolicy::from_config(&config))
        .with_language(config.language.clone());
    let pipeline = Pipeline::new(
        PipelineSettings::from_config(&config),
        fetcher,
        engagement,
        GuardedClassifier::new(LexiconModel::new()),
        &db,
        Some(&csv),
    );
    let mut runner = ReportingRun {
        pipeline,
        store: &db,
    };

    if run_once {
        let report = runner
            .run_once()
            .await
            .map_err(|e| fatal(&reporter, e))?;
        info!("Single run finished: {:?}", report.outcome);
    } else {
        let service = BackgroundService::from_interval(config.polling_interval());
        info!(
            "Polling every {} minutes; press Ctrl-C to stop",
            config.polling_interval_minutes
        );
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        let runs = service.run_periodically(&mut runner, shutdown).await;
        info!("Stopped after {} runs", runs);
    }

    db.close().await;
    Ok(())
}
