use crate::aggregator::Aggregator;
use crate::engagement::EngagementGate;
use chrono::Utc;
use database::{TrendExport, TrendStore};
use sentiment_engine::SentimentClassifier;
use social_client::{EmptyReason, EngagementApi, FetchOutcome, RateLimitedFetcher, SearchApi};
use std::fmt;
use tracing::{debug, error, info, info_span, warn, Instrument};
use trendwatch_core::{AppConfig, CoreError, EngagementAttempt, TrendRecord};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Fetching,
    Processing,
    Persisting,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoDataReason {
    /// The search succeeded but matched nothing.
    NoPostsFound,
    Fetch(EmptyReason),
}

impl fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoDataReason::NoPostsFound => write!(f, "no posts found"),
            NoDataReason::Fetch(EmptyReason::RateLimitedWithoutReset) => {
                write!(f, "rate limited without reset info")
            }
            NoDataReason::Fetch(EmptyReason::GaveUpRetrying { retries, waited }) => write!(
                f,
                "gave up after {} rate-limit retries ({}s waited)",
                retries,
                waited.as_secs()
            ),
            NoDataReason::Fetch(EmptyReason::FetchFailed {
                error_code,
                message,
            }) => write!(f, "fetch failed [{}]: {}", error_code, message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Recorded(TrendRecord),
    NoData(NoDataReason),
}

/// What one run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub outcome: RunOutcome,
    pub engagements: Vec<EngagementAttempt>,
    pub posts_processed: u32,
    /// Set when the tabular export failed; the primary record still stands.
    pub export_error: Option<String>,
}

impl RunReport {
    pub fn record(&self) -> Option<&TrendRecord> {
        match &self.outcome {
            RunOutcome::Recorded(record) => Some(record),
            RunOutcome::NoData(_) => None,
        }
    }

    pub fn likes(&self) -> usize {
        self.engagements.iter().filter(|a| a.is_liked()).count()
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub keyword: String,
    pub trigger_keyword: String,
    pub max_results: u32,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            keyword: config.keyword.clone(),
            trigger_keyword: config.trigger_keyword.clone(),
            max_results: config.max_results,
        }
    }
}

/// Anything the scheduler can drive one run at a time.
pub trait PipelineRun {
    async fn run_once(&mut self) -> Result<RunReport, CoreError>;
}

/// Fetch, classify, engage and persist, once per call to [`Pipeline::run`].
///
/// Every collaborator is injected. `engagement` is `None` when no user
/// credentials are configured; `export` is `None` when there is no tabular
/// mirror.
pub struct Pipeline<S, E, C, T, X> {
    settings: PipelineSettings,
    fetcher: RateLimitedFetcher<S>,
    engagement: Option<E>,
    classifier: C,
    store: T,
    export: Option<X>,
    state: RunState,
}

impl<S, E, C, T, X> Pipeline<S, E, C, T, X>
where
    S: SearchApi,
    E: EngagementApi,
    C: SentimentClassifier,
    T: TrendStore,
    X: TrendExport,
{
    pub fn new(
        settings: PipelineSettings,
        fetcher: RateLimitedFetcher<S>,
        engagement: Option<E>,
        classifier: C,
        store: T,
        export: Option<X>,
    ) -> Self {
        Self {
            settings,
            fetcher,
            engagement,
            classifier,
            store,
            export,
            state: RunState::Init,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub async fn run(&mut self) -> Result<RunReport, CoreError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id);
        self.execute(run_id).instrument(span).await
    }

    fn transition(&mut self, next: RunState) {
        debug!("Pipeline state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    async fn execute(&mut self, run_id: Uuid) -> Result<RunReport, CoreError> {
        self.state = RunState::Init;
        info!("Starting run for keyword '{}'", self.settings.keyword);

        self.transition(RunState::Fetching);
        let outcome = self
            .fetcher
            .fetch(&self.settings.keyword, self.settings.max_results)
            .await;
        let posts = match outcome {
            FetchOutcome::Fetched(posts) if posts.is_empty() => {
                return Ok(self.finish_without_data(run_id, NoDataReason::NoPostsFound));
            }
            FetchOutcome::Fetched(posts) => posts,
            FetchOutcome::Empty(reason) => {
                return Ok(self.finish_without_data(run_id, NoDataReason::Fetch(reason)));
            }
        };
        info!("Fetched {} posts", posts.len());

        self.transition(RunState::Processing);
        let mut aggregator = Aggregator::new();
        let mut engagements = Vec::new();
        let mut gate = self
            .engagement
            .as_ref()
            .map(|api| EngagementGate::new(api, &self.settings.trigger_keyword));

        for post in &posts {
            aggregator.record(self.classifier.classify(&post.text));
            if let Some(gate) = gate.as_mut() {
                if let Some(attempt) = gate.maybe_engage(post).await {
                    engagements.push(attempt);
                }
            }
        }
        drop(gate);

        let posts_processed = aggregator.processed();
        let record = aggregator.finish(Utc::now());
        info!(
            "Sentiment for {} posts: {} positive, {} neutral, {} negative",
            posts_processed, record.positive, record.neutral, record.negative
        );

        self.transition(RunState::Persisting);
        let export_error = match &self.export {
            Some(export) => match export.export(&record).await {
                Ok(()) => None,
                Err(e) => {
                    warn!("Tabular export failed, primary store unaffected: {}", e);
                    Some(e.to_string())
                }
            },
            None => None,
        };

        if let Err(e) = self.store.append(&record).await {
            error!("Failed to persist trend record: {}", e);
            self.transition(RunState::Done);
            return Err(e);
        }

        self.transition(RunState::Done);
        info!(
            "Run complete: record saved, {} of {} engagement attempts liked",
            engagements.iter().filter(|a| a.is_liked()).count(),
            engagements.len()
        );

        Ok(RunReport {
            run_id,
            outcome: RunOutcome::Recorded(record),
            engagements,
            posts_processed,
            export_error,
        })
    }

    fn finish_without_data(&mut self, run_id: Uuid, reason: NoDataReason) -> RunReport {
        info!("No data this run: {}", reason);
        self.transition(RunState::Done);
        RunReport {
            run_id,
            outcome: RunOutcome::NoData(reason),
            engagements: Vec::new(),
            posts_processed: 0,
            export_error: None,
        }
    }
}

impl<S, E, C, T, X> PipelineRun for Pipeline<S, E, C, T, X>
where
    S: SearchApi,
    E: EngagementApi,
    C: SentimentClassifier,
    T: TrendStore,
    X: TrendExport,
{
    async fn run_once(&mut self) -> Result<RunReport, CoreError> {
        self.run().await
    }
}
