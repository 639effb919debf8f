use crate::{SearchApi, SearchQuery};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use trendwatch_core::{AppConfig, CoreError, ErrorExt, Post, SocialApiError};

/// How the fetcher reacts to throttling.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Added on top of the provider's reset time before retrying.
    pub safety_margin: Duration,
    /// Maximum number of rate-limit retries within one fetch.
    pub max_rate_limit_retries: u32,
    /// Maximum cumulative time spent sleeping on rate limits within one fetch.
    pub max_total_wait: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            safety_margin: Duration::from_secs(5),
            max_rate_limit_retries: 3,
            max_total_wait: Duration::from_secs(30 * 60),
        }
    }
}

impl FetchPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            safety_margin: config.safety_margin(),
            max_rate_limit_retries: config.max_rate_limit_retries,
            max_total_wait: config.max_total_wait(),
        }
    }
}

/// Why a fetch produced no posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    /// Throttled and the provider gave no reset time.
    RateLimitedWithoutReset,
    /// Retry budget exhausted while throttled.
    GaveUpRetrying { retries: u32, waited: Duration },
    /// Any non-throttling failure; never retried.
    FetchFailed { error_code: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Successful call; may hold zero posts.
    Fetched(Vec<Post>),
    Empty(EmptyReason),
}

/// Seconds to wait for a rate-limit window to reset, never negative.
pub fn wait_until_reset(reset_epoch: i64, now_epoch: i64, safety_margin: Duration) -> Duration {
    let secs = reset_epoch
        .saturating_sub(now_epoch)
        .saturating_add(safety_margin.as_secs() as i64);
    Duration::from_secs(secs.max(0) as u64)
}

pub struct RateLimitedFetcher<S> {
    api: S,
    policy: FetchPolicy,
    language: String,
}

impl<S: SearchApi> RateLimitedFetcher<S> {
    pub fn new(api: S, policy: FetchPolicy) -> Self {
        Self {
            api,
            policy,
            language: "en".to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Fetch at most `max_results` recent posts for `keyword`.
    pub async fn fetch(&self, keyword: &str, max_results: u32) -> FetchOutcome {
        let query = SearchQuery::new(keyword, self.language.clone(), max_results);
        let mut retries = 0u32;
        let mut waited = Duration::ZERO;

        loop {
            if retries > 0 {
                debug!("Rate-limit retry {} for '{}'", retries, keyword);
            }

            match self.api.search_recent(&query).await {
                Ok(mut posts) => {
                    // Requests below the provider's minimum page size are rounded up.
                    posts.truncate(max_results as usize);
                    if retries > 0 {
                        info!(
                            "Search for '{}' succeeded after {} retries (waited {:?})",
                            keyword, retries, waited
                        );
                    }
                    return FetchOutcome::Fetched(posts);
                }
                Err(CoreError::SocialApi(SocialApiError::RateLimitExceeded { reset_at })) => {
                    let Some(reset_at) = reset_at else {
                        warn!("Rate limited without a reset time; giving up on this run");
                        return FetchOutcome::Empty(EmptyReason::RateLimitedWithoutReset);
                    };

                    let delay = wait_until_reset(
                        reset_at,
                        chrono::Utc::now().timestamp(),
                        self.policy.safety_margin,
                    );

                    if retries >= self.policy.max_rate_limit_retries
                        || waited + delay > self.policy.max_total_wait
                    {
                        warn!(
                            "Giving up after {} rate-limit retries ({:?} waited, next wait {:?})",
                            retries, waited, delay
                        );
                        return FetchOutcome::Empty(EmptyReason::GaveUpRetrying { retries, waited });
                    }

                    warn!("Rate limit exceeded. Sleeping for {:?}...", delay);
                    sleep(delay).await;
                    waited += delay;
                    retries += 1;
                }
                Err(other) => {
                    error!("Failed fetching posts for '{}': {}", keyword, other);
                    return FetchOutcome::Empty(EmptyReason::FetchFailed {
                        error_code: other.error_code(),
                        message: other.to_string(),
                    });
                }
            }
        }
    }
}
