use crate::{EngagementApi, SearchApi};
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use trendwatch_core::{CoreError, Post, PostId, RateLimitState, SocialApiError};
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";
pub const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

const SEARCH_RECENT_ENDPOINT: &str = "/2/tweets/search/recent";
const MIN_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Absent when the query matched nothing.
    #[serde(default)]
    pub data: Option<Vec<TweetData>>,
    pub meta: Option<SearchMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetData {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMeta {
    pub result_count: u32,
    pub newest_id: Option<String>,
    pub oldest_id: Option<String>,
    pub next_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct LikeRequest<'a> {
    tweet_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct LikeResponse {
    data: LikeData,
}

#[derive(Debug, Deserialize)]
struct LikeData {
    liked: bool,
}

impl From<TweetData> for Post {
    fn from(tweet: TweetData) -> Self {
        Post::new(tweet.id, tweet.text)
    }
}

/// Recent-search query for one keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub language: String,
    pub exclude_reposts: bool,
    pub max_results: u32,
}

impl SearchQuery {
    pub fn new(keyword: impl Into<String>, language: impl Into<String>, max_results: u32) -> Self {
        Self {
            keyword: keyword.into(),
            language: language.into(),
            exclude_reposts: true,
            max_results,
        }
    }

    pub fn query_string(&self) -> String {
        let mut query = self.keyword.clone();
        if self.exclude_reposts {
            query.push_str(" -is:retweet");
        }
        if !self.language.is_empty() {
            query.push_str(" lang:");
            query.push_str(&self.language);
        }
        query
    }

    /// The provider rejects page sizes outside 10..=100.
    pub fn page_size(&self) -> u32 {
        self.max_results.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE)
    }
}

/// Map a non-success HTTP status to the typed provider failure.
pub fn error_for_status(
    status: StatusCode,
    headers: &HeaderMap,
    endpoint: &str,
    body: &str,
) -> SocialApiError {
    match status.as_u16() {
        429 => {
            let reset = headers
                .get(RATE_LIMIT_RESET_HEADER)
                .and_then(|value| value.to_str().ok());
            SocialApiError::RateLimitExceeded {
                reset_at: RateLimitState::from_header(reset).reset_epoch_seconds,
            }
        }
        401 => SocialApiError::Unauthorized {
            reason: summarize_body(body),
        },
        403 => SocialApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        404 => SocialApiError::NotFound {
            resource: endpoint.to_string(),
        },
        code if status.is_server_error() => SocialApiError::ServerError { status_code: code },
        code => SocialApiError::UnexpectedStatus {
            status_code: code,
            details: summarize_body(body),
        },
    }
}

fn summarize_body(body: &str) -> String {
    const MAX_LEN: usize = 200;
    let trimmed = body.trim();
    if trimmed.chars().count() > MAX_LEN {
        let cut: String = trimmed.chars().take(MAX_LEN).collect();
        format!("{}...", cut)
    } else {
        trimmed.to_string()
    }
}

pub fn parse_search_body(body: &str) -> Result<Vec<Post>, SocialApiError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| SocialApiError::InvalidResponse {
            details: format!("Failed to parse search response: {}", e),
        })?;
    Ok(response
        .data
        .unwrap_or_default()
        .into_iter()
        .map(Post::from)
        .collect())
}

/// HTTP client for the X API v2 endpoints the pipeline needs.
#[derive(Debug)]
pub struct XApiClient {
    http_client: Client,
    base_url: Url,
    bearer_token: String,
    user_token: Option<String>,
    user_id: Option<String>,
}

impl XApiClient {
    pub fn new(base_url: &str, bearer_token: String) -> Result<Self, CoreError> {
        let base_url = Url::parse(base_url).map_err(|e| CoreError::InvalidInput {
            message: format!("Invalid API base URL '{}': {}", base_url, e),
        })?;

        let http_client = Client::builder()
            .user_agent(concat!("trendwatch/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            bearer_token,
            user_token: None,
            user_id: None,
        })
    }

    /// Enable engagement calls, which need a user-context token.
    pub fn with_user_context(mut self, user_token: String, user_id: String) -> Self {
        self.user_token = Some(user_token);
        self.user_id = Some(user_id);
        self
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, CoreError> {
        self.base_url
            .join(endpoint)
            .map_err(|e| CoreError::InvalidInput {
                message: format!("Invalid endpoint '{}': {}", endpoint, e),
            })
    }

    async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<Response, CoreError> {
        let start_time = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {}: {}", endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::SocialApi(SocialApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        debug!(
            "{} responded {} after {:?}",
            endpoint,
            status,
            start_time.elapsed()
        );

        if status.is_success() {
            return Ok(response);
        }

        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        let api_error = error_for_status(status, &headers, endpoint, &body);
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate limited on {}: {}", endpoint, api_error);
        } else {
            error!("Request failed with status {} for {}", status, endpoint);
        }
        Err(CoreError::SocialApi(api_error))
    }

    pub async fn search_recent_posts(&self, query: &SearchQuery) -> Result<Vec<Post>, CoreError> {
        let url = self.endpoint_url(SEARCH_RECENT_ENDPOINT)?;
        let page_size = query.page_size().to_string();
        let query_string = query.query_string();

        info!("Searching recent posts: {}", query_string);
        let request = self
            .http_client
            .get(url)
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("query", query_string.as_str()),
                ("max_results", page_size.as_str()),
            ]);

        let response = self.send(request, SEARCH_RECENT_ENDPOINT).await?;
        let body = response.text().await?;
        let posts = parse_search_body(&body)?;

        info!("Retrieved {} posts for '{}'", posts.len(), query.keyword);
        Ok(posts)
    }

    pub async fn like_post(&self, post_id: &PostId) -> Result<(), CoreError> {
        let (Some(user_token), Some(user_id)) = (&self.user_token, &self.user_id) else {
            return Err(CoreError::SocialApi(SocialApiError::Unauthorized {
                reason: "no user-context token configured".to_string(),
            }));
        };

        let endpoint = format!("/2/users/{}/likes", user_id);
        let url = self.endpoint_url(&endpoint)?;
        let request = self
            .http_client
            .post(url)
            .bearer_auth(user_token)
            .json(&LikeRequest {
                tweet_id: post_id.as_str(),
            });

        let response = self.send(request, &endpoint).await?;
        let like: LikeResponse = response.json().await.map_err(|e| {
            error!("Failed to parse like response: {}", e);
            CoreError::SocialApi(SocialApiError::InvalidResponse {
                details: "Failed to parse like response".to_string(),
            })
        })?;

        if !like.data.liked {
            return Err(CoreError::SocialApi(SocialApiError::InvalidResponse {
                details: format!("post {} was not liked", post_id),
            }));
        }

        debug!("Liked post {}", post_id);
        Ok(())
    }
}

impl SearchApi for XApiClient {
    async fn search_recent(&self, query: &SearchQuery) -> Result<Vec<Post>, CoreError> {
        self.search_recent_posts(query).await
    }
}

impl EngagementApi for XApiClient {
    async fn like(&self, post_id: &PostId) -> Result<(), CoreError> {
        self.like_post(post_id).await
    }
}
