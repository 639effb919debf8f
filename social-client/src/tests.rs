#[cfg(test)]
mod tests {
    use crate::api::{self, error_for_status, parse_search_body, RATE_LIMIT_RESET_HEADER};
    use crate::fetcher::wait_until_reset;
    use crate::{EmptyReason, FetchOutcome, FetchPolicy, RateLimitedFetcher, SearchApi, SearchQuery};
    use reqwest::header::{HeaderMap, HeaderValue};
    use reqwest::StatusCode;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use trendwatch_core::{CoreError, Post, SocialApiError};

    struct ScriptedSearch {
        responses: Mutex<VecDeque<Result<Vec<Post>, CoreError>>>,
        calls: AtomicU32,
        last_query: Mutex<Option<SearchQuery>>,
    }

    impl ScriptedSearch {
        fn new(responses: Vec<Result<Vec<Post>, CoreError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicU32::new(0),
                last_query: Mutex::new(None),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SearchApi for ScriptedSearch {
        async fn search_recent(&self, query: &SearchQuery) -> Result<Vec<Post>, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock().unwrap() = Some(query.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn rate_limited(reset_at: Option<i64>) -> Result<Vec<Post>, CoreError> {
        Err(CoreError::SocialApi(SocialApiError::RateLimitExceeded {
            reset_at,
        }))
    }

    fn sample_posts() -> Vec<Post> {
        vec![
            Post::new("1", "great swift news"),
            Post::new("2", "bad day"),
        ]
    }

    #[test]
    fn test_query_string_excludes_reposts_and_filters_language() {
        let query = SearchQuery::new("Swift", "en", 20);
        assert_eq!(query.query_string(), "Swift -is:retweet lang:en");
    }

    #[test]
    fn test_page_size_is_clamped_to_provider_range() {
        assert_eq!(SearchQuery::new("x", "en", 5).page_size(), 10);
        assert_eq!(SearchQuery::new("x", "en", 20).page_size(), 20);
        assert_eq!(SearchQuery::new("x", "en", 500).page_size(), 100);
    }

    #[test]
    fn test_status_mapping() {
        let mut headers = HeaderMap::new();
        headers.insert(RATE_LIMIT_RESET_HEADER, HeaderValue::from_static("1700000000"));

        assert_eq!(
            error_for_status(StatusCode::TOO_MANY_REQUESTS, &headers, "/search", ""),
            SocialApiError::RateLimitExceeded {
                reset_at: Some(1_700_000_000)
            }
        );
        assert_eq!(
            error_for_status(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new(), "/search", ""),
            SocialApiError::RateLimitExceeded { reset_at: None }
        );
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, &headers, "/search", "bad token"),
            SocialApiError::Unauthorized { .. }
        ));
        assert_eq!(
            error_for_status(StatusCode::FORBIDDEN, &headers, "/2/users/1/likes", ""),
            SocialApiError::Forbidden {
                resource: "/2/users/1/likes".to_string()
            }
        );
        assert_eq!(
            error_for_status(StatusCode::BAD_GATEWAY, &headers, "/search", ""),
            SocialApiError::ServerError { status_code: 502 }
        );
        assert!(matches!(
            error_for_status(StatusCode::BAD_REQUEST, &headers, "/search", "invalid query"),
            SocialApiError::UnexpectedStatus {
                status_code: 400,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_search_body() {
        let body = r#"{
            "data": [
                {"id": "101", "text": "swift is fast"},
                {"id": "102", "text": "meh"}
            ],
            "meta": {"result_count": 2, "newest_id": "102", "oldest_id": "101"}
        }"#;
        let posts = parse_search_body(body).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id.as_str(), "101");
        assert_eq!(posts[1].text, "meh");
    }

    #[test]
    fn test_parse_search_body_without_data_is_empty() {
        let posts = parse_search_body(r#"{"meta": {"result_count": 0}}"#).unwrap();
        assert!(posts.is_empty());
    }

    #[test]
    fn test_parse_search_body_malformed() {
        let result = parse_search_body("<html>oops</html>");
        assert!(matches!(
            result,
            Err(SocialApiError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_client_rejects_bad_base_url() {
        let result = api::XApiClient::new("not a url", "token".to_string());
        assert!(matches!(result, Err(CoreError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_like_without_user_context_is_unauthorized() {
        let client = api::XApiClient::new(api::DEFAULT_API_BASE, "token".to_string()).unwrap();
        let result = client.like_post(&"123".into()).await;
        assert!(matches!(
            result,
            Err(CoreError::SocialApi(SocialApiError::Unauthorized { .. }))
        ));
    }

    #[test]
    fn test_wait_until_reset() {
        let margin = Duration::from_secs(5);
        assert_eq!(wait_until_reset(1_010, 1_000, margin), Duration::from_secs(15));
        // Reset already passed but still inside the margin.
        assert_eq!(wait_until_reset(998, 1_000, margin), Duration::from_secs(3));
        // Far in the past clamps to zero.
        assert_eq!(wait_until_reset(900, 1_000, margin), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_fetch_success_first_try() {
        let api = ScriptedSearch::new(vec![Ok(sample_posts())]);
        let fetcher = RateLimitedFetcher::new(&api, FetchPolicy::default());

        let outcome = fetcher.fetch("Swift", 20).await;
        assert_eq!(outcome, FetchOutcome::Fetched(sample_posts()));
        assert_eq!(api.calls(), 1);

        let query = api.last_query.lock().unwrap().clone().unwrap();
        assert_eq!(query.query_string(), "Swift -is:retweet lang:en");
        assert_eq!(query.max_results, 20);
    }

    #[tokio::test]
    async fn test_fetch_trims_to_requested_count() {
        let page: Vec<Post> = (1..=10)
            .map(|i| Post::new(i.to_string(), format!("swift post {}", i)))
            .collect();
        let api = ScriptedSearch::new(vec![Ok(page.clone())]);
        let fetcher = RateLimitedFetcher::new(&api, FetchPolicy::default());

        let outcome = fetcher.fetch("Swift", 5).await;
        assert_eq!(outcome, FetchOutcome::Fetched(page[..5].to_vec()));

        let query = api.last_query.lock().unwrap().clone().unwrap();
        assert_eq!(query.page_size(), 10);
    }

    #[tokio::test]
    async fn test_fetch_zero_posts_is_not_an_error() {
        let api = ScriptedSearch::new(vec![Ok(Vec::new())]);
        let fetcher = RateLimitedFetcher::new(&api, FetchPolicy::default());
        assert_eq!(fetcher.fetch("Swift", 20).await, FetchOutcome::Fetched(Vec::new()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_sleeps_until_reset_plus_margin_then_retries() {
        let reset_at = chrono::Utc::now().timestamp() + 10;
        let api = ScriptedSearch::new(vec![rate_limited(Some(reset_at)), Ok(sample_posts())]);
        let fetcher = RateLimitedFetcher::new(&api, FetchPolicy::default());

        let started = tokio::time::Instant::now();
        let outcome = fetcher.fetch("Swift", 20).await;
        let elapsed = started.elapsed();

        assert_eq!(outcome, FetchOutcome::Fetched(sample_posts()));
        assert_eq!(api.calls(), 2);
        // 10s until reset plus the 5s margin; the wall clock may tick once meanwhile.
        assert!(elapsed >= Duration::from_secs(14), "slept {:?}", elapsed);
        assert!(elapsed <= Duration::from_secs(15), "slept {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_without_reset_hint_gives_up_immediately() {
        let api = ScriptedSearch::new(vec![rate_limited(None), Ok(sample_posts())]);
        let fetcher = RateLimitedFetcher::new(&api, FetchPolicy::default());

        let started = tokio::time::Instant::now();
        let outcome = fetcher.fetch("Swift", 20).await;

        assert_eq!(
            outcome,
            FetchOutcome::Empty(EmptyReason::RateLimitedWithoutReset)
        );
        assert_eq!(api.calls(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_fetch_other_errors_are_not_retried() {
        let api = ScriptedSearch::new(vec![
            Err(CoreError::SocialApi(SocialApiError::ServerError {
                status_code: 503,
            })),
            Ok(sample_posts()),
        ]);
        let fetcher = RateLimitedFetcher::new(&api, FetchPolicy::default());

        let outcome = fetcher.fetch("Swift", 20).await;
        match outcome {
            FetchOutcome::Empty(EmptyReason::FetchFailed { error_code, .. }) => {
                assert_eq!(error_code, "SOCIAL_API");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_gives_up_after_retry_budget() {
        let policy = FetchPolicy {
            max_rate_limit_retries: 2,
            ..FetchPolicy::default()
        };
        let reset_at = chrono::Utc::now().timestamp();
        let api = ScriptedSearch::new(vec![
            rate_limited(Some(reset_at)),
            rate_limited(Some(reset_at)),
            rate_limited(Some(reset_at)),
            Ok(sample_posts()),
        ]);
        let fetcher = RateLimitedFetcher::new(&api, policy);

        let outcome = fetcher.fetch("Swift", 20).await;
        assert!(matches!(
            outcome,
            FetchOutcome::Empty(EmptyReason::GaveUpRetrying { retries: 2, .. })
        ));
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_gives_up_when_wait_exceeds_budget() {
        let policy = FetchPolicy {
            max_total_wait: Duration::from_secs(60),
            ..FetchPolicy::default()
        };
        let reset_at = chrono::Utc::now().timestamp() + 15 * 60;
        let api = ScriptedSearch::new(vec![rate_limited(Some(reset_at)), Ok(sample_posts())]);
        let fetcher = RateLimitedFetcher::new(&api, policy);

        let started = tokio::time::Instant::now();
        let outcome = fetcher.fetch("Swift", 20).await;
        assert!(matches!(
            outcome,
            FetchOutcome::Empty(EmptyReason::GaveUpRetrying { retries: 0, .. })
        ));
        assert_eq!(api.calls(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
