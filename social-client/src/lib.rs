pub mod api;
pub mod fetcher;

#[cfg(test)]
mod tests;

pub use api::{SearchQuery, XApiClient};
pub use fetcher::{EmptyReason, FetchOutcome, FetchPolicy, RateLimitedFetcher};

use trendwatch_core::{CoreError, Post, PostId};

/// Remote search capability: one call, one page of recent posts.
pub trait SearchApi {
    async fn search_recent(&self, query: &SearchQuery) -> Result<Vec<Post>, CoreError>;
}

/// Remote engagement capability: like a single post on behalf of the account.
pub trait EngagementApi {
    async fn like(&self, post_id: &PostId) -> Result<(), CoreError>;
}

impl<T: SearchApi + ?Sized> SearchApi for &T {
    async fn search_recent(&self, query: &SearchQuery) -> Result<Vec<Post>, CoreError> {
        (**self).search_recent(query).await
    }
}

impl<T: EngagementApi + ?Sized> EngagementApi for &T {
    async fn like(&self, post_id: &PostId) -> Result<(), CoreError> {
        (**self).like(post_id).await
    }
}
