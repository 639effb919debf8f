use social_client::EngagementApi;
use std::collections::HashSet;
use tracing::{info, warn};
use trendwatch_core::{
    CoreError, EngagementAttempt, EngagementOutcome, Post, PostId, RejectReason, SocialApiError,
};

/// Map an engagement failure to the reason recorded for the attempt.
pub fn rejection_reason(error: &CoreError) -> RejectReason {
    match error {
        CoreError::SocialApi(SocialApiError::Forbidden { .. }) => RejectReason::Forbidden,
        CoreError::SocialApi(SocialApiError::Unauthorized { .. }) => RejectReason::Unauthorized,
        CoreError::SocialApi(SocialApiError::RateLimitExceeded { .. }) => RejectReason::RateLimited,
        other => RejectReason::Unexpected(other.to_string()),
    }
}

/// Per-run like gate. Create one per run; the seen-set is never carried over.
pub struct EngagementGate<'a, E> {
    api: &'a E,
    trigger: String,
    seen: HashSet<PostId>,
}

impl<'a, E: EngagementApi> EngagementGate<'a, E> {
    pub fn new(api: &'a E, trigger_keyword: &str) -> Self {
        Self {
            api,
            trigger: trigger_keyword.to_lowercase(),
            seen: HashSet::new(),
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        post.text.to_lowercase().contains(&self.trigger)
    }

    pub fn seen(&self) -> &HashSet<PostId> {
        &self.seen
    }

    /// `None` when the post does not mention the trigger keyword. A post id
    /// gets at most one remote call per run, whatever that call returns.
    pub async fn maybe_engage(&mut self, post: &Post) -> Option<EngagementAttempt> {
        if !self.matches(post) {
            return None;
        }

        if self.seen.contains(&post.id) {
            return Some(EngagementAttempt {
                post_id: post.id.clone(),
                outcome: EngagementOutcome::SkippedAlreadyLiked,
            });
        }
        self.seen.insert(post.id.clone());

        let outcome = match self.api.like(&post.id).await {
            Ok(()) => {
                info!("Successfully liked post with ID: {}", post.id);
                EngagementOutcome::Liked
            }
            Err(e) => {
                let reason = rejection_reason(&e);
                match &reason {
                    RejectReason::Forbidden => warn!(
                        "Forbidden error: unable to like post {}. Access level might be limited. {}",
                        post.id, e
                    ),
                    RejectReason::Unauthorized => {
                        warn!("Unauthorized: check your credentials or token. {}", e)
                    }
                    RejectReason::RateLimited => {
                        warn!("Rate limit exceeded while liking post {}. {}", post.id, e)
                    }
                    RejectReason::Unexpected(_) => {
                        warn!("Unexpected error liking post with ID {}: {}", post.id, e)
                    }
                }
                EngagementOutcome::Rejected(reason)
            }
        };

        Some(EngagementAttempt {
            post_id: post.id.clone(),
            outcome,
        })
    }
}
