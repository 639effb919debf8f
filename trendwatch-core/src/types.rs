use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp layout shared by the trend store and the tabular export.
pub const TREND_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub text: String,
}

impl Post {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: PostId::new(id),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped sentiment summary for a single pipeline run.
///
/// Timestamps are kept at whole-second precision so that a record read back
/// from either sink compares equal to the one that was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendRecord {
    pub timestamp: DateTime<Utc>,
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
}

impl TrendRecord {
    pub fn new(timestamp: DateTime<Utc>, positive: u32, neutral: u32, negative: u32) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(0),
            positive,
            neutral,
            negative,
        }
    }

    pub fn total(&self) -> u32 {
        self.positive + self.neutral + self.negative
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TREND_TIMESTAMP_FORMAT).to_string()
    }

    pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(raw, TREND_TIMESTAMP_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    Forbidden,
    Unauthorized,
    RateLimited,
    Unexpected(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Forbidden => f.write_str("forbidden"),
            RejectReason::Unauthorized => f.write_str("unauthorized"),
            RejectReason::RateLimited => f.write_str("rate-limited"),
            RejectReason::Unexpected(detail) => write!(f, "unexpected:{}", detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngagementOutcome {
    Liked,
    SkippedAlreadyLiked,
    Rejected(RejectReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementAttempt {
    pub post_id: PostId,
    pub outcome: EngagementOutcome,
}

impl EngagementAttempt {
    pub fn is_liked(&self) -> bool {
        matches!(self.outcome, EngagementOutcome::Liked)
    }
}

/// Throttling hint read from a provider response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitState {
    pub reset_epoch_seconds: Option<i64>,
}

impl RateLimitState {
    pub fn from_header(value: Option<&str>) -> Self {
        Self {
            reset_epoch_seconds: value.and_then(|v| v.trim().parse::<i64>().ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_trend_record_truncates_subseconds() {
        let ts = Utc.timestamp_millis_opt(1_700_000_000_750).unwrap();
        let record = TrendRecord::new(ts, 2, 1, 0);
        assert_eq!(record.timestamp.timestamp_subsec_millis(), 0);
        assert_eq!(record.total(), 3);
    }

    #[test]
    fn test_timestamp_format_round_trip() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 17, 4, 59).unwrap();
        let record = TrendRecord::new(ts, 0, 0, 0);
        assert_eq!(record.formatted_timestamp(), "2024-03-09 17:04:59");
        assert_eq!(
            TrendRecord::parse_timestamp(&record.formatted_timestamp()),
            Some(ts)
        );
        assert_eq!(TrendRecord::parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_reject_reason_display() {
        assert_eq!(RejectReason::Forbidden.to_string(), "forbidden");
        assert_eq!(RejectReason::Unauthorized.to_string(), "unauthorized");
        assert_eq!(RejectReason::RateLimited.to_string(), "rate-limited");
        assert_eq!(
            RejectReason::Unexpected("boom".to_string()).to_string(),
            "unexpected:boom"
        );
    }

    #[test]
    fn test_rate_limit_state_from_header() {
        assert_eq!(
            RateLimitState::from_header(Some("1700000000")).reset_epoch_seconds,
            Some(1_700_000_000)
        );
        assert_eq!(RateLimitState::from_header(Some("soon")).reset_epoch_seconds, None);
        assert_eq!(RateLimitState::from_header(None).reset_epoch_seconds, None);
    }
}
