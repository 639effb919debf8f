use chrono::{DateTime, Utc};
use sentiment_engine::SentimentClassifier;
use trendwatch_core::{Post, SentimentLabel, TrendRecord};

/// Running sentiment counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregator {
    positive: u32,
    neutral: u32,
    negative: u32,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Negative => self.negative += 1,
            SentimentLabel::Neutral => self.neutral += 1,
        }
    }

    pub fn processed(&self) -> u32 {
        self.positive + self.neutral + self.negative
    }

    /// Stamp the counts once, at summary time.
    pub fn finish(self, timestamp: DateTime<Utc>) -> TrendRecord {
        TrendRecord::new(timestamp, self.positive, self.neutral, self.negative)
    }
}

pub fn summarize<C: SentimentClassifier>(
    posts: &[Post],
    classifier: &C,
    timestamp: DateTime<Utc>,
) -> TrendRecord {
    let mut aggregator = Aggregator::new();
    for post in posts {
        aggregator.record(classifier.classify(&post.text));
    }
    aggregator.finish(timestamp)
}
