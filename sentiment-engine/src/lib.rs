//! Sentiment classification boundary.
//!
//! A [`SentimentModel`] may fail; a [`SentimentClassifier`] may not. The
//! [`GuardedClassifier`] adapter turns the former into the latter by mapping
//! every failure, including a panicking model, to [`SentimentLabel::Neutral`].

pub mod lexicon;

pub use lexicon::LexiconModel;

use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::warn;
use trendwatch_core::{SentimentError, SentimentLabel};

/// A concrete model that may fail on a given text.
pub trait SentimentModel {
    fn predict(&self, text: &str) -> Result<SentimentLabel, SentimentError>;
}

impl<F> SentimentModel for F
where
    F: Fn(&str) -> Result<SentimentLabel, SentimentError>,
{
    fn predict(&self, text: &str) -> Result<SentimentLabel, SentimentError> {
        self(text)
    }
}

/// Infallible classification as consumed by the pipeline.
pub trait SentimentClassifier {
    fn classify(&self, text: &str) -> SentimentLabel;
}

impl<T: SentimentClassifier + ?Sized> SentimentClassifier for &T {
    fn classify(&self, text: &str) -> SentimentLabel {
        (**self).classify(text)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GuardedClassifier<M> {
    model: M,
}

impl<M: SentimentModel> GuardedClassifier<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

impl<M: SentimentModel> SentimentClassifier for GuardedClassifier<M> {
    fn classify(&self, text: &str) -> SentimentLabel {
        match catch_unwind(AssertUnwindSafe(|| self.model.predict(text))) {
            Ok(Ok(label)) => label,
            Ok(Err(e)) => {
                warn!("Sentiment analysis failed: {}", e);
                SentimentLabel::Neutral
            }
            Err(_) => {
                warn!("Sentiment model panicked; counting post as neutral");
                SentimentLabel::Neutral
            }
        }
    }
}

/// Parse the label vocabulary emitted by text-classification models.
pub fn parse_model_label(raw: &str) -> Result<SentimentLabel, SentimentError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "POSITIVE" | "POS" | "LABEL_2" => Ok(SentimentLabel::Positive),
        "NEGATIVE" | "NEG" | "LABEL_0" => Ok(SentimentLabel::Negative),
        "NEUTRAL" | "NEU" | "LABEL_1" => Ok(SentimentLabel::Neutral),
        _ => Err(SentimentError::UnknownLabel {
            label: raw.to_string(),
        }),
    }
}

/// Adapter for external models that answer with a raw label string.
pub struct RawLabelModel<F> {
    infer: F,
}

impl<F> RawLabelModel<F>
where
    F: Fn(&str) -> Result<String, String>,
{
    pub fn new(infer: F) -> Self {
        Self { infer }
    }
}

impl<F> SentimentModel for RawLabelModel<F>
where
    F: Fn(&str) -> Result<String, String>,
{
    fn predict(&self, text: &str) -> Result<SentimentLabel, SentimentError> {
        let raw = (self.infer)(text).map_err(|reason| SentimentError::InferenceFailed { reason })?;
        parse_model_label(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_maps_to_neutral() {
        let classifier = GuardedClassifier::new(|_: &str| -> Result<SentimentLabel, SentimentError> {
            Err(SentimentError::InferenceFailed {
                reason: "model offline".to_string(),
            })
        });
        assert_eq!(classifier.classify("wonderful"), SentimentLabel::Neutral);
    }

    #[test]
    fn test_model_panic_maps_to_neutral() {
        let classifier = GuardedClassifier::new(|text: &str| -> Result<SentimentLabel, SentimentError> {
            panic!("tokenizer exploded on {}", text)
        });
        assert_eq!(classifier.classify("anything"), SentimentLabel::Neutral);
    }

    #[test]
    fn test_successful_prediction_passes_through() {
        let classifier = GuardedClassifier::new(LexiconModel::new());
        assert_eq!(classifier.classify("I love this"), SentimentLabel::Positive);
        assert_eq!(classifier.classify(""), SentimentLabel::Neutral);
    }

    #[test]
    fn test_parse_model_label() {
        assert_eq!(parse_model_label("POSITIVE"), Ok(SentimentLabel::Positive));
        assert_eq!(parse_model_label("negative"), Ok(SentimentLabel::Negative));
        assert_eq!(parse_model_label(" LABEL_1 "), Ok(SentimentLabel::Neutral));
        assert!(matches!(
            parse_model_label("MIXED"),
            Err(SentimentError::UnknownLabel { .. })
        ));
    }

    #[test]
    fn test_raw_label_model_through_boundary() {
        let model = RawLabelModel::new(|text: &str| {
            if text.contains("swift") {
                Ok("POSITIVE".to_string())
            } else if text.is_empty() {
                Err("empty batch".to_string())
            } else {
                Ok("SARCASTIC".to_string())
            }
        });
        let classifier = GuardedClassifier::new(model);
        assert_eq!(classifier.classify("swift"), SentimentLabel::Positive);
        assert_eq!(classifier.classify(""), SentimentLabel::Neutral);
        assert_eq!(classifier.classify("sure, great"), SentimentLabel::Neutral);
    }
}
