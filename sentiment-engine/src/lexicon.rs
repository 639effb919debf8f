use crate::SentimentModel;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use trendwatch_core::{SentimentError, SentimentLabel};

static LEXICON: Lazy<Result<HashMap<String, i32>, String>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).map_err(|e| e.to_string())
});

/// How many preceding tokens are checked for a negator.
const NEGATION_WINDOW: usize = 3;

/// Word-weight scorer over the bundled lexicon.
#[derive(Debug, Clone, Default)]
pub struct LexiconModel;

impl LexiconModel {
    pub fn new() -> Self {
        Self
    }

    /// Returns (score, token count). A negator within the preceding
    /// `NEGATION_WINDOW` tokens flips the sign of a word's weight.
    pub fn score_text(&self, text: &str) -> Result<(i32, usize), SentimentError> {
        let lexicon = LEXICON
            .as_ref()
            .map_err(|reason| SentimentError::LexiconUnavailable {
                reason: reason.clone(),
            })?;

        let tokens: Vec<String> = tokenize(text).collect();
        let mut score = 0i32;

        for (i, token) in tokens.iter().enumerate() {
            let base = lexicon.get(token.as_str()).copied().unwrap_or(0);
            if base == 0 {
                continue;
            }
            let negated = (1..=NEGATION_WINDOW).any(|k| i >= k && is_negator(&tokens[i - k]));
            score += if negated { -base } else { base };
        }

        Ok((score, tokens.len()))
    }
}

impl SentimentModel for LexiconModel {
    fn predict(&self, text: &str) -> Result<SentimentLabel, SentimentError> {
        if text.trim().is_empty() {
            return Err(SentimentError::EmptyInput);
        }
        let (score, _) = self.score_text(text)?;
        Ok(match score {
            s if s > 0 => SentimentLabel::Positive,
            s if s < 0 => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        })
    }
}

/// Lower-cased tokens; apostrophes stay inside words so "isn't" survives.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "can't"
            | "cannot"
            | "don't"
            | "doesn't"
            | "didn't"
            | "without"
    )
}
