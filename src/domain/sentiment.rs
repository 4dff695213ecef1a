//! Keyword sentiment scoring of news text into a semantic pressure index (SPI).
//!
//! Each article scores +1 per positive phrase and -1 per negative phrase found
//! (case-insensitive) in its title and description. The per-article scores are
//! averaged and mapped onto `spi = clamp(50 + avg * 10, 0, 100)`.
//!
//! Known quirk, pending product clarification: only the first
//! [`MAX_SCORED_ARTICLES`] articles contribute to the sum, but the average
//! divides by the full article count. Large batches are therefore diluted
//! toward 50. This is kept exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use super::append_log::AppendLog;
use super::decision::NEUTRAL_PRESSURE;
use crate::ports::clock_port::ClockPort;
use crate::ports::news_port::NewsPort;

pub const MAX_SCORED_ARTICLES: usize = 20;

const SPI_PER_POINT: f64 = 10.0;
const POSITIVE_ABOVE: f64 = 55.0;
const NEGATIVE_BELOW: f64 = 45.0;

pub const POSITIVE_PHRASES: &[&str] = &[
    "surge",
    "rally",
    "soar",
    "record high",
    "beats expectations",
    "upgrade",
    "bullish",
    "partnership",
    "approval",
    "adoption",
    "breakthrough",
    "inflow",
    "buyback",
    "strong demand",
    "all-time high",
];

pub const NEGATIVE_PHRASES: &[&str] = &[
    "plunge",
    "crash",
    "selloff",
    "sell-off",
    "downgrade",
    "bearish",
    "lawsuit",
    "hack",
    "regulatory ban",
    "outflow",
    "misses expectations",
    "investigation",
    "bankruptcy",
    "liquidation",
    "fraud",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub symbol: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewsItem {
    pub fn new(symbol: &str, title: &str, body: &str) -> Self {
        NewsItem {
            symbol: symbol.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            timestamp: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn from_spi(spi: f64) -> Self {
        if spi > POSITIVE_ABOVE {
            SentimentLabel::Positive
        } else if spi < NEGATIVE_BELOW {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRecord {
    pub symbol: String,
    pub spi: f64,
    pub label: SentimentLabel,
    pub timestamp: DateTime<Utc>,
}

/// Net keyword score of a single article.
pub fn article_score(item: &NewsItem) -> i64 {
    let text = format!("{} {}", item.title, item.body).to_lowercase();
    let hits = |phrases: &[&str]| phrases.iter().filter(|p| text.contains(*p)).count() as i64;
    hits(POSITIVE_PHRASES) - hits(NEGATIVE_PHRASES)
}

/// SPI of a batch. Empty input is exactly neutral.
pub fn compute_spi(items: &[NewsItem]) -> f64 {
    let sum: i64 = items
        .iter()
        .take(MAX_SCORED_ARTICLES)
        .map(article_score)
        .sum();
    let avg = sum as f64 / items.len().max(1) as f64;
    (NEUTRAL_PRESSURE + avg * SPI_PER_POINT).clamp(0.0, 100.0)
}

pub struct SentimentScorer {
    clock: Arc<dyn ClockPort>,
    results: AppendLog<SentimentRecord>,
}

impl SentimentScorer {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        SentimentScorer {
            clock,
            results: AppendLog::new(),
        }
    }

    /// Scores `items` for `symbol` and appends the record to the results.
    pub fn score(&self, symbol: &str, items: &[NewsItem]) -> SentimentRecord {
        let spi = compute_spi(items);
        let record = SentimentRecord {
            symbol: symbol.to_string(),
            spi,
            label: SentimentLabel::from_spi(spi),
            timestamp: self.clock.now(),
        };
        debug!(symbol, articles = items.len(), spi, label = %record.label, "scored sentiment");
        self.results.append(record.clone());
        record
    }

    /// Fetches news through `source` and scores it. A failed fetch scores as
    /// zero articles.
    pub fn score_from(&self, source: &dyn NewsPort, symbol: &str) -> SentimentRecord {
        let items = match source.fetch_news(symbol) {
            Ok(items) => items,
            Err(e) => {
                warn!(symbol, error = %e, "news fetch failed, scoring as neutral");
                Vec::new()
            }
        };
        self.score(symbol, &items)
    }

    pub fn results(&self) -> Vec<SentimentRecord> {
        self.results.snapshot()
    }
}
