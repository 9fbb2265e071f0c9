use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

use crate::corpus::PostSample;

/// Maximum number of keywords reported in [`CorpusMetrics::top_keywords`].
pub const MAX_KEYWORDS: usize = 15;

/// Tokens of this many characters or fewer never count as keywords.
pub const MIN_KEYWORD_CHARS: usize = 3;

/// Function words left out of keyword ranking.
pub const STOPWORDS: [&str; 21] = [
    "the", "and", "of", "to", "in", "a", "is", "for", "on", "with", "that", "as", "it", "this",
    "are", "was", "be", "or", "by", "from", "an",
];

static WORD_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-zA-Z']+\b").expect("word token pattern is valid"));

/// Lightweight statistics over the selected samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorpusMetrics {
    #[serde(rename = "avg_sentence_length")]
    pub average_sentence_length: f64,
    pub top_keywords: Vec<String>,
    pub sample_count: usize,
    pub total_tokens: usize,
}

impl CorpusMetrics {
    /// Metric keys paired with display values, in prompt order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                "avg_sentence_length",
                format!("{:.2}", self.average_sentence_length),
            ),
            ("top_keywords", self.top_keywords.join(", ")),
            ("sample_count", self.sample_count.to_string()),
            ("total_tokens", self.total_tokens.to_string()),
        ]
    }
}

/// Compute corpus statistics for `samples`.
///
/// All texts are joined with a single space before sentence splitting and
/// tokenizing, so a sentence may span two samples when the first one does not
/// end in punctuation.
pub fn summarize(samples: &[PostSample]) -> CorpusMetrics {
    let combined = samples
        .iter()
        .map(|sample| sample.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let lowered = combined.to_lowercase();
    let tokens: Vec<&str> = WORD_TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .collect();

    CorpusMetrics {
        average_sentence_length: average_sentence_length(&combined),
        top_keywords: top_keywords(&tokens),
        sample_count: samples.len(),
        total_tokens: tokens.len(),
    }
}

fn average_sentence_length(text: &str) -> f64 {
    let word_counts: Vec<usize> = text
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .map(|sentence| sentence.split_whitespace().count())
        .collect();

    if word_counts.is_empty() {
        return 0.0;
    }
    let mean = word_counts.iter().sum::<usize>() as f64 / word_counts.len() as f64;
    (mean * 100.0).round_ties_even() / 100.0
}

/// Most frequent non-stopword tokens; ties keep first-seen order.
fn top_keywords(tokens: &[&str]) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for &token in tokens {
        if token.chars().count() <= MIN_KEYWORD_CHARS || STOPWORDS.contains(&token) {
            continue;
        }
        match positions.get(token) {
            Some(&index) => counts[index].1 += 1,
            None => {
                positions.insert(token, counts.len());
                counts.push((token, 1));
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(word, _)| word.to_string())
        .collect()
}
