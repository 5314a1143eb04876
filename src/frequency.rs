use std::{cmp::Ordering, collections::HashMap};

use serde::{Deserialize, Serialize};

use crate::{stopwords::StopWords, tokenizer::Segmenter};

/// Inclusive bounds on a token's character count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthRange {
    pub min: usize,
    pub max: usize,
}

impl Default for LengthRange {
    fn default() -> Self {
        LengthRange { min: 2, max: 5 }
    }
}

impl LengthRange {
    pub fn new(min: usize, max: usize) -> Self {
        LengthRange { min, max }
    }

    pub fn contains(&self, len: usize) -> bool {
        self.min <= len && len <= self.max
    }
}

/// 按词长调整词频的策略
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeightingPolicy {
    /// Score is the raw count.
    Unweighted,
    /// Tokens of at least `min_len` characters are multiplied by `factor`,
    /// shorter ones keep their count.
    FavorLong {
        #[serde(default = "default_long_factor")]
        factor: f64,
        #[serde(default = "default_long_min_len")]
        min_len: usize,
        #[serde(default)]
        truncate: bool,
    },
    /// Long tokens are boosted and short tokens damped.
    Tiered {
        #[serde(default = "default_long_factor")]
        long_factor: f64,
        #[serde(default = "default_long_min_len")]
        long_min_len: usize,
        #[serde(default = "default_short_factor")]
        short_factor: f64,
    },
}

fn default_long_factor() -> f64 {
    3.5
}

fn default_long_min_len() -> usize {
    3
}

fn default_short_factor() -> f64 {
    0.5
}

impl Default for WeightingPolicy {
    fn default() -> Self {
        WeightingPolicy::Unweighted
    }
}

impl WeightingPolicy {
    pub fn favor_long(factor: f64) -> Self {
        WeightingPolicy::FavorLong {
            factor,
            min_len: default_long_min_len(),
            truncate: false,
        }
    }

    pub fn tiered(long_factor: f64, short_factor: f64) -> Self {
        WeightingPolicy::Tiered {
            long_factor,
            long_min_len: default_long_min_len(),
            short_factor,
        }
    }

    /// Score for a token of `len` characters seen `count` times.
    pub fn weigh(&self, len: usize, count: usize) -> f64 {
        let count = count as f64;
        match *self {
            WeightingPolicy::Unweighted => count,
            WeightingPolicy::FavorLong {
                factor,
                min_len,
                truncate,
            } => {
                if len < min_len {
                    count
                } else if truncate {
                    (count * factor).trunc()
                } else {
                    count * factor
                }
            }
            WeightingPolicy::Tiered {
                long_factor,
                long_min_len,
                short_factor,
            } => {
                if len >= long_min_len {
                    count * long_factor
                } else {
                    count * short_factor
                }
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    #[serde(default)]
    pub length: LengthRange,
    #[serde(default)]
    pub weighting: WeightingPolicy,
}

/// Token to weighted score.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Vocabulary {
    scores: HashMap<String, f64>,
}

impl FromIterator<(String, f64)> for Vocabulary {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Vocabulary {
            scores: iter.into_iter().collect(),
        }
    }
}

impl Vocabulary {
    pub fn get(&self, token: &str) -> Option<f64> {
        self.scores.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.scores.iter().map(|(token, score)| (token.as_str(), *score))
    }

    pub fn total(&self) -> f64 {
        self.scores.values().sum()
    }

    /// Entries sorted by score descending, ties by token.
    pub fn sorted(&self) -> Vec<(&str, f64)> {
        let mut entries: Vec<(&str, f64)> = self.iter().collect();
        entries.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        entries
    }

    pub fn top_k(&self, k: usize) -> Vec<(&str, f64)> {
        let mut entries = self.sorted();
        entries.truncate(k);
        entries
    }

    /// 以最高分为 1 归一化，取前 `max_words` 个，0 表示不限
    pub fn normalized(&self, max_words: usize) -> Vec<(&str, f32)> {
        let mut entries = self.sorted();
        if max_words > 0 {
            entries.truncate(max_words);
        }

        let max_score = match entries.first() {
            Some((_, score)) if *score > 0.0 => *score,
            _ => return vec![],
        };

        entries
            .into_iter()
            .map(|(token, score)| (token, (score / max_score) as f32))
            .collect()
    }
}

/// Turns raw text into a weighted vocabulary.
pub struct Aggregator<'a, S: Segmenter> {
    segmenter: &'a S,
    stop_words: &'a StopWords,
    config: AggregationConfig,
}

impl<'a, S: Segmenter> Aggregator<'a, S> {
    pub fn new(segmenter: &'a S, stop_words: &'a StopWords, config: AggregationConfig) -> Self {
        Aggregator {
            segmenter,
            stop_words,
            config,
        }
    }

    /// 分词、计数、去停用词
    pub fn count<'t>(&self, text: &'t str) -> HashMap<&'t str, usize> {
        let mut frequencies = HashMap::new();

        for token in self.segmenter.segment(text) {
            let entry = frequencies.entry(token).or_insert(0);
            *entry += 1;
        }

        frequencies.retain(|token, _| !self.stop_words.contains(token));
        frequencies
    }

    pub fn aggregate(&self, text: &str) -> Vocabulary {
        self.count(text)
            .into_iter()
            .filter_map(|(token, count)| {
                let len = token.chars().count();
                if !self.config.length.contains(len) {
                    return None;
                }
                Some((token.to_string(), self.config.weighting.weigh(len, count)))
            })
            .collect()
    }
}
