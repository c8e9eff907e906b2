//! TF-IDF keyword ranking over segmented text.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::dictionary_lib::{for_each_line, open_text_source, source_name, StopWords};
use crate::error::{JiebaError, Result};

/// Number of keywords returned when the caller asks for none.
pub const DEFAULT_TOP_K: usize = 20;

/// Keyword with weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub keyword: String,
    pub weight: f64,
}

/// Maps a requested count to the number of keywords to return:
/// zero or negative means [`DEFAULT_TOP_K`].
pub fn top_k_from_request(count: i64) -> usize {
    if count <= 0 {
        DEFAULT_TOP_K
    } else {
        usize::try_from(count).unwrap_or(usize::MAX)
    }
}

/// Inverse document frequency per word.
///
/// Words missing from the table get the median of the loaded weights.
#[derive(Debug, Clone)]
pub struct IdfTable {
    weights: HashMap<String, f64>,
    default_weight: f64,
}

impl Default for IdfTable {
    fn default() -> Self {
        IdfTable {
            weights: HashMap::new(),
            default_weight: 1.0,
        }
    }
}

impl IdfTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `word weight` lines; lines without a numeric weight or not valid
    /// UTF-8 are skipped.
    pub fn from_reader<R: BufRead>(reader: R, name: &str) -> Result<Self> {
        let mut weights = HashMap::new();
        for_each_line(reader, name, |line_no, line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next().and_then(|w| w.parse::<f64>().ok())) {
                (Some(word), Some(weight)) if weight.is_finite() => {
                    weights.insert(word.to_lowercase(), weight);
                }
                _ => trace!(name, line = line_no, "skipped malformed IDF line"),
            }
        })
        .map_err(|source| JiebaError::IdfLoad {
            name: name.to_owned(),
            source,
        })?;
        let table = Self::from_weights(weights);
        info!(
            name,
            entries = table.weights.len(),
            default_weight = table.default_weight,
            "IDF table loaded"
        );
        Ok(table)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = source_name(path);
        let reader = open_text_source(path).map_err(|source| JiebaError::IdfLoad {
            name: name.clone(),
            source,
        })?;
        Self::from_reader(reader, &name)
    }

    pub fn from_weights(weights: HashMap<String, f64>) -> Self {
        let default_weight = median(weights.values().copied().collect()).unwrap_or(1.0);
        IdfTable {
            weights,
            default_weight,
        }
    }

    pub fn weight(&self, word: &str) -> f64 {
        self.weights
            .get(&word.to_lowercase())
            .copied()
            .unwrap_or(self.default_weight)
    }

    pub fn default_weight(&self) -> f64 {
        self.default_weight
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Some(values[values.len() / 2])
}

/// TF-IDF extractor: stop words and IDF weights, both owned by the engine.
#[derive(Debug, Default)]
pub struct TfIdf {
    idf: IdfTable,
    stop_words: StopWords,
}

impl TfIdf {
    pub fn new(idf: IdfTable, stop_words: StopWords) -> Self {
        TfIdf { idf, stop_words }
    }

    pub fn idf(&self) -> &IdfTable {
        &self.idf
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    pub(crate) fn stop_words_mut(&mut self) -> &mut StopWords {
        &mut self.stop_words
    }

    pub(crate) fn set_idf(&mut self, idf: IdfTable) {
        self.idf = idf;
    }

    pub(crate) fn set_stop_words(&mut self, stop_words: StopWords) {
        self.stop_words = stop_words;
    }

    fn is_candidate(&self, token: &str) -> bool {
        let mut chars = token.chars();
        chars.next().is_some()
            && chars.next().is_some()
            && token.chars().any(char::is_alphanumeric)
            && !self.stop_words.contains(token)
    }

    /// Ranks `tokens` by term frequency times IDF.
    ///
    /// Single-character tokens, tokens without any letter or digit and stop
    /// words are dropped. Equal scores keep first-occurrence order. A `top_k`
    /// of zero means [`DEFAULT_TOP_K`].
    pub fn extract(&self, tokens: &[&str], top_k: usize) -> Vec<Keyword> {
        let top_k = if top_k == 0 { DEFAULT_TOP_K } else { top_k };

        let mut order: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut total = 0usize;
        for &token in tokens {
            if !self.is_candidate(token) {
                continue;
            }
            total += 1;
            let count = counts.entry(token).or_insert(0);
            if *count == 0 {
                order.push(token);
            }
            *count += 1;
        }

        let mut keywords: Vec<Keyword> = order
            .into_iter()
            .map(|word| Keyword {
                keyword: word.to_owned(),
                weight: counts[word] as f64 / total as f64 * self.idf.weight(word),
            })
            .collect();
        // stable: ties stay in first-occurrence order
        keywords.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));
        keywords.truncate(top_k);
        debug!(candidates = counts.len(), returned = keywords.len(), "keywords ranked");
        keywords
    }
}
