use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::io::BufRead;
use std::ops::Range;
use std::path::Path;
use tracing::{debug_span, info, warn};

use crate::dag::{char_offsets, Dag};
use crate::dictionary_lib::DictMap;

pub mod config;
pub mod cut_mode;
pub mod dag;
pub mod dictionary_lib;
pub mod error;
pub mod hmm;
pub mod keywords;

pub use config::{EngineConfig, PARALLEL_THRESHOLD};
pub use cut_mode::CutMode;
pub use dictionary_lib::{Dictionary, StopWords};
pub use error::{JiebaError, Result};
pub use hmm::HmmModel;
pub use keywords::{IdfTable, Keyword, TfIdf, DEFAULT_TOP_K};

// Script=Han only; script extensions would also match CJK punctuation.
static RUN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\p{sc=Han}+)|([\p{Alphabetic}--\p{sc=Han}]+)|(\p{Nd}+)|(\s+)|([^\p{sc=Han}\p{Alphabetic}\p{Nd}\s]+)",
    )
    .unwrap()
});

/// Character class of a run of input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunKind {
    /// Chinese characters; segmented with the dictionary and the HMM.
    Han,
    Alpha,
    Digit,
    Space,
    Symbol,
}

/// Splits `text` into maximal runs of one character class, as byte ranges.
///
/// The ranges are contiguous and cover `text` exactly.
pub fn split_run_ranges(text: &str) -> Vec<(RunKind, Range<usize>)> {
    RUN_REGEX
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let kind = if caps.get(1).is_some() {
                RunKind::Han
            } else if caps.get(2).is_some() {
                RunKind::Alpha
            } else if caps.get(3).is_some() {
                RunKind::Digit
            } else if caps.get(4).is_some() {
                RunKind::Space
            } else {
                RunKind::Symbol
            };
            Some((kind, whole.range()))
        })
        .collect()
}

/// Segmentation engine context: dictionary, HMM model and keyword tables.
///
/// Every table is owned here, so independent engines can live side by side.
/// All methods take `&self`; the engine can be shared across threads.
pub struct Jieba {
    dictionary: Dictionary,
    hmm: HmmModel,
    tfidf: TfIdf,
    parallel_threshold: usize,
}

impl Jieba {
    /// Engine over a standard dictionary in `word freq pos` format, with the
    /// built-in HMM tables, the default stop words and an empty IDF table.
    ///
    /// The built-in HMM carries start and transition probabilities only, so
    /// unknown words are split without per-character evidence until a trained
    /// model is set with [`with_hmm_model`](Self::with_hmm_model).
    pub fn with_dict<R: BufRead>(dict: R) -> Result<Self> {
        let dictionary = Dictionary::from_reader(dict, "dict")?;
        let hmm = HmmModel::default();
        warn_without_emissions(&hmm);
        Ok(Self::from_parts(dictionary, hmm, TfIdf::default())
            .with_stop_words(StopWords::with_defaults()))
    }

    /// Loads every table named by `config`.
    ///
    /// The standard dictionary must load; a configured user dictionary or
    /// stop-word file that does not exist yet is created on the first add.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut dictionary = Dictionary::from_path(&config.dict_path)?;
        if let Some(path) = &config.user_dict_path {
            dictionary.load_user_dict(path)?;
            dictionary.set_user_dict_path(path);
        }

        let hmm = match &config.hmm_model_path {
            Some(path) => HmmModel::from_path(path)?,
            None => HmmModel::default(),
        };
        warn_without_emissions(&hmm);
        let idf = match &config.idf_path {
            Some(path) => IdfTable::from_path(path)?,
            None => IdfTable::new(),
        };

        let mut stop_words = if config.default_stop_words {
            StopWords::with_defaults()
        } else {
            StopWords::new()
        };
        if let Some(path) = &config.stop_words_path {
            stop_words.load_path(path)?;
            stop_words.set_path(path);
        }

        info!(
            dict = %config.dict_path.display(),
            entries = dictionary.len(),
            total = dictionary.total_frequency(),
            stop_words = stop_words.len(),
            idf_entries = idf.len(),
            "engine initialized"
        );
        Ok(Self::from_parts(dictionary, hmm, TfIdf::new(idf, stop_words))
            .with_parallel_threshold(config.parallel_threshold))
    }

    pub fn from_parts(dictionary: Dictionary, hmm: HmmModel, tfidf: TfIdf) -> Self {
        Jieba {
            dictionary,
            hmm,
            tfidf,
            parallel_threshold: PARALLEL_THRESHOLD,
        }
    }

    /// Overlays a user dictionary (if present) and makes it the `add_dict_word` target.
    pub fn with_user_dict<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        self.dictionary.load_user_dict(path)?;
        self.dictionary.set_user_dict_path(path);
        Ok(self)
    }

    pub fn with_hmm_model(mut self, hmm: HmmModel) -> Self {
        self.hmm = hmm;
        self
    }

    pub fn with_idf_table(mut self, idf: IdfTable) -> Self {
        self.tfidf.set_idf(idf);
        self
    }

    pub fn with_stop_words(mut self, stop_words: StopWords) -> Self {
        self.tfidf.set_stop_words(stop_words);
        self
    }

    /// Makes `path` the `add_stop_word` target, loading it first if it exists.
    pub fn with_stop_words_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        self.tfidf.stop_words().load_path(path)?;
        self.tfidf.stop_words_mut().set_path(path);
        Ok(self)
    }

    pub fn with_parallel_threshold(mut self, bytes: usize) -> Self {
        self.parallel_threshold = bytes;
        self
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn hmm_model(&self) -> &HmmModel {
        &self.hmm
    }

    pub fn tfidf(&self) -> &TfIdf {
        &self.tfidf
    }

    /// Segments `sentence`. Tokens borrow from the input.
    ///
    /// For `Default`, `Accurate` and `NoHmm` the tokens concatenate back to
    /// `sentence`. `Full` and `Search` emit overlapping words as well.
    pub fn cut<'a>(&self, sentence: &'a str, mode: CutMode) -> Vec<&'a str> {
        let _span = debug_span!("cut", mode = mode.name(), bytes = sentence.len()).entered();
        let runs = split_run_ranges(sentence);

        if sentence.len() >= self.parallel_threshold {
            runs.into_par_iter()
                .flat_map_iter(|(kind, range)| self.cut_run(&sentence[range], kind, mode))
                .collect()
        } else {
            runs.into_iter()
                .flat_map(|(kind, range)| self.cut_run(&sentence[range], kind, mode))
                .collect()
        }
    }

    pub fn cut_and_join(&self, sentence: &str, mode: CutMode, delimiter: &str) -> String {
        self.cut(sentence, mode).join(delimiter)
    }

    fn cut_run<'a>(&self, run: &'a str, kind: RunKind, mode: CutMode) -> Vec<&'a str> {
        if kind != RunKind::Han {
            return vec![run];
        }

        let offsets = char_offsets(run);
        let dict = self.dictionary.read_map();
        let dag = Dag::build(run, &offsets, &dict);
        match mode {
            CutMode::Full => dag
                .edges()
                .map(|(i, j)| &run[offsets[i]..offsets[j]])
                .collect(),
            CutMode::Default | CutMode::Accurate | CutMode::NoHmm => {
                self.cut_dag(run, &offsets, &dag, &dict, mode.uses_hmm())
            }
            CutMode::Search => {
                let words = self.cut_dag(run, &offsets, &dag, &dict, true);
                expand_for_search(words, &dict)
            }
        }
    }

    /// Walks the best route; runs of single chars that are not dictionary
    /// words are collected and handed to the HMM (or emitted one by one).
    fn cut_dag<'a>(
        &self,
        run: &'a str,
        offsets: &[usize],
        dag: &Dag,
        dict: &DictMap,
        hmm: bool,
    ) -> Vec<&'a str> {
        let route = dag.best_route(run, offsets, dict);
        let mut words = Vec::with_capacity(dag.len());
        let mut pending: Option<usize> = None;

        let mut i = 0;
        while i < dag.len() {
            let j = route[i].1;
            let word = &run[offsets[i]..offsets[j]];
            if j == i + 1 && !dict.is_real_word(word) {
                pending.get_or_insert(i);
            } else {
                if let Some(start) = pending.take() {
                    self.flush_unknown(&run[offsets[start]..offsets[i]], hmm, &mut words);
                }
                words.push(word);
            }
            i = j;
        }
        if let Some(start) = pending {
            self.flush_unknown(&run[offsets[start]..], hmm, &mut words);
        }
        words
    }

    fn flush_unknown<'a>(&self, span: &'a str, hmm: bool, words: &mut Vec<&'a str>) {
        if hmm && span.chars().nth(1).is_some() {
            words.extend(self.hmm.cut(span));
        } else {
            words.extend(
                span.char_indices()
                    .map(|(offset, ch)| &span[offset..offset + ch.len_utf8()]),
            );
        }
    }

    /// Top keywords of `sentence` by TF-IDF. A `top_k` of zero means [`DEFAULT_TOP_K`].
    pub fn extract_keywords(&self, sentence: &str, top_k: usize) -> Vec<String> {
        self.extract_keywords_weight(sentence, top_k)
            .into_iter()
            .map(|k| k.keyword)
            .collect()
    }

    /// Same ranking as [`extract_keywords`](Self::extract_keywords), with scores.
    pub fn extract_keywords_weight(&self, sentence: &str, top_k: usize) -> Vec<Keyword> {
        let _span = debug_span!("extract_keywords", top_k).entered();
        // Remove newline characters from the input
        let cleaned_input = sentence.replace(|c| c == '\n' || c == '\r', "");
        let words = self.cut(&cleaned_input, CutMode::Accurate);
        self.tfidf.extract(&words, top_k)
    }

    /// Adds a word to the dictionary and the user dictionary file.
    ///
    /// Returns `true` when the word (or a longer word's prefix placeholder)
    /// was already present. Callers validate the word and weight.
    pub fn add_dict_word(&self, word: &str, freq: u64, pos: &str) -> Result<bool> {
        self.dictionary.add_word(word, freq, pos)
    }

    /// Adds a stop word. Returns `true` when it was already present.
    pub fn add_stop_word(&self, word: &str) -> Result<bool> {
        self.tfidf.stop_words().add(word)
    }
}

fn warn_without_emissions(hmm: &HmmModel) {
    if !hmm.has_emissions() {
        warn!("HMM model has no emission tables, unknown words are split by transitions only");
    }
}

/// After each token longer than two chars, appends the dictionary words of
/// length 2 inside it, then (for tokens longer than three) those of length 3.
fn expand_for_search<'a>(words: Vec<&'a str>, dict: &DictMap) -> Vec<&'a str> {
    let mut out = Vec::with_capacity(words.len());
    for word in words {
        out.push(word);
        let offsets = char_offsets(word);
        let n = offsets.len() - 1;
        for gram in [2, 3] {
            if n <= gram {
                continue;
            }
            for i in 0..=n - gram {
                let sub = &word[offsets[i]..offsets[i + gram]];
                if dict.is_real_word(sub) {
                    out.push(sub);
                }
            }
        }
    }
    out
}
