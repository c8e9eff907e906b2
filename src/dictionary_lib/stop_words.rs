use std::collections::HashSet;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use include_flate::flate;
use tracing::{debug, info};

use crate::dictionary_lib::{append_line, for_each_line, open_text_source, source_name};
use crate::error::{JiebaError, Result};

flate!(static DEFAULT_STOP_WORDS: str from "src/dictionary_lib/dicts/stop_words.txt");

/// Words never reported as keywords. Matching is case-insensitive.
#[derive(Debug, Default)]
pub struct StopWords {
    words: RwLock<HashSet<String>>,
    path: Option<PathBuf>,
}

impl StopWords {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The embedded default list (common Chinese function words and English stop words).
    pub fn with_defaults() -> Self {
        let stop_words = Self::new();
        stop_words.extend_from_str(&DEFAULT_STOP_WORDS);
        stop_words
    }

    /// Sets the file `add` appends to.
    pub fn set_path<P: Into<PathBuf>>(&mut self, path: P) {
        self.path = Some(path.into());
    }

    /// Loads one word per line from `path` if it exists.
    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(false);
        }
        let name = source_name(path);
        let reader = open_text_source(path).map_err(|source| JiebaError::DictLoad {
            name: name.clone(),
            source,
        })?;
        self.load_reader(reader, &name)?;
        Ok(true)
    }

    pub fn load_reader<R: BufRead>(&self, reader: R, name: &str) -> Result<()> {
        let mut words = self.words.write().unwrap_or_else(PoisonError::into_inner);
        let before = words.len();
        for_each_line(reader, name, |_, line| {
            let word = line.trim();
            if !word.is_empty() {
                words.insert(word.to_lowercase());
            }
        })
        .map_err(|source| JiebaError::DictLoad {
            name: name.to_owned(),
            source,
        })?;
        info!(name, added = words.len() - before, "stop words loaded");
        Ok(())
    }

    fn extend_from_str(&self, text: &str) {
        let mut words = self.words.write().unwrap_or_else(PoisonError::into_inner);
        words.extend(
            text.lines()
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(str::to_lowercase),
        );
    }

    pub fn contains(&self, word: &str) -> bool {
        let words = self.words.read().unwrap_or_else(PoisonError::into_inner);
        words.contains(&word.to_lowercase())
    }

    /// Adds a stop word. Returns `true` if it was already present.
    ///
    /// With a configured path the word is appended there under the same lock.
    pub fn add(&self, word: &str) -> Result<bool> {
        let key = word.to_lowercase();
        let mut words = self.words.write().unwrap_or_else(PoisonError::into_inner);
        if words.contains(&key) {
            return Ok(true);
        }
        match &self.path {
            Some(path) => append_line(path, word)?,
            None => debug!(word, "no stop-word file configured, word kept in memory"),
        }
        words.insert(key);
        Ok(false)
    }

    pub fn len(&self) -> usize {
        self.words.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
