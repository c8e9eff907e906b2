//! Hidden Markov model for words missing from the dictionary.
//!
//! Every character of an unrecognized span is labeled Begin/Middle/End/Single
//! by Viterbi decoding, and the labels are folded back into words.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dictionary_lib::{open_text_source, source_name};
use crate::error::{JiebaError, Result};

/// Log-probability used for impossible starts and transitions.
pub const MIN_FLOAT: f64 = -3.14e100;

/// Emission log-probability for characters a state never emitted in training.
pub const DEFAULT_EMIT_FLOOR: f64 = -20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HmmState {
    Begin = 0,
    Middle = 1,
    End = 2,
    Single = 3,
}

impl HmmState {
    pub const ALL: [HmmState; 4] = [Self::Begin, Self::Middle, Self::End, Self::Single];

    /// States that may precede `self` in a well-formed label sequence.
    fn predecessors(self) -> &'static [HmmState] {
        match self {
            Self::Begin => &[Self::End, Self::Single],
            Self::Middle => &[Self::Middle, Self::Begin],
            Self::End => &[Self::Begin, Self::Middle],
            Self::Single => &[Self::Single, Self::End],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Begin => "B",
            Self::Middle => "M",
            Self::End => "E",
            Self::Single => "S",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "B" => Some(Self::Begin),
            "M" => Some(Self::Middle),
            "E" => Some(Self::End),
            "S" => Some(Self::Single),
            _ => None,
        }
    }
}

/// Static model tables, all in natural-log space.
#[derive(Debug, Clone)]
pub struct HmmModel {
    start: [f64; 4],
    trans: [[f64; 4]; 4],
    emit: [HashMap<char, f64>; 4],
    emit_floor: f64,
}

impl Default for HmmModel {
    /// Start and transition probabilities of the reference Chinese model,
    /// without emission tables.
    fn default() -> Self {
        let mut trans = [[MIN_FLOAT; 4]; 4];
        trans[HmmState::Begin as usize][HmmState::End as usize] = -0.510825623765990;
        trans[HmmState::Begin as usize][HmmState::Middle as usize] = -0.916290731874155;
        trans[HmmState::End as usize][HmmState::Begin as usize] = -0.5897149736854513;
        trans[HmmState::End as usize][HmmState::Single as usize] = -0.8085250474669937;
        trans[HmmState::Middle as usize][HmmState::End as usize] = -0.33344856811948514;
        trans[HmmState::Middle as usize][HmmState::Middle as usize] = -1.2603623820268226;
        trans[HmmState::Single as usize][HmmState::Begin as usize] = -0.7211965654669841;
        trans[HmmState::Single as usize][HmmState::Single as usize] = -0.6658631448798212;

        HmmModel {
            start: [-0.26268660809250016, MIN_FLOAT, MIN_FLOAT, -1.4652633398537678],
            trans,
            emit: Default::default(),
            emit_floor: DEFAULT_EMIT_FLOOR,
        }
    }
}

/// On-disk form: states keyed by their one-letter labels.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HmmTables {
    pub start: BTreeMap<String, f64>,
    pub trans: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub emit: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub emit_floor: Option<f64>,
}

impl HmmModel {
    pub fn from_tables(tables: HmmTables) -> Result<Self> {
        let bad = |reason: String| JiebaError::ModelLoad {
            name: "tables".to_owned(),
            reason,
        };
        let state = |label: &str| {
            HmmState::from_label(label).ok_or_else(|| bad(format!("unknown state {label:?}")))
        };

        let mut model = HmmModel {
            start: [MIN_FLOAT; 4],
            trans: [[MIN_FLOAT; 4]; 4],
            emit: Default::default(),
            emit_floor: tables.emit_floor.unwrap_or(DEFAULT_EMIT_FLOOR),
        };
        for (label, p) in &tables.start {
            model.start[state(label.as_str())? as usize] = *p;
        }
        for (from, row) in &tables.trans {
            let from = state(from.as_str())?;
            for (to, p) in row {
                model.trans[from as usize][state(to.as_str())? as usize] = *p;
            }
        }
        for (label, row) in &tables.emit {
            let s = state(label.as_str())?;
            for (key, p) in row {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => {
                        model.emit[s as usize].insert(ch, *p);
                    }
                    _ => return Err(bad(format!("emission key {key:?} is not one character"))),
                }
            }
        }
        Ok(model)
    }

    pub fn to_tables(&self) -> HmmTables {
        let mut tables = HmmTables {
            emit_floor: Some(self.emit_floor),
            ..HmmTables::default()
        };
        for from in HmmState::ALL {
            tables
                .start
                .insert(from.label().to_owned(), self.start[from as usize]);
            let row: BTreeMap<String, f64> = HmmState::ALL
                .iter()
                .filter(|to| self.trans[from as usize][**to as usize] > MIN_FLOAT)
                .map(|to| (to.label().to_owned(), self.trans[from as usize][*to as usize]))
                .collect();
            tables.trans.insert(from.label().to_owned(), row);
            let emit: BTreeMap<String, f64> = self.emit[from as usize]
                .iter()
                .map(|(ch, p)| (ch.to_string(), *p))
                .collect();
            if !emit.is_empty() {
                tables.emit.insert(from.label().to_owned(), emit);
            }
        }
        tables
    }

    /// Reads a JSON model (see [`HmmTables`]).
    pub fn from_json_reader<R: Read>(reader: R, name: &str) -> Result<Self> {
        let tables: HmmTables =
            serde_json::from_reader(reader).map_err(|e| JiebaError::ModelLoad {
                name: name.to_owned(),
                reason: e.to_string(),
            })?;
        let model = Self::from_tables(tables).map_err(|e| match e {
            JiebaError::ModelLoad { reason, .. } => JiebaError::ModelLoad {
                name: name.to_owned(),
                reason,
            },
            other => other,
        })?;
        info!(
            name,
            emissions = model.emit.iter().map(HashMap::len).sum::<usize>(),
            "HMM model loaded"
        );
        Ok(model)
    }

    /// Reads a JSON model file; `.zst` files are decompressed on the fly.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = source_name(path);
        let reader = open_text_source(path).map_err(|e| JiebaError::ModelLoad {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        Self::from_json_reader(reader, &name)
    }

    /// Whether any state has trained emission probabilities. Without them
    /// unknown spans are split by start and transition probabilities alone.
    pub fn has_emissions(&self) -> bool {
        self.emit.iter().any(|row| !row.is_empty())
    }

    pub fn emit_floor(&self) -> f64 {
        self.emit_floor
    }

    #[inline]
    fn emit(&self, state: HmmState, ch: char) -> f64 {
        self.emit[state as usize]
            .get(&ch)
            .copied()
            .unwrap_or(self.emit_floor)
    }

    /// Most probable label sequence for `chars`.
    pub fn viterbi(&self, chars: &[char]) -> Vec<HmmState> {
        let n = chars.len();
        if n == 0 {
            return Vec::new();
        }

        let mut score = vec![[MIN_FLOAT; 4]; n];
        let mut back = vec![[HmmState::Begin; 4]; n];

        for s in HmmState::ALL {
            score[0][s as usize] = self.start[s as usize] + self.emit(s, chars[0]);
        }
        for t in 1..n {
            for s in HmmState::ALL {
                let emit = self.emit(s, chars[t]);
                let mut best = (f64::NEG_INFINITY, HmmState::Begin);
                for &prev in s.predecessors() {
                    let candidate = score[t - 1][prev as usize] + self.trans[prev as usize][s as usize];
                    if candidate > best.0 {
                        best = (candidate, prev);
                    }
                }
                score[t][s as usize] = best.0 + emit;
                back[t][s as usize] = best.1;
            }
        }

        let (end, single) = (HmmState::End as usize, HmmState::Single as usize);
        let mut state = if score[n - 1][end] >= score[n - 1][single] {
            HmmState::End
        } else {
            HmmState::Single
        };

        let mut labels = vec![state; n];
        for t in (1..n).rev() {
            state = back[t][state as usize];
            labels[t - 1] = state;
        }
        labels
    }

    /// Splits an unrecognized span into words.
    ///
    /// Every returned slice borrows from `span`; together they cover it exactly.
    pub fn cut<'a>(&self, span: &'a str) -> Vec<&'a str> {
        let chars: Vec<char> = span.chars().collect();
        let offsets: Vec<usize> = span
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(span.len()))
            .collect();
        let labels = self.viterbi(&chars);
        debug!(span, labels = ?labels.iter().map(|s| s.label()).collect::<String>(), "hmm cut");

        let mut words = Vec::new();
        let mut begin = 0;
        let mut next = 0;
        for (i, label) in labels.iter().enumerate() {
            match label {
                HmmState::Begin => begin = i,
                HmmState::End => {
                    words.push(&span[offsets[begin]..offsets[i + 1]]);
                    next = i + 1;
                }
                HmmState::Single => {
                    words.push(&span[offsets[i]..offsets[i + 1]]);
                    next = i + 1;
                }
                HmmState::Middle => {}
            }
        }
        if next < chars.len() {
            words.push(&span[offsets[next]..]);
        }
        words
    }
}
