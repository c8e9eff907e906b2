use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{JiebaError, Result};

/// Input length (bytes) from which runs are cut on the rayon pool.
pub const PARALLEL_THRESHOLD: usize = 500;

/// Where the engine's tables come from.
///
/// Every path may point at a plain text file or at a `.zst` compressed one.
///
/// ```json
/// {
///   "dict_path": "dict/dict.txt.zst",
///   "user_dict_path": "dict/user.dict.txt",
///   "idf_path": "dict/idf.txt",
///   "stop_words_path": "dict/stop_words.txt",
///   "hmm_model_path": "dict/hmm_model.json"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub dict_path: PathBuf,

    #[serde(default)]
    pub user_dict_path: Option<PathBuf>,

    #[serde(default)]
    pub idf_path: Option<PathBuf>,

    #[serde(default)]
    pub stop_words_path: Option<PathBuf>,

    #[serde(default)]
    pub hmm_model_path: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub default_stop_words: bool,

    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_true() -> bool {
    true
}

fn default_parallel_threshold() -> usize {
    PARALLEL_THRESHOLD
}

impl EngineConfig {
    pub fn new<P: Into<PathBuf>>(dict_path: P) -> Self {
        EngineConfig {
            dict_path: dict_path.into(),
            user_dict_path: None,
            idf_path: None,
            stop_words_path: None,
            hmm_model_path: None,
            default_stop_words: true,
            parallel_threshold: PARALLEL_THRESHOLD,
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_err = |reason: String| JiebaError::ConfigLoad {
            path: path.to_path_buf(),
            reason,
        };
        let text = fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| config_err(e.to_string()))
    }

    pub fn user_dict<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.user_dict_path = Some(path.into());
        self
    }

    pub fn idf<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.idf_path = Some(path.into());
        self
    }

    pub fn stop_words<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.stop_words_path = Some(path.into());
        self
    }

    pub fn hmm_model<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.hmm_model_path = Some(path.into());
        self
    }

    pub fn default_stop_words(mut self, yes: bool) -> Self {
        self.default_stop_words = yes;
        self
    }

    pub fn parallel_threshold(mut self, bytes: usize) -> Self {
        self.parallel_threshold = bytes;
        self
    }
}
