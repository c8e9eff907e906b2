use std::io;
use std::path::PathBuf;

/// Errors raised while loading or extending the engine's tables.
///
/// Segmentation and keyword extraction never fail; only the paths that touch
/// the filesystem or parse model data return these.
#[derive(Debug, thiserror::Error)]
pub enum JiebaError {
    #[error("unable to load the dictionary {name}: {source}")]
    DictLoad {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("unable to load the dictionary {0}, dictionary is empty")]
    DictEmpty(String),

    #[error("unable to append to {path:?}: {source}")]
    DictWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to load the HMM model {name}: {reason}")]
    ModelLoad { name: String, reason: String },

    #[error("unable to load the IDF table {name}: {source}")]
    IdfLoad {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid engine config {path:?}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, JiebaError>;
