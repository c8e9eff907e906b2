use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use tracing::{debug, info, trace, warn};
use zstd::stream::read::Decoder;

use crate::error::{JiebaError, Result};

pub mod dict_map;
pub mod stop_words;

pub use dict_map::DictMap;
pub use stop_words::StopWords;

/// Shared word-frequency dictionary.
///
/// Reads take the shared lock, `add_word` takes the exclusive lock for both
/// the in-memory insert and the append to the user dictionary file.
#[derive(Debug, Default)]
pub struct Dictionary {
    map: RwLock<DictMap>,
    user_dict_path: Option<PathBuf>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dictionary from a standard table in `word freq pos` format.
    pub fn from_reader<R: BufRead>(reader: R, name: &str) -> Result<Self> {
        let dictionary = Self::new();
        dictionary.load_from_reader(reader, name)?;
        Ok(dictionary)
    }

    /// Builds a dictionary from a file; `.zst` files are decompressed on the fly.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let dictionary = Self::new();
        dictionary.load_from_path(path)?;
        Ok(dictionary)
    }

    /// Sets the file `add_word` appends to.
    pub fn set_user_dict_path<P: Into<PathBuf>>(&mut self, path: P) {
        self.user_dict_path = Some(path.into());
    }

    pub fn user_dict_path(&self) -> Option<&Path> {
        self.user_dict_path.as_deref()
    }

    /// Overlays the user dictionary if it exists.
    ///
    /// A missing file is not an error; an unreadable or corrupt one is.
    /// Returns whether a file was loaded.
    pub fn load_user_dict<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "user dictionary not found, skipped");
            return Ok(false);
        }
        self.load_from_path(path)?;
        Ok(true)
    }

    pub fn load_from_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let name = source_name(path);
        let reader = open_text_source(path).map_err(|source| JiebaError::DictLoad {
            name: name.clone(),
            source,
        })?;
        self.load_from_reader(reader, &name)
    }

    /// Bulk-loads `word freq pos` triples.
    ///
    /// Lines that are not valid UTF-8 or do not have exactly three fields are
    /// skipped; a frequency that is not an integer is taken as `0`. Fails when
    /// the table is still empty afterwards or the total frequency is not
    /// positive.
    pub fn load_from_reader<R: BufRead>(&self, reader: R, name: &str) -> Result<()> {
        let mut map = self.write_map();
        let mut loaded = 0usize;
        for_each_line(reader, name, |line_no, line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 3 {
                trace!(name, line = line_no, "skipped malformed dictionary line");
                return;
            }
            let freq = fields[1].parse::<u64>().unwrap_or(0);
            map.insert_word(fields[0], freq);
            loaded += 1;
        })
        .map_err(|source| JiebaError::DictLoad {
            name: name.to_owned(),
            source,
        })?;

        if map.is_empty() || map.total() == 0 {
            return Err(JiebaError::DictEmpty(name.to_owned()));
        }
        info!(
            name,
            loaded,
            entries = map.len(),
            total = map.total(),
            "dictionary loaded"
        );
        Ok(())
    }

    /// Case-insensitive membership test, placeholders included.
    pub fn exists(&self, word: &str) -> bool {
        self.read_map().contains(word)
    }

    /// Frequency of `word`; a prefix placeholder yields `Some(0)`.
    pub fn lookup(&self, word: &str) -> Option<u64> {
        self.read_map().get(word)
    }

    pub fn total_frequency(&self) -> f64 {
        self.read_map().total() as f64
    }

    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_map().is_empty()
    }

    /// Adds a word at runtime. Returns `true` if the word was already present.
    ///
    /// The line `word freq pos` is appended to the user dictionary (when one
    /// is configured) before the in-memory insert, both under the write lock.
    /// Prefixes of the new word become placeholders, as in bulk loading.
    pub fn add_word(&self, word: &str, freq: u64, pos: &str) -> Result<bool> {
        let mut map = self.write_map();
        if map.contains(word) {
            return Ok(true);
        }

        match &self.user_dict_path {
            Some(path) => append_line(path, &format!("{word} {freq} {pos}"))?,
            None => debug!(word, "no user dictionary configured, word kept in memory"),
        }
        map.insert_word(word, freq);
        Ok(false)
    }

    /// Holds the shared lock for a batch of lookups (one DAG build).
    pub(crate) fn read_map(&self) -> RwLockReadGuard<'_, DictMap> {
        self.map.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_map(&self) -> std::sync::RwLockWriteGuard<'_, DictMap> {
        self.map.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Opens a text table, transparently decoding `.zst` files.
pub(crate) fn open_text_source(path: &Path) -> io::Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)?;
    if is_compressed(path) {
        let decoder = Decoder::new(file)?;
        Ok(Box::new(BufReader::new(decoder)))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

pub(crate) fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Feeds every line of `reader` that decodes as UTF-8 to `f`, with its line
/// number (from 1) and without the line terminator.
///
/// Undecodable lines are skipped; only I/O errors end the scan.
pub(crate) fn for_each_line<R: BufRead>(
    mut reader: R,
    name: &str,
    mut f: impl FnMut(usize, &str),
) -> io::Result<()> {
    let mut buf = Vec::new();
    let mut line_no = 0usize;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        line_no += 1;
        match std::str::from_utf8(&buf) {
            Ok(line) => f(line_no, line.trim_end_matches(|c| c == '\n' || c == '\r')),
            Err(_) => trace!(name, line = line_no, "skipped line that is not valid UTF-8"),
        }
    }
}

fn is_compressed(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "zst")
}

/// Appends `line` plus `\n`, first terminating an unterminated last line.
///
/// Only the last byte of an existing file is inspected; nothing is rewritten.
/// Compressed (`.zst`) files are read-only.
pub(crate) fn append_line(path: &Path, line: &str) -> Result<()> {
    let write_err = |source| JiebaError::DictWrite {
        path: path.to_path_buf(),
        source,
    };
    if is_compressed(path) {
        return Err(write_err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "compressed files cannot be appended to",
        )));
    }

    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
        .map_err(write_err)?;
    let size = file.metadata().map_err(write_err)?.len();

    let mut buf = String::with_capacity(line.len() + 2);
    if size > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(size - 1)).map_err(write_err)?;
        file.read_exact(&mut last).map_err(write_err)?;
        if last[0] != b'\n' {
            buf.push('\n');
        }
    }
    buf.push_str(line);
    buf.push('\n');
    file.write_all(buf.as_bytes()).map_err(write_err)?;
    file.flush().map_err(write_err)
}
