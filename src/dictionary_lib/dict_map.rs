use std::borrow::Cow;
use std::collections::HashMap;

/// Lowercased word → frequency table with prefix closure.
///
/// A frequency of `0` marks a prefix placeholder rather than a real word.
#[derive(Debug, Clone, Default)]
pub struct DictMap {
    map: HashMap<String, u64>,
    total: u64,
    max_len: usize, // longest key, in chars
}

impl DictMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a real word (or overwrite one) and fill in missing prefixes.
    ///
    /// Returns the lowercased key actually stored.
    pub fn insert_word(&mut self, word: &str, freq: u64) -> String {
        let key = word.to_lowercase();
        self.total += freq;
        self.insert_prefixes(&key);
        self.map.insert(key.clone(), freq);
        key
    }

    fn insert_prefixes(&mut self, key: &str) {
        let mut len_chars = 0;
        for (offset, ch) in key.char_indices() {
            len_chars += 1;
            let end = offset + ch.len_utf8();
            if end < key.len() && !self.map.contains_key(&key[..end]) {
                self.map.insert(key[..end].to_owned(), 0);
            }
        }
        if len_chars > self.max_len {
            self.max_len = len_chars;
        }
    }

    #[inline]
    pub fn get(&self, word: &str) -> Option<u64> {
        self.map.get(normalize(word).as_ref()).copied()
    }

    #[inline]
    pub fn contains(&self, word: &str) -> bool {
        self.map.contains_key(normalize(word).as_ref())
    }

    /// `true` only for entries with a positive frequency.
    #[inline]
    pub fn is_real_word(&self, word: &str) -> bool {
        self.get(word).is_some_and(|freq| freq > 0)
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[inline]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Lowercase only when needed; CJK text has no case and stays borrowed.
///
/// Any char that lowercases to something else counts, titlecase digraphs
/// such as `ǅ` included.
#[inline]
pub(crate) fn normalize(word: &str) -> Cow<'_, str> {
    if word.chars().any(|c| c.to_lowercase().ne(std::iter::once(c))) {
        Cow::Owned(word.to_lowercase())
    } else {
        Cow::Borrowed(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_word_closes_prefixes() {
        let mut dict = DictMap::new();
        dict.insert_word("中华人民", 7);
        assert_eq!(dict.get("中华人民"), Some(7));
        assert_eq!(dict.get("中华人"), Some(0));
        assert_eq!(dict.get("中华"), Some(0));
        assert_eq!(dict.get("中"), Some(0));
        assert_eq!(dict.total(), 7);
        assert_eq!(dict.max_len(), 4);
    }

    #[test]
    fn placeholder_is_upgraded_not_duplicated() {
        let mut dict = DictMap::new();
        dict.insert_word("中华", 3);
        dict.insert_word("中", 5);
        assert_eq!(dict.get("中"), Some(5));
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.total(), 8);
    }

    #[test]
    fn real_word_is_not_reset_to_placeholder() {
        let mut dict = DictMap::new();
        dict.insert_word("中", 5);
        dict.insert_word("中华", 3);
        assert!(dict.is_real_word("中"));
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let mut dict = DictMap::new();
        dict.insert_word("T恤", 10);
        assert!(dict.contains("t恤"));
        assert_eq!(dict.get("T恤"), Some(10));
        assert_eq!(dict.get("t"), Some(0));
    }

    #[test]
    fn titlecase_letters_are_folded() {
        let mut dict = DictMap::new();
        dict.insert_word("ǅx", 4);
        assert!(dict.contains("ǅx"));
        assert!(dict.contains("ǆx"));
        assert_eq!(dict.get("ǄX"), Some(4));
        assert!(matches!(normalize("研究"), Cow::Borrowed(_)));
    }
}
