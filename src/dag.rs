//! Word-boundary graph over a run of Chinese characters.

use crate::dictionary_lib::DictMap;

/// For every start index (in chars), the ascending end indices of the
/// dictionary words that start there. Prefix placeholders are not edges,
/// but each start always has the edge `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dag {
    edges: Vec<Vec<usize>>,
}

impl Dag {
    /// Builds the graph for `run`; `offsets` holds the byte offset of every
    /// char plus `run.len()` as the final entry.
    pub fn build(run: &str, offsets: &[usize], dict: &DictMap) -> Self {
        let n = offsets.len().saturating_sub(1);
        let max_len = dict.max_len().max(1);
        let mut edges = Vec::with_capacity(n);

        for i in 0..n {
            let mut ends = Vec::new();
            let limit = n.min(i + max_len);
            for j in i + 1..=limit {
                let frag = &run[offsets[i]..offsets[j]];
                if !dict.contains(frag) {
                    break;
                }
                if dict.is_real_word(frag) {
                    ends.push(j);
                }
            }
            if ends.first() != Some(&(i + 1)) {
                ends.insert(0, i + 1);
            }
            edges.push(ends);
        }
        Dag { edges }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn ends(&self, start: usize) -> &[usize] {
        &self.edges[start]
    }

    /// All `(start, end)` edges ordered by start, then end.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .flat_map(|(i, ends)| ends.iter().map(move |&j| (i, j)))
    }

    /// Maximum log-probability route to the end of the run.
    ///
    /// `route[i]` is `(score from i to the end, chosen end)`; ties prefer the
    /// longer edge. `route[n]` is the terminal `(0.0, n)`.
    pub fn best_route(&self, run: &str, offsets: &[usize], dict: &DictMap) -> Vec<(f64, usize)> {
        let n = self.edges.len();
        let log_total = (dict.total().max(1) as f64).ln();
        let mut route = vec![(0.0, 0); n + 1];
        route[n] = (0.0, n);

        for i in (0..n).rev() {
            let mut best = (f64::NEG_INFINITY, i + 1);
            for &j in &self.edges[i] {
                let freq = dict.get(&run[offsets[i]..offsets[j]]).unwrap_or(0).max(1);
                let score = (freq as f64).ln() - log_total + route[j].0;
                if score > best.0 || (score == best.0 && j > best.1) {
                    best = (score, j);
                }
            }
            route[i] = best;
        }
        route
    }
}

/// Byte offsets of every char of `text`, followed by `text.len()`.
pub(crate) fn char_offsets(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect()
}
