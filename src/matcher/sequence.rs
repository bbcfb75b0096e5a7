//! Greedy longest-matching-block sequence comparison.
//! Finds the longest contiguous matching block, then recurses on the
//! pieces left and right of it; the ratio is `2 * matched / total`.
//! Elements are Unicode scalar values.

use std::collections::HashMap;

use super::Similarity;

/// Inputs at least this long get the popularity heuristic.
const AUTOJUNK_MIN_LEN: usize = 200;

/// A matching block: `a[a_start..a_start + size] == b[b_start..b_start + size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Block {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

pub struct SequenceMatcher {
    a: Vec<char>,
    b: Vec<char>,
    /// char → ascending positions in `b`. Popular chars are absent.
    b2j: HashMap<char, Vec<usize>>,
}

impl SequenceMatcher {
    pub fn new(a: &str, b: &str) -> Self {
        Self::with_autojunk(a, b, true)
    }

    /// With `autojunk`, chars making up more than 1% (+1) of a `b` of 200+
    /// elements never start a match. They can still extend one.
    pub fn with_autojunk(a: &str, b: &str, autojunk: bool) -> Self {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();

        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        let n = b.len();
        if autojunk && n >= AUTOJUNK_MIN_LEN {
            let ntest = n / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= ntest);
        }

        Self { a, b, b2j }
    }

    /// Longest matching block in `a[alo..ahi]` × `b[blo..bhi]`.
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Block {
        let mut best = Block { a_start: alo, b_start: blo, size: 0 };

        // j2len[j] = length of the match ending at a[i-1], b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, k);
                    if k > best.size {
                        best = Block { a_start: i + 1 - k, b_start: j + 1 - k, size: k };
                    }
                }
            }
            j2len = next;
        }

        // Popular chars were never indexed; grow the block across them.
        while best.a_start > alo
            && best.b_start > blo
            && self.a[best.a_start - 1] == self.b[best.b_start - 1]
        {
            best.a_start -= 1;
            best.b_start -= 1;
            best.size += 1;
        }
        while best.a_start + best.size < ahi
            && best.b_start + best.size < bhi
            && self.a[best.a_start + best.size] == self.b[best.b_start + best.size]
        {
            best.size += 1;
        }

        best
    }

    /// All matching blocks, ordered by position and with adjacent blocks merged.
    pub fn matching_blocks(&self) -> Vec<Block> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let m = self.find_longest_match(alo, ahi, blo, bhi);
            if m.size == 0 {
                continue;
            }
            if alo < m.a_start && blo < m.b_start {
                queue.push((alo, m.a_start, blo, m.b_start));
            }
            if m.a_start + m.size < ahi && m.b_start + m.size < bhi {
                queue.push((m.a_start + m.size, ahi, m.b_start + m.size, bhi));
            }
            blocks.push(m);
        }
        blocks.sort();

        let mut merged: Vec<Block> = Vec::with_capacity(blocks.len());
        for block in blocks {
            match merged.last_mut() {
                Some(prev)
                    if prev.a_start + prev.size == block.a_start
                        && prev.b_start + prev.size == block.b_start =>
                {
                    prev.size += block.size;
                }
                _ => merged.push(block),
            }
        }
        merged
    }

    /// `2 * M / T`; two empty sequences are identical (1.0).
    pub fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        let matched: usize = self.matching_blocks().iter().map(|b| b.size).sum();
        2.0 * matched as f64 / total as f64
    }
}

/// [`Similarity`] backed by [`SequenceMatcher`].
#[derive(Debug, Clone, Copy)]
pub struct SequenceRatio {
    pub autojunk: bool,
}

impl Default for SequenceRatio {
    fn default() -> Self {
        Self { autojunk: true }
    }
}

impl Similarity for SequenceRatio {
    fn ratio(&self, a: &str, b: &str) -> f64 {
        SequenceMatcher::with_autojunk(a, b, self.autojunk).ratio()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(a: &str, b: &str) -> f64 {
        SequenceMatcher::new(a, b).ratio()
    }

    #[test]
    fn identical_is_one() {
        assert_eq!(ratio("¿Es la Tierra redonda?", "¿Es la Tierra redonda?"), 1.0);
        assert_eq!(ratio("", ""), 1.0);
    }

    #[test]
    fn disjoint_is_zero() {
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("abc", ""), 0.0);
        assert_eq!(ratio("", "abc"), 0.0);
    }

    #[test]
    fn known_ratios() {
        // "bcd" shared: 2 * 3 / 8
        assert!((ratio("abcd", "bcde") - 0.75).abs() < 1e-12);
        // "abcd" shared once: 2 * 4 / 13
        assert!((ratio("abcd", "abcd abcd") - 8.0 / 13.0).abs() < 1e-12);
    }

    #[test]
    fn blocks_are_ordered_and_merged() {
        let sm = SequenceMatcher::new("abxcd", "abcd");
        let blocks = sm.matching_blocks();
        assert_eq!(
            blocks,
            vec![
                Block { a_start: 0, b_start: 0, size: 2 },
                Block { a_start: 3, b_start: 2, size: 2 },
            ]
        );
    }

    #[test]
    fn longest_match_prefers_earliest() {
        let sm = SequenceMatcher::new(" abcd", "abcd abcd");
        let m = sm.find_longest_match(0, 5, 0, 9);
        assert_eq!(m, Block { a_start: 0, b_start: 4, size: 5 });
    }

    #[test]
    fn popular_chars_only_extend_matches() {
        let long_b = "a".repeat(200);
        let with_junk = SequenceMatcher::with_autojunk("a", &long_b, true).ratio();
        assert!((with_junk - 2.0 / 201.0).abs() < 1e-12);
    }

    #[test]
    fn multibyte_chars_count_once() {
        // 'ñ' is one element, not two bytes
        assert!((ratio("año", "ano") - 2.0 * 2.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn ratio_stays_in_unit_interval() {
        let samples = ["", "a", "hola mundo", "¿Es la Tierra redonda?", "xyz completamente distinto"];
        for a in samples {
            for b in samples {
                let r = ratio(a, b);
                assert!((0.0..=1.0).contains(&r), "{a:?} vs {b:?} -> {r}");
            }
        }
    }
}
