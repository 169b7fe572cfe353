use crate::error::{Error, Result};
use crate::index::types::Term;

pub const MIN_NGRAM_SIZE: usize = 2;
pub const MAX_NGRAM_SIZE: usize = 4;
pub const MIN_BITS_PER_CHAR: u32 = 5;
pub const MAX_BITS_PER_CHAR: u32 = 7;

/// Lowercase and keep the low 7 bits. Lossy: non-ASCII characters may
/// collide with ASCII ones, which only widens candidate sets.
#[inline]
pub fn normalize_char(ch: char) -> u8 {
    let lower = ch.to_lowercase().next().unwrap_or(ch);
    (lower as u32 & 0x7F) as u8
}

/// Normalize a whole string, one code per character.
pub fn normalize(text: &str) -> Vec<u8> {
    text.chars().map(normalize_char).collect()
}

/// Packs `ngram_size` normalized characters into a fixed-width term,
/// most significant character first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NGramCodec {
    ngram_size: usize,
    bits_per_char: u32,
    char_mask: u32,
}

impl NGramCodec {
    pub fn new(ngram_size: usize, bits_per_char: u32) -> Result<Self> {
        if !(MIN_NGRAM_SIZE..=MAX_NGRAM_SIZE).contains(&ngram_size) {
            return Err(Error::config(format!(
                "ngram_size {} out of [{}, {}] range",
                ngram_size, MIN_NGRAM_SIZE, MAX_NGRAM_SIZE
            )));
        }
        if !(MIN_BITS_PER_CHAR..=MAX_BITS_PER_CHAR).contains(&bits_per_char) {
            return Err(Error::config(format!(
                "bits_per_char {} out of [{}, {}] range",
                bits_per_char, MIN_BITS_PER_CHAR, MAX_BITS_PER_CHAR
            )));
        }
        Ok(Self {
            ngram_size,
            bits_per_char,
            char_mask: (1u32 << bits_per_char) - 1,
        })
    }

    #[inline]
    pub fn ngram_size(&self) -> usize {
        self.ngram_size
    }

    #[inline]
    pub fn bits_per_char(&self) -> u32 {
        self.bits_per_char
    }

    /// Width of a packed term in bits
    #[inline]
    pub fn term_bits(&self) -> u32 {
        self.ngram_size as u32 * self.bits_per_char
    }

    /// Pack the n-gram starting at `offset`, zero-padding past the end.
    #[inline]
    pub fn term(&self, chars: &[u8], offset: usize) -> Term {
        let mut term = 0;
        for i in 0..self.ngram_size {
            let c = chars.get(offset + i).copied().unwrap_or(0) as u32;
            term = (term << self.bits_per_char) | (c & self.char_mask);
        }
        term
    }

    /// Dense coverage used for indexed text: one overlapping term per start
    /// offset, or a single padded term for text shorter than an n-gram.
    ///
    /// The returned terms are sorted and unique; repeated n-grams in one row
    /// collapse to a single posting anyway.
    pub fn dense_terms(&self, text: &str) -> Vec<Term> {
        let chars = normalize(text);
        if chars.len() < self.ngram_size {
            return vec![self.term(&chars, 0)];
        }

        let mut terms: Vec<Term> = (0..=chars.len() - self.ngram_size)
            .map(|offset| self.term(&chars, offset))
            .collect();
        terms.sort_unstable();
        terms.dedup();
        terms
    }

    /// Minimal coverage used for queries: `ceil(len / n)` disjoint windows,
    /// the last one shifted left to stay in bounds.
    pub fn query_terms(&self, query: &str) -> Vec<Term> {
        let chars = normalize(query);
        let count = chars.len().div_ceil(self.ngram_size);
        (0..count)
            .map(|i| {
                let mut offset = i * self.ngram_size;
                if offset + self.ngram_size > chars.len() {
                    offset = chars.len().saturating_sub(self.ngram_size);
                }
                self.term(&chars, offset)
            })
            .collect()
    }

    /// Pack a query shorter than an n-gram, without padding.
    pub fn subterm(&self, chars: &[u8]) -> Term {
        chars.iter().fold(0, |acc, &c| {
            (acc << self.bits_per_char) | (c as u32 & self.char_mask)
        })
    }

    /// True if `subterm` (of `char_count` characters) appears as a contiguous
    /// character field anywhere inside `term`.
    pub fn contains(&self, term: Term, subterm: Term, char_count: usize) -> bool {
        debug_assert!(char_count < self.ngram_size);
        let mut mask = (1u32 << (self.bits_per_char * char_count as u32)) - 1;
        let mut sub = subterm;
        for _ in 0..=self.ngram_size - char_count {
            if term & mask == sub {
                return true;
            }
            mask <<= self.bits_per_char;
            sub <<= self.bits_per_char;
        }
        false
    }

    /// Render a term back to its truncated characters, for diagnostics.
    pub fn term_to_text(&self, term: Term) -> String {
        let mut chars = vec![' '; self.ngram_size];
        let mut t = term;
        for slot in chars.iter_mut().rev() {
            let c = (t & self.char_mask) as u8;
            *slot = if c.is_ascii_graphic() || c == b' ' {
                c as char
            } else {
                '\u{00B7}'
            };
            t >>= self.bits_per_char;
        }
        chars.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_ranges() {
        assert!(NGramCodec::new(2, 7).is_ok());
        assert!(NGramCodec::new(3, 5).is_ok());
        assert!(NGramCodec::new(4, 6).is_ok());
        assert!(NGramCodec::new(1, 6).is_err());
        assert!(NGramCodec::new(5, 6).is_err());
        assert!(NGramCodec::new(3, 4).is_err());
        assert!(matches!(
            NGramCodec::new(3, 8),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_term_packing() {
        let codec = NGramCodec::new(3, 7).unwrap();
        let chars = normalize("Abc");
        assert_eq!(codec.term(&chars, 0), (0x61 << 14) | (0x62 << 7) | 0x63);
        // padded past the end
        assert_eq!(codec.term(&chars, 2), 0x63 << 14);
        assert_eq!(codec.term_bits(), 21);
    }

    #[test]
    fn test_truncation_collides() {
        let codec = NGramCodec::new(2, 6).unwrap();
        // ' ' (0x20) and '`' (0x60) share their low 6 bits
        assert_eq!(
            codec.term(&normalize("a "), 0),
            codec.term(&normalize("a`"), 0)
        );
    }

    #[test]
    fn test_dense_terms() {
        let codec = NGramCodec::new(3, 7).unwrap();
        assert_eq!(codec.dense_terms("hello").len(), 3);
        assert_eq!(codec.dense_terms("aaaaaa").len(), 1);
        assert_eq!(codec.dense_terms("ab"), vec![codec.term(&normalize("ab"), 0)]);
        assert_eq!(codec.dense_terms(""), vec![0]);
    }

    #[test]
    fn test_query_terms() {
        let codec = NGramCodec::new(3, 7).unwrap();
        let chars = normalize("foxhound");
        // windows at 0, 3 and the shifted tail window at 5
        assert_eq!(
            codec.query_terms("foxhound"),
            vec![
                codec.term(&chars, 0),
                codec.term(&chars, 3),
                codec.term(&chars, 5)
            ]
        );
        assert_eq!(codec.query_terms("fox").len(), 1);
        assert_eq!(codec.query_terms("FOX"), codec.query_terms("fox"));
    }

    #[test]
    fn test_contains_subterm() {
        let codec = NGramCodec::new(3, 6).unwrap();
        let term = codec.term(&normalize("fox"), 0);
        assert!(codec.contains(term, codec.subterm(&normalize("f")), 1));
        assert!(codec.contains(term, codec.subterm(&normalize("ox")), 2));
        assert!(codec.contains(term, codec.subterm(&normalize("fo")), 2));
        assert!(!codec.contains(term, codec.subterm(&normalize("fx")), 2));
        assert!(!codec.contains(term, codec.subterm(&normalize("a")), 1));
    }

    #[test]
    fn test_term_to_text() {
        let codec = NGramCodec::new(3, 7).unwrap();
        let term = codec.term(&normalize("Fox"), 0);
        assert_eq!(codec.term_to_text(term), "fox");
    }
}
