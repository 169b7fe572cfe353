//! Lazy ascending row cursors over a posting store.
//!
//! Every sequence starts unpositioned: call [`IntSequence::advance`] once to
//! reach the first row. Intersections use a leapfrog join, so the cost is
//! bounded by the postings actually visited rather than the list sizes.

use crate::index::store::PostingStore;
use crate::index::types::{RowId, Term};
use crate::utils::NGramCodec;
use roaring::RoaringBitmap;
use std::fmt;

/// Pull-based cursor over strictly ascending row ids.
pub trait IntSequence {
    /// True while positioned on a row
    fn is_valid(&self) -> bool;

    /// Move to the next row; false once exhausted
    fn advance(&mut self) -> bool;

    /// Current row. Meaningless unless [`is_valid`](Self::is_valid) holds.
    fn value(&self) -> RowId;

    fn rows(self) -> Rows<Self>
    where
        Self: Sized,
    {
        Rows {
            seq: self,
            fresh: true,
        }
    }

    /// Drain the remaining rows into a bitmap.
    fn to_bitmap(self) -> RoaringBitmap
    where
        Self: Sized,
    {
        self.rows().map(|row| row as u32).collect()
    }
}

impl<T: IntSequence + ?Sized> IntSequence for Box<T> {
    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }

    fn advance(&mut self) -> bool {
        (**self).advance()
    }

    fn value(&self) -> RowId {
        (**self).value()
    }
}

/// Iterator over a sequence. A sequence that is already positioned yields
/// its current row first.
#[derive(Debug)]
pub struct Rows<S> {
    seq: S,
    fresh: bool,
}

impl<S: IntSequence> Iterator for Rows<S> {
    type Item = RowId;

    fn next(&mut self) -> Option<RowId> {
        if std::mem::take(&mut self.fresh) && self.seq.is_valid() {
            return Some(self.seq.value());
        }
        self.seq.advance().then(|| self.seq.value())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySequence;

impl IntSequence for EmptySequence {
    fn is_valid(&self) -> bool {
        false
    }

    fn advance(&mut self) -> bool {
        false
    }

    fn value(&self) -> RowId {
        -1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Start,
    At(RowId),
    End,
}

/// Rows present under every term.
pub struct IntersectSequence<'a, S> {
    store: &'a S,
    codec: NGramCodec,
    terms: Vec<Term>,
    /// Last row reached per term, `None` until the term is first sought
    cursors: Vec<Option<RowId>>,
    pos: Position,
}

impl<'a, S: PostingStore> IntersectSequence<'a, S> {
    pub fn new(store: &'a S, codec: NGramCodec, terms: Vec<Term>) -> Self {
        let pos = if terms.is_empty() {
            Position::End
        } else {
            Position::Start
        };
        Self {
            store,
            codec,
            cursors: vec![None; terms.len()],
            terms,
            pos,
        }
    }
}

impl<S: PostingStore> IntSequence for IntersectSequence<'_, S> {
    fn is_valid(&self) -> bool {
        matches!(self.pos, Position::At(_))
    }

    fn advance(&mut self) -> bool {
        let mut bound = match self.pos {
            Position::Start => 0,
            Position::At(row) => match row.checked_add(1) {
                Some(next) => next,
                None => {
                    self.pos = Position::End;
                    return false;
                }
            },
            Position::End => return false,
        };

        let n = self.terms.len();
        let mut quorum = 0;
        let mut i = 0;
        loop {
            let row = match self.cursors[i] {
                Some(row) if row >= bound => row,
                _ => match self.store.seek_term_row(self.terms[i], bound) {
                    Some(row) => {
                        self.cursors[i] = Some(row);
                        row
                    }
                    None => {
                        self.pos = Position::End;
                        return false;
                    }
                },
            };
            if row > bound {
                bound = row;
                quorum = 1;
            } else {
                quorum += 1;
            }
            if quorum == n {
                self.pos = Position::At(bound);
                return true;
            }
            i = (i + 1) % n;
        }
    }

    fn value(&self) -> RowId {
        match self.pos {
            Position::At(row) => row,
            _ => -1,
        }
    }
}

impl<S> fmt::Debug for IntersectSequence<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self
            .terms
            .iter()
            .map(|&t| self.codec.term_to_text(t))
            .collect();
        f.debug_struct("IntersectSequence")
            .field("terms", &terms)
            .field("pos", &self.pos)
            .finish()
    }
}

/// Rows present under at least one term.
pub struct UnionSequence<'a, S> {
    store: &'a S,
    codec: NGramCodec,
    terms: Vec<Term>,
    /// Next row per term, `None` once that term is exhausted
    cursors: Vec<Option<RowId>>,
    pos: Position,
}

impl<'a, S: PostingStore> UnionSequence<'a, S> {
    pub fn new(store: &'a S, codec: NGramCodec, terms: Vec<Term>) -> Self {
        let pos = if terms.is_empty() {
            Position::End
        } else {
            Position::Start
        };
        Self {
            store,
            codec,
            cursors: Vec::with_capacity(terms.len()),
            terms,
            pos,
        }
    }
}

impl<S: PostingStore> IntSequence for UnionSequence<'_, S> {
    fn is_valid(&self) -> bool {
        matches!(self.pos, Position::At(_))
    }

    fn advance(&mut self) -> bool {
        match self.pos {
            Position::Start => {
                self.cursors = self
                    .terms
                    .iter()
                    .map(|&t| self.store.seek_term_row(t, 0))
                    .collect();
            }
            Position::At(current) => {
                let next = current.checked_add(1);
                for (cursor, &term) in self.cursors.iter_mut().zip(&self.terms) {
                    if *cursor == Some(current) {
                        *cursor = next.and_then(|row| self.store.seek_term_row(term, row));
                    }
                }
            }
            Position::End => return false,
        }

        self.pos = match self.cursors.iter().flatten().min() {
            Some(&row) => Position::At(row),
            None => Position::End,
        };
        self.is_valid()
    }

    fn value(&self) -> RowId {
        match self.pos {
            Position::At(row) => row,
            _ => -1,
        }
    }
}

impl<S> fmt::Debug for UnionSequence<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self
            .terms
            .iter()
            .map(|&t| self.codec.term_to_text(t))
            .collect();
        f.debug_struct("UnionSequence")
            .field("terms", &terms)
            .field("pos", &self.pos)
            .finish()
    }
}
