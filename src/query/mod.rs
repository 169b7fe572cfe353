pub mod sequence;

pub use sequence::{EmptySequence, IntSequence, IntersectSequence, Rows, UnionSequence};
