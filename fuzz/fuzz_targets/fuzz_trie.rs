#![no_main]

use arbitrary::Arbitrary;
use fastngram::PrefixBitTrie;
use libfuzzer_sys::fuzz_target;
use std::collections::BTreeSet;

const BITS: u32 = 24;

#[derive(Arbitrary, Debug)]
enum Op {
    Put(u32),
    Remove(u32),
    Get(u32),
    Ceil(u32),
    Floor(u32),
}

fuzz_target!(|ops: Vec<Op>| {
    // Drive the trie and an ordered set model with the same operations
    let mut trie = PrefixBitTrie::new(BITS, 0, 1).unwrap();
    let mut model = BTreeSet::new();
    let mask = (1u64 << BITS) - 1;

    for op in ops {
        match op {
            Op::Put(k) => {
                let k = k as u64 & mask;
                let prev = trie.get_and_put(k).unwrap();
                assert_eq!(prev.is_some(), !model.insert(k));
            }
            Op::Remove(k) => {
                let k = k as u64 & mask;
                let prev = trie.get_and_remove(k).unwrap();
                assert_eq!(prev.is_some(), model.remove(&k));
            }
            Op::Get(k) => {
                let k = k as u64 & mask;
                assert_eq!(trie.get(k).unwrap(), model.get(&k).copied());
            }
            Op::Ceil(k) => {
                let k = k as u64 & mask;
                assert_eq!(trie.ceil(k).unwrap(), model.range(k..).next().copied());
            }
            Op::Floor(k) => {
                let k = k as u64 & mask;
                assert_eq!(trie.floor(k).unwrap(), model.range(..=k).next_back().copied());
            }
        }
        assert_eq!(trie.len(), model.len() as u64);
    }

    trie.check_invariants().unwrap();
});
