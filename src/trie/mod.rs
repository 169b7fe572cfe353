//! Bit-packed radix trie.
//!
//! An ordered set of fixed-width tokens, each token an address part
//! (`address_bits`) optionally followed by a small value (`data_bits`, up
//! to 7 bits). The address is consumed four bits per level, so the tree has
//! `ceil(address_bits / 4)` levels of 16-way nodes; the last level stores the
//! value directly in the child slot.
//!
//! ## Storage
//!
//! Nodes live in a [`PagePool`] of 256-slot pages. All children of a node
//! share one host page, so a child reference is a single byte and the node
//! carries one page index for all 16 of them. When the host page runs out of
//! room the whole sibling group moves to the page with the most free slots
//! (tracked by [`FreePageHeap`]); when no page can take the group the pool
//! doubles.
//!
//! ## Example
//!
//! ```
//! use fastngram::trie::PrefixBitTrie;
//!
//! let mut trie = PrefixBitTrie::new(16, 0, 1).unwrap();
//! trie.put(1000).unwrap();
//! trie.put(2000).unwrap();
//!
//! assert_eq!(trie.get(1000).unwrap(), Some(1000));
//! assert_eq!(trie.ceil(1001).unwrap(), Some(2000));
//! assert_eq!(trie.floor(1999).unwrap(), Some(1000));
//! assert_eq!(trie.ceil(2001).unwrap(), None);
//! ```

pub mod dump;
pub mod heap;
pub mod page;

use crate::error::{Error, Result};
use dump::TextTree;
use heap::FreePageHeap;
use page::{BLANK, FANOUT, NodeRef, PagePool};
use tracing::{debug, info};

/// Upper bound of the page pool, and of the initial page capacity
pub const MAX_PAGES: u32 = 1 << 30;

const MAX_DEPTH: usize = 16;
const DIGIT_BITS: u32 = 4;

#[derive(Debug, Clone)]
pub struct PrefixBitTrie {
    pool: PagePool,
    heap: FreePageHeap,
    address_bits: u32,
    data_bits: u32,
    token_mask: u64,
    address_mask: u64,
    value_mask: u64,
    /// Levels in the radix tree
    depth: usize,
    size: u64,
    slots_used: u64,
}

impl PrefixBitTrie {
    /// Create a trie for `address_bits + data_bits` wide tokens.
    ///
    /// `page_capacity` is the initial page count, rounded up to a power of
    /// two.
    pub fn new(address_bits: u32, data_bits: u32, page_capacity: u32) -> Result<Self> {
        if !(1..=64).contains(&address_bits) {
            return Err(Error::config(format!(
                "address_bits ({}) out of [1, 64] range",
                address_bits
            )));
        }
        if data_bits > 7 {
            return Err(Error::config(format!(
                "data_bits ({}) out of [0, 7] range",
                data_bits
            )));
        }
        if address_bits + data_bits > 64 {
            return Err(Error::config(format!(
                "address_bits + data_bits ({}) above 64",
                address_bits + data_bits
            )));
        }
        if !(1..=MAX_PAGES).contains(&page_capacity) {
            return Err(Error::config(format!(
                "page_capacity ({}) out of [1, {}] range",
                page_capacity, MAX_PAGES
            )));
        }

        let token_bits = address_bits + data_bits;
        let token_mask = u64::MAX >> (64 - token_bits);
        let value_mask = (1u64 << data_bits) - 1;
        let pages = page_capacity.next_power_of_two();

        let mut pool = PagePool::new(pages);
        // root always sits at page 0, slot 0
        let root = pool
            .alloc(0)
            .ok_or(Error::CapacityExhausted { pages })?;
        debug_assert_eq!(root, NodeRef::ROOT);
        let heap = FreePageHeap::new(&pool);

        debug!(address_bits, data_bits, pages, "created prefix bit trie");

        Ok(Self {
            pool,
            heap,
            address_bits,
            data_bits,
            token_mask,
            address_mask: token_mask & !value_mask,
            value_mask,
            depth: address_bits.div_ceil(DIGIT_BITS) as usize,
            size: 0,
            slots_used: 1,
        })
    }

    pub fn address_bits(&self) -> u32 {
        self.address_bits
    }

    pub fn data_bits(&self) -> u32 {
        self.data_bits
    }

    /// Number of stored tokens
    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Live node slots, root included
    pub fn slots_used(&self) -> u64 {
        self.slots_used
    }

    /// Pages in the pool
    pub fn pages(&self) -> u32 {
        self.pool.pages()
    }

    pub fn memory_bytes(&self) -> usize {
        self.pool.memory_bytes() + self.heap.len() * 2 * std::mem::size_of::<u32>()
    }

    /// Look up the address of `token`, ignoring its value bits.
    ///
    /// Returns the stored token (address plus stored value).
    pub fn get(&self, token: u64) -> Result<Option<u64>> {
        self.check_token(token)?;
        let mut node = NodeRef::ROOT;
        for stage in 0..self.depth - 1 {
            let r = self.pool.child(node, self.digit(token, stage));
            if r == BLANK {
                return Ok(None);
            }
            node = self.child_node(node, r);
        }
        let v = self.pool.child(node, self.digit(token, self.depth - 1));
        if v == BLANK {
            return Ok(None);
        }
        Ok(Some(self.compose(token, v)))
    }

    /// Smallest stored token whose address is at or above that of `token`.
    pub fn ceil(&self, token: u64) -> Result<Option<u64>> {
        self.check_token(token)?;
        Ok(self.seek(token, true))
    }

    /// Largest stored token whose address is at or below that of `token`.
    pub fn floor(&self, token: u64) -> Result<Option<u64>> {
        self.check_token(token)?;
        Ok(self.seek(token, false))
    }

    pub fn put(&mut self, token: u64) -> Result<()> {
        self.get_and_put(token).map(|_| ())
    }

    /// Store `token`, replacing the value of an equal address.
    ///
    /// Returns the previously stored token, if any.
    pub fn get_and_put(&mut self, token: u64) -> Result<Option<u64>> {
        self.check_token(token)?;
        let value = (token & self.value_mask) as u8;
        let mut node = NodeRef::ROOT;
        for stage in 0..self.depth - 1 {
            let d = self.digit(token, stage);
            let mut r = self.pool.child(node, d);
            if r == BLANK {
                r = self.add_child(node, d)?.slot;
            }
            // host may have moved while adding the child
            node = self.child_node(node, r);
        }

        let d = self.digit(token, self.depth - 1);
        let prev = self.pool.child(node, d);
        self.pool.set_child(node, d, value);
        if prev == BLANK {
            self.size += 1;
            Ok(None)
        } else {
            Ok(Some(self.compose(token, prev)))
        }
    }

    pub fn remove(&mut self, token: u64) -> Result<()> {
        self.get_and_remove(token).map(|_| ())
    }

    /// Remove the address of `token`, releasing nodes left without children.
    ///
    /// Returns the removed token, if it was present.
    pub fn get_and_remove(&mut self, token: u64) -> Result<Option<u64>> {
        self.check_token(token)?;
        let mut path = [NodeRef::ROOT; MAX_DEPTH];
        let mut node = NodeRef::ROOT;
        for stage in 0..self.depth - 1 {
            path[stage] = node;
            let r = self.pool.child(node, self.digit(token, stage));
            if r == BLANK {
                return Ok(None);
            }
            node = self.child_node(node, r);
        }
        path[self.depth - 1] = node;

        let d = self.digit(token, self.depth - 1);
        let prev = self.pool.child(node, d);
        if prev == BLANK {
            return Ok(None);
        }
        self.pool.set_child(node, d, BLANK);
        self.size -= 1;

        // prune the branch bottom-up; the root is never released
        for stage in (1..self.depth).rev() {
            let node = path[stage];
            if self.pool.occupancy(node) != 0 {
                break;
            }
            self.release(node);
            let parent = path[stage - 1];
            self.pool
                .set_child(parent, self.digit(token, stage - 1), BLANK);
        }

        Ok(Some(self.compose(token, prev)))
    }

    /// Render the tree as ASCII art. Nodes print as `level|page:slot`.
    pub fn dump(&self) -> String {
        self.dump_node(0, NodeRef::ROOT).render()
    }

    /// Walk the whole structure and verify size, slot accounting, page
    /// occupancy and the free-page heap.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        self.heap.validate(&self.pool)?;

        let mut stack = vec![(NodeRef::ROOT, 0usize)];
        let mut nodes = 0u64;
        let mut values = 0u64;
        while let Some((node, level)) = stack.pop() {
            nodes += 1;
            if !self.pool.is_marked(node.page, node.slot) {
                return Err(format!("dangling node {}:{}", node.page, node.slot));
            }
            let used = self.pool.occupancy(node);
            if level > 0 && used == 0 {
                return Err(format!("empty node {}:{}", node.page, node.slot));
            }
            if level + 1 == self.depth {
                values += used as u64;
                continue;
            }
            for i in 0..FANOUT {
                let r = self.pool.child(node, i);
                if r != BLANK {
                    stack.push((self.child_node(node, r), level + 1));
                }
            }
        }

        if nodes != self.slots_used {
            return Err(format!(
                "{} reachable nodes, {} slots accounted",
                nodes, self.slots_used
            ));
        }
        if values != self.size {
            return Err(format!("{} reachable values, size {}", values, self.size));
        }
        Ok(())
    }

    // internals

    fn check_token(&self, token: u64) -> Result<()> {
        if token & !self.token_mask != 0 {
            return Err(Error::argument(format!(
                "token {:#x} out of mask {:#x}",
                token, self.token_mask
            )));
        }
        Ok(())
    }

    /// 4-bit digit of the address consumed at `stage`
    #[inline]
    fn digit(&self, token: u64, stage: usize) -> usize {
        let shift = DIGIT_BITS as usize * (self.depth - 1 - stage);
        (((token >> self.data_bits) >> shift) & 0xF) as usize
    }

    #[inline]
    fn child_node(&self, node: NodeRef, slot: u8) -> NodeRef {
        NodeRef {
            page: self.pool.host(node),
            slot,
        }
    }

    #[inline]
    fn compose(&self, token: u64, value: u8) -> u64 {
        (token & self.address_mask) | (value as u64 & self.value_mask)
    }

    fn seek(&self, token: u64, ceil: bool) -> Option<u64> {
        let mut path = [NodeRef::ROOT; MAX_DEPTH];
        let mut node = NodeRef::ROOT;
        let mut stage = 0;

        // follow the exact path as far as it exists
        loop {
            path[stage] = node;
            let r = self.pool.child(node, self.digit(token, stage));
            if r == BLANK {
                break;
            }
            if stage + 1 == self.depth {
                return Some(self.compose(token, r));
            }
            node = self.child_node(node, r);
            stage += 1;
        }

        // nearest sibling on the requested side, backing up as needed
        loop {
            let d = self.digit(token, stage);
            let next = if ceil {
                self.pool.min_index(path[stage], d + 1)
            } else if d > 0 {
                self.pool.max_index(path[stage], d - 1)
            } else {
                None
            };
            if let Some(idx) = next {
                return self.descend_extreme(token, path[stage], stage, idx, ceil);
            }
            if stage == 0 {
                return None;
            }
            stage -= 1;
        }
    }

    /// Take child `idx` of `node` at `stage`, then the smallest (ceil) or
    /// largest (floor) child on every level below.
    fn descend_extreme(
        &self,
        token: u64,
        mut node: NodeRef,
        stage: usize,
        mut idx: usize,
        ceil: bool,
    ) -> Option<u64> {
        let mut address = (0..stage).fold(0u64, |acc, s| {
            (acc << DIGIT_BITS) | self.digit(token, s) as u64
        });
        for level in stage..self.depth {
            address = (address << DIGIT_BITS) | idx as u64;
            let r = self.pool.child(node, idx);
            if level + 1 == self.depth {
                return Some((address << self.data_bits) | (r as u64 & self.value_mask));
            }
            node = self.child_node(node, r);
            idx = if ceil {
                self.pool.min_index(node, 0)?
            } else {
                self.pool.max_index(node, FANOUT - 1)?
            };
        }
        None
    }

    /// Allocate a blank child at position `idx` of `parent`.
    ///
    /// If the parent's host page is full, every live child moves with the new
    /// one to a page that fits the whole group.
    fn add_child(&mut self, parent: NodeRef, idx: usize) -> Result<NodeRef> {
        let host = self.pool.host(parent);
        if let Some(node) = self.pool.alloc(host) {
            self.pool.set_child(parent, idx, node.slot);
            self.slots_used += 1;
            self.heap.update(&self.pool, host);
            return Ok(node);
        }

        let needed = self.pool.occupancy(parent) + 1;
        let target = self.find_host_page(needed)?;
        let pages = self.pool.pages();
        let mut created = None;
        for i in 0..FANOUT {
            let r = self.pool.child(parent, i);
            if i == idx {
                debug_assert_eq!(r, BLANK);
                let node = self
                    .pool
                    .alloc(target)
                    .ok_or(Error::CapacityExhausted { pages })?;
                self.pool.set_child(parent, i, node.slot);
                created = Some(node);
            } else if r != BLANK {
                let node = self
                    .pool
                    .alloc(target)
                    .ok_or(Error::CapacityExhausted { pages })?;
                self.pool.copy(NodeRef { page: host, slot: r }, node);
                self.pool.mark(host, r, false);
                self.pool.set_child(parent, i, node.slot);
            }
        }
        self.pool.set_host(parent, target);
        self.slots_used += 1;
        self.heap.update(&self.pool, host);
        self.heap.update(&self.pool, target);

        created.ok_or(Error::CapacityExhausted { pages })
    }

    fn release(&mut self, node: NodeRef) {
        debug_assert!(self.pool.is_marked(node.page, node.slot));
        self.pool.mark(node.page, node.slot, false);
        self.slots_used -= 1;
        self.heap.update(&self.pool, node.page);
    }

    /// Page with room for `needed` slots, doubling the pool if none has.
    fn find_host_page(&mut self, needed: u32) -> Result<u32> {
        let top = self.heap.top();
        if self.pool.free(top) >= needed {
            return Ok(top);
        }

        let pages = self.pool.pages();
        if pages >= MAX_PAGES {
            return Err(Error::CapacityExhausted { pages });
        }
        info!(from = pages, to = pages * 2, "growing trie page pool");
        self.pool.grow_to(pages * 2);
        self.heap.extend(&self.pool);
        Ok(self.heap.top())
    }

    fn dump_node(&self, level: usize, node: NodeRef) -> TextTree {
        let label = format!("{}|{}:{}", level, node.page, node.slot);
        let children = (0..FANOUT)
            .filter_map(|i| {
                let r = self.pool.child(node, i);
                if r == BLANK {
                    None
                } else if level + 1 == self.depth {
                    Some(TextTree::leaf(format!("[{:x}] = {}", i, r)))
                } else {
                    let sub = self.dump_node(level + 1, self.child_node(node, r));
                    Some(TextTree::new(format!("[{:x}]", i), vec![sub]))
                }
            })
            .collect();
        TextTree::new(label, children)
    }
}
