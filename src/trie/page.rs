//! Page arena backing the radix trie.
//!
//! Storage is a pair of flat vectors addressed by `(page, slot)` indices:
//!
//! - `words`: two `u64` per slot. A node packs its 16 eight-bit children
//!   into those two words, `BLANK` marking an absent child.
//! - `hosts`: one `u32` per slot, the page holding that node's children.
//!
//! The last two slots of every page are never handed out; their four words
//! form the 256-bit occupancy bitmap of the page.

pub const PAGE_SIZE: usize = 256;
pub const BLANK: u8 = 0xFF;
pub const FANOUT: usize = 16;

/// Slots usable for nodes on a fresh page
pub const PAGE_CAPACITY: u32 = (PAGE_SIZE - 2) as u32;

const WORDS_PER_SLOT: usize = 2;
const WORDS_PER_PAGE: usize = WORDS_PER_SLOT * PAGE_SIZE;
/// Offset of the bitmap inside a page, in words
const BITMAP_OFFSET: usize = WORDS_PER_SLOT * (PAGE_SIZE - 2);

/// Address of a node: the page it lives on and its slot there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef {
    pub page: u32,
    pub slot: u8,
}

impl NodeRef {
    pub const ROOT: NodeRef = NodeRef { page: 0, slot: 0 };

    #[inline]
    fn base(self) -> usize {
        self.page as usize * PAGE_SIZE + self.slot as usize
    }
}

#[derive(Debug, Clone)]
pub struct PagePool {
    words: Vec<u64>,
    hosts: Vec<u32>,
    pages: u32,
}

impl PagePool {
    pub fn new(pages: u32) -> Self {
        let mut pool = Self {
            words: Vec::new(),
            hosts: Vec::new(),
            pages: 0,
        };
        pool.grow_to(pages);
        pool
    }

    #[inline]
    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// Extend the pool to `pages` pages, reserving the bitmap slots of each
    /// new page.
    pub fn grow_to(&mut self, pages: u32) {
        let old = self.pages;
        self.words.resize(pages as usize * WORDS_PER_PAGE, 0);
        self.hosts.resize(pages as usize * PAGE_SIZE, 0);
        self.pages = pages;
        for page in old..pages {
            self.mark(page, (PAGE_SIZE - 2) as u8, true);
            self.mark(page, (PAGE_SIZE - 1) as u8, true);
        }
    }

    // occupancy bitmap

    #[inline]
    fn bitmap_word(page: u32, slot: u8) -> (usize, u64) {
        let idx = page as usize * WORDS_PER_PAGE + BITMAP_OFFSET + slot as usize / 64;
        (idx, 1u64 << (slot % 64))
    }

    pub fn mark(&mut self, page: u32, slot: u8, occupied: bool) {
        let (idx, bit) = Self::bitmap_word(page, slot);
        if occupied {
            self.words[idx] |= bit;
        } else {
            self.words[idx] &= !bit;
        }
    }

    pub fn is_marked(&self, page: u32, slot: u8) -> bool {
        let (idx, bit) = Self::bitmap_word(page, slot);
        self.words[idx] & bit != 0
    }

    #[inline]
    fn bitmap(&self, page: u32) -> &[u64] {
        let start = page as usize * WORDS_PER_PAGE + BITMAP_OFFSET;
        &self.words[start..start + 4]
    }

    /// Number of free slots on a page
    pub fn free(&self, page: u32) -> u32 {
        self.bitmap(page).iter().map(|w| w.count_zeros()).sum()
    }

    /// Lowest free slot on a page
    pub fn find_free_slot(&self, page: u32) -> Option<u8> {
        self.bitmap(page)
            .iter()
            .enumerate()
            .find(|(_, w)| **w != u64::MAX)
            .map(|(i, w)| (i * 64 + w.trailing_ones() as usize) as u8)
    }

    /// Claim the lowest free slot on `page` and blank it. The new node hosts
    /// its own future children on the same page.
    pub fn alloc(&mut self, page: u32) -> Option<NodeRef> {
        let slot = self.find_free_slot(page)?;
        self.mark(page, slot, true);
        let node = NodeRef { page, slot };
        self.blank(node);
        self.set_host(node, page);
        Some(node)
    }

    // node access

    #[inline]
    pub fn child(&self, node: NodeRef, idx: usize) -> u8 {
        let word = self.words[WORDS_PER_SLOT * node.base() + idx / 8];
        (word >> (8 * (idx % 8))) as u8
    }

    #[inline]
    pub fn set_child(&mut self, node: NodeRef, idx: usize, value: u8) {
        let word = &mut self.words[WORDS_PER_SLOT * node.base() + idx / 8];
        let shift = 8 * (idx % 8);
        *word = (*word & !(0xFFu64 << shift)) | ((value as u64) << shift);
    }

    pub fn blank(&mut self, node: NodeRef) {
        let i = WORDS_PER_SLOT * node.base();
        self.words[i] = u64::MAX;
        self.words[i + 1] = u64::MAX;
    }

    pub fn is_blank(&self, node: NodeRef) -> bool {
        let i = WORDS_PER_SLOT * node.base();
        self.words[i] == u64::MAX && self.words[i + 1] == u64::MAX
    }

    /// Number of present children
    pub fn occupancy(&self, node: NodeRef) -> u32 {
        (0..FANOUT)
            .filter(|&i| self.child(node, i) != BLANK)
            .count() as u32
    }

    /// Lowest present child index at or above `min`
    pub fn min_index(&self, node: NodeRef, min: usize) -> Option<usize> {
        (min..FANOUT).find(|&i| self.child(node, i) != BLANK)
    }

    /// Highest present child index at or below `max`
    pub fn max_index(&self, node: NodeRef, max: usize) -> Option<usize> {
        (0..=max.min(FANOUT - 1))
            .rev()
            .find(|&i| self.child(node, i) != BLANK)
    }

    #[inline]
    pub fn host(&self, node: NodeRef) -> u32 {
        self.hosts[node.base()]
    }

    #[inline]
    pub fn set_host(&mut self, node: NodeRef, page: u32) {
        self.hosts[node.base()] = page;
    }

    /// Copy child slots and host page of `src` into `dst`
    pub fn copy(&mut self, src: NodeRef, dst: NodeRef) {
        let s = WORDS_PER_SLOT * src.base();
        let d = WORDS_PER_SLOT * dst.base();
        self.words[d] = self.words[s];
        self.words[d + 1] = self.words[s + 1];
        self.hosts[dst.base()] = self.hosts[src.base()];
    }

    /// Bytes held by the arena
    pub fn memory_bytes(&self) -> usize {
        self.words.len() * std::mem::size_of::<u64>()
            + self.hosts.len() * std::mem::size_of::<u32>()
    }
}
