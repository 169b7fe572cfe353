//! Free-page heap.
//!
//! Binary max-heap over page indices ranked by free slot count, ties broken
//! toward the lowest page index. `index` maps a page back to its heap
//! position so a single page can be re-ranked after every allocation or
//! release.

use super::page::PagePool;

#[derive(Debug, Clone, Default)]
pub struct FreePageHeap {
    heap: Vec<u32>,
    index: Vec<u32>,
}

#[inline]
fn rank(pool: &PagePool, page: u32) -> u64 {
    ((pool.free(page) as u64) << 32) | (u32::MAX - page) as u64
}

#[inline]
fn parent(n: usize) -> usize {
    (n - 1) >> 1
}

#[inline]
fn left(n: usize) -> usize {
    (n << 1) + 1
}

impl FreePageHeap {
    pub fn new(pool: &PagePool) -> Self {
        let mut heap = Self::default();
        heap.extend(pool);
        heap
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Best page: most free slots, lowest index among equals
    #[inline]
    pub fn top(&self) -> u32 {
        self.heap[0]
    }

    /// Take in pages the pool gained since the last call.
    pub fn extend(&mut self, pool: &PagePool) {
        let start = self.heap.len() as u32;
        for page in start..pool.pages() {
            let n = self.heap.len();
            self.heap.push(page);
            self.index.push(n as u32);
            self.sift_up(pool, n);
        }
    }

    /// Restore heap order after the free count of `page` changed.
    pub fn update(&mut self, pool: &PagePool, page: u32) {
        let n = self.index[page as usize] as usize;
        let n = self.sift_up(pool, n);
        self.sift_down(pool, n);
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.index[self.heap[a] as usize] = a as u32;
        self.index[self.heap[b] as usize] = b as u32;
    }

    fn sift_up(&mut self, pool: &PagePool, mut n: usize) -> usize {
        let r = rank(pool, self.heap[n]);
        while n > 0 {
            let p = parent(n);
            if rank(pool, self.heap[p]) >= r {
                break;
            }
            self.swap(n, p);
            n = p;
        }
        n
    }

    fn sift_down(&mut self, pool: &PagePool, mut n: usize) -> usize {
        let len = self.heap.len();
        loop {
            let l = left(n);
            if l >= len {
                return n;
            }
            let mut best = l;
            if l + 1 < len && rank(pool, self.heap[l + 1]) > rank(pool, self.heap[l]) {
                best = l + 1;
            }
            if rank(pool, self.heap[best]) <= rank(pool, self.heap[n]) {
                return n;
            }
            self.swap(n, best);
            n = best;
        }
    }

    /// Check heap order and page/position linkage.
    pub fn validate(&self, pool: &PagePool) -> Result<(), String> {
        if self.heap.len() != pool.pages() as usize {
            return Err(format!(
                "heap tracks {} pages, pool has {}",
                self.heap.len(),
                pool.pages()
            ));
        }
        for (n, &page) in self.heap.iter().enumerate() {
            if self.index[page as usize] as usize != n {
                return Err(format!("page {} linked to wrong heap position", page));
            }
            if n > 0 && rank(pool, page) >= rank(pool, self.heap[parent(n)]) {
                return Err(format!(
                    "heap order violated at {} (page {}, free {})",
                    n,
                    page,
                    pool.free(page)
                ));
            }
        }
        Ok(())
    }
}
