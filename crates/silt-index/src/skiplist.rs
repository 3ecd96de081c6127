use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{IndexError, IndexResult};

/// Maximum number of forward-pointer levels. The head sentinel always has
/// this many; node heights are capped one below it.
pub const MAX_LEVELS: usize = 32;

/// Promotion probability for each additional level.
const BRANCH_PROBABILITY: f64 = 0.5;

/// Arena index of the head sentinel.
const HEAD: usize = 0;

/// One skip-list node living in the arena.
///
/// `forward[i]` is the arena index of the next node on level `i`, or `None`
/// at the end of that level's chain. A node of height `h` participates in
/// levels `0..h`.
#[derive(Clone, Debug)]
struct Node {
    key: Vec<u8>,
    value: Vec<u8>,
    forward: Vec<Option<usize>>,
}

impl Node {
    fn head() -> Self {
        Self {
            key: Vec::new(),
            value: Vec::new(),
            forward: vec![None; MAX_LEVELS],
        }
    }

    /// Placeholder left in a recycled arena slot.
    fn vacant() -> Self {
        Self {
            key: Vec::new(),
            value: Vec::new(),
            forward: Vec::new(),
        }
    }
}

/// Ordered map from byte-string keys to byte-string values, implemented as
/// a probabilistic skip list.
///
/// Nodes live in a contiguous arena and refer to each other by index, so the
/// list is a single owner of all of its storage; vacated slots are recycled
/// through a free list. Keys are compared lexicographically as unsigned
/// bytes. Duplicate keys are rejected rather than overwritten.
///
/// Cloning produces a fully independent list: the arena is copied wholesale,
/// so mutations on either side never show through to the other.
#[derive(Clone)]
pub struct SkipList {
    arena: Vec<Node>,
    free: Vec<usize>,
    /// Highest level currently populated by any non-head node.
    level: usize,
    len: usize,
    rng: StdRng,
}

impl SkipList {
    /// Create an empty list with an entropy-seeded level generator.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create an empty list with a fixed seed, for deterministic tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            arena: vec![Node::head()],
            free: Vec::new(),
            level: 0,
            len: 0,
            rng,
        }
    }

    /// Number of entries in the list.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Look up `key` and return a borrowed view of its value.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let update = self.find_predecessors(key);
        let candidate = self.arena[update[0]].forward[0]?;
        if self.arena[candidate].key.as_slice() == key {
            Some(&self.arena[candidate].value)
        } else {
            None
        }
    }

    /// Insert a key/value pair, storing independent copies of both.
    ///
    /// Fails with [`IndexError::AlreadyExists`] if an equal key is present;
    /// the stored value is not mutated in that case.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> IndexResult<()> {
        let update = self.find_predecessors(key);
        if let Some(existing) = self.arena[update[0]].forward[0] {
            if self.arena[existing].key.as_slice() == key {
                return Err(IndexError::AlreadyExists);
            }
        }

        let height = self.random_height();
        if height > self.level + 1 {
            // Levels above the old top have the head as predecessor, which
            // is what `update` already holds for them.
            self.level = height - 1;
        }

        let idx = self.alloc(Node {
            key: key.to_vec(),
            value: value.to_vec(),
            forward: vec![None; height],
        });
        for lvl in 0..height {
            let pred = update[lvl];
            self.arena[idx].forward[lvl] = self.arena[pred].forward[lvl];
            self.arena[pred].forward[lvl] = Some(idx);
        }
        self.len += 1;
        Ok(())
    }

    /// Remove `key` and release its storage.
    ///
    /// Fails with [`IndexError::NotFound`] if the key is absent.
    pub fn remove(&mut self, key: &[u8]) -> IndexResult<()> {
        let update = self.find_predecessors(key);
        let victim = match self.arena[update[0]].forward[0] {
            Some(idx) if self.arena[idx].key.as_slice() == key => idx,
            _ => return Err(IndexError::NotFound),
        };

        // Unlink at every level where the victim is linked in.
        for lvl in 0..=self.level {
            if self.arena[update[lvl]].forward[lvl] == Some(victim) {
                self.arena[update[lvl]].forward[lvl] = self.arena[victim].forward[lvl];
            }
        }

        self.arena[victim] = Node::vacant();
        self.free.push(victim);
        self.len -= 1;

        // Lower the top while its chain is empty; it never lands on a level
        // still populated by a live node.
        while self.level > 0 && self.arena[HEAD].forward[self.level].is_none() {
            self.level -= 1;
        }
        Ok(())
    }

    /// In-order iterator over `(key, value)` pairs (the level-0 chain).
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cur: self.arena[HEAD].forward[0],
        }
    }

    /// Walk each level from `self.level` down, recording the rightmost node
    /// with a key strictly below `key`. `update[lvl]` is that predecessor;
    /// levels above `self.level` stay at the head.
    fn find_predecessors(&self, key: &[u8]) -> [usize; MAX_LEVELS] {
        let mut update = [HEAD; MAX_LEVELS];
        let mut cur = HEAD;
        for lvl in (0..=self.level).rev() {
            while let Some(next) = self.arena[cur].forward[lvl] {
                if self.arena[next].key.as_slice() < key {
                    cur = next;
                } else {
                    break;
                }
            }
            update[lvl] = cur;
        }
        update
    }

    /// Geometric node height: 1 plus the run of successful coin flips,
    /// capped at `MAX_LEVELS - 1`.
    fn random_height(&mut self) -> usize {
        let mut height = 1;
        while height < MAX_LEVELS - 1 && self.rng.gen_bool(BRANCH_PROBABILITY) {
            height += 1;
        }
        height
    }

    fn alloc(&mut self, node: Node) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.arena[idx] = node;
                idx
            }
            None => {
                self.arena.push(node);
                self.arena.len() - 1
            }
        }
    }

    #[cfg(test)]
    fn levels_strictly_ordered(&self) -> bool {
        for lvl in 0..=self.level {
            let mut cur = self.arena[HEAD].forward[lvl];
            let mut prev: Option<&[u8]> = None;
            while let Some(idx) = cur {
                let key = self.arena[idx].key.as_slice();
                if let Some(p) = prev {
                    if p >= key {
                        return false;
                    }
                }
                prev = Some(key);
                cur = self.arena[idx].forward[lvl];
            }
        }
        true
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SkipList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkipList")
            .field("len", &self.len)
            .field("level", &self.level)
            .finish()
    }
}

/// Borrowing in-order iterator returned by [`SkipList::iter`].
pub struct Iter<'a> {
    list: &'a SkipList,
    cur: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cur?;
        let node = &self.list.arena[idx];
        self.cur = node.forward[0];
        Some((node.key.as_slice(), node.value.as_slice()))
    }
}

impl<'a> IntoIterator for &'a SkipList {
    type Item = (&'a [u8], &'a [u8]);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
