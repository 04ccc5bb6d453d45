//! Frequency buckets: the `frequencyOf` and `bucketOf` indexes of the LFU cache.
//!
//! Tracks an access count per key and, for every count in use, a FIFO list of
//! the keys currently at that count. Insert, touch and eviction are O(1).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                        FrequencyBuckets<K> Layout                           │
//! │                                                                             │
//! │   index: FxHashMap<K, NodeId>          nodes: Vec<Option<Node<K>>>          │
//! │   ┌──────────┬────────┐                ┌──────┬──────────────────────┐      │
//! │   │ seattle  │  n0    │──────────────► │  n0  │ freq:2, prev/next    │      │
//! │   │ vancouver│  n1    │──────────────► │  n1  │ freq:1, prev/next    │      │
//! │   │ portland │  n2    │──────────────► │  n2  │ freq:1, prev/next    │      │
//! │   └──────────┴────────┘                └──────┴──────────────────────┘      │
//! │                                                                             │
//! │   buckets: FxHashMap<u64, Bucket>  (frequency → doubly-linked FIFO)         │
//! │                                                                             │
//! │     min_freq = 1                                                            │
//! │        │                                                                    │
//! │        ▼                                                                    │
//! │     freq=1: head ──► [n1] ◄──► [n2] ◄── tail                                │
//! │                     oldest     newest                                       │
//! │     freq=2: head ──► [n0] ◄── tail                                          │
//! │                                                                             │
//! │     bucket links: freq=1 ──higher──► freq=2,  freq=2 ──lower──► freq=1      │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - `insert` appends at the tail of bucket 1.
//! - `touch` unlinks the node, drops its bucket if now empty, and appends it
//!   at the tail of the next bucket.
//! - `pop_min` takes the head of the `min_freq` bucket: lowest count, oldest
//!   arrival at that count.
//!
//! Empty buckets are never kept; `check_invariants` verifies that and the rest
//! of the bookkeeping.
//!
//! ## Example
//!
//! ```
//! use forecast_cache::ds::FrequencyBuckets;
//!
//! let mut freq = FrequencyBuckets::new();
//! freq.insert("a");
//! freq.insert("b");
//! freq.insert("c");
//! freq.touch(&"a");
//!
//! // "b" and "c" share the lowest count; "b" arrived first.
//! assert_eq!(freq.pop_min(), Some(("b", 1)));
//! assert_eq!(freq.pop_min(), Some(("c", 1)));
//! assert_eq!(freq.pop_min(), Some(("a", 2)));
//! assert_eq!(freq.pop_min(), None);
//! ```

use rustc_hash::FxHashMap;
use std::hash::Hash;

use crate::error::InvariantError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeId(usize);

#[derive(Debug)]
struct Node<K> {
    prev: Option<NodeId>,
    next: Option<NodeId>,
    freq: u64,
    key: K,
}

#[derive(Debug, Default)]
struct Bucket {
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
    lower: Option<u64>,
    higher: Option<u64>,
}

/// Access counts with FIFO ordering inside each count.
#[derive(Debug)]
pub struct FrequencyBuckets<K> {
    nodes: Vec<Option<Node<K>>>,
    free: Vec<usize>,
    index: FxHashMap<K, NodeId>,
    buckets: FxHashMap<u64, Bucket>,
    min_freq: u64,
}

impl<K> FrequencyBuckets<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty tracker sized for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            buckets: FxHashMap::default(),
            min_freq: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Current count for `key`.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        self.node(id).map(|node| node.freq)
    }

    /// Lowest count in use, or `None` when empty.
    pub fn min_freq(&self) -> Option<u64> {
        (self.min_freq != 0).then_some(self.min_freq)
    }

    /// The key `pop_min` would return, without removing it.
    pub fn peek_min(&self) -> Option<(&K, u64)> {
        let id = self.buckets.get(&self.min_freq)?.head?;
        self.node(id).map(|node| (&node.key, node.freq))
    }

    /// Starts tracking `key` at count 1, behind every key already at 1.
    ///
    /// Returns `false` (and changes nothing) if `key` is already tracked.
    pub fn insert(&mut self, key: K) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }

        let id = self.alloc(Node {
            prev: None,
            next: None,
            freq: 1,
            key: key.clone(),
        });
        self.index.insert(key, id);

        if !self.buckets.contains_key(&1) {
            let higher = self.min_freq().filter(|&f| f > 1);
            self.link_bucket(1, None, higher);
        }
        if let Some(bucket) = self.buckets.get_mut(&1) {
            Self::push_back(&mut self.nodes, bucket, id);
        }
        self.min_freq = 1;
        true
    }

    /// Bumps `key` by one and moves it to the back of its new bucket.
    ///
    /// Returns the new count, or `None` if `key` is not tracked.
    pub fn touch(&mut self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        let current = self.node(id)?.freq;

        if current == u64::MAX {
            let bucket = self.buckets.get_mut(&current)?;
            Self::unlink(&mut self.nodes, bucket, id);
            Self::push_back(&mut self.nodes, bucket, id);
            return Some(current);
        }
        let next = current + 1;

        let (lower, higher, emptied) = {
            let bucket = self.buckets.get_mut(&current)?;
            Self::unlink(&mut self.nodes, bucket, id);
            (bucket.lower, bucket.higher, bucket.len == 0)
        };

        if emptied {
            self.unlink_bucket(current, lower, higher);
            if self.min_freq == current {
                self.min_freq = higher.unwrap_or(0);
            }
        }

        if !self.buckets.contains_key(&next) {
            let lower = if emptied { lower } else { Some(current) };
            self.link_bucket(next, lower, higher);
        }

        if let Some(node) = self.node_mut(id) {
            node.freq = next;
        }
        let bucket = self.buckets.get_mut(&next)?;
        Self::push_back(&mut self.nodes, bucket, id);

        if self.min_freq == 0 || next < self.min_freq {
            self.min_freq = next;
        }
        Some(next)
    }

    /// Removes and returns the oldest key at the lowest count.
    pub fn pop_min(&mut self) -> Option<(K, u64)> {
        let freq = self.min_freq;
        if freq == 0 {
            return None;
        }

        let (id, lower, higher, emptied) = {
            let bucket = self.buckets.get_mut(&freq)?;
            let id = bucket.head?;
            Self::unlink(&mut self.nodes, bucket, id);
            (id, bucket.lower, bucket.higher, bucket.len == 0)
        };

        if emptied {
            self.unlink_bucket(freq, lower, higher);
            self.min_freq = higher.unwrap_or(0);
        }

        let node = self.release(id)?;
        self.index.remove(&node.key);
        Some((node.key, node.freq))
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.index.clear();
        self.buckets.clear();
        self.min_freq = 0;
    }

    /// Keys at `freq`, oldest first.
    pub fn bucket_keys(&self, freq: u64) -> BucketKeys<'_, K> {
        BucketKeys {
            owner: self,
            current: self.buckets.get(&freq).and_then(|bucket| bucket.head),
        }
    }

    /// Every bucket in ascending count order, each oldest first.
    pub fn buckets_ascending(&self) -> Vec<(u64, Vec<&K>)> {
        let mut out = Vec::with_capacity(self.buckets.len());
        let mut freq = self.min_freq();
        while let Some(f) = freq {
            out.push((f, self.bucket_keys(f).collect()));
            freq = self.buckets.get(&f).and_then(|bucket| bucket.higher);
        }
        out
    }

    /// Verifies the index, bucket chain and per-bucket lists agree.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let live = self.nodes.iter().filter(|slot| slot.is_some()).count();
        if live != self.index.len() {
            return Err(InvariantError::new(format!(
                "{} live nodes but {} indexed keys",
                live,
                self.index.len()
            )));
        }

        if self.index.is_empty() {
            if !self.buckets.is_empty() || self.min_freq != 0 {
                return Err(InvariantError::new("empty tracker still holds buckets"));
            }
            return Ok(());
        }

        if !self.buckets.contains_key(&self.min_freq) {
            return Err(InvariantError::new(format!(
                "min_freq {} has no bucket",
                self.min_freq
            )));
        }

        let mut seen = 0usize;
        for (&freq, bucket) in &self.buckets {
            if bucket.len == 0 || bucket.head.is_none() {
                return Err(InvariantError::new(format!("bucket {freq} is empty")));
            }
            match bucket.lower {
                Some(lower) if self.buckets.get(&lower).and_then(|b| b.higher) != Some(freq) => {
                    return Err(InvariantError::new(format!(
                        "bucket {freq} lower link {lower} is not reciprocated"
                    )));
                },
                None if freq != self.min_freq => {
                    return Err(InvariantError::new(format!(
                        "bucket {freq} has no lower link but min_freq is {}",
                        self.min_freq
                    )));
                },
                _ => {},
            }
            if let Some(higher) = bucket.higher
                && self.buckets.get(&higher).and_then(|b| b.lower) != Some(freq)
            {
                return Err(InvariantError::new(format!(
                    "bucket {freq} higher link {higher} is not reciprocated"
                )));
            }

            let mut current = bucket.head;
            let mut last = None;
            let mut count = 0usize;
            while let Some(id) = current {
                let node = self
                    .node(id)
                    .ok_or_else(|| InvariantError::new(format!("bucket {freq} links a free slot")))?;
                if node.freq != freq {
                    return Err(InvariantError::new(format!(
                        "node at count {} listed in bucket {freq}",
                        node.freq
                    )));
                }
                if node.prev != last {
                    return Err(InvariantError::new(format!("bucket {freq} has a broken back link")));
                }
                if self.index.get(&node.key) != Some(&id) {
                    return Err(InvariantError::new(format!(
                        "bucket {freq} lists a key the index maps elsewhere"
                    )));
                }
                last = Some(id);
                current = node.next;
                count += 1;
            }
            if bucket.tail != last || bucket.len != count {
                return Err(InvariantError::new(format!(
                    "bucket {freq} tail/len disagree with its list"
                )));
            }
            seen += count;
        }

        if seen != self.index.len() {
            return Err(InvariantError::new(format!(
                "{} keys in buckets but {} indexed",
                seen,
                self.index.len()
            )));
        }
        Ok(())
    }

    fn node(&self, id: NodeId) -> Option<&Node<K>> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<K>> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn alloc(&mut self, node: Node<K>) -> NodeId {
        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = Some(node);
            NodeId(idx)
        } else {
            self.nodes.push(Some(node));
            NodeId(self.nodes.len() - 1)
        }
    }

    fn release(&mut self, id: NodeId) -> Option<Node<K>> {
        let node = self.nodes.get_mut(id.0)?.take()?;
        self.free.push(id.0);
        Some(node)
    }

    fn link_bucket(&mut self, freq: u64, lower: Option<u64>, higher: Option<u64>) {
        self.buckets.insert(
            freq,
            Bucket {
                lower,
                higher,
                ..Bucket::default()
            },
        );
        if let Some(lower) = lower
            && let Some(bucket) = self.buckets.get_mut(&lower)
        {
            bucket.higher = Some(freq);
        }
        if let Some(higher) = higher
            && let Some(bucket) = self.buckets.get_mut(&higher)
        {
            bucket.lower = Some(freq);
        }
    }

    fn unlink_bucket(&mut self, freq: u64, lower: Option<u64>, higher: Option<u64>) {
        if let Some(lower) = lower
            && let Some(bucket) = self.buckets.get_mut(&lower)
        {
            bucket.higher = higher;
        }
        if let Some(higher) = higher
            && let Some(bucket) = self.buckets.get_mut(&higher)
        {
            bucket.lower = lower;
        }
        self.buckets.remove(&freq);
    }

    fn push_back(nodes: &mut [Option<Node<K>>], bucket: &mut Bucket, id: NodeId) {
        let old_tail = bucket.tail;
        if let Some(node) = nodes[id.0].as_mut() {
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(tail) => {
                if let Some(node) = nodes[tail.0].as_mut() {
                    node.next = Some(id);
                }
            },
            None => bucket.head = Some(id),
        }
        bucket.tail = Some(id);
        bucket.len += 1;
    }

    fn unlink(nodes: &mut [Option<Node<K>>], bucket: &mut Bucket, id: NodeId) {
        let (prev, next) = match nodes[id.0].as_ref() {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match prev {
            Some(prev) => {
                if let Some(node) = nodes[prev.0].as_mut() {
                    node.next = next;
                }
            },
            None => bucket.head = next,
        }
        match next {
            Some(next) => {
                if let Some(node) = nodes[next.0].as_mut() {
                    node.prev = prev;
                }
            },
            None => bucket.tail = prev,
        }
        if let Some(node) = nodes[id.0].as_mut() {
            node.prev = None;
            node.next = None;
        }
        bucket.len = bucket.len.saturating_sub(1);
    }
}

impl<K> Default for FrequencyBuckets<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over one bucket's keys, oldest first.
///
/// Created by [`FrequencyBuckets::bucket_keys`].
pub struct BucketKeys<'a, K> {
    owner: &'a FrequencyBuckets<K>,
    current: Option<NodeId>,
}

impl<'a, K> Iterator for BucketKeys<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.owner.nodes.get(id.0)?.as_ref()?;
        self.current = node.next;
        Some(&node.key)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: bookkeeping stays consistent after any sequence of operations
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_invariants_always_hold(
            ops in prop::collection::vec((0u8..3, 0u32..16), 0..200)
        ) {
            let mut buckets: FrequencyBuckets<u32> = FrequencyBuckets::new();
            for (op, key) in ops {
                match op {
                    0 => { buckets.insert(key); }
                    1 => { buckets.touch(&key); }
                    _ => { buckets.pop_min(); }
                }
                prop_assert!(buckets.check_invariants().is_ok());
            }
        }

        /// Property: pop_min always returns a key at the lowest count
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_pop_min_takes_lowest_count(
            touches in prop::collection::vec(0u32..8, 0..64)
        ) {
            let mut buckets: FrequencyBuckets<u32> = FrequencyBuckets::new();
            for key in 0..8u32 {
                buckets.insert(key);
            }
            for key in touches {
                buckets.touch(&key);
            }
            while let Some(lowest) = buckets.min_freq() {
                let (_, freq) = buckets.pop_min().unwrap();
                prop_assert_eq!(freq, lowest);
            }
        }
    }
}
