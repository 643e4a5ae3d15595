//! A plain LOUDS trie: the basic succinct form every other trie builds on.
//!
//! Nodes carry dense level-order integer ids. Node 0 is unused, node 1 is
//! the root, and node `x` corresponds to the `x`-th set bit of the LOUDS
//! sequence; parent/child links are recovered with rank/select arithmetic
//! instead of stored pointers.

use crate::bitvec::{BitList, BitVector};
use crate::errors::{Error, Result};
use crate::utils;
use crate::Statistics;
use crate::{PAD_LABEL, ROOT};

/// A plain LOUDS trie over 16-bit code units.
///
/// # Examples
///
/// ```
/// use krill::Trie;
///
/// let keys: Vec<Vec<u16>> = ["ab", "ac"]
///     .iter()
///     .map(|k| k.encode_utf16().collect())
///     .collect();
/// let trie = Trie::from_keys(&keys).unwrap();
///
/// assert_eq!(trie.lookup(&keys[0]), Some(3));
/// assert_eq!(trie.lookup(&keys[1]), Some(4));
/// assert_eq!(trie.lookup("ad".encode_utf16().collect::<Vec<_>>()), None);
/// ```
pub struct Trie {
    pub(crate) louds: BitVector,
    pub(crate) labels: Vec<u16>,
}

impl Trie {
    /// Creates a new [`Trie`] from keys sorted in strictly increasing
    /// code-unit order.
    ///
    /// # Errors
    ///
    /// [`Error::UnsortedKeys`] when the order requirement is violated.
    pub fn from_keys<K>(keys: &[K]) -> Result<Self>
    where
        K: AsRef<[u16]>,
    {
        Ok(Self::from_keys_with_nodes(keys)?.0)
    }

    /// Creates a new [`Trie`] from sorted keys and also reports the node id
    /// reached by each input key, in input order.
    ///
    /// The node ids are what callers need to attach auxiliary per-key
    /// structures (terminal marks, tail links) to the trie.
    ///
    /// # Errors
    ///
    /// [`Error::UnsortedKeys`] when the keys are not strictly increasing.
    pub fn from_keys_with_nodes<K>(keys: &[K]) -> Result<(Self, Vec<u32>)>
    where
        K: AsRef<[u16]>,
    {
        for pair in keys.windows(2) {
            if pair[0].as_ref() >= pair[1].as_ref() {
                return Err(Error::UnsortedKeys);
            }
        }
        let mut nodes = vec![ROOT; keys.len()];
        let mut labels = vec![PAD_LABEL, PAD_LABEL];
        let mut louds = BitList::new();
        louds.push(true);
        let mut next_node = ROOT;
        let mut cursor = 0usize;
        loop {
            let mut last_label = 0u16;
            let mut last_parent = 0u32;
            let mut rest_keys = 0usize;
            for (i, key) in keys.iter().enumerate() {
                let key = key.as_ref();
                if key.len() < cursor {
                    continue;
                }
                if key.len() == cursor {
                    // The key ends here; close its node's child block.
                    louds.push(false);
                    last_parent = nodes[i];
                    last_label = 0;
                    continue;
                }
                let label = key[cursor];
                let parent = nodes[i];
                if last_parent != parent {
                    louds.push(false);
                    louds.push(true);
                    labels.push(label);
                    next_node += 1;
                } else if last_label != label {
                    louds.push(true);
                    labels.push(label);
                    next_node += 1;
                }
                nodes[i] = next_node;
                last_label = label;
                last_parent = parent;
                rest_keys += 1;
            }
            if rest_keys == 0 {
                break;
            }
            cursor += 1;
        }
        let trie = Self {
            louds: louds.freeze(),
            labels,
        };
        Ok((trie, nodes))
    }

    /// Child of `node` carrying `label`, or `None`.
    ///
    /// Sibling labels are strictly increasing, so the child block is probed
    /// with a binary search.
    #[inline]
    pub fn traverse(&self, node: u32, label: u16) -> Option<u32> {
        let first_child = self.first_child(node)?;
        let start = self
            .louds
            .select(first_child as usize, true)
            .expect("child id is in range");
        let len = self.louds.next_clear_bit(start) - start;
        let lo = first_child as usize;
        match self.labels[lo..lo + len].binary_search(&label) {
            Ok(i) => Some((lo + i) as u32),
            Err(_) => None,
        }
    }

    /// Node reached by `key` from the root, or `None` when the path does
    /// not exist.
    #[inline]
    pub fn lookup<K>(&self, key: K) -> Option<u32>
    where
        K: AsRef<[u16]>,
    {
        let mut node = ROOT;
        for &label in key.as_ref() {
            node = self.traverse(node, label)?;
        }
        Some(node)
    }

    /// Parent of `node`; the root reports 0. Callers walking upwards must
    /// stop at node 1. Passing node ids outside the trie panics.
    #[inline]
    pub fn parent(&self, node: u32) -> u32 {
        let pos = self
            .louds
            .select(node as usize, true)
            .expect("node id is in range");
        self.louds.rank(pos, false) as u32
    }

    /// First (smallest-labeled) child of `node`, or `None` for a leaf.
    #[inline]
    pub fn first_child(&self, node: u32) -> Option<u32> {
        let pos = self.louds.select(node as usize, false)? + 1;
        if self.louds.get(pos) {
            Some(self.louds.rank(pos, true) as u32 + 1)
        } else {
            None
        }
    }

    /// Reconstructs the key of `node` by walking parent links, appending the
    /// labels to `out` in forward order. Returns the number of code units
    /// appended.
    pub fn reverse_lookup(&self, node: u32, out: &mut Vec<u16>) -> usize {
        let offset = out.len();
        let mut node = node;
        while node > ROOT {
            out.push(self.labels[node as usize]);
            node = self.parent(node);
        }
        out[offset..].reverse();
        out.len() - offset
    }

    /// Visits every node of the subtree under `node` in depth-first
    /// pre-order, passing the node id and the label suffix accumulated from
    /// `node` (empty for `node` itself).
    ///
    /// The traversal keeps an explicit stack, so arbitrarily deep tries
    /// cannot exhaust the call stack.
    pub fn predictive_search_depth_first<F>(&self, node: u32, mut f: F)
    where
        F: FnMut(u32, &[u16]),
    {
        let mut suffix: Vec<u16> = Vec::with_capacity(8);
        let mut stack: Vec<(u32, usize)> = vec![(node, 0)];
        while let Some((current, depth)) = stack.pop() {
            suffix.truncate(depth);
            if current != node {
                suffix.push(self.labels[current as usize]);
            }
            f(current, &suffix);
            if let Some(first) = self.first_child(current) {
                let start = self
                    .louds
                    .select(first as usize, true)
                    .expect("child id is in range");
                let count = (self.louds.next_clear_bit(start) - start) as u32;
                // Reversed so the smallest label is popped first.
                for child in (first..first + count).rev() {
                    stack.push((child, suffix.len()));
                }
            }
        }
    }

    /// Visits every node of the subtree under `node` in breadth-first
    /// order.
    ///
    /// Each level occupies a contiguous id range, so node ids are visited
    /// in strictly increasing order; callers can exploit this for cheap
    /// batch filtering.
    pub fn predictive_search_breadth_first<F>(&self, node: u32, mut f: F)
    where
        F: FnMut(u32),
    {
        let mut lower = node;
        let mut upper = node + 1;
        while lower < upper {
            for id in lower..upper {
                f(id);
            }
            lower = self.child_range_start(lower);
            upper = self.child_range_start(upper);
        }
    }

    /// First node id of the children level below range edge `edge`, or one
    /// past the deepest node id when no level remains.
    fn child_range_start(&self, edge: u32) -> u32 {
        match self.louds.select(edge as usize, false) {
            Some(pos) => self.louds.rank(pos + 1, true) as u32 + 1,
            None => self.max_node_id() + 1,
        }
    }

    /// Largest valid node id (the root when the trie is empty).
    pub(crate) fn max_node_id(&self) -> u32 {
        (self.labels.len() - 1) as u32
    }
}

impl Statistics for Trie {
    fn io_bytes(&self) -> usize {
        self.louds.io_bytes() + utils::io_size_u16s(self.labels.len())
    }

    fn num_nodes(&self) -> usize {
        self.labels.len() - 2
    }
}

/// Incremental builder accepting keys one by one in strictly increasing
/// order.
///
/// The builder grows one louds/label fragment per depth and stitches them
/// together level by level on [`build`](Self::build). A rejected
/// [`add`](Self::add) leaves the builder untouched.
///
/// # Examples
///
/// ```
/// use krill::TrieBuilder;
///
/// let mut builder = TrieBuilder::new();
/// for key in ["ab", "ac"] {
///     let units: Vec<u16> = key.encode_utf16().collect();
///     builder.add(&units).unwrap();
/// }
/// let trie = builder.build();
///
/// let ab: Vec<u16> = "ab".encode_utf16().collect();
/// assert_eq!(trie.lookup(&ab), Some(3));
/// ```
pub struct TrieBuilder {
    levels: Vec<Level>,
    last_key: Vec<u16>,
}

#[derive(Default)]
struct Level {
    louds: Vec<bool>,
    labels: Vec<u16>,
}

impl TrieBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        let level0 = Level {
            louds: vec![true, false],
            labels: vec![PAD_LABEL, PAD_LABEL],
        };
        let level1 = Level {
            louds: vec![false],
            labels: vec![],
        };
        Self {
            levels: vec![level0, level1],
            last_key: vec![],
        }
    }

    /// Adds a key.
    ///
    /// # Errors
    ///
    /// [`Error::UnsortedKeys`] when `key` is not strictly greater than the
    /// previously added key (the empty key can therefore never be added).
    /// The violating key is dropped and the builder remains usable.
    pub fn add(&mut self, key: &[u16]) -> Result<()> {
        if key <= self.last_key.as_slice() {
            return Err(Error::UnsortedKeys);
        }
        if key.len() + 1 >= self.levels.len() {
            self.levels.resize_with(key.len() + 2, Level::default);
        }
        let mut i = 0;
        while i < key.len() {
            let level = &mut self.levels[i + 1];
            if i == self.last_key.len() || Some(key[i]) != level.labels.last().copied() {
                // First divergence from the previous key: a new sibling.
                *level.louds.last_mut().expect("level fragment is seeded") = true;
                level.louds.push(false);
                level.labels.push(key[i]);
                break;
            }
            i += 1;
        }
        i += 1;
        while i < key.len() {
            let level = &mut self.levels[i + 1];
            level.louds.push(true);
            level.louds.push(false);
            level.labels.push(key[i]);
            i += 1;
        }
        // The terminal node contributes a closed, empty child block one
        // level down; a later key extending this one reopens it.
        self.levels[key.len() + 1].louds.push(false);
        self.last_key.clear();
        self.last_key.extend_from_slice(key);
        Ok(())
    }

    /// Finishes the trie.
    pub fn build(self) -> Trie {
        let mut bits: Vec<bool> = vec![];
        let mut labels: Vec<u16> = vec![];
        for level in &self.levels {
            bits.extend_from_slice(&level.louds);
            labels.extend_from_slice(&level.labels);
        }
        // The deepest node's block terminator is never stored.
        bits.pop();
        let mut louds = BitList::new();
        for bit in bits {
            louds.push(bit);
        }
        Trie {
            louds: louds.freeze(),
            labels,
        }
    }
}

impl Default for TrieBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(words: &[&str]) -> Vec<Vec<u16>> {
        words.iter().map(|w| w.encode_utf16().collect()).collect()
    }

    #[test]
    fn test_from_keys_with_nodes() {
        let keys = encode(&["baby", "bad", "bank", "box", "dad", "dance"]);
        let (trie, nodes) = Trie::from_keys_with_nodes(&keys).unwrap();
        assert_eq!(nodes, vec![13, 8, 14, 10, 11, 16]);
        assert_eq!(trie.num_nodes(), 15);
        for (key, &node) in keys.iter().zip(&nodes) {
            assert_eq!(trie.lookup(key), Some(node));
        }
    }

    #[test]
    fn test_lookup_paths() {
        let keys = encode(&["baby", "bad", "bank", "box", "dad", "dance"]);
        let (trie, _) = Trie::from_keys_with_nodes(&keys).unwrap();
        // Interior paths resolve to their nodes; absent paths do not.
        assert_eq!(trie.lookup(encode(&["b"])[0].as_slice()), Some(2));
        assert_eq!(trie.lookup(encode(&["dan"])[0].as_slice()), Some(12));
        assert_eq!(trie.lookup(encode(&["x"])[0].as_slice()), None);
        assert_eq!(trie.lookup(encode(&["dancea"])[0].as_slice()), None);
        let empty: &[u16] = &[];
        assert_eq!(trie.lookup(empty), Some(1));
    }

    #[test]
    fn test_unsorted_keys_rejected() {
        let keys = encode(&["b", "a"]);
        assert!(matches!(
            Trie::from_keys(&keys),
            Err(Error::UnsortedKeys)
        ));
        let dup = encode(&["a", "a"]);
        assert!(Trie::from_keys(&dup).is_err());
    }

    #[test]
    fn test_parent_and_reverse_lookup() {
        let keys = encode(&["baby", "bad", "bank", "box", "dad", "dance"]);
        let (trie, nodes) = Trie::from_keys_with_nodes(&keys).unwrap();
        let mut buf = vec![];
        for (key, &node) in keys.iter().zip(&nodes) {
            buf.clear();
            let appended = trie.reverse_lookup(node, &mut buf);
            assert_eq!(appended, key.len());
            assert_eq!(&buf, key);
        }
    }

    #[test]
    fn test_builder_matches_batch_build() {
        let keys = encode(&["baby", "bad", "bank", "box", "dad", "dance"]);
        let (batch, nodes) = Trie::from_keys_with_nodes(&keys).unwrap();
        let mut builder = TrieBuilder::new();
        for key in &keys {
            builder.add(key).unwrap();
        }
        let built = builder.build();
        assert_eq!(built.num_nodes(), batch.num_nodes());
        for (key, &node) in keys.iter().zip(&nodes) {
            assert_eq!(built.lookup(key), Some(node));
        }
    }

    #[test]
    fn test_builder_rejects_out_of_order() {
        let keys = encode(&["ab", "aa", "ab", "ac"]);
        let mut builder = TrieBuilder::new();
        assert!(builder.add(&keys[0]).is_ok());
        assert!(builder.add(&keys[1]).is_err());
        assert!(builder.add(&keys[2]).is_err());
        // The builder stays usable after a rejected key.
        assert!(builder.add(&keys[3]).is_ok());
        let trie = builder.build();
        assert!(trie.lookup(&keys[0]).is_some());
        assert!(trie.lookup(&keys[3]).is_some());
        assert_eq!(trie.lookup(&keys[1]), None);
    }

    #[test]
    fn test_predictive_search_breadth_first() {
        let keys = encode(&["baby", "bad", "bank", "box", "dad", "dance"]);
        let (trie, _) = Trie::from_keys_with_nodes(&keys).unwrap();
        let mut visited = vec![];
        trie.predictive_search_breadth_first(1, |n| visited.push(n));
        // Breadth-first over the whole trie is the identity on ids.
        assert_eq!(visited, (1..=16).collect::<Vec<_>>());
        let mut sub = vec![];
        trie.predictive_search_breadth_first(6, |n| sub.push(n));
        assert_eq!(sub, vec![6, 11, 12, 15, 16]);
    }

    #[test]
    fn test_predictive_search_depth_first() {
        let keys = encode(&["baby", "bad", "bank", "box", "dad", "dance"]);
        let (trie, _) = Trie::from_keys_with_nodes(&keys).unwrap();
        let mut visited = vec![];
        trie.predictive_search_depth_first(6, |n, suffix| {
            visited.push((n, String::from_utf16(suffix).unwrap()));
        });
        let expected = vec![
            (6, String::new()),
            (11, "d".to_string()),
            (12, "n".to_string()),
            (15, "nc".to_string()),
            (16, "nce".to_string()),
        ];
        assert_eq!(visited, expected);
    }

    #[test]
    fn test_empty_trie() {
        let trie = Trie::from_keys::<Vec<u16>>(&[]).unwrap();
        assert_eq!(trie.num_nodes(), 0);
        assert_eq!(trie.lookup("a".encode_utf16().collect::<Vec<_>>()), None);
        let mut visited = vec![];
        trie.predictive_search_breadth_first(1, |n| visited.push(n));
        assert_eq!(visited, vec![1]);
    }
}
