//! A two-trie compression: unbranching suffixes move into a second trie.
//!
//! The branching skeleton of every key lives in a prefix [`Trie`]; every
//! distinct tail is **reversed** and stored in a shared tail [`Trie`], so
//! common endings merge near that trie's root. A link bit vector plus a
//! parallel id array join the two.

use crate::bitvec::{BitList, BitVector};
use crate::errors::Result;
use crate::tail::extract_tail_lengths;
use crate::trie::Trie;
use crate::utils;
use crate::LookupResult;
use crate::Statistics;
use crate::ROOT;

use hashbrown::HashSet;

/// A LOUDS double trie.
///
/// # Examples
///
/// ```
/// use krill::{DoubleTrie, LookupResult};
///
/// let keys: Vec<Vec<u16>> = ["baby", "bad", "bank", "box", "dad", "dance"]
///     .iter()
///     .map(|k| k.encode_utf16().collect())
///     .collect();
/// let (trie, nodes) = DoubleTrie::from_keys_with_nodes(&keys).unwrap();
///
/// assert_eq!(nodes, vec![7, 8, 9, 5, 10, 11]);
/// assert_eq!(trie.lookup(&keys[5]), LookupResult::Found(11));
/// let danc: Vec<u16> = "danc".encode_utf16().collect();
/// assert_eq!(trie.lookup(&danc), LookupResult::Partial(11));
/// ```
pub struct DoubleTrie {
    prefix_trie: Trie,
    tail_trie: Trie,
    outs: BitVector,
    links: BitVector,
    link_array: Vec<u32>,
}

impl DoubleTrie {
    /// Creates a new [`DoubleTrie`] from keys sorted in strictly increasing
    /// code-unit order.
    ///
    /// # Errors
    ///
    /// [`Error::UnsortedKeys`](crate::errors::Error::UnsortedKeys) when the
    /// order requirement is violated.
    pub fn from_keys<K>(keys: &[K]) -> Result<Self>
    where
        K: AsRef<[u16]>,
    {
        Ok(Self::from_keys_with_nodes(keys)?.0)
    }

    /// Creates a new [`DoubleTrie`] and reports the prefix-trie node id
    /// reached by each input key, in input order.
    ///
    /// # Errors
    ///
    /// [`Error::UnsortedKeys`](crate::errors::Error::UnsortedKeys) when the
    /// keys are not strictly increasing.
    pub fn from_keys_with_nodes<K>(keys: &[K]) -> Result<(Self, Vec<u32>)>
    where
        K: AsRef<[u16]>,
    {
        let tail_lens = extract_tail_lengths(keys);

        // Distinct tails, reversed so shared endings meet at the tail
        // trie's root.
        let mut tail_set: HashSet<Vec<u16>> = HashSet::new();
        for (i, &t) in tail_lens.iter().enumerate() {
            if t > 0 {
                let key = keys[i].as_ref();
                let mut tail: Vec<u16> = key[key.len() - t as usize..].to_vec();
                tail.reverse();
                tail_set.insert(tail);
            }
        }
        let mut tail_keys: Vec<Vec<u16>> = tail_set.into_iter().collect();
        tail_keys.sort_unstable();
        let tail_trie = Trie::from_keys(&tail_keys)?;

        let prefixes: Vec<&[u16]> = keys
            .iter()
            .zip(&tail_lens)
            .map(|(key, &t)| {
                let key = key.as_ref();
                &key[..key.len() - t as usize]
            })
            .collect();
        let (prefix_trie, nodes) = Trie::from_keys_with_nodes(&prefixes)?;

        let mut outs = BitList::with_len(prefix_trie.num_nodes() + 2);
        for &node in &nodes {
            outs.set(node as usize, true);
        }

        let mut link_list = BitList::with_len(prefix_trie.num_nodes() + 2);
        for (i, &t) in tail_lens.iter().enumerate() {
            if t > 0 {
                link_list.set(nodes[i] as usize, true);
            }
        }

        let mut key_of_node = vec![usize::MAX; prefix_trie.num_nodes() + 2];
        for (i, &node) in nodes.iter().enumerate() {
            key_of_node[node as usize] = i;
        }
        let mut link_array: Vec<u32> = Vec::new();
        let mut reversed: Vec<u16> = Vec::new();
        for node in 0..link_list.len() {
            if link_list.get(node) {
                let i = key_of_node[node];
                debug_assert!(i != usize::MAX);
                let key = keys[i].as_ref();
                reversed.clear();
                reversed.extend(key[key.len() - tail_lens[i] as usize..].iter().rev());
                let tail_node = tail_trie
                    .lookup(&reversed)
                    .expect("tail resolves in the tail trie");
                link_array.push(tail_node);
            }
        }

        let links = link_list.freeze();
        debug_assert_eq!(link_array.len(), links.rank(links.len(), true));
        let trie = Self {
            prefix_trie,
            tail_trie,
            outs: outs.freeze(),
            links,
            link_array,
        };
        Ok((trie, nodes))
    }

    /// Looks up `key`, distinguishing an exact match, a match that ends
    /// inside a stored string, and a miss.
    pub fn lookup<K>(&self, key: K) -> LookupResult
    where
        K: AsRef<[u16]>,
    {
        let key = key.as_ref();
        let mut node = ROOT;
        let mut cursor = 0usize;
        while cursor < key.len() {
            node = match self.prefix_trie.traverse(node, key[cursor]) {
                Some(n) => n,
                None => return LookupResult::NotFound,
            };
            if self.links.get(node as usize) {
                // The tail trie stores reversed strings, so walking its
                // parent chain yields the tail in forward order.
                let mut tail_node = self.link_array[self.links.rank(node as usize, true)];
                cursor += 1;
                while tail_node > ROOT {
                    if cursor >= key.len() {
                        return LookupResult::Partial(node);
                    }
                    if key[cursor] != self.tail_trie.labels[tail_node as usize] {
                        return LookupResult::NotFound;
                    }
                    tail_node = self.tail_trie.parent(tail_node);
                    cursor += 1;
                }
                return if cursor == key.len() {
                    LookupResult::Found(node)
                } else {
                    LookupResult::NotFound
                };
            }
            cursor += 1;
        }
        LookupResult::Found(node)
    }

    /// Reconstructs the key of `node`, appending to `out` in forward order.
    /// Returns the number of code units appended.
    pub fn reverse_lookup(&self, node: u32, out: &mut Vec<u16>) -> usize {
        let prefix_len = self.prefix_trie.reverse_lookup(node, out);
        if self.links.get(node as usize) {
            let start = out.len();
            let tail_node = self.link_array[self.links.rank(node as usize, true)];
            let tail_len = self.tail_trie.reverse_lookup(tail_node, out);
            // The tail trie hands the tail back reversed; flip it forward.
            out[start..].reverse();
            prefix_len + tail_len
        } else {
            prefix_len
        }
    }

    /// Returns `true` when `node` terminates a stored key.
    pub fn is_terminal(&self, node: u32) -> bool {
        self.outs.get(node as usize)
    }

    /// Visits every prefix-trie node of the subtree under `node` in
    /// breadth-first order.
    pub fn predictive_search_breadth_first<F>(&self, node: u32, f: F)
    where
        F: FnMut(u32),
    {
        self.prefix_trie.predictive_search_breadth_first(node, f);
    }

    /// Node counts of the prefix and tail tries, excluding their roots.
    pub fn node_counts(&self) -> (usize, usize) {
        (self.prefix_trie.num_nodes(), self.tail_trie.num_nodes())
    }
}

impl Statistics for DoubleTrie {
    fn io_bytes(&self) -> usize {
        self.prefix_trie.io_bytes()
            + self.tail_trie.io_bytes()
            + self.outs.io_bytes()
            + self.links.io_bytes()
            + utils::io_size_u32s(self.link_array.len())
    }

    fn num_nodes(&self) -> usize {
        self.prefix_trie.num_nodes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(words: &[&str]) -> Vec<Vec<u16>> {
        words.iter().map(|w| w.encode_utf16().collect()).collect()
    }

    fn units(word: &str) -> Vec<u16> {
        word.encode_utf16().collect()
    }

    #[test]
    fn test_build_and_lookup() {
        let keys = encode(&["baby", "bad", "bank", "box", "dad", "dance"]);
        let (trie, nodes) = DoubleTrie::from_keys_with_nodes(&keys).unwrap();
        let expected = vec![7, 8, 9, 5, 10, 11];
        assert_eq!(nodes, expected);
        for (key, &node) in keys.iter().zip(&expected) {
            assert_eq!(trie.lookup(key), LookupResult::Found(node));
            assert!(trie.is_terminal(node));
        }
    }

    #[test]
    fn test_lookup_misses() {
        let keys = encode(&["baby", "bad", "bank", "box", "dad", "dance"]);
        let (trie, _) = DoubleTrie::from_keys_with_nodes(&keys).unwrap();
        assert_eq!(trie.lookup(units("dan")), LookupResult::Partial(11));
        assert_eq!(trie.lookup(units("danc")), LookupResult::Partial(11));
        assert_eq!(trie.lookup(units("dancea")), LookupResult::NotFound);
        assert_eq!(trie.lookup(units("dank")), LookupResult::NotFound);
        assert_eq!(trie.lookup(units("z")), LookupResult::NotFound);
    }

    #[test]
    fn test_reverse_lookup() {
        let keys = encode(&["baby", "bad", "bank", "box", "dad", "dance"]);
        let (trie, nodes) = DoubleTrie::from_keys_with_nodes(&keys).unwrap();
        let mut buf = vec![];
        for (key, &node) in keys.iter().zip(&nodes) {
            buf.clear();
            let appended = trie.reverse_lookup(node, &mut buf);
            assert_eq!(appended, key.len());
            assert_eq!(&buf, key);
        }
    }

    #[test]
    fn test_shared_tails_dedup() {
        // "ing" is the tail of both keys; the tail trie stores it once.
        let keys = encode(&["parsing", "parting", "pass"]);
        let (trie, nodes) = DoubleTrie::from_keys_with_nodes(&keys).unwrap();
        let mut buf = vec![];
        for (key, &node) in keys.iter().zip(&nodes) {
            buf.clear();
            trie.reverse_lookup(node, &mut buf);
            assert_eq!(&buf, key);
            assert_eq!(trie.lookup(key), LookupResult::Found(node));
        }
        let (_, tail_nodes) = trie.node_counts();
        // One shared run "gni" plus the tail of "pass".
        assert_eq!(tail_nodes, 4);
    }

    #[test]
    fn test_empty() {
        let (trie, nodes) = DoubleTrie::from_keys_with_nodes::<Vec<u16>>(&[]).unwrap();
        assert!(nodes.is_empty());
        assert_eq!(trie.lookup(units("a")), LookupResult::NotFound);
    }
}
