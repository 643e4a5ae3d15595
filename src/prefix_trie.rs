//! A tail-compressed trie: unbranching key suffixes live in a shared pool.
//!
//! The branching part of every key is a plain [`Trie`]; any suffix with no
//! branching below it is moved out of the node space into the tail pool,
//! cutting the node count for long singleton runs.

use crate::bitvec::{BitList, BitVector};
use crate::errors::Result;
use crate::tail::{extract_tail_lengths, Tail, TailBuilder};
use crate::trie::Trie;
use crate::LookupResult;
use crate::Statistics;
use crate::ROOT;

/// A LOUDS trie with tail compression.
///
/// # Examples
///
/// ```
/// use krill::{LookupResult, PrefixTrie};
///
/// let keys: Vec<Vec<u16>> = ["baby", "bad", "bank", "box", "dad", "dance"]
///     .iter()
///     .map(|k| k.encode_utf16().collect())
///     .collect();
/// let (trie, nodes) = PrefixTrie::from_keys_with_nodes(&keys).unwrap();
///
/// assert_eq!(nodes, vec![7, 8, 9, 5, 10, 11]);
/// assert_eq!(trie.lookup(&keys[5]), LookupResult::Found(11));
/// let dan: Vec<u16> = "dan".encode_utf16().collect();
/// assert_eq!(trie.lookup(&dan), LookupResult::Partial(11));
/// ```
pub struct PrefixTrie {
    trie: Trie,
    outs: BitVector,
    links: BitVector,
    tails: Tail,
}

impl PrefixTrie {
    /// Creates a new [`PrefixTrie`] from keys sorted in strictly increasing
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

    /// Creates a new [`PrefixTrie`] and reports the skeleton node id
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
        let prefixes: Vec<&[u16]> = keys
            .iter()
            .zip(&tail_lens)
            .map(|(key, &t)| {
                let key = key.as_ref();
                &key[..key.len() - t as usize]
            })
            .collect();
        let (trie, nodes) = Trie::from_keys_with_nodes(&prefixes)?;

        let mut outs = BitList::with_len(trie.num_nodes() + 2);
        for &node in &nodes {
            outs.set(node as usize, true);
        }

        let mut link_list = BitList::with_len(trie.num_nodes() + 2);
        for (i, &t) in tail_lens.iter().enumerate() {
            if t > 0 {
                link_list.set(nodes[i] as usize, true);
            }
        }

        // Tails are appended in ascending skeleton-node-id order, which is
        // the order `links.rank` recovers them in.
        let mut key_of_node = vec![usize::MAX; trie.num_nodes() + 2];
        for (i, &node) in nodes.iter().enumerate() {
            key_of_node[node as usize] = i;
        }
        let mut tails = TailBuilder::new();
        for node in 0..link_list.len() {
            if link_list.get(node) {
                let i = key_of_node[node];
                debug_assert!(i != usize::MAX);
                let key = keys[i].as_ref();
                tails.push(&key[key.len() - tail_lens[i] as usize..]);
            }
        }

        let trie = Self {
            trie,
            outs: outs.freeze(),
            links: link_list.freeze(),
            tails: tails.freeze(),
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
            node = match self.trie.traverse(node, key[cursor]) {
                Some(n) => n,
                None => return LookupResult::NotFound,
            };
            if self.links.get(node as usize) {
                cursor += 1;
                let tail = self.tail_run(node);
                if key.len() > tail.len() + cursor {
                    return LookupResult::NotFound;
                }
                let end = tail.len().min(key.len() - cursor);
                for j in 0..end {
                    if key[cursor + j] != tail[j] {
                        return LookupResult::NotFound;
                    }
                }
                return if tail.len() == end {
                    LookupResult::Found(node)
                } else {
                    LookupResult::Partial(node)
                };
            }
            cursor += 1;
        }
        LookupResult::Found(node)
    }

    /// Reconstructs the key of `node`, appending to `out` in forward order.
    /// Returns the number of code units appended.
    pub fn reverse_lookup(&self, node: u32, out: &mut Vec<u16>) -> usize {
        let prefix_len = self.trie.reverse_lookup(node, out);
        if self.links.get(node as usize) {
            let tail = self.tail_run(node);
            out.extend_from_slice(tail);
            prefix_len + tail.len()
        } else {
            prefix_len
        }
    }

    /// Tail run owned by `node`; empty when the node has no tail link.
    pub fn tail(&self, node: u32) -> &[u16] {
        if self.links.get(node as usize) {
            self.tail_run(node)
        } else {
            &[]
        }
    }

    /// Returns `true` when `node` terminates a stored key.
    pub fn is_terminal(&self, node: u32) -> bool {
        self.outs.get(node as usize)
    }

    /// Visits every skeleton node of the subtree under `node` in
    /// breadth-first order.
    pub fn predictive_search_breadth_first<F>(&self, node: u32, f: F)
    where
        F: FnMut(u32),
    {
        self.trie.predictive_search_breadth_first(node, f);
    }

    fn tail_run(&self, node: u32) -> &[u16] {
        let run = self.links.rank(node as usize, true) as u32 + 1;
        self.tails.get(run)
    }
}

impl Statistics for PrefixTrie {
    fn io_bytes(&self) -> usize {
        self.trie.io_bytes()
            + self.outs.io_bytes()
            + self.links.io_bytes()
            + self.tails.io_bytes()
    }

    fn num_nodes(&self) -> usize {
        self.trie.num_nodes()
    }
}
