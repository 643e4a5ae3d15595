//! A PATRICIA-compressed trie: single-child chains collapse into tails.
//!
//! Unlike the prefix trie, which removes tails from the input before
//! building the skeleton, this form detects collapsible runs during a
//! breadth-first rebuild of an already-built plain [`Trie`]: a non-root,
//! non-key node with exactly one non-key child pulls its descendants into a
//! tail run until branching, a key node, or the end of the sequence stops
//! it.

use crate::bitvec::{BitList, BitVector};
use crate::errors::Result;
use crate::tail::{Tail, TailBuilder};
use crate::trie::Trie;
use crate::LookupResult;
use crate::Statistics;
use crate::{PAD_LABEL, ROOT};

/// A LOUDS trie with PATRICIA compression.
///
/// # Examples
///
/// ```
/// use krill::{LookupResult, PatriciaTrie};
///
/// let keys: Vec<Vec<u16>> = ["baby", "bad", "bank", "box", "dad", "dance"]
///     .iter()
///     .map(|k| k.encode_utf16().collect())
///     .collect();
/// let trie = PatriciaTrie::from_keys(&keys).unwrap();
///
/// assert_eq!(trie.lookup(&keys[0]), LookupResult::Found(8));
/// let d: Vec<u16> = "d".encode_utf16().collect();
/// assert_eq!(trie.lookup(&d), LookupResult::Partial(3));
/// ```
pub struct PatriciaTrie {
    trie: Trie,
    outs: BitVector,
    links: BitVector,
    tails: Tail,
}

impl PatriciaTrie {
    /// Creates a new [`PatriciaTrie`] from keys sorted in strictly
    /// increasing code-unit order.
    ///
    /// # Errors
    ///
    /// [`Error::UnsortedKeys`](crate::errors::Error::UnsortedKeys) when the
    /// order requirement is violated.
    pub fn from_keys<K>(keys: &[K]) -> Result<Self>
    where
        K: AsRef<[u16]>,
    {
        let (trie, key_nodes) = Trie::from_keys_with_nodes(keys)?;
        if keys.is_empty() {
            return Ok(Self {
                trie,
                outs: BitList::new().freeze(),
                links: BitList::new().freeze(),
                tails: TailBuilder::new().freeze(),
            });
        }
        let mut old_outs = BitList::with_len(trie.num_nodes() + 2);
        for &node in &key_nodes {
            old_outs.set(node as usize, true);
        }

        let mut louds = BitList::new();
        louds.push(true);
        let mut labels: Vec<u16> = vec![PAD_LABEL];
        let mut links = BitList::new();
        links.push(false);
        let mut outs = BitList::new();
        outs.push(false);
        let mut tails = TailBuilder::new();

        let size = trie.louds.len();
        let mut level = 0usize;
        let mut queue: Vec<u32> = vec![ROOT];
        while !queue.is_empty() {
            let mut next_queue: Vec<u32> = vec![];
            for &start_node in &queue {
                let mut node = start_node;
                let mut pos = trie
                    .louds
                    .select(node as usize, false)
                    .expect("node id is in range");
                louds.push(false);
                labels.push(trie.labels[node as usize]);
                if level > 0
                    && trie.louds.get(pos + 1)
                    && !trie.louds.get(pos + 2)
                    && !old_outs.get(node as usize)
                {
                    // Exactly one child and no key ends here: collapse the
                    // chain into a tail run.
                    links.push(true);
                    let mut run: Vec<u16> = vec![];
                    loop {
                        node = trie.louds.rank(pos + 1, true) as u32 + 1;
                        pos = trie
                            .louds
                            .select(node as usize, false)
                            .expect("node id is in range");
                        run.push(trie.labels[node as usize]);
                        if pos + 2 >= size
                            || !trie.louds.get(pos + 1)
                            || trie.louds.get(pos + 2)
                            || old_outs.get(node as usize)
                        {
                            break;
                        }
                    }
                    tails.push(&run);
                } else {
                    links.push(false);
                }
                outs.push(old_outs.get(node as usize));
                if trie.louds.get(pos + 1) {
                    let first = trie.first_child(node).expect("node has a child");
                    let mut i = 0u32;
                    while trie.louds.get(pos + 1 + i as usize) {
                        louds.push(true);
                        next_queue.push(first + i);
                        i += 1;
                    }
                }
            }
            level += 1;
            queue = next_queue;
        }

        Ok(Self {
            trie: Trie {
                louds: louds.freeze(),
                labels,
            },
            outs: outs.freeze(),
            links: links.freeze(),
            tails: tails.freeze(),
        })
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
                for &t in self.tail_run(node) {
                    if cursor == key.len() {
                        return LookupResult::Partial(node);
                    }
                    if key[cursor] != t {
                        return LookupResult::NotFound;
                    }
                    cursor += 1;
                }
                if cursor == key.len() {
                    return LookupResult::Found(node);
                }
                // The tail matched in full; resume skeleton traversal at
                // the character after it.
                continue;
            }
            cursor += 1;
        }
        LookupResult::Found(node)
    }

    /// Reconstructs the key of `node`, appending to `out` in forward order.
    /// Returns the number of code units appended.
    pub fn reverse_lookup(&self, node: u32, out: &mut Vec<u16>) -> usize {
        let offset = out.len();
        let mut node = node;
        while node > ROOT {
            if self.links.get(node as usize) {
                out.extend(self.tail_run(node).iter().rev());
            }
            out.push(self.trie.labels[node as usize]);
            node = self.trie.parent(node);
        }
        out[offset..].reverse();
        out.len() - offset
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

impl Statistics for PatriciaTrie {
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
