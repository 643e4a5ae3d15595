//! Tail extraction and the shared tail character pool.
//!
//! Every compressed trie form relies on the same rule for deciding where a
//! key splits into a branching skeleton prefix and an unbranching tail, and
//! the prefix/patricia forms store their tails in the same pool layout.

use crate::bitvec::{BitList, BitVector};
use crate::utils;

/// Computes, for each key, the length of its compressible tail.
///
/// The cursor advances while the current code unit equals the corresponding
/// unit of the previous **or** the next key in sorted order (such positions
/// are forced to stay shared or branching); it stops at the first position
/// diverging from both neighbors. Everything after that position, excluding
/// the diverging unit itself, is the tail; a tail that would be empty stays
/// inline and reports length 0.
///
/// Missing units compare as the reserved NUL sentinel, which is why keys
/// must not contain the code unit 0.
///
/// # Examples
///
/// ```
/// use krill::extract_tail_lengths;
///
/// let keys: Vec<Vec<u16>> = ["a", "aaa", "b", "cc"]
///     .iter()
///     .map(|k| k.encode_utf16().collect())
///     .collect();
/// assert_eq!(extract_tail_lengths(&keys), vec![0, 1, 0, 1]);
/// ```
pub fn extract_tail_lengths<K>(keys: &[K]) -> Vec<u32>
where
    K: AsRef<[u16]>,
{
    let mut tails = vec![0u32; keys.len()];
    for i in 0..keys.len() {
        let prev: &[u16] = if i > 0 { keys[i - 1].as_ref() } else { &[] };
        let current = keys[i].as_ref();
        let next: &[u16] = if i + 1 < keys.len() {
            keys[i + 1].as_ref()
        } else {
            &[]
        };
        let mut cursor = 0usize;
        loop {
            let p = prev.get(cursor).copied().unwrap_or(0);
            let c = current.get(cursor).copied().unwrap_or(0);
            let n = next.get(cursor).copied().unwrap_or(0);
            if p == 0 && c == 0 && n == 0 {
                break;
            }
            if c != p && c != n {
                break;
            }
            cursor += 1;
        }
        if cursor + 1 < current.len() {
            tails[i] = (current.len() - cursor - 1) as u32;
        }
    }
    tails
}

/// Shared pool of tail runs.
///
/// `bits` delimits the `chars` pool: each run is encoded as a `0` start
/// marker followed by one `1` per character, so run `k` is bounded by
/// `select(k, false)` and the following clear bit, and its pool offset is
/// the rank of set bits before it.
pub(crate) struct Tail {
    bits: BitVector,
    chars: Vec<u16>,
}

impl Tail {
    /// Returns the `run`-th stored tail (1-indexed).
    pub fn get(&self, run: u32) -> &[u16] {
        let start = self
            .bits
            .select(run as usize, false)
            .expect("tail run is in range");
        let end = self.bits.next_clear_bit(start + 1) - 1;
        let len = end - start;
        let offset = self.bits.rank(start, true);
        &self.chars[offset..offset + len]
    }

    pub fn io_bytes(&self) -> usize {
        self.bits.io_bytes() + utils::io_size_u16s(self.chars.len())
    }
}

/// Builder appending one run at a time, in link order.
#[derive(Default)]
pub(crate) struct TailBuilder {
    bits: BitList,
    chars: Vec<u16>,
}

impl TailBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, run: &[u16]) {
        self.bits.push(false);
        for &c in run {
            self.bits.push(true);
            self.chars.push(c);
        }
    }

    pub fn freeze(self) -> Tail {
        Tail {
            bits: self.bits.freeze(),
            chars: self.chars,
        }
    }
}
