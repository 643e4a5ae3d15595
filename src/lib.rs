//! 🦐 Krill: a compact LOUDS trie dictionary with predictive search
//!
//! Krill is a library of read-only, pointer-free string indexes built on
//! succinct LOUDS tries. A sorted key set becomes a packed bit vector plus a
//! label array; exact lookup, prefix ("predictive") search and string
//! reconstruction from a node id all run on rank/select arithmetic instead
//! of a node graph. On top of two tries, [`CompactDictionary`] stores a
//! key→values relation (readings to surface forms) as a bit-vector-encoded
//! multimap without duplicating any string.
//!
//! # Data structures
//!
//! Krill contains four trie forms plus the dictionary:
//!
//! - [`Trie`] is the plain LOUDS form every other structure builds on.
//! - [`PrefixTrie`] moves unbranching key suffixes into a shared tail pool.
//! - [`PatriciaTrie`] collapses single-child chains in place.
//! - [`DoubleTrie`] stores deduplicated, reversed suffixes in a second trie.
//! - [`CompactDictionary`] joins a key trie and a value trie with a sparse
//!   multimap and answers exact and predictive queries.
//!
//! All structures are built once from sorted/aggregated input and are
//! immutable afterwards; read-only queries are safe for any number of
//! concurrent callers.
//!
//! # Examples
//!
//! ## Looking up keys in a compressed trie
//!
//! ```
//! use krill::{DoubleTrie, LookupResult};
//!
//! let keys: Vec<Vec<u16>> = ["baby", "bad", "bank", "box", "dad", "dance"]
//!     .iter()
//!     .map(|k| k.encode_utf16().collect())
//!     .collect();
//! let trie = DoubleTrie::from_keys(&keys).unwrap();
//!
//! let dance: Vec<u16> = "dance".encode_utf16().collect();
//! let dan: Vec<u16> = "dan".encode_utf16().collect();
//! let dancea: Vec<u16> = "dancea".encode_utf16().collect();
//! assert_eq!(trie.lookup(&dance), LookupResult::Found(11));
//! assert_eq!(trie.lookup(&dan), LookupResult::Partial(11));
//! assert_eq!(trie.lookup(&dancea), LookupResult::NotFound);
//! ```
//!
//! ## Building a dictionary and searching it
//!
//! ```
//! use krill::CompactDictionary;
//!
//! let lines = ["ba\tbar\tbaz", "bo\tboot"];
//! let dict = CompactDictionary::from_lines(lines).unwrap();
//!
//! let mut values = vec![];
//! dict.predictive_search("b", |v| values.push(v.to_string()));
//! assert_eq!(values, ["bar", "baz", "boot"]);
//! ```
#![deny(missing_docs)]

pub mod bitvec;
pub mod dictionary;
pub mod double_trie;
pub mod errors;
pub mod patricia_trie;
pub mod prefix_trie;
mod tail;
pub mod trie;
mod utils;

pub use bitvec::{BitList, BitVector};
pub use dictionary::CompactDictionary;
pub use double_trie::DoubleTrie;
pub use patricia_trie::PatriciaTrie;
pub use prefix_trie::PrefixTrie;
pub use tail::extract_tail_lengths;
pub use trie::{Trie, TrieBuilder};

/// The root node id of every trie. Node 0 is reserved and unused.
pub(crate) const ROOT: u32 = 1;

/// Placeholder label stored for the reserved and root slots.
pub(crate) const PAD_LABEL: u16 = 0x20;

/// Outcome of a lookup in one of the compressed trie forms.
///
/// The three cases are deliberately distinct: prefix-aware callers need to
/// tell a miss from a query that stopped partway into a stored string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupResult {
    /// The query matched a stored string exactly; the id names its node.
    Found(u32),
    /// The query ended inside a stored string; the id names the deepest
    /// node matched.
    Partial(u32),
    /// The query shares no full path with any stored string.
    NotFound,
}

impl LookupResult {
    /// Node id of an exact match.
    pub const fn node(self) -> Option<u32> {
        match self {
            Self::Found(node) => Some(node),
            _ => None,
        }
    }

    /// Node id of an exact or partial match.
    pub const fn prefix_node(self) -> Option<u32> {
        match self {
            Self::Found(node) | Self::Partial(node) => Some(node),
            Self::NotFound => None,
        }
    }
}

/// Size and shape diagnostics shared by every structure in this crate.
pub trait Statistics {
    /// Persisted footprint in bytes, matching the serialized layout.
    fn io_bytes(&self) -> usize;

    /// Number of trie nodes, excluding each trie's root.
    fn num_nodes(&self) -> usize;
}
