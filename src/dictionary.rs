//! A compact bidirectional dictionary built from (key, values) records.
//!
//! Keys (readings) and values (surface forms) each live in their own plain
//! [`Trie`]; a bit-vector-encoded sparse multimap joins key-trie nodes to
//! value-trie nodes, so one key resolves to many values without storing any
//! string twice.

use crate::bitvec::{BitList, BitVector};
use crate::errors::{Error, Result};
use crate::trie::{Trie, TrieBuilder};
use crate::utils::{self, ByteReader};
use crate::Statistics;
use crate::ROOT;

use hashbrown::{HashMap, HashSet};
use tracing::warn;

/// A read-only dictionary mapping each key string to a set of value
/// strings, with exact and predictive search.
///
/// # Examples
///
/// ```
/// use krill::CompactDictionary;
///
/// let lines = [
///     "; comment lines and empty lines are skipped",
///     "ba\tbar\tbaz",
///     "bo\tboot",
/// ];
/// let dict = CompactDictionary::from_lines(lines).unwrap();
///
/// let mut out = vec![];
/// dict.search("ba", |value| out.push(value.to_string()));
/// assert_eq!(out, ["bar", "baz"]);
///
/// out.clear();
/// dict.predictive_search("b", |value| out.push(value.to_string()));
/// assert_eq!(out, ["bar", "baz", "boot"]);
/// ```
pub struct CompactDictionary {
    key_trie: Trie,
    value_trie: Trie,
    mapping_bits: BitVector,
    mapping: Vec<u32>,
    /// One bit per key-trie node: whether the node owns any mapping entry.
    has_mapping: BitList,
}

impl CompactDictionary {
    /// Builds a dictionary from the line-oriented text format: `;`-prefixed
    /// or empty lines are ignored; fields are separated by single tabs;
    /// field 0 is the key and the remaining fields are its values.
    ///
    /// # Errors
    ///
    /// Propagates construction failures from
    /// [`from_records`](Self::from_records).
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut records: Vec<(String, Vec<String>)> = Vec::new();
        for line in lines {
            let line = line.as_ref();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            let mut fields = line.split('\t');
            let key = fields.next().unwrap_or_default().to_string();
            let values: Vec<String> = fields.map(str::to_string).collect();
            records.push((key, values));
        }
        Self::from_records(records)
    }

    /// Builds a dictionary from (key, values) records.
    ///
    /// A record whose key contains a character outside the supported
    /// alphabet (one-unit Basic Multilingual Plane scalars, excluding the
    /// reserved NUL terminator) is skipped with a warning; the build
    /// continues. Records sharing a key merge their values in input order;
    /// empty values are dropped.
    ///
    /// # Errors
    ///
    /// An error from the underlying trie builders; with the validation
    /// above this does not happen for any record input.
    pub fn from_records<I, K, S>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Vec<S>)>,
        K: AsRef<str>,
        S: AsRef<str>,
    {
        let mut dict: HashMap<Vec<u16>, Vec<Vec<u16>>> = HashMap::new();
        let mut key_list: Vec<Vec<u16>> = Vec::new();
        let mut value_set: HashSet<Vec<u16>> = HashSet::new();
        for (key, values) in records {
            let key = key.as_ref();
            if key.is_empty() || !key.chars().all(is_supported_key_char) {
                warn!("skipping record with unsupported key: {key:?}");
                continue;
            }
            let key_units = utils::to_utf16(key);
            if !dict.contains_key(&key_units) {
                key_list.push(key_units.clone());
            }
            let slot = dict.entry(key_units).or_default();
            for value in values {
                let value_units = utils::to_utf16(value.as_ref());
                if value_units.is_empty() {
                    warn!("skipping empty value for key: {key:?}");
                    continue;
                }
                value_set.insert(value_units.clone());
                slot.push(value_units);
            }
        }

        key_list.sort_unstable();
        let mut key_builder = TrieBuilder::new();
        for key in &key_list {
            key_builder.add(key)?;
        }
        let key_trie = key_builder.build();

        let mut value_list: Vec<Vec<u16>> = value_set.into_iter().collect();
        value_list.sort_unstable();
        let mut value_builder = TrieBuilder::new();
        for value in &value_list {
            value_builder.add(value)?;
        }
        let value_trie = value_builder.build();

        // One "0" delimiter per key-trie node in ascending id order, then
        // one "1" plus a value-trie node id per associated value.
        let max_id = key_trie.num_nodes() as u32 + 1;
        let mut mapping: Vec<u32> = Vec::new();
        let mut mapping_bits = BitList::new();
        let mut buf: Vec<u16> = Vec::with_capacity(16);
        for node in 1..=max_id {
            buf.clear();
            key_trie.reverse_lookup(node, &mut buf);
            mapping_bits.push(false);
            if let Some(values) = dict.get(buf.as_slice()) {
                for value in values {
                    mapping_bits.push(true);
                    let value_node = value_trie
                        .lookup(value)
                        .expect("value resolves in the value trie");
                    mapping.push(value_node);
                }
            }
        }
        let mapping_bits = mapping_bits.freeze();
        let has_mapping = build_has_mapping(&mapping_bits, max_id);

        Ok(Self {
            key_trie,
            value_trie,
            mapping_bits,
            mapping,
            has_mapping,
        })
    }

    /// Invokes `f` once per value associated with exactly `key`, in record
    /// order.
    pub fn search<F>(&self, key: &str, mut f: F)
    where
        F: FnMut(&str),
    {
        let key_units = utils::to_utf16(key);
        if let Some(node) = self.key_trie.lookup(&key_units) {
            let mut buf = Vec::with_capacity(16);
            self.emit_values(node, &mut buf, &mut f);
        }
    }

    /// Invokes `f` once per value associated with any key starting with
    /// `prefix`.
    ///
    /// Emission follows the key trie's breadth-first node order, not input
    /// order; this is a documented property, not an accident. A prefix
    /// resolving to the root (in particular the empty prefix) yields
    /// nothing.
    pub fn predictive_search<F>(&self, prefix: &str, mut f: F)
    where
        F: FnMut(&str),
    {
        let prefix_units = utils::to_utf16(prefix);
        let Some(node) = self.key_trie.lookup(&prefix_units) else {
            return;
        };
        if node <= ROOT {
            return;
        }
        let mut buf = Vec::with_capacity(16);
        self.key_trie.predictive_search_breadth_first(node, |id| {
            if self.has_mapping.get(id as usize) {
                self.emit_values(id, &mut buf, &mut f);
            }
        });
    }

    /// Decodes the mapping run of a key-trie node and reports each value.
    fn emit_values<F>(&self, node: u32, buf: &mut Vec<u16>, f: &mut F)
    where
        F: FnMut(&str),
    {
        let start = self
            .mapping_bits
            .select(node as usize, false)
            .expect("every node owns a mapping delimiter");
        let end = self.mapping_bits.next_clear_bit(start + 1);
        let count = end - start - 1;
        if count == 0 {
            return;
        }
        let offset = self.mapping_bits.rank(start, false);
        for i in 0..count {
            buf.clear();
            self.value_trie
                .reverse_lookup(self.mapping[start - offset + i], buf);
            f(&utils::from_utf16(buf));
        }
    }

    /// Serializes the dictionary into the persisted little-endian layout:
    /// key trie, value trie, mapping bit vector, mapping array, each section
    /// preceded by its length.
    pub fn serialize_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.io_bytes());
        write_trie(&mut buf, &self.key_trie);
        write_trie(&mut buf, &self.value_trie);
        write_bit_vector(&mut buf, &self.mapping_bits);
        buf.extend_from_slice(&(self.mapping.len() as u32).to_le_bytes());
        for &value_node in &self.mapping {
            buf.extend_from_slice(&value_node.to_le_bytes());
        }
        debug_assert_eq!(buf.len(), self.io_bytes());
        buf
    }

    /// Deserializes a dictionary from a persisted buffer.
    ///
    /// # Errors
    ///
    /// [`Error::Malformed`] when the buffer is truncated, carries trailing
    /// bytes, or its sections are mutually inconsistent. No partial
    /// structure is returned.
    pub fn deserialize_from_slice(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let key_trie = read_trie(&mut reader)?;
        let value_trie = read_trie(&mut reader)?;
        let mapping_bits = read_bit_vector(&mut reader)?;
        let count = reader.read_u32()? as usize;
        if reader.remaining() < count * 4 {
            return Err(Error::Malformed("truncated mapping array"));
        }
        let max_value_id = value_trie.num_nodes() as u32 + 1;
        let mut mapping = Vec::with_capacity(count);
        for _ in 0..count {
            let value_node = reader.read_u32()?;
            if value_node < ROOT || value_node > max_value_id {
                return Err(Error::Malformed("mapping entry out of range"));
            }
            mapping.push(value_node);
        }
        if !reader.is_empty() {
            return Err(Error::Malformed("trailing bytes"));
        }
        let max_id = key_trie.num_nodes() as u32 + 1;
        if mapping_bits.rank(mapping_bits.len(), false) != max_id as usize {
            return Err(Error::Malformed("mapping delimiter count"));
        }
        if mapping_bits.rank(mapping_bits.len(), true) != mapping.len() {
            return Err(Error::Malformed("mapping entry count"));
        }
        let has_mapping = build_has_mapping(&mapping_bits, max_id);
        Ok(Self {
            key_trie,
            value_trie,
            mapping_bits,
            mapping,
            has_mapping,
        })
    }

    /// Node counts of the key and value tries, excluding their roots.
    pub fn node_counts(&self) -> (usize, usize) {
        (self.key_trie.num_nodes(), self.value_trie.num_nodes())
    }
}

impl Statistics for CompactDictionary {
    fn io_bytes(&self) -> usize {
        self.key_trie.io_bytes()
            + self.value_trie.io_bytes()
            + self.mapping_bits.io_bytes()
            + utils::io_size_u32s(self.mapping.len())
    }

    fn num_nodes(&self) -> usize {
        self.key_trie.num_nodes() + self.value_trie.num_nodes()
    }
}

/// Keys are restricted to characters encoding as a single UTF-16 unit so
/// every trie edge is a whole character; NUL is the reserved tail-extraction
/// terminator.
fn is_supported_key_char(c: char) -> bool {
    c != '\0' && (c as u32) < 0x10000
}

/// Derives the per-node "owns at least one value" bit from the mapping bit
/// vector.
fn build_has_mapping(mapping_bits: &BitVector, max_id: u32) -> BitList {
    let mut bits = BitList::with_len(max_id as usize + 1);
    for node in 1..=max_id as usize {
        let start = mapping_bits
            .select(node, false)
            .expect("every node owns a mapping delimiter");
        if mapping_bits.get(start + 1) {
            bits.set(node, true);
        }
    }
    bits
}

fn write_trie(buf: &mut Vec<u8>, trie: &Trie) {
    buf.extend_from_slice(&(trie.labels.len() as u32).to_le_bytes());
    for &label in &trie.labels {
        buf.extend_from_slice(&label.to_le_bytes());
    }
    write_bit_vector(buf, &trie.louds);
}

fn write_bit_vector(buf: &mut Vec<u8>, bits: &BitVector) {
    buf.extend_from_slice(&(bits.len() as u32).to_le_bytes());
    for &word in bits.words() {
        buf.extend_from_slice(&word.to_le_bytes());
    }
}

fn read_trie(reader: &mut ByteReader<'_>) -> Result<Trie> {
    let num_labels = reader.read_u32()? as usize;
    if num_labels < 2 {
        return Err(Error::Malformed("label array too short"));
    }
    if reader.remaining() < num_labels * 2 {
        return Err(Error::Malformed("truncated label array"));
    }
    let mut labels = Vec::with_capacity(num_labels);
    for _ in 0..num_labels {
        labels.push(reader.read_u16()?);
    }
    let louds = read_bit_vector(reader)?;
    if louds.rank(louds.len(), true) != num_labels - 1 {
        return Err(Error::Malformed("node count mismatch"));
    }
    Ok(Trie { louds, labels })
}

fn read_bit_vector(reader: &mut ByteReader<'_>) -> Result<BitVector> {
    let len = reader.read_u32()? as usize;
    let num_words = len.div_ceil(64);
    if reader.remaining() < num_words * 8 {
        return Err(Error::Malformed("truncated bit vector"));
    }
    let mut words = Vec::with_capacity(num_words);
    for _ in 0..num_words {
        words.push(reader.read_u64()?);
    }
    Ok(BitVector::new(words, len))
}
