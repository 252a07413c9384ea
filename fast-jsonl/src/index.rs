//! The record position → byte offset index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};

/// Dense mapping from record position to the byte offset of its first byte.
///
/// Positions run `0..len()` in file order and offsets strictly increase. On
/// disk the index is a JSON object keyed by the position as a string; loading
/// restores integer positions and rejects gaps or out-of-order offsets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<usize, u64>")]
pub struct LineIndex {
    offsets: Vec<u64>,
}

impl LineIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the offset of the next record.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `offset` does not exceed the previous one.
    pub fn push(&mut self, offset: u64) {
        debug_assert!(self.offsets.last().map_or(true, |&last| last < offset));
        self.offsets.push(offset);
    }

    /// Byte offset of the record at `position`.
    pub fn offset(&self, position: usize) -> Option<u64> {
        self.offsets.get(position).copied()
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// True if no records are indexed.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// All offsets in position order.
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }
}

impl FromIterator<u64> for LineIndex {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self {
            offsets: iter.into_iter().collect(),
        }
    }
}

impl Serialize for LineIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.offsets.iter().enumerate())
    }
}

impl TryFrom<BTreeMap<usize, u64>> for LineIndex {
    type Error = String;

    fn try_from(map: BTreeMap<usize, u64>) -> Result<Self, Self::Error> {
        let mut offsets = Vec::with_capacity(map.len());
        for (expected, (position, offset)) in map.into_iter().enumerate() {
            if position != expected {
                return Err(format!("line index has no entry for position {}", expected));
            }
            if let Some(&previous) = offsets.last() {
                if offset <= previous {
                    return Err(format!(
                        "line index offsets are not increasing at position {}",
                        position
                    ));
                }
            }
            offsets.push(offset);
        }
        Ok(Self { offsets })
    }
}
