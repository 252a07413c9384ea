//! The random-access record interface shared by all readers.

use serde_json::Value;

use crate::error::{Error, InconsistencyKind, Result};

use super::slice::slice_positions;

/// Indexed, random-access view over JSONL records.
///
/// Implementors supply `len` and `get`; everything else is derived. Positions
/// run `0..len()`.
pub trait RecordSource {
    /// Number of records.
    fn len(&self) -> usize;

    /// Read the record at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Inconsistent`] if the position is not indexed, the
    /// cached offset is past the end of the file, or the bytes there are not
    /// valid JSON.
    fn get(&self, position: usize) -> Result<Value>;

    /// True if there are no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read records in the order the positions are given.
    ///
    /// Positions need not be sorted or unique, and may come from a lazy
    /// iterator.
    fn get_many<I>(&self, positions: I) -> Result<Vec<Value>>
    where
        I: IntoIterator<Item = usize>,
        Self: Sized,
    {
        positions.into_iter().map(|p| self.get(p)).collect()
    }

    /// Read the records selected by a slice, eagerly.
    ///
    /// Positions are generated lazily and reading stops at the first one
    /// outside `0..len()`, which is reported as out of range. See
    /// [`slice_positions`] for the exact default bounds.
    fn slice(
        &self,
        start: Option<isize>,
        stop: Option<isize>,
        step: Option<isize>,
    ) -> Result<Vec<Value>> {
        let len = self.len();
        slice_positions(len, start, stop, step)?
            .map(|position| match usize::try_from(position) {
                Ok(position) if position < len => self.get(position),
                _ => Err(Error::Inconsistent {
                    position: position as i64,
                    kind: InconsistencyKind::OutOfRange { len },
                }),
            })
            .collect()
    }

    /// Iterate over every record in order.
    ///
    /// Each call starts a fresh pass at position 0.
    fn iter(&self) -> Records<'_, Self>
    where
        Self: Sized,
    {
        Records {
            source: self,
            next: 0,
            end: self.len(),
        }
    }
}

/// Lazy in-order iterator over a [`RecordSource`].
#[derive(Debug)]
pub struct Records<'a, S> {
    source: &'a S,
    next: usize,
    end: usize,
}

impl<S: RecordSource> Iterator for Records<'_, S> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let record = self.source.get(self.next);
        self.next += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl<S: RecordSource> ExactSizeIterator for Records<'_, S> {}
