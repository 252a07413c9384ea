//! Slice position arithmetic.

use crate::error::{Error, Result};

/// Lazy sequence of positions selected by a slice.
///
/// Positions are produced one at a time, so far-away bounds cost nothing
/// until they are read.
#[derive(Debug, Clone)]
pub struct SlicePositions {
    next: Option<isize>,
    stop: isize,
    step: isize,
}

impl Iterator for SlicePositions {
    type Item = isize;

    fn next(&mut self) -> Option<isize> {
        let position = self.next?;
        let in_bounds = if self.step > 0 {
            position < self.stop
        } else {
            position > self.stop
        };
        if !in_bounds {
            self.next = None;
            return None;
        }
        self.next = position.checked_add(self.step);
        Some(position)
    }
}

/// Positions selected by `start..stop` stepping by `step` over `len` records.
///
/// `step` defaults to 1 and may not be zero. For a positive step the bounds
/// default to `0` and `len`; for a negative step they default to `len - 1`
/// and `0`. `stop` is exclusive in both directions, so a default
/// negative-step slice stops *before* position 0.
///
/// Explicit bounds are used literally: negative values are not counted from
/// the end and values past `len` are not clamped. Such positions are
/// yielded as-is and fail when read.
pub fn slice_positions(
    len: usize,
    start: Option<isize>,
    stop: Option<isize>,
    step: Option<isize>,
) -> Result<SlicePositions> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(Error::InvalidConfig("slice step cannot be zero".to_string()));
    }

    let len = len as isize;
    let (start, stop) = if step > 0 {
        (start.unwrap_or(0), stop.unwrap_or(len))
    } else {
        (start.unwrap_or(len - 1), stop.unwrap_or(0))
    };

    Ok(SlicePositions {
        next: Some(start),
        stop,
        step,
    })
}
