//! Random-access readers.
//!
//! [`Reader`] serves one file; [`MultiReader`] composes several readers into
//! one sequence. Both implement [`RecordSource`], which provides `get`,
//! `get_many`, `slice`, and `iter` on top of `len` and `get`.

mod multi;
mod single;
mod slice;
mod source;

pub use multi::MultiReader;
pub use single::Reader;
pub use slice::{slice_positions, SlicePositions};
pub use source::{RecordSource, Records};
