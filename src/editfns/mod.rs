//! Editing primitives built on [`Buffer`](crate::buffer::Buffer): point
//! motion, fields, region extraction and mutation, narrowing.
//!
//! Everything here is an inherent method on `Buffer`; the submodules only
//! group them by concern.

mod compare;
mod field;
mod narrow;
mod point;
mod region;
mod subst;
mod translate;
mod transpose;

pub use compare::{char_equal, compare_buffer_substrings};
pub use field::Stickiness;
pub use narrow::{RestrictionGuard, SavedRestriction};
pub use translate::{TranslationEntry, TranslationTable};
