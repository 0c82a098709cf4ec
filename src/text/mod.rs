//! Text storage: encoding, the gap buffer, position translation, strings
//! and property runs.
//!
//! Key types:
//!
//! - [`GapBuffer`]: raw bytes with a movable gap
//! - [`PositionCache`]: remembered char/byte pairs for fast translation
//! - [`Text`]: a string with a multibyte flag and text properties
//! - [`TextProps`]: property runs over character positions

pub mod coding;
mod gap;
mod position;
mod props;
mod string;

pub use gap::GapBuffer;
pub use position::{PositionCache, Translator};
pub use props::{PropRun, TextProps};
pub use string::Text;
