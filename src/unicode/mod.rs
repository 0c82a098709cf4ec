//! Display width and grapheme-safe truncation for formatted output.

mod grapheme;
mod width;

pub use grapheme::{Prefix, width_prefix};
pub use width::{WidthMethod, display_width, display_width_char, set_width_method, width_method};
