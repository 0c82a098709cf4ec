//! `textcore` - gap-buffer text core for an editing runtime
//!
//! Buffers keep character and byte coordinates in step over a gap buffer,
//! with markers, overlays, text properties, fields and narrowing staying
//! correct across every insertion, deletion, replacement and region swap.
//! The [`format`] module interprets `%` directives and carries text
//! properties from the format string and its arguments to the result.

// Crate-level lint configuration
#![warn(unsafe_code)] // Unsafe code needs justification (required for libc identity lookups)
#![allow(dead_code)] // Public API functions not yet used internally
#![allow(clippy::cast_possible_truncation)] // Intentional position casts
#![allow(clippy::cast_sign_loss)] // Intentional position conversions
#![allow(clippy::cast_precision_loss)] // Intentional for float formatting
#![allow(clippy::cast_possible_wrap)] // Intentional position conversions
#![allow(clippy::module_name_repetitions)] // Allow buffer::BufferOptions etc
#![allow(clippy::struct_excessive_bools)] // Buffer options need multiple flags
#![allow(clippy::missing_errors_doc)] // Docs WIP
#![allow(clippy::missing_panics_doc)] // Docs WIP
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::use_self)] // Allow explicit type names in impl blocks
#![allow(clippy::format_push_string)] // format! with push_str is fine
#![allow(clippy::needless_pass_by_value)] // Allow pass by value for small Copy types
#![allow(clippy::branches_sharing_code)] // Code clarity over DRY in branching
#![allow(clippy::inherent_to_string)] // to_string methods are convenient
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::cast_lossless)] // as casts are fine for primitive widening
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::redundant_clone)] // Clones in tests for clarity are fine
#![allow(clippy::semicolon_if_nothing_returned)] // Style preference
#![allow(clippy::needless_collect)] // Collect for assertions is clear

pub mod buffer;
pub mod editfns;
pub mod error;
pub mod event;
pub mod format;
#[cfg(unix)]
pub mod identity;
pub mod session;
pub mod text;
pub mod unicode;
pub mod value;

// Re-export core types at crate root
pub use buffer::{BEG, Buffer, BufferOptions, ChangeHooks, CompositionCheck, InsertionType, MarkerId, OverlayId};
pub use error::{Error, Result};
pub use event::{LogLevel, emit_event, emit_log, set_event_callback, set_log_callback};
pub use session::{BufferId, Marker, Session};
pub use text::{Text, TextProps};
pub use value::{Plist, Value};

// Re-export editing types
pub use editfns::{RestrictionGuard, SavedRestriction, TranslationEntry, TranslationTable};

// Re-export formatting
pub use format::{FormatOptions, QuotingStyle, format, format_message};
pub use unicode::{WidthMethod, set_width_method};
