//! The low-level JSON token layer.
//!
//! [`JsonReader`] is a pull parser: converters drive it with
//! `peek`/`next_*` calls and matching `begin_*`/`end_*` pairs.
//! [`JsonWriter`] is the push-style mirror image.
//!
//! The reader supports a cheap [`short_term_copy`](JsonReader::short_term_copy)
//! for bounded lookahead that never advances the real stream; the
//! polymorphic class-tag check depends on it.

mod reader;
mod writer;

pub use reader::{JsonNumber, JsonReader, Token};
pub use writer::JsonWriter;
