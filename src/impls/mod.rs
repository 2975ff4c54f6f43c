//! [`Reflect`](crate::reflection::Reflect) implementations for primitives
//! and standard containers.
//!
//! Scalars are opaque with text-parsing hooks (which is what lets a bare
//! string coerce into a numeric field); `Vec`, the std maps and sets, and
//! `Option` go through the matching ops traits.

mod containers;
mod opaque;
