//! The cycle and reference protocol.
//!
//! With [`LoopPolicy::IdTagging`], the first visit to a shared object
//! writes an `@id` property and registers its identity; later visits
//! write `{"@ref": id}` instead of recursing. On read the mapping is
//! inverted: `@id` definitions register cells, `@ref` tokens resolve to
//! handles of those cells, and references that arrive before their
//! definition leave a placeholder cell plus a [`PendingPatch`] that is
//! verified after the document is fully consumed.

mod policy;
mod refs;

pub use policy::LoopPolicy;
pub use refs::{ReadRefs, WriteRefs};

pub(crate) use refs::{PendingPatch, RefSlot, Tracked};

/// The property carrying an object's identity on first encounter.
pub(crate) const ID_PROPERTY: &str = "@id";

/// The single property of a back-reference object.
pub(crate) const REF_PROPERTY: &str = "@ref";
