//! Compile-time type information.
//!
//! Every convertible type carries a static [`TypeInfo`] describing its
//! shape: a struct with named fields, a list, a map, a set, an optional,
//! a shared reference cell, or an opaque scalar. The info tree is what
//! converter factories inspect instead of the Rust type system, so one
//! reflective converter can serve every derived struct.
//!
//! [`TypeInfo`] values are built once and cached for the life of the
//! process in [`NonGenericTypeInfoCell`] or [`GenericTypeInfoCell`],
//! depending on whether the type has generic parameters.

// -----------------------------------------------------------------------------
// Modules

mod descriptor;
mod field_info;
mod type_info;
mod typed;

// -----------------------------------------------------------------------------
// Exports

pub use descriptor::TypeDescriptor;
pub use field_info::NamedField;
pub use type_info::{
    ListInfo, MapInfo, OpaqueInfo, OptionalInfo, RefInfo, SetInfo, StructInfo, TypeInfo,
};
pub use typed::{GenericTypeInfoCell, NonGenericTypeInfoCell, Typed};
