//! The runtime reflection core.
//!
//! [`Reflect`] is the erased value vehicle: every convertible type can be
//! held as a `Box<dyn Reflect>`, inspected through its kind, and cast to
//! the matching access trait in [`crate::ops`].

mod any_value;
mod reflect;

pub use any_value::AnyValue;
pub use reflect::{Reflect, ReflectKind};

pub(crate) use reflect::impl_reflect_cast_fn;
