//! The concrete converters and the built-in factory chain.
//!
//! Factory order is a correctness invariant, assembled by the builder:
//! the [`AnyValue`](crate::reflection::AnyValue) catch-all first, then
//! the exclusion filter, user registrations, primitives, `Option` and
//! [`Shared`](crate::ops::Shared) wrappers, the std containers, and the
//! reflective struct mapper as the final fallback.

mod any_value;
mod coerce;
mod containers;
mod exclude;
mod mapper;
mod primitives;
mod shared;

pub use any_value::AnyValueFactory;
pub use containers::{ContainerFactory, OptionFactory};
pub use exclude::ExclusionFactory;
pub use mapper::ReflectiveFactory;
pub use primitives::PrimitiveFactory;
pub use shared::SharedFactory;

pub(crate) use any_value::{read_any, write_any};
pub(crate) use coerce::coerce_value;
