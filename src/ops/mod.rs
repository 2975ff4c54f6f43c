//! Interfaces and dynamic types for data operation.
//!
//! Each [`ReflectKind`](crate::reflection::ReflectKind) has a matching
//! access trait here ([`Struct`], [`List`], [`Map`], [`Set`],
//! [`Optional`], [`SharedRef`]); [`ReflectRef`] and friends are the
//! kind-dispatched views converters match on.
//!
//! The dynamic containers ([`DynamicStruct`], [`DynamicList`],
//! [`DynamicMap`]) hold erased values with no static type. They are what
//! untagged polymorphic content degrades to on read.

// -----------------------------------------------------------------------------
// Modules

mod kind;
mod list_ops;
mod map_ops;
mod option_ops;
mod set_ops;
mod shared;
mod struct_ops;

// -----------------------------------------------------------------------------
// Exports

pub use kind::{ReflectMut, ReflectOwned, ReflectRef};
pub use list_ops::{DynamicList, List, ListItemIter};
pub use map_ops::{DynamicMap, Map};
pub use option_ops::Optional;
pub use set_ops::Set;
pub use shared::{Shared, SharedRef};
pub use struct_ops::{DynamicStruct, Struct, StructFieldIter};
