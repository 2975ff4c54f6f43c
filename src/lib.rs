//! Reflective object-graph ⇄ JSON conversion.
//!
//! `refson` maps Rust object graphs to JSON documents and back through
//! runtime reflection rather than monomorphized serialization code: a
//! type derives [`Reflect`], and one shared engine converts it, its
//! fields, and anything reachable from it.
//!
//! ```
//! use refson::{Refson, Reflect};
//!
//! #[derive(Reflect, Default, PartialEq, Debug)]
//! #[reflect(default)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let refson = Refson::new();
//! let json = refson.to_string(&Point { x: 1, y: 2 }).unwrap();
//! assert_eq!(json, r#"{"x":1,"y":2}"#);
//! let back: Point = refson.from_str(&json).unwrap().unwrap();
//! assert_eq!(back, Point { x: 1, y: 2 });
//! ```
//!
//! Three capabilities set it apart from schema-driven serializers:
//!
//! * **Polymorphism.** With a class property configured (conventionally
//!   `"@class"`), a value's runtime type is written as a tag and honored
//!   on read, so an [`AnyValue`] slot round-trips whatever was put in it.
//! * **Object identity.** With [`LoopPolicy::IdTagging`], aliased and
//!   cyclic graphs are written once with `@id`/`@ref` properties and
//!   reconstructed with identity intact, forward references included.
//! * **Tolerant reading.** Document shapes that do not match the declared
//!   type are coerced where a faithful conversion exists (numeric casts,
//!   strings holding numbers, one-element arrays) instead of rejected.
//!
//! The engine itself is `Send + Sync` and meant to be built once and
//! shared. Values are not: shared graph nodes use `Rc`-based cells, so a
//! document is converted on the thread that owns its values.

pub mod bind;
mod builder;
mod engine;
mod error;
pub mod graph;
pub mod info;
pub mod json;
pub mod ops;
pub mod reflection;
pub mod registry;

mod impls;

pub use builder::RefsonBuilder;
pub use engine::{NamingPolicy, Refson, UnknownTagPolicy};
pub use error::{Error, Result};
pub use graph::LoopPolicy;
pub use ops::Shared;
pub use reflection::{AnyValue, Reflect, ReflectKind};

/// Derives [`Reflect`] (and the supporting type information) for a
/// named-field struct.
pub use refson_derive::Reflect;

// Used by derive-generated code; not public API.
#[doc(hidden)]
pub mod __macro_exports {
    #[cfg(feature = "auto_register")]
    pub use inventory;
}
