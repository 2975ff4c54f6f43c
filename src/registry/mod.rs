//! Converter resolution and object construction.
//!
//! [`TypeDirectory`] indexes registered types by id, path, short name,
//! and alias; it is what class tags resolve through. [`Resolver`] walks
//! the engine's factory chain with a per-session in-flight map so
//! recursive types resolve without blowing the stack. [`ObjectCreator`]
//! is the cached construction strategy the reflective mapper uses.

mod converter;
mod creators;
mod directory;
mod resolver;

pub use converter::{Converter, ConverterFactory, ReadContext, WriteContext};
pub use creators::ObjectCreator;
pub use directory::TypeDirectory;
pub use resolver::Resolver;

#[cfg(feature = "auto_register")]
pub use directory::AutoRegistration;

pub(crate) use creators::CreateFn;
