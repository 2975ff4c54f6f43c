use std::borrow::Cow;
use std::sync::Arc;

use crate::engine::Refson;
use crate::error::Result;
use crate::graph::{ReadRefs, WriteRefs};
use crate::info::TypeInfo;
use crate::json::{JsonReader, JsonWriter};
use crate::reflection::Reflect;
use crate::registry::Resolver;

// -----------------------------------------------------------------------------
// Converter

/// A two-way binding between one type and its JSON form.
///
/// Converters are resolved once per type, cached as `Arc<dyn Converter>`,
/// and shared across threads; all per-document state travels in the
/// contexts.
pub trait Converter: Send + Sync {
    /// Reads one value off the token stream.
    ///
    /// `Ok(None)` means JSON null (or documented absence): the caller
    /// decides what absence means for its slot. Implementations must
    /// consume exactly one value.
    fn read(
        &self,
        reader: &mut JsonReader<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<Option<Box<dyn Reflect>>>;

    /// Writes one value onto the token stream.
    fn write(
        &self,
        value: &dyn Reflect,
        writer: &mut JsonWriter,
        ctx: &mut WriteContext<'_>,
    ) -> Result<()>;
}

// -----------------------------------------------------------------------------
// ConverterFactory

/// Creates converters for the types it recognizes.
///
/// Factories are consulted in registration order; the first `Ok(Some)`
/// wins. Returning `Ok(None)` passes the type to the next factory, which
/// is the normal outcome, never an error.
pub trait ConverterFactory: Send + Sync {
    fn create(
        &self,
        resolver: &Resolver<'_>,
        info: &'static TypeInfo,
    ) -> Result<Option<Arc<dyn Converter>>>;
}

// -----------------------------------------------------------------------------
// Contexts

/// Per-document state threaded through every `read` call.
pub struct ReadContext<'a> {
    engine: &'a Refson,
    refs: ReadRefs,
}

impl<'a> ReadContext<'a> {
    pub(crate) fn new(engine: &'a Refson) -> Self {
        Self {
            engine,
            refs: ReadRefs::new(),
        }
    }

    #[inline]
    pub fn engine(&self) -> &'a Refson {
        self.engine
    }

    #[inline]
    pub fn refs(&self) -> &ReadRefs {
        &self.refs
    }

    #[inline]
    pub fn refs_mut(&mut self) -> &mut ReadRefs {
        &mut self.refs
    }
}

/// Per-document state threaded through every `write` call.
///
/// The pending id and tag are the hand-off between wrapper converters and
/// the object mapper: a wrapper cannot inject a property into the object
/// its delegate is about to open, so it parks the property here and the
/// mapper emits it first.
pub struct WriteContext<'a> {
    engine: &'a Refson,
    refs: WriteRefs,
    pending_id: Option<String>,
    pending_tag: Option<Cow<'static, str>>,
}

impl<'a> WriteContext<'a> {
    pub(crate) fn new(engine: &'a Refson) -> Self {
        Self {
            engine,
            refs: WriteRefs::new(),
            pending_id: None,
            pending_tag: None,
        }
    }

    #[inline]
    pub fn engine(&self) -> &'a Refson {
        self.engine
    }

    #[inline]
    pub fn refs_mut(&mut self) -> &mut WriteRefs {
        &mut self.refs
    }

    /// Parks an id for the next object the mapper opens.
    pub fn set_pending_id(&mut self, id: String) {
        self.pending_id = Some(id);
    }

    pub fn take_pending_id(&mut self) -> Option<String> {
        self.pending_id.take()
    }

    /// Parks a class tag for the next object the mapper opens.
    pub fn set_pending_tag(&mut self, tag: impl Into<Cow<'static, str>>) {
        self.pending_tag = Some(tag.into());
    }

    pub fn take_pending_tag(&mut self) -> Option<Cow<'static, str>> {
        self.pending_tag.take()
    }
}
