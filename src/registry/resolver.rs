use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tracing::trace;

use crate::engine::Refson;
use crate::error::{Error, Result};
use crate::info::TypeInfo;
use crate::json::{JsonReader, JsonWriter};
use crate::reflection::Reflect;
use crate::registry::{Converter, ConverterFactory, ReadContext, WriteContext};

// -----------------------------------------------------------------------------
// Resolver

/// One resolution session against an engine's factory chain.
///
/// The engine-level cache answers repeat lookups; everything below it is
/// per session. The in-flight map breaks resolution cycles: while a
/// factory for a recursive type is still building its converter, a nested
/// request for the same type gets a [`DeferredConverter`] that is filled
/// in once the outer call finishes.
pub struct Resolver<'a> {
    engine: &'a Refson,
    in_flight: RefCell<HashMap<TypeId, Arc<DeferredConverter>>>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(engine: &'a Refson) -> Self {
        Self {
            engine,
            in_flight: RefCell::new(HashMap::new()),
        }
    }

    #[inline]
    pub fn engine(&self) -> &'a Refson {
        self.engine
    }

    /// Resolves the converter for `info`, walking the factory chain in
    /// registration order.
    pub fn resolve(&self, info: &'static TypeInfo) -> Result<Arc<dyn Converter>> {
        let type_id = info.ty_id();
        if let Some(cached) = self.engine.cached_converter(type_id) {
            return Ok(cached);
        }
        if let Some(deferred) = self.in_flight.borrow().get(&type_id) {
            return Ok(deferred.clone());
        }

        let deferred = Arc::new(DeferredConverter::new());
        self.in_flight.borrow_mut().insert(type_id, deferred.clone());

        let resolved = self.walk_factories(info);
        self.in_flight.borrow_mut().remove(&type_id);

        let converter = resolved?.ok_or_else(|| Error::no_converter(info.type_path()))?;
        deferred.fill(converter.clone());
        self.engine.cache_converter(type_id, converter.clone());
        trace!(path = info.type_path(), "resolved converter");
        Ok(converter)
    }

    fn walk_factories(&self, info: &'static TypeInfo) -> Result<Option<Arc<dyn Converter>>> {
        for factory in self.engine.factories() {
            if let Some(converter) = factory.create(self, info)? {
                return Ok(Some(converter));
            }
        }
        Ok(None)
    }

    /// Resolves the converter `skip_past` would have delegated to: the
    /// first answer from a factory registered *after* it.
    ///
    /// Never cached, since the cache slot for the type belongs to the full
    /// chain's answer. An unregistered `skip_past` falls back to a plain
    /// [`resolve`](Self::resolve).
    pub fn resolve_skipping(
        &self,
        skip_past: &Arc<dyn ConverterFactory>,
        info: &'static TypeInfo,
    ) -> Result<Arc<dyn Converter>> {
        let mut passed = false;
        for factory in self.engine.factories() {
            if !passed {
                passed = Arc::ptr_eq(factory, skip_past);
                continue;
            }
            if let Some(converter) = factory.create(self, info)? {
                return Ok(converter);
            }
        }
        if !passed {
            return self.resolve(info);
        }
        Err(Error::no_converter(info.type_path()))
    }
}

// -----------------------------------------------------------------------------
// DeferredConverter

/// Placeholder converter handed out while the real one is mid-resolution.
///
/// Valid to hold before the cycle closes, but not to use: calling through
/// an unfilled proxy is a resolution bug and reports the missing type.
pub(crate) struct DeferredConverter {
    inner: OnceLock<Arc<dyn Converter>>,
}

impl DeferredConverter {
    fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    fn fill(&self, converter: Arc<dyn Converter>) {
        // A second fill for the same type id cannot happen: the in-flight
        // entry is removed before the deferred is filled, and only the
        // call that inserted it fills it.
        let _ = self.inner.set(converter);
    }

    fn resolved(&self) -> Result<&Arc<dyn Converter>> {
        self.inner
            .get()
            .ok_or_else(|| Error::no_converter("<unresolved recursive converter>"))
    }
}

impl Converter for DeferredConverter {
    fn read(
        &self,
        reader: &mut JsonReader<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<Option<Box<dyn Reflect>>> {
        self.resolved()?.read(reader, ctx)
    }

    fn write(
        &self,
        value: &dyn Reflect,
        writer: &mut JsonWriter,
        ctx: &mut WriteContext<'_>,
    ) -> Result<()> {
        self.resolved()?.write(value, writer, ctx)
    }
}
