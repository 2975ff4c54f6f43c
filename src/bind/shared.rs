use std::sync::Arc;

use tracing::trace;

use crate::error::{Error, Result};
use crate::graph::{ID_PROPERTY, LoopPolicy, REF_PROPERTY, Tracked};
use crate::info::TypeInfo;
use crate::json::{JsonReader, JsonWriter, Token};
use crate::ops::ReflectRef;
use crate::reflection::{Reflect, ReflectKind};
use crate::registry::{Converter, ConverterFactory, ReadContext, Resolver, WriteContext};

// -----------------------------------------------------------------------------
// SharedFactory

/// Binds `Shared<T>`, the identity-bearing graph handle.
pub struct SharedFactory;

impl ConverterFactory for SharedFactory {
    fn create(
        &self,
        resolver: &Resolver<'_>,
        info: &'static TypeInfo,
    ) -> Result<Option<Arc<dyn Converter>>> {
        let Some(cell) = info.as_ref_cell() else {
            return Ok(None);
        };
        let inner = resolver.resolve(cell.inner())?;
        Ok(Some(Arc::new(SharedConverter {
            info,
            inner_info: cell.inner(),
            inner,
        })))
    }
}

// -----------------------------------------------------------------------------
// SharedConverter

/// The carrier of the cycle and reference protocol.
///
/// Identity applies to struct-shaped inner values only; a `Shared<i32>`
/// is inlined like a plain `i32`, matching the rule that a reference
/// token can only point at an object.
struct SharedConverter {
    info: &'static TypeInfo,
    inner_info: &'static TypeInfo,
    inner: Arc<dyn Converter>,
}

impl Converter for SharedConverter {
    fn read(
        &self,
        reader: &mut JsonReader<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<Option<Box<dyn Reflect>>> {
        match reader.peek()? {
            Token::Null => {
                reader.next_null()?;
                Ok(None)
            }
            Token::BeginObject => {
                // Identity probe on a disposable cursor; the real stream
                // has not moved when the inner converter takes over.
                let mut probe = reader.short_term_copy();
                probe.begin_object()?;
                if probe.has_next()? {
                    let name = probe.next_name()?;
                    if name == REF_PROPERTY {
                        let id = probe.next_str()?.into_owned();
                        reader.skip_value()?;
                        return self.resolve_ref(&id, ctx).map(Some);
                    }
                    if name == ID_PROPERTY {
                        let id = probe.next_str()?.into_owned();
                        return self.read_with_id(&id, reader, ctx).map(Some);
                    }
                }
                self.read_inline(reader, ctx)
            }
            _ => self.read_inline(reader, ctx),
        }
    }

    fn write(
        &self,
        value: &dyn Reflect,
        writer: &mut JsonWriter,
        ctx: &mut WriteContext<'_>,
    ) -> Result<()> {
        let ReflectRef::Ref(shared) = value.reflect_ref() else {
            return Err(Error::mismatch(
                self.info.type_path(),
                value.reflect_type_info().type_path().to_owned(),
            ));
        };
        if !shared.is_resolved() {
            return writer.null_value();
        }
        let tracked = ctx.engine().loop_policy() == LoopPolicy::IdTagging
            && self.inner_info.kind() == ReflectKind::Struct;
        if tracked {
            match ctx.refs_mut().track(shared.canonical_addr()) {
                Tracked::Seen(id) => {
                    writer.begin_object()?;
                    writer.name(REF_PROPERTY)?;
                    writer.str_value(&id)?;
                    return writer.end_object();
                }
                Tracked::New(id) => ctx.set_pending_id(id),
            }
        }
        let mut result = Ok(());
        let visited = shared.with_value(&mut |inner| {
            result = self.inner.write(inner, writer, ctx);
        });
        // An inner converter that opens no object leaves the id unused.
        ctx.take_pending_id();
        if !visited {
            return writer.null_value();
        }
        result
    }
}

impl SharedConverter {
    fn new_cell(&self) -> Result<Box<dyn Reflect>> {
        self.info.make_default().ok_or_else(|| Error::NoConstructor {
            type_path: self.info.type_path().into(),
            reason: "shared cell has no default constructor".into(),
        })
    }

    /// Registers (or retrieves) the cell for `id` and hands back a fresh
    /// handle to it.
    fn cell_handle(&self, id: &str, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Reflect>> {
        let fresh = self.new_cell()?;
        let cell = ctx.refs_mut().cell_for(id, move || fresh);
        match cell.reflect_ref() {
            ReflectRef::Ref(shared) => Ok(shared.clone_handle()),
            _ => Err(Error::mismatch(
                self.info.type_path(),
                cell.reflect_type_info().type_path().to_owned(),
            )),
        }
    }

    fn resolve_ref(&self, id: &str, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Reflect>> {
        if let Some(slot) = ctx.refs().slot(id) {
            if let Some(cell) = &slot.cell {
                let ReflectRef::Ref(shared) = cell.reflect_ref() else {
                    return Err(Error::mismatch(
                        self.info.type_path(),
                        cell.reflect_type_info().type_path().to_owned(),
                    ));
                };
                trace!(id, "backward reference resolved to registered cell");
                return Ok(shared.clone_handle());
            }
            if slot.value.is_some() {
                // The id was defined on the dynamic path; a typed cell
                // cannot adopt it without inventing identity.
                return Err(Error::mismatch(
                    "shared reference cell",
                    format!("dynamically-tracked value for id `{id}`"),
                ));
            }
        }
        // Forward reference: the placeholder cell is the patch location.
        let handle = self.cell_handle(id, ctx)?;
        let patch_handle = handle.reflect_clone();
        ctx.refs_mut().push_patch(id, patch_handle);
        Ok(handle)
    }

    fn read_with_id(
        &self,
        id: &str,
        reader: &mut JsonReader<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<Box<dyn Reflect>> {
        // Register before the inner read so a child can reference its
        // still-under-construction parent.
        let handle = self.cell_handle(id, ctx)?;
        let inner = self
            .inner
            .read(reader, ctx)?
            .ok_or_else(|| Error::mismatch("object value", format!("null under @id `{id}`")))?;
        let ReflectRef::Ref(shared) = handle.reflect_ref() else {
            return Err(Error::mismatch(self.info.type_path(), "non-cell handle"));
        };
        shared.fill_boxed(inner).map_err(|_| {
            Error::mismatch("unresolved shared cell", format!("duplicate id `{id}`"))
        })?;
        trace!(id, "shared cell resolved");
        Ok(shared.clone_handle())
    }

    fn read_inline(
        &self,
        reader: &mut JsonReader<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<Option<Box<dyn Reflect>>> {
        let Some(inner) = self.inner.read(reader, ctx)? else {
            return Ok(None);
        };
        let cell = self.new_cell()?;
        let ReflectRef::Ref(shared) = cell.reflect_ref() else {
            return Err(Error::mismatch(self.info.type_path(), "non-cell instance"));
        };
        shared.fill_boxed(inner).map_err(|v| {
            Error::mismatch(
                self.inner_info.type_path(),
                v.reflect_type_info().type_path().to_owned(),
            )
        })?;
        Ok(Some(shared.clone_handle()))
    }
}
