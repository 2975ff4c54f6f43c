use std::any::TypeId;
use std::sync::Arc;

use tracing::trace;

use crate::engine::UnknownTagPolicy;
use crate::error::{Error, Result};
use crate::graph::{ID_PROPERTY, REF_PROPERTY};
use crate::info::TypeInfo;
use crate::json::{JsonNumber, JsonReader, JsonWriter, Token};
use crate::ops::{
    DynamicList, DynamicMap, DynamicStruct, List, ListItemIter, Map, ReflectRef, Struct,
};
use crate::reflection::{AnyValue, Reflect, ReflectKind};
use crate::registry::{Converter, ConverterFactory, ReadContext, Resolver, WriteContext};

// -----------------------------------------------------------------------------
// AnyValueFactory

/// Binds [`AnyValue`] and the dynamic containers. First in the chain, so
/// nothing can shadow the catch-all.
pub struct AnyValueFactory;

impl ConverterFactory for AnyValueFactory {
    fn create(
        &self,
        _resolver: &Resolver<'_>,
        info: &'static TypeInfo,
    ) -> Result<Option<Arc<dyn Converter>>> {
        let id = info.ty_id();
        if id == TypeId::of::<AnyValue>() {
            return Ok(Some(Arc::new(AnyValueConverter)));
        }
        if id == TypeId::of::<DynamicStruct>()
            || id == TypeId::of::<DynamicList>()
            || id == TypeId::of::<DynamicMap>()
        {
            return Ok(Some(Arc::new(DynamicConverter)));
        }
        Ok(None)
    }
}

/// The framework catch-all: tag-aware polymorphic read, runtime-type
/// write, dynamic degradation for everything untagged.
struct AnyValueConverter;

impl Converter for AnyValueConverter {
    fn read(
        &self,
        reader: &mut JsonReader<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<Option<Box<dyn Reflect>>> {
        Ok(read_any(reader, ctx)?
            .map(|inner| Box::new(AnyValue::from_boxed(inner)) as Box<dyn Reflect>))
    }

    fn write(
        &self,
        value: &dyn Reflect,
        writer: &mut JsonWriter,
        ctx: &mut WriteContext<'_>,
    ) -> Result<()> {
        write_any(value, writer, ctx)
    }
}

/// Serves values already degraded to the dynamic containers.
struct DynamicConverter;

impl Converter for DynamicConverter {
    fn read(
        &self,
        reader: &mut JsonReader<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<Option<Box<dyn Reflect>>> {
        read_any(reader, ctx)
    }

    fn write(
        &self,
        value: &dyn Reflect,
        writer: &mut JsonWriter,
        ctx: &mut WriteContext<'_>,
    ) -> Result<()> {
        write_any(value, writer, ctx)
    }
}

// -----------------------------------------------------------------------------
// Dynamic read

/// Reads one JSON value with no target type: scalars become `i64`, `f64`,
/// `bool`, or `String`; arrays and objects degrade to the dynamic
/// containers unless a class tag redirects to a concrete type.
pub(crate) fn read_any(
    reader: &mut JsonReader<'_>,
    ctx: &mut ReadContext<'_>,
) -> Result<Option<Box<dyn Reflect>>> {
    match reader.peek()? {
        Token::Null => {
            reader.next_null()?;
            Ok(None)
        }
        Token::Bool => Ok(Some(Box::new(reader.next_bool()?))),
        Token::Number => Ok(Some(match reader.next_number()? {
            JsonNumber::Int(i) => Box::new(i) as Box<dyn Reflect>,
            JsonNumber::Float(f) => Box::new(f),
        })),
        Token::Str => Ok(Some(Box::new(reader.next_str()?.into_owned()))),
        Token::BeginArray => {
            reader.begin_array()?;
            let mut out = DynamicList::new();
            while reader.has_next()? {
                match read_any(reader, ctx)? {
                    // push_boxed on a DynamicList cannot fail
                    Some(v) => {
                        let _ = out.push_boxed(v);
                    }
                    None => out.push(AnyValue::empty()),
                }
            }
            reader.end_array()?;
            Ok(Some(Box::new(out)))
        }
        Token::BeginObject => read_any_object(reader, ctx),
        got => Err(reader.syntax(format!("unexpected {got:?}"))),
    }
}

fn read_any_object(
    reader: &mut JsonReader<'_>,
    ctx: &mut ReadContext<'_>,
) -> Result<Option<Box<dyn Reflect>>> {
    // First-property probe: identity and class tags are only honored in
    // first position.
    let mut probe = reader.short_term_copy();
    probe.begin_object()?;
    if probe.has_next()? {
        let name = probe.next_name()?;
        if name == REF_PROPERTY {
            let id = probe.next_str()?.into_owned();
            reader.skip_value()?;
            return resolve_dynamic_ref(&id, ctx).map(Some);
        }
        if name == ID_PROPERTY {
            let id = probe.next_str()?.into_owned();
            return read_dynamic_with_id(&id, reader, ctx).map(Some);
        }
        if let Some(prop) = ctx.engine().class_property() {
            if name == prop {
                let tag = probe.next_str()?.into_owned();
                match ctx.engine().resolve_tag(&tag) {
                    Some(target) => {
                        trace!(tag, path = target.type_path(), "class tag resolved");
                        let delegate = ctx.engine().converter_for_info(target)?;
                        return delegate.read(reader, ctx);
                    }
                    None => match ctx.engine().unknown_tag_policy() {
                        UnknownTagPolicy::Fail => return Err(Error::UnknownTag { tag }),
                        // The tag stays in the dynamic struct as plain
                        // data, so nothing is lost on a rewrite.
                        UnknownTagPolicy::Ignore => {}
                    },
                }
            }
        }
    }
    read_dynamic_struct(reader, ctx).map(Some)
}

fn read_dynamic_struct(
    reader: &mut JsonReader<'_>,
    ctx: &mut ReadContext<'_>,
) -> Result<Box<dyn Reflect>> {
    reader.begin_object()?;
    let mut out = DynamicStruct::new();
    while reader.has_next()? {
        let name = reader.next_name()?.into_owned();
        if name == ID_PROPERTY {
            reader.skip_value()?;
            continue;
        }
        match read_any(reader, ctx)? {
            Some(v) => out.insert_boxed(&name, v),
            None => out.insert_boxed(&name, Box::new(AnyValue::empty())),
        }
    }
    reader.end_object()?;
    Ok(Box::new(out))
}

fn read_dynamic_with_id(
    id: &str,
    reader: &mut JsonReader<'_>,
    ctx: &mut ReadContext<'_>,
) -> Result<Box<dyn Reflect>> {
    let value = read_dynamic_struct(reader, ctx)?;
    // A placeholder cell left by a forward reference gets the finished
    // value; the typed and dynamic placeholder shapes are tried in turn.
    if let Some(slot) = ctx.refs().slot(id) {
        if let Some(cell) = &slot.cell {
            let ReflectRef::Ref(shared) = cell.reflect_ref() else {
                return Err(Error::mismatch("shared cell", "non-cell registration"));
            };
            let filled = shared
                .fill_boxed(value.reflect_clone())
                .or_else(|_| {
                    shared.fill_boxed(Box::new(AnyValue::from_boxed(value.reflect_clone())))
                })
                .is_ok();
            if !filled {
                return Err(Error::mismatch(
                    "typed shared cell",
                    format!("dynamic value for id `{id}`"),
                ));
            }
        }
    }
    ctx.refs_mut().define_value(id, value.reflect_clone());
    trace!(id, "dynamic value registered");
    Ok(value)
}

fn resolve_dynamic_ref(id: &str, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Reflect>> {
    if let Some(slot) = ctx.refs().slot(id) {
        if let Some(value) = &slot.value {
            // Backward reference on the dynamic path: a clone, not an
            // identity-sharing handle.
            return Ok(value.reflect_clone());
        }
        if let Some(cell) = &slot.cell {
            let ReflectRef::Ref(shared) = cell.reflect_ref() else {
                return Err(Error::mismatch("shared cell", "non-cell registration"));
            };
            return Ok(shared.clone_handle());
        }
    }
    // Forward reference: leave a dynamic placeholder cell to be filled
    // when the id is defined.
    let fresh: Box<dyn Reflect> = Box::new(crate::ops::Shared::<AnyValue>::unresolved());
    let cell = ctx.refs_mut().cell_for(id, move || fresh);
    let ReflectRef::Ref(shared) = cell.reflect_ref() else {
        return Err(Error::mismatch("shared cell", "non-cell registration"));
    };
    let handle = shared.clone_handle();
    ctx.refs_mut().push_patch(id, handle.reflect_clone());
    Ok(handle)
}

// -----------------------------------------------------------------------------
// Dynamic write

/// Writes any reflected value: `AnyValue` layers unwrap, dynamic
/// containers render structurally, everything else goes through its own
/// converter with a class tag parked for struct-shaped values.
pub(crate) fn write_any(
    value: &dyn Reflect,
    writer: &mut JsonWriter,
    ctx: &mut WriteContext<'_>,
) -> Result<()> {
    if let Some(any) = value.downcast_ref::<AnyValue>() {
        return match any.get() {
            Some(inner) => write_any(inner, writer, ctx),
            None => writer.null_value(),
        };
    }
    if let Some(s) = value.downcast_ref::<DynamicStruct>() {
        writer.begin_object()?;
        for (name, field) in s.iter_fields() {
            writer.name(name)?;
            write_any(field, writer, ctx)?;
        }
        return writer.end_object();
    }
    if let Some(l) = value.downcast_ref::<DynamicList>() {
        writer.begin_array()?;
        for item in ListItemIter::new(l) {
            write_any(item, writer, ctx)?;
        }
        return writer.end_array();
    }
    if let Some(m) = value.downcast_ref::<DynamicMap>() {
        writer.begin_object()?;
        for (k, v) in m.iter() {
            let name = dynamic_key_name(k, ctx)?;
            writer.name(&name)?;
            write_any(v, writer, ctx)?;
        }
        return writer.end_object();
    }

    let info = value.reflect_type_info();
    if ctx.engine().class_property().is_some() && info.kind() == ReflectKind::Struct {
        // Late-register so the emitted tag resolves on read-back.
        ctx.engine().register_type_info(info);
        ctx.set_pending_tag(ctx.engine().tag_for(info));
    }
    let delegate = ctx.engine().converter_for_info(info)?;
    delegate.write(value, writer, ctx)
}

fn dynamic_key_name(key: &dyn Reflect, ctx: &mut WriteContext<'_>) -> Result<String> {
    if let Some(s) = key.downcast_ref::<String>() {
        return Ok(s.clone());
    }
    let mut rendered = JsonWriter::new();
    rendered.set_lenient(true);
    write_any(key, &mut rendered, ctx)?;
    Ok(rendered.into_string().trim_matches('"').to_owned())
}
