use std::any::TypeId;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::bind::{coerce_value, read_any};
use crate::engine::UnknownTagPolicy;
use crate::error::{Error, Result};
use crate::graph::ID_PROPERTY;
use crate::info::TypeInfo;
use crate::json::{JsonReader, JsonWriter, Token};
use crate::ops::{DynamicList, DynamicMap, DynamicStruct, ReflectMut, ReflectRef};
use crate::reflection::{AnyValue, Reflect, ReflectKind};
use crate::registry::{
    Converter, ConverterFactory, ObjectCreator, ReadContext, Resolver, WriteContext,
};

// -----------------------------------------------------------------------------
// ReflectiveFactory

/// The final fallback: binds every struct-shaped type through its field
/// table. One converter instance serves one struct type, with the field
/// converters resolved up front.
pub struct ReflectiveFactory;

impl ConverterFactory for ReflectiveFactory {
    fn create(
        &self,
        resolver: &Resolver<'_>,
        info: &'static TypeInfo,
    ) -> Result<Option<Arc<dyn Converter>>> {
        let Some(struct_info) = info.as_struct() else {
            return Ok(None);
        };
        let engine = resolver.engine();
        // Make the type's tag resolvable even when nobody registered it.
        engine.register_type_info(info);

        let creator = ObjectCreator::select(info, engine.creator_for(info.ty_id())).ok();

        let mut fields = Vec::with_capacity(struct_info.field_len());
        for field in struct_info.iter() {
            if field.is_skipped() || !field.in_version(engine.version()) {
                continue;
            }
            let doc_name = match field.rename() {
                Some(rename) => rename.to_owned(),
                None => engine.naming_policy().apply(field.name()),
            };
            let converter = resolver.resolve(field.type_info())?;
            fields.push(BoundField {
                rust_name: field.name(),
                doc_name,
                info: field.type_info(),
                converter,
            });
        }
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.doc_name.clone(), i))
            .collect();

        Ok(Some(Arc::new(ReflectiveConverter {
            info,
            has_from_text: struct_info.has_from_text(),
            creator,
            fields: fields.into_boxed_slice(),
            index,
        })))
    }
}

// -----------------------------------------------------------------------------
// ReflectiveConverter

/// One field's binding: document name, resolved converter, declared type.
struct BoundField {
    rust_name: &'static str,
    doc_name: String,
    info: &'static TypeInfo,
    converter: Arc<dyn Converter>,
}

struct ReflectiveConverter {
    info: &'static TypeInfo,
    has_from_text: bool,
    creator: Option<ObjectCreator>,
    fields: Box<[BoundField]>,
    index: HashMap<String, usize>,
}

impl Converter for ReflectiveConverter {
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
            Token::Str if self.has_from_text => {
                let text = reader.next_str()?;
                self.info.from_text(&text).map(Some).ok_or_else(|| {
                    Error::mismatch(self.info.type_path(), format!("string `{text}`"))
                })
            }
            Token::Str => Err(Error::mismatch(self.info.type_path(), "string")),
            Token::BeginObject => {
                if let Some(redirected) = self.follow_tag(reader, ctx)? {
                    return Ok(redirected);
                }
                self.read_fields(reader, ctx).map(Some)
            }
            // Wrong shape, e.g. a one-element array around the object.
            _ => match read_any(reader, ctx)? {
                Some(v) => coerce_value(v, self.info, ctx).map(Some),
                None => Ok(None),
            },
        }
    }

    fn write(
        &self,
        value: &dyn Reflect,
        writer: &mut JsonWriter,
        ctx: &mut WriteContext<'_>,
    ) -> Result<()> {
        let ReflectRef::Struct(s) = value.reflect_ref() else {
            return Err(Error::mismatch(
                self.info.type_path(),
                value.reflect_type_info().type_path().to_owned(),
            ));
        };
        writer.begin_object()?;
        if let Some(id) = ctx.take_pending_id() {
            writer.name(ID_PROPERTY)?;
            writer.str_value(&id)?;
        }
        if let Some(prop) = ctx.engine().class_property() {
            let tag = ctx
                .take_pending_tag()
                .unwrap_or_else(|| Cow::Borrowed(ctx.engine().tag_for(self.info)));
            writer.name(prop)?;
            writer.str_value(&tag)?;
        }
        for bound in &self.fields {
            let Some(field) = s.field(bound.rust_name) else {
                continue;
            };
            writer.name(&bound.doc_name)?;
            bound.converter.write(field, writer, ctx)?;
        }
        writer.end_object()
    }
}

impl ReflectiveConverter {
    /// First-property class-tag lookahead on a disposable cursor. A tag
    /// naming a different type hands the whole object to that type's
    /// converter; a tag naming this type falls through to the field loop.
    fn follow_tag(
        &self,
        reader: &mut JsonReader<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<Option<Option<Box<dyn Reflect>>>> {
        let Some(prop) = ctx.engine().class_property() else {
            return Ok(None);
        };
        let mut probe = reader.short_term_copy();
        probe.begin_object()?;
        if !probe.has_next()? {
            return Ok(None);
        }
        if probe.next_name()? != prop {
            return Ok(None);
        }
        let tag = probe.next_str()?.into_owned();
        match ctx.engine().resolve_tag(&tag) {
            Some(target) if target.ty_id() != self.info.ty_id() => {
                trace!(tag, path = target.type_path(), "redirecting to tagged type");
                let delegate = ctx.engine().converter_for_info(target)?;
                delegate.read(reader, ctx).map(Some)
            }
            Some(_) => Ok(None),
            None => match ctx.engine().unknown_tag_policy() {
                UnknownTagPolicy::Fail => Err(Error::UnknownTag { tag }),
                UnknownTagPolicy::Ignore => Ok(None),
            },
        }
    }

    fn create(&self) -> Result<Box<dyn Reflect>> {
        match &self.creator {
            Some(creator) => creator.create(),
            None => Err(Error::NoConstructor {
                type_path: self.info.type_path().into(),
                reason: "no default constructor and no registered creator".into(),
            }),
        }
    }

    fn read_fields(
        &self,
        reader: &mut JsonReader<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<Box<dyn Reflect>> {
        let mut instance = self.create()?;
        reader.begin_object()?;
        while reader.has_next()? {
            let name = reader.next_name()?;
            if Some(name.as_ref()) == ctx.engine().class_property() || name == ID_PROPERTY {
                reader.skip_value()?;
                continue;
            }
            let Some(&i) = self.index.get(name.as_ref()) else {
                trace!(field = name.as_ref(), "skipping unknown property");
                reader.skip_value()?;
                continue;
            };
            let bound = &self.fields[i];
            self.read_into(bound, &mut instance, reader, ctx)
                .map_err(|e| e.for_field(&bound.doc_name))?;
        }
        reader.end_object()?;
        Ok(instance)
    }

    fn read_into(
        &self,
        bound: &BoundField,
        instance: &mut Box<dyn Reflect>,
        reader: &mut JsonReader<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<()> {
        let token = reader.peek()?;
        let value = if shape_matches(token, bound.info) {
            bound.converter.read(reader, ctx)?
        } else {
            read_any(reader, ctx)?
        };
        let Some(value) = value else {
            // Null leaves the constructed default in place.
            return Ok(());
        };
        let value = if value.ty_id() == bound.info.ty_id() {
            value
        } else {
            coerce_value(value, bound.info, ctx)?
        };
        let ReflectMut::Struct(s) = instance.reflect_mut() else {
            return Err(Error::mismatch(self.info.type_path(), "non-struct instance"));
        };
        if let Some(slot) = s.field_mut(bound.rust_name) {
            slot.set(value).map_err(|v| {
                Error::mismatch(
                    bound.info.type_path(),
                    v.reflect_type_info().type_path().to_owned(),
                )
            })?;
        }
        Ok(())
    }
}

/// Whether the next token could possibly satisfy the declared type's own
/// converter; anything else takes the dynamic-then-coerce detour.
fn shape_matches(token: Token, info: &'static TypeInfo) -> bool {
    // The dynamic slots accept every shape by definition.
    let id = info.ty_id();
    if id == TypeId::of::<AnyValue>()
        || id == TypeId::of::<DynamicStruct>()
        || id == TypeId::of::<DynamicList>()
        || id == TypeId::of::<DynamicMap>()
    {
        return true;
    }
    match info.kind() {
        ReflectKind::List | ReflectKind::Set => {
            matches!(token, Token::BeginArray | Token::Null)
        }
        ReflectKind::Struct | ReflectKind::Map => {
            matches!(token, Token::BeginObject | Token::Str | Token::Null)
        }
        // The shared-cell converter accepts every shape itself.
        ReflectKind::Ref => true,
        ReflectKind::Optional => {
            token == Token::Null
                || info
                    .as_optional()
                    .is_some_and(|o| shape_matches(token, o.inner()))
        }
        ReflectKind::Opaque => !matches!(token, Token::BeginArray | Token::BeginObject),
    }
}
