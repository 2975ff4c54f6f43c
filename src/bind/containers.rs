use std::sync::Arc;

use crate::error::{Error, Result};
use crate::info::TypeInfo;
use crate::json::{JsonReader, JsonWriter, Token};
use crate::ops::{ListItemIter, ReflectMut, ReflectRef};
use crate::reflection::Reflect;
use crate::registry::{Converter, ConverterFactory, ReadContext, Resolver, WriteContext};

// -----------------------------------------------------------------------------
// OptionFactory

/// Binds `Option<T>`, delegating the inner value to `T`'s converter.
///
/// Optionals are transparent: `Some(v)` serializes as `v` would, `None`
/// as null (and so vanishes from objects under null suppression).
pub struct OptionFactory;

impl ConverterFactory for OptionFactory {
    fn create(
        &self,
        resolver: &Resolver<'_>,
        info: &'static TypeInfo,
    ) -> Result<Option<Arc<dyn Converter>>> {
        let Some(optional) = info.as_optional() else {
            return Ok(None);
        };
        let inner = resolver.resolve(optional.inner())?;
        Ok(Some(Arc::new(OptionConverter { info, inner })))
    }
}

struct OptionConverter {
    info: &'static TypeInfo,
    inner: Arc<dyn Converter>,
}

impl Converter for OptionConverter {
    fn read(
        &self,
        reader: &mut JsonReader<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<Option<Box<dyn Reflect>>> {
        if reader.peek()? == Token::Null {
            reader.next_null()?;
            return Ok(None);
        }
        let mut boxed = make_instance(self.info)?;
        if let Some(value) = self.inner.read(reader, ctx)? {
            let ReflectMut::Optional(slot) = boxed.reflect_mut() else {
                return Err(wrong_shape(self.info, boxed.as_ref()));
            };
            slot.set_inner(value)
                .map_err(|v| Error::mismatch(self.info.type_path(), found_path(v.as_ref())))?;
        }
        Ok(Some(boxed))
    }

    fn write(
        &self,
        value: &dyn Reflect,
        writer: &mut JsonWriter,
        ctx: &mut WriteContext<'_>,
    ) -> Result<()> {
        let ReflectRef::Optional(opt) = value.reflect_ref() else {
            return Err(wrong_shape(self.info, value));
        };
        match opt.get() {
            Some(inner) => self.inner.write(inner, writer, ctx),
            None => writer.null_value(),
        }
    }
}

// -----------------------------------------------------------------------------
// ContainerFactory

/// Binds the std containers: lists, sets, and maps.
pub struct ContainerFactory;

impl ConverterFactory for ContainerFactory {
    fn create(
        &self,
        resolver: &Resolver<'_>,
        info: &'static TypeInfo,
    ) -> Result<Option<Arc<dyn Converter>>> {
        match info {
            TypeInfo::List(list) => {
                let item = resolver.resolve(list.item())?;
                Ok(Some(Arc::new(ListConverter {
                    info,
                    item_info: list.item(),
                    item,
                })))
            }
            TypeInfo::Set(set) => {
                let item = resolver.resolve(set.item())?;
                Ok(Some(Arc::new(SetConverter {
                    info,
                    item_info: set.item(),
                    item,
                })))
            }
            TypeInfo::Map(map) => {
                let key = resolver.resolve(map.key())?;
                let value = resolver.resolve(map.value())?;
                Ok(Some(Arc::new(MapConverter {
                    info,
                    value_info: map.value(),
                    key,
                    value,
                })))
            }
            _ => Ok(None),
        }
    }
}

// -----------------------------------------------------------------------------
// Lists and sets

struct ListConverter {
    info: &'static TypeInfo,
    item_info: &'static TypeInfo,
    item: Arc<dyn Converter>,
}

impl Converter for ListConverter {
    fn read(
        &self,
        reader: &mut JsonReader<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<Option<Box<dyn Reflect>>> {
        if reader.peek()? == Token::Null {
            reader.next_null()?;
            return Ok(None);
        }
        reader.begin_array()?;
        let mut boxed = make_instance(self.info)?;
        while reader.has_next()? {
            let item = self.read_item(reader, ctx)?;
            let ReflectMut::List(list) = boxed.reflect_mut() else {
                return Err(wrong_shape(self.info, boxed.as_ref()));
            };
            list.push_boxed(item)
                .map_err(|v| Error::mismatch(self.item_info.type_path(), found_path(v.as_ref())))?;
        }
        reader.end_array()?;
        Ok(Some(boxed))
    }

    fn write(
        &self,
        value: &dyn Reflect,
        writer: &mut JsonWriter,
        ctx: &mut WriteContext<'_>,
    ) -> Result<()> {
        let ReflectRef::List(list) = value.reflect_ref() else {
            return Err(wrong_shape(self.info, value));
        };
        writer.begin_array()?;
        for item in ListItemIter::new(list) {
            self.item.write(item, writer, ctx)?;
        }
        writer.end_array()
    }
}

impl ListConverter {
    fn read_item(
        &self,
        reader: &mut JsonReader<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<Box<dyn Reflect>> {
        match self.item.read(reader, ctx)? {
            Some(v) => Ok(v),
            // A null element becomes the item type's default.
            None => make_instance(self.item_info),
        }
    }
}

struct SetConverter {
    info: &'static TypeInfo,
    item_info: &'static TypeInfo,
    item: Arc<dyn Converter>,
}

impl Converter for SetConverter {
    fn read(
        &self,
        reader: &mut JsonReader<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<Option<Box<dyn Reflect>>> {
        if reader.peek()? == Token::Null {
            reader.next_null()?;
            return Ok(None);
        }
        reader.begin_array()?;
        let mut boxed = make_instance(self.info)?;
        while reader.has_next()? {
            let item = match self.item.read(reader, ctx)? {
                Some(v) => v,
                None => make_instance(self.item_info)?,
            };
            let ReflectMut::Set(set) = boxed.reflect_mut() else {
                return Err(wrong_shape(self.info, boxed.as_ref()));
            };
            set.insert_boxed(item)
                .map_err(|v| Error::mismatch(self.item_info.type_path(), found_path(v.as_ref())))?;
        }
        reader.end_array()?;
        Ok(Some(boxed))
    }

    fn write(
        &self,
        value: &dyn Reflect,
        writer: &mut JsonWriter,
        ctx: &mut WriteContext<'_>,
    ) -> Result<()> {
        let ReflectRef::Set(set) = value.reflect_ref() else {
            return Err(wrong_shape(self.info, value));
        };
        writer.begin_array()?;
        for item in set.iter() {
            self.item.write(item, writer, ctx)?;
        }
        writer.end_array()
    }
}

// -----------------------------------------------------------------------------
// Maps

struct MapConverter {
    info: &'static TypeInfo,
    value_info: &'static TypeInfo,
    key: Arc<dyn Converter>,
    value: Arc<dyn Converter>,
}

impl Converter for MapConverter {
    fn read(
        &self,
        reader: &mut JsonReader<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<Option<Box<dyn Reflect>>> {
        if reader.peek()? == Token::Null {
            reader.next_null()?;
            return Ok(None);
        }
        reader.begin_object()?;
        let mut boxed = make_instance(self.info)?;
        while reader.has_next()? {
            let name = reader.next_name()?.into_owned();
            let key = self.read_key(&name, ctx)?;
            let value = match self.value.read(reader, ctx)? {
                Some(v) => v,
                None => make_instance(self.value_info)?,
            };
            let ReflectMut::Map(map) = boxed.reflect_mut() else {
                return Err(wrong_shape(self.info, boxed.as_ref()));
            };
            map.insert_boxed(key, value).map_err(|(k, _)| {
                Error::mismatch(self.info.type_path(), found_path(k.as_ref()))
            })?;
        }
        reader.end_object()?;
        Ok(Some(boxed))
    }

    fn write(
        &self,
        value: &dyn Reflect,
        writer: &mut JsonWriter,
        ctx: &mut WriteContext<'_>,
    ) -> Result<()> {
        let ReflectRef::Map(map) = value.reflect_ref() else {
            return Err(wrong_shape(self.info, value));
        };
        writer.begin_object()?;
        for (k, v) in map.iter() {
            let name = self.key_name(k, ctx)?;
            writer.name(&name)?;
            self.value.write(v, writer, ctx)?;
        }
        writer.end_object()
    }
}

impl MapConverter {
    /// Parses a property name back into the declared key type by feeding
    /// it through the key converter as a quoted JSON string; the reader's
    /// string-to-number tolerance handles numeric keys.
    fn read_key(&self, name: &str, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Reflect>> {
        let mut quoted = JsonWriter::new();
        quoted.str_value(name)?;
        let quoted = quoted.into_string();
        let mut key_reader = JsonReader::new(&quoted);
        self.key
            .read(&mut key_reader, ctx)?
            .ok_or_else(|| Error::mismatch("map key", format!("unusable key `{name}`")))
    }

    /// Renders a key as a property name. String and char keys pass
    /// through; anything else is rendered by the key converter and
    /// unquoted.
    fn key_name(&self, key: &dyn Reflect, ctx: &mut WriteContext<'_>) -> Result<String> {
        if let Some(s) = key.downcast_ref::<String>() {
            return Ok(s.clone());
        }
        let mut rendered = JsonWriter::new();
        rendered.set_lenient(true);
        self.key.write(key, &mut rendered, ctx)?;
        Ok(rendered.into_string().trim_matches('"').to_owned())
    }
}

// -----------------------------------------------------------------------------
// Helpers

fn make_instance(info: &'static TypeInfo) -> Result<Box<dyn Reflect>> {
    info.make_default().ok_or_else(|| Error::NoConstructor {
        type_path: info.type_path().into(),
        reason: "type has no default constructor".into(),
    })
}

fn wrong_shape(expected: &'static TypeInfo, value: &dyn Reflect) -> Error {
    Error::mismatch(expected.type_path(), found_path(value))
}

fn found_path(value: &dyn Reflect) -> String {
    value.reflect_type_info().type_path().to_owned()
}
