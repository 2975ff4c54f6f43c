use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use crate::builder::RefsonBuilder;
use crate::error::{Error, Result};
use crate::graph::LoopPolicy;
use crate::info::{TypeInfo, Typed};
use crate::json::{JsonNumber, JsonReader, JsonWriter, Token};
use crate::reflection::{AnyValue, Reflect};
use crate::registry::{
    Converter, ConverterFactory, CreateFn, ReadContext, Resolver, TypeDirectory, WriteContext,
};

// -----------------------------------------------------------------------------
// Policies

/// How struct field names map to document property names.
///
/// An explicit `#[reflect(rename = "...")]` always wins over the policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NamingPolicy {
    /// Use the Rust field name as-is.
    #[default]
    Identity,
    /// `user_name` becomes `userName`.
    LowerCamelCase,
    /// `user_name` becomes `UserName`.
    PascalCase,
    /// `user_name` becomes `user-name`.
    KebabCase,
}

impl NamingPolicy {
    /// Translates a Rust field name into its document spelling.
    pub fn apply(&self, name: &str) -> String {
        match self {
            NamingPolicy::Identity => name.to_owned(),
            NamingPolicy::KebabCase => name.replace('_', "-"),
            NamingPolicy::LowerCamelCase => camel(name, false),
            NamingPolicy::PascalCase => camel(name, true),
        }
    }
}

fn camel(name: &str, capitalize_first: bool) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = capitalize_first;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// What to do with a class tag naming a type the directory cannot resolve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownTagPolicy {
    /// Fail the read with [`Error::UnknownTag`].
    #[default]
    Fail,
    /// Pretend the tag was absent and fall through to the untagged path.
    Ignore,
}

// -----------------------------------------------------------------------------
// Refson

/// The conversion engine: an immutable bundle of factories, caches, the
/// type directory, and flags.
///
/// Build one with [`RefsonBuilder`] and share it freely; every operation
/// takes `&self` and the engine is `Send + Sync`. Values themselves are
/// not (shared graph nodes are `Rc`-based), so documents are converted on
/// the thread that owns them while the engine is shared.
///
/// ```
/// use refson::Refson;
///
/// let refson = Refson::new();
/// assert_eq!(refson.to_string(&vec![1, 2, 3]).unwrap(), "[1,2,3]");
/// let back: Option<Vec<i64>> = refson.from_str("[1,2,3]").unwrap();
/// assert_eq!(back, Some(vec![1, 2, 3]));
/// ```
pub struct Refson {
    factories: Vec<Arc<dyn ConverterFactory>>,
    cache: RwLock<HashMap<TypeId, Arc<dyn Converter>>>,
    creators: HashMap<TypeId, Arc<CreateFn>>,
    exclusions: HashSet<TypeId>,
    directory: RwLock<TypeDirectory>,
    class_property: Option<String>,
    loop_policy: LoopPolicy,
    naming_policy: NamingPolicy,
    version: Option<f64>,
    unknown_tags: UnknownTagPolicy,
    serialize_nulls: bool,
    html_safe: bool,
    lenient: bool,
    indent: Option<String>,
}

/// Everything the builder assembles into an engine.
pub(crate) struct EngineParts {
    pub(crate) factories: Vec<Arc<dyn ConverterFactory>>,
    pub(crate) creators: HashMap<TypeId, Arc<CreateFn>>,
    pub(crate) exclusions: HashSet<TypeId>,
    pub(crate) directory: TypeDirectory,
    pub(crate) class_property: Option<String>,
    pub(crate) loop_policy: LoopPolicy,
    pub(crate) naming_policy: NamingPolicy,
    pub(crate) version: Option<f64>,
    pub(crate) unknown_tags: UnknownTagPolicy,
    pub(crate) serialize_nulls: bool,
    pub(crate) html_safe: bool,
    pub(crate) lenient: bool,
    pub(crate) indent: Option<String>,
}

impl Default for Refson {
    fn default() -> Self {
        Self::new()
    }
}

impl Refson {
    /// An engine with default configuration. Equivalent to
    /// `Refson::builder().build()`.
    pub fn new() -> Self {
        RefsonBuilder::new().build()
    }

    pub fn builder() -> RefsonBuilder {
        RefsonBuilder::new()
    }

    pub(crate) fn assemble(parts: EngineParts) -> Self {
        Self {
            factories: parts.factories,
            cache: RwLock::new(HashMap::new()),
            creators: parts.creators,
            exclusions: parts.exclusions,
            directory: RwLock::new(parts.directory),
            class_property: parts.class_property,
            loop_policy: parts.loop_policy,
            naming_policy: parts.naming_policy,
            version: parts.version,
            unknown_tags: parts.unknown_tags,
            serialize_nulls: parts.serialize_nulls,
            html_safe: parts.html_safe,
            lenient: parts.lenient,
            indent: parts.indent,
        }
    }

    // -- serialization --------------------------------------------------------

    /// Serializes `value` to a JSON string.
    pub fn to_string<T: Reflect>(&self, value: &T) -> Result<String> {
        self.to_string_dyn(value.as_reflect())
    }

    /// Serializes an erased value to a JSON string.
    pub fn to_string_dyn(&self, value: &dyn Reflect) -> Result<String> {
        let mut writer = self.new_writer();
        self.write_document(value, &mut writer)?;
        Ok(writer.into_string())
    }

    /// Serializes `value` into an [`std::io::Write`] sink.
    pub fn to_writer<T: Reflect, W: Write>(&self, value: &T, out: &mut W) -> Result<()> {
        let json = self.to_string(value)?;
        out.write_all(json.as_bytes())?;
        Ok(())
    }

    fn write_document(&self, value: &dyn Reflect, writer: &mut JsonWriter) -> Result<()> {
        let converter = self.converter_for_info(value.reflect_type_info())?;
        let mut ctx = WriteContext::new(self);
        converter.write(value, writer, &mut ctx)
    }

    // -- deserialization ------------------------------------------------------

    /// Parses a value of type `T` from JSON.
    ///
    /// `Ok(None)` means the input held no value at all (empty or
    /// whitespace-only, or a bare `null`); every malformed or mismatched
    /// document is an error instead.
    pub fn from_str<T: Reflect + Typed>(&self, json: &str) -> Result<Option<T>> {
        match self.read_document(T::type_info(), json)? {
            None => Ok(None),
            Some(boxed) => {
                let found = boxed.reflect_type_info().type_path();
                match boxed.take::<T>() {
                    Ok(value) => Ok(Some(value)),
                    Err(_) => Err(Error::mismatch(T::type_info().type_path(), found)),
                }
            }
        }
    }

    /// Parses JSON with no target type, using class tags where present and
    /// degrading to the dynamic containers where not.
    pub fn from_str_dyn(&self, json: &str) -> Result<Option<Box<dyn Reflect>>> {
        match self.read_document(AnyValue::type_info(), json)? {
            None => Ok(None),
            Some(boxed) => {
                let found = boxed.reflect_type_info().type_path();
                match boxed.take::<AnyValue>() {
                    Ok(mut any) => Ok(any.take_inner()),
                    Err(_) => Err(Error::mismatch("refson::AnyValue", found)),
                }
            }
        }
    }

    fn read_document(
        &self,
        info: &'static TypeInfo,
        json: &str,
    ) -> Result<Option<Box<dyn Reflect>>> {
        let mut reader = self.new_reader(json);
        if reader.peek()? == Token::EndDocument {
            return Ok(None);
        }
        let converter = self.converter_for_info(info)?;
        let mut ctx = ReadContext::new(self);
        let value = converter.read(&mut reader, &mut ctx)?;
        match reader.peek()? {
            Token::EndDocument => {}
            _ => return Err(reader.syntax("document not fully consumed")),
        }
        ctx.refs().verify()?;
        Ok(value)
    }

    // -- converter resolution -------------------------------------------------

    /// The converter for `T`, resolved through the factory chain.
    pub fn converter_for<T: Typed>(&self) -> Result<Arc<dyn Converter>> {
        self.converter_for_info(T::type_info())
    }

    /// The converter for a runtime [`TypeInfo`].
    pub fn converter_for_info(&self, info: &'static TypeInfo) -> Result<Arc<dyn Converter>> {
        if let Some(cached) = self.cached_converter(info.ty_id()) {
            return Ok(cached);
        }
        Resolver::new(self).resolve(info)
    }

    /// The converter the given factory would have delegated to: the first
    /// answer from a factory registered after it. Decorator support.
    pub fn delegate_converter(
        &self,
        skip_past: &Arc<dyn ConverterFactory>,
        info: &'static TypeInfo,
    ) -> Result<Arc<dyn Converter>> {
        Resolver::new(self).resolve_skipping(skip_past, info)
    }

    pub(crate) fn cached_converter(&self, type_id: TypeId) -> Option<Arc<dyn Converter>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .cloned()
    }

    pub(crate) fn cache_converter(&self, type_id: TypeId, converter: Arc<dyn Converter>) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(type_id, converter);
    }

    pub(crate) fn factories(&self) -> &[Arc<dyn ConverterFactory>] {
        &self.factories
    }

    pub(crate) fn creator_for(&self, type_id: TypeId) -> Option<Arc<CreateFn>> {
        self.creators.get(&type_id).cloned()
    }

    pub(crate) fn is_excluded(&self, type_id: TypeId) -> bool {
        self.exclusions.contains(&type_id)
    }

    // -- type directory -------------------------------------------------------

    /// Resolves a class tag through the directory: alias, full path, then
    /// unambiguous short name.
    pub fn resolve_tag(&self, tag: &str) -> Option<&'static TypeInfo> {
        self.directory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve_tag(tag)
    }

    /// Whether a type is present in the directory.
    pub fn is_registered(&self, type_id: TypeId) -> bool {
        self.directory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(type_id)
    }

    /// The tag spelling written for `info`: the short name when the
    /// directory resolves it back to the same type, the full path when the
    /// short name is ambiguous or unregistered.
    pub(crate) fn tag_for(&self, info: &'static TypeInfo) -> &'static str {
        let directory = self.directory.read().unwrap_or_else(PoisonError::into_inner);
        let name = info.type_name();
        match directory.get_with_name(name) {
            Some(named) if named.ty_id() == info.ty_id() => name,
            _ => info.type_path(),
        }
    }

    /// Late registration, used when a converter meets a type the builder
    /// never saw, so its tag resolves on a later read.
    pub(crate) fn register_type_info(&self, info: &'static TypeInfo) {
        let mut directory = self.directory.write().unwrap_or_else(PoisonError::into_inner);
        if !directory.contains(info.ty_id()) {
            trace!(path = info.type_path(), "late type registration");
            directory.register_info(info);
        }
    }

    // -- configuration --------------------------------------------------------

    /// The configured class-tag property name, when tagging is enabled.
    pub fn class_property(&self) -> Option<&str> {
        self.class_property.as_deref()
    }

    pub fn loop_policy(&self) -> LoopPolicy {
        self.loop_policy
    }

    pub fn naming_policy(&self) -> NamingPolicy {
        self.naming_policy
    }

    /// The active schema version gate, if any.
    pub fn version(&self) -> Option<f64> {
        self.version
    }

    pub fn unknown_tag_policy(&self) -> UnknownTagPolicy {
        self.unknown_tags
    }

    pub fn serialize_nulls(&self) -> bool {
        self.serialize_nulls
    }

    fn new_reader<'de>(&self, json: &'de str) -> JsonReader<'de> {
        let mut reader = JsonReader::new(json);
        reader.set_lenient(self.lenient);
        reader
    }

    fn new_writer(&self) -> JsonWriter {
        let mut writer = JsonWriter::new();
        writer.set_serialize_nulls(self.serialize_nulls);
        writer.set_html_safe(self.html_safe);
        writer.set_lenient(self.lenient);
        if let Some(indent) = &self.indent {
            writer.set_indent(indent);
        }
        writer
    }

    // -- document utilities ---------------------------------------------------

    /// Rewrites a document with every class-tag property removed, at any
    /// nesting depth. A no-op when tagging is disabled.
    pub fn strip_class_tags(&self, json: &str) -> Result<String> {
        let Some(property) = self.class_property() else {
            return Ok(json.to_owned());
        };
        let mut reader = self.new_reader(json);
        // Faithful copy: nulls kept, non-finite floats tolerated.
        let mut writer = JsonWriter::new();
        writer.set_serialize_nulls(true);
        writer.set_lenient(true);
        if reader.peek()? == Token::EndDocument {
            return Ok(String::new());
        }
        copy_stripped(&mut reader, &mut writer, property)?;
        match reader.peek()? {
            Token::EndDocument => Ok(writer.into_string()),
            _ => Err(reader.syntax("document not fully consumed")),
        }
    }
}

fn copy_stripped(reader: &mut JsonReader<'_>, writer: &mut JsonWriter, drop: &str) -> Result<()> {
    match reader.peek()? {
        Token::BeginObject => {
            reader.begin_object()?;
            writer.begin_object()?;
            while reader.has_next()? {
                let name = reader.next_name()?;
                if name == drop {
                    reader.skip_value()?;
                    continue;
                }
                writer.name(&name)?;
                copy_stripped(reader, writer, drop)?;
            }
            reader.end_object()?;
            writer.end_object()
        }
        Token::BeginArray => {
            reader.begin_array()?;
            writer.begin_array()?;
            while reader.has_next()? {
                copy_stripped(reader, writer, drop)?;
            }
            reader.end_array()?;
            writer.end_array()
        }
        Token::Str => {
            let s = reader.next_str()?;
            writer.str_value(&s)
        }
        Token::Number => match reader.next_number()? {
            JsonNumber::Int(i) => writer.int_value(i),
            JsonNumber::Float(f) => writer.float_value(f),
        },
        Token::Bool => {
            let b = reader.next_bool()?;
            writer.bool_value(b)
        }
        Token::Null => {
            reader.next_null()?;
            writer.null_value()
        }
        got => Err(reader.syntax(format!("unexpected {got:?} while copying"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naming_policies_translate() {
        assert_eq!(NamingPolicy::Identity.apply("user_name"), "user_name");
        assert_eq!(NamingPolicy::LowerCamelCase.apply("user_name"), "userName");
        assert_eq!(NamingPolicy::PascalCase.apply("user_name"), "UserName");
        assert_eq!(NamingPolicy::KebabCase.apply("user_name"), "user-name");
    }
}
