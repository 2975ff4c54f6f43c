use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::info::{NamedField, TypeDescriptor, Typed};
use crate::reflection::{Reflect, ReflectKind};

/// Hook producing a fresh default instance, boxed and erased.
pub type DefaultFn = fn() -> Box<dyn Reflect>;

/// Hook parsing an instance from a bare string, boxed and erased.
///
/// Returns `None` when the text is not a valid rendering of the type.
pub type FromTextFn = fn(&str) -> Option<Box<dyn Reflect>>;

// -----------------------------------------------------------------------------
// TypeInfo

/// The compile-time shape of a convertible type.
///
/// Factories match on this instead of on Rust types, which is what lets a
/// single reflective converter serve every derived struct and a single
/// container factory serve every list.
#[derive(Debug)]
pub enum TypeInfo {
    Struct(StructInfo),
    List(ListInfo),
    Map(MapInfo),
    Set(SetInfo),
    Optional(OptionalInfo),
    /// A shared, identity-bearing cell (`Shared<T>`).
    Ref(RefInfo),
    /// A terminal value with no inspectable interior.
    Opaque(OpaqueInfo),
}

macro_rules! impl_as_fn {
    ($name:ident, $variant:ident, $info:ident) => {
        #[doc = concat!("The inner [`", stringify!($info), "`], if this is a `", stringify!($variant), "`.")]
        #[inline]
        pub fn $name(&self) -> Option<&$info> {
            match self {
                TypeInfo::$variant(info) => Some(info),
                _ => None,
            }
        }
    };
}

impl TypeInfo {
    impl_as_fn!(as_struct, Struct, StructInfo);
    impl_as_fn!(as_list, List, ListInfo);
    impl_as_fn!(as_map, Map, MapInfo);
    impl_as_fn!(as_set, Set, SetInfo);
    impl_as_fn!(as_optional, Optional, OptionalInfo);
    impl_as_fn!(as_ref_cell, Ref, RefInfo);
    impl_as_fn!(as_opaque, Opaque, OpaqueInfo);

    pub fn descriptor(&self) -> &TypeDescriptor {
        match self {
            TypeInfo::Struct(i) => &i.descriptor,
            TypeInfo::List(i) => &i.descriptor,
            TypeInfo::Map(i) => &i.descriptor,
            TypeInfo::Set(i) => &i.descriptor,
            TypeInfo::Optional(i) => &i.descriptor,
            TypeInfo::Ref(i) => &i.descriptor,
            TypeInfo::Opaque(i) => &i.descriptor,
        }
    }

    #[inline]
    pub fn ty_id(&self) -> TypeId {
        self.descriptor().id()
    }

    #[inline]
    pub fn type_path(&self) -> &'static str {
        self.descriptor().path()
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.descriptor().name()
    }

    pub fn kind(&self) -> ReflectKind {
        match self {
            TypeInfo::Struct(_) => ReflectKind::Struct,
            TypeInfo::List(_) => ReflectKind::List,
            TypeInfo::Map(_) => ReflectKind::Map,
            TypeInfo::Set(_) => ReflectKind::Set,
            TypeInfo::Optional(_) => ReflectKind::Optional,
            TypeInfo::Ref(_) => ReflectKind::Ref,
            TypeInfo::Opaque(_) => ReflectKind::Opaque,
        }
    }

    /// Whether [`make_default`](Self::make_default) can produce an
    /// instance. Containers, optionals, and cells always can.
    pub fn has_default(&self) -> bool {
        match self {
            TypeInfo::Struct(i) => i.default_fn.is_some(),
            TypeInfo::Opaque(i) => i.default_fn.is_some(),
            _ => true,
        }
    }

    /// A fresh default instance, when the type declared one.
    pub fn make_default(&self) -> Option<Box<dyn Reflect>> {
        match self {
            TypeInfo::Struct(i) => i.default_fn.map(|f| f()),
            TypeInfo::List(i) => Some((i.default_fn)()),
            TypeInfo::Map(i) => Some((i.default_fn)()),
            TypeInfo::Set(i) => Some((i.default_fn)()),
            TypeInfo::Optional(i) => Some((i.make_none)()),
            TypeInfo::Ref(i) => Some((i.new_unresolved)()),
            TypeInfo::Opaque(i) => i.default_fn.map(|f| f()),
        }
    }

    /// Parses an instance from a bare string, when the type declared a
    /// text form. `None` means no hook or unparseable input.
    pub fn from_text(&self, text: &str) -> Option<Box<dyn Reflect>> {
        match self {
            TypeInfo::Struct(i) => i.from_text_fn.and_then(|f| f(text)),
            TypeInfo::Opaque(i) => i.from_text_fn.and_then(|f| f(text)),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// StructInfo

/// A container for compile-time named struct info.
#[derive(Debug)]
pub struct StructInfo {
    descriptor: TypeDescriptor,
    fields: Box<[NamedField]>,
    // Keyed on the *document* property name, since lookups happen
    // while reading.
    index: HashMap<&'static str, usize>,
    default_fn: Option<DefaultFn>,
    from_text_fn: Option<FromTextFn>,
}

impl StructInfo {
    /// Create a new [`StructInfo`].
    ///
    /// The order of internal fields is fixed, depends on the input order.
    pub fn new(descriptor: TypeDescriptor, fields: Vec<NamedField>) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.serialized_name(), i))
            .collect();
        Self {
            descriptor,
            fields: fields.into_boxed_slice(),
            index,
            default_fn: None,
            from_text_fn: None,
        }
    }

    pub fn with_default(mut self, f: DefaultFn) -> Self {
        self.default_fn = Some(f);
        self
    }

    pub fn with_from_text(mut self, f: FromTextFn) -> Self {
        self.from_text_fn = Some(f);
        self
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Returns the [`NamedField`] for the given document property name.
    pub fn field(&self, serialized_name: &str) -> Option<&NamedField> {
        self.index.get(serialized_name).map(|&i| &self.fields[i])
    }

    /// Returns the [`NamedField`] at the given index, if present.
    pub fn field_at(&self, index: usize) -> Option<&NamedField> {
        self.fields.get(index)
    }

    /// Returns an iterator over the fields in declaration order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &NamedField> {
        self.fields.iter()
    }

    /// Returns the number of fields.
    #[inline]
    pub fn field_len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn has_default(&self) -> bool {
        self.default_fn.is_some()
    }

    #[inline]
    pub fn has_from_text(&self) -> bool {
        self.from_text_fn.is_some()
    }
}

// -----------------------------------------------------------------------------
// Container infos

/// Compile-time info for list-like types (`Vec<T>` and friends).
#[derive(Debug)]
pub struct ListInfo {
    descriptor: TypeDescriptor,
    item: fn() -> &'static TypeInfo,
    default_fn: DefaultFn,
}

impl ListInfo {
    pub fn new<L: Any, I: Typed>(default_fn: DefaultFn) -> Self {
        Self {
            descriptor: TypeDescriptor::of::<L>(),
            item: I::type_info,
            default_fn,
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// The item type's [`TypeInfo`].
    #[inline]
    pub fn item(&self) -> &'static TypeInfo {
        (self.item)()
    }
}

/// Compile-time info for map-like types.
#[derive(Debug)]
pub struct MapInfo {
    descriptor: TypeDescriptor,
    key: fn() -> &'static TypeInfo,
    value: fn() -> &'static TypeInfo,
    default_fn: DefaultFn,
}

impl MapInfo {
    pub fn new<M: Any, K: Typed, V: Typed>(default_fn: DefaultFn) -> Self {
        Self {
            descriptor: TypeDescriptor::of::<M>(),
            key: K::type_info,
            value: V::type_info,
            default_fn,
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn key(&self) -> &'static TypeInfo {
        (self.key)()
    }

    #[inline]
    pub fn value(&self) -> &'static TypeInfo {
        (self.value)()
    }
}

/// Compile-time info for set-like types.
#[derive(Debug)]
pub struct SetInfo {
    descriptor: TypeDescriptor,
    item: fn() -> &'static TypeInfo,
    default_fn: DefaultFn,
}

impl SetInfo {
    pub fn new<S: Any, I: Typed>(default_fn: DefaultFn) -> Self {
        Self {
            descriptor: TypeDescriptor::of::<S>(),
            item: I::type_info,
            default_fn,
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn item(&self) -> &'static TypeInfo {
        (self.item)()
    }
}

/// Compile-time info for `Option<T>`.
#[derive(Debug)]
pub struct OptionalInfo {
    descriptor: TypeDescriptor,
    inner: fn() -> &'static TypeInfo,
    make_none: DefaultFn,
}

impl OptionalInfo {
    pub fn new<O: Any, I: Typed>(make_none: DefaultFn) -> Self {
        Self {
            descriptor: TypeDescriptor::of::<O>(),
            inner: I::type_info,
            make_none,
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn inner(&self) -> &'static TypeInfo {
        (self.inner)()
    }

    /// A fresh `None` of the optional type, boxed and erased.
    #[inline]
    pub fn make_none(&self) -> Box<dyn Reflect> {
        (self.make_none)()
    }
}

/// Compile-time info for shared reference cells.
#[derive(Debug)]
pub struct RefInfo {
    descriptor: TypeDescriptor,
    inner: fn() -> &'static TypeInfo,
    new_unresolved: DefaultFn,
}

impl RefInfo {
    pub fn new<R: Any, I: Typed>(new_unresolved: DefaultFn) -> Self {
        Self {
            descriptor: TypeDescriptor::of::<R>(),
            inner: I::type_info,
            new_unresolved,
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn inner(&self) -> &'static TypeInfo {
        (self.inner)()
    }

    /// An empty cell awaiting a value or a link; the forward-reference
    /// placeholder.
    #[inline]
    pub fn new_unresolved(&self) -> Box<dyn Reflect> {
        (self.new_unresolved)()
    }
}

// -----------------------------------------------------------------------------
// OpaqueInfo

/// Compile-time info for terminal values (numbers, strings, anything
/// converters treat as a single token).
#[derive(Debug)]
pub struct OpaqueInfo {
    descriptor: TypeDescriptor,
    default_fn: Option<DefaultFn>,
    from_text_fn: Option<FromTextFn>,
}

impl OpaqueInfo {
    pub fn new<T: Any + ?Sized>() -> Self {
        Self {
            descriptor: TypeDescriptor::of::<T>(),
            default_fn: None,
            from_text_fn: None,
        }
    }

    pub fn with_default(mut self, f: DefaultFn) -> Self {
        self.default_fn = Some(f);
        self
    }

    pub fn with_from_text(mut self, f: FromTextFn) -> Self {
        self.from_text_fn = Some(f);
        self
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }
}
