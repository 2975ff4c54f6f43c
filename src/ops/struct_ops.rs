use std::collections::HashMap;

use crate::info::{NonGenericTypeInfoCell, OpaqueInfo, TypeInfo, Typed};
use crate::reflection::{Reflect, ReflectKind};

// -----------------------------------------------------------------------------
// Struct

/// Data access for struct values with named fields.
///
/// Implemented by `#[derive(Reflect)]` for named-field structs, and by
/// [`DynamicStruct`] for erased document content.
pub trait Struct: Reflect {
    /// Returns the field with the given Rust name.
    fn field(&self, name: &str) -> Option<&dyn Reflect>;

    /// Returns the field with the given Rust name, mutably.
    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Reflect>;

    /// Returns the field at `index` in declaration order.
    fn field_at(&self, index: usize) -> Option<&dyn Reflect>;

    /// Returns the field at `index` in declaration order, mutably.
    fn field_at_mut(&mut self, index: usize) -> Option<&mut dyn Reflect>;

    /// Returns the name of the field at `index`.
    fn name_at(&self, index: usize) -> Option<&str>;

    /// Returns the number of fields.
    fn field_len(&self) -> usize;

    /// Returns an iterator over the fields in declaration order.
    fn iter_fields(&self) -> StructFieldIter<'_>
    where
        Self: Sized,
    {
        StructFieldIter::new(self)
    }
}

/// An iterator over a struct's `(name, value)` pairs.
pub struct StructFieldIter<'a> {
    value: &'a dyn Struct,
    index: usize,
}

impl<'a> StructFieldIter<'a> {
    pub fn new(value: &'a dyn Struct) -> Self {
        Self { value, index: 0 }
    }
}

impl<'a> Iterator for StructFieldIter<'a> {
    type Item = (&'a str, &'a dyn Reflect);

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.value.name_at(self.index)?;
        let field = self.value.field_at(self.index)?;
        self.index += 1;
        Some((name, field))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.value.field_len() - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for StructFieldIter<'_> {}

// -----------------------------------------------------------------------------
// DynamicStruct

/// A type-erased struct: an ordered list of named, boxed values.
///
/// This is what an untagged JSON object degrades to when read into an
/// [`AnyValue`](crate::reflection::AnyValue) slot, and the intermediate
/// used when coercing document content into a concrete struct.
#[derive(Default)]
pub struct DynamicStruct {
    fields: Vec<(String, Box<dyn Reflect>)>,
    index: HashMap<String, usize>,
}

impl DynamicStruct {
    /// Creates an empty `DynamicStruct`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a boxed value under `name`, replacing any existing entry.
    pub fn insert_boxed(&mut self, name: &str, value: Box<dyn Reflect>) {
        match self.index.get(name) {
            Some(&i) => self.fields[i].1 = value,
            None => {
                self.index.insert(name.to_owned(), self.fields.len());
                self.fields.push((name.to_owned(), value));
            }
        }
    }

    /// Inserts a typed value under `name`.
    pub fn insert(&mut self, name: &str, value: impl Reflect) {
        self.insert_boxed(name, Box::new(value));
    }

    /// Removes and returns the value under `name`, keeping order of the
    /// remaining fields.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Reflect>> {
        let i = self.index.remove(name)?;
        let (_, value) = self.fields.remove(i);
        for idx in self.index.values_mut() {
            if *idx > i {
                *idx -= 1;
            }
        }
        Some(value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Consumes the struct, returning its `(name, value)` pairs in
    /// insertion order.
    pub fn into_fields(self) -> Vec<(String, Box<dyn Reflect>)> {
        self.fields
    }
}

impl Typed for DynamicStruct {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Opaque(OpaqueInfo::new::<Self>().with_default(|| Box::new(Self::new())))
        })
    }
}

impl Struct for DynamicStruct {
    fn field(&self, name: &str) -> Option<&dyn Reflect> {
        self.index.get(name).map(|&i| self.fields[i].1.as_ref())
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Reflect> {
        let i = *self.index.get(name)?;
        Some(self.fields[i].1.as_mut())
    }

    fn field_at(&self, index: usize) -> Option<&dyn Reflect> {
        self.fields.get(index).map(|(_, v)| v.as_ref())
    }

    fn field_at_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.fields.get_mut(index).map(|(_, v)| v.as_mut())
    }

    fn name_at(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|(n, _)| n.as_str())
    }

    fn field_len(&self) -> usize {
        self.fields.len()
    }
}

impl Reflect for DynamicStruct {
    #[inline]
    fn as_any(&self) -> &dyn core::any::Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn core::any::Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn core::any::Any> {
        self
    }

    fn set(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        *self = value.take::<Self>()?;
        Ok(())
    }

    #[inline]
    fn reflect_type_info(&self) -> &'static TypeInfo {
        Self::type_info()
    }

    #[inline]
    fn reflect_kind(&self) -> ReflectKind {
        ReflectKind::Struct
    }

    #[inline]
    fn reflect_ref(&self) -> super::ReflectRef<'_> {
        super::ReflectRef::Struct(self)
    }

    #[inline]
    fn reflect_mut(&mut self) -> super::ReflectMut<'_> {
        super::ReflectMut::Struct(self)
    }

    #[inline]
    fn reflect_owned(self: Box<Self>) -> super::ReflectOwned {
        super::ReflectOwned::Struct(self)
    }

    fn reflect_clone(&self) -> Box<dyn Reflect> {
        let mut out = DynamicStruct::new();
        for (name, value) in &self.fields {
            out.insert_boxed(name, value.reflect_clone());
        }
        Box::new(out)
    }

    fn reflect_partial_eq(&self, other: &dyn Reflect) -> Option<bool> {
        let super::ReflectRef::Struct(other) = other.reflect_ref() else {
            return Some(false);
        };
        if other.field_len() != self.field_len() {
            return Some(false);
        }
        for (name, value) in self.iter_fields() {
            match other.field(name) {
                Some(other_value) => match value.reflect_partial_eq(other_value) {
                    Some(true) => {}
                    other => return other,
                },
                None => return Some(false),
            }
        }
        Some(true)
    }

    fn reflect_debug(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut debug = f.debug_struct("DynamicStruct");
        for (name, value) in self.iter_fields() {
            debug.field(name, &value as &dyn core::fmt::Debug);
        }
        debug.finish()
    }
}
