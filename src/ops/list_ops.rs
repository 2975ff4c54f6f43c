use crate::info::{NonGenericTypeInfoCell, OpaqueInfo, TypeInfo, Typed};
use crate::reflection::{Reflect, ReflectKind};

// -----------------------------------------------------------------------------
// List

/// Data access for list-like values (`Vec<T>` and friends).
pub trait List: Reflect {
    /// Returns the item at `index`.
    fn get(&self, index: usize) -> Option<&dyn Reflect>;

    /// Returns the item at `index`, mutably.
    fn get_mut(&mut self, index: usize) -> Option<&mut dyn Reflect>;

    /// Appends a boxed value. On item type mismatch the input is handed
    /// back untouched.
    fn push_boxed(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>>;

    /// Returns the number of items.
    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over the items.
    fn iter(&self) -> ListItemIter<'_>
    where
        Self: Sized,
    {
        ListItemIter::new(self)
    }
}

/// An iterator over a list's items.
pub struct ListItemIter<'a> {
    list: &'a dyn List,
    index: usize,
}

impl<'a> ListItemIter<'a> {
    pub fn new(list: &'a dyn List) -> Self {
        Self { list, index: 0 }
    }
}

impl<'a> Iterator for ListItemIter<'a> {
    type Item = &'a dyn Reflect;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.list.get(self.index)?;
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.list.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ListItemIter<'_> {}

// -----------------------------------------------------------------------------
// DynamicList

/// A type-erased list of boxed values.
///
/// What an untagged JSON array degrades to when no concrete item type is
/// known.
#[derive(Default)]
pub struct DynamicList {
    values: Vec<Box<dyn Reflect>>,
}

impl DynamicList {
    /// Creates an empty `DynamicList`.
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Appends a typed value.
    pub fn push(&mut self, value: impl Reflect) {
        self.values.push(Box::new(value));
    }

    /// Consumes the list, returning its values.
    pub fn into_values(self) -> Vec<Box<dyn Reflect>> {
        self.values
    }
}

impl Typed for DynamicList {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Opaque(OpaqueInfo::new::<Self>().with_default(|| Box::new(Self::new())))
        })
    }
}

impl List for DynamicList {
    fn get(&self, index: usize) -> Option<&dyn Reflect> {
        self.values.get(index).map(AsRef::as_ref)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.values.get_mut(index).map(AsMut::as_mut)
    }

    fn push_boxed(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        self.values.push(value);
        Ok(())
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

impl Reflect for DynamicList {
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
        ReflectKind::List
    }

    #[inline]
    fn reflect_ref(&self) -> super::ReflectRef<'_> {
        super::ReflectRef::List(self)
    }

    #[inline]
    fn reflect_mut(&mut self) -> super::ReflectMut<'_> {
        super::ReflectMut::List(self)
    }

    #[inline]
    fn reflect_owned(self: Box<Self>) -> super::ReflectOwned {
        super::ReflectOwned::List(self)
    }

    fn reflect_clone(&self) -> Box<dyn Reflect> {
        let mut out = DynamicList::new();
        for value in &self.values {
            out.values.push(value.reflect_clone());
        }
        Box::new(out)
    }

    fn reflect_partial_eq(&self, other: &dyn Reflect) -> Option<bool> {
        let super::ReflectRef::List(other) = other.reflect_ref() else {
            return Some(false);
        };
        if other.len() != self.len() {
            return Some(false);
        }
        for (i, value) in self.values.iter().enumerate() {
            match other.get(i).and_then(|o| value.reflect_partial_eq(o)) {
                Some(true) => {}
                other => return other,
            }
        }
        Some(true)
    }

    fn reflect_debug(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_list()
            .entries(self.values.iter().map(|v| v as &dyn core::fmt::Debug))
            .finish()
    }
}
