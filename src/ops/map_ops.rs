use crate::info::{NonGenericTypeInfoCell, OpaqueInfo, TypeInfo, Typed};
use crate::reflection::{Reflect, ReflectKind};

// -----------------------------------------------------------------------------
// Map

/// Data access for map-like values.
///
/// Key lookup goes through [`Reflect::reflect_partial_eq`], so keys only
/// need reflected equality, not `Eq + Hash` at this level.
pub trait Map: Reflect {
    /// Returns the value for the given key.
    fn get(&self, key: &dyn Reflect) -> Option<&dyn Reflect>;

    /// Inserts a boxed pair. On key or value type mismatch the pair is
    /// handed back untouched.
    fn insert_boxed(
        &mut self,
        key: Box<dyn Reflect>,
        value: Box<dyn Reflect>,
    ) -> Result<(), (Box<dyn Reflect>, Box<dyn Reflect>)>;

    /// Returns the number of entries.
    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over `(key, value)` pairs.
    ///
    /// Iteration order follows the underlying container: insertion order
    /// for [`DynamicMap`], container order for concrete maps.
    fn iter(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_>;
}

// -----------------------------------------------------------------------------
// DynamicMap

/// A type-erased map of boxed pairs, in insertion order.
#[derive(Default)]
pub struct DynamicMap {
    entries: Vec<(Box<dyn Reflect>, Box<dyn Reflect>)>,
}

impl DynamicMap {
    /// Creates an empty `DynamicMap`.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts a typed pair.
    pub fn insert(&mut self, key: impl Reflect, value: impl Reflect) {
        // insert_boxed for DynamicMap cannot fail
        let _ = self.insert_boxed(Box::new(key), Box::new(value));
    }

    /// Consumes the map, returning its entries in insertion order.
    pub fn into_entries(self) -> Vec<(Box<dyn Reflect>, Box<dyn Reflect>)> {
        self.entries
    }

    fn position(&self, key: &dyn Reflect) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.reflect_partial_eq(key) == Some(true))
    }
}

impl Typed for DynamicMap {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Opaque(OpaqueInfo::new::<Self>().with_default(|| Box::new(Self::new())))
        })
    }
}

impl Map for DynamicMap {
    fn get(&self, key: &dyn Reflect) -> Option<&dyn Reflect> {
        self.position(key).map(|i| self.entries[i].1.as_ref())
    }

    fn insert_boxed(
        &mut self,
        key: Box<dyn Reflect>,
        value: Box<dyn Reflect>,
    ) -> Result<(), (Box<dyn Reflect>, Box<dyn Reflect>)> {
        match self.position(key.as_ref()) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((key, value)),
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(self.entries.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
    }
}

impl Reflect for DynamicMap {
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
        ReflectKind::Map
    }

    #[inline]
    fn reflect_ref(&self) -> super::ReflectRef<'_> {
        super::ReflectRef::Map(self)
    }

    #[inline]
    fn reflect_mut(&mut self) -> super::ReflectMut<'_> {
        super::ReflectMut::Map(self)
    }

    #[inline]
    fn reflect_owned(self: Box<Self>) -> super::ReflectOwned {
        super::ReflectOwned::Map(self)
    }

    fn reflect_clone(&self) -> Box<dyn Reflect> {
        let mut out = DynamicMap::new();
        for (k, v) in &self.entries {
            out.entries.push((k.reflect_clone(), v.reflect_clone()));
        }
        Box::new(out)
    }

    fn reflect_partial_eq(&self, other: &dyn Reflect) -> Option<bool> {
        let super::ReflectRef::Map(other) = other.reflect_ref() else {
            return Some(false);
        };
        if other.len() != self.len() {
            return Some(false);
        }
        for (k, v) in &self.entries {
            match other.get(k.as_ref()).and_then(|o| v.reflect_partial_eq(o)) {
                Some(true) => {}
                other => return other,
            }
        }
        Some(true)
    }

    fn reflect_debug(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| {
                (k as &dyn core::fmt::Debug, v as &dyn core::fmt::Debug)
            }))
            .finish()
    }
}
