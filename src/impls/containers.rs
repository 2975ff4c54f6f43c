use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use crate::info::{GenericTypeInfoCell, ListInfo, MapInfo, OptionalInfo, SetInfo, TypeInfo, Typed};
use crate::ops::{List, Map, Optional, ReflectRef, Set};
use crate::reflection::{Reflect, impl_reflect_cast_fn};

// -----------------------------------------------------------------------------
// Vec

impl<T: Reflect + Typed + Clone> Typed for Vec<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::List(ListInfo::new::<Self, T>(|| Box::new(Vec::<T>::new())))
        })
    }
}

impl<T: Reflect + Typed + Clone> List for Vec<T> {
    fn get(&self, index: usize) -> Option<&dyn Reflect> {
        self.as_slice().get(index).map(T::as_reflect)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.as_mut_slice().get_mut(index).map(T::as_reflect_mut)
    }

    fn push_boxed(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        self.push(value.take::<T>()?);
        Ok(())
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl<T: Reflect + Typed + Clone> Reflect for Vec<T> {
    impl_reflect_cast_fn!(List);

    #[inline]
    fn reflect_type_info(&self) -> &'static TypeInfo {
        Self::type_info()
    }

    #[inline]
    fn reflect_clone(&self) -> Box<dyn Reflect> {
        Box::new(self.clone())
    }

    fn reflect_partial_eq(&self, other: &dyn Reflect) -> Option<bool> {
        list_partial_eq(self, other)
    }

    fn reflect_debug(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_list()
            .entries(self.as_slice().iter().map(T::as_reflect))
            .finish()
    }
}

/// Reflective element-wise comparison against any list-shaped value.
fn list_partial_eq(a: &dyn List, b: &dyn Reflect) -> Option<bool> {
    let ReflectRef::List(b) = b.reflect_ref() else {
        return Some(false);
    };
    if a.len() != b.len() {
        return Some(false);
    }
    for i in 0..a.len() {
        match (a.get(i), b.get(i)) {
            (Some(x), Some(y)) => match x.reflect_partial_eq(y) {
                Some(true) => {}
                other => return other,
            },
            _ => return Some(false),
        }
    }
    Some(true)
}

// -----------------------------------------------------------------------------
// Maps

macro_rules! impl_reflect_map {
    ($map:ident, $($bound:path),*) => {
        impl<K, V> Typed for $map<K, V>
        where
            K: Reflect + Typed + Clone $(+ $bound)*,
            V: Reflect + Typed + Clone,
        {
            fn type_info() -> &'static TypeInfo {
                static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
                CELL.get_or_insert::<Self>(|| {
                    TypeInfo::Map(MapInfo::new::<Self, K, V>(|| Box::new($map::<K, V>::new())))
                })
            }
        }

        impl<K, V> Map for $map<K, V>
        where
            K: Reflect + Typed + Clone $(+ $bound)*,
            V: Reflect + Typed + Clone,
        {
            fn get(&self, key: &dyn Reflect) -> Option<&dyn Reflect> {
                let key = key.downcast_ref::<K>()?;
                $map::get(self, key).map(V::as_reflect)
            }

            fn insert_boxed(
                &mut self,
                key: Box<dyn Reflect>,
                value: Box<dyn Reflect>,
            ) -> Result<(), (Box<dyn Reflect>, Box<dyn Reflect>)> {
                let key = match key.take::<K>() {
                    Ok(key) => key,
                    Err(key) => return Err((key, value)),
                };
                let value = match value.take::<V>() {
                    Ok(value) => value,
                    Err(value) => return Err((Box::new(key), value)),
                };
                self.insert(key, value);
                Ok(())
            }

            fn len(&self) -> usize {
                $map::len(self)
            }

            fn iter(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
                Box::new($map::iter(self).map(|(k, v)| (k.as_reflect(), v.as_reflect())))
            }
        }

        impl<K, V> Reflect for $map<K, V>
        where
            K: Reflect + Typed + Clone $(+ $bound)*,
            V: Reflect + Typed + Clone,
        {
            impl_reflect_cast_fn!(Map);

            #[inline]
            fn reflect_type_info(&self) -> &'static TypeInfo {
                Self::type_info()
            }

            #[inline]
            fn reflect_clone(&self) -> Box<dyn Reflect> {
                Box::new(self.clone())
            }

            fn reflect_partial_eq(&self, other: &dyn Reflect) -> Option<bool> {
                map_partial_eq(self, other)
            }

            fn reflect_debug(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                f.debug_map()
                    .entries($map::iter(self).map(|(k, v)| (k.as_reflect(), v.as_reflect())))
                    .finish()
            }
        }
    };
}

impl_reflect_map!(HashMap, Eq, Hash);
impl_reflect_map!(BTreeMap, Ord);

fn map_partial_eq(a: &dyn Map, b: &dyn Reflect) -> Option<bool> {
    let ReflectRef::Map(b) = b.reflect_ref() else {
        return Some(false);
    };
    if a.len() != b.len() {
        return Some(false);
    }
    for (k, v) in a.iter() {
        match b.get(k).and_then(|o| v.reflect_partial_eq(o)) {
            Some(true) => {}
            other => return other,
        }
    }
    Some(true)
}

// -----------------------------------------------------------------------------
// Sets

macro_rules! impl_reflect_set {
    ($set:ident, $($bound:path),*) => {
        impl<T> Typed for $set<T>
        where
            T: Reflect + Typed + Clone $(+ $bound)*,
        {
            fn type_info() -> &'static TypeInfo {
                static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
                CELL.get_or_insert::<Self>(|| {
                    TypeInfo::Set(SetInfo::new::<Self, T>(|| Box::new($set::<T>::new())))
                })
            }
        }

        impl<T> Set for $set<T>
        where
            T: Reflect + Typed + Clone $(+ $bound)*,
        {
            fn insert_boxed(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
                self.insert(value.take::<T>()?);
                Ok(())
            }

            fn contains(&self, value: &dyn Reflect) -> bool {
                match value.downcast_ref::<T>() {
                    Some(value) => $set::contains(self, value),
                    None => false,
                }
            }

            fn len(&self) -> usize {
                $set::len(self)
            }

            fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
                Box::new($set::iter(self).map(T::as_reflect))
            }
        }

        impl<T> Reflect for $set<T>
        where
            T: Reflect + Typed + Clone $(+ $bound)*,
        {
            impl_reflect_cast_fn!(Set);

            #[inline]
            fn reflect_type_info(&self) -> &'static TypeInfo {
                Self::type_info()
            }

            #[inline]
            fn reflect_clone(&self) -> Box<dyn Reflect> {
                Box::new(self.clone())
            }

            fn reflect_partial_eq(&self, other: &dyn Reflect) -> Option<bool> {
                let ReflectRef::Set(other) = other.reflect_ref() else {
                    return Some(false);
                };
                if other.len() != self.len() {
                    return Some(false);
                }
                Some(Set::iter(self).all(|v| other.contains(v)))
            }

            fn reflect_debug(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                f.debug_set()
                    .entries($set::iter(self).map(T::as_reflect))
                    .finish()
            }
        }
    };
}

impl_reflect_set!(HashSet, Eq, Hash);
impl_reflect_set!(BTreeSet, Ord);

// -----------------------------------------------------------------------------
// Option

impl<T: Reflect + Typed + Clone> Typed for Option<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::Optional(OptionalInfo::new::<Self, T>(|| Box::new(Option::<T>::None)))
        })
    }
}

impl<T: Reflect + Typed + Clone> Optional for Option<T> {
    fn is_some(&self) -> bool {
        Option::is_some(self)
    }

    fn get(&self) -> Option<&dyn Reflect> {
        self.as_ref().map(T::as_reflect)
    }

    fn get_mut(&mut self) -> Option<&mut dyn Reflect> {
        self.as_mut().map(T::as_reflect_mut)
    }

    fn set_inner(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        *self = Some(value.take::<T>()?);
        Ok(())
    }

    fn clear(&mut self) {
        *self = None;
    }

    fn take_inner(&mut self) -> Option<Box<dyn Reflect>> {
        self.take().map(|v| Box::new(v) as Box<dyn Reflect>)
    }
}

impl<T: Reflect + Typed + Clone> Reflect for Option<T> {
    impl_reflect_cast_fn!(Optional);

    #[inline]
    fn reflect_type_info(&self) -> &'static TypeInfo {
        Self::type_info()
    }

    #[inline]
    fn reflect_clone(&self) -> Box<dyn Reflect> {
        Box::new(self.clone())
    }

    fn reflect_partial_eq(&self, other: &dyn Reflect) -> Option<bool> {
        let other = other.downcast_ref::<Self>()?;
        match (self, other) {
            (None, None) => Some(true),
            (Some(a), Some(b)) => a.reflect_partial_eq(b.as_reflect()),
            _ => Some(false),
        }
    }

    fn reflect_debug(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Some(v) => {
                f.write_str("Some(")?;
                v.reflect_debug(f)?;
                f.write_str(")")
            }
            None => f.write_str("None"),
        }
    }
}
