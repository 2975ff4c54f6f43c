use crate::ops::{List, Map, Optional, Set, SharedRef, Struct};
use crate::reflection::Reflect;

macro_rules! impl_cast_method {
    ($name:ident : Opaque => $retval:ty) => {
        #[doc = "Attempts a cast to an opaque value."]
        #[inline]
        pub fn $name(self) -> Option<$retval> {
            match self {
                Self::Opaque(value) => Some(value),
                _ => None,
            }
        }
    };
    ($name:ident : $kind:ident => $retval:ty) => {
        #[doc = concat!("Attempts a cast to a [`", stringify!($kind), "`] view.")]
        #[inline]
        pub fn $name(self) -> Option<$retval> {
            match self {
                Self::$kind(value) => Some(value),
                _ => None,
            }
        }
    };
}

// -----------------------------------------------------------------------------
// ReflectRef

/// An immutable, kind-dispatched view of a reflected value.
pub enum ReflectRef<'a> {
    Struct(&'a dyn Struct),
    List(&'a dyn List),
    Map(&'a dyn Map),
    Set(&'a dyn Set),
    Optional(&'a dyn Optional),
    Ref(&'a dyn SharedRef),
    Opaque(&'a dyn Reflect),
}

impl<'a> ReflectRef<'a> {
    impl_cast_method!(as_struct: Struct => &'a dyn Struct);
    impl_cast_method!(as_list: List => &'a dyn List);
    impl_cast_method!(as_map: Map => &'a dyn Map);
    impl_cast_method!(as_set: Set => &'a dyn Set);
    impl_cast_method!(as_optional: Optional => &'a dyn Optional);
    impl_cast_method!(as_shared: Ref => &'a dyn SharedRef);
    impl_cast_method!(as_opaque: Opaque => &'a dyn Reflect);
}

// -----------------------------------------------------------------------------
// ReflectMut

/// A mutable, kind-dispatched view of a reflected value.
pub enum ReflectMut<'a> {
    Struct(&'a mut dyn Struct),
    List(&'a mut dyn List),
    Map(&'a mut dyn Map),
    Set(&'a mut dyn Set),
    Optional(&'a mut dyn Optional),
    Ref(&'a mut dyn SharedRef),
    Opaque(&'a mut dyn Reflect),
}

impl<'a> ReflectMut<'a> {
    impl_cast_method!(as_struct: Struct => &'a mut dyn Struct);
    impl_cast_method!(as_list: List => &'a mut dyn List);
    impl_cast_method!(as_map: Map => &'a mut dyn Map);
    impl_cast_method!(as_set: Set => &'a mut dyn Set);
    impl_cast_method!(as_optional: Optional => &'a mut dyn Optional);
    impl_cast_method!(as_shared: Ref => &'a mut dyn SharedRef);
    impl_cast_method!(as_opaque: Opaque => &'a mut dyn Reflect);
}

// -----------------------------------------------------------------------------
// ReflectOwned

/// An owned, kind-dispatched view of a reflected value.
pub enum ReflectOwned {
    Struct(Box<dyn Struct>),
    List(Box<dyn List>),
    Map(Box<dyn Map>),
    Set(Box<dyn Set>),
    Optional(Box<dyn Optional>),
    Ref(Box<dyn SharedRef>),
    Opaque(Box<dyn Reflect>),
}

impl ReflectOwned {
    impl_cast_method!(into_struct: Struct => Box<dyn Struct>);
    impl_cast_method!(into_list: List => Box<dyn List>);
    impl_cast_method!(into_map: Map => Box<dyn Map>);
    impl_cast_method!(into_set: Set => Box<dyn Set>);
    impl_cast_method!(into_optional: Optional => Box<dyn Optional>);
    impl_cast_method!(into_shared: Ref => Box<dyn SharedRef>);
    impl_cast_method!(into_opaque: Opaque => Box<dyn Reflect>);
}
