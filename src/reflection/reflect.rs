use std::any::{Any, TypeId};

use crate::info::{NonGenericTypeInfoCell, OpaqueInfo, TypeInfo, Typed};
use crate::ops::{ReflectMut, ReflectOwned, ReflectRef};

// -----------------------------------------------------------------------------
// ReflectKind

/// A pure enumeration of the shapes a reflected value can take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReflectKind {
    Struct,
    List,
    Map,
    Set,
    Optional,
    /// A shared, identity-bearing cell.
    Ref,
    Opaque,
}

impl core::fmt::Display for ReflectKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            ReflectKind::Struct => "struct",
            ReflectKind::List => "list",
            ReflectKind::Map => "map",
            ReflectKind::Set => "set",
            ReflectKind::Optional => "optional",
            ReflectKind::Ref => "ref",
            ReflectKind::Opaque => "opaque",
        };
        f.write_str(s)
    }
}

// -----------------------------------------------------------------------------
// Reflect

/// The foundational trait for runtime value access.
///
/// This trait enables dynamic access and modification of data without
/// compile-time type information; it is what lets one reflective converter
/// serve every derived struct. Implement it with `#[derive(Reflect)]`.
///
/// Values are deliberately *not* `Send + Sync`: object graphs may contain
/// [`Shared`](crate::ops::Shared) cells, which are single-threaded by
/// construction. Engines and converters, which hold no values, stay
/// thread-safe.
///
/// Note that [`Any::type_id`] on a `Box<dyn Reflect>` returns the
/// container's type ID, not the inner value's; use [`Reflect::ty_id`].
pub trait Reflect: Any {
    /// Casts this type to a fully-reflected value.
    #[inline(always)]
    fn as_reflect(&self) -> &dyn Reflect
    where
        Self: Sized,
    {
        self
    }

    /// Casts this type to a mutable, fully-reflected value.
    #[inline(always)]
    fn as_reflect_mut(&mut self) -> &mut dyn Reflect
    where
        Self: Sized,
    {
        self
    }

    /// Casts this type to a boxed, fully-reflected value.
    #[inline(always)]
    fn into_boxed_reflect(self) -> Box<dyn Reflect>
    where
        Self: Sized,
    {
        Box::new(self)
    }

    /// Upcast to [`Any`]; implemented by the cast macro / derive.
    fn as_any(&self) -> &dyn Any;

    /// Upcast to mutable [`Any`]; implemented by the cast macro / derive.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Upcast to boxed [`Any`]; implemented by the cast macro / derive.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Return the [`TypeId`] of the underlying type.
    #[inline]
    fn ty_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    /// Returns the [`TypeInfo`] of the underlying type.
    fn reflect_type_info(&self) -> &'static TypeInfo;

    /// Performs a type-checked assignment of a reflected value to this
    /// value. On type mismatch the input is handed back untouched.
    fn set(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>>;

    /// Returns the ["kind"](ReflectKind) of the underlying type.
    fn reflect_kind(&self) -> ReflectKind;

    /// Casts to an immutable kind-specific access view.
    fn reflect_ref(&self) -> ReflectRef<'_>;

    /// Casts to a mutable kind-specific access view.
    fn reflect_mut(&mut self) -> ReflectMut<'_>;

    /// Casts to an owned kind-specific access view.
    fn reflect_owned(self: Box<Self>) -> ReflectOwned;

    /// Clones the value behind the trait object.
    ///
    /// Every convertible type is `Clone`, so unlike comparison this
    /// cannot fail.
    fn reflect_clone(&self) -> Box<dyn Reflect>;

    /// Returns a "partial equality" comparison result.
    ///
    /// `None` means the underlying type does not support equality testing.
    #[inline]
    fn reflect_partial_eq(&self, _other: &dyn Reflect) -> Option<bool> {
        None
    }

    /// Debug formatter for the value.
    fn reflect_debug(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "Reflect({})", self.reflect_type_info().type_path())
    }
}

impl dyn Reflect {
    /// Returns `true` if the underlying value is of type `T`.
    #[inline(always)]
    pub fn is<T: Any>(&self) -> bool {
        self.ty_id() == TypeId::of::<T>()
    }

    /// Downcasts the value to type `T` by reference.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Downcasts the value to type `T` by mutable reference.
    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }

    /// Downcasts the value to type `T`, consuming the trait object.
    ///
    /// If the underlying value is not of type `T`, returns `Err(self)`.
    #[inline]
    pub fn downcast<T: Any>(self: Box<dyn Reflect>) -> Result<Box<T>, Box<dyn Reflect>> {
        if self.is::<T>() {
            // The check above makes the `Any` downcast infallible.
            match self.into_any().downcast::<T>() {
                Ok(v) => Ok(v),
                Err(_) => unreachable!("ty_id matched but Any downcast failed"),
            }
        } else {
            Err(self)
        }
    }

    /// Downcasts the value to type `T`, unboxing and consuming the trait
    /// object.
    #[inline]
    pub fn take<T: Any>(self: Box<dyn Reflect>) -> Result<T, Box<dyn Reflect>> {
        self.downcast::<T>().map(|boxed| *boxed)
    }
}

impl core::fmt::Debug for dyn Reflect {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.reflect_debug(f)
    }
}

impl Typed for dyn Reflect {
    /// This is the [`TypeInfo`] of `dyn Reflect` itself, not of the
    /// underlying data. Use [`Reflect::reflect_type_info`] for that.
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Opaque(OpaqueInfo::new::<Self>()))
    }
}

// -----------------------------------------------------------------------------
// Auxiliary macro

/// Implement the mechanical part of [`Reflect`]: `Any` upcasts, `set`,
/// and the kind casting quartet.
macro_rules! impl_reflect_cast_fn {
    ($kind:ident) => {
        #[inline]
        fn as_any(&self) -> &dyn ::core::any::Any {
            self
        }

        #[inline]
        fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
            self
        }

        #[inline]
        fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::core::any::Any> {
            self
        }

        fn set(
            &mut self,
            value: ::std::boxed::Box<dyn $crate::reflection::Reflect>,
        ) -> Result<(), ::std::boxed::Box<dyn $crate::reflection::Reflect>> {
            *self = value.take::<Self>()?;
            Ok(())
        }

        #[inline]
        fn reflect_kind(&self) -> $crate::reflection::ReflectKind {
            $crate::reflection::ReflectKind::$kind
        }

        #[inline]
        fn reflect_ref(&self) -> $crate::ops::ReflectRef<'_> {
            $crate::ops::ReflectRef::$kind(self)
        }

        #[inline]
        fn reflect_mut(&mut self) -> $crate::ops::ReflectMut<'_> {
            $crate::ops::ReflectMut::$kind(self)
        }

        #[inline]
        fn reflect_owned(self: ::std::boxed::Box<Self>) -> $crate::ops::ReflectOwned {
            $crate::ops::ReflectOwned::$kind(self)
        }
    };
}

pub(crate) use impl_reflect_cast_fn;
