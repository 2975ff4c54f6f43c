use crate::info::{NonGenericTypeInfoCell, OpaqueInfo, TypeInfo, Typed};
use crate::reflection::{Reflect, impl_reflect_cast_fn};

// -----------------------------------------------------------------------------
// AnyValue

/// A field slot that can hold a value of any convertible type.
///
/// `AnyValue` is the polymorphism vehicle: a struct field declared as
/// `AnyValue` serializes its contents with a class tag, and on read the
/// tag (when present and resolvable) picks the concrete type to rebuild.
/// Untagged documents degrade to the dynamic containers.
///
/// The slot may be empty, which round-trips as JSON `null`.
#[derive(Default)]
pub struct AnyValue(Option<Box<dyn Reflect>>);

impl AnyValue {
    /// An empty slot.
    #[inline]
    pub fn empty() -> Self {
        Self(None)
    }

    /// A slot holding `value`.
    #[inline]
    pub fn new(value: impl Reflect) -> Self {
        Self(Some(Box::new(value)))
    }

    /// A slot holding an already-erased value.
    #[inline]
    pub fn from_boxed(value: Box<dyn Reflect>) -> Self {
        Self(Some(value))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    #[inline]
    pub fn get(&self) -> Option<&dyn Reflect> {
        self.0.as_deref()
    }

    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut dyn Reflect> {
        self.0.as_deref_mut()
    }

    /// Replaces the contents, returning the previous value.
    #[inline]
    pub fn replace(&mut self, value: Box<dyn Reflect>) -> Option<Box<dyn Reflect>> {
        self.0.replace(value)
    }

    /// Empties the slot, returning its value.
    #[inline]
    pub fn take_inner(&mut self) -> Option<Box<dyn Reflect>> {
        self.0.take()
    }

    /// Convenience downcast of the contents.
    #[inline]
    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> {
        self.get()?.downcast_ref()
    }
}

impl Clone for AnyValue {
    fn clone(&self) -> Self {
        Self(self.0.as_ref().map(|v| v.reflect_clone()))
    }
}

impl core::fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.0 {
            Some(v) => f.debug_tuple("AnyValue").field(v).finish(),
            None => f.write_str("AnyValue(empty)"),
        }
    }
}

impl Typed for AnyValue {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Opaque(
                OpaqueInfo::new::<Self>().with_default(|| Box::new(AnyValue::empty())),
            )
        })
    }
}

impl Reflect for AnyValue {
    impl_reflect_cast_fn!(Opaque);

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
        match (&self.0, &other.0) {
            (None, None) => Some(true),
            (Some(a), Some(b)) => a.reflect_partial_eq(b.as_ref()),
            _ => Some(false),
        }
    }

    fn reflect_debug(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Debug::fmt(self, f)
    }
}
