use std::any::{Any, TypeId};
use std::sync::{OnceLock, PoisonError, RwLock};

use crate::info::TypeInfo;

// -----------------------------------------------------------------------------
// Typed

/// A static accessor to compile-time type information.
///
/// Automatically implemented by `#[derive(Reflect)]`, allowing access to
/// type information without an instance of the type.
///
/// # Manually Impl
///
/// Non-generic types store their info in a [`NonGenericTypeInfoCell`];
/// generic types share one `static` across instantiations and must use a
/// [`GenericTypeInfoCell`] instead:
///
/// ```ignore
/// impl<T: Typed> Typed for Wrapper<T> {
///     fn type_info() -> &'static TypeInfo {
///         static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
///         CELL.get_or_insert::<Self>(|| {
///             TypeInfo::List(ListInfo::new::<Self, T>(|| Box::new(Wrapper::<T>::new())))
///         })
///     }
/// }
/// ```
pub trait Typed: Any {
    /// A static accessor to compile-time type information.
    fn type_info() -> &'static TypeInfo;
}

// -----------------------------------------------------------------------------
// NonGenericTypeInfoCell

/// Container for static storage of non-generic type information.
///
/// Internally an [`OnceLock`], almost no additional expenses.
pub struct NonGenericTypeInfoCell(OnceLock<TypeInfo>);

impl NonGenericTypeInfoCell {
    /// Create a empty cell.
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the stored info, generating it on first access.
    #[inline]
    pub fn get_or_init<F>(&self, f: F) -> &TypeInfo
    where
        F: FnOnce() -> TypeInfo,
    {
        self.0.get_or_init(f)
    }
}

impl Default for NonGenericTypeInfoCell {
    fn default() -> Self {
        Self::new()
    }
}

// -----------------------------------------------------------------------------
// GenericTypeInfoCell

/// Container for static storage of type information with generics.
///
/// The `static CELL` inside a generic `type_info` body is shared by every
/// instantiation, so the interior is a per-`TypeId` table behind a lock.
/// A plain vector keeps `new` const; cells hold a handful of entries.
pub struct GenericTypeInfoCell(RwLock<Vec<(TypeId, &'static TypeInfo)>>);

impl GenericTypeInfoCell {
    /// Create a empty cell.
    #[inline]
    pub const fn new() -> Self {
        Self(RwLock::new(Vec::new()))
    }

    /// Returns the info for the instantiation `G`, generating it on first
    /// access.
    #[inline(always)]
    pub fn get_or_insert<G: Any + ?Sized>(&self, f: impl FnOnce() -> TypeInfo) -> &TypeInfo {
        // Separate to reduce code compilation times
        self.get_or_insert_by_type_id(TypeId::of::<G>(), f)
    }

    #[inline(never)]
    fn get_or_insert_by_type_id(&self, type_id: TypeId, f: impl FnOnce() -> TypeInfo) -> &TypeInfo {
        match self.get_by_type_id(type_id) {
            Some(info) => info,
            None => self.insert_by_type_id(type_id, f()),
        }
    }

    #[inline(never)]
    fn get_by_type_id(&self, type_id: TypeId) -> Option<&'static TypeInfo> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(id, _)| *id == type_id)
            .map(|(_, info)| *info)
    }

    #[inline(never)]
    fn insert_by_type_id(&self, type_id: TypeId, value: TypeInfo) -> &'static TypeInfo {
        let mut table = self.0.write().unwrap_or_else(PoisonError::into_inner);
        // Racing initializers both build the value; first write wins.
        if let Some((_, info)) = table.iter().find(|(id, _)| *id == type_id) {
            return info;
        }
        let leaked: &'static TypeInfo = Box::leak(Box::new(value));
        table.push((type_id, leaked));
        leaked
    }
}

impl Default for GenericTypeInfoCell {
    fn default() -> Self {
        Self::new()
    }
}
