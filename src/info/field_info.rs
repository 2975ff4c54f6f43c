use std::any::{Any, TypeId};

use crate::info::{TypeInfo, Typed};

// -----------------------------------------------------------------------------
// NamedField

/// Information for one named struct field.
///
/// Beyond the name and type, a field carries its document-facing
/// overrides: an optional rename, a skip flag, and an optional version
/// window (`since`/`until`) checked against the engine's configured
/// version when exclusion is enabled.
#[derive(Clone, Debug)]
pub struct NamedField {
    ty_id: TypeId,
    name: &'static str,
    rename: Option<&'static str>,
    skip: bool,
    since: Option<f64>,
    until: Option<f64>,
    // `TypeInfo` is created on first access; using a function pointer delays it.
    type_info: fn() -> &'static TypeInfo,
}

impl NamedField {
    /// Creates a new [`NamedField`] for the given field `name` and type `T`.
    #[inline]
    pub const fn new<T: Typed>(name: &'static str) -> Self {
        Self {
            name,
            rename: None,
            skip: false,
            since: None,
            until: None,
            type_info: T::type_info,
            ty_id: TypeId::of::<T>(),
        }
    }

    /// Overrides the document property name.
    #[inline]
    pub const fn with_rename(mut self, rename: &'static str) -> Self {
        self.rename = Some(rename);
        self
    }

    /// Excludes the field from both reading and writing.
    #[inline]
    pub const fn with_skip(mut self) -> Self {
        self.skip = true;
        self
    }

    /// First engine version that includes this field.
    #[inline]
    pub const fn with_since(mut self, version: f64) -> Self {
        self.since = Some(version);
        self
    }

    /// First engine version that no longer includes this field.
    #[inline]
    pub const fn with_until(mut self, version: f64) -> Self {
        self.until = Some(version);
        self
    }

    /// Returns the `TypeId` of the field's type.
    #[inline]
    pub const fn ty_id(&self) -> TypeId {
        self.ty_id
    }

    /// Check if the given type matches this one.
    #[inline]
    pub fn type_is<T: Any>(&self) -> bool {
        self.ty_id == TypeId::of::<T>()
    }

    /// Returns the Rust field name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the explicit rename, if one was declared.
    #[inline]
    pub const fn rename(&self) -> Option<&'static str> {
        self.rename
    }

    /// Returns the name as it appears in documents.
    #[inline]
    pub const fn serialized_name(&self) -> &'static str {
        match self.rename {
            Some(r) => r,
            None => self.name,
        }
    }

    #[inline]
    pub const fn is_skipped(&self) -> bool {
        self.skip
    }

    #[inline]
    pub const fn since(&self) -> Option<f64> {
        self.since
    }

    #[inline]
    pub const fn until(&self) -> Option<f64> {
        self.until
    }

    /// Whether the field participates at the given engine version.
    pub fn in_version(&self, version: Option<f64>) -> bool {
        let Some(v) = version else {
            return true;
        };
        if let Some(since) = self.since {
            if v < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if v >= until {
                return false;
            }
        }
        true
    }

    /// Returns the field's [`TypeInfo`].
    #[inline]
    pub fn type_info(&self) -> &'static TypeInfo {
        (self.type_info)()
    }
}
