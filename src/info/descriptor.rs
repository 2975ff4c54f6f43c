use std::any::{Any, TypeId};

// -----------------------------------------------------------------------------
// TypeDescriptor

/// The identity of a convertible type: its [`TypeId`] plus its stable
/// textual path.
///
/// The path, not the `TypeId`, is what appears in class tags, so it must
/// stay stable across builds. Derived types get their declaration path;
/// standard types get whatever `core::any::type_name` reports.
#[derive(Clone, Copy, Debug)]
pub struct TypeDescriptor {
    id: TypeId,
    path: &'static str,
}

impl TypeDescriptor {
    /// Builds a descriptor with an explicit path, as the derive does.
    #[inline]
    pub const fn new(id: TypeId, path: &'static str) -> Self {
        Self { id, path }
    }

    /// Builds a descriptor from the compiler-reported type name.
    #[inline]
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: core::any::type_name::<T>(),
        }
    }

    #[inline]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// The full path, e.g. `my_app::model::Customer`.
    #[inline]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// The path with leading modules stripped, e.g. `Customer`.
    ///
    /// Module segments inside generic arguments are kept as-is; short
    /// names only matter for non-generic tagged types.
    #[inline]
    pub fn name(&self) -> &'static str {
        short_name(self.path)
    }

    /// Check if the given type matches this one.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeDescriptor {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

impl core::hash::Hash for TypeDescriptor {
    #[inline]
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// The last `::`-separated segment outside any generic brackets.
fn short_name(path: &'static str) -> &'static str {
    let mut depth = 0usize;
    let mut start = 0usize;
    let bytes = path.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' | b'(' | b'[' => depth += 1,
            b'>' | b')' | b']' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                start = i + 2;
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    &path[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names() {
        assert_eq!(short_name("u32"), "u32");
        assert_eq!(short_name("my_app::model::Customer"), "Customer");
        assert_eq!(
            short_name("alloc::vec::Vec<my_app::model::Customer>"),
            "Vec<my_app::model::Customer>"
        );
    }

    #[test]
    fn identity_is_the_type_id() {
        let a = TypeDescriptor::of::<u32>();
        let b = TypeDescriptor::new(TypeId::of::<u32>(), "elsewhere::u32");
        assert_eq!(a, b);
    }
}
