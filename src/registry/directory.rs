use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::info::{TypeInfo, Typed};

// -----------------------------------------------------------------------------
// TypeDirectory

/// The central store of registered types.
///
/// Registering a type indexes its [`TypeInfo`] by [`TypeId`], full path,
/// and short name, and recursively registers its field and item types.
/// Class tags resolve through this directory: alias map first, then full
/// path, then short name. A short name claimed by two registered types
/// becomes ambiguous and stops resolving, like colliding type names in
/// any flat namespace.
pub struct TypeDirectory {
    infos: HashMap<TypeId, &'static TypeInfo>,
    path_to_id: HashMap<&'static str, TypeId>,
    name_to_id: HashMap<&'static str, TypeId>,
    ambiguous_names: HashSet<&'static str>,
    // Legacy tag spellings, e.g. from a renamed or relocated type.
    aliases: HashMap<String, TypeId>,
}

impl Default for TypeDirectory {
    /// See [`TypeDirectory::new`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeDirectory {
    /// Create an empty directory.
    pub fn empty() -> Self {
        Self {
            infos: HashMap::new(),
            path_to_id: HashMap::new(),
            name_to_id: HashMap::new(),
            ambiguous_names: HashSet::new(),
            aliases: HashMap::new(),
        }
    }

    /// Create a directory with the scalar types pre-registered.
    pub fn new() -> Self {
        let mut directory = Self::empty();
        directory.register::<bool>();
        directory.register::<char>();
        directory.register::<u8>();
        directory.register::<u16>();
        directory.register::<u32>();
        directory.register::<u64>();
        directory.register::<u128>();
        directory.register::<usize>();
        directory.register::<i8>();
        directory.register::<i16>();
        directory.register::<i32>();
        directory.register::<i64>();
        directory.register::<i128>();
        directory.register::<isize>();
        directory.register::<f32>();
        directory.register::<f64>();
        directory.register::<String>();
        directory
    }

    /// Registers `T` and, recursively, its field and item types.
    pub fn register<T: Typed>(&mut self) {
        self.register_info(T::type_info());
    }

    /// Registers a type by its [`TypeInfo`], recursively.
    pub fn register_info(&mut self, info: &'static TypeInfo) {
        let descriptor = info.descriptor();
        if self.infos.contains_key(&descriptor.id()) {
            return;
        }
        trace!(path = descriptor.path(), "registering type");
        self.infos.insert(descriptor.id(), info);
        self.path_to_id.insert(descriptor.path(), descriptor.id());

        let name = descriptor.name();
        if !self.ambiguous_names.contains(name) {
            if self.name_to_id.contains_key(name) {
                self.name_to_id.remove(name);
                self.ambiguous_names.insert(name);
            } else {
                self.name_to_id.insert(name, descriptor.id());
            }
        }

        // Insert before recursing so cyclic type graphs terminate.
        match info {
            TypeInfo::Struct(s) => {
                for field in s.iter() {
                    self.register_info(field.type_info());
                }
            }
            TypeInfo::List(l) => self.register_info(l.item()),
            TypeInfo::Map(m) => {
                self.register_info(m.key());
                self.register_info(m.value());
            }
            TypeInfo::Set(s) => self.register_info(s.item()),
            TypeInfo::Optional(o) => self.register_info(o.inner()),
            TypeInfo::Ref(r) => self.register_info(r.inner()),
            TypeInfo::Opaque(_) => {}
        }
    }

    /// Registers an extra tag spelling for `T`.
    pub fn add_alias<T: Typed>(&mut self, alias: impl Into<String>) {
        self.register::<T>();
        self.aliases.insert(alias.into(), TypeId::of::<T>());
    }

    /// Whether the type with the given [`TypeId`] has been registered.
    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.infos.contains_key(&type_id)
    }

    /// Returns the registered [`TypeInfo`] for the given [`TypeId`].
    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&'static TypeInfo> {
        self.infos.get(&type_id).copied()
    }

    /// Returns the registered type with the given full path.
    pub fn get_with_path(&self, path: &str) -> Option<&'static TypeInfo> {
        self.path_to_id.get(path).and_then(|id| self.get(*id))
    }

    /// Returns the registered type with the given short name.
    ///
    /// Returns `None` when the name is unknown or ambiguous.
    pub fn get_with_name(&self, name: &str) -> Option<&'static TypeInfo> {
        self.name_to_id.get(name).and_then(|id| self.get(*id))
    }

    /// Whether the given short name matches multiple registered types.
    pub fn is_ambiguous(&self, name: &str) -> bool {
        self.ambiguous_names.contains(name)
    }

    /// Resolves a class tag: alias map, then full path, then short name.
    pub fn resolve_tag(&self, tag: &str) -> Option<&'static TypeInfo> {
        if let Some(id) = self.aliases.get(tag) {
            return self.get(*id);
        }
        self.get_with_path(tag).or_else(|| self.get_with_name(tag))
    }

    /// Returns an iterator over the registered [`TypeInfo`]s.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &'static TypeInfo> + '_ {
        self.infos.values().copied()
    }

    /// Registers every type annotated `#[reflect(auto_register)]`.
    ///
    /// Repeated calls are cheap and will not insert duplicates. With the
    /// `auto_register` feature disabled this is a no-op.
    pub fn auto_register(&mut self) {
        #[cfg(feature = "auto_register")]
        for entry in inventory::iter::<AutoRegistration> {
            (entry.register)(self);
        }
    }
}

// -----------------------------------------------------------------------------
// AutoRegistration

/// One `#[reflect(auto_register)]` submission, collected via `inventory`.
#[cfg(feature = "auto_register")]
pub struct AutoRegistration {
    pub register: fn(&mut TypeDirectory),
}

#[cfg(feature = "auto_register")]
inventory::collect!(AutoRegistration);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_resolve_by_name() {
        let directory = TypeDirectory::new();
        let info = directory.resolve_tag("String").unwrap();
        assert!(info.descriptor().is::<String>());
    }

    #[test]
    fn aliases_win_over_names() {
        let mut directory = TypeDirectory::new();
        directory.add_alias::<i64>("String");
        let info = directory.resolve_tag("String").unwrap();
        assert!(info.descriptor().is::<i64>());
    }

    #[test]
    fn container_registration_is_recursive() {
        let mut directory = TypeDirectory::empty();
        directory.register::<Vec<HashMap<String, i32>>>();
        assert!(directory.contains(TypeId::of::<HashMap<String, i32>>()));
        assert!(directory.contains(TypeId::of::<String>()));
        assert!(directory.contains(TypeId::of::<i32>()));
    }
}
