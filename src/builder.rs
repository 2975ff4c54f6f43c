use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::bind::{
    AnyValueFactory, ContainerFactory, ExclusionFactory, OptionFactory, PrimitiveFactory,
    ReflectiveFactory, SharedFactory,
};
use crate::engine::{EngineParts, NamingPolicy, Refson, UnknownTagPolicy};
use crate::error::Result;
use crate::graph::LoopPolicy;
use crate::info::{TypeInfo, Typed};
use crate::reflection::Reflect;
use crate::registry::{Converter, ConverterFactory, CreateFn, Resolver, TypeDirectory};

// -----------------------------------------------------------------------------
// RefsonBuilder

/// Configures and assembles a [`Refson`] engine.
///
/// ```
/// use refson::{LoopPolicy, Refson};
///
/// let refson = Refson::builder()
///     .class_property("@class")
///     .loop_policy(LoopPolicy::IdTagging)
///     .build();
/// ```
pub struct RefsonBuilder {
    directory: TypeDirectory,
    user_factories: Vec<Arc<dyn ConverterFactory>>,
    creators: HashMap<TypeId, Arc<CreateFn>>,
    exclusions: HashSet<TypeId>,
    class_property: Option<String>,
    loop_policy: LoopPolicy,
    naming_policy: NamingPolicy,
    version: Option<f64>,
    unknown_tags: UnknownTagPolicy,
    serialize_nulls: bool,
    html_safe: bool,
    lenient: bool,
    indent: Option<String>,
    auto_register: bool,
}

impl Default for RefsonBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RefsonBuilder {
    pub fn new() -> Self {
        Self {
            directory: TypeDirectory::new(),
            user_factories: Vec::new(),
            creators: HashMap::new(),
            exclusions: HashSet::new(),
            class_property: None,
            loop_policy: LoopPolicy::default(),
            naming_policy: NamingPolicy::default(),
            version: None,
            unknown_tags: UnknownTagPolicy::default(),
            serialize_nulls: false,
            html_safe: false,
            lenient: false,
            indent: None,
            auto_register: true,
        }
    }

    // -- type registration ----------------------------------------------------

    /// Registers `T` (and, recursively, its field and item types) so its
    /// class tag resolves on read and writes as the short name.
    pub fn register<T: Typed>(mut self) -> Self {
        self.directory.register::<T>();
        self
    }

    /// Registers an extra tag spelling for `T`, e.g. the name a renamed
    /// type used to carry.
    pub fn add_alias<T: Typed>(mut self, alias: impl Into<String>) -> Self {
        self.directory.add_alias::<T>(alias);
        self
    }

    /// Whether `#[reflect(auto_register)]` submissions populate the
    /// directory at build time. On by default.
    pub fn auto_register(mut self, enabled: bool) -> Self {
        self.auto_register = enabled;
        self
    }

    // -- converters -----------------------------------------------------------

    /// Installs a converter for exactly the type `T`.
    ///
    /// User converters are consulted before the built-in bindings but
    /// after the framework's own catch-alls, in registration order.
    pub fn register_converter<T: Typed>(mut self, converter: impl Converter + 'static) -> Self {
        self.directory.register::<T>();
        self.user_factories.push(Arc::new(SingleTypeFactory {
            ty_id: TypeId::of::<T>(),
            converter: Arc::new(converter),
        }));
        self
    }

    /// Installs a converter factory, consulted for every unresolved type.
    pub fn register_factory(mut self, factory: impl ConverterFactory + 'static) -> Self {
        self.user_factories.push(Arc::new(factory));
        self
    }

    /// Installs a construction function for `T`, used by the reflective
    /// mapper instead of the type's default constructor.
    pub fn register_creator<T: Reflect>(
        mut self,
        create: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        self.creators
            .insert(TypeId::of::<T>(), Arc::new(move || Box::new(create())));
        self
    }

    /// Excludes `T` entirely: written as null (dropped unless nulls are
    /// serialized), skipped on read.
    pub fn exclude<T: Typed>(mut self) -> Self {
        self.exclusions.insert(TypeId::of::<T>());
        self
    }

    // -- behavior -------------------------------------------------------------

    /// Enables polymorphic class tags under the given property name,
    /// conventionally `"@class"`.
    pub fn class_property(mut self, property: impl Into<String>) -> Self {
        self.class_property = Some(property.into());
        self
    }

    /// How shared objects and cycles are treated. Defaults to
    /// [`LoopPolicy::NoChecks`].
    pub fn loop_policy(mut self, policy: LoopPolicy) -> Self {
        self.loop_policy = policy;
        self
    }

    /// How field names are spelled in documents. Defaults to
    /// [`NamingPolicy::Identity`].
    pub fn naming_policy(mut self, policy: NamingPolicy) -> Self {
        self.naming_policy = policy;
        self
    }

    /// Activates `since`/`until` field gating against this version.
    pub fn version(mut self, version: f64) -> Self {
        self.version = Some(version);
        self
    }

    /// What to do with unresolvable class tags. Defaults to
    /// [`UnknownTagPolicy::Fail`].
    pub fn unknown_tag_policy(mut self, policy: UnknownTagPolicy) -> Self {
        self.unknown_tags = policy;
        self
    }

    /// Emits `null` for absent values instead of dropping the property.
    pub fn serialize_nulls(mut self) -> Self {
        self.serialize_nulls = true;
        self
    }

    /// Escapes `<`, `>`, `&`, `=`, and `'` in strings for embedding in
    /// HTML and XML.
    pub fn html_safe(mut self) -> Self {
        self.html_safe = true;
        self
    }

    /// Accepts technically-invalid JSON: NaN and infinities, unquoted
    /// names, single quotes, trailing commas.
    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    /// Pretty-prints output with the given indent string.
    pub fn pretty(mut self, indent: impl Into<String>) -> Self {
        self.indent = Some(indent.into());
        self
    }

    // -- assembly -------------------------------------------------------------

    /// Builds the engine.
    ///
    /// The factory chain is fixed here: the framework catch-all and the
    /// exclusion check first, then user factories in registration order,
    /// then the built-in bindings with the reflective mapper last.
    pub fn build(mut self) -> Refson {
        if self.auto_register {
            self.directory.auto_register();
        }

        let mut factories: Vec<Arc<dyn ConverterFactory>> =
            vec![Arc::new(AnyValueFactory), Arc::new(ExclusionFactory)];
        factories.extend(self.user_factories);
        factories.push(Arc::new(PrimitiveFactory));
        factories.push(Arc::new(OptionFactory));
        factories.push(Arc::new(SharedFactory));
        factories.push(Arc::new(ContainerFactory));
        factories.push(Arc::new(ReflectiveFactory));

        Refson::assemble(EngineParts {
            factories,
            creators: self.creators,
            exclusions: self.exclusions,
            directory: self.directory,
            class_property: self.class_property,
            loop_policy: self.loop_policy,
            naming_policy: self.naming_policy,
            version: self.version,
            unknown_tags: self.unknown_tags,
            serialize_nulls: self.serialize_nulls,
            html_safe: self.html_safe,
            lenient: self.lenient,
            indent: self.indent,
        })
    }
}

// -----------------------------------------------------------------------------
// SingleTypeFactory

/// Wraps a user converter registered for one concrete type.
struct SingleTypeFactory {
    ty_id: TypeId,
    converter: Arc<dyn Converter>,
}

impl ConverterFactory for SingleTypeFactory {
    fn create(
        &self,
        _resolver: &Resolver<'_>,
        info: &'static TypeInfo,
    ) -> Result<Option<Arc<dyn Converter>>> {
        Ok((info.ty_id() == self.ty_id).then(|| Arc::clone(&self.converter)))
    }
}
