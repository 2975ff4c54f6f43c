use std::sync::Arc;

use crate::error::{Error, Result};
use crate::info::TypeInfo;
use crate::reflection::Reflect;

/// A user-registered instance creator, stored per target type id.
pub(crate) type CreateFn = dyn Fn() -> Box<dyn Reflect> + Send + Sync;

/// The construction strategy for one type, decided once when its
/// converter is built and reused for every instance.
///
/// The decision order: a registered instance creator wins over whatever
/// the type provides; otherwise the type's own default hook is used. A
/// type with neither cannot be instantiated reflectively and reading it
/// fails with a configuration error, not a panic.
pub enum ObjectCreator {
    Custom(Arc<CreateFn>),
    Default(&'static TypeInfo),
}

impl ObjectCreator {
    /// Picks the strategy for `info` given an optional registered creator.
    pub(crate) fn select(info: &'static TypeInfo, custom: Option<Arc<CreateFn>>) -> Result<Self> {
        if let Some(create) = custom {
            return Ok(ObjectCreator::Custom(create));
        }
        if info.has_default() {
            return Ok(ObjectCreator::Default(info));
        }
        Err(Error::NoConstructor {
            type_path: info.type_path().into(),
            reason: "type has no default constructor".into(),
        })
    }

    /// Creates a fresh, blank instance.
    pub fn create(&self) -> Result<Box<dyn Reflect>> {
        match self {
            ObjectCreator::Custom(create) => Ok(create()),
            ObjectCreator::Default(info) => {
                info.make_default().ok_or_else(|| Error::NoConstructor {
                    type_path: info.type_path().into(),
                    reason: "type has no default constructor".into(),
                })
            }
        }
    }
}
