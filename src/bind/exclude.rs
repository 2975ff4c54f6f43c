use std::sync::Arc;

use crate::error::Result;
use crate::info::TypeInfo;
use crate::json::{JsonReader, JsonWriter};
use crate::reflection::Reflect;
use crate::registry::{Converter, ConverterFactory, ReadContext, Resolver, WriteContext};

/// Claims every type on the engine's exclusion list, before any factory
/// that could bind it for real.
pub struct ExclusionFactory;

impl ConverterFactory for ExclusionFactory {
    fn create(
        &self,
        resolver: &Resolver<'_>,
        info: &'static TypeInfo,
    ) -> Result<Option<Arc<dyn Converter>>> {
        if resolver.engine().is_excluded(info.ty_id()) {
            Ok(Some(Arc::new(ExcludedConverter)))
        } else {
            Ok(None)
        }
    }
}

/// Skips the document value on read and writes null, which under default
/// null suppression means the property vanishes entirely.
struct ExcludedConverter;

impl Converter for ExcludedConverter {
    fn read(
        &self,
        reader: &mut JsonReader<'_>,
        _ctx: &mut ReadContext<'_>,
    ) -> Result<Option<Box<dyn Reflect>>> {
        reader.skip_value()?;
        Ok(None)
    }

    fn write(
        &self,
        _value: &dyn Reflect,
        writer: &mut JsonWriter,
        _ctx: &mut WriteContext<'_>,
    ) -> Result<()> {
        writer.null_value()
    }
}
