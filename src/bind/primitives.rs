use std::any::TypeId;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::info::TypeInfo;
use crate::json::{JsonNumber, JsonReader, JsonWriter, Token};
use crate::reflection::Reflect;
use crate::registry::{Converter, ConverterFactory, ReadContext, Resolver, WriteContext};

// -----------------------------------------------------------------------------
// PrimitiveFactory

/// Binds the scalar types: booleans, all integer widths, floats, `char`,
/// and `String`.
pub struct PrimitiveFactory;

impl ConverterFactory for PrimitiveFactory {
    fn create(
        &self,
        _resolver: &Resolver<'_>,
        info: &'static TypeInfo,
    ) -> Result<Option<Arc<dyn Converter>>> {
        macro_rules! claim {
            ($ty:ty => $conv:expr) => {
                if info.ty_id() == TypeId::of::<$ty>() {
                    return Ok(Some(Arc::new($conv)));
                }
            };
        }
        claim!(bool => BoolConverter);
        claim!(i8 => I8Converter);
        claim!(i16 => I16Converter);
        claim!(i32 => I32Converter);
        claim!(i64 => I64Converter);
        claim!(i128 => I128Converter);
        claim!(isize => IsizeConverter);
        claim!(u8 => U8Converter);
        claim!(u16 => U16Converter);
        claim!(u32 => U32Converter);
        claim!(u64 => U64Converter);
        claim!(u128 => U128Converter);
        claim!(usize => UsizeConverter);
        claim!(f32 => F32Converter);
        claim!(f64 => F64Converter);
        claim!(char => CharConverter);
        claim!(String => StringConverter);
        Ok(None)
    }
}

fn read_null(reader: &mut JsonReader<'_>) -> Result<bool> {
    if reader.peek()? == Token::Null {
        reader.next_null()?;
        return Ok(true);
    }
    Ok(false)
}

fn wrong_type(expected: &'static str, value: &dyn Reflect) -> Error {
    Error::mismatch(expected, value.reflect_type_info().type_path())
}

// -----------------------------------------------------------------------------
// Integers

macro_rules! int_converter {
    ($name:ident, $ty:ty) => {
        struct $name;

        impl Converter for $name {
            fn read(
                &self,
                reader: &mut JsonReader<'_>,
                _ctx: &mut ReadContext<'_>,
            ) -> Result<Option<Box<dyn Reflect>>> {
                if read_null(reader)? {
                    return Ok(None);
                }
                let value: $ty = match reader.next_number()? {
                    JsonNumber::Int(i) => <$ty>::try_from(i).map_err(|_| {
                        Error::mismatch(stringify!($ty), format!("out-of-range number {i}"))
                    })?,
                    JsonNumber::Float(f) => {
                        if f.fract() == 0.0
                            && f >= <$ty>::MIN as f64
                            && f <= <$ty>::MAX as f64
                        {
                            f as $ty
                        } else {
                            return Err(Error::mismatch(
                                stringify!($ty),
                                format!("non-integral number {f}"),
                            ));
                        }
                    }
                };
                Ok(Some(Box::new(value)))
            }

            fn write(
                &self,
                value: &dyn Reflect,
                writer: &mut JsonWriter,
                _ctx: &mut WriteContext<'_>,
            ) -> Result<()> {
                let v = value
                    .downcast_ref::<$ty>()
                    .ok_or_else(|| wrong_type(stringify!($ty), value))?;
                match i64::try_from(*v) {
                    Ok(i) => writer.int_value(i),
                    // Wider than i64 still renders as a plain JSON number.
                    Err(_) => writer.raw_value(&v.to_string()),
                }
            }
        }
    };
}

int_converter!(I8Converter, i8);
int_converter!(I16Converter, i16);
int_converter!(I32Converter, i32);
int_converter!(I64Converter, i64);
int_converter!(I128Converter, i128);
int_converter!(IsizeConverter, isize);
int_converter!(U8Converter, u8);
int_converter!(U16Converter, u16);
int_converter!(U32Converter, u32);
int_converter!(U64Converter, u64);
int_converter!(U128Converter, u128);
int_converter!(UsizeConverter, usize);

// -----------------------------------------------------------------------------
// Floats

macro_rules! float_converter {
    ($name:ident, $ty:ty) => {
        struct $name;

        impl Converter for $name {
            fn read(
                &self,
                reader: &mut JsonReader<'_>,
                _ctx: &mut ReadContext<'_>,
            ) -> Result<Option<Box<dyn Reflect>>> {
                if read_null(reader)? {
                    return Ok(None);
                }
                let value = reader.next_number()?.as_f64() as $ty;
                Ok(Some(Box::new(value)))
            }

            fn write(
                &self,
                value: &dyn Reflect,
                writer: &mut JsonWriter,
                _ctx: &mut WriteContext<'_>,
            ) -> Result<()> {
                let v = value
                    .downcast_ref::<$ty>()
                    .ok_or_else(|| wrong_type(stringify!($ty), value))?;
                writer.float_value(*v as f64)
            }
        }
    };
}

float_converter!(F32Converter, f32);
float_converter!(F64Converter, f64);

// -----------------------------------------------------------------------------
// Bool, char, String

struct BoolConverter;

impl Converter for BoolConverter {
    fn read(
        &self,
        reader: &mut JsonReader<'_>,
        _ctx: &mut ReadContext<'_>,
    ) -> Result<Option<Box<dyn Reflect>>> {
        if read_null(reader)? {
            return Ok(None);
        }
        // Tolerate quoted booleans the way numbers tolerate quoting.
        if reader.peek()? == Token::Str {
            let s = reader.next_str()?;
            return match s.as_ref() {
                "true" => Ok(Some(Box::new(true))),
                "false" => Ok(Some(Box::new(false))),
                other => Err(Error::mismatch("bool", format!("string `{other}`"))),
            };
        }
        Ok(Some(Box::new(reader.next_bool()?)))
    }

    fn write(
        &self,
        value: &dyn Reflect,
        writer: &mut JsonWriter,
        _ctx: &mut WriteContext<'_>,
    ) -> Result<()> {
        let v = value
            .downcast_ref::<bool>()
            .ok_or_else(|| wrong_type("bool", value))?;
        writer.bool_value(*v)
    }
}

struct CharConverter;

impl Converter for CharConverter {
    fn read(
        &self,
        reader: &mut JsonReader<'_>,
        _ctx: &mut ReadContext<'_>,
    ) -> Result<Option<Box<dyn Reflect>>> {
        if read_null(reader)? {
            return Ok(None);
        }
        let s = reader.next_str()?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Some(Box::new(c))),
            _ => Err(Error::mismatch("char", format!("string `{s}`"))),
        }
    }

    fn write(
        &self,
        value: &dyn Reflect,
        writer: &mut JsonWriter,
        _ctx: &mut WriteContext<'_>,
    ) -> Result<()> {
        let v = value
            .downcast_ref::<char>()
            .ok_or_else(|| wrong_type("char", value))?;
        let mut buf = [0u8; 4];
        writer.str_value(v.encode_utf8(&mut buf))
    }
}

struct StringConverter;

impl Converter for StringConverter {
    fn read(
        &self,
        reader: &mut JsonReader<'_>,
        _ctx: &mut ReadContext<'_>,
    ) -> Result<Option<Box<dyn Reflect>>> {
        if read_null(reader)? {
            return Ok(None);
        }
        // next_str already renders numbers and booleans as text.
        let s = reader.next_str()?;
        Ok(Some(Box::new(s.into_owned())))
    }

    fn write(
        &self,
        value: &dyn Reflect,
        writer: &mut JsonWriter,
        _ctx: &mut WriteContext<'_>,
    ) -> Result<()> {
        let v = value
            .downcast_ref::<String>()
            .ok_or_else(|| wrong_type("String", value))?;
        writer.str_value(v)
    }
}
