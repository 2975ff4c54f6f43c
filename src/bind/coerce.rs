use std::any::TypeId;

use crate::error::{Error, Result};
use crate::info::TypeInfo;
use crate::json::JsonReader;
use crate::ops::{DynamicList, DynamicMap, DynamicStruct, Map, ReflectMut};
use crate::reflection::{AnyValue, Reflect};
use crate::registry::ReadContext;

/// Reconciles a loosely-typed value with a declared target type.
///
/// Tried in order: exact type, numeric cross-casts (including byte
/// narrowing), string round-trip through the target's text forms,
/// number-to-string, dynamic-map-to-declared-map, element-wise list and
/// set coercion with single-element unwrap. The first step that produces
/// the target type wins; exhaustion is a type mismatch.
pub(crate) fn coerce_value(
    value: Box<dyn Reflect>,
    target: &'static TypeInfo,
    ctx: &mut ReadContext<'_>,
) -> Result<Box<dyn Reflect>> {
    // Unwrap the polymorphic envelope first.
    let value = match value.downcast::<AnyValue>() {
        Ok(mut any) => match any.take_inner() {
            Some(inner) => inner,
            None => return Err(Error::mismatch(target.type_path(), "empty value")),
        },
        Err(value) => value,
    };

    if value.ty_id() == target.ty_id() {
        return Ok(value);
    }

    // Anything fits an `AnyValue` slot; re-wrap and stop.
    if target.ty_id() == TypeId::of::<AnyValue>() {
        return Ok(Box::new(AnyValue::from_boxed(value)));
    }

    // Optionals coerce through their inner type.
    if let Some(optional) = target.as_optional() {
        let inner = coerce_value(value, optional.inner(), ctx)?;
        let mut slot = optional.make_none();
        let ReflectMut::Optional(opt) = slot.reflect_mut() else {
            return Err(Error::mismatch(target.type_path(), "non-optional instance"));
        };
        opt.set_inner(inner)
            .map_err(|v| mismatch_to(target, v.as_ref()))?;
        return Ok(slot);
    }

    if let Some(n) = extract_num(value.as_ref()) {
        if let Some(made) = make_numeric(target.ty_id(), n) {
            return Ok(made);
        }
        // A numeric value for a string slot renders as text.
        if target.ty_id() == TypeId::of::<String>() {
            return Ok(Box::new(render_num(n)));
        }
    }

    if let Some(s) = value.downcast_ref::<String>() {
        if let Some(parsed) = target.from_text(s) {
            return Ok(parsed);
        }
        // Round-trip through the target's converter; the reader's quoted
        // number tolerance does the rest.
        let mut quoted = crate::json::JsonWriter::new();
        quoted.str_value(s)?;
        let quoted = quoted.into_string();
        let mut reader = JsonReader::new(&quoted);
        let converter = ctx.engine().converter_for_info(target)?;
        if let Ok(Some(v)) = converter.read(&mut reader, ctx) {
            if v.ty_id() == target.ty_id() {
                return Ok(v);
            }
        }
        return Err(Error::mismatch(target.type_path(), format!("string `{s}`")));
    }

    if value.as_ref().is::<DynamicStruct>() || value.as_ref().is::<DynamicMap>() {
        if let Some(map_info) = target.as_map() {
            return coerce_into_map(value, target, map_info.key(), map_info.value(), ctx);
        }
    }

    if value.as_ref().is::<DynamicList>() {
        return coerce_list(value, target, ctx);
    }

    Err(mismatch_to(target, value.as_ref()))
}

// -----------------------------------------------------------------------------
// Numerics

#[derive(Clone, Copy)]
enum Num {
    I(i128),
    F(f64),
}

fn extract_num(value: &dyn Reflect) -> Option<Num> {
    macro_rules! try_int {
        ($($ty:ty),*) => {
            $(if let Some(v) = value.downcast_ref::<$ty>() {
                return Some(Num::I(*v as i128));
            })*
        };
    }
    try_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
    if let Some(v) = value.downcast_ref::<i128>() {
        return Some(Num::I(*v));
    }
    if let Some(v) = value.downcast_ref::<u128>() {
        return i128::try_from(*v).ok().map(Num::I);
    }
    if let Some(v) = value.downcast_ref::<f32>() {
        return Some(Num::F(*v as f64));
    }
    if let Some(v) = value.downcast_ref::<f64>() {
        return Some(Num::F(*v));
    }
    None
}

fn make_numeric(target: TypeId, n: Num) -> Option<Box<dyn Reflect>> {
    macro_rules! cast_int {
        ($($ty:ty),*) => {
            $(if target == TypeId::of::<$ty>() {
                return match n {
                    Num::I(i) => <$ty>::try_from(i).ok().map(|v| Box::new(v) as Box<dyn Reflect>),
                    Num::F(f) => {
                        if f.fract() == 0.0
                            && f >= <$ty>::MIN as f64
                            && f <= <$ty>::MAX as f64
                        {
                            Some(Box::new(f as $ty) as Box<dyn Reflect>)
                        } else {
                            None
                        }
                    }
                };
            })*
        };
    }
    cast_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
    if target == TypeId::of::<f32>() {
        return Some(Box::new(match n {
            Num::I(i) => i as f32,
            Num::F(f) => f as f32,
        }));
    }
    if target == TypeId::of::<f64>() {
        return Some(Box::new(match n {
            Num::I(i) => i as f64,
            Num::F(f) => f,
        }));
    }
    None
}

fn render_num(n: Num) -> String {
    match n {
        Num::I(i) => i.to_string(),
        Num::F(f) => f.to_string(),
    }
}

// -----------------------------------------------------------------------------
// Containers

fn coerce_into_map(
    value: Box<dyn Reflect>,
    target: &'static TypeInfo,
    key_info: &'static TypeInfo,
    value_info: &'static TypeInfo,
    ctx: &mut ReadContext<'_>,
) -> Result<Box<dyn Reflect>> {
    let entries: Vec<(Box<dyn Reflect>, Box<dyn Reflect>)> = match value.downcast::<DynamicStruct>()
    {
        Ok(s) => s
            .into_fields()
            .into_iter()
            .map(|(name, v)| (Box::new(name) as Box<dyn Reflect>, v))
            .collect(),
        Err(value) => match value.downcast::<DynamicMap>() {
            Ok(m) => m.into_entries(),
            Err(value) => return Err(mismatch_to(target, value.as_ref())),
        },
    };

    let mut boxed = make_instance(target)?;
    for (key, val) in entries {
        let key = coerce_value(key, key_info, ctx)?;
        let val = coerce_value(val, value_info, ctx)?;
        let ReflectMut::Map(map) = boxed.reflect_mut() else {
            return Err(Error::mismatch(target.type_path(), "non-map instance"));
        };
        map.insert_boxed(key, val)
            .map_err(|(k, _)| mismatch_to(target, k.as_ref()))?;
    }
    Ok(boxed)
}

fn coerce_list(
    value: Box<dyn Reflect>,
    target: &'static TypeInfo,
    ctx: &mut ReadContext<'_>,
) -> Result<Box<dyn Reflect>> {
    let list = match value.downcast::<DynamicList>() {
        Ok(l) => *l,
        Err(value) => return Err(mismatch_to(target, value.as_ref())),
    };

    if let Some(info) = target.as_list() {
        let mut boxed = make_instance(target)?;
        for item in list.into_values() {
            let item = coerce_value(item, info.item(), ctx)?;
            let ReflectMut::List(out) = boxed.reflect_mut() else {
                return Err(Error::mismatch(target.type_path(), "non-list instance"));
            };
            out.push_boxed(item)
                .map_err(|v| mismatch_to(target, v.as_ref()))?;
        }
        return Ok(boxed);
    }
    if let Some(info) = target.as_set() {
        let mut boxed = make_instance(target)?;
        for item in list.into_values() {
            let item = coerce_value(item, info.item(), ctx)?;
            let ReflectMut::Set(out) = boxed.reflect_mut() else {
                return Err(Error::mismatch(target.type_path(), "non-set instance"));
            };
            out.insert_boxed(item)
                .map_err(|v| mismatch_to(target, v.as_ref()))?;
        }
        return Ok(boxed);
    }

    // A one-element array unwraps into a scalar slot.
    let mut values = list.into_values();
    if values.len() == 1 {
        if let Some(single) = values.pop() {
            return coerce_value(single, target, ctx);
        }
    }
    Err(Error::mismatch(
        target.type_path(),
        format!("array of {} elements", values.len()),
    ))
}

// -----------------------------------------------------------------------------
// Helpers

fn make_instance(info: &'static TypeInfo) -> Result<Box<dyn Reflect>> {
    info.make_default().ok_or_else(|| Error::NoConstructor {
        type_path: info.type_path().into(),
        reason: "type has no default constructor".into(),
    })
}

fn mismatch_to(target: &'static TypeInfo, value: &dyn Reflect) -> Error {
    Error::mismatch(
        target.type_path(),
        value.reflect_type_info().type_path().to_owned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Refson;
    use crate::info::Typed;
    use crate::registry::ReadContext;

    fn with_ctx<R>(f: impl FnOnce(&mut ReadContext<'_>) -> R) -> R {
        let engine = Refson::new();
        let mut ctx = ReadContext::new(&engine);
        f(&mut ctx)
    }

    #[test]
    fn widening_and_narrowing_casts() {
        with_ctx(|ctx| {
            let v = coerce_value(Box::new(42_i64), u8::type_info(), ctx).unwrap();
            assert_eq!(v.take::<u8>().ok(), Some(42));

            let v = coerce_value(Box::new(7_u8), i64::type_info(), ctx).unwrap();
            assert_eq!(v.take::<i64>().ok(), Some(7));

            assert!(coerce_value(Box::new(300_i64), u8::type_info(), ctx).is_err());
        });
    }

    #[test]
    fn string_to_number_round_trip() {
        with_ctx(|ctx| {
            let v = coerce_value(Box::new("42".to_owned()), i32::type_info(), ctx).unwrap();
            assert_eq!(v.take::<i32>().ok(), Some(42));
        });
    }

    #[test]
    fn number_to_string() {
        with_ctx(|ctx| {
            let v = coerce_value(Box::new(5_i64), String::type_info(), ctx).unwrap();
            assert_eq!(v.take::<String>().ok().as_deref(), Some("5"));
        });
    }

    #[test]
    fn single_element_unwrap() {
        with_ctx(|ctx| {
            let mut list = DynamicList::new();
            list.push(9_i64);
            let v = coerce_value(Box::new(list), i32::type_info(), ctx).unwrap();
            assert_eq!(v.take::<i32>().ok(), Some(9));
        });
    }

    #[test]
    fn dynamic_struct_into_map() {
        use std::collections::HashMap;
        with_ctx(|ctx| {
            let mut s = DynamicStruct::new();
            s.insert("a", 1_i64);
            s.insert("b", 2_i64);
            let v = coerce_value(Box::new(s), HashMap::<String, i32>::type_info(), ctx).unwrap();
            let map = v.take::<HashMap<String, i32>>().unwrap();
            assert_eq!(map.get("a"), Some(&1));
            assert_eq!(map.get("b"), Some(&2));
        });
    }
}
