use std::sync::Arc;

use refson::info::{TypeInfo, Typed};
use refson::json::{JsonReader, JsonWriter};
use refson::registry::{Converter, ConverterFactory, ReadContext, Resolver, WriteContext};
use refson::{Error, Reflect, Refson, Result};

#[derive(Reflect, Clone, Default, Debug, PartialEq)]
#[reflect(default)]
struct Celsius {
    degrees: f64,
}

/// Renders as `"12.5C"` instead of an object.
struct CelsiusConverter;

impl Converter for CelsiusConverter {
    fn read(
        &self,
        reader: &mut JsonReader<'_>,
        _ctx: &mut ReadContext<'_>,
    ) -> Result<Option<Box<dyn Reflect>>> {
        let text = reader.next_str()?;
        let degrees = text
            .trim_end_matches('C')
            .parse()
            .map_err(|_| Error::mismatch("Celsius", text.into_owned()))?;
        Ok(Some(Box::new(Celsius { degrees })))
    }

    fn write(
        &self,
        value: &dyn Reflect,
        writer: &mut JsonWriter,
        _ctx: &mut WriteContext<'_>,
    ) -> Result<()> {
        let celsius = value
            .downcast_ref::<Celsius>()
            .ok_or_else(|| Error::mismatch("Celsius", "other type"))?;
        writer.str_value(&format!("{}C", celsius.degrees))
    }
}

#[test]
fn registered_converters_replace_the_reflective_mapper() {
    let refson = Refson::builder()
        .register_converter::<Celsius>(CelsiusConverter)
        .build();
    let json = refson.to_string(&Celsius { degrees: 12.5 }).unwrap();
    assert_eq!(json, r#""12.5C""#);
    let back: Celsius = refson.from_str(&json).unwrap().unwrap();
    assert_eq!(back, Celsius { degrees: 12.5 });
}

#[test]
fn registered_converters_serve_nested_fields_too() {
    #[derive(Reflect, Clone, Default, Debug, PartialEq)]
    #[reflect(default)]
    struct Reading {
        at: String,
        temp: Celsius,
    }
    let refson = Refson::builder()
        .register_converter::<Celsius>(CelsiusConverter)
        .build();
    let value = Reading {
        at: "noon".into(),
        temp: Celsius { degrees: 31.0 },
    };
    let json = refson.to_string(&value).unwrap();
    assert_eq!(json, r#"{"at":"noon","temp":"31C"}"#);
    let back: Reading = refson.from_str(&json).unwrap().unwrap();
    assert_eq!(back, value);
}

// -----------------------------------------------------------------------------
// Factories

/// Claims `i32` ahead of the primitive bindings.
struct LoudInts;

impl ConverterFactory for LoudInts {
    fn create(
        &self,
        _resolver: &Resolver<'_>,
        info: &'static TypeInfo,
    ) -> Result<Option<Arc<dyn Converter>>> {
        if info.ty_id() != std::any::TypeId::of::<i32>() {
            return Ok(None);
        }
        Ok(Some(Arc::new(LoudIntConverter)))
    }
}

struct LoudIntConverter;

impl Converter for LoudIntConverter {
    fn read(
        &self,
        reader: &mut JsonReader<'_>,
        _ctx: &mut ReadContext<'_>,
    ) -> Result<Option<Box<dyn Reflect>>> {
        let text = reader.next_str()?;
        let n = text
            .trim_start_matches("int:")
            .parse::<i32>()
            .map_err(|_| Error::mismatch("i32", text.into_owned()))?;
        Ok(Some(Box::new(n)))
    }

    fn write(
        &self,
        value: &dyn Reflect,
        writer: &mut JsonWriter,
        _ctx: &mut WriteContext<'_>,
    ) -> Result<()> {
        let n = value
            .downcast_ref::<i32>()
            .ok_or_else(|| Error::mismatch("i32", "other type"))?;
        writer.str_value(&format!("int:{n}"))
    }
}

#[test]
fn user_factories_precede_the_builtin_bindings() {
    let refson = Refson::builder().register_factory(LoudInts).build();
    assert_eq!(refson.to_string(&7_i32).unwrap(), r#""int:7""#);
    let back: i32 = refson.from_str(r#""int:7""#).unwrap().unwrap();
    assert_eq!(back, 7);
    // Other integer widths are untouched.
    assert_eq!(refson.to_string(&7_i64).unwrap(), "7");
}

#[test]
fn converters_are_cached_per_engine() {
    let refson = Refson::new();
    let a = refson.converter_for::<Vec<i32>>().unwrap();
    let b = refson.converter_for::<Vec<i32>>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

/// A factory that claims nothing, used to probe delegation.
struct Bystander;

impl ConverterFactory for Bystander {
    fn create(
        &self,
        _resolver: &Resolver<'_>,
        _info: &'static TypeInfo,
    ) -> Result<Option<Arc<dyn Converter>>> {
        Ok(None)
    }
}

#[test]
fn delegation_past_an_unregistered_factory_resolves_normally() {
    let refson = Refson::new();
    let outsider: Arc<dyn ConverterFactory> = Arc::new(Bystander);
    // A skip-past factory the engine has never seen degrades to a plain
    // resolution instead of an error.
    assert!(
        refson
            .delegate_converter(&outsider, i64::type_info())
            .is_ok()
    );
}

// -----------------------------------------------------------------------------
// Recursive types

#[derive(Reflect, Clone, Default, Debug, PartialEq)]
#[reflect(default)]
struct Tree {
    label: String,
    children: Vec<Tree>,
}

#[test]
fn self_referential_types_resolve_and_round_trip() {
    let refson = Refson::new();
    let value = Tree {
        label: "root".into(),
        children: vec![
            Tree {
                label: "left".into(),
                children: vec![],
            },
            Tree {
                label: "right".into(),
                children: vec![Tree {
                    label: "leaf".into(),
                    children: vec![],
                }],
            },
        ],
    };
    let json = refson.to_string(&value).unwrap();
    let back: Tree = refson.from_str(&json).unwrap().unwrap();
    assert_eq!(back, value);
}

// -----------------------------------------------------------------------------
// Construction and exclusion

#[derive(Reflect, Clone, Debug, PartialEq)]
struct Sealed {
    token: String,
}

#[test]
fn missing_constructors_are_configuration_errors() {
    let refson = Refson::new();
    let err = refson
        .from_str::<Sealed>(r#"{"token":"x"}"#)
        .unwrap_err();
    assert!(err.is_config(), "expected a config error, got: {err}");
}

#[test]
fn registered_creators_substitute_for_default() {
    let refson = Refson::builder()
        .register_creator::<Sealed>(|| Sealed {
            token: "unset".into(),
        })
        .build();
    let back: Sealed = refson.from_str(r#"{"token":"x"}"#).unwrap().unwrap();
    assert_eq!(back.token, "x");

    // Absent properties keep what the creator put there.
    let back: Sealed = refson.from_str("{}").unwrap().unwrap();
    assert_eq!(back.token, "unset");
}

#[derive(Reflect, Clone, Default, Debug, PartialEq)]
#[reflect(default)]
struct Secret {
    pin: String,
}

#[derive(Reflect, Clone, Default, Debug, PartialEq)]
#[reflect(default)]
struct Account {
    name: String,
    secret: Secret,
}

#[test]
fn excluded_types_are_dropped_on_write_and_skipped_on_read() {
    let refson = Refson::builder().exclude::<Secret>().build();
    let value = Account {
        name: "ada".into(),
        secret: Secret { pin: "1234".into() },
    };
    let json = refson.to_string(&value).unwrap();
    assert_eq!(json, r#"{"name":"ada"}"#);

    let back: Account = refson
        .from_str(r#"{"name":"ada","secret":{"pin":"9999"}}"#)
        .unwrap()
        .unwrap();
    assert_eq!(back.secret, Secret::default());
}
