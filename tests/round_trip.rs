use std::collections::HashMap;
use std::convert::Infallible;
use std::str::FromStr;

use refson::{NamingPolicy, Reflect, Refson};

#[derive(Reflect, Clone, Default, Debug, PartialEq)]
#[reflect(default)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Reflect, Clone, Default, Debug, PartialEq)]
#[reflect(default)]
struct Profile {
    user_name: String,
    nickname: Option<String>,
    scores: Vec<i32>,
    home: Point,
}

fn json_value(s: &str) -> serde_json::Value {
    serde_json::from_str(s).expect("engine produced invalid JSON")
}

#[test]
fn flat_struct_round_trips() {
    let refson = Refson::new();
    let json = refson.to_string(&Point { x: 1, y: -2 }).unwrap();
    assert_eq!(json, r#"{"x":1,"y":-2}"#);
    let back: Point = refson.from_str(&json).unwrap().unwrap();
    assert_eq!(back, Point { x: 1, y: -2 });
}

#[test]
fn nested_struct_round_trips() {
    let refson = Refson::new();
    let value = Profile {
        user_name: "ada".into(),
        nickname: Some("al".into()),
        scores: vec![3, 1, 4],
        home: Point { x: 9, y: 9 },
    };
    let json = refson.to_string(&value).unwrap();
    let back: Profile = refson.from_str(&json).unwrap().unwrap();
    assert_eq!(back, value);
}

#[test]
fn absent_option_is_dropped_by_default() {
    let refson = Refson::new();
    let json = refson.to_string(&Profile::default()).unwrap();
    let v = json_value(&json);
    assert!(v.get("nickname").is_none());
}

#[test]
fn serialize_nulls_keeps_the_property() {
    let refson = Refson::builder().serialize_nulls().build();
    let json = refson.to_string(&Profile::default()).unwrap();
    let v = json_value(&json);
    assert!(v["nickname"].is_null());
}

#[test]
fn missing_properties_leave_defaults() {
    let refson = Refson::new();
    let back: Profile = refson.from_str(r#"{"user_name":"bo"}"#).unwrap().unwrap();
    assert_eq!(back.user_name, "bo");
    assert_eq!(back.nickname, None);
    assert!(back.scores.is_empty());
    assert_eq!(back.home, Point::default());
}

#[test]
fn unknown_properties_are_skipped() {
    let refson = Refson::new();
    let json = r#"{"x":1,"unexpected":{"deep":[1,{"a":true}]},"y":2}"#;
    let back: Point = refson.from_str(json).unwrap().unwrap();
    assert_eq!(back, Point { x: 1, y: 2 });
}

#[test]
fn empty_and_null_documents_read_as_none() {
    let refson = Refson::new();
    assert_eq!(refson.from_str::<Point>("").unwrap(), None);
    assert_eq!(refson.from_str::<Point>("   \n").unwrap(), None);
    assert_eq!(refson.from_str::<Point>("null").unwrap(), None);
}

#[test]
fn trailing_content_is_rejected() {
    let refson = Refson::new();
    assert!(refson.from_str::<Point>(r#"{"x":1,"y":2} garbage"#).is_err());
}

#[test]
fn naming_policy_applies_both_ways() {
    let refson = Refson::builder()
        .naming_policy(NamingPolicy::LowerCamelCase)
        .build();
    let value = Profile {
        user_name: "ada".into(),
        ..Profile::default()
    };
    let json = refson.to_string(&value).unwrap();
    let v = json_value(&json);
    assert_eq!(v["userName"], "ada");
    assert!(v.get("user_name").is_none());

    let back: Profile = refson.from_str(&json).unwrap().unwrap();
    assert_eq!(back.user_name, "ada");
}

#[derive(Reflect, Clone, Default, Debug, PartialEq)]
#[reflect(default)]
struct Renamed {
    #[reflect(rename = "id")]
    identifier: u64,
}

#[test]
fn explicit_rename_wins_over_policy() {
    let refson = Refson::builder()
        .naming_policy(NamingPolicy::PascalCase)
        .build();
    let json = refson.to_string(&Renamed { identifier: 7 }).unwrap();
    assert_eq!(json, r#"{"id":7}"#);
    let back: Renamed = refson.from_str(&json).unwrap().unwrap();
    assert_eq!(back.identifier, 7);
}

#[test]
fn lenient_shapes_coerce_into_fields() {
    let refson = Refson::new();
    // Quoted numbers, whole floats, one-element arrays.
    let back: Point = refson
        .from_str(r#"{"x":"1","y":2.0}"#)
        .unwrap()
        .unwrap();
    assert_eq!(back, Point { x: 1, y: 2 });

    let back: Point = refson.from_str(r#"{"x":[5],"y":6}"#).unwrap().unwrap();
    assert_eq!(back, Point { x: 5, y: 6 });
}

#[test]
fn out_of_range_numbers_are_mismatches() {
    let refson = Refson::new();
    #[derive(Reflect, Clone, Default, Debug, PartialEq)]
    #[reflect(default)]
    struct Tiny {
        n: u8,
    }
    let err = refson.from_str::<Tiny>(r#"{"n":300}"#).unwrap_err();
    assert!(err.to_string().contains("n"), "field name in: {err}");
}

#[test]
fn maps_round_trip_at_top_level() {
    let refson = Refson::new();
    let mut value = HashMap::new();
    value.insert("a".to_owned(), 1_i32);
    value.insert("b".to_owned(), 2_i32);
    let json = refson.to_string(&value).unwrap();
    let back: HashMap<String, i32> = refson.from_str(&json).unwrap().unwrap();
    assert_eq!(back, value);
}

#[test]
fn integer_keyed_maps_use_quoted_keys() {
    let refson = Refson::new();
    let mut value = HashMap::new();
    value.insert(10_i64, "ten".to_owned());
    let json = refson.to_string(&value).unwrap();
    assert_eq!(json, r#"{"10":"ten"}"#);
    let back: HashMap<i64, String> = refson.from_str(&json).unwrap().unwrap();
    assert_eq!(back, value);
}

#[test]
fn pretty_output_is_equivalent_json() {
    let refson = Refson::new();
    let pretty = Refson::builder().pretty("  ").build();
    let value = Profile {
        user_name: "ada".into(),
        scores: vec![1, 2],
        ..Profile::default()
    };
    let compact = refson.to_string(&value).unwrap();
    let indented = pretty.to_string(&value).unwrap();
    assert!(indented.contains('\n'));
    assert_eq!(json_value(&compact), json_value(&indented));
}

// -----------------------------------------------------------------------------
// Version gating

#[derive(Reflect, Clone, Default, Debug, PartialEq)]
#[reflect(default)]
struct Versioned {
    name: String,
    #[reflect(since = 2.0)]
    flags: u32,
    #[reflect(until = 2.0)]
    legacy: bool,
}

#[test]
fn version_gate_filters_fields() {
    let value = Versioned {
        name: "v".into(),
        flags: 3,
        legacy: true,
    };

    let old = Refson::builder().version(1.0).build();
    let v = json_value(&old.to_string(&value).unwrap());
    assert!(v.get("flags").is_none());
    assert_eq!(v["legacy"], true);

    let new = Refson::builder().version(2.0).build();
    let v = json_value(&new.to_string(&value).unwrap());
    assert_eq!(v["flags"], 3);
    assert!(v.get("legacy").is_none());

    let ungated = Refson::new();
    let v = json_value(&ungated.to_string(&value).unwrap());
    assert_eq!(v["flags"], 3);
    assert_eq!(v["legacy"], true);
}

// -----------------------------------------------------------------------------
// Skipped fields and text forms

#[derive(Reflect, Clone, Default, Debug, PartialEq)]
#[reflect(default)]
struct WithSkip {
    shown: i32,
    #[reflect(skip)]
    hidden: i32,
}

#[test]
fn skipped_fields_never_touch_the_document() {
    let refson = Refson::new();
    let json = refson
        .to_string(&WithSkip {
            shown: 1,
            hidden: 2,
        })
        .unwrap();
    assert_eq!(json, r#"{"shown":1}"#);

    let back: WithSkip = refson
        .from_str(r#"{"shown":1,"hidden":99}"#)
        .unwrap()
        .unwrap();
    assert_eq!(back.hidden, 0);
}

#[derive(Reflect, Clone, Default, Debug, PartialEq)]
#[reflect(default, from_str)]
struct Label {
    text: String,
}

impl FromStr for Label {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Label { text: s.to_owned() })
    }
}

#[test]
fn bare_strings_parse_through_from_str() {
    let refson = Refson::new();
    #[derive(Reflect, Clone, Default, Debug, PartialEq)]
    #[reflect(default)]
    struct Card {
        label: Label,
    }
    let back: Card = refson.from_str(r#"{"label":"hello"}"#).unwrap().unwrap();
    assert_eq!(back.label.text, "hello");

    // The object form still works.
    let back: Card = refson
        .from_str(r#"{"label":{"text":"hi"}}"#)
        .unwrap()
        .unwrap();
    assert_eq!(back.label.text, "hi");
}

// -----------------------------------------------------------------------------
// Generics

#[derive(Reflect, Clone, Default, Debug, PartialEq)]
#[reflect(default)]
struct Pair<T> {
    first: T,
    second: T,
}

#[test]
fn generic_structs_round_trip() {
    let refson = Refson::new();
    let value = Pair {
        first: "a".to_owned(),
        second: "b".to_owned(),
    };
    let json = refson.to_string(&value).unwrap();
    assert_eq!(json, r#"{"first":"a","second":"b"}"#);
    let back: Pair<String> = refson.from_str(&json).unwrap().unwrap();
    assert_eq!(back, value);

    let ints: Pair<i64> = refson.from_str(r#"{"first":1,"second":2}"#).unwrap().unwrap();
    assert_eq!(ints, Pair { first: 1, second: 2 });
}
