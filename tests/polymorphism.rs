use refson::ops::{DynamicStruct, Struct};
use refson::{AnyValue, Error, Reflect, Refson, UnknownTagPolicy};

#[derive(Reflect, Clone, Default, Debug, PartialEq)]
#[reflect(default)]
struct Dog {
    name: String,
    good: bool,
}

#[derive(Reflect, Clone, Default, Debug, PartialEq)]
#[reflect(default)]
struct Robot {
    serial: i64,
}

#[derive(Reflect, Clone, Default, Debug)]
#[reflect(default)]
struct Exhibit {
    star: AnyValue,
}

fn tagged() -> Refson {
    Refson::builder()
        .class_property("@class")
        .register::<Dog>()
        .register::<Robot>()
        .build()
}

fn json_value(s: &str) -> serde_json::Value {
    serde_json::from_str(s).expect("engine produced invalid JSON")
}

#[test]
fn any_value_writes_a_class_tag() {
    let refson = tagged();
    let exhibit = Exhibit {
        star: AnyValue::new(Dog {
            name: "Rex".into(),
            good: true,
        }),
    };
    let json = refson.to_string(&exhibit).unwrap();
    let v = json_value(&json);
    assert_eq!(v["star"]["@class"], "Dog");
    assert_eq!(v["star"]["name"], "Rex");
}

#[test]
fn the_tag_picks_the_concrete_type_on_read() {
    let refson = tagged();
    let back: Exhibit = refson
        .from_str(r#"{"star":{"@class":"Robot","serial":42}}"#)
        .unwrap()
        .unwrap();
    let robot = back.star.downcast_ref::<Robot>().expect("tag resolved");
    assert_eq!(robot.serial, 42);
}

#[test]
fn any_value_round_trips() {
    let refson = tagged();
    let exhibit = Exhibit {
        star: AnyValue::new(Dog {
            name: "Rex".into(),
            good: true,
        }),
    };
    let json = refson.to_string(&exhibit).unwrap();
    let back: Exhibit = refson.from_str(&json).unwrap().unwrap();
    assert_eq!(
        back.star.downcast_ref::<Dog>(),
        exhibit.star.downcast_ref::<Dog>()
    );
}

#[test]
fn empty_any_value_round_trips_as_null() {
    let refson = tagged();
    let json = refson
        .to_string(&Exhibit {
            star: AnyValue::empty(),
        })
        .unwrap();
    // The outer struct still gets its own tag; the empty slot vanishes.
    assert_eq!(json, r#"{"@class":"Exhibit"}"#);
    let back: Exhibit = refson.from_str(r#"{"star":null}"#).unwrap().unwrap();
    assert!(back.star.is_empty());
}

#[test]
fn untagged_objects_degrade_to_dynamic_structs() {
    let refson = tagged();
    let back: Exhibit = refson
        .from_str(r#"{"star":{"anything":1}}"#)
        .unwrap()
        .unwrap();
    let s = back
        .star
        .downcast_ref::<DynamicStruct>()
        .expect("untagged object degrades");
    let field = s.field("anything").unwrap();
    assert_eq!(field.downcast_ref::<i64>(), Some(&1));
}

#[test]
fn unknown_tags_fail_by_default() {
    let refson = tagged();
    let err = refson
        .from_str::<Exhibit>(r#"{"star":{"@class":"Alien"}}"#)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownTag { tag } if tag == "Alien"));
}

#[test]
fn ignored_unknown_tags_stay_as_plain_data() {
    let refson = Refson::builder()
        .class_property("@class")
        .unknown_tag_policy(UnknownTagPolicy::Ignore)
        .build();
    let back: Exhibit = refson
        .from_str(r#"{"star":{"@class":"Alien","legs":8}}"#)
        .unwrap()
        .unwrap();
    let s = back.star.downcast_ref::<DynamicStruct>().unwrap();
    // Nothing is lost: the tag survives as an ordinary property.
    let tag = s.field("@class").unwrap();
    assert_eq!(tag.downcast_ref::<String>().map(String::as_str), Some("Alien"));
}

#[test]
fn aliases_resolve_legacy_tags() {
    let refson = Refson::builder()
        .class_property("@class")
        .add_alias::<Dog>("GoodBoy")
        .build();
    let back: Exhibit = refson
        .from_str(r#"{"star":{"@class":"GoodBoy","name":"Rex","good":true}}"#)
        .unwrap()
        .unwrap();
    assert!(back.star.downcast_ref::<Dog>().is_some());
}

mod zone_a {
    use refson::Reflect;

    #[derive(Reflect, Clone, Default, Debug, PartialEq)]
    #[reflect(default)]
    pub struct Badge {
        pub code: i32,
    }
}

mod zone_b {
    use refson::Reflect;

    #[derive(Reflect, Clone, Default, Debug, PartialEq)]
    #[reflect(default)]
    pub struct Badge {
        pub code: i32,
    }
}

#[test]
fn ambiguous_short_names_fall_back_to_full_paths() {
    let refson = Refson::builder()
        .class_property("@class")
        .register::<zone_a::Badge>()
        .register::<zone_b::Badge>()
        .build();
    let json = refson
        .to_string(&Exhibit {
            star: AnyValue::new(zone_a::Badge { code: 3 }),
        })
        .unwrap();
    let v = json_value(&json);
    let tag = v["star"]["@class"].as_str().unwrap();
    assert!(tag.ends_with("zone_a::Badge"), "got tag `{tag}`");

    let back: Exhibit = refson.from_str(&json).unwrap().unwrap();
    assert_eq!(
        back.star.downcast_ref::<zone_a::Badge>(),
        Some(&zone_a::Badge { code: 3 })
    );
}

#[test]
fn writes_late_register_types_the_builder_never_saw() {
    // Never registered with the builder; the write late-registers it.
    let refson = Refson::builder().class_property("@class").build();
    let json = refson
        .to_string(&Exhibit {
            star: AnyValue::new(Dog {
                name: "Stray".into(),
                good: true,
            }),
        })
        .unwrap();
    let back: Exhibit = refson.from_str(&json).unwrap().unwrap();
    assert_eq!(
        back.star.downcast_ref::<Dog>().map(|d| d.name.as_str()),
        Some("Stray")
    );
}

// -----------------------------------------------------------------------------
// Untyped reads

#[test]
fn scalars_read_untyped() {
    let refson = Refson::new();
    let n = refson.from_str_dyn("42").unwrap().unwrap();
    assert_eq!(n.downcast_ref::<i64>(), Some(&42));

    let f = refson.from_str_dyn("4.5").unwrap().unwrap();
    assert_eq!(f.downcast_ref::<f64>(), Some(&4.5));

    let b = refson.from_str_dyn("true").unwrap().unwrap();
    assert_eq!(b.downcast_ref::<bool>(), Some(&true));

    let s = refson.from_str_dyn(r#""hey""#).unwrap().unwrap();
    assert_eq!(s.downcast_ref::<String>().map(String::as_str), Some("hey"));

    assert!(refson.from_str_dyn("null").unwrap().is_none());
}

#[test]
fn tagged_documents_read_untyped_into_concrete_types() {
    let refson = tagged();
    let top = refson
        .from_str_dyn(r#"{"@class":"Dog","name":"Rex","good":true}"#)
        .unwrap()
        .unwrap();
    let dog = top.downcast_ref::<Dog>().expect("top-level tag honored");
    assert_eq!(dog.name, "Rex");
}

#[test]
fn tags_are_only_honored_in_first_position() {
    let refson = tagged();
    let top = refson
        .from_str_dyn(r#"{"name":"Rex","@class":"Dog"}"#)
        .unwrap()
        .unwrap();
    assert!(top.downcast_ref::<DynamicStruct>().is_some());
}

#[test]
fn strip_class_tags_removes_them_at_any_depth() {
    let refson = tagged();
    let json = r#"{"@class":"Dog","pals":[{"@class":"Robot","serial":1}],"name":"Rex"}"#;
    let stripped = refson.strip_class_tags(json).unwrap();
    let v = json_value(&stripped);
    assert!(v.get("@class").is_none());
    assert!(v["pals"][0].get("@class").is_none());
    assert_eq!(v["pals"][0]["serial"], 1);
    assert_eq!(v["name"], "Rex");
}
