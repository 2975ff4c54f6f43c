use refson::{Error, LoopPolicy, Reflect, Refson, Shared};

#[derive(Reflect, Clone, Default, Debug)]
#[reflect(default)]
struct Node {
    value: i32,
    next: Option<Shared<Node>>,
}

#[derive(Reflect, Clone, Default, Debug)]
#[reflect(default)]
struct Owner {
    a: Shared<Node>,
    b: Shared<Node>,
}

fn tracking() -> Refson {
    Refson::builder().loop_policy(LoopPolicy::IdTagging).build()
}

fn json_value(s: &str) -> serde_json::Value {
    serde_json::from_str(s).expect("engine produced invalid JSON")
}

#[test]
fn aliased_cells_write_id_and_ref() {
    let shared = Shared::new(Node {
        value: 7,
        next: None,
    });
    let owner = Owner {
        a: shared.clone(),
        b: shared,
    };
    let json = tracking().to_string(&owner).unwrap();
    let v = json_value(&json);
    assert_eq!(v["a"]["@id"], "1");
    assert_eq!(v["a"]["value"], 7);
    assert_eq!(v["b"]["@ref"], "1");
}

#[test]
fn aliasing_survives_a_round_trip() {
    let refson = tracking();
    let shared = Shared::new(Node {
        value: 7,
        next: None,
    });
    let owner = Owner {
        a: shared.clone(),
        b: shared,
    };
    let json = refson.to_string(&owner).unwrap();
    let back: Owner = refson.from_str(&json).unwrap().unwrap();
    assert!(back.a.same_identity(&back.b));

    // Mutation through one handle is visible through the other.
    back.a.with_mut(|n| n.value = 99);
    assert_eq!(back.b.with(|n| n.value), Some(99));
}

#[test]
fn without_tracking_aliases_are_inlined() {
    let refson = Refson::new();
    let shared = Shared::new(Node {
        value: 7,
        next: None,
    });
    let owner = Owner {
        a: shared.clone(),
        b: shared,
    };
    let json = refson.to_string(&owner).unwrap();
    let v = json_value(&json);
    assert!(v["a"].get("@id").is_none());
    assert_eq!(v["a"]["value"], 7);
    assert_eq!(v["b"]["value"], 7);

    let back: Owner = refson.from_str(&json).unwrap().unwrap();
    assert!(!back.a.same_identity(&back.b));
}

#[test]
fn cycles_round_trip_with_identity() {
    let refson = tracking();
    let n1 = Shared::new(Node {
        value: 1,
        next: None,
    });
    let n2 = Shared::new(Node {
        value: 2,
        next: Some(n1.clone()),
    });
    n1.with_mut(|n| n.next = Some(n2.clone()));

    let json = refson.to_string(&n1).unwrap();
    let v = json_value(&json);
    assert_eq!(v["@id"], "1");
    assert_eq!(v["next"]["@id"], "2");
    assert_eq!(v["next"]["next"]["@ref"], "1");

    let back: Shared<Node> = refson.from_str(&json).unwrap().unwrap();
    let returns_to_root = back
        .with(|n1| {
            let n2 = n1.next.clone().unwrap();
            n2.with(|n2| n2.next.clone().unwrap().same_identity(&back))
                .unwrap()
        })
        .unwrap();
    assert!(returns_to_root);
}

#[test]
fn forward_references_are_patched() {
    let refson = tracking();
    let json = r#"{"a":{"@ref":"1"},"b":{"@id":"1","value":5}}"#;
    let back: Owner = refson.from_str(json).unwrap().unwrap();
    assert!(back.a.same_identity(&back.b));
    assert_eq!(back.a.with(|n| n.value), Some(5));
}

#[test]
fn dangling_references_fail_verification() {
    let refson = tracking();
    let json = r#"{"a":{"@ref":"9"},"b":{"@id":"1","value":5}}"#;
    let err = refson.from_str::<Owner>(json).unwrap_err();
    assert!(matches!(err, Error::UnresolvedReference { id } if id == "9"));
}

#[test]
fn duplicate_ids_are_rejected() {
    let refson = tracking();
    let json = r#"{"a":{"@id":"1","value":1},"b":{"@id":"1","value":2}}"#;
    assert!(refson.from_str::<Owner>(json).is_err());
}

#[test]
fn scalar_cells_are_inlined_even_when_tracking() {
    let refson = tracking();
    let json = refson.to_string(&Shared::new(5_i64)).unwrap();
    assert_eq!(json, "5");
    let list = vec![Shared::new(1_i64), Shared::new(1_i64)];
    assert_eq!(refson.to_string(&list).unwrap(), "[1,1]");
}

#[test]
fn unresolved_cells_write_null() {
    let refson = tracking();
    let json = refson.to_string(&Shared::<Node>::unresolved()).unwrap();
    assert_eq!(json, "null");
}

#[test]
fn cell_reads_accept_plain_objects() {
    // Documents written without tracking still load into Shared slots.
    let refson = tracking();
    let back: Shared<Node> = refson
        .from_str(r#"{"value":3}"#)
        .unwrap()
        .unwrap();
    assert_eq!(back.with(|n| n.value), Some(3));
}

// -----------------------------------------------------------------------------
// Dynamic-path references

#[test]
fn dynamic_backward_references_copy_the_value() {
    let refson = tracking();
    let json = r#"{"a":{"@id":"1","v":1},"b":{"@ref":"1"}}"#;
    let top = refson.from_str_dyn(json).unwrap().unwrap();
    let top = top
        .downcast_ref::<refson::ops::DynamicStruct>()
        .expect("object reads as a dynamic struct");
    let b = refson::ops::Struct::field(top, "b").unwrap();
    let b = b
        .downcast_ref::<refson::ops::DynamicStruct>()
        .expect("back reference copies the finished value");
    let v = refson::ops::Struct::field(b, "v").unwrap();
    assert_eq!(v.downcast_ref::<i64>(), Some(&1));
}

#[test]
fn typed_ref_to_dynamic_definition_is_rejected() {
    #[derive(Reflect, Clone, Default, Debug)]
    #[reflect(default)]
    struct Mixed {
        loose: refson::AnyValue,
        cell: Shared<Node>,
    }
    let refson = tracking();
    // `loose` defines the id on the dynamic path; the typed cell cannot
    // adopt a value with no cell identity.
    let json = r#"{"loose":{"@id":"1","value":1},"cell":{"@ref":"1"}}"#;
    assert!(refson.from_str::<Mixed>(json).is_err());
}
