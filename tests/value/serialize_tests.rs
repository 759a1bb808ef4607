use dynvar::Value;
use serde_json::json;

fn to_json(value: &Value) -> serde_json::Value {
    serde_json::to_value(value).unwrap()
}

#[test]
fn scalars() {
    assert_eq!(to_json(&Value::nil()), json!(null));
    assert_eq!(to_json(&Value::from(true)), json!(true));
    assert_eq!(to_json(&Value::from(1.5)), json!(1.5));
    assert_eq!(to_json(&Value::from("text")), json!("text"));
}

#[test]
fn tables_become_maps_keyed_by_text() {
    let t = Value::list([Value::from("a"), Value::from("b")]);
    assert_eq!(to_json(&t), json!({ "1": "a", "2": "b" }));
}

#[test]
fn nested_tables() {
    let inner = Value::table();
    inner.index("flag").unwrap().set(false).unwrap();
    let outer = Value::table();
    outer.index("inner").unwrap().set(inner).unwrap();
    outer.index("n").unwrap().set(2).unwrap();

    assert_eq!(
        to_json(&outer),
        json!({ "inner": { "flag": false }, "n": 2.0 })
    );
}

#[test]
fn functions_serialize_as_their_tag() {
    let f = Value::function(|v| v);
    let json = to_json(&f);
    assert_eq!(json, json!(f.to_string()));
    assert!(json.as_str().unwrap().starts_with("function: 0x"));
}

#[test]
fn cycles_are_cut_at_the_repeated_table() {
    let t = Value::table();
    t.index("self").unwrap().set(t.downgrade()).unwrap();
    t.index("name").unwrap().set("root").unwrap();

    assert_eq!(
        to_json(&t),
        json!({ "self": t.to_string(), "name": "root" })
    );
}

#[test]
fn shared_subtables_are_not_cycles() {
    let shared = Value::list([Value::from(1)]);
    let t = Value::table();
    t.index("a").unwrap().set(shared.clone()).unwrap();
    t.index("b").unwrap().set(shared).unwrap();

    assert_eq!(to_json(&t), json!({ "a": { "1": 1.0 }, "b": { "1": 1.0 } }));
}

#[test]
fn expired_weak_values_serialize_as_null() {
    let weak = Value::table().downgrade();
    assert_eq!(to_json(&weak), json!(null));
}

#[test]
fn ledger_stats_serialize() {
    let json = serde_json::to_value(dynvar::ledger::stats()).unwrap();
    for key in ["live", "slots", "retired_slots", "total_registrations", "total_releases"] {
        assert!(json.get(key).is_some_and(serde_json::Value::is_u64), "{key}");
    }
}
