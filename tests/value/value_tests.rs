use dynvar::{Kind, Ownership, TypeError, Value, ledger};

fn node(label: &str) -> Value {
    let n = Value::table();
    n.index("label").unwrap().set(label).unwrap();
    n
}

/// Links `nodes` into a doubly linked list: `next` is strong, `prev` weak.
fn link(nodes: &[Value]) {
    for pair in nodes.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        a.index("next").unwrap().set(b.clone()).unwrap();
        b.index("prev").unwrap().set(a.downgrade()).unwrap();
    }
}

fn labels_forward(head: &Value) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = head.clone();
    while cursor.is_truthy() {
        out.push(cursor.index("label").unwrap().value().unwrap().to_string());
        let next = cursor.index("next").unwrap().value().unwrap();
        cursor = next;
    }
    out
}

#[test]
fn doubly_linked_list_walks_both_ways() {
    let nodes: Vec<Value> = ["a", "b", "c"].into_iter().map(node).collect();
    link(&nodes);
    assert_eq!(labels_forward(&nodes[0]), vec!["a", "b", "c"]);

    let mut back = Vec::new();
    let mut cursor = nodes[2].clone();
    while cursor.is_truthy() {
        back.push(cursor.index("label").unwrap().value().unwrap().to_string());
        let prev = cursor.index("prev").unwrap().value().unwrap();
        cursor = prev;
    }
    assert_eq!(back, vec!["c", "b", "a"]);
}

#[test]
fn dropping_the_head_tears_down_the_list() {
    let nodes: Vec<Value> = ["a", "b", "c"].into_iter().map(node).collect();
    link(&nodes);
    let observers: Vec<Value> = nodes.iter().map(Value::downgrade).collect();
    let head = nodes[0].clone();
    drop(nodes);

    assert!(observers.iter().all(Value::is_truthy));
    drop(head);
    assert!(observers.iter().all(|o| !o.is_truthy()));
}

#[test]
fn unlinking_a_middle_node() {
    let nodes: Vec<Value> = ["a", "b", "c"].into_iter().map(node).collect();
    link(&nodes);
    let middle = nodes[1].downgrade();
    let (head, tail) = (nodes[0].clone(), nodes[2].clone());
    drop(nodes);

    head.index("next").unwrap().set(tail.clone()).unwrap();
    tail.index("prev").unwrap().set(head.downgrade()).unwrap();
    assert!(!middle.is_truthy());
    assert_eq!(labels_forward(&head), vec!["a", "c"]);
}

#[test]
fn callbacks_stored_in_tables() {
    let handlers = Value::table();
    handlers
        .index("greet")
        .unwrap()
        .set(Value::function(|name| {
            (&Value::from("hello, ") + &name).unwrap_or_default()
        }))
        .unwrap();

    let out = handlers.index("greet").unwrap().call("world".into()).unwrap();
    assert_eq!(out, Value::from("hello, world"));
    assert_eq!(handlers.index("greet").unwrap().kind().unwrap(), Kind::Function);
}

#[test]
fn function_holding_a_weak_reference_to_its_table() {
    let counter = Value::table();
    counter.index("hits").unwrap().set(0).unwrap();
    let this = counter.downgrade();
    counter
        .index("hit")
        .unwrap()
        .set(Value::function(move |_| {
            let hits = this.index("hits").unwrap();
            let next = (&hits.value().unwrap() + &Value::from(1)).unwrap();
            hits.set(next.clone()).unwrap();
            next
        }))
        .unwrap();

    for _ in 0..3 {
        counter.index("hit").unwrap().call(Value::nil()).unwrap();
    }
    assert_eq!(counter.index("hits").unwrap().value().unwrap(), Value::from(3));
    assert_eq!(counter.strong_count(), Some(1));

    let observer = counter.downgrade();
    drop(counter);
    assert!(!observer.is_truthy());
}

#[test]
fn weak_cache_entries_vanish_with_their_values() {
    let cache = Value::table();
    let big = Value::list((0..10_i32).map(Value::from));
    cache.index("big").unwrap().set(big.downgrade()).unwrap();
    assert_eq!(cache.index("big").unwrap().value().unwrap().len().unwrap(), 10);

    drop(big);
    assert!(cache.index("big").unwrap().get().unwrap().is_none());
    assert!(cache.entries().unwrap().is_empty());
}

#[test]
fn public_strong_count_matches_method() {
    let s = Value::from("counted");
    let copy = s.clone();
    assert_eq!(ledger::strong_count(&s), Some(2));
    assert_eq!(ledger::strong_count(&copy), s.strong_count());
    assert_eq!(ledger::strong_count(&Value::from(1)), None);
}

#[test]
fn ownership_round_trip() {
    let mut v = Value::table();
    let keep = v.clone();
    assert_eq!(v.ownership(), Some(Ownership::Strong));
    assert!(v.set_weak(true));
    assert_eq!(v.ownership(), Some(Ownership::Weak));
    assert!(!v.set_weak(false));
    assert_eq!(v.ownership(), Some(Ownership::Strong));
    assert_eq!(keep.strong_count(), Some(2));
}

#[test]
fn type_errors_name_the_operation() {
    let err = Value::from(true).index("x").unwrap_err();
    assert_eq!(err, TypeError::mismatch("index", Kind::Boolean));
    insta::assert_snapshot!(err.to_string(), @"cannot index a boolean value");

    let err = Value::from(1).call(Value::nil()).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"cannot call a number value");
}

#[test]
fn conversions_from_host_types() {
    assert_eq!(Value::from(3_u8), Value::from(3.0));
    assert_eq!(Value::from(-2_i64), Value::from(-2.0));
    assert_eq!(Value::from(String::from("s")), Value::from("s"));
    assert!(Value::from(()).is_nil());
    assert_eq!(Value::from(Some("x")).kind(), Kind::String);

    let t = Value::from([Value::from(1), Value::from(2)]);
    assert_eq!(t.type_name(), "table");
    assert_eq!(t.len().unwrap(), 2);
}

#[test]
fn iteration_through_the_public_api() {
    let t: Value = ["x", "y"].into_iter().map(Value::from).collect();
    let mut total = 0.0;
    for (key, slot) in t.iter().unwrap() {
        total += key.as_number().unwrap();
        assert_eq!(slot.kind().unwrap(), Kind::String);
    }
    assert_eq!(total, 3.0);
}
