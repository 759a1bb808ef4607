use dynvar::{
    LedgerConfig, Value, ledger,
    runtime::leak_detector::{self, KindCounts, PayloadKind},
};

// Other tests in this binary run in parallel against the same ledger, so
// global counters are only checked for growth, never for exact values.

#[test]
fn registrations_are_counted() {
    let before = ledger::stats();
    let held: Vec<Value> = (0..5).map(|_| Value::table()).collect();
    let after = ledger::stats();
    assert!(after.total_registrations >= before.total_registrations + 5);
    assert!(after.slots >= held.len());
}

#[test]
fn frees_are_counted_per_kind() {
    let before = leak_detector::snapshot();
    {
        let _s = Value::from("leak check");
        let _f = Value::function(|v| v);
        let _t = Value::table();
    }
    let after = leak_detector::snapshot();
    for kind in PayloadKind::ALL {
        assert!(after.get(kind).registered > before.get(kind).registered, "{kind}");
        assert!(after.get(kind).freed > before.get(kind).freed, "{kind}");
    }
}

#[test]
fn outstanding_counts() {
    let counts = KindCounts {
        registered: 3,
        freed: 1,
    };
    assert_eq!(counts.outstanding(), 2);
    assert_eq!(KindCounts::default().outstanding(), 0);
    assert_eq!(PayloadKind::Table.to_string(), "table");
}

#[test]
fn stale_handles_never_see_new_occupants() {
    let weak = Value::table().downgrade();
    let fresh: Vec<Value> = (0..64).map(|_| Value::table()).collect();
    assert!(!weak.is_truthy());
    assert!(fresh.iter().all(|t| *t != weak));
}

#[test]
fn reconfiguring_keeps_live_values() {
    let t = Value::list([Value::from("kept")]);
    ledger::configure(&LedgerConfig {
        initial_capacity: 1024,
        reuse_slots: true,
    });
    ledger::configure(&LedgerConfig::from_env());
    assert_eq!(t.index(1).unwrap().value().unwrap(), Value::from("kept"));
    assert_eq!(t.strong_count(), Some(1));
}

#[test]
fn deep_nesting_is_released() {
    let root = Value::table();
    let mut cursor = root.clone();
    for _ in 0..200 {
        let child = Value::table();
        cursor.index("child").unwrap().set(child.clone()).unwrap();
        cursor = child;
    }
    let leaf = cursor.downgrade();
    drop(cursor);

    assert!(leaf.is_truthy());
    drop(root);
    assert!(!leaf.is_truthy());
}

#[test]
fn long_strong_chain_drops_without_deep_recursion() {
    let root = Value::table();
    let mut cursor = root.clone();
    for i in 0..100_000 {
        let next = Value::table();
        next.index("n").unwrap().set(i).unwrap();
        cursor.index("next").unwrap().set(next.clone()).unwrap();
        cursor = next;
    }
    let tail = cursor.downgrade();
    drop(cursor);

    let head = root.downgrade();
    drop(root);
    assert!(!head.is_truthy());
    assert!(!tail.is_truthy());
}

#[test]
fn long_chain_through_captured_functions_drops() {
    let mut link = Value::function(|v| v);
    let first = link.downgrade();
    for _ in 0..50_000 {
        let inner = link;
        link = Value::function(move |v| inner.call(v).unwrap_or_default());
    }
    assert!(first.is_truthy());

    drop(link);
    assert!(!first.is_truthy());
}

#[test]
fn strings_are_released_with_their_table() {
    let t = Value::table();
    let s = Value::from("shared text");
    t.index("s").unwrap().set(s.clone()).unwrap();
    t.index(s.clone()).unwrap().set(true).unwrap();
    assert_eq!(s.strong_count(), Some(3));

    drop(t);
    assert_eq!(s.strong_count(), Some(1));
}
