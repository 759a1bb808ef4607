use std::thread;

use dynvar::{Kind, TypeError, Value};
use rayon::prelude::*;

const THREADS: usize = 8;
const ROUNDS: usize = 2_000;

#[test]
fn concurrent_copies_balance_out() {
    let shared = Value::table();
    shared.index("payload").unwrap().set("data").unwrap();

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..ROUNDS {
                    let copy = shared.clone();
                    let inner = copy.index("payload").unwrap().value().unwrap();
                    assert_eq!(inner, Value::from("data"));
                }
            });
        }
    });

    assert_eq!(shared.strong_count(), Some(1));
    let payload = shared.index("payload").unwrap().value().unwrap();
    assert_eq!(payload.strong_count(), Some(2));
}

#[test]
fn parallel_tables_share_one_value() {
    let shared = Value::from("shared");
    let tables: Vec<Value> = (0..10_000_i32)
        .into_par_iter()
        .map(|i| {
            let t = Value::table();
            t.index(i).unwrap().set(shared.clone()).unwrap();
            t
        })
        .collect();

    assert_eq!(shared.strong_count(), Some(10_001));
    drop(tables);
    assert_eq!(shared.strong_count(), Some(1));
}

#[test]
fn concurrent_writers_to_one_table() {
    let t = Value::table();
    thread::scope(|s| {
        for worker in 0..THREADS {
            let t = &t;
            s.spawn(move || {
                for i in 0..ROUNDS {
                    let key = format!("{worker}:{i}");
                    t.index(key.as_str()).unwrap().set(i).unwrap();
                }
            });
        }
    });
    assert_eq!(t.len().unwrap(), THREADS * ROUNDS);
}

#[test]
fn weak_readers_race_the_last_owner() {
    let owner = Value::table();
    owner.index("x").unwrap().set(1).unwrap();
    let weak = owner.downgrade();

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..ROUNDS {
                    match weak.index("x").and_then(|slot| slot.get()) {
                        Ok(Some(v)) => assert_eq!(v, Value::from(1)),
                        Ok(None) => {}
                        Err(err) => assert_eq!(err.to_string(), "cannot index a nil value"),
                    }
                }
            });
        }
        s.spawn(move || drop(owner));
    });

    assert!(!weak.is_truthy());
    assert_eq!(weak.index("x").unwrap_err(), TypeError::mismatch("index", Kind::Nil));
}

#[test]
fn parallel_concatenation() {
    let parts: Vec<Value> = (0..256).map(|_| Value::from("ab")).collect();
    let joined = parts
        .par_iter()
        .map(Value::clone)
        .reduce(|| Value::from(""), |l, r| (l + r).unwrap());
    assert_eq!(joined.string_content().unwrap().len(), 512);
    assert!(parts.iter().all(|p| p.strong_count() == Some(1)));
}

#[test]
fn functions_called_from_many_threads() {
    let double = Value::function(|v| (&v * &Value::from(2)).unwrap());
    let total: f64 = (0..1_000_i32)
        .into_par_iter()
        .map(|i| double.call(Value::from(i)).unwrap().as_number().unwrap())
        .sum();
    assert_eq!(total, 999_000.0);
    assert_eq!(double.strong_count(), Some(1));
}
