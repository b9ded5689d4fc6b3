//! Merge-patch updates and structural equality of JSON trees.

use serde_json::{Number, Value};

use crate::Object;

/// Merge `patch` into `old`, returning a new tree.
///
/// When both sides are objects, every key of `old` is kept and every key of
/// `patch` is applied: object values merge recursively, anything else in
/// `patch` replaces what was there. When either side is not an object,
/// `patch` wins outright. Arrays are atomic.
///
/// ```rust
/// use dirb_json_store::merge;
/// use serde_json::json;
///
/// let merged = merge(&json!({"a": 1, "b": {"x": 1}}), &json!({"b": {"y": 2}, "c": 3}));
/// assert_eq!(merged, json!({"a": 1, "b": {"x": 1, "y": 2}, "c": 3}));
/// ```
pub fn merge(old: &Value, patch: &Value) -> Value {
    match (old, patch) {
        (Value::Object(old), Value::Object(patch)) => Value::Object(merge_objects(old, patch)),
        _ => patch.clone(),
    }
}

/// [`merge`] specialized to two objects.
pub fn merge_objects(old: &Object, patch: &Object) -> Object {
    let mut merged = old.clone();
    for (key, patch_value) in patch {
        let value = match merged.get(key) {
            Some(old_value) => merge(old_value, patch_value),
            None => patch_value.clone(),
        };
        merged.insert(key.clone(), value);
    }
    merged
}

/// Structural equality where arrays compare as multisets.
///
/// Objects are equal when they have the same keys with pairwise equal
/// values; arrays when their elements can be paired off one-to-one; numbers
/// by numeric value.
pub fn deep_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_eq(a, b),
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, av)| b.get(k).is_some_and(|bv| deep_eq(av, bv)))
        }
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return false;
            }
            // deep_eq is an equivalence, so greedy pairing finds a bijection
            // whenever one exists.
            let mut unmatched: Vec<&Value> = b.iter().collect();
            a.iter().all(|av| {
                match unmatched.iter().position(|bv| deep_eq(av, bv)) {
                    Some(i) => {
                        unmatched.swap_remove(i);
                        true
                    }
                    None => false,
                }
            })
        }
        _ => false,
    }
}

fn numbers_eq(a: &Number, b: &Number) -> bool {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a == b;
    }
    if a.is_f64() || b.is_f64() {
        return a.as_f64() == b.as_f64();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_objects_merge() {
        let merged = merge(
            &json!({"a": 1, "b": {"x": 1}}),
            &json!({"b": {"y": 2}, "c": 3}),
        );
        assert_eq!(merged, json!({"a": 1, "b": {"x": 1, "y": 2}, "c": 3}));
    }

    #[test]
    fn scalar_patch_replaces_object() {
        assert_eq!(merge(&json!({"a": {"x": 1}}), &json!({"a": 5})), json!({"a": 5}));
    }

    #[test]
    fn object_patch_replaces_scalar() {
        assert_eq!(
            merge(&json!({"a": 5}), &json!({"a": {"x": 1}})),
            json!({"a": {"x": 1}})
        );
    }

    #[test]
    fn arrays_are_atomic() {
        assert_eq!(
            merge(&json!({"a": [1, 2, 3]}), &json!({"a": [4]})),
            json!({"a": [4]})
        );
        assert_eq!(merge(&json!([1, 2]), &json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn non_object_sides_take_patch() {
        assert_eq!(merge(&json!({"a": 1}), &json!(3)), json!(3));
        assert_eq!(merge(&json!("s"), &json!({"a": 1})), json!({"a": 1}));
        assert_eq!(merge(&json!({"a": 1}), &json!(null)), json!(null));
    }

    #[test]
    fn null_values_are_stored_not_deleted() {
        assert_eq!(
            merge(&json!({"a": 1, "b": 2}), &json!({"a": null})),
            json!({"a": null, "b": 2})
        );
    }

    #[test]
    fn inputs_are_untouched() {
        let old = json!({"a": {"x": 1}});
        let patch = json!({"a": {"y": 2}});
        let _ = merge(&old, &patch);
        assert_eq!(old, json!({"a": {"x": 1}}));
        assert_eq!(patch, json!({"a": {"y": 2}}));
    }

    #[test]
    fn empty_patch_is_identity() {
        let old = json!({"a": {"x": [1, 2]}, "b": null});
        assert_eq!(merge(&old, &json!({})), old);
    }

    #[test]
    fn deep_eq_arrays_are_multisets() {
        assert!(deep_eq(&json!([1, 2, 2, 3]), &json!([2, 3, 1, 2])));
        assert!(!deep_eq(&json!([1, 2, 2]), &json!([1, 1, 2])));
        assert!(!deep_eq(&json!([1, 2]), &json!([1, 2, 2])));
        assert!(deep_eq(
            &json!([{"a": [1, 2]}, {"b": 1}]),
            &json!([{"b": 1}, {"a": [2, 1]}])
        ));
    }

    #[test]
    fn deep_eq_objects() {
        assert!(deep_eq(&json!({"a": 1, "b": 2}), &json!({"b": 2, "a": 1})));
        assert!(!deep_eq(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!deep_eq(&json!({"a": 1}), &json!({"b": 1})));
        assert!(!deep_eq(&json!({"a": null}), &json!({})));
    }

    #[test]
    fn deep_eq_scalars() {
        assert!(deep_eq(&json!(1), &json!(1.0)));
        assert!(deep_eq(&json!(-3), &json!(-3)));
        assert!(!deep_eq(&json!(1), &json!("1")));
        assert!(!deep_eq(&json!(null), &json!(false)));
        assert!(!deep_eq(&json!(u64::MAX), &json!(-1)));
    }
}
