//! Dotted-path updates into a task's parameter map.
//!
//! `"headers.Authorization"` addresses `parameters["headers"]["Authorization"]`.
//! Missing intermediate objects are created; a non-object value sitting on the
//! path is replaced by an object. Updates never fail.

use serde_json::Value;

use crate::Parameters;

/// Set the value at `path`, creating intermediate objects as needed.
///
/// An empty path (or one made only of dots) leaves `params` untouched.
pub fn set_path(params: &mut Parameters, path: &str, value: Value) {
    let mut segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    let Some(last) = segments.pop() else {
        return;
    };

    let mut current = params;
    for segment in segments {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Parameters::new()));
        if !slot.is_object() {
            *slot = Value::Object(Parameters::new());
        }
        let Value::Object(map) = slot else {
            return;
        };
        current = map;
    }
    current.insert(last.to_string(), value);
}

/// Read the value at `path`, if every segment resolves.
pub fn get_path<'a>(params: &'a Parameters, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.').filter(|s| !s.is_empty());
    let first = segments.next()?;
    let mut current = params.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Parameters {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn top_level_key_is_inserted() {
        let mut p = Parameters::new();
        set_path(&mut p, "url", json!("https://example.com"));
        assert_eq!(p["url"], "https://example.com");
    }

    #[test]
    fn nested_objects_are_created_on_demand() {
        let mut p = Parameters::new();
        set_path(&mut p, "headers.Authorization", json!("Bearer x"));
        assert_eq!(p["headers"]["Authorization"], "Bearer x");
    }

    #[test]
    fn sibling_keys_survive_a_nested_update() {
        let mut p = params(json!({ "headers": { "Accept": "text/html" } }));
        set_path(&mut p, "headers.Authorization", json!("token"));
        assert_eq!(p["headers"]["Accept"], "text/html");
        assert_eq!(p["headers"]["Authorization"], "token");
    }

    #[test]
    fn scalar_on_the_path_is_replaced_by_an_object() {
        let mut p = params(json!({ "retry": 3 }));
        set_path(&mut p, "retry.count", json!(5));
        assert_eq!(p["retry"], json!({ "count": 5 }));
    }

    #[test]
    fn empty_path_is_a_no_op() {
        let mut p = params(json!({ "a": 1 }));
        set_path(&mut p, "", json!(2));
        set_path(&mut p, "..", json!(2));
        assert_eq!(Value::Object(p), json!({ "a": 1 }));
    }

    #[test]
    fn get_path_walks_nested_objects() {
        let p = params(json!({ "a": { "b": { "c": 7 } } }));
        assert_eq!(get_path(&p, "a.b.c"), Some(&json!(7)));
        assert_eq!(get_path(&p, "a.x"), None);
        assert_eq!(get_path(&p, "a.b.c.d"), None);
    }
}
