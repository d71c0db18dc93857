//! Dotted-path resolution through untyped JSON documents.
//!
//! Documents off the wire are arbitrary mappings, so parent/routing fields
//! are addressed with dotted paths like `doc.brewery_id` and resolved one
//! segment at a time. Descent stops with `None` as soon as a segment is
//! missing or the current node is not a mapping. A trailing empty segment
//! (`"doc."`) returns the child reached so far.

use serde_json::Value;

use crate::mutation::JsonObject;

/// Resolve a dotted path through a JSON mapping.
///
/// Returns the value reached, which may itself be any JSON value; callers
/// that need a string must check the terminal themselves.
pub fn resolve_path<'a>(root: &'a JsonObject, path: &str) -> Option<&'a Value> {
    match path.split_once('.') {
        None => root.get(path),
        Some((segment, rest)) => {
            let current = root.get(segment);
            if rest.is_empty() {
                return current;
            }
            match current {
                Some(Value::Object(map)) => resolve_path(map, rest),
                _ => None,
            }
        }
    }
}

/// Resolve a dotted path and require a string terminal.
pub fn resolve_string_path<'a>(root: &'a JsonObject, path: &str) -> Option<&'a str> {
    resolve_path(root, path).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> JsonObject {
        match json!({
            "meta": { "id": "beer_21st_amendment", "rev": "3-abc" },
            "doc": {
                "name": "Brew Free! or Die IPA",
                "brewery": { "id": "21st_amendment", "city": "San Francisco" },
                "abv": 7.0,
                "available": true
            }
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_single_segment() {
        let root = doc();
        assert!(resolve_path(&root, "meta").is_some());
        assert!(resolve_path(&root, "nope").is_none());
    }

    #[test]
    fn test_nested_path() {
        let root = doc();
        assert_eq!(
            resolve_path(&root, "doc.brewery.city"),
            Some(&json!("San Francisco"))
        );
    }

    #[test]
    fn test_missing_segment_returns_none() {
        let root = doc();
        assert_eq!(resolve_path(&root, "doc.brewery.country"), None);
        assert_eq!(resolve_path(&root, "doc.missing.city"), None);
    }

    #[test]
    fn test_descent_through_non_mapping_returns_none() {
        let root = doc();
        // "name" is a string, not a mapping.
        assert_eq!(resolve_path(&root, "doc.name.anything"), None);
    }

    #[test]
    fn test_trailing_empty_segment_returns_child() {
        let root = doc();
        assert_eq!(
            resolve_path(&root, "doc.brewery."),
            resolve_path(&root, "doc.brewery")
        );
        assert_eq!(resolve_path(&root, "meta."), resolve_path(&root, "meta"));
    }

    #[test]
    fn test_non_string_terminal_returned_as_is() {
        let root = doc();
        assert_eq!(resolve_path(&root, "doc.abv"), Some(&json!(7.0)));
        assert_eq!(resolve_path(&root, "doc.available"), Some(&json!(true)));
    }

    #[test]
    fn test_resolve_string_path() {
        let root = doc();
        assert_eq!(
            resolve_string_path(&root, "doc.brewery.id"),
            Some("21st_amendment")
        );
        // Non-string terminals are rejected.
        assert_eq!(resolve_string_path(&root, "doc.abv"), None);
        assert_eq!(resolve_string_path(&root, "doc.missing"), None);
    }

    #[test]
    fn test_empty_path() {
        let root = doc();
        assert_eq!(resolve_path(&root, ""), None);
    }
}
