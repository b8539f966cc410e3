use serde_json::{Map, Value};

use super::highlight::build_highlight;
use crate::records::HighlightRecord;

/// Key whose array value marks an object as a highlight.
pub const SNAP_LIST_KEY: &str = "snapList";

/// Collect every highlight-shaped object in `node`, depth-first pre-order.
pub fn walk(node: &Value, username: &str) -> Vec<HighlightRecord> {
    let mut out = Vec::new();
    walk_into(node, username, &mut out);
    out
}

fn walk_into(node: &Value, username: &str, out: &mut Vec<HighlightRecord>) {
    match node {
        Value::Object(obj) => {
            if let Some(snaps) = snap_list(obj) {
                out.push(build_highlight(obj, snaps, username));
            }
            // Wrappers can hold further highlights even when they are one.
            for value in obj.values() {
                walk_into(value, username, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_into(item, username, out);
            }
        }
        _ => {}
    }
}

fn snap_list(obj: &Map<String, Value>) -> Option<&[Value]> {
    match obj.get(SNAP_LIST_KEY) {
        Some(Value::Array(snaps)) => Some(snaps.as_slice()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(records: &[HighlightRecord]) -> Vec<&str> {
        records.iter().map(|r| r.highlight_id.as_str()).collect()
    }

    #[test]
    fn finds_highlights_at_any_depth() {
        let tree = json!({
            "page": {
                "props": [
                    {"stories": {"snapList": [], "id": "a"}},
                    [[{"snapList": [], "id": "b"}]]
                ]
            }
        });
        assert_eq!(ids(&walk(&tree, "u")), vec!["a", "b"]);
    }

    #[test]
    fn parent_is_emitted_before_nested_highlights() {
        let tree = json!({
            "snapList": [],
            "id": "outer",
            "more": {"items": [{"snapList": [], "id": "inner"}]}
        });
        assert_eq!(ids(&walk(&tree, "u")), vec!["outer", "inner"]);
    }

    #[test]
    fn highlights_inside_snap_list_are_found() {
        let tree = json!({
            "snapList": [{"snapList": [], "id": "nested"}],
            "id": "outer"
        });
        assert_eq!(ids(&walk(&tree, "u")), vec!["outer", "nested"]);
    }

    #[test]
    fn non_array_snap_list_is_not_a_highlight() {
        let tree = json!([
            {"snapList": "nope", "id": "x"},
            {"snapList": null, "id": "y"},
            {"snaplist": [], "id": "z"}
        ]);
        assert!(walk(&tree, "u").is_empty());
    }

    #[test]
    fn scalars_yield_nothing() {
        assert!(walk(&json!("snapList"), "u").is_empty());
        assert!(walk(&json!(3), "u").is_empty());
        assert!(walk(&json!(null), "u").is_empty());
    }

    #[test]
    fn duplicates_are_kept() {
        let tree = json!([{"snapList": [], "id": "a"}, {"snapList": [], "id": "a"}]);
        assert_eq!(walk(&tree, "u").len(), 2);
    }
}
