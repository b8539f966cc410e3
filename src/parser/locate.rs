use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// `__INITIAL_STATE__ = {...};</script>` style page state assignment.
static STATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?si)__INITIAL_STATE__\s*=\s*(\{.*?\})\s*;</").unwrap()
});

/// Brace span holding `"snapList"`. Only matches spans with no nested braces,
/// so fragments cut out of deeper structures come back truncated and fail to
/// parse downstream. That loss is accepted.
static FRAGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?si)(\{[^{}]*"snapList"[^{}]*\})"#).unwrap());

/// What the locator found in a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Located {
    /// A state blob that parsed as JSON; fragments were not consulted.
    State(Value),
    /// Candidate fragments, still unparsed. May be empty.
    Fragments(Vec<String>),
}

pub fn locate(html: &str) -> Located {
    match extract_state_json(html) {
        Some(state) => {
            debug!("Found __INITIAL_STATE__ JSON blob");
            Located::State(state)
        }
        None => Located::Fragments(extract_json_fragments(html)),
    }
}

fn extract_state_json(html: &str) -> Option<Value> {
    let raw = STATE_RE.captures(html)?.get(1)?.as_str();
    match serde_json::from_str(raw) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!("Failed to parse __INITIAL_STATE__ JSON: {}", e);
            None
        }
    }
}

fn extract_json_fragments(html: &str) -> Vec<String> {
    let fragments: Vec<String> = FRAGMENT_RE
        .captures_iter(html)
        .map(|caps| caps[1].to_string())
        .collect();
    debug!(
        "Found {} potential JSON fragment(s) with 'snapList'",
        fragments.len()
    );
    fragments
}

/// Parse one fragment; malformed ones are dropped.
pub fn parse_fragment(fragment: &str) -> Option<Value> {
    match serde_json::from_str(fragment) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!("Skipping unparseable fragment: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn state_blob_wins() {
        let html = r#"<script>window.__INITIAL_STATE__ = {"a":{"snapList":[]}};</script>
            <div data-x='{"snapList":[],"id":"frag"}'></div>"#;
        assert_eq!(
            locate(html),
            Located::State(json!({"a": {"snapList": []}}))
        );
    }

    #[test]
    fn state_blob_spans_lines() {
        let html = "<script>\n__initial_state__ =\n{\n\"k\": 1\n}\n;</script>";
        assert_eq!(locate(html), Located::State(json!({"k": 1})));
    }

    #[test]
    fn broken_state_falls_back_to_fragments() {
        let html = r#"<script>__INITIAL_STATE__ = {"snapList": [1,};</script>
            <p>{"snapList":[],"id":"x"}</p>"#;
        match locate(html) {
            Located::Fragments(frags) => {
                // The broken blob itself also has the fragment shape.
                assert_eq!(
                    frags,
                    vec![
                        r#"{"snapList": [1,}"#.to_string(),
                        r#"{"snapList":[],"id":"x"}"#.to_string(),
                    ]
                );
                assert!(parse_fragment(&frags[0]).is_none());
            }
            other => panic!("expected fragments, got {:?}", other),
        }
    }

    #[test]
    fn missing_marker_scans_fragments() {
        let html = r#"<p>{"snapList":[],"id":"a"}</p><p>{"other":1}</p><p>{"snapList":[], "id":"b"}</p>"#;
        match locate(html) {
            Located::Fragments(frags) => assert_eq!(frags.len(), 2),
            other => panic!("expected fragments, got {:?}", other),
        }
    }

    #[test]
    fn nested_braces_yield_innermost_span() {
        // The snap objects contain braces, so only a truncated span matches.
        let html = r#"{"snapList":[{"mediaUrl":"u"}],"id":"a"}"#;
        match locate(html) {
            Located::Fragments(frags) => assert!(frags.is_empty()),
            other => panic!("expected fragments, got {:?}", other),
        }
    }

    #[test]
    fn no_candidates_is_empty() {
        assert_eq!(
            locate("<html><body>nothing here</body></html>"),
            Located::Fragments(Vec::new())
        );
    }

    #[test]
    fn parse_fragment_skips_garbage() {
        assert!(parse_fragment(r#"{"snapList":[]}"#).is_some());
        assert!(parse_fragment(r#"{"snapList":[,]}"#).is_none());
    }
}
