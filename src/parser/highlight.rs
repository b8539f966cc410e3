use std::collections::HashSet;

use serde_json::{Map, Value};

use super::timestamp::normalize_timestamp;
use crate::records::{HighlightRecord, SnapRecord};

/// Build a record from a highlight-shaped object. `snaps` is its snap list.
pub fn build_highlight(
    obj: &Map<String, Value>,
    snaps: &[Value],
    username: &str,
) -> HighlightRecord {
    let snap_list = snaps
        .iter()
        .enumerate()
        .filter_map(|(idx, snap)| snap.as_object().map(|s| build_snap(s, idx)))
        .collect();

    HighlightRecord {
        snap_list,
        story_title: first_text(obj, &["storyTitle", "title"]),
        thumbnail_url: first_text(obj, &["thumbnailUrl", "thumbnail"]),
        highlight_id: first_text(obj, &["highlightId", "id"]),
        username: username.to_string(),
    }
}

fn build_snap(snap: &Map<String, Value>, idx: usize) -> SnapRecord {
    let snap_index = snap
        .get("snapIndex")
        .and_then(Value::as_i64)
        .unwrap_or(idx as i64);

    SnapRecord {
        snap_index,
        create_time: normalize_timestamp(snap.get("createTime")),
        media_preview_url: first_text(snap, &["mediaPreviewUrl", "mediaUrl"]),
        media_url: first_text(snap, &["mediaUrl"]),
    }
}

/// First key holding a usable value. Empty strings, zero, null, booleans
/// and containers are skipped; numbers come back as their JSON text.
fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| match obj.get(*key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

/// Keep the first record per `highlightId`/`username`, in first-seen order.
/// Later duplicates are dropped whole; snap lists are never merged.
pub fn dedup(records: Vec<HighlightRecord>) -> Vec<HighlightRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.dedup_key()))
        .collect()
}
