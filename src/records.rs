use serde::{Deserialize, Serialize};

/// One media item inside a highlight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapRecord {
    pub snap_index: i64,
    /// ISO-8601 UTC with a `Z` suffix, or empty when the source had no usable time.
    pub create_time: String,
    pub media_preview_url: String,
    pub media_url: String,
}

/// A story highlight as written to the export file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightRecord {
    pub snap_list: Vec<SnapRecord>,
    pub story_title: String,
    pub thumbnail_url: String,
    pub highlight_id: String,
    pub username: String,
}

impl HighlightRecord {
    /// Identity used when dropping repeated highlights.
    pub fn dedup_key(&self) -> String {
        format!("{}-{}", self.highlight_id, self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case_in_field_order() {
        let record = HighlightRecord {
            snap_list: vec![SnapRecord {
                snap_index: 0,
                create_time: "2024-01-01T00:00:00Z".into(),
                media_preview_url: "p".into(),
                media_url: "m".into(),
            }],
            story_title: "T".into(),
            thumbnail_url: String::new(),
            highlight_id: "h1".into(),
            username: "alice".into(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"snapList":[{"snapIndex":0,"createTime":"2024-01-01T00:00:00Z","mediaPreviewUrl":"p","mediaUrl":"m"}],"storyTitle":"T","thumbnailUrl":"","highlightId":"h1","username":"alice"}"#
        );
    }

    #[test]
    fn dedup_key_joins_id_and_username() {
        let record = HighlightRecord {
            snap_list: Vec::new(),
            story_title: String::new(),
            thumbnail_url: String::new(),
            highlight_id: "abc".into(),
            username: "bob".into(),
        };
        assert_eq!(record.dedup_key(), "abc-bob");
    }
}
