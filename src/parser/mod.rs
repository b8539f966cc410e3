pub mod highlight;
pub mod locate;
pub mod timestamp;
pub mod walk;

use tracing::debug;

use crate::records::HighlightRecord;
use locate::Located;

/// Three-stage pipeline: html → candidate JSON → highlight objects → deduplicated records.
pub fn parse_from_html(html: &str, username: &str) -> Vec<HighlightRecord> {
    let found = match locate::locate(html) {
        Located::State(state) => walk::walk(&state, username),
        Located::Fragments(fragments) => fragments
            .iter()
            .filter_map(|frag| locate::parse_fragment(frag))
            .flat_map(|data| walk::walk(&data, username))
            .collect(),
    };

    let total = found.len();
    let records = highlight::dedup(found);
    debug!(
        "{}: {} highlight object(s), {} after dedup",
        username,
        total,
        records.len()
    );
    records
}

// ── Tests ──
