use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::records::HighlightRecord;

/// Write records as a JSON array, compact or indented. Parent directories
/// are created as needed.
pub fn export_to_json(records: &[HighlightRecord], path: &Path, pretty: bool) -> Result<()> {
    write_records(records, path, pretty).inspect_err(|e| {
        error!("Failed to write JSON output to '{}': {:#}", path.display(), e);
    })?;
    info!("Exported {} record(s) to {}", records.len(), path.display());
    Ok(())
}

fn write_records(records: &[HighlightRecord], path: &Path, pretty: bool) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, records)?;
    } else {
        serde_json::to_writer(&mut writer, records)?;
    }
    writer.flush()?;
    Ok(())
}
