//! Audacity-style label track files
//!
//! One line per event: `start<TAB>end<TAB>label`, times in seconds with six
//! decimals.

use std::path::Path;

use crate::error::{Result, SongError};

use super::LabelEvent;

pub fn format_label_track(events: &[LabelEvent]) -> String {
    events
        .iter()
        .map(|e| {
            let label: String = e
                .label_text
                .chars()
                .map(|c| if c == '\t' || c == '\n' || c == '\r' { ' ' } else { c })
                .collect();
            format!(
                "{:.6}\t{:.6}\t{}\n",
                e.start_time_seconds, e.end_time_seconds, label
            )
        })
        .collect()
}

pub fn write_label_track(path: &Path, events: &[LabelEvent]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SongError::io(parent, e))?;
    }
    std::fs::write(path, format_label_track(events)).map_err(|e| SongError::io(path, e))?;
    log::info!("wrote label track {}", path.display());
    Ok(())
}
