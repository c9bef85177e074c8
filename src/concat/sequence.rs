//! Song sequence files (`<song> volgorde.jsonc`)
//!
//! ```jsonc
//! {
//!     // order in which the sections are sung
//!     "songstructure": ["intro", "couplet", "refrein", "couplet", "refrein"]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SongError};
use crate::utils::jsonc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongSequence {
    /// Section names in playing order; names may repeat
    #[serde(rename = "songstructure")]
    pub sections: Vec<String>,
}

impl SongSequence {
    pub fn from_jsonc(text: &str) -> std::result::Result<Self, serde_json::Error> {
        jsonc::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SongError::io(path, e))?;
        let sequence = Self::from_jsonc(&text).map_err(|e| SongError::Sequence {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if sequence.sections.iter().any(|s| s.trim().is_empty()) {
            return Err(SongError::Sequence {
                path: path.to_path_buf(),
                reason: "empty section name".to_string(),
            });
        }
        Ok(sequence)
    }

    /// `<nwc_folder>/<song> volgorde.jsonc`
    pub fn path_for(nwc_folder: &Path, song: &str) -> PathBuf {
        nwc_folder.join(format!("{} volgorde.jsonc", song))
    }

    /// `<nwc_folder>/<song> <section>.nwctxt`
    pub fn section_path(nwc_folder: &Path, song: &str, section: &str) -> PathBuf {
        nwc_folder.join(format!("{} {}.nwctxt", song, section))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_with_comments_and_repeats() {
        let text = r#"{
            // verse/chorus form
            "songstructure": ["intro", "couplet", "refrein", "couplet", /* last */ "refrein"]
        }"#;
        let sequence = SongSequence::from_jsonc(text).unwrap();
        assert_eq!(sequence.sections.len(), 5);
        assert_eq!(sequence.sections[3], "couplet");
    }

    #[test]
    fn test_section_path() {
        let path = SongSequence::section_path(Path::new("/songs/Lied 12/nwc"), "Lied 12", "intro");
        assert_eq!(path, PathBuf::from("/songs/Lied 12/nwc/Lied 12 intro.nwctxt"));
    }
}
