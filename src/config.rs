//! Pipeline configuration
//!
//! Loaded from a JSONC file (usually `paths.jsonc`). Every field has a
//! default, so an empty object is a valid configuration. Relative folders
//! are resolved against the directory holding the configuration file.
//!
//! ```jsonc
//! {
//!     "input_folder": "../liederen",     // one folder per song
//!     "output_folder": "../output",
//!     "audio_output_folder": "../audio",
//!     "lyrics_staff": "Zang",
//!     "rhythm_staff": "Bass"
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SongError};
use crate::utils::jsonc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Staff whose lyrics are mapped to measures
    pub lyrics_staff: String,
    /// Staff that defines the measure grid and timing
    pub rhythm_staff: String,
    /// Text marker where the song proper begins
    pub song_start_marker: String,
    /// Prefix of text markers that become label track events
    pub label_marker: String,
    /// Keep tempo and time signature changes of later sections
    pub keep_all_tempi: bool,
    pub input_folder: PathBuf,
    pub output_folder: PathBuf,
    pub audio_output_folder: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lyrics_staff: "Zang".to_string(),
            rhythm_staff: "Bass".to_string(),
            song_start_marker: "liedstart".to_string(),
            label_marker: "LBLTRCK".to_string(),
            keep_all_tempi: false,
            input_folder: PathBuf::from("."),
            output_folder: PathBuf::from("output"),
            audio_output_folder: PathBuf::from("audio"),
        }
    }
}

impl PipelineConfig {
    pub fn from_jsonc(text: &str) -> std::result::Result<Self, serde_json::Error> {
        jsonc::from_str(text)
    }

    /// Load a configuration file and resolve its folders
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SongError::io(path, e))?;
        let mut config = Self::from_jsonc(&text).map_err(|e| SongError::config(path, e))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_relative_to(base);
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn resolve_relative_to(&mut self, base: &Path) {
        for folder in [
            &mut self.input_folder,
            &mut self.output_folder,
            &mut self.audio_output_folder,
        ] {
            if folder.is_relative() {
                *folder = base.join(&*folder);
            }
        }
    }

    /// `<input_folder>/<song>`
    pub fn song_folder(&self, song: &str) -> PathBuf {
        self.input_folder.join(song)
    }

    /// `<input_folder>/<song>/nwc`
    pub fn nwc_folder(&self, song: &str) -> PathBuf {
        self.song_folder(song).join("nwc")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = PipelineConfig::from_jsonc("{ /* nothing */ }").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.rhythm_staff, "Bass");
    }

    #[test]
    fn test_relative_folders_resolve_against_base() {
        let mut config = PipelineConfig::from_jsonc(
            r#"{"input_folder": "songs", "output_folder": "/abs/out"}"#,
        )
        .unwrap();
        config.resolve_relative_to(Path::new("/etc/nwc"));
        assert_eq!(config.input_folder, PathBuf::from("/etc/nwc/songs"));
        assert_eq!(config.output_folder, PathBuf::from("/abs/out"));
        assert_eq!(
            config.nwc_folder("Lied 3"),
            PathBuf::from("/etc/nwc/songs/Lied 3/nwc")
        );
    }
}
