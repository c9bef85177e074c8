//! Parsing of NoteWorthy Composer `.nwctxt` files

pub mod document;
pub mod lyrics;
pub mod tokens;

pub use document::{parse_document, parse_signature};
pub use lyrics::{distribute_lyrics, fit_verse, parse_syllables, syllable_slots, SKIP_SYLLABLE};
pub use tokens::tokenize_line;

use std::path::Path;

use crate::error::{Result, SongError};
use crate::models::{DocumentSource, NotationDocument};

/// Read and parse one notation file
pub fn read_document(path: &Path) -> Result<NotationDocument> {
    let text = std::fs::read_to_string(path).map_err(|e| SongError::io(path, e))?;
    parse_document(&text, DocumentSource::Section(path.to_path_buf())).map_err(|source| {
        SongError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })
}
