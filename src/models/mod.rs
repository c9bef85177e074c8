//! Data models for NoteWorthy Composer text documents
//!
//! Records and raw lines model the file format itself; elements, staves and
//! documents give the typed view the analysis stages work on.

pub mod document;
pub mod duration;
pub mod elements;
pub mod record;

// Re-export commonly used types
pub use document::*;
pub use duration::{Duration, Rational};
pub use elements::*;
pub use record::{escape, unescape, Field, LineEnding, RawLine, Record};
