//! NoteWorthy Composer song builder
//!
//! Parses `.nwctxt` section files, merges them into one song, maps lyric
//! syllables to measures and derives timed label tracks and structure facts.

pub mod analysis;
pub mod audio;
pub mod concat;
pub mod config;
pub mod error;
pub mod facts;
pub mod layout_rules;
pub mod models;
pub mod parse;
pub mod pipeline;
pub mod timing;
pub mod utils;

// Re-export commonly used types
pub use analysis::{MeasureAnalysis, MeasureAnalyzer, MeasureMapEntry, SongTimingFacts};
pub use concat::{Section, SectionConcatenator};
pub use config::PipelineConfig;
pub use error::{AnalysisError, ConcatError, ParseError, SongError, TimingError};
pub use models::{DocumentSource, Element, NotationDocument, Staff};
pub use parse::parse_document;
pub use timing::{LabelEvent, TimingEngine, TimingReport};
