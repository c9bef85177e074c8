//! Typed staff elements
//!
//! Each element keeps the record it was parsed from so untouched elements
//! serialize back to their original text.

use serde::{Deserialize, Serialize};

use super::duration::Duration;
use super::record::{Field, LineEnding, RawLine, Record};

/// A barline; `number` counts bars within the staff starting at 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub number: u32,
    pub style: Option<String>,
    pub record: Record,
}

impl Bar {
    /// A `|Bar|Style:Double` line, used to join sections
    pub fn double(number: u32) -> Self {
        Self {
            number,
            style: Some("Double".to_string()),
            record: Record::new("Bar", vec![Field::new("Style", "Double")]),
        }
    }
}

/// `Note`, `Chord`, `RestChord` or `Rest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteOrRest {
    pub duration: Duration,
    pub is_rest: bool,
    pub lyric_syllable: Option<String>,
    /// Slurred or tied into the next note, so the next note sings no new
    /// syllable
    pub extends_syllable: bool,
    /// The syllable came from an explicit `Lyric:` field on the note
    pub explicit_lyric: bool,
    pub record: Record,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoMarker {
    pub bpm: u32,
    pub record: Record,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignatureMarker {
    pub numerator: u32,
    pub denominator: u32,
    pub record: Record,
}

impl TimeSignatureMarker {
    pub fn signature(&self) -> String {
        format!("{}/{}", self.numerator, self.denominator)
    }
}

/// A `|Text|` element; `bar` is the number of bars preceding it in the staff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMarker {
    pub text: String,
    pub bar: u32,
    pub record: Record,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Element {
    Bar(Bar),
    NoteOrRest(NoteOrRest),
    Tempo(TempoMarker),
    TimeSignature(TimeSignatureMarker),
    Text(TextMarker),
    /// Anything else (clefs, keys, dynamics, directives) kept verbatim
    Unknown(RawLine),
}

impl Element {
    pub fn raw(&self) -> &str {
        match self {
            Element::Bar(bar) => bar.record.raw(),
            Element::NoteOrRest(note) => note.record.raw(),
            Element::Tempo(tempo) => tempo.record.raw(),
            Element::TimeSignature(sig) => sig.record.raw(),
            Element::Text(text) => text.record.raw(),
            Element::Unknown(line) => line.raw(),
        }
    }

    pub fn ending(&self) -> Option<LineEnding> {
        match self {
            Element::Bar(bar) => bar.record.ending(),
            Element::NoteOrRest(note) => note.record.ending(),
            Element::Tempo(tempo) => tempo.record.ending(),
            Element::TimeSignature(sig) => sig.record.ending(),
            Element::Text(text) => text.record.ending(),
            Element::Unknown(line) => line.ending(),
        }
    }

    /// Record tag, `None` for blank and directive lines
    pub fn tag(&self) -> Option<&str> {
        match self {
            Element::Bar(bar) => Some(bar.record.tag()),
            Element::NoteOrRest(note) => Some(note.record.tag()),
            Element::Tempo(tempo) => Some(tempo.record.tag()),
            Element::TimeSignature(sig) => Some(sig.record.tag()),
            Element::Text(text) => Some(text.record.tag()),
            Element::Unknown(line) => line.tag(),
        }
    }

    pub fn is_bar(&self) -> bool {
        matches!(self, Element::Bar(_))
    }
}
