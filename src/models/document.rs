//! Notation documents and staves

use std::ops::Range;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::duration::Rational;
use super::elements::Element;
use super::record::{LineEnding, RawLine, Record};

/// Where a document came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentSource {
    /// Parsed from a section file
    Section(PathBuf),
    /// Parsed from text held in memory
    Text,
    /// Produced by concatenating sections
    Merged,
}

/// Where a section begins inside a merged staff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionStart {
    pub name: String,
    /// Segment index of the section's first content
    pub segment: u32,
    /// Index into `Staff::elements` of the section's first element
    pub element_index: usize,
}

/// Visibility data from the first `StaffProperties` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffDisplay {
    pub visible: Option<bool>,
    pub ending_bar: Option<String>,
}

/// Playback data from the second `StaffProperties` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffPlayback {
    pub muted: bool,
    pub volume: Option<u8>,
}

/// Tags that belong to a staff's prelude when they directly follow `AddStaff`
pub const PRELUDE_TAGS: &[&str] = &["StaffProperties", "StaffInstrument", "Lyrics"];

pub fn is_prelude_tag(tag: &str) -> bool {
    PRELUDE_TAGS.contains(&tag) || lyric_verse_number(tag).is_some()
}

/// `Lyric3` -> `Some(3)`
pub fn lyric_verse_number(tag: &str) -> Option<u32> {
    let digits = tag.strip_prefix("Lyric")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub name: String,
    pub add_staff: Record,
    pub prelude: Vec<Record>,
    pub elements: Vec<Element>,
    /// Filled in by concatenation, empty for single section documents
    pub section_starts: Vec<SectionStart>,
}

impl Staff {
    /// The `ordinal`-th `StaffProperties` line of the prelude (0-based)
    pub fn properties_line(&self, ordinal: usize) -> Option<&Record> {
        self.prelude
            .iter()
            .filter(|r| r.tag() == "StaffProperties")
            .nth(ordinal)
    }

    fn properties_line_mut(&mut self, ordinal: usize) -> Option<&mut Record> {
        self.prelude
            .iter_mut()
            .filter(|r| r.tag() == "StaffProperties")
            .nth(ordinal)
    }

    pub fn display(&self) -> Option<StaffDisplay> {
        let line = self.properties_line(0)?;
        Some(StaffDisplay {
            visible: line.value("Visible").map(|v| v == "Y"),
            ending_bar: line.text("EndingBar"),
        })
    }

    pub fn playback(&self) -> Option<StaffPlayback> {
        let line = self.properties_line(1)?;
        Some(StaffPlayback {
            muted: line.value("Muted") == Some("Y"),
            volume: line.value("Volume").and_then(|v| v.parse().ok()),
        })
    }

    /// Rewrite the playback line. Returns false when the staff has none.
    pub fn set_playback(&mut self, muted: bool, volume: u8) -> bool {
        match self.properties_line_mut(1) {
            Some(line) => {
                line.set("Muted", if muted { "Y" } else { "N" }, false);
                line.set("Volume", volume.to_string(), false);
                true
            }
            None => false,
        }
    }

    pub fn lyric_line(&self, verse: u32) -> Option<&Record> {
        self.prelude
            .iter()
            .find(|r| lyric_verse_number(r.tag()) == Some(verse))
    }

    /// Unescaped text of verse `verse`
    pub fn lyric_verse(&self, verse: u32) -> Option<String> {
        self.lyric_line(verse).and_then(|r| r.text("Text"))
    }

    pub fn bar_count(&self) -> usize {
        self.elements.iter().filter(|e| e.is_bar()).count()
    }

    pub fn ends_with_bar(&self) -> bool {
        self.elements.last().map_or(false, Element::is_bar)
    }

    /// Split the elements at barlines; there is always one more segment
    /// than there are bars
    pub fn segments(&self) -> Vec<Segment<'_>> {
        let mut segments = Vec::with_capacity(self.bar_count() + 1);
        let mut start = 0;
        for (i, element) in self.elements.iter().enumerate() {
            if element.is_bar() {
                segments.push(Segment {
                    index: segments.len() as u32,
                    range: start..i,
                    elements: &self.elements[start..i],
                });
                start = i + 1;
            }
        }
        segments.push(Segment {
            index: segments.len() as u32,
            range: start..self.elements.len(),
            elements: &self.elements[start..],
        });
        segments
    }

    /// Segment index of the first text marker reading exactly `marker`
    pub fn marker_segment(&self, marker: &str) -> Option<u32> {
        self.elements.iter().find_map(|e| match e {
            Element::Text(text) if text.text.trim() == marker => Some(text.bar),
            _ => None,
        })
    }

    /// Element ranges per merged section, in order
    pub fn section_ranges(&self) -> Vec<(&str, Range<usize>)> {
        self.section_starts
            .iter()
            .enumerate()
            .map(|(i, start)| {
                let end = self
                    .section_starts
                    .get(i + 1)
                    .map_or(self.elements.len(), |next| next.element_index);
                (start.name.as_str(), start.element_index..end)
            })
            .collect()
    }

    fn write_lines<'a>(&'a self, out: &mut Vec<(&'a str, Option<LineEnding>)>) {
        out.push((self.add_staff.raw(), self.add_staff.ending()));
        out.extend(self.prelude.iter().map(|r| (r.raw(), r.ending())));
        out.extend(self.elements.iter().map(|e| (e.raw(), e.ending())));
    }
}

/// The elements between two consecutive bars of one staff
#[derive(Debug, Clone)]
pub struct Segment<'a> {
    pub index: u32,
    pub range: Range<usize>,
    pub elements: &'a [Element],
}

impl Segment<'_> {
    /// A segment is a measure when it holds at least one note or rest
    pub fn is_measure(&self) -> bool {
        self.elements
            .iter()
            .any(|e| matches!(e, Element::NoteOrRest(_)))
    }

    /// Summed note and rest lengths in whole notes
    pub fn length(&self) -> Rational {
        self.elements
            .iter()
            .filter_map(|e| match e {
                Element::NoteOrRest(note) => Some(note.duration.whole_notes()),
                _ => None,
            })
            .fold(Rational::from_integer(0), |acc, len| acc + len)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotationDocument {
    pub source: DocumentSource,
    pub header: Vec<RawLine>,
    pub staves: Vec<Staff>,
    pub trailer: Vec<RawLine>,
    /// Terminator for lines that were not read from a file
    pub line_ending: LineEnding,
    pub final_newline: bool,
}

impl NotationDocument {
    pub fn staff(&self, name: &str) -> Option<&Staff> {
        self.staves.iter().find(|s| s.name == name)
    }

    pub fn staff_mut(&mut self, name: &str) -> Option<&mut Staff> {
        self.staves.iter_mut().find(|s| s.name == name)
    }

    pub fn staff_names(&self) -> Vec<String> {
        self.staves.iter().map(|s| s.name.clone()).collect()
    }

    pub fn header_record(&self, tag: &str) -> Option<&Record> {
        self.header
            .iter()
            .filter_map(RawLine::as_record)
            .find(|r| r.tag() == tag)
    }

    /// `SongInfo|Title`, if present and non-empty
    pub fn title(&self) -> Option<String> {
        self.header_record("SongInfo")
            .and_then(|r| r.text("Title"))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// `PgSetup|StartingBar`
    pub fn starting_bar(&self) -> Option<i32> {
        self.header_record("PgSetup")
            .and_then(|r| r.value("StartingBar"))
            .and_then(|v| v.trim().parse().ok())
    }

    /// Render the document back to `.nwctxt` text. Every line is written
    /// with the terminator it was read with.
    pub fn serialize(&self) -> String {
        let mut lines: Vec<(&str, Option<LineEnding>)> = Vec::new();
        lines.extend(self.header.iter().map(|l| (l.raw(), l.ending())));
        for staff in &self.staves {
            staff.write_lines(&mut lines);
        }
        lines.extend(self.trailer.iter().map(|l| (l.raw(), l.ending())));

        let mut out = String::new();
        let last = lines.len().saturating_sub(1);
        for (i, (text, ending)) in lines.into_iter().enumerate() {
            out.push_str(text);
            if i < last || self.final_newline {
                out.push_str(ending.unwrap_or(self.line_ending).as_str());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lyric_verse_number() {
        assert_eq!(lyric_verse_number("Lyric1"), Some(1));
        assert_eq!(lyric_verse_number("Lyric12"), Some(12));
        assert_eq!(lyric_verse_number("Lyrics"), None);
        assert_eq!(lyric_verse_number("Lyric"), None);
    }

    #[test]
    fn test_prelude_tags() {
        assert!(is_prelude_tag("StaffProperties"));
        assert!(is_prelude_tag("Lyric2"));
        assert!(!is_prelude_tag("Clef"));
    }
}
