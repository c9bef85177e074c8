//! Section concatenation
//!
//! A song is written as one `.nwctxt` file per section. The concatenator
//! merges them into a single document: the first section supplies header,
//! trailer and staff preludes, later sections contribute their staff bodies
//! and lyric verses. Bars are renumbered across the whole song and text
//! markers keep their position.

pub mod sequence;

pub use sequence::SongSequence;

use crate::error::ConcatError;
use crate::models::{
    escape, lyric_verse_number, Bar, DocumentSource, Element, NotationDocument, Record,
    SectionStart, Staff,
};
use crate::parse::{distribute_lyrics, fit_verse, syllable_slots};

/// One parsed section file with the name it has in the song sequence
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub document: NotationDocument,
}

impl Section {
    pub fn new(name: impl Into<String>, document: NotationDocument) -> Self {
        Self {
            name: name.into(),
            document,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SectionConcatenator {
    keep_all_tempi: bool,
}

impl SectionConcatenator {
    pub fn new(keep_all_tempi: bool) -> Self {
        Self { keep_all_tempi }
    }

    /// Merge `sections` in order into a new document
    pub fn concatenate(&self, sections: &[Section]) -> Result<NotationDocument, ConcatError> {
        let (first, rest) = sections.split_first().ok_or(ConcatError::NoSections)?;

        let expected = first.document.staff_names();
        for (i, section) in rest.iter().enumerate() {
            let found = section.document.staff_names();
            if found != expected {
                return Err(ConcatError::StaffOrderMismatch {
                    section: section.name.clone(),
                    position: i + 2,
                    expected,
                    found,
                });
            }
        }

        let mut merged = first.document.clone();
        merged.source = DocumentSource::Merged;
        for staff in &mut merged.staves {
            staff.section_starts = vec![SectionStart {
                name: first.name.clone(),
                segment: 0,
                element_index: 0,
            }];
        }

        for section in rest {
            log::info!("appending section `{}`", section.name);
            for (target, staff) in merged.staves.iter_mut().zip(&section.document.staves) {
                self.append_staff(target, staff, &section.name);
            }
        }

        for staff in &mut merged.staves {
            if let Some(verse) = staff.lyric_verse(1) {
                distribute_lyrics(&verse, &mut staff.elements);
            }
        }

        log::info!(
            "merged {} sections into {} staves",
            sections.len(),
            merged.staves.len()
        );
        Ok(merged)
    }

    fn append_staff(&self, target: &mut Staff, staff: &Staff, section: &str) {
        merge_lyrics(target, &staff.prelude);

        let body = self.section_body(staff);
        let starts_with_bar = body.first().map_or(false, Element::is_bar);

        let mut bars = target.bar_count() as u32;
        if !target.elements.is_empty() && !target.ends_with_bar() && !starts_with_bar {
            bars += 1;
            target.elements.push(Element::Bar(Bar::double(bars)));
        }

        target.section_starts.push(SectionStart {
            name: section.to_string(),
            segment: bars + u32::from(starts_with_bar),
            element_index: target.elements.len(),
        });

        for mut element in body {
            match &mut element {
                Element::Bar(bar) => bar.number += bars,
                Element::Text(text) => text.bar += bars,
                _ => {}
            }
            target.elements.push(element);
        }
    }

    /// The staff body with section-level duplicates removed
    fn section_body(&self, staff: &Staff) -> Vec<Element> {
        let mut seen_bar = false;
        staff
            .elements
            .iter()
            .filter(|element| {
                seen_bar |= element.is_bar();
                match element {
                    Element::Tempo(_) | Element::TimeSignature(_) => self.keep_all_tempi,
                    Element::Unknown(line) if !seen_bar && line.tag() == Some("Clef") => false,
                    _ => true,
                }
            })
            .cloned()
            .collect()
    }
}

/// Append each `Lyric<n>` verse of a later section to verse `n` of the
/// merged staff.
///
/// The merged verse is first fitted to the notes already in the staff, so
/// the new section's syllables start on its own first sung note when the
/// merged verse is handed out again.
fn merge_lyrics(target: &mut Staff, prelude: &[Record]) {
    let slots = syllable_slots(&target.elements);
    for line in prelude {
        let Some(verse) = lyric_verse_number(line.tag()) else {
            continue;
        };
        let Some(addition) = line.text("Text").filter(|t| !t.trim().is_empty()) else {
            continue;
        };

        let existing = target
            .prelude
            .iter()
            .position(|r| lyric_verse_number(r.tag()) == Some(verse));
        let current = existing
            .and_then(|i| target.prelude[i].text("Text"))
            .unwrap_or_default();
        let fitted = fit_verse(&current, slots);
        let joined = if fitted.is_empty() {
            addition
        } else {
            format!("{}\n{}", fitted, addition)
        };

        match existing {
            Some(i) => target.prelude[i].set("Text", escape(&joined), true),
            None => {
                log::debug!("adding verse {} to staff `{}`", verse, target.name);
                let mut added = line.clone();
                added.set("Text", escape(&joined), true);
                target.prelude.push(added);
            }
        }
    }
}

/// Convenience wrapper around [`SectionConcatenator::concatenate`]
pub fn concatenate(
    sections: &[Section],
    keep_all_tempi: bool,
) -> Result<NotationDocument, ConcatError> {
    SectionConcatenator::new(keep_all_tempi).concatenate(sections)
}
