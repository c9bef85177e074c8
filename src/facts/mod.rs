//! Structural song facts
//!
//! Collects what the lyrics sheet and the structure document need to know
//! about a merged song: title, meter, tempo, duration and the per-section
//! measure counts with their chord summaries.

pub mod templates;

pub use templates::{
    apply_lyrics_commands, escape_latex, render_structure, render_template, StructureContext,
};

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analysis::{song_id_from_name, MeasureAnalysis};
use crate::models::{Element, NotationDocument, Staff};
use crate::timing::TimingReport;

/// Text markers starting with this prefix name the chord of the following
/// measures
pub const CHORD_PREFIX: &str = "akk:";

/// One entry of the song sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionFacts {
    /// 1-based position in the sequence
    pub order: usize,
    pub name: String,
    pub measures: u32,
    pub start_seconds: Option<f64>,
    pub chords: ChordSummary,
}

/// Chords of one section, e.g. `B, F#, E(2)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChordSummary {
    pub text: String,
    /// Measures covered by a chord marker
    pub measures: u32,
}

impl ChordSummary {
    pub fn is_empty(&self) -> bool {
        self.text == "-"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuralFacts {
    pub title: String,
    pub song_id: Option<String>,
    pub total_measures: u32,
    pub tempo_bpm: Option<u32>,
    pub time_signature: Option<String>,
    pub duration_seconds: Option<f64>,
    pub has_pickup_measure: bool,
    pub lead_in_measures: u32,
    pub sections: Vec<SectionFacts>,
}

impl StructuralFacts {
    /// Gather facts from a merged document and its analysis results.
    ///
    /// `song_name` is the folder/file name of the song; it supplies the song
    /// id and the title when the document has none.
    pub fn collect(
        doc: &NotationDocument,
        analysis: &MeasureAnalysis,
        timing: &TimingReport,
        rhythm_staff: &str,
        song_name: &str,
    ) -> Self {
        let sections = doc
            .staff(rhythm_staff)
            .map(|rhythm| section_facts(doc, rhythm, timing, song_name))
            .unwrap_or_default();

        Self {
            title: analysis
                .title
                .clone()
                .unwrap_or_else(|| song_name.to_string()),
            song_id: song_id_from_name(song_name),
            total_measures: analysis.facts.total_measures,
            tempo_bpm: timing.tempo_bpm,
            time_signature: timing.time_signature.map(|(n, d)| format!("{}/{}", n, d)),
            duration_seconds: timing.total_duration_seconds,
            has_pickup_measure: analysis.facts.has_pickup_measure,
            lead_in_measures: analysis.facts.lead_in_measures,
            sections,
        }
    }

    /// Duration as `m:ss`, or `?` when unknown
    pub fn duration_display(&self) -> String {
        match self.duration_seconds {
            Some(seconds) => {
                let total = seconds.round() as u64;
                format!("{}:{:02}", total / 60, total % 60)
            }
            None => "?".to_string(),
        }
    }

    /// Measures summed over the sequence, pickup and lead-in included
    pub fn sequence_measures(&self) -> u32 {
        self.sections.iter().map(|s| s.measures).sum()
    }

    /// First occurrence of every distinct section, in sequence order
    pub fn unique_sections(&self) -> Vec<&SectionFacts> {
        let mut seen = std::collections::HashSet::new();
        self.sections
            .iter()
            .filter(|s| seen.insert(s.name.as_str()))
            .collect()
    }

    /// Flat key/value view for simple templating
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("title".to_string(), self.title.clone());
        if let Some(id) = &self.song_id {
            map.insert("song_id".to_string(), id.clone());
        }
        map.insert("total_measures".to_string(), self.total_measures.to_string());
        if let Some(tempo) = self.tempo_bpm {
            map.insert("tempo_bpm".to_string(), tempo.to_string());
        }
        if let Some(signature) = &self.time_signature {
            map.insert("time_signature".to_string(), signature.clone());
        }
        if let Some(seconds) = self.duration_seconds {
            map.insert("duration_seconds".to_string(), format!("{:.3}", seconds));
        }
        map.insert("duration".to_string(), self.duration_display());
        map.insert(
            "has_pickup_measure".to_string(),
            self.has_pickup_measure.to_string(),
        );
        map.insert(
            "lead_in_measures".to_string(),
            self.lead_in_measures.to_string(),
        );
        map.insert("section_count".to_string(), self.sections.len().to_string());
        map.insert(
            "sections".to_string(),
            self.sections
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        );
        map
    }
}

fn section_facts(
    doc: &NotationDocument,
    rhythm: &Staff,
    timing: &TimingReport,
    song_name: &str,
) -> Vec<SectionFacts> {
    let ranges = rhythm.section_ranges();
    let segments = rhythm.segments();
    let chord_staff = doc.staves.first();

    if ranges.is_empty() {
        // unmerged document: the whole staff is one section
        let measures = segments.iter().filter(|s| s.is_measure()).count() as u32;
        return vec![SectionFacts {
            order: 1,
            name: song_name.to_string(),
            measures,
            start_seconds: timing.segment_starts.first().copied(),
            chords: chord_staff
                .map(|s| chord_summary(&s.elements))
                .unwrap_or_else(no_chords),
        }];
    }

    let chord_ranges = chord_staff.map(Staff::section_ranges).unwrap_or_default();
    ranges
        .iter()
        .enumerate()
        .map(|(i, (name, range))| {
            let measures = segments
                .iter()
                .filter(|s| s.is_measure() && range.contains(&s.range.start))
                .count() as u32;
            let start_seconds = rhythm
                .section_starts
                .get(i)
                .and_then(|start| timing.segment_starts.get(start.segment as usize))
                .copied();
            let chords = match (chord_staff, chord_ranges.get(i)) {
                (Some(staff), Some((_, chord_range))) => {
                    chord_summary(&staff.elements[chord_range.clone()])
                }
                _ => no_chords(),
            };
            SectionFacts {
                order: i + 1,
                name: name.to_string(),
                measures,
                start_seconds,
                chords,
            }
        })
        .collect()
}

fn no_chords() -> ChordSummary {
    ChordSummary {
        text: "-".to_string(),
        measures: 0,
    }
}

/// Summarise `akk:` chord markers.
///
/// A chord covers the measures from its marker up to the next marker; only
/// measures that contain notes or rests count. Chords covering more than one
/// measure get the count in parentheses.
pub fn chord_summary(elements: &[Element]) -> ChordSummary {
    let mut chords: Vec<(String, u32)> = Vec::new();
    let mut has_content = false;

    for element in elements {
        match element {
            Element::Text(marker) => {
                if let Some(chord) = marker.text.trim().strip_prefix(CHORD_PREFIX) {
                    chords.push((chord.trim().to_string(), 0));
                    has_content = false;
                }
            }
            Element::NoteOrRest(_) => has_content = true,
            Element::Bar(_) => {
                if has_content {
                    if let Some(current) = chords.last_mut() {
                        current.1 += 1;
                    }
                }
                has_content = false;
            }
            _ => {}
        }
    }
    if has_content {
        if let Some(current) = chords.last_mut() {
            current.1 += 1;
        }
    }

    if chords.is_empty() {
        return no_chords();
    }
    let text = chords
        .iter()
        .map(|(name, count)| {
            if *count > 1 {
                format!("{}({})", name, count)
            } else {
                name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    ChordSummary {
        text,
        measures: chords.iter().map(|(_, count)| count).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentSource;
    use crate::parse::parse_document;

    fn elements(body: &str) -> Vec<Element> {
        let text = format!("|AddStaff|Name:\"Gitaar\"\n{}", body);
        parse_document(&text, DocumentSource::Text)
            .unwrap()
            .staves
            .remove(0)
            .elements
    }

    #[test]
    fn test_chord_summary_counts_measures() {
        let els = elements(
            "|Text|Text:\"akk:B\"\n|Note|Dur:Whole|Pos:0\n|Bar\n\
             |Text|Text:\"akk: F#\"\n|Note|Dur:Whole|Pos:0\n|Bar\n\
             |Text|Text:\"akk:E\"\n|Note|Dur:Whole|Pos:0\n|Bar\n|Note|Dur:Whole|Pos:0\n|Bar\n",
        );
        let summary = chord_summary(&els);
        assert_eq!(summary.text, "B, F#, E(2)");
        assert_eq!(summary.measures, 4);
    }

    #[test]
    fn test_no_chords() {
        let els = elements("|Note|Dur:Whole|Pos:0\n|Bar\n");
        assert!(chord_summary(&els).is_empty());
    }

    #[test]
    fn test_duration_display_rounds() {
        let facts = StructuralFacts {
            title: "Lied".to_string(),
            song_id: None,
            total_measures: 8,
            tempo_bpm: Some(120),
            time_signature: Some("4/4".to_string()),
            duration_seconds: Some(125.6),
            has_pickup_measure: false,
            lead_in_measures: 0,
            sections: Vec::new(),
        };
        assert_eq!(facts.duration_display(), "2:06");
        assert_eq!(facts.to_map()["duration"], "2:06");
    }
}
