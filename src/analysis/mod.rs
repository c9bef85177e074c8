//! Measure analysis
//!
//! Works out where the song proper begins inside a merged document and maps
//! lyric syllables to public measure numbers:
//!
//! - a *pickup* ("begintel") is an incomplete first measure, detected from
//!   `PgSetup|StartingBar:0` plus a rest before the rhythm staff's first bar
//! - *lead-in* ("vooraf") measures are the full measures before the
//!   `liedstart` text marker
//! - public measure 1 is the first measure after pickup and lead-in

pub mod grid;
pub mod report;

pub use grid::{GridSegment, MeasureGrid};
pub use report::{format_report, song_id_from_name};

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::AnalysisError;
use crate::models::{Element, NotationDocument, Staff};

/// Structural facts shared by analysis, timing and the facts renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongTimingFacts {
    pub has_pickup_measure: bool,
    pub lead_in_measures: u32,
    /// Measures excluding pickup and lead-in
    pub total_measures: u32,
    /// Filled in by the timing engine; `None` without tempo or time signature
    pub total_duration_seconds: Option<f64>,
}

/// Syllables sung in one public measure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeasureMapEntry {
    pub measure_number: u32,
    pub syllables: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureAnalysis {
    pub title: Option<String>,
    pub facts: SongTimingFacts,
    pub measure_map: Vec<MeasureMapEntry>,
    pub grid: MeasureGrid,
    /// Segment of the rhythm staff's song-start marker
    pub song_start_segment: Option<u32>,
    /// Bars on the rhythm staff, counting empty segments
    pub raw_bar_count: usize,
}

impl MeasureAnalysis {
    pub fn syllables_for(&self, measure_number: u32) -> Option<&[String]> {
        self.measure_map
            .iter()
            .find(|e| e.measure_number == measure_number)
            .map(|e| e.syllables.as_slice())
    }
}

#[derive(Debug, Clone)]
pub struct MeasureAnalyzer {
    lyrics_staff: String,
    rhythm_staff: String,
    song_start_marker: String,
}

impl MeasureAnalyzer {
    pub fn new(lyrics_staff: impl Into<String>, rhythm_staff: impl Into<String>) -> Self {
        Self {
            lyrics_staff: lyrics_staff.into(),
            rhythm_staff: rhythm_staff.into(),
            song_start_marker: "liedstart".to_string(),
        }
    }

    pub fn with_song_start_marker(mut self, marker: impl Into<String>) -> Self {
        self.song_start_marker = marker.into();
        self
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.lyrics_staff, &config.rhythm_staff)
            .with_song_start_marker(&config.song_start_marker)
    }

    pub fn analyze(&self, doc: &NotationDocument) -> Result<MeasureAnalysis, AnalysisError> {
        let rhythm = required_staff(doc, &self.rhythm_staff)?;
        let lyrics = required_staff(doc, &self.lyrics_staff)?;

        let grid = MeasureGrid::from_staff(rhythm);
        let has_pickup = detect_pickup(doc, rhythm);

        let song_start_segment = rhythm.marker_segment(&self.song_start_marker);
        let song_start_ordinal = song_start_segment.and_then(|s| grid.measure_at_or_after(s));
        self.check_song_start_markers(doc, &grid, song_start_segment, song_start_ordinal)?;

        let measures_before = match (song_start_segment, song_start_ordinal) {
            (Some(_), Some(ordinal)) => ordinal,
            // marker after the last measure
            (Some(_), None) => grid.measure_count(),
            (None, _) => 0,
        };
        let lead_in = if has_pickup {
            measures_before.saturating_sub(1)
        } else {
            measures_before
        };
        let excluded = u32::from(has_pickup) + lead_in;
        let grid = grid.with_excluded(excluded);
        let total_measures = grid.measure_count().saturating_sub(excluded);

        log::info!(
            "analysis: {} measures, pickup {}, lead-in {}",
            total_measures,
            has_pickup,
            lead_in
        );

        let measure_map = build_measure_map(lyrics, &grid);

        Ok(MeasureAnalysis {
            title: doc.title(),
            facts: SongTimingFacts {
                has_pickup_measure: has_pickup,
                lead_in_measures: lead_in,
                total_measures,
                total_duration_seconds: None,
            },
            measure_map,
            grid,
            song_start_segment,
            raw_bar_count: rhythm.bar_count(),
        })
    }

    /// Every other staff that carries a song-start marker must put it in the
    /// same measure as the rhythm staff
    fn check_song_start_markers(
        &self,
        doc: &NotationDocument,
        grid: &MeasureGrid,
        expected_segment: Option<u32>,
        expected_ordinal: Option<u32>,
    ) -> Result<(), AnalysisError> {
        for staff in doc.staves.iter().filter(|s| s.name != self.rhythm_staff) {
            let Some(found) = staff.marker_segment(&self.song_start_marker) else {
                continue;
            };
            let agrees = match expected_segment {
                Some(expected) => {
                    found == expected || grid.measure_at_or_after(found) == expected_ordinal
                }
                None => false,
            };
            if !agrees {
                return Err(AnalysisError::ConflictingSongStart {
                    staff: staff.name.clone(),
                    rhythm_staff: self.rhythm_staff.clone(),
                    expected: expected_segment,
                    found,
                });
            }
        }
        Ok(())
    }
}

fn required_staff<'a>(doc: &'a NotationDocument, name: &str) -> Result<&'a Staff, AnalysisError> {
    doc.staff(name)
        .ok_or_else(|| AnalysisError::MissingRequiredStaff {
            staff: name.to_string(),
            available: doc.staff_names(),
        })
}

/// `StartingBar:0` and the rhythm staff opens with a rest before its first bar
fn detect_pickup(doc: &NotationDocument, rhythm: &Staff) -> bool {
    if doc.starting_bar() != Some(0) {
        return false;
    }
    for element in &rhythm.elements {
        match element {
            Element::Bar(_) => return false,
            Element::NoteOrRest(note) => return note.is_rest,
            _ => {}
        }
    }
    false
}

fn build_measure_map(lyrics: &Staff, grid: &MeasureGrid) -> Vec<MeasureMapEntry> {
    let mut map: BTreeMap<u32, Vec<String>> = grid.public_numbers().map(|n| (n, Vec::new())).collect();

    let mut segment = 0;
    for element in &lyrics.elements {
        match element {
            Element::Bar(_) => segment += 1,
            Element::NoteOrRest(note) if !note.is_rest => {
                let Some(syllable) = &note.lyric_syllable else {
                    continue;
                };
                match grid.public_number(segment) {
                    Some(number) => map.entry(number).or_default().push(syllable.clone()),
                    None => log::debug!("syllable `{}` in unnumbered segment {}", syllable, segment),
                }
            }
            _ => {}
        }
    }

    map.into_iter()
        .map(|(measure_number, syllables)| MeasureMapEntry {
            measure_number,
            syllables,
        })
        .collect()
}
