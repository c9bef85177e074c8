//! Timing engine
//!
//! Converts tempo and time signature into wall-clock offsets for the merged
//! song and emits the label events used by audio editors.
//!
//! The timeline is linear: repeats are not expanded. Segment timing follows
//! the rhythm staff. The pickup segment lasts as long as its notes; every
//! other measure lasts one full measure of the current meter; empty segments
//! take no time.

pub mod label_track;

pub use label_track::{format_label_track, write_label_track};

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::analysis::SongTimingFacts;
use crate::config::PipelineConfig;
use crate::error::{AnalysisError, TimingError};
use crate::models::{Element, NotationDocument, Rational};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelEvent {
    pub start_time_seconds: f64,
    pub end_time_seconds: f64,
    pub label_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingReport {
    /// Sorted by start time
    pub events: Vec<LabelEvent>,
    pub total_duration_seconds: Option<f64>,
    /// Start offset of every rhythm staff segment; empty when degraded
    pub segment_starts: Vec<f64>,
    /// First tempo and time signature of the song
    pub tempo_bpm: Option<u32>,
    pub time_signature: Option<(u32, u32)>,
    #[serde(skip)]
    pub warning: Option<TimingError>,
}

impl TimingReport {
    /// Copy the total duration into analysis facts
    pub fn apply_to(&self, facts: &mut SongTimingFacts) {
        facts.total_duration_seconds = self.total_duration_seconds;
    }
}

#[derive(Debug, Clone)]
pub struct TimingEngine {
    rhythm_staff: String,
    song_start_marker: String,
    label_marker: String,
}

/// Event before timing is resolved
struct PendingEvent {
    segment: u32,
    label: String,
}

impl TimingEngine {
    pub fn new(rhythm_staff: impl Into<String>) -> Self {
        Self {
            rhythm_staff: rhythm_staff.into(),
            song_start_marker: "liedstart".to_string(),
            label_marker: "LBLTRCK".to_string(),
        }
    }

    pub fn with_markers(mut self, song_start: impl Into<String>, label: impl Into<String>) -> Self {
        self.song_start_marker = song_start.into();
        self.label_marker = label.into();
        self
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.rhythm_staff)
            .with_markers(&config.song_start_marker, &config.label_marker)
    }

    pub fn compute(
        &self,
        doc: &NotationDocument,
        facts: &SongTimingFacts,
    ) -> Result<TimingReport, AnalysisError> {
        let rhythm = doc
            .staff(&self.rhythm_staff)
            .ok_or_else(|| AnalysisError::MissingRequiredStaff {
                staff: self.rhythm_staff.clone(),
                available: doc.staff_names(),
            })?;

        let (tempi, signatures) = collect_changes(doc);
        let tempo_bpm = tempi.values().next().copied();
        let time_signature = signatures.values().next().copied();
        let pending = self.collect_events(doc);

        let (Some(first_tempo), Some(first_signature)) = (tempo_bpm, time_signature) else {
            let warning = TimingError::MissingTempoOrTimeSignature {
                missing: if tempo_bpm.is_none() { "tempo" } else { "time signature" },
            };
            log::warn!("{}", warning);
            let events = pending
                .into_iter()
                .map(|e| LabelEvent {
                    start_time_seconds: 0.0,
                    end_time_seconds: 0.0,
                    label_text: e.label,
                })
                .collect();
            return Ok(TimingReport {
                events,
                total_duration_seconds: None,
                segment_starts: Vec::new(),
                tempo_bpm,
                time_signature,
                warning: Some(warning),
            });
        };

        let mut bpm = first_tempo;
        let (mut numerator, mut denominator) = first_signature;
        let mut elapsed = 0.0;
        let mut segment_starts = Vec::new();

        for segment in rhythm.segments() {
            if let Some(change) = tempi.get(&segment.index) {
                bpm = *change;
            }
            if let Some(&(n, d)) = signatures.get(&segment.index) {
                numerator = n;
                denominator = d;
            }
            segment_starts.push(elapsed);

            if !segment.is_measure() {
                continue;
            }
            let seconds_per_beat = 60.0 / f64::from(bpm);
            let beats = if segment.index == 0 && facts.has_pickup_measure {
                to_f64(segment.length()) * f64::from(denominator)
            } else {
                f64::from(numerator)
            };
            elapsed += beats * seconds_per_beat;
        }

        let total = elapsed;
        let mut timed: Vec<(f64, u32, String)> = pending
            .into_iter()
            .map(|e| {
                let start = segment_starts
                    .get(e.segment as usize)
                    .copied()
                    .unwrap_or(total);
                (start, e.segment, e.label)
            })
            .collect();
        // stable: equal keys keep emission order
        timed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut events: Vec<LabelEvent> = Vec::with_capacity(timed.len());
        for (i, (start, _, label)) in timed.iter().enumerate() {
            let end = timed.get(i + 1).map_or(total, |next| next.0);
            events.push(LabelEvent {
                start_time_seconds: *start,
                end_time_seconds: end,
                label_text: label.clone(),
            });
        }

        log::info!(
            "timing: {} events, total {:.3}s at {} bpm {}/{}",
            events.len(),
            total,
            first_tempo,
            first_signature.0,
            first_signature.1
        );

        Ok(TimingReport {
            events,
            total_duration_seconds: Some(total),
            segment_starts,
            tempo_bpm,
            time_signature,
            warning: None,
        })
    }

    /// Section starts, then the song start, then label markers in staff order
    fn collect_events(&self, doc: &NotationDocument) -> Vec<PendingEvent> {
        let mut events = Vec::new();

        if let Some(rhythm) = doc.staff(&self.rhythm_staff) {
            for start in &rhythm.section_starts {
                events.push(PendingEvent {
                    segment: start.segment,
                    label: start.name.clone(),
                });
            }
            if let Some(segment) = rhythm.marker_segment(&self.song_start_marker) {
                events.push(PendingEvent {
                    segment,
                    label: self.song_start_marker.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        for staff in &doc.staves {
            for element in &staff.elements {
                let Element::Text(marker) = element else {
                    continue;
                };
                let Some(label) = self.label_from_marker(&marker.text) else {
                    continue;
                };
                if seen.insert((marker.bar, label.clone())) {
                    events.push(PendingEvent {
                        segment: marker.bar,
                        label,
                    });
                }
            }
        }
        events
    }

    /// `LBLTRCK: outro` -> `outro`; a bare `LBLTRCK` keeps the marker name
    fn label_from_marker(&self, text: &str) -> Option<String> {
        let rest = text.trim().strip_prefix(self.label_marker.as_str())?;
        let label = rest
            .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
            .trim_end();
        Some(if label.is_empty() {
            self.label_marker.clone()
        } else {
            label.to_string()
        })
    }
}

/// Tempo and time signature changes keyed by segment; the first change seen
/// in a segment wins, staves are visited in document order
fn collect_changes(doc: &NotationDocument) -> (BTreeMap<u32, u32>, BTreeMap<u32, (u32, u32)>) {
    let mut tempi = BTreeMap::new();
    let mut signatures = BTreeMap::new();
    for staff in &doc.staves {
        let mut segment = 0;
        for element in &staff.elements {
            match element {
                Element::Bar(_) => segment += 1,
                Element::Tempo(tempo) => {
                    tempi.entry(segment).or_insert(tempo.bpm);
                }
                Element::TimeSignature(sig) => {
                    signatures
                        .entry(segment)
                        .or_insert((sig.numerator, sig.denominator));
                }
                _ => {}
            }
        }
    }
    (tempi, signatures)
}

fn to_f64(value: Rational) -> f64 {
    f64::from(*value.numer()) / f64::from(*value.denom())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_marker() {
        let engine = TimingEngine::new("Bass");
        assert_eq!(engine.label_from_marker("LBLTRCK: brug").as_deref(), Some("brug"));
        assert_eq!(engine.label_from_marker("LBLTRCK").as_deref(), Some("LBLTRCK"));
        assert_eq!(engine.label_from_marker("liedstart"), None);
    }

    #[test]
    fn test_to_f64() {
        assert_eq!(to_f64(Rational::new(3, 4)), 0.75);
    }
}
