//! Measure grid of the rhythm staff
//!
//! The grid lists every segment of a staff, marks which segments are
//! measures and assigns each measure its ordinal. Public measure numbers are
//! derived from the ordinal once the number of excluded leading measures
//! (pickup plus lead-in) is known.

use serde::Serialize;

use crate::models::Staff;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridSegment {
    pub index: u32,
    pub is_measure: bool,
    /// 0-based position among the staff's measures
    pub ordinal: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeasureGrid {
    segments: Vec<GridSegment>,
    measure_count: u32,
    excluded: u32,
}

impl MeasureGrid {
    pub fn from_staff(staff: &Staff) -> Self {
        let mut measure_count = 0;
        let segments = staff
            .segments()
            .iter()
            .map(|segment| {
                let is_measure = segment.is_measure();
                let ordinal = is_measure.then(|| {
                    measure_count += 1;
                    measure_count - 1
                });
                GridSegment {
                    index: segment.index,
                    is_measure,
                    ordinal,
                }
            })
            .collect();
        Self {
            segments,
            measure_count,
            excluded: 0,
        }
    }

    /// Leading measures without a public number
    pub fn with_excluded(mut self, excluded: u32) -> Self {
        self.excluded = excluded;
        self
    }

    pub fn segments(&self) -> &[GridSegment] {
        &self.segments
    }

    pub fn measure_count(&self) -> u32 {
        self.measure_count
    }

    pub fn excluded(&self) -> u32 {
        self.excluded
    }

    /// Ordinal of the measure a marker in `segment` belongs to: the segment
    /// itself if it is a measure, otherwise the next measure after it
    pub fn measure_at_or_after(&self, segment: u32) -> Option<u32> {
        self.segments
            .iter()
            .skip(segment as usize)
            .find_map(|s| s.ordinal)
    }

    pub fn number_for_ordinal(&self, ordinal: u32) -> Option<u32> {
        (ordinal >= self.excluded).then(|| ordinal - self.excluded + 1)
    }

    /// Public measure number of the measure in `segment`.
    ///
    /// Segments past the end of the grid continue the numbering one measure
    /// per segment.
    pub fn public_number(&self, segment: u32) -> Option<u32> {
        match self.segments.get(segment as usize) {
            Some(s) => s.ordinal.and_then(|o| self.number_for_ordinal(o)),
            None => {
                let last = self
                    .measure_count
                    .checked_sub(1)
                    .and_then(|o| self.number_for_ordinal(o))
                    .unwrap_or(0);
                let beyond = segment + 1 - self.segments.len() as u32;
                Some(last + beyond)
            }
        }
    }

    /// Public numbers in order, one per numbered measure
    pub fn public_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.segments
            .iter()
            .filter_map(|s| s.ordinal)
            .filter_map(|o| self.number_for_ordinal(o))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentSource;
    use crate::parse::parse_document;

    fn staff(body: &str) -> Staff {
        let text = format!("|AddStaff|Name:\"Bass\"\n{}", body);
        parse_document(&text, DocumentSource::Text)
            .unwrap()
            .staves
            .remove(0)
    }

    #[test]
    fn test_empty_segments_are_not_measures() {
        let s = staff("|Note|Dur:Whole|Pos:0\n|Bar\n|Bar|Style:Double\n|Note|Dur:Whole|Pos:0\n|Bar\n");
        let grid = MeasureGrid::from_staff(&s);
        assert_eq!(grid.segments().len(), 4);
        assert_eq!(grid.measure_count(), 2);
        assert_eq!(grid.segments()[1].ordinal, None);
        assert_eq!(grid.segments()[2].ordinal, Some(1));
        assert_eq!(grid.measure_at_or_after(1), Some(1));
        assert_eq!(grid.measure_at_or_after(3), None);
    }

    #[test]
    fn test_excluded_measures_have_no_number() {
        let s = staff("|Rest|Dur:4th\n|Bar\n|Note|Dur:Whole|Pos:0\n|Bar\n|Note|Dur:Whole|Pos:0\n|Bar\n");
        let grid = MeasureGrid::from_staff(&s).with_excluded(2);
        assert_eq!(grid.public_number(0), None);
        assert_eq!(grid.public_number(1), None);
        assert_eq!(grid.public_number(2), Some(1));
        assert_eq!(grid.public_number(3), None);
        assert_eq!(grid.public_number(5), Some(3));
        assert_eq!(grid.public_numbers().collect::<Vec<_>>(), vec![1]);
    }
}
