//! Document parser
//!
//! Walks the tokenized lines of one `.nwctxt` file and groups them into a
//! header, staves and a trailer. Recognised tags inside a staff become typed
//! elements; everything else is kept as `Element::Unknown` in place.

use crate::error::ParseError;
use crate::models::{
    is_prelude_tag, Bar, DocumentSource, Duration, Element, LineEnding, NotationDocument,
    NoteOrRest, RawLine, Record, Staff, TempoMarker, TextMarker, TimeSignatureMarker,
};

use super::lyrics::distribute_lyrics;
use super::tokens::tokenize_line;

const END_MARKER: &str = "!NoteWorthyComposer-End";

/// Parse the text of one notation file
pub fn parse_document(text: &str, source: DocumentSource) -> Result<NotationDocument, ParseError> {
    let line_ending = if text.contains("\r\n") {
        LineEnding::CrLf
    } else {
        LineEnding::Lf
    };
    let final_newline = text.ends_with('\n');

    let mut header = Vec::new();
    let mut staves = Vec::new();
    let mut trailer = Vec::new();
    let mut current: Option<StaffBuilder> = None;
    let mut in_trailer = false;

    for (index, (line, ending)) in split_lines(text).enumerate() {
        let line_number = index + 1;
        let mut raw = tokenize_line(line).map_err(|reason| ParseError::new(line_number, reason))?;
        raw.set_ending(ending);

        if in_trailer {
            trailer.push(raw);
            continue;
        }

        if matches!(&raw, RawLine::Directive { text, .. } if text.starts_with(END_MARKER)) {
            if let Some(builder) = current.take() {
                staves.push(builder.finish());
            }
            in_trailer = true;
            trailer.push(raw);
            continue;
        }

        match raw {
            RawLine::Record(record) if record.tag() == "AddStaff" => {
                if let Some(builder) = current.take() {
                    staves.push(builder.finish());
                }
                current = Some(StaffBuilder::new(record, line_number)?);
            }
            other => match current.as_mut() {
                Some(builder) => builder
                    .push(other)
                    .map_err(|reason| ParseError::new(line_number, reason))?,
                None => header.push(other),
            },
        }
    }

    if let Some(builder) = current.take() {
        staves.push(builder.finish());
    }

    log::debug!(
        "parsed document with {} header lines and {} staves",
        header.len(),
        staves.len()
    );

    Ok(NotationDocument {
        source,
        header,
        staves,
        trailer,
        line_ending,
        final_newline,
    })
}

/// Split `text` into lines, each with the terminator that ended it. The last
/// line has none when the text does not end with a newline.
fn split_lines(text: &str) -> impl Iterator<Item = (&str, Option<LineEnding>)> {
    text.split_inclusive('\n').map(|chunk| {
        if let Some(line) = chunk.strip_suffix("\r\n") {
            (line, Some(LineEnding::CrLf))
        } else if let Some(line) = chunk.strip_suffix('\n') {
            (line, Some(LineEnding::Lf))
        } else {
            (chunk, None)
        }
    })
}

struct StaffBuilder {
    name: String,
    add_staff: Record,
    prelude: Vec<Record>,
    elements: Vec<Element>,
    in_prelude: bool,
    bars: u32,
}

impl StaffBuilder {
    fn new(add_staff: Record, line_number: usize) -> Result<Self, ParseError> {
        let name = add_staff
            .text("Name")
            .ok_or_else(|| ParseError::new(line_number, "`AddStaff` without a Name field"))?;
        Ok(Self {
            name,
            add_staff,
            prelude: Vec::new(),
            elements: Vec::new(),
            in_prelude: true,
            bars: 0,
        })
    }

    fn push(&mut self, line: RawLine) -> Result<(), String> {
        if self.in_prelude {
            if let RawLine::Record(record) = &line {
                if is_prelude_tag(record.tag()) {
                    self.prelude.push(record.clone());
                    return Ok(());
                }
            }
            self.in_prelude = false;
        }

        let element = classify(line, self.bars)?;
        if let Element::Bar(bar) = &element {
            self.bars = bar.number;
        }
        self.elements.push(element);
        Ok(())
    }

    fn finish(mut self) -> Staff {
        let verse = self
            .prelude
            .iter()
            .find(|r| r.tag() == "Lyric1")
            .and_then(|r| r.text("Text"));
        if let Some(verse) = verse {
            distribute_lyrics(&verse, &mut self.elements);
        }

        Staff {
            name: self.name,
            add_staff: self.add_staff,
            prelude: self.prelude,
            elements: self.elements,
            section_starts: Vec::new(),
        }
    }
}

/// Turn one staff body line into an element. `bars_before` is the number of
/// bars already seen in the staff.
fn classify(line: RawLine, bars_before: u32) -> Result<Element, String> {
    let record = match line {
        RawLine::Record(record) => record,
        other => return Ok(Element::Unknown(other)),
    };

    let element = match record.tag() {
        "Bar" => Element::Bar(Bar {
            number: bars_before + 1,
            style: record.text("Style"),
            record,
        }),
        "Note" | "Chord" | "RestChord" | "Rest" => Element::NoteOrRest(note_or_rest(record)?),
        "Tempo" => {
            let value = record
                .value("Tempo")
                .ok_or_else(|| "`Tempo` without a Tempo field".to_string())?;
            let bpm = value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|bpm| *bpm > 0)
                .ok_or_else(|| format!("invalid tempo `{}`", value))?;
            Element::Tempo(TempoMarker { bpm, record })
        }
        "TimeSig" => {
            let value = record
                .value("Signature")
                .ok_or_else(|| "`TimeSig` without a Signature field".to_string())?;
            let (numerator, denominator) = parse_signature(value)?;
            Element::TimeSignature(TimeSignatureMarker {
                numerator,
                denominator,
                record,
            })
        }
        "Text" => {
            let text = record
                .text("Text")
                .ok_or_else(|| "`Text` without a Text field".to_string())?;
            Element::Text(TextMarker {
                text,
                bar: bars_before,
                record,
            })
        }
        _ => Element::Unknown(RawLine::Record(record)),
    };
    Ok(element)
}

fn note_or_rest(record: Record) -> Result<NoteOrRest, String> {
    let tag = record.tag().to_string();
    let dur = record
        .value("Dur")
        .ok_or_else(|| format!("`{}` without a Dur field", tag))?;
    let duration = Duration::parse(dur)?;
    let is_rest = tag == "Rest";
    let tied = record.value("Pos").map_or(false, |pos| pos.contains('^'));
    let explicit = record.text("Lyric").filter(|l| !l.trim().is_empty());

    Ok(NoteOrRest {
        extends_syllable: !is_rest && (duration.slur || tied),
        explicit_lyric: explicit.is_some() && !is_rest,
        lyric_syllable: if is_rest { None } else { explicit },
        duration,
        is_rest,
        record,
    })
}

/// `4/4`, `Common` or `AllaBreve`. The denominator must be a power of two
/// no larger than 64.
pub fn parse_signature(value: &str) -> Result<(u32, u32), String> {
    match value.trim() {
        "Common" => return Ok((4, 4)),
        "AllaBreve" => return Ok((2, 2)),
        _ => {}
    }
    let invalid = || format!("invalid time signature `{}`", value);
    let (num, den) = value.trim().split_once('/').ok_or_else(invalid)?;
    let numerator: u32 = num.trim().parse().map_err(|_| invalid())?;
    let denominator: u32 = den.trim().parse().map_err(|_| invalid())?;
    if numerator == 0 || !denominator.is_power_of_two() || denominator > 64 {
        return Err(invalid());
    }
    Ok((numerator, denominator))
}
