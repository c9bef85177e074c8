//! Line-level model of the `.nwctxt` text format
//!
//! Every line of a notation file is either blank, a `!` directive (the
//! signature and end markers) or a pipe-delimited record:
//!
//! ```text
//! |Tag|Key1:Value1|Key2:"quoted | value"
//! ```
//!
//! Records keep the exact text they were parsed from. Field values are stored
//! as written, escapes included, and only unescaped when read through
//! [`Field::text`]. A record that is never modified renders back to the same
//! bytes. Each line also remembers the terminator it was read with.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// One `Key:Value` pair of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub key: String,
    /// Value as written in the file, without surrounding quotes
    pub value: String,
    pub quoted: bool,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            quoted: false,
        }
    }

    pub fn quoted(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            quoted: true,
        }
    }

    /// The value with NWC escapes resolved
    pub fn text(&self) -> String {
        unescape(&self.value)
    }

    fn render_into(&self, out: &mut String) {
        out.push('|');
        out.push_str(&self.key);
        out.push(':');
        if self.quoted {
            out.push('"');
            out.push_str(&self.value);
            out.push('"');
        } else {
            out.push_str(&self.value);
        }
    }
}

/// A pipe-delimited line such as `|Note|Dur:4th|Pos:0`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    raw: String,
    tag: String,
    fields: Vec<Field>,
    /// Terminator read from the file; `None` for records built in memory
    #[serde(default)]
    ending: Option<LineEnding>,
}

impl Record {
    /// Build a record from parts; the raw text is rendered from them
    pub fn new(tag: impl Into<String>, fields: Vec<Field>) -> Self {
        let tag = tag.into();
        let raw = render(&tag, &fields);
        Self {
            raw,
            tag,
            fields,
            ending: None,
        }
    }

    /// Used by the tokenizer, which already holds the original line
    pub(crate) fn from_parts(raw: String, tag: String, fields: Vec<Field>) -> Self {
        Self {
            raw,
            tag,
            fields,
            ending: None,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn ending(&self) -> Option<LineEnding> {
        self.ending
    }

    pub fn set_ending(&mut self, ending: Option<LineEnding>) {
        self.ending = ending;
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Value of a field as written (escapes intact)
    pub fn value(&self, key: &str) -> Option<&str> {
        self.field(key).map(|f| f.value.as_str())
    }

    /// Value of a field with escapes resolved
    pub fn text(&self, key: &str) -> Option<String> {
        self.field(key).map(Field::text)
    }

    /// Replace a field's value, or append the field when it is absent.
    ///
    /// The raw text is re-rendered, so only records that were actually
    /// changed lose their original spelling.
    pub fn set(&mut self, key: &str, value: impl Into<String>, quoted: bool) {
        let value = value.into();
        match self.fields.iter_mut().find(|f| f.key == key) {
            Some(field) => {
                if field.value == value && field.quoted == quoted {
                    return;
                }
                field.value = value;
                field.quoted = quoted;
            }
            None => self.fields.push(Field {
                key: key.to_string(),
                value,
                quoted,
            }),
        }
        self.raw = render(&self.tag, &self.fields);
    }
}

/// One physical line of a notation file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawLine {
    /// Empty or whitespace-only line, kept verbatim
    Blank {
        text: String,
        ending: Option<LineEnding>,
    },
    /// A `!` line such as `!NoteWorthyComposer(2.75)`
    Directive {
        text: String,
        ending: Option<LineEnding>,
    },
    Record(Record),
}

impl RawLine {
    pub fn blank(text: impl Into<String>) -> Self {
        RawLine::Blank {
            text: text.into(),
            ending: None,
        }
    }

    pub fn directive(text: impl Into<String>) -> Self {
        RawLine::Directive {
            text: text.into(),
            ending: None,
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            RawLine::Blank { text, .. } | RawLine::Directive { text, .. } => text,
            RawLine::Record(record) => record.raw(),
        }
    }

    pub fn ending(&self) -> Option<LineEnding> {
        match self {
            RawLine::Blank { ending, .. } | RawLine::Directive { ending, .. } => *ending,
            RawLine::Record(record) => record.ending(),
        }
    }

    pub fn set_ending(&mut self, line_ending: Option<LineEnding>) {
        match self {
            RawLine::Blank { ending, .. } | RawLine::Directive { ending, .. } => {
                *ending = line_ending
            }
            RawLine::Record(record) => record.set_ending(line_ending),
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            RawLine::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        self.as_record().map(Record::tag)
    }
}

fn render(tag: &str, fields: &[Field]) -> String {
    let mut out = String::with_capacity(tag.len() + fields.len() * 12 + 1);
    out.push('|');
    out.push_str(tag);
    for field in fields {
        field.render_into(&mut out);
    }
    out
}

/// Resolve backslash escapes in a field value.
///
/// `\n`, `\r` and `\t` become control characters; any other escaped
/// character (`\'`, `\"`, `\\`, `\|`) stands for itself.
pub fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Inverse of [`unescape`] for text written into quoted values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_new_renders_raw() {
        let record = Record::new(
            "Text",
            vec![Field::quoted("Text", "liedstart"), Field::new("Pos", "8")],
        );
        assert_eq!(record.raw(), "|Text|Text:\"liedstart\"|Pos:8");
    }

    #[test]
    fn test_set_rewrites_only_when_changed() {
        let mut record = Record::from_parts(
            "|StaffProperties|Muted:N|Volume:127".to_string(),
            "StaffProperties".to_string(),
            vec![Field::new("Muted", "N"), Field::new("Volume", "127")],
        );
        record.set("Muted", "N", false);
        assert_eq!(record.raw(), "|StaffProperties|Muted:N|Volume:127");

        record.set("Muted", "Y", false);
        record.set("Channel", "3", false);
        assert_eq!(record.raw(), "|StaffProperties|Muted:Y|Volume:127|Channel:3");
    }

    #[test]
    fn test_set_keeps_line_ending() {
        let mut line = RawLine::Record(Record::new("StaffProperties", vec![Field::new("Muted", "N")]));
        line.set_ending(Some(LineEnding::CrLf));
        if let RawLine::Record(record) = &mut line {
            record.set("Muted", "Y", false);
        }
        assert_eq!(line.raw(), "|StaffProperties|Muted:Y");
        assert_eq!(line.ending(), Some(LineEnding::CrLf));
    }

    #[test]
    fn test_unescape_nwc_sequences() {
        assert_eq!(unescape(r"Don\'t stop\nnow"), "Don't stop\nnow");
        assert_eq!(unescape(r#"say \"hi\""#), "say \"hi\"");
        assert_eq!(unescape(r"trailing\"), "trailing\\");
    }

    #[test]
    fn test_escape_is_inverse_of_unescape() {
        let text = "it's \"one\"\ntwo \\ three";
        assert_eq!(unescape(&escape(text)), text);
    }
}
