//! Line tokenizer for `.nwctxt` text
//!
//! Splits one physical line into a [`RawLine`]. Record lines are split on
//! `|`, except inside double quotes where a backslash escapes the next
//! character.

use crate::models::{Field, RawLine, Record};

/// Tokenize one line (without its terminator)
pub fn tokenize_line(line: &str) -> Result<RawLine, String> {
    if line.trim().is_empty() {
        return Ok(RawLine::blank(line));
    }
    if line.starts_with('!') {
        return Ok(RawLine::directive(line));
    }
    if !line.starts_with('|') {
        return Err(format!(
            "expected a line starting with `|` or `!`, found `{}`",
            preview(line)
        ));
    }

    let parts = split_fields(line)?;
    let (tag, rest) = match parts.split_first() {
        Some((tag, rest)) => (*tag, rest),
        None => return Err("empty tag".to_string()),
    };
    if tag.is_empty() || tag.contains(':') || tag.contains('"') {
        return Err(format!("invalid tag `{}`", tag));
    }

    let fields = rest
        .iter()
        .map(|part| parse_field(part))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RawLine::Record(Record::from_parts(
        line.to_string(),
        tag.to_string(),
        fields,
    )))
}

/// Split a record line into its pipe-separated parts, dropping the leading
/// empty part before the first `|`
fn split_fields(line: &str) -> Result<Vec<&str>, String> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 1;

    for (i, ch) in line.char_indices().skip(1) {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '|' if !in_quotes => {
                parts.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_quotes {
        return Err("unterminated quoted value".to_string());
    }
    parts.push(&line[start..]);
    Ok(parts)
}

fn parse_field(part: &str) -> Result<Field, String> {
    if part.is_empty() {
        return Err("empty field".to_string());
    }
    let (key, value) = part
        .split_once(':')
        .ok_or_else(|| format!("field `{}` has no `:` separator", preview(part)))?;
    if key.is_empty() {
        return Err(format!("field `{}` has an empty key", preview(part)));
    }

    let is_quoted = value.len() >= 2 && value.starts_with('"') && value.ends_with('"');
    Ok(if is_quoted {
        Field::quoted(key, &value[1..value.len() - 1])
    } else {
        Field::new(key, value)
    })
}

fn preview(text: &str) -> String {
    const MAX: usize = 40;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: &str) -> Record {
        match tokenize_line(line).unwrap() {
            RawLine::Record(record) => record,
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_record() {
        let r = record("|Note|Dur:4th|Pos:-2^");
        assert_eq!(r.tag(), "Note");
        assert_eq!(r.value("Dur"), Some("4th"));
        assert_eq!(r.value("Pos"), Some("-2^"));
        assert_eq!(r.raw(), "|Note|Dur:4th|Pos:-2^");
    }

    #[test]
    fn test_pipes_inside_quotes_do_not_split() {
        let r = record(r#"|Text|Text:"a | b \" c"|Font:StaffItalic"#);
        assert_eq!(r.fields().len(), 2);
        assert_eq!(r.value("Text"), Some(r#"a | b \" c"#));
        assert_eq!(r.text("Text").as_deref(), Some("a | b \" c"));
        assert!(r.field("Text").unwrap().quoted);
    }

    #[test]
    fn test_bare_tag() {
        let r = record("|Bar");
        assert_eq!(r.tag(), "Bar");
        assert!(r.fields().is_empty());
    }

    #[test]
    fn test_value_with_colon() {
        let r = record("|Text|Text:\"12:30\"");
        assert_eq!(r.text("Text").as_deref(), Some("12:30"));
    }

    #[test]
    fn test_blank_and_directive_lines() {
        assert_eq!(tokenize_line("  ").unwrap(), RawLine::blank("  "));
        assert_eq!(
            tokenize_line("!NoteWorthyComposer(2.75)").unwrap(),
            RawLine::directive("!NoteWorthyComposer(2.75)")
        );
    }

    #[test]
    fn test_malformed_lines() {
        assert!(tokenize_line("Note|Dur:4th").is_err());
        assert!(tokenize_line("|").is_err());
        assert!(tokenize_line("|Note||Dur:4th").is_err());
        assert!(tokenize_line("|Note|Dur").is_err());
        assert!(tokenize_line("|Note|:4th").is_err());
        assert!(tokenize_line("|Text|Text:\"open").is_err());
    }
}
