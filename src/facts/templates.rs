//! Mustache rendering of song facts
//!
//! The default structure document is a LaTeX file. Every value placed in the
//! context is LaTeX-escaped up front and the template uses unescaped
//! (`{{&name}}`) tags, so mustache's HTML escaping never touches it.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::error::TemplateError;

use super::StructuralFacts;

pub const STRUCTURE_TEMPLATE: &str = include_str!("templates/structure.tex.mustache");

static MAATSOORT_COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\\newcommand\{\\maatsoort\}\{)[^}]*(\})").expect("valid regex")
});
static TEMPO_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\\newcommand\{\\tempo\}\{)[^}]*(\})").expect("valid regex"));
static SIGNATURE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+/\d+$").expect("valid regex"));

#[derive(Debug, Clone, Serialize)]
pub struct PartRow {
    pub name: String,
    pub measures: String,
    pub chords: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionRow {
    pub order: String,
    pub name: String,
    pub measures: String,
    pub chords: String,
}

/// Context for the structure template; all strings are LaTeX-safe
#[derive(Debug, Clone, Serialize)]
pub struct StructureContext {
    pub document_name: String,
    pub title: String,
    pub time_signature: String,
    pub tempo: String,
    pub measures: String,
    pub duration: String,
    pub parts: Vec<PartRow>,
    pub sections: Vec<SectionRow>,
}

impl StructureContext {
    /// `document_name` is shown in the page header (e.g. the PDF name)
    pub fn from_facts(facts: &StructuralFacts, document_name: &str) -> Self {
        let parts = facts
            .unique_sections()
            .into_iter()
            .map(|section| {
                let mut chords = section.chords.text.clone();
                if !section.chords.is_empty() && section.chords.measures != section.measures {
                    chords.push_str(" [INVALID COUNT]");
                }
                PartRow {
                    name: escape_latex(&section.name),
                    measures: section.measures.to_string(),
                    chords: escape_latex(&chords),
                }
            })
            .collect();

        let sections = facts
            .sections
            .iter()
            .map(|section| SectionRow {
                order: section.order.to_string(),
                name: escape_latex(&section.name),
                measures: section.measures.to_string(),
                chords: escape_latex(&section.chords.text),
            })
            .collect();

        Self {
            document_name: escape_latex(document_name),
            title: escape_latex(&facts.title),
            time_signature: facts
                .time_signature
                .as_deref()
                .map_or_else(|| "?".to_string(), escape_latex),
            tempo: facts
                .tempo_bpm
                .map_or_else(|| "?".to_string(), |t| t.to_string()),
            measures: facts.sequence_measures().to_string(),
            duration: facts.duration_display(),
            parts,
            sections,
        }
    }
}

/// Render any serializable context with a mustache template
pub fn render_template<T: Serialize>(template: &str, context: &T) -> Result<String, TemplateError> {
    let template = mustache::compile_str(template)?;
    Ok(template.render_to_string(context)?)
}

/// Render the built-in LaTeX structure document
pub fn render_structure(facts: &StructuralFacts, document_name: &str) -> Result<String, TemplateError> {
    render_template(
        STRUCTURE_TEMPLATE,
        &StructureContext::from_facts(facts, document_name),
    )
}

/// Escape LaTeX special characters
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str(r"\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(ch);
            }
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            other => out.push(other),
        }
    }
    out
}

/// Rewrite `\newcommand{\tempo}{..}` and `\newcommand{\maatsoort}{..}` in
/// a lyrics document
pub fn apply_lyrics_commands(
    content: &str,
    tempo: u32,
    time_signature: &str,
) -> Result<String, TemplateError> {
    if tempo < 10 {
        return Err(TemplateError::InvalidTempo(tempo));
    }
    if !SIGNATURE.is_match(time_signature) {
        return Err(TemplateError::InvalidTimeSignature(time_signature.to_string()));
    }

    let content = MAATSOORT_COMMAND.replace_all(content, |caps: &Captures| {
        format!("{}{}{}", &caps[1], time_signature, &caps[2])
    });
    let content = TEMPO_COMMAND.replace_all(&content, |caps: &Captures| {
        format!("{}{}{}", &caps[1], tempo, &caps[2])
    });
    Ok(content.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_latex() {
        assert_eq!(escape_latex("R&B 100% #1"), r"R\&B 100\% \#1");
        assert_eq!(escape_latex(r"a\b"), r"a\textbackslash{}b");
        assert_eq!(escape_latex("x^2~"), r"x\textasciicircum{}2\textasciitilde{}");
    }

    #[test]
    fn test_apply_lyrics_commands() {
        let tex = "\\newcommand{\\maatsoort}{3/4}\n\\newcommand{\\tempo}{90}\n\\begin{document}";
        let updated = apply_lyrics_commands(tex, 120, "4/4").unwrap();
        assert_eq!(
            updated,
            "\\newcommand{\\maatsoort}{4/4}\n\\newcommand{\\tempo}{120}\n\\begin{document}"
        );
    }

    #[test]
    fn test_apply_lyrics_commands_validates() {
        assert!(matches!(
            apply_lyrics_commands("", 5, "4/4"),
            Err(TemplateError::InvalidTempo(5))
        ));
        assert!(matches!(
            apply_lyrics_commands("", 120, "Common"),
            Err(TemplateError::InvalidTimeSignature(_))
        ));
    }

    #[test]
    fn test_render_template_with_map() {
        let mut map = std::collections::BTreeMap::new();
        map.insert("title", "Lied & zo");
        let rendered = render_template("T: {{&title}}", &map).unwrap();
        assert_eq!(rendered, "T: Lied & zo");
    }
}
