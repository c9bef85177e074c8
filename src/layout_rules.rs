//! Per-song layout overrides for the lyrics sheet
//!
//! Rules come from a JSONC list. A rule matches a song when its `liedId`
//! equals the song id and every other condition is either `null` (any value)
//! or equal to the requested value. The first matching rule wins, so more
//! specific rules belong earlier in the file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SongError};
use crate::utils::jsonc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutCondition {
    pub lied_id: u32,
    #[serde(default)]
    pub show_measures: Option<bool>,
    #[serde(default)]
    pub show_chords: Option<bool>,
    #[serde(default)]
    pub show_tabs: Option<bool>,
    #[serde(default)]
    pub tab_orientation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutAction {
    /// LaTeX geometry options, e.g. `top=1cm,bottom=1cm`
    #[serde(default)]
    pub adjust_margins: Option<String>,
    #[serde(default)]
    pub adjust_fontsize: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutRule {
    #[serde(default)]
    pub description: Option<String>,
    pub condition: LayoutCondition,
    pub action: LayoutAction,
}

/// The sheet variant being produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutQuery {
    pub lied_id: u32,
    pub show_measures: bool,
    pub show_chords: bool,
    pub show_tabs: bool,
    pub tab_orientation: String,
}

impl LayoutRule {
    pub fn matches(&self, query: &LayoutQuery) -> bool {
        fn wildcard<T: PartialEq>(condition: &Option<T>, value: &T) -> bool {
            condition.as_ref().map_or(true, |c| c == value)
        }
        let c = &self.condition;
        c.lied_id == query.lied_id
            && wildcard(&c.show_measures, &query.show_measures)
            && wildcard(&c.show_chords, &query.show_chords)
            && wildcard(&c.show_tabs, &query.show_tabs)
            && wildcard(&c.tab_orientation, &query.tab_orientation)
    }
}

pub fn parse_rules(text: &str) -> std::result::Result<Vec<LayoutRule>, serde_json::Error> {
    jsonc::from_str(text)
}

pub fn load_rules(path: &Path) -> Result<Vec<LayoutRule>> {
    let text = std::fs::read_to_string(path).map_err(|e| SongError::io(path, e))?;
    parse_rules(&text).map_err(|e| SongError::config(path, e))
}

pub fn first_match<'a>(rules: &'a [LayoutRule], query: &LayoutQuery) -> Option<&'a LayoutRule> {
    rules.iter().find(|rule| rule.matches(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"[
        // most specific first
        {
            "description": "lied 12 with tabs",
            "condition": {"liedId": 12, "showMeasures": null, "showChords": true,
                          "showTabs": true, "tabOrientation": "portrait"},
            "action": {"adjustMargins": "top=1cm", "adjustFontsize": null}
        },
        {
            "condition": {"liedId": 12, "showMeasures": null, "showChords": null,
                          "showTabs": null, "tabOrientation": null},
            "action": {"adjustMargins": null, "adjustFontsize": 10}
        }
    ]"#;

    fn query(show_tabs: bool) -> LayoutQuery {
        LayoutQuery {
            lied_id: 12,
            show_measures: true,
            show_chords: true,
            show_tabs,
            tab_orientation: "portrait".to_string(),
        }
    }

    #[test]
    fn test_first_match_wins() {
        let rules = parse_rules(RULES).unwrap();
        let rule = first_match(&rules, &query(true)).unwrap();
        assert_eq!(rule.action.adjust_margins.as_deref(), Some("top=1cm"));
    }

    #[test]
    fn test_wildcards_match_any_value() {
        let rules = parse_rules(RULES).unwrap();
        let rule = first_match(&rules, &query(false)).unwrap();
        assert_eq!(rule.action.adjust_fontsize, Some(10));
        assert_eq!(rule.description, None);
    }

    #[test]
    fn test_other_song_has_no_rule() {
        let rules = parse_rules(RULES).unwrap();
        let mut q = query(true);
        q.lied_id = 7;
        assert!(first_match(&rules, &q).is_none());
    }

    #[test]
    fn test_load_rules_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("layout.jsonc");
        std::fs::write(&path, RULES).unwrap();
        let rules = load_rules(&path).unwrap();
        assert_eq!(rules.len(), 2);

        std::fs::write(&path, "[ { \"condition\": 12 } ]").unwrap();
        assert!(matches!(load_rules(&path), Err(SongError::Config { .. })));
        assert!(matches!(
            load_rules(&dir.path().join("missing.jsonc")),
            Err(SongError::Io { .. })
        ));
    }
}
