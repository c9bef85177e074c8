//! Plain-text analysis report

use once_cell::sync::Lazy;
use regex::Regex;

use super::MeasureAnalysis;

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Song id: the last run of digits in a song or file name
pub fn song_id_from_name(name: &str) -> Option<String> {
    DIGITS.find_iter(name).last().map(|m| m.as_str().to_string())
}

/// Render the analysis as the `*** NWC ANALYSE ***` report
pub fn format_report(analysis: &MeasureAnalysis, song_id: Option<&str>) -> String {
    let facts = &analysis.facts;
    let mut lines = vec!["*** NWC ANALYSE ***".to_string(), String::new()];
    lines.push(format!(
        "liedtitel: {}",
        analysis.title.as_deref().unwrap_or("Unknown")
    ));
    if let Some(id) = song_id {
        lines.push(format!("liednummer: {}", id));
    }
    lines.push(format!("totaal aantal maten: {}", facts.total_measures));
    lines.push(format!(
        "heeft begintel: {}",
        if facts.has_pickup_measure { "ja" } else { "nee" }
    ));
    lines.push(format!("aantal maten vooraf: {}", facts.lead_in_measures));
    lines.push(String::new());
    lines.push("maat\ttekst".to_string());

    for entry in &analysis.measure_map {
        lines.push(format!("{}\t{}", entry.measure_number, entry.syllables.join(" ")));
    }

    let mut report = lines.join("\n");
    report.push('\n');
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_id_takes_last_digit_run() {
        assert_eq!(song_id_from_name("Lied 12").as_deref(), Some("12"));
        assert_eq!(song_id_from_name("2024 Psalm 23 refrein").as_deref(), Some("23"));
        assert_eq!(song_id_from_name("Amazing Grace"), None);
    }
}
