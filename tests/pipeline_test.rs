use std::fs;
use std::path::Path;

use nwc_songbuild::config::PipelineConfig;
use nwc_songbuild::pipeline::{label_track_name, SongPipeline};
use nwc_songbuild::{ConcatError, SongError};
use tempfile::TempDir;

fn staff(name: &str, lyrics: Option<&str>, body: &str) -> String {
    let mut text = format!(
        "|AddStaff|Name:\"{name}\"\n\
         |StaffProperties|EndingBar:Section Close|Visible:Y\n\
         |StaffProperties|Muted:N|Volume:127|StereoPan:64\n"
    );
    if let Some(verse) = lyrics {
        text.push_str(&format!("|Lyric1|Text:\"{verse}\"\n"));
    }
    text.push_str(body);
    text
}

fn section_text(staves: &[String]) -> String {
    format!(
        "!NoteWorthyComposer(2.75)\n|SongInfo|Title:\"Psalm 23\"\n|PgSetup|StartingBar:1\n{}!NoteWorthyComposer-End\n",
        staves.concat()
    )
}

fn measures(count: usize) -> String {
    vec!["|Note|Dur:Whole|Pos:0\n"; count].join("|Bar\n")
}

/// Lay out `<root>/songs/<song>/nwc/...` and return a pipeline writing into
/// `<root>/out` and `<root>/audio`
fn setup(root: &Path, song: &str, sequence: &str, sections: &[(&str, String)]) -> SongPipeline {
    let nwc = root.join("songs").join(song).join("nwc");
    fs::create_dir_all(&nwc).unwrap();
    fs::write(nwc.join(format!("{} volgorde.jsonc", song)), sequence).unwrap();
    for (name, text) in sections {
        fs::write(nwc.join(format!("{} {}.nwctxt", song, name)), text).unwrap();
    }

    let config_path = root.join("paths.jsonc");
    fs::write(
        &config_path,
        r#"{
            // relative to this file
            "input_folder": "songs",
            "output_folder": "out",
            "audio_output_folder": "audio"
        }"#,
    )
    .unwrap();
    SongPipeline::new(PipelineConfig::load(&config_path).unwrap())
}

fn intro_and_chorus() -> Vec<(&'static str, String)> {
    let bass_intro = format!(
        "|TimeSig|Signature:4/4\n|Tempo|Tempo:120\n|Text|Text:\"akk:G\"\n{}",
        measures(2)
    );
    let bass_chorus = format!(
        "|Tempo|Tempo:120\n|Text|Text:\"liedstart\"\n|Text|Text:\"akk:C\"\n{}",
        measures(2)
    );
    vec![
        (
            "intro",
            section_text(&[
                staff("Bass", None, &bass_intro),
                staff("Zang", None, &measures(2)),
            ]),
        ),
        (
            "refrein",
            section_text(&[
                staff("Bass", None, &bass_chorus),
                staff("Zang", Some("De He-er is"), &measures(2)),
            ]),
        ),
    ]
}

#[test]
fn test_build_writes_all_outputs() {
    let dir = TempDir::new().unwrap();
    let pipeline = setup(
        dir.path(),
        "Psalm 23",
        r#"{ "songstructure": ["intro", "refrein", /* again */ "refrein"] }"#,
        &intro_and_chorus(),
    );
    let tex = dir.path().join("songs/Psalm 23/Psalm 23.tex");
    fs::write(&tex, "\\newcommand{\\maatsoort}{3/4}\n\\newcommand{\\tempo}{80}\n").unwrap();

    let build = pipeline.build("Psalm 23").unwrap();
    assert_eq!(build.analysis.facts.lead_in_measures, 2);
    assert_eq!(build.analysis.facts.total_measures, 4);
    assert_eq!(build.facts.sections.len(), 3);
    assert_eq!(build.facts.sections[1].chords.text, "C(2)");
    assert_eq!(build.facts.song_id.as_deref(), Some("23"));

    let labels: Vec<&str> = build
        .timing
        .events
        .iter()
        .map(|e| e.label_text.as_str())
        .collect();
    assert_eq!(labels, vec!["intro", "refrein", "liedstart", "refrein"]);

    let outputs = pipeline.write_outputs(&build).unwrap();
    assert!(outputs.merged.ends_with("out/Psalm 23.nwctxt"));
    assert!(outputs
        .label_track
        .ends_with("audio/Psalm 23 labeltrack t_120.txt"));

    let report = fs::read_to_string(&outputs.report).unwrap();
    assert!(report.starts_with("*** NWC ANALYSE ***\n\nliedtitel: Psalm 23\nliednummer: 23\n"));
    assert!(report.contains("aantal maten vooraf: 2\n"));
    assert!(report.contains("1\tDe\n2\tHe\n3\tDe\n4\tHe\n"));

    let structure = fs::read_to_string(&outputs.structure).unwrap();
    assert!(structure.contains("Titel & Psalm 23 \\\\"));
    assert!(structure.contains("Duur & 0:12 \\\\"));
    assert!(structure.contains("refrein & 2 & C(2) \\\\"));
    assert!(structure.contains("3 & refrein & 2 & C(2) \\\\"));

    let track = fs::read_to_string(&outputs.label_track).unwrap();
    assert_eq!(track.lines().count(), 4);
    assert!(track.ends_with("8.000000\t12.000000\trefrein\n"));

    assert_eq!(
        fs::read_to_string(&tex).unwrap(),
        "\\newcommand{\\maatsoort}{4/4}\n\\newcommand{\\tempo}{120}\n"
    );
    assert_eq!(outputs.lyrics_document.as_deref(), Some(tex.as_path()));

    // the merged document parses again
    let merged = fs::read_to_string(&outputs.merged).unwrap();
    let reparsed = nwc_songbuild::parse_document(&merged, nwc_songbuild::DocumentSource::Text).unwrap();
    assert_eq!(reparsed.staff_names(), vec!["Bass", "Zang"]);
}

/// Scenario D: reversed staff order in a later section
#[test]
fn test_reversed_staff_order_fails() {
    let dir = TempDir::new().unwrap();
    let mut sections = intro_and_chorus();
    sections[1].1 = section_text(&[
        staff("Zang", None, &measures(2)),
        staff("Bass", None, &measures(2)),
    ]);
    let pipeline = setup(
        dir.path(),
        "Lied 4",
        r#"{"songstructure": ["intro", "refrein"]}"#,
        &sections,
    );

    match pipeline.build("Lied 4") {
        Err(SongError::Concat(ConcatError::StaffOrderMismatch { section, .. })) => {
            assert_eq!(section, "refrein");
        }
        other => panic!("expected staff order mismatch, got {:?}", other.map(|b| b.song)),
    }
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_missing_section_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let pipeline = setup(
        dir.path(),
        "Lied 5",
        r#"{"songstructure": ["intro", "brug"]}"#,
        &intro_and_chorus(),
    );
    match pipeline.build("Lied 5") {
        Err(SongError::Io { path, .. }) => assert!(path.ends_with("Lied 5 brug.nwctxt")),
        other => panic!("expected io error, got {:?}", other.map(|b| b.song)),
    }
}

#[test]
fn test_parse_error_carries_file_and_line() {
    let dir = TempDir::new().unwrap();
    let mut sections = intro_and_chorus();
    sections[0].1 = "!NoteWorthyComposer(2.75)\n|AddStaff|Name:\"Bass\"\nNote|Dur:4th\n".to_string();
    let pipeline = setup(
        dir.path(),
        "Lied 6",
        r#"{"songstructure": ["intro"]}"#,
        &sections,
    );
    match pipeline.build("Lied 6") {
        Err(SongError::Parse { path, source }) => {
            assert!(path.ends_with("Lied 6 intro.nwctxt"));
            assert_eq!(source.line_number, 3);
        }
        other => panic!("expected parse error, got {:?}", other.map(|b| b.song)),
    }
}

#[test]
fn test_invalid_sequence_file() {
    let dir = TempDir::new().unwrap();
    let pipeline = setup(dir.path(), "Lied 7", r#"{"sections": []}"#, &[]);
    assert!(matches!(
        pipeline.build("Lied 7"),
        Err(SongError::Sequence { .. })
    ));
}

#[test]
fn test_label_track_name() {
    assert_eq!(label_track_name("Lied 1", Some(96)), "Lied 1 labeltrack t_96.txt");
    assert_eq!(label_track_name("Lied 1", None), "Lied 1 labeltrack.txt");
}
