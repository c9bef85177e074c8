//! Solo exports for the audio collaborator
//!
//! Each staff is rendered on its own by muting every other staff in a copy
//! of the document. The copy and its output path form a [`SoloExport`]; the
//! actual synthesis happens behind the [`AudioRenderer`] trait.

use std::path::{Path, PathBuf};

use crate::error::{AudioError, Result, SongError};
use crate::models::NotationDocument;

/// Playback volume written into every toggled staff
pub const SOLO_VOLUME: u8 = 127;

/// Return a copy of `doc` where only `staff` is audible
pub fn solo_staff(doc: &NotationDocument, staff: &str) -> std::result::Result<NotationDocument, AudioError> {
    if doc.staff(staff).is_none() {
        return Err(AudioError::UnknownStaff {
            staff: staff.to_string(),
            available: doc.staff_names(),
        });
    }

    let mut solo = doc.clone();
    for target in &mut solo.staves {
        let muted = target.name != staff;
        if !target.set_playback(muted, SOLO_VOLUME) {
            log::warn!(
                "staff `{}` has no playback properties line; left as is",
                target.name
            );
        }
    }
    Ok(solo)
}

/// One staff's solo document and where its audio should go
#[derive(Debug, Clone)]
pub struct SoloExport {
    pub staff: String,
    pub document: NotationDocument,
    pub output_path: PathBuf,
}

/// Plan solo exports for `staves`, or for every staff when `staves` is
/// empty. Output files are `<out_dir>/<song> <staff>.flac`.
///
/// Unknown staff names are skipped with a warning; it is an error when none
/// of the requested names exist.
pub fn plan_solo_exports(
    doc: &NotationDocument,
    staves: &[String],
    out_dir: &Path,
    song: &str,
) -> std::result::Result<Vec<SoloExport>, AudioError> {
    let selected: Vec<&str> = if staves.is_empty() {
        doc.staves.iter().map(|s| s.name.as_str()).collect()
    } else {
        for missing in staves.iter().filter(|name| doc.staff(name).is_none()) {
            log::warn!("staff `{}` not found, skipping", missing);
        }
        doc.staves
            .iter()
            .map(|s| s.name.as_str())
            .filter(|name| staves.iter().any(|s| s.as_str() == *name))
            .collect()
    };

    if selected.is_empty() {
        return Err(AudioError::UnknownStaff {
            staff: staves.join(", "),
            available: doc.staff_names(),
        });
    }

    selected
        .into_iter()
        .map(|staff| {
            Ok(SoloExport {
                staff: staff.to_string(),
                document: solo_staff(doc, staff)?,
                output_path: out_dir.join(format!("{} {}.flac", song, staff)),
            })
        })
        .collect()
}

/// External synthesis tool: turns a notation file into an audio file
pub trait AudioRenderer {
    fn render(&self, notation: &Path, output: &Path) -> std::result::Result<(), AudioError>;
}

/// Write each solo document next to its output, render it, then remove the
/// temporary notation file
pub fn export_solos<R: AudioRenderer>(renderer: &R, exports: &[SoloExport]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(exports.len());
    for (i, export) in exports.iter().enumerate() {
        log::info!(
            "rendering staff {}/{}: {}",
            i + 1,
            exports.len(),
            export.staff
        );
        let notation = export.output_path.with_extension("nwctxt");
        if let Some(parent) = notation.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SongError::io(parent, e))?;
        }
        std::fs::write(&notation, export.document.serialize())
            .map_err(|e| SongError::io(&notation, e))?;

        let rendered = renderer.render(&notation, &export.output_path);
        if let Err(e) = std::fs::remove_file(&notation) {
            log::warn!("could not remove {}: {}", notation.display(), e);
        }
        rendered?;
        written.push(export.output_path.clone());
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentSource;
    use crate::parse::parse_document;

    const TWO_STAVES: &str = "\
|AddStaff|Name:\"Bass\"
|StaffProperties|EndingBar:Section Close|Visible:Y
|StaffProperties|Muted:N|Volume:100|StereoPan:64
|Note|Dur:4th|Pos:0
|AddStaff|Name:\"Zang\"
|StaffProperties|EndingBar:Section Close|Visible:Y
|StaffProperties|Muted:Y|Volume:80|StereoPan:64
|Note|Dur:4th|Pos:0
";

    #[test]
    fn test_solo_staff_toggles_playback_lines() {
        let doc = parse_document(TWO_STAVES, DocumentSource::Text).unwrap();
        let solo = solo_staff(&doc, "Zang").unwrap();

        let bass = solo.staff("Bass").unwrap().playback().unwrap();
        let zang = solo.staff("Zang").unwrap().playback().unwrap();
        assert!(bass.muted);
        assert!(!zang.muted);
        assert_eq!(zang.volume, Some(127));
        // display line untouched
        assert_eq!(
            solo.staff("Bass").unwrap().prelude[0].raw(),
            "|StaffProperties|EndingBar:Section Close|Visible:Y"
        );
        // input unchanged
        assert_eq!(doc.serialize(), TWO_STAVES);
    }

    #[test]
    fn test_unknown_staff() {
        let doc = parse_document(TWO_STAVES, DocumentSource::Text).unwrap();
        assert!(matches!(
            solo_staff(&doc, "Alt"),
            Err(AudioError::UnknownStaff { .. })
        ));
    }
}
