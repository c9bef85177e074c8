//! Lyrics distribution
//!
//! Verse text is split into syllables and handed out to the notes of a
//! staff by a small state machine. A slurred or tied note holds its syllable
//! over the following note, and that hold continues for as long as the held
//! notes are themselves slurred or tied.

use crate::models::{Element, NoteOrRest};

/// A verse syllable that occupies a note without singing anything on it
pub const SKIP_SYLLABLE: &str = "_";

#[derive(Debug, Clone, Copy, PartialEq)]
enum LyricsState {
    /// Next note gets the next syllable
    SeekingNote,

    /// Inside a melisma; notes are skipped
    InMelisma,
}

impl LyricsState {
    /// Move past one sung note. Returns true when the note takes the next
    /// syllable of the verse.
    fn step(&mut self, note: &NoteOrRest) -> bool {
        if note.explicit_lyric {
            *self = if note.extends_syllable {
                LyricsState::InMelisma
            } else {
                LyricsState::SeekingNote
            };
            return false;
        }

        match *self {
            LyricsState::InMelisma => {
                if !note.extends_syllable {
                    *self = LyricsState::SeekingNote;
                }
                false
            }
            LyricsState::SeekingNote => {
                if note.extends_syllable {
                    *self = LyricsState::InMelisma;
                }
                true
            }
        }
    }
}

/// Split verse text into syllables.
///
/// Syllables are separated by whitespace (escaped `\n` included) and by
/// hyphens. Underscores stay inside a syllable.
pub fn parse_syllables(verse: &str) -> Vec<String> {
    verse
        .split(is_separator)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '-'
}

/// Byte offset just past each syllable of `verse`
fn syllable_ends(verse: &str) -> Vec<usize> {
    let mut ends = Vec::new();
    let mut in_syllable = false;
    for (i, c) in verse.char_indices() {
        let separator = is_separator(c);
        if separator && in_syllable {
            ends.push(i);
        }
        in_syllable = !separator;
    }
    if in_syllable {
        ends.push(verse.len());
    }
    ends
}

fn sung_notes(elements: &[Element]) -> impl Iterator<Item = &NoteOrRest> {
    elements.iter().filter_map(|element| match element {
        Element::NoteOrRest(note) if !note.is_rest => Some(note),
        _ => None,
    })
}

/// Number of verse syllables the notes in `elements` consume
pub fn syllable_slots(elements: &[Element]) -> usize {
    let mut state = LyricsState::SeekingNote;
    sung_notes(elements).filter(|note| state.step(note)).count()
}

/// Make `verse` cover exactly `slots` syllables: surplus syllables are cut
/// off and missing ones are filled with [`SKIP_SYLLABLE`].
pub fn fit_verse(verse: &str, slots: usize) -> String {
    let ends = syllable_ends(verse);
    if ends.len() >= slots {
        let cut = match slots {
            0 => 0,
            n => ends[n - 1],
        };
        return verse[..cut].to_string();
    }

    let mut fitted = verse.trim_end().to_string();
    for _ in ends.len()..slots {
        if !fitted.is_empty() {
            fitted.push(' ');
        }
        fitted.push_str(SKIP_SYLLABLE);
    }
    fitted
}

/// Assign verse syllables to the notes in `elements`.
///
/// Syllables from an earlier run are cleared first. Rests never take a
/// syllable and do not end a melisma. Notes with an explicit `Lyric` field
/// keep it and consume nothing from the verse. A [`SKIP_SYLLABLE`] consumes
/// its note but leaves it silent. Returns the number of syllables assigned.
pub fn distribute_lyrics(verse: &str, elements: &mut [Element]) -> usize {
    let mut next = parse_syllables(verse).into_iter();
    let mut state = LyricsState::SeekingNote;
    let mut assigned = 0;

    for element in elements.iter_mut() {
        let note = match element {
            Element::NoteOrRest(note) if !note.is_rest => note,
            _ => continue,
        };
        if !note.explicit_lyric {
            note.lyric_syllable = None;
        }
        if !state.step(note) {
            continue;
        }
        match next.next() {
            Some(syllable) if syllable == SKIP_SYLLABLE => {}
            Some(syllable) => {
                note.lyric_syllable = Some(syllable);
                assigned += 1;
            }
            None => {}
        }
    }

    log::debug!("distributed {} lyric syllables", assigned);
    assigned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_syllables_splits_on_space_and_hyphen() {
        assert_eq!(parse_syllables("Hel-lo world"), vec!["Hel", "lo", "world"]);
        assert_eq!(parse_syllables("one\ntwo  three"), vec!["one", "two", "three"]);
        assert_eq!(parse_syllables("zo_als -- wij"), vec!["zo_als", "wij"]);
        assert!(parse_syllables("  ").is_empty());
    }

    #[test]
    fn test_fit_verse_pads_with_skips() {
        assert_eq!(fit_verse("oh", 3), "oh _ _");
        assert_eq!(fit_verse("", 2), "_ _");
        assert_eq!(fit_verse("a b\n", 3), "a b _");
    }

    #[test]
    fn test_fit_verse_cuts_surplus_syllables() {
        assert_eq!(fit_verse("De He-er is", 2), "De He");
        assert_eq!(fit_verse("Hel-lo", 1), "Hel");
        assert_eq!(fit_verse("a b", 0), "");
        assert_eq!(fit_verse("a b", 2), "a b");
    }
}
