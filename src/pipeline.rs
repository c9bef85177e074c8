//! Per-song orchestration
//!
//! Reads the section sequence of a song, parses and merges its sections,
//! runs analysis and timing, and writes the derived files:
//!
//! - `<output>/<song>.nwctxt`: the merged notation document
//! - `<output>/<song> analyse.txt`: the measure analysis report
//! - `<output>/<song> structuur.tex`: the structure document
//! - `<audio output>/<song> labeltrack t_<tempo>.txt`: the label track
//!
//! When `<song folder>/<song>.tex` exists, its tempo and time signature
//! commands are updated as well.

use std::path::{Path, PathBuf};

use crate::analysis::{format_report, song_id_from_name, MeasureAnalysis, MeasureAnalyzer};
use crate::concat::{Section, SectionConcatenator, SongSequence};
use crate::config::PipelineConfig;
use crate::error::{Result, SongError};
use crate::facts::{apply_lyrics_commands, render_structure, StructuralFacts};
use crate::models::NotationDocument;
use crate::parse::read_document;
use crate::timing::{write_label_track, TimingEngine, TimingReport};

/// Everything derived from one song
#[derive(Debug, Clone)]
pub struct SongBuild {
    pub song: String,
    pub merged: NotationDocument,
    pub analysis: MeasureAnalysis,
    pub timing: TimingReport,
    pub facts: StructuralFacts,
}

/// Files written for one song
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongOutputs {
    pub merged: PathBuf,
    pub report: PathBuf,
    pub structure: PathBuf,
    pub label_track: PathBuf,
    pub lyrics_document: Option<PathBuf>,
}

pub struct SongPipeline {
    config: PipelineConfig,
}

impl SongPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Parse the sections listed in the song's sequence file, in order
    pub fn load_sections(&self, song: &str) -> Result<Vec<Section>> {
        let nwc_folder = self.config.nwc_folder(song);
        let sequence = SongSequence::load(&SongSequence::path_for(&nwc_folder, song))?;
        log::info!(
            "song `{}`: {} sections ({})",
            song,
            sequence.sections.len(),
            sequence.sections.join(", ")
        );

        sequence
            .sections
            .iter()
            .map(|name| {
                let path = SongSequence::section_path(&nwc_folder, song, name);
                log::debug!("reading {}", path.display());
                Ok(Section::new(name.clone(), read_document(&path)?))
            })
            .collect()
    }

    /// Merge and analyse a song from its folder
    pub fn build(&self, song: &str) -> Result<SongBuild> {
        let sections = self.load_sections(song)?;
        self.build_from_sections(song, &sections)
    }

    pub fn build_from_sections(&self, song: &str, sections: &[Section]) -> Result<SongBuild> {
        let merged = SectionConcatenator::new(self.config.keep_all_tempi).concatenate(sections)?;
        self.analyze_document(song, merged)
    }

    /// Analysis, timing and facts for an already merged (or single) document
    pub fn analyze_document(&self, song: &str, doc: NotationDocument) -> Result<SongBuild> {
        let mut analysis = MeasureAnalyzer::from_config(&self.config).analyze(&doc)?;
        let timing = TimingEngine::from_config(&self.config).compute(&doc, &analysis.facts)?;
        timing.apply_to(&mut analysis.facts);
        let facts = StructuralFacts::collect(
            &doc,
            &analysis,
            &timing,
            &self.config.rhythm_staff,
            song,
        );
        Ok(SongBuild {
            song: song.to_string(),
            merged: doc,
            analysis,
            timing,
            facts,
        })
    }

    /// Parse one file and analyse it as a song of its own
    pub fn analyze_file(&self, path: &Path) -> Result<SongBuild> {
        let doc = read_document(path)?;
        let song = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.analyze_document(&song, doc)
    }

    pub fn write_outputs(&self, build: &SongBuild) -> Result<SongOutputs> {
        let out = &self.config.output_folder;
        std::fs::create_dir_all(out).map_err(|e| SongError::io(out, e))?;

        let merged = out.join(format!("{}.nwctxt", build.song));
        write_file(&merged, &build.merged.serialize())?;

        let report = out.join(format!("{} analyse.txt", build.song));
        let song_id = song_id_from_name(&build.song);
        write_file(&report, &format_report(&build.analysis, song_id.as_deref()))?;

        let structure = out.join(format!("{} structuur.tex", build.song));
        let pdf_name = format!("{} structuur.pdf", build.song);
        write_file(&structure, &render_structure(&build.facts, &pdf_name)?)?;

        let label_track = self.config.audio_output_folder.join(label_track_name(
            &build.song,
            build.timing.tempo_bpm,
        ));
        write_label_track(&label_track, &build.timing.events)?;

        let lyrics_document = self.update_lyrics_document(build)?;

        Ok(SongOutputs {
            merged,
            report,
            structure,
            label_track,
            lyrics_document,
        })
    }

    /// Update `\tempo` and `\maatsoort` in `<song folder>/<song>.tex`
    fn update_lyrics_document(&self, build: &SongBuild) -> Result<Option<PathBuf>> {
        let path = self
            .config
            .song_folder(&build.song)
            .join(format!("{}.tex", build.song));
        if !path.exists() {
            log::debug!("no lyrics document at {}", path.display());
            return Ok(None);
        }
        let (Some(tempo), Some(signature)) = (build.facts.tempo_bpm, &build.facts.time_signature)
        else {
            log::warn!(
                "tempo or time signature unknown; {} left unchanged",
                path.display()
            );
            return Ok(None);
        };

        let content = std::fs::read_to_string(&path).map_err(|e| SongError::io(&path, e))?;
        let updated = apply_lyrics_commands(&content, tempo, signature)?;
        if updated != content {
            write_file(&path, &updated)?;
        }
        Ok(Some(path))
    }
}

/// `<song> labeltrack t_<tempo>.txt`
pub fn label_track_name(song: &str, tempo: Option<u32>) -> String {
    match tempo {
        Some(tempo) => format!("{} labeltrack t_{}.txt", song, tempo),
        None => format!("{} labeltrack.txt", song),
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| SongError::io(path, e))?;
    log::info!("wrote {}", path.display());
    Ok(())
}
