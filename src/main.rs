use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use nwc_songbuild::analysis::{format_report, song_id_from_name};
use nwc_songbuild::audio::plan_solo_exports;
use nwc_songbuild::config::PipelineConfig;
use nwc_songbuild::layout_rules::{first_match, load_rules, LayoutQuery};
use nwc_songbuild::parse::read_document;
use nwc_songbuild::pipeline::SongPipeline;
use nwc_songbuild::timing::format_label_track;

#[derive(Parser, Debug)]
#[command(name = "nwc-songbuild")]
#[command(about = "Merge NoteWorthy Composer sections and derive song artifacts", long_about = None)]
struct Args {
    /// Pipeline configuration (JSONC)
    #[arg(short, long, default_value = "paths.jsonc")]
    config: PathBuf,

    /// Log debug details
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge a song's sections and write report, structure and label track
    Build {
        /// Song folder name under the input folder
        song: String,

        /// Keep tempo and time signature changes of every section
        #[arg(long)]
        keep_tempi: bool,
    },

    /// Print the measure analysis of one notation file
    Analyze { file: PathBuf },

    /// Print the label track of one notation file
    Labels { file: PathBuf },

    /// Write one solo notation file per staff
    Solo {
        file: PathBuf,

        /// Staff to solo; repeat for more. Default: every staff
        #[arg(short, long = "staff")]
        staves: Vec<String>,

        /// Output folder
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Print the layout adjustments that apply to one sheet variant
    Layout {
        /// Layout rules (JSONC)
        rules: PathBuf,

        #[arg(long)]
        lied_id: u32,

        #[arg(long)]
        show_measures: bool,

        #[arg(long)]
        show_chords: bool,

        #[arg(long)]
        show_tabs: bool,

        #[arg(long, default_value = "portrait")]
        tab_orientation: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = if args.config.exists() {
        PipelineConfig::load(&args.config)
            .with_context(|| format!("loading {}", args.config.display()))?
    } else {
        log::debug!("{} not found, using defaults", args.config.display());
        PipelineConfig::default()
    };

    match args.command {
        Command::Build { song, keep_tempi } => {
            let mut config = config;
            config.keep_all_tempi |= keep_tempi;
            let pipeline = SongPipeline::new(config);
            let build = pipeline
                .build(&song)
                .with_context(|| format!("building song `{}`", song))?;
            let outputs = pipeline.write_outputs(&build)?;
            println!("{}", outputs.merged.display());
            println!("{}", outputs.report.display());
            println!("{}", outputs.structure.display());
            println!("{}", outputs.label_track.display());
            if let Some(lyrics) = outputs.lyrics_document {
                println!("{}", lyrics.display());
            }
        }
        Command::Analyze { file } => {
            let build = SongPipeline::new(config)
                .analyze_file(&file)
                .with_context(|| format!("analysing {}", file.display()))?;
            let song_id = song_id_from_name(&build.song);
            print!("{}", format_report(&build.analysis, song_id.as_deref()));
        }
        Command::Labels { file } => {
            let build = SongPipeline::new(config)
                .analyze_file(&file)
                .with_context(|| format!("timing {}", file.display()))?;
            print!("{}", format_label_track(&build.timing.events));
        }
        Command::Solo { file, staves, out } => {
            let doc = read_document(&file)?;
            let song = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .context("input file has no name")?;
            let exports = plan_solo_exports(&doc, &staves, &out, &song)?;
            std::fs::create_dir_all(&out)
                .with_context(|| format!("creating {}", out.display()))?;
            for export in exports {
                let path = export.output_path.with_extension("nwctxt");
                std::fs::write(&path, export.document.serialize())
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("{}\t{}", path.display(), export.output_path.display());
            }
        }
        Command::Layout {
            rules,
            lied_id,
            show_measures,
            show_chords,
            show_tabs,
            tab_orientation,
        } => {
            let rules = load_rules(&rules)?;
            let query = LayoutQuery {
                lied_id,
                show_measures,
                show_chords,
                show_tabs,
                tab_orientation,
            };
            match first_match(&rules, &query) {
                Some(rule) => println!("{}", serde_json::to_string_pretty(&rule.action)?),
                None => log::info!("no layout rule for song {}", lied_id),
            }
        }
    }

    Ok(())
}
