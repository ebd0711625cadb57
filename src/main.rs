use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::path::{Path, PathBuf};

use film_tagger::modes::FileSource;
use film_tagger::{
    film_commands, Config, ConfigOverrides, CsvParser, EmptyFramePolicy, ExifTool, FilenameGenerator, Film,
    TimestampFormat,
};

#[derive(Parser)]
#[command(name = "film-tagger")]
#[command(version)]
#[command(about = "Generate exiftool commands from Canon EOS-1V data-logger CSV exports")]
#[command(long_about = "Reads the CSV files exported from the EOS-1V's built-in data logger and prints one
exiftool command per exposure, tagging the scanned frame with aperture, shutter speed,
ISO, exposure and flash settings and the shutter release time.

Scanned files are expected to be named after the filename pattern, by default
FILM_<cameraID:02><filmID:03><frameNo:05>.dng")]
struct Cli {
    /// Increase verbosity (-v=INFO, -vv=DEBUG, -vvv=TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print exiftool commands for every frame in one or more CSV exports
    Tag {
        /// CSV files to process
        files: Vec<PathBuf>,
        /// Number of parallel workers (default: rayon's choice)
        #[arg(short, long)]
        workers: Option<usize>,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Print the parsed films of a CSV export as JSON
    Dump {
        /// CSV file to parse
        file: PathBuf,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Render the filename pattern over ranges of IDs to check it
    Pattern {
        /// Filename pattern to render
        #[arg(long, default_value = film_tagger::naming::DEFAULT_FILENAME_PATTERN)]
        filename_pattern: String,
        /// First camera ID (inclusive)
        #[arg(long, default_value = "9")]
        start_camera_id: i64,
        /// Last camera ID (exclusive)
        #[arg(long, default_value = "11")]
        end_camera_id: i64,
        /// First film ID (inclusive)
        #[arg(long, default_value = "99")]
        start_film_id: i64,
        /// Last film ID (exclusive)
        #[arg(long, default_value = "101")]
        end_film_id: i64,
        /// First frame number (inclusive)
        #[arg(long, default_value = "9")]
        start_frame_no: i64,
        /// Last frame number (exclusive)
        #[arg(long, default_value = "11")]
        end_frame_no: i64,
    },
}

/// Options shared by the commands that read CSV exports
#[derive(Args)]
struct SettingsArgs {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Path to the exiftool binary
    #[arg(long)]
    exiftool_binary: Option<String>,
    /// Target filename pattern, e.g. FILM_${cameraID:02d}${filmID:03d}${frameNo:05d}.dng
    #[arg(long)]
    filename_pattern: Option<String>,
    /// FileSource tag value: "Film Scanner", "Reflection Print Scanner" or "Digital Camera"
    #[arg(long)]
    file_source: Option<FileSource>,
    /// GPS track log to geotag from (any format exiftool supports)
    #[arg(long)]
    geotag: Option<PathBuf>,
    /// Camera make, for every camera ID
    #[arg(long)]
    make: Option<String>,
    /// Camera model, for every camera ID
    #[arg(long)]
    model: Option<String>,
    /// Camera serial number, for every camera ID
    #[arg(long)]
    serial_number: Option<String>,
    /// Copyright notice
    #[arg(long)]
    copyright: Option<String>,
    /// Copy CreateDate into DateTimeDigitized
    #[arg(long, overrides_with = "no_set_digitized")]
    set_digitized: bool,
    /// Do not copy CreateDate into DateTimeDigitized, even if the config file does
    #[arg(long, overrides_with = "set_digitized")]
    no_set_digitized: bool,
    /// Date ordering in the export: US (month first) or EU (day first)
    #[arg(long)]
    timestamp_format: Option<TimestampFormat>,
    /// Camera clock timezone as an IANA name such as Europe/Moscow, for every camera ID
    #[arg(long)]
    timezone: Option<String>,
    /// What to do with frames that carry no data: skip or abort
    #[arg(long)]
    empty_frame_policy: Option<EmptyFramePolicy>,
}

impl SettingsArgs {
    fn load(self) -> Result<Config> {
        let path = self.config;
        let overrides = ConfigOverrides {
            copyright: self.copyright,
            exiftool_binary: self.exiftool_binary,
            filename_pattern: self.filename_pattern,
            file_source: self.file_source,
            geotag: self.geotag,
            make: self.make,
            model: self.model,
            serial_number: self.serial_number,
            set_digitized: switch(self.set_digitized, self.no_set_digitized),
            timestamp_format: self.timestamp_format,
            timezone: self.timezone,
            empty_frame_policy: self.empty_frame_policy,
        };

        Config::load(path.as_deref(), overrides).context("Failed to load configuration")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Tag { files, workers, settings } => tag_files(files, workers, settings.load()?),
        Commands::Dump { file, settings } => dump_file(&file, &settings.load()?),
        Commands::Pattern {
            filename_pattern,
            start_camera_id,
            end_camera_id,
            start_film_id,
            end_film_id,
            start_frame_no,
            end_frame_no,
        } => render_pattern(
            &filename_pattern,
            start_camera_id..end_camera_id,
            start_film_id..end_film_id,
            start_frame_no..end_frame_no,
        ),
    }
}

/// Tri-state from a `--flag` / `--no-flag` pair; `None` keeps the config file value
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn setup_logging(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    Ok(())
}

fn parse_file(path: &Path, config: &Config) -> Result<Vec<Film>> {
    let parser = CsvParser::open(path, config, config.timestamp_format)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .with_empty_frame_policy(config.empty_frame_policy);

    parser
        .parse()
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn tag_files(files: Vec<PathBuf>, workers: Option<usize>, config: Config) -> Result<()> {
    if files.is_empty() {
        anyhow::bail!("No files specified");
    }

    if let Some(workers) = workers {
        info!("Configuring rayon thread pool with {} threads", workers);
        if ThreadPoolBuilder::new().num_threads(workers).build_global().is_err() {
            warn!("Failed to configure rayon thread pool, using default");
        }
    }

    let names = config.filename_generator()?;
    info!("Processing {} files", files.len());

    for cmd in tag_commands(&files, &config, &names)? {
        println!("{}", cmd);
    }

    Ok(())
}

/// Commands for every frame of every file, in argument order.
///
/// Fails without output if any file fails to parse.
fn tag_commands(files: &[PathBuf], config: &Config, names: &FilenameGenerator) -> Result<Vec<String>> {
    let parsed = files
        .par_iter()
        .map(|path| parse_file(path, config))
        .collect::<Result<Vec<Vec<Film>>>>()?;

    let mut commands = Vec::new();
    for film in parsed.into_iter().flatten() {
        info!(
            "Film {:02}-{:03}: {} frames",
            film.camera_id,
            film.id,
            film.frames.len()
        );
        commands.extend(film_commands(&film, config, names).iter().map(ExifTool::cmd));
    }

    Ok(commands)
}

fn dump_file(path: &Path, config: &Config) -> Result<()> {
    let films = parse_file(path, config)?;
    let json = serde_json::to_string_pretty(&films).context("Failed to serialize films")?;
    println!("{}", json);
    Ok(())
}

fn render_pattern(
    pattern: &str,
    camera_ids: std::ops::Range<i64>,
    film_ids: std::ops::Range<i64>,
    frame_nos: std::ops::Range<i64>,
) -> Result<()> {
    let names = FilenameGenerator::new(pattern).context("Invalid filename pattern")?;

    println!("rendering pattern: '{}'\n", pattern);
    for camera_id in camera_ids {
        println!("cameraID = {}", camera_id);
        for film_id in film_ids.clone() {
            println!("  filmID = {}", film_id);
            for frame_no in frame_nos.clone() {
                println!("    {}: {}", frame_no, names.generate_filename(camera_id, film_id, frame_no));
            }
        }
    }

    Ok(())
}
