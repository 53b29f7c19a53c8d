use std::{io::IsTerminal, path::PathBuf};

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use colored::Colorize;
use contact_sheet::{
    ContactSheet, DEFAULT_COLUMNS, DEFAULT_ROWS, DecodeFailurePolicy, FfmpegLogLevel,
    ProgressInfo, ProgressObserver, SheetOptions, SheetSummary,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  contact-sheet input.mp4\n  contact-sheet input.mp4 --rows 4 --cols 6 --show-time\n  contact-sheet input.mp4 -o preview.png --json\n  contact-sheet --completions zsh > _contact-sheet";

/// Exit status for a missing input, matching clap's usage errors.
const USAGE_EXIT_CODE: i32 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "contact-sheet",
    version,
    about = "Extract thumbnails from a video file into a single contact sheet",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Path to the video file.
    input: Option<PathBuf>,

    /// Output image path (default: <input_filename>_thumbnails.png).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of rows in the thumbnail grid.
    #[arg(short, long, default_value_t = DEFAULT_ROWS, value_parser = clap::value_parser!(u32).range(1..))]
    rows: u32,

    /// Number of columns in the thumbnail grid.
    #[arg(short, long, default_value_t = DEFAULT_COLUMNS, value_parser = clap::value_parser!(u32).range(1..))]
    cols: u32,

    /// Include timestamps on thumbnails.
    #[arg(long)]
    show_time: bool,

    /// Fail instead of writing a blank sheet when the input cannot be decoded.
    #[arg(long)]
    strict: bool,

    /// Hide the progress bar.
    #[arg(short, long)]
    quiet: bool,

    /// Show debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<FfmpegLogLevel>,

    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,

    /// Print shell completions and exit.
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

/// Progress bar fed by the sampler's frame scan.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new(total_frames: u64, hidden: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total_frames)
        };
        let style = ProgressStyle::with_template(
            "Processing frames: {percent:>3}%|{bar:40.cyan/blue}| {pos}/{len} [{elapsed_precise}<{eta_precise}, {per_sec}]",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressObserver for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.current);
    }

    fn on_finish(&self, info: &ProgressInfo) {
        self.bar.set_position(info.current);
        self.bar.finish();
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn print_summary_json(summary: &SheetSummary) -> Result<(), Box<dyn std::error::Error>> {
    let payload = json!({
        "input": summary.input.display().to_string(),
        "output": summary.output.display().to_string(),
        "total_frames": summary.metadata.frame_count,
        "fps": summary.metadata.frames_per_second,
        "frame_gap": summary.stride,
        "sampled_frames": summary.sampled_indices,
        "blank_cells": summary.blank_cells,
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn run(cli: Cli, input: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = cli.log_level {
        contact_sheet::set_ffmpeg_log_level(level);
    }

    let mut options = SheetOptions::new(cli.rows, cli.cols)
        .with_show_time(cli.show_time)
        .with_decode_failure(if cli.strict {
            DecodeFailurePolicy::Error
        } else {
            DecodeFailurePolicy::BlankSheet
        });
    if let Some(output) = cli.output {
        options = options.with_output(output);
    }

    let chatty = !cli.json;
    if chatty {
        println!("Reading file: {}", input.display());
    }

    let prepared = ContactSheet::new(options).prepare(&input)?;
    let metadata = prepared.metadata();
    if chatty {
        println!("Total frames: {}", metadata.frame_count);
        println!("Frames per second: {:.2}", metadata.frames_per_second);
        println!();
        println!(
            "Extracting thumbnails every {} frames",
            prepared.schedule().stride()
        );
    }

    let hidden = cli.quiet || cli.json || !std::io::stderr().is_terminal();
    let progress = TerminalProgress::new(metadata.frame_count, hidden)?;
    let summary = prepared.render(&progress)?;

    if cli.json {
        print_summary_json(&summary)?;
    } else {
        println!(
            "{} {}",
            "Saved thumbnails to:".green().bold(),
            summary.output.display()
        );
    }
    Ok(())
}

/// The input path, or the usage exit code if it is missing or empty.
fn resolve_input(input: Option<PathBuf>) -> Result<PathBuf, i32> {
    match input {
        Some(input) if !input.as_os_str().is_empty() => Ok(input),
        _ => Err(USAGE_EXIT_CODE),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "contact-sheet", &mut std::io::stdout());
        return;
    }

    let input = match resolve_input(cli.input.clone()) {
        Ok(input) => input,
        Err(code) => {
            eprintln!(
                "{} {}",
                "error:".red().bold(),
                "no input file given".red()
            );
            eprintln!("Usage: contact-sheet <INPUT> [-o OUTPUT] [-r ROWS] [-c COLS] [--show-time]");
            eprintln!("For more information, try '--help'.");
            std::process::exit(code);
        }
    };

    if let Err(error) = run(cli, input) {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
