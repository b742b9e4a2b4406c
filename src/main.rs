use clap::Parser;
use log::LevelFilter;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use numidi::clef::split_and_merge;
use numidi::pitch::pitch_to_degree;
use numidi::{encode, midi, note_spans, DecodedEvent, MergedEvent, NoteSpan, NumidiError, Score};

/// Convert a number-notation text file into a two-track MIDI file
#[derive(Parser)]
#[command(name = "numidi")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the input number text file
    input: PathBuf,

    /// Path for the output MIDI file
    #[arg(short, long, default_value = "output.mid")]
    output: PathBuf,

    /// Print the decoded and merged events as YAML before writing
    #[arg(long)]
    dump_events: bool,

    /// Show debug diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(&cli);
}

fn run(cli: &Cli) {
    let source = match fs::read_to_string(&cli.input) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            println!("Error: Input file not found at '{}'", cli.input.display());
            return;
        }
        Err(e) => {
            println!("Error reading file '{}': {}", cli.input.display(), e);
            return;
        }
    };

    if source.trim().is_empty() {
        println!("Warning: The input file is empty.");
        return;
    }

    let score = match numidi::parse(&source) {
        Ok(score) => score,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };
    for warning in &score.warnings {
        println!("Warning: {}", warning);
    }

    if let Err(e) = numidi::validate(&score.events) {
        println!("\n--- Pre-creation Validation Error ---");
        println!("Rule violation: {}", e);
        if let NumidiError::RetriggerError { shared, .. } = e {
            if let Some(degree) = pitch_to_degree(shared) {
                println!("Degree {} is written in two consecutive 8th-note slots.", degree);
            }
        }
        return;
    }

    if cli.dump_events {
        dump_events(&score);
    }

    let bytes = match midi::to_midi(&score) {
        Ok(bytes) => bytes,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };
    if let Err(e) = fs::write(&cli.output, &bytes) {
        println!("Error writing to '{}': {}", cli.output.display(), e);
        return;
    }
    println!(
        "Successfully created two-track MIDI file: {}",
        cli.output.display()
    );

    println!("--- Calling post-creation validation ---");
    let written = match fs::read(&cli.output) {
        Ok(written) => written,
        Err(e) => {
            println!("An error occurred during post-creation validation: {}", e);
            println!("The created MIDI file has issues. Please review the input.");
            return;
        }
    };
    match numidi::verify(&written) {
        Ok(()) => println!("--- Post-creation Validation: OK ---"),
        Err(e) => {
            println!("\n--- Post-creation Validation Error ---");
            println!("MIDI validation failed: {}", e);
            println!("The created MIDI file has issues. Please review the input.");
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct EventDump<'a> {
    metadata: &'a numidi::Metadata,
    events: &'a [DecodedEvent],
    treble: Vec<MergedEvent>,
    bass: Vec<MergedEvent>,
    treble_notes: Vec<NoteSpan>,
    bass_notes: Vec<NoteSpan>,
}

fn dump_events(score: &Score) {
    let (treble, bass) = split_and_merge(&score.events);
    let dump = EventDump {
        metadata: &score.metadata,
        events: &score.events,
        treble_notes: note_spans(&encode(&treble, midi::TICKS_PER_SLOT)),
        bass_notes: note_spans(&encode(&bass, midi::TICKS_PER_SLOT)),
        treble,
        bass,
    };

    match serde_yaml::to_string(&dump) {
        Ok(yaml) => println!("{}", yaml),
        Err(e) => println!("Error: could not dump events: {}", e),
    }
}
