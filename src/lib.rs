pub mod ast;
pub mod clef;
pub mod decoder;
pub mod error;
pub mod midi;
pub mod pitch;
pub mod semantic;
pub mod verify;

pub use ast::*;
pub use decoder::{decode, parse};
pub use error::*;
pub use midi::{encode, note_spans, render, to_midi, NoteSpan, TimedMessage};
pub use semantic::validate;
pub use verify::verify;

/// Convert number notation to MIDI file bytes.
/// This is the main entry point for the library.
pub fn compile(source: &str) -> Result<Vec<u8>, NumidiError> {
    let score = parse(source)?;
    validate(&score.events)?;
    to_midi(&score)
}

/// Convert without pre-creation validation
pub fn compile_unchecked(source: &str) -> Result<Vec<u8>, NumidiError> {
    let score = parse(source)?;
    to_midi(&score)
}
