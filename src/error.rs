//! # Error Types
//!
//! This module defines the error types for the numidi converter.
//!
//! Two families exist because the pipeline validates twice:
//! - `NumidiError` stops a run before any file is written (bad frontmatter,
//!   a re-struck 8th note, a serialization failure).
//! - `TimingError` is reported after the file has been written; the file is
//!   kept and the user is told it has timing issues.
//!
//! Invalid degree tokens are not errors at all, see `DecodeWarning`.
//!
//! ## Usage
//! ```rust
//! use numidi::{compile, NumidiError};
//!
//! match compile("/11/11/") {
//!     Ok(bytes) => println!("{} bytes", bytes.len()),
//!     Err(NumidiError::RetriggerError { event, shared, .. }) => {
//!         eprintln!("Pitch {} re-struck at event {}", shared, event);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use crate::ast::Pitch;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NumidiError {
    /// Invalid frontmatter.
    ///
    /// # Example
    /// ```
    /// # use numidi::NumidiError;
    /// let err = NumidiError::MetadataError("velocity must be between 1 and 127".to_string());
    /// assert_eq!(err.to_string(), "Invalid metadata: velocity must be between 1 and 127");
    /// ```
    #[error("Invalid metadata: {0}")]
    MetadataError(String),

    /// Two adjacent un-sustained 8th-note events share a pitch.
    ///
    /// `event` is the 1-based position of the first event of the pair and
    /// `pitches` is its full pitch set.
    ///
    /// # Example
    /// ```
    /// # use numidi::NumidiError;
    /// let err = NumidiError::RetriggerError { event: 3, pitches: vec![60, 64], shared: 60 };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Consecutive 8th notes at events 3 and 4: pitch 60 is re-struck from [60, 64]"
    /// );
    /// ```
    #[error("Consecutive 8th notes at events {event} and {}: pitch {shared} is re-struck from {pitches:?}", .event + 1)]
    RetriggerError {
        event: usize,
        pitches: Vec<Pitch>,
        shared: Pitch,
    },

    /// The MIDI container could not be serialized.
    #[error("MIDI error: {0}")]
    MidiError(String),
}

/// Problems found when re-reading a generated file.
#[derive(Error, Debug, PartialEq)]
pub enum TimingError {
    /// A pitch was struck again too soon after a short note on the same pitch ended.
    ///
    /// # Example
    /// ```
    /// # use numidi::TimingError;
    /// let err = TimingError::Retrigger { track: 0, pitch: 60, gap: 0 };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Note 60 on track 0 re-triggered too quickly (0 ticks)"
    /// );
    /// ```
    #[error("Note {pitch} on track {track} re-triggered too quickly ({gap} ticks)")]
    Retrigger { track: usize, pitch: Pitch, gap: u32 },

    #[error("Could not read MIDI file: {0}")]
    Malformed(String),

    #[error("MIDI file uses timecode timing, expected ticks per beat")]
    UnsupportedTiming,
}

/// A recoverable problem found while decoding notation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeWarning {
    /// A token outside the 1-30 degree range. `slot` is 1-based.
    #[error("Number '{token}' in slot {slot} is not in the 1-30 range. Skipping.")]
    InvalidDegree { slot: usize, token: String },
}
