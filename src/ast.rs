//! # Event Types
//!
//! Data model shared by every pipeline stage.
//!
//! ## Type Flow
//! ```text
//! notation text
//!   └── Score
//!         ├── Metadata (title, velocity)
//!         ├── Vec<DecodedEvent>      one per sounding slot, duration in slots
//!         └── Vec<DecodeWarning>
//!
//! per clef (treble, bass), index-aligned with the decoded events
//!   └── Vec<ClefEvent>              Note | Sustain
//!         └── Vec<MergedEvent>      Note | Rest, sustains folded in
//! ```
//!
//! ## Durations
//! All durations here count slots. One slot is one 8th note; conversion to
//! ticks happens only in the `midi` module.

use crate::error::DecodeWarning;
use serde::{Deserialize, Serialize};

/// A MIDI note number taken from the degree table.
pub type Pitch = u8;

/// Default note velocity when the frontmatter does not set one.
pub const DEFAULT_VELOCITY: u8 = 80;

/// Settings read from the optional frontmatter block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub velocity: u8,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: None,
            velocity: DEFAULT_VELOCITY,
        }
    }
}

/// Raw metadata for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawMetadata {
    pub title: Option<String>,
    pub velocity: Option<i64>,
}

/// A chord (or single note) and how many slots it holds.
///
/// `pitches` keeps the order written in the slot and is never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedEvent {
    pub pitches: Vec<Pitch>,
    pub duration: u32,
}

impl DecodedEvent {
    pub fn new(pitches: Vec<Pitch>, duration: u32) -> Self {
        Self { pitches, duration }
    }
}

/// Whether a clef has something new to play in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClefEventKind {
    Note,
    /// Nothing new in this clef; carries the slot's duration
    Sustain,
}

/// One clef's share of a decoded event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClefEvent {
    pub kind: ClefEventKind,
    pub pitches: Vec<Pitch>,
    pub duration: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergedKind {
    Note,
    Rest,
}

/// A clef event after sustains have been folded into the preceding note.
///
/// `pitches` is empty exactly when `kind` is `Rest`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedEvent {
    pub kind: MergedKind,
    pub pitches: Vec<Pitch>,
    pub duration: u32,
}

impl MergedEvent {
    pub fn note(pitches: Vec<Pitch>, duration: u32) -> Self {
        Self {
            kind: MergedKind::Note,
            pitches,
            duration,
        }
    }

    pub fn rest(duration: u32) -> Self {
        Self {
            kind: MergedKind::Rest,
            pitches: Vec::new(),
            duration,
        }
    }
}

/// A decoded notation source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Score {
    pub metadata: Metadata,
    pub events: Vec<DecodedEvent>,
    #[serde(skip)]
    pub warnings: Vec<DecodeWarning>,
}
