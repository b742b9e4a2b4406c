//! # Clef Splitting and Sustain Merging
//!
//! Splits each decoded event into a treble part (pitch >= C4) and a bass
//! part (pitch < C4), then folds slots where a clef has nothing new into
//! the clef's previous note.
//!
//! ## Lockstep
//! Both clefs produce exactly one `ClefEvent` per decoded event, so the two
//! raw streams stay index-aligned and carry the same durations. A clef
//! with no pitches in a slot gets a `Sustain`.
//!
//! ## Merging
//! ```text
//! raw:    Note[60] x1, Sustain x2, Note[64] x1
//! merged: Note[60] x3, Note[64] x1
//!
//! raw:    Sustain x1, Sustain x2, Note[48] x1
//! merged: Rest x3, Note[48] x1
//! ```
//! Merging preserves the clef's total duration.

use crate::ast::{ClefEvent, ClefEventKind, DecodedEvent, MergedEvent, Pitch};
use crate::pitch::is_treble;

/// Split decoded events into index-aligned (treble, bass) streams.
pub fn split(events: &[DecodedEvent]) -> (Vec<ClefEvent>, Vec<ClefEvent>) {
    events
        .iter()
        .map(|event| {
            let (treble, bass): (Vec<_>, Vec<_>) =
                event.pitches.iter().copied().partition(|&p| is_treble(p));
            (
                clef_event(treble, event.duration),
                clef_event(bass, event.duration),
            )
        })
        .unzip()
}

fn clef_event(pitches: Vec<Pitch>, duration: u32) -> ClefEvent {
    let kind = if pitches.is_empty() {
        ClefEventKind::Sustain
    } else {
        ClefEventKind::Note
    };
    ClefEvent {
        kind,
        pitches,
        duration,
    }
}

/// Fold sustains into the preceding note, or into a rest when there is none.
pub fn merge_sustains(raw: &[ClefEvent]) -> Vec<MergedEvent> {
    let mut merged: Vec<MergedEvent> = Vec::new();

    for event in raw {
        match event.kind {
            ClefEventKind::Note => {
                merged.push(MergedEvent::note(event.pitches.clone(), event.duration));
            }
            ClefEventKind::Sustain => match merged.last_mut() {
                // Hold the note longer, or keep a leading rest running
                Some(last) => last.duration += event.duration,
                None => merged.push(MergedEvent::rest(event.duration)),
            },
        }
    }

    merged
}

/// Split then merge both clefs.
pub fn split_and_merge(events: &[DecodedEvent]) -> (Vec<MergedEvent>, Vec<MergedEvent>) {
    let (treble, bass) = split(events);
    let merged = (merge_sustains(&treble), merge_sustains(&bass));
    log::debug!(
        "merged clefs: treble {} -> {} events, bass {} -> {} events",
        treble.len(),
        merged.0.len(),
        bass.len(),
        merged.1.len()
    );
    merged
}
