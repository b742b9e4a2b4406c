//! # Pre-Creation Validation
//!
//! Checks decoded events before anything is encoded.
//!
//! ## Rule
//! Two adjacent events that both last exactly one slot must not share a
//! pitch. At 8th-note granularity the second strike would follow the first
//! release with no gap, which a MIDI player cannot render as two notes.
//!
//! ```text
//! /11/11/     invalid  (60 struck twice, both one slot)
//! /11//11/    valid    (first 60 is held for two slots)
//! /11/11 15/  invalid  (chord shares 60 with the previous slot)
//! ```
//!
//! A failure aborts the run before a file is written.

use crate::ast::DecodedEvent;
use crate::error::NumidiError;

/// Validate decoded events, reporting the first offending pair.
pub fn validate(events: &[DecodedEvent]) -> Result<(), NumidiError> {
    for (i, pair) in events.windows(2).enumerate() {
        let (current, next) = (&pair[0], &pair[1]);
        if current.duration != 1 || next.duration != 1 {
            continue;
        }

        if let Some(&shared) = current.pitches.iter().find(|&&p| next.pitches.contains(&p)) {
            return Err(NumidiError::RetriggerError {
                event: i + 1,
                pitches: current.pitches.clone(),
                shared,
            });
        }
    }
    Ok(())
}

pub fn is_valid(events: &[DecodedEvent]) -> bool {
    validate(events).is_ok()
}
