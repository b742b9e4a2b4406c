//! Degree to pitch lookup.
//!
//! Degrees "1" through "30" name scale positions. The mapping is tabulated
//! data and does not follow a formula, so it is kept as a constant array
//! indexed by `degree - 1`.

use crate::ast::Pitch;

/// MIDI pitch for each degree, F2 (degree 1) up to A5 (degree 30).
pub const PITCH_TABLE: [Pitch; 30] = [
    41, 43, 48, 50, 52, 53, 55, 57, 58, 59, // F2 G2 C3 D3 E3 F3 G3 A3 A#3 B3
    60, 61, 62, 63, 64, 65, 66, 67, 68, 69, // C4 .. A4
    70, 71, 72, 73, 74, 75, 76, 77, 79, 81, // A#4 B4 C5 .. F5 G5 A5
];

/// Pitches at or above this value go to the treble track (degree 11, C4).
pub const TREBLE_THRESHOLD: Pitch = PITCH_TABLE[10];

/// Look up a degree token. Only the exact strings "1".."30" are valid.
pub fn degree_to_pitch(token: &str) -> Option<Pitch> {
    let token = token.trim();
    // Reject forms like "+3" or "03" that `parse` would otherwise accept
    if token.is_empty() || token.starts_with(['+', '0']) {
        return None;
    }
    let degree: usize = token.parse().ok()?;
    PITCH_TABLE.get(degree.checked_sub(1)?).copied()
}

/// Reverse lookup, the degree that produces `pitch`.
pub fn pitch_to_degree(pitch: Pitch) -> Option<usize> {
    PITCH_TABLE.iter().position(|&p| p == pitch).map(|i| i + 1)
}

pub fn is_treble(pitch: Pitch) -> bool {
    pitch >= TREBLE_THRESHOLD
}
