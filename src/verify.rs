//! # Post-Creation Validation
//!
//! Re-reads a generated MIDI file and checks note timing per track.
//!
//! A note-off whose note lasted less than half a beat is a short release.
//! If the same pitch starts again less than half a beat after its last short
//! release, the track fails. Half a beat is taken from the file header.
//!
//! This overlaps with `semantic::validate` but works on real tick timing, so
//! it also catches encoding mistakes the slot-level check cannot see.

use crate::ast::Pitch;
use crate::error::TimingError;
use midly::{MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use std::collections::HashMap;

/// Check every track of an SMF byte buffer.
///
/// Unreadable input is reported as `TimingError::Malformed`, never a panic.
pub fn verify(bytes: &[u8]) -> Result<(), TimingError> {
    let smf = Smf::parse(bytes).map_err(|e| TimingError::Malformed(e.to_string()))?;

    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(tpb) => u32::from(tpb.as_int()),
        Timing::Timecode(..) => return Err(TimingError::UnsupportedTiming),
    };
    for (index, track) in smf.tracks.iter().enumerate() {
        verify_track(index, track, ticks_per_beat)?;
    }

    log::debug!("verified {} tracks", smf.tracks.len());
    Ok(())
}

pub fn is_valid_midi(bytes: &[u8]) -> bool {
    verify(bytes).is_ok()
}

/// True when `ticks` is under half a beat, without rounding odd resolutions.
fn under_half_beat(ticks: u32, ticks_per_beat: u32) -> bool {
    u64::from(ticks) * 2 < u64::from(ticks_per_beat)
}

fn verify_track(
    index: usize,
    track: &[TrackEvent],
    ticks_per_beat: u32,
) -> Result<(), TimingError> {
    let mut sounding: HashMap<Pitch, u32> = HashMap::new();
    let mut last_short_release: HashMap<Pitch, u32> = HashMap::new();
    let mut now: u32 = 0;

    for event in track {
        now = now.saturating_add(event.delta.as_int());

        let TrackEventKind::Midi { message, .. } = &event.kind else {
            continue;
        };

        match *message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                let pitch = key.as_int();
                if let Some(&released) = last_short_release.get(&pitch) {
                    let gap = now - released;
                    if under_half_beat(gap, ticks_per_beat) {
                        return Err(TimingError::Retrigger {
                            track: index,
                            pitch,
                            gap,
                        });
                    }
                }
                sounding.insert(pitch, now);
            }
            // Velocity 0 note-on is a release too
            MidiMessage::NoteOff { key, .. } | MidiMessage::NoteOn { key, .. } => {
                let pitch = key.as_int();
                if let Some(onset) = sounding.remove(&pitch) {
                    if under_half_beat(now - onset, ticks_per_beat) {
                        last_short_release.insert(pitch, now);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}
