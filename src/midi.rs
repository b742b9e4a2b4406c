//! # MIDI Track Encoding
//!
//! Converts merged clef events into delta-timed note messages and packages
//! the two clefs as a Standard MIDI File.
//!
//! ## Timing
//! - 480 ticks per quarter note, one slot (8th note) = 240 ticks
//! - Tempo fixed at 150 bpm, written once at the start of the treble track
//! - Every message delay is relative to the previous message on its track
//!
//! ## Message Order
//! For each note event all note-ons come first (chord order, the first
//! carrying any pending rest delay), then all note-offs (the first carrying
//! the note's length). Rests only add to the pending delay.
//!
//! ```text
//! Rest x1, Note[60, 64] x2
//!   NoteOn 60 +240, NoteOn 64 +0, NoteOff 60 +480, NoteOff 64 +0
//! ```
//!
//! ## Output Layout
//! SMF format 1 with two tracks, treble first then bass. Uses the `midly`
//! crate for serialization.

use crate::ast::{MergedEvent, MergedKind, Metadata, Pitch, Score};
use crate::clef::split_and_merge;
use crate::error::NumidiError;
use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use serde::Serialize;

/// Ticks per quarter note in MIDI output.
pub const TICKS_PER_BEAT: u16 = 480;

/// Ticks per slot (an 8th note).
pub const TICKS_PER_SLOT: u32 = TICKS_PER_BEAT as u32 / 2;

pub const TEMPO_BPM: u32 = 150;

const MICROSECONDS_PER_MINUTE: u32 = 60_000_000;

/// Largest delta a variable-length quantity can hold.
const MAX_DELTA: u32 = (1 << 28) - 1;

const CHANNEL: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageKind {
    NoteOn,
    NoteOff,
}

/// A note message with its delay since the previous message on the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimedMessage {
    pub kind: MessageKind,
    pub pitch: Pitch,
    pub delay: u32,
}

impl TimedMessage {
    pub fn on(pitch: Pitch, delay: u32) -> Self {
        Self {
            kind: MessageKind::NoteOn,
            pitch,
            delay,
        }
    }

    pub fn off(pitch: Pitch, delay: u32) -> Self {
        Self {
            kind: MessageKind::NoteOff,
            pitch,
            delay,
        }
    }

    fn to_track_event(self, velocity: u7) -> Result<TrackEvent<'static>, NumidiError> {
        if self.delay > MAX_DELTA {
            return Err(NumidiError::MidiError(format!(
                "delay of {} ticks does not fit in a MIDI delta time",
                self.delay
            )));
        }
        let key = u7::new(self.pitch);
        let message = match self.kind {
            MessageKind::NoteOn => MidiMessage::NoteOn { key, vel: velocity },
            MessageKind::NoteOff => MidiMessage::NoteOff { key, vel: velocity },
        };
        Ok(TrackEvent {
            delta: u28::new(self.delay),
            kind: TrackEventKind::Midi {
                channel: u4::new(CHANNEL),
                message,
            },
        })
    }
}

/// A sounding note rebuilt from messages, in absolute ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoteSpan {
    pub pitch: Pitch,
    pub onset: u32,
    pub duration: u32,
}

/// Encode one clef's merged events into delta-timed messages.
pub fn encode(events: &[MergedEvent], slot_ticks: u32) -> Vec<TimedMessage> {
    let mut messages = Vec::new();
    let mut pending_delay: u32 = 0;

    for event in events {
        let ticks = event.duration.saturating_mul(slot_ticks);

        let chord = match event.kind {
            MergedKind::Note => event.pitches.split_first(),
            MergedKind::Rest => None,
        };
        let Some((&first, others)) = chord else {
            pending_delay = pending_delay.saturating_add(ticks);
            continue;
        };

        messages.push(TimedMessage::on(first, pending_delay));
        messages.extend(others.iter().map(|&p| TimedMessage::on(p, 0)));
        pending_delay = 0;

        messages.push(TimedMessage::off(first, ticks));
        messages.extend(others.iter().map(|&p| TimedMessage::off(p, 0)));
    }

    messages
}

/// Rebuild (pitch, onset, duration) triples from a track's messages.
///
/// Spans are ordered by onset; notes starting together keep message order.
/// A note-on that is never released is left out.
pub fn note_spans(messages: &[TimedMessage]) -> Vec<NoteSpan> {
    let mut sounding: Vec<(Pitch, u32)> = Vec::new();
    let mut spans = Vec::new();
    let mut now: u32 = 0;

    for message in messages {
        now = now.saturating_add(message.delay);
        match message.kind {
            MessageKind::NoteOn => sounding.push((message.pitch, now)),
            MessageKind::NoteOff => {
                if let Some(i) = sounding.iter().position(|&(p, _)| p == message.pitch) {
                    let (pitch, onset) = sounding.remove(i);
                    spans.push(NoteSpan {
                        pitch,
                        onset,
                        duration: now - onset,
                    });
                }
            }
        }
    }

    spans.sort_by_key(|span| span.onset);
    spans
}

/// Write both clefs as a two-track MIDI file.
pub fn render(
    treble: &[MergedEvent],
    bass: &[MergedEvent],
    metadata: &Metadata,
) -> Result<Vec<u8>, NumidiError> {
    let velocity = u7::new(metadata.velocity);
    let treble_name = metadata.title.as_deref().unwrap_or("Treble");

    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_BEAT)),
    ));

    let tempo = TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(
            MICROSECONDS_PER_MINUTE / TEMPO_BPM,
        ))),
    };
    smf.tracks.push(build_track(
        treble_name,
        Some(tempo),
        &encode(treble, TICKS_PER_SLOT),
        velocity,
    )?);
    smf.tracks.push(build_track(
        "Bass",
        None,
        &encode(bass, TICKS_PER_SLOT),
        velocity,
    )?);

    let mut buf = Vec::new();
    smf.write(&mut buf)
        .map_err(|e| NumidiError::MidiError(format!("Failed to write MIDI: {}", e)))?;
    log::debug!("rendered {} bytes of MIDI", buf.len());
    Ok(buf)
}

fn build_track<'a>(
    name: &'a str,
    tempo: Option<TrackEvent<'a>>,
    messages: &[TimedMessage],
    velocity: u7,
) -> Result<Track<'a>, NumidiError> {
    let mut track: Track<'a> = Vec::with_capacity(messages.len() + 3);

    track.extend(tempo);
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
    });

    for message in messages {
        track.push(message.to_track_event(velocity)?);
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    Ok(track)
}

/// Split, merge and render a decoded score.
pub fn to_midi(score: &Score) -> Result<Vec<u8>, NumidiError> {
    let (treble, bass) = split_and_merge(&score.events);
    render(&treble, &bass, &score.metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_single_note() {
        let messages = encode(&[MergedEvent::note(vec![60], 2)], TICKS_PER_SLOT);
        assert_eq!(
            messages,
            vec![TimedMessage::on(60, 0), TimedMessage::off(60, 480)]
        );
    }

    #[test]
    fn test_encode_chord_groups_ons_then_offs() {
        let messages = encode(&[MergedEvent::note(vec![64, 60, 67], 1)], TICKS_PER_SLOT);
        assert_eq!(
            messages,
            vec![
                TimedMessage::on(64, 0),
                TimedMessage::on(60, 0),
                TimedMessage::on(67, 0),
                TimedMessage::off(64, 240),
                TimedMessage::off(60, 0),
                TimedMessage::off(67, 0),
            ]
        );
    }

    #[test]
    fn test_rests_accumulate_into_next_onset() {
        let events = vec![
            MergedEvent::rest(1),
            MergedEvent::rest(2),
            MergedEvent::note(vec![48], 1),
        ];
        assert_eq!(
            encode(&events, TICKS_PER_SLOT),
            vec![TimedMessage::on(48, 720), TimedMessage::off(48, 240)]
        );
    }

    #[test]
    fn test_pending_delay_resets_after_note() {
        let events = vec![
            MergedEvent::rest(1),
            MergedEvent::note(vec![48], 1),
            MergedEvent::note(vec![50], 1),
        ];
        let messages = encode(&events, TICKS_PER_SLOT);
        assert_eq!(messages[0].delay, 240);
        assert_eq!(messages[2], TimedMessage::on(50, 0));
    }

    #[test]
    fn test_trailing_rest_emits_nothing() {
        let events = vec![MergedEvent::note(vec![60], 1), MergedEvent::rest(4)];
        assert_eq!(encode(&events, TICKS_PER_SLOT).len(), 2);
    }

    #[test]
    fn test_round_trip_timings() {
        let events = vec![
            MergedEvent::rest(2),
            MergedEvent::note(vec![60, 64], 3),
            MergedEvent::note(vec![62], 1),
            MergedEvent::rest(1),
            MergedEvent::note(vec![67], 2),
        ];
        let spans = note_spans(&encode(&events, TICKS_PER_SLOT));
        assert_eq!(
            spans,
            vec![
                NoteSpan {
                    pitch: 60,
                    onset: 480,
                    duration: 720,
                },
                NoteSpan {
                    pitch: 64,
                    onset: 480,
                    duration: 720,
                },
                NoteSpan {
                    pitch: 62,
                    onset: 1200,
                    duration: 240,
                },
                NoteSpan {
                    pitch: 67,
                    onset: 1680,
                    duration: 480,
                },
            ]
        );
    }

    #[test]
    fn test_render_layout() {
        let score = parse("/3 11//15/").unwrap();
        let bytes = to_midi(&score).unwrap();
        let smf = Smf::parse(&bytes).unwrap();

        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.header.timing, Timing::Metrical(u15::new(480)));
        assert_eq!(smf.tracks.len(), 2);

        // Tempo opens the treble track
        let treble = &smf.tracks[0];
        assert_eq!(
            treble[0].kind,
            TrackEventKind::Meta(MetaMessage::Tempo(u24::new(400_000)))
        );
        assert_eq!(treble[0].delta.as_int(), 0);
        assert_eq!(
            treble[1].kind,
            TrackEventKind::Meta(MetaMessage::TrackName(&b"Treble"[..]))
        );

        let bass = &smf.tracks[1];
        assert_eq!(
            bass[0].kind,
            TrackEventKind::Meta(MetaMessage::TrackName(&b"Bass"[..]))
        );
        assert!(!bass
            .iter()
            .any(|e| matches!(e.kind, TrackEventKind::Meta(MetaMessage::Tempo(_)))));

        for track in &smf.tracks {
            let last = track.last().unwrap();
            assert_eq!(last.kind, TrackEventKind::Meta(MetaMessage::EndOfTrack));
        }
    }

    #[test]
    fn test_render_note_messages() {
        let score = parse("---\nvelocity: 90\n---\n/3 11//15/").unwrap();
        let bytes = to_midi(&score).unwrap();
        let smf = Smf::parse(&bytes).unwrap();

        // Bass: 48 held for 3 slots (sustained through the treble-only slot)
        let bass_notes: Vec<(u32, MidiMessage)> = smf.tracks[1]
            .iter()
            .filter_map(|e| match &e.kind {
                TrackEventKind::Midi { message, .. } => Some((e.delta.as_int(), *message)),
                _ => None,
            })
            .collect();
        assert_eq!(
            bass_notes,
            vec![
                (
                    0,
                    MidiMessage::NoteOn {
                        key: u7::new(48),
                        vel: u7::new(90),
                    },
                ),
                (
                    720,
                    MidiMessage::NoteOff {
                        key: u7::new(48),
                        vel: u7::new(90),
                    },
                ),
            ]
        );
    }

    #[test]
    fn test_title_names_treble_track() {
        let score = parse("---\ntitle: Etude\n---\n/11/").unwrap();
        let bytes = to_midi(&score).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(
            smf.tracks[0][1].kind,
            TrackEventKind::Meta(MetaMessage::TrackName(&b"Etude"[..]))
        );
    }

    #[test]
    fn test_empty_score_still_has_two_tracks() {
        let bytes = to_midi(&Score::default()).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 2);
    }
}
