//! Integration tests for the numidi converter
//!
//! Tests the full pipeline from number notation to a MIDI file on disk and
//! back through post-creation validation.

use midly::{MetaMessage, MidiMessage, Smf, TrackEventKind};
use numidi::{compile, compile_unchecked, parse, verify, NumidiError};
use pretty_assertions::assert_eq;
use std::fs;

/// (delta, on?, key) for every note message in a track
fn note_messages(smf: &Smf, track: usize) -> Vec<(u32, bool, u8)> {
    smf.tracks[track]
        .iter()
        .filter_map(|e| match &e.kind {
            TrackEventKind::Midi { message, .. } => match message {
                MidiMessage::NoteOn { key, .. } => Some((e.delta.as_int(), true, key.as_int())),
                MidiMessage::NoteOff { key, .. } => Some((e.delta.as_int(), false, key.as_int())),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

#[test]
fn test_compile_write_and_verify() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tune.txt");
    let output = dir.path().join("output.mid");

    fs::write(&input, "/3 15//11 5/13/ /15 3/\n").unwrap();
    let source = fs::read_to_string(&input).unwrap();

    let bytes = compile(&source).unwrap();
    fs::write(&output, &bytes).unwrap();

    let written = fs::read(&output).unwrap();
    assert_eq!(written, bytes);
    assert_eq!(verify(&written), Ok(()));
}

#[test]
fn test_two_clef_timing() {
    // slot:   1      2   3     4   5   6
    //         48+64  -   52+60 62  -   48+64
    let bytes = compile("/3 15//11 5/13/ /15 3/").unwrap();
    let smf = Smf::parse(&bytes).unwrap();
    assert_eq!(smf.tracks.len(), 2);

    assert_eq!(
        note_messages(&smf, 0),
        vec![
            (0, true, 64),
            (480, false, 64),
            (0, true, 60),
            (240, false, 60),
            (0, true, 62),
            (480, false, 62),
            (0, true, 64),
            (240, false, 64),
        ]
    );
    // Bass 52 holds through the treble-only slots
    assert_eq!(
        note_messages(&smf, 1),
        vec![
            (0, true, 48),
            (480, false, 48),
            (0, true, 52),
            (720, false, 52),
            (0, true, 48),
            (240, false, 48),
        ]
    );
}

#[test]
fn test_leading_bass_rest_delays_first_onset() {
    let bytes = compile("/11/13/3/").unwrap();
    let smf = Smf::parse(&bytes).unwrap();
    assert_eq!(
        note_messages(&smf, 1),
        vec![(480, true, 48), (240, false, 48)]
    );
}

#[test]
fn test_tempo_only_on_treble_track() {
    let bytes = compile("/11/3/").unwrap();
    let smf = Smf::parse(&bytes).unwrap();
    let tempos: Vec<usize> = smf
        .tracks
        .iter()
        .enumerate()
        .flat_map(|(i, track)| {
            track
                .iter()
                .filter(|e| matches!(e.kind, TrackEventKind::Meta(MetaMessage::Tempo(_))))
                .map(move |_| i)
        })
        .collect();
    assert_eq!(tempos, vec![0]);
}

#[test]
fn test_pre_validation_blocks_file() {
    let result = compile("/11/13 11/");
    match result {
        Err(NumidiError::RetriggerError { event, shared, .. }) => {
            assert_eq!(event, 1);
            assert_eq!(shared, 60);
        }
        other => panic!("Expected RetriggerError but got: {:?}", other),
    }
}

#[test]
fn test_unchecked_compile_still_verifies() {
    // Eighth notes last exactly half a beat, so the file-level check accepts them
    let bytes = compile_unchecked("/11/11/").unwrap();
    assert_eq!(verify(&bytes), Ok(()));
}

#[test]
fn test_invalid_tokens_are_reported_but_converted() {
    let score = parse("/11 99/abc/15/").unwrap();
    assert_eq!(score.warnings.len(), 2);
    assert_eq!(score.events.len(), 2);
    // "abc" slot produces no event, so 60 does not absorb it
    assert_eq!(score.events[0].duration, 1);
    assert!(compile("/11 99/abc/15/").is_ok());
}

#[test]
fn test_frontmatter_velocity_reaches_file() {
    let bytes = compile("---\nvelocity: 64\n---\n/11/").unwrap();
    let smf = Smf::parse(&bytes).unwrap();
    let velocities: Vec<u8> = smf.tracks[0]
        .iter()
        .filter_map(|e| match &e.kind {
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { vel, .. } | MidiMessage::NoteOff { vel, .. },
                ..
            } => Some(vel.as_int()),
            _ => None,
        })
        .collect();
    assert_eq!(velocities, vec![64, 64]);
}

#[test]
fn test_bad_frontmatter_is_fatal() {
    assert!(matches!(
        compile("---\nvelocity: loud\n---\n/11/"),
        Err(NumidiError::MetadataError(_))
    ));
}
