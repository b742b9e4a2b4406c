//! # Notation Decoder
//!
//! Turns slot-delimited number notation into `DecodedEvent`s.
//!
//! ## Grammar
//! - `/` separates slots; each slot is one 8th note
//! - A slot holds nothing, or whitespace-separated degrees `1`..`30` played together
//! - Empty slots after a chord extend that chord by one slot each
//! - Empty slots with no chord before them are dropped
//!
//! ```text
//! /1/2/      ->  [41] x1, [43] x1
//! /1//2/     ->  [41] x2, [43] x1
//! /1 2/      ->  [41, 43] x1
//! //1/       ->  [41] x1  (leading empty slot is lost)
//! ```
//!
//! ## Frontmatter
//! An optional YAML block at the top of the file, between two `---` lines,
//! sets `title` and `velocity`. It is cut out before the notation is
//! decoded. `---` lines anywhere else are notation.
//!
//! ## Entry Points
//! - `parse(source) -> Result<Score, NumidiError>` handles frontmatter then decodes
//! - `decode(text) -> Decoded` decodes bare notation

use crate::ast::{DecodedEvent, Metadata, Pitch, RawMetadata, Score};
use crate::error::{DecodeWarning, NumidiError};
use crate::pitch::degree_to_pitch;

const SLOT_DELIMITER: char = '/';

/// Output of `decode`: events plus any dropped-token warnings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
    pub events: Vec<DecodedEvent>,
    pub warnings: Vec<DecodeWarning>,
}

/// Parse a full source: frontmatter (if any) then notation.
pub fn parse(source: &str) -> Result<Score, NumidiError> {
    let (metadata_content, notation) = extract_metadata(source);

    let metadata = match metadata_content {
        Some(content) => parse_yaml_metadata(&content)?,
        None => Metadata::default(),
    };

    let Decoded { events, warnings } = decode(&notation);
    log::debug!(
        "decoded {} events ({} warnings)",
        events.len(),
        warnings.len()
    );

    Ok(Score {
        metadata,
        events,
        warnings,
    })
}

/// Decode bare notation text.
pub fn decode(text: &str) -> Decoded {
    let slots = split_slots(text);
    let mut decoded = Decoded::default();

    let mut i = 0;
    while i < slots.len() {
        let content = slots[i].trim();
        if content.is_empty() {
            // Nothing before it to extend
            i += 1;
            continue;
        }

        let pitches = decode_chord(content, i + 1, &mut decoded.warnings);

        let mut j = i + 1;
        while j < slots.len() && slots[j].trim().is_empty() {
            j += 1;
        }
        let duration = (j - i) as u32;

        if !pitches.is_empty() {
            decoded.events.push(DecodedEvent::new(pitches, duration));
        }
        i = j;
    }

    decoded
}

/// Split into slot bodies, dropping the empty pieces outside the outer delimiters.
fn split_slots(text: &str) -> Vec<&str> {
    let s = text.trim();
    let s = s.strip_prefix(SLOT_DELIMITER).unwrap_or(s);
    let s = s.strip_suffix(SLOT_DELIMITER).unwrap_or(s);
    if s.is_empty() {
        return Vec::new();
    }
    s.split(SLOT_DELIMITER).collect()
}

fn decode_chord(content: &str, slot: usize, warnings: &mut Vec<DecodeWarning>) -> Vec<Pitch> {
    content
        .split_whitespace()
        .filter_map(|token| match degree_to_pitch(token) {
            Some(pitch) => Some(pitch),
            None => {
                log::debug!("dropping degree {:?} in slot {}", token, slot);
                warnings.push(DecodeWarning::InvalidDegree {
                    slot,
                    token: token.to_string(),
                });
                None
            }
        })
        .collect()
}

/// Cut the `---` frontmatter block out of the source.
///
/// A block only counts when the first non-blank line is `---`; the next
/// `---` line closes it. Anything else is left to the decoder, where a
/// stray `---` is just an invalid token.
pub fn extract_metadata(source: &str) -> (Option<String>, String) {
    let lines: Vec<&str> = source.lines().collect();

    let Some(start) = lines.iter().position(|line| !line.trim().is_empty()) else {
        return (None, source.to_string());
    };
    if lines[start].trim() != "---" {
        return (None, source.to_string());
    }

    match lines[start + 1..].iter().position(|line| line.trim() == "---") {
        Some(offset) => {
            let end = start + 1 + offset;
            let content = lines[start + 1..end].join("\n");
            (Some(content), lines[end + 1..].join("\n"))
        }
        None => (None, source.to_string()),
    }
}

fn parse_yaml_metadata(content: &str) -> Result<Metadata, NumidiError> {
    if content.trim().is_empty() {
        return Ok(Metadata::default());
    }

    let raw: RawMetadata =
        serde_yaml::from_str(content).map_err(|e| NumidiError::MetadataError(e.to_string()))?;

    let velocity = match raw.velocity {
        Some(v) => u8::try_from(v)
            .ok()
            .filter(|v| (1..=127).contains(v))
            .ok_or_else(|| {
                NumidiError::MetadataError(format!(
                    "velocity must be between 1 and 127, got {}",
                    v
                ))
            })?,
        None => Metadata::default().velocity,
    };

    Ok(Metadata {
        title: raw.title,
        velocity,
    })
}
