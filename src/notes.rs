// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The note catalog: the closed set of pitches a choir can ring and the note lengths a song
//! can ask for.

use std::{f64::consts::PI, fmt, str::FromStr, time::Duration};

/// The default sample rate used when synthesizing a pitch, ~48KHz.
pub const DEFAULT_SAMPLE_RATE: u32 = 48 * 1024;

/// The default length of one measure.
pub const DEFAULT_MEASURE_LENGTH: Duration = Duration::from_secs(1);

const FREQUENCY_A4_HZ: f64 = 440.0;
const MAX_VOLUME: f64 = 127.0;

/// Errors produced when a token doesn't name a known pitch or note length.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseNoteError {
    #[error("unknown pitch '{0}'")]
    UnknownPitch(String),
    #[error("unknown note length '{0}'")]
    UnknownLength(String),
}

/// A pitch the choir can ring. Rest is the silence value and is never delivered to a performer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pitch {
    Rest,
    A4,
    A4S,
    B4,
    C4,
    C4S,
    D4,
    D4S,
    E4,
    F4,
    F4S,
    G4,
    G4S,
    A5,
}

impl Pitch {
    /// Every pitch in catalog order. Rest is first and A4 second, the frequency math depends on it.
    pub const ALL: [Pitch; 14] = [
        Pitch::Rest,
        Pitch::A4,
        Pitch::A4S,
        Pitch::B4,
        Pitch::C4,
        Pitch::C4S,
        Pitch::D4,
        Pitch::D4S,
        Pitch::E4,
        Pitch::F4,
        Pitch::F4S,
        Pitch::G4,
        Pitch::G4S,
        Pitch::A5,
    ];

    /// Returns true if this is the silence value.
    pub fn is_rest(&self) -> bool {
        *self == Pitch::Rest
    }

    /// The token used for this pitch in song and config files.
    pub fn token(&self) -> &'static str {
        match self {
            Pitch::Rest => "REST",
            Pitch::A4 => "A4",
            Pitch::A4S => "A4S",
            Pitch::B4 => "B4",
            Pitch::C4 => "C4",
            Pitch::C4S => "C4S",
            Pitch::D4 => "D4",
            Pitch::D4S => "D4S",
            Pitch::E4 => "E4",
            Pitch::F4 => "F4",
            Pitch::F4S => "F4S",
            Pitch::G4 => "G4",
            Pitch::G4S => "G4S",
            Pitch::A5 => "A5",
        }
    }

    /// The frequency of the pitch in Hz, counted in half steps up from A4. Rest has no frequency.
    pub fn frequency(&self) -> Option<f64> {
        let ordinal = *self as i32;
        if ordinal == 0 {
            return None;
        }
        let half_steps = f64::from(ordinal - 1);
        Some(FREQUENCY_A4_HZ * 2.0f64.powf(half_steps / 12.0))
    }

    /// Returns the payload a performer hands to its output sink.
    pub fn waveform(&self) -> PitchWaveform {
        PitchWaveform { pitch: *self }
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Pitch {
    type Err = ParseNoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Pitch::ALL
            .iter()
            .find(|pitch| pitch.token().eq_ignore_ascii_case(token))
            .copied()
            .ok_or_else(|| ParseNoteError::UnknownPitch(token.to_string()))
    }
}

/// How long a note lasts, as a fraction of a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteLength {
    Whole,
    Half,
    Quarter,
    Eighth,
}

impl NoteLength {
    /// The fraction of a measure this length covers.
    pub fn fraction(&self) -> f64 {
        match self {
            NoteLength::Whole => 1.0,
            NoteLength::Half => 0.5,
            NoteLength::Quarter => 0.25,
            NoteLength::Eighth => 0.125,
        }
    }

    /// The wall clock length of this note for the given measure length, rounded to the millisecond.
    pub fn duration(&self, measure_length: Duration) -> Duration {
        let ms = (self.fraction() * measure_length.as_millis() as f64).round();
        Duration::from_millis(ms as u64)
    }
}

impl fmt::Display for NoteLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NoteLength::Whole => "WHOLE",
            NoteLength::Half => "HALF",
            NoteLength::Quarter => "QUARTER",
            NoteLength::Eighth => "EIGHTH",
        };
        f.write_str(name)
    }
}

impl FromStr for NoteLength {
    type Err = ParseNoteError;

    /// Accepts either the song file denominator (`4`) or the name (`QUARTER`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1" | "WHOLE" => Ok(NoteLength::Whole),
            "2" | "HALF" => Ok(NoteLength::Half),
            "4" | "QUARTER" => Ok(NoteLength::Quarter),
            "8" | "EIGHTH" => Ok(NoteLength::Eighth),
            _ => Err(ParseNoteError::UnknownLength(s.trim().to_string())),
        }
    }
}

/// The payload rendered by an output sink for a single cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitchWaveform {
    pitch: Pitch,
}

impl PitchWaveform {
    /// The pitch this waveform sounds.
    pub fn pitch(&self) -> Pitch {
        self.pitch
    }

    /// Synthesizes signed 8 bit mono sine samples for the given duration. Rest is silence.
    pub fn samples(&self, sample_rate: u32, duration: Duration) -> Vec<i8> {
        let count = (u128::from(sample_rate) * duration.as_millis() / 1000) as usize;
        let freq = match self.pitch.frequency() {
            Some(freq) => freq,
            None => return vec![0; count],
        };

        let step = freq * (2.0 * PI) / f64::from(sample_rate);
        (0..count)
            .map(|i| ((i as f64 * step).sin() * MAX_VOLUME) as i8)
            .collect()
    }
}
