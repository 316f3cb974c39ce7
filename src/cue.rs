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
use std::{fmt, time::Duration};

use crate::error::SetupError;
use crate::notes::{NoteLength, ParseNoteError, Pitch};

/// A single instruction from the conductor: ring this pitch for this long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cue {
    pitch: Pitch,
    length: NoteLength,
}

impl Cue {
    /// Creates a new cue.
    pub fn new(pitch: Pitch, length: NoteLength) -> Cue {
        Cue { pitch, length }
    }

    /// Parses the cue at the given 1-based score entry. An undefined token is a malformed score.
    pub fn from_tokens(index: usize, pitch: &str, length: &str) -> Result<Cue, SetupError> {
        let to_error = |source: ParseNoteError| SetupError::MalformedScore { index, source };
        Ok(Cue::new(
            pitch.parse::<Pitch>().map_err(to_error)?,
            length.parse::<NoteLength>().map_err(to_error)?,
        ))
    }

    /// The pitch of the cue.
    pub fn pitch(&self) -> Pitch {
        self.pitch
    }

    /// The length of the cue.
    pub fn length(&self) -> NoteLength {
        self.length
    }

    /// Returns true if the cue is a rest.
    pub fn is_rest(&self) -> bool {
        self.pitch.is_rest()
    }

    /// The nominal wall clock duration of the cue.
    pub fn duration(&self, measure_length: Duration) -> Duration {
        self.length.duration(measure_length)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pitch, self.length)
    }
}

/// The song: cues in performance order. A score can't be changed once it's built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Score {
    cues: Vec<Cue>,
}

impl Score {
    /// Creates a score from already resolved cues.
    pub fn new(cues: Vec<Cue>) -> Score {
        Score { cues }
    }

    /// Builds a score from raw (pitch, length) tokens. Any undefined token rejects the whole score.
    pub fn from_tokens<'a, I>(tokens: I) -> Result<Score, SetupError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let cues = tokens
            .into_iter()
            .enumerate()
            .map(|(i, (pitch, length))| Cue::from_tokens(i + 1, pitch, length))
            .collect::<Result<Vec<Cue>, SetupError>>()?;

        Ok(Score { cues })
    }

    /// The cues in performance order.
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// The distinct non-rest pitches of the score, in order of first appearance.
    pub fn pitches(&self) -> Vec<Pitch> {
        let mut pitches: Vec<Pitch> = Vec::new();
        for cue in self.cues.iter().filter(|cue| !cue.is_rest()) {
            if !pitches.contains(&cue.pitch()) {
                pitches.push(cue.pitch());
            }
        }
        pitches
    }

    /// The nominal length of the whole score when paced by note duration.
    pub fn duration(&self, measure_length: Duration) -> Duration {
        self.cues
            .iter()
            .map(|cue| cue.duration(measure_length))
            .sum()
    }
}
