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

//! Loads songs from text files. A song file has one `NOTE LENGTH` pair per line, for example
//! `C4 4` for a C4 quarter note. Blank lines are skipped. A file with any invalid line is not
//! loaded at all, and every invalid line is reported.

use std::{fs, io, path::Path};

use tracing::info;

use crate::{
    cue::{Cue, Score},
    error::SetupError,
    util::filename_display,
};

/// What is wrong with a line of a song file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineProblem {
    #[error("invalid format (must be 'NOTE LENGTH')")]
    Format,

    #[error(transparent)]
    Malformed(#[from] SetupError),
}

/// An invalid line of a song file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {problem}: '{text}'")]
pub struct LineError {
    /// The 1-based line number.
    pub line: usize,
    /// The offending line.
    pub text: String,
    /// What is wrong with it.
    pub problem: LineProblem,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unable to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{file} has {} invalid line(s)", .errors.len())]
    Invalid { file: String, errors: Vec<LineError> },
}

/// Parses the line holding the given 1-based score entry into a cue.
fn parse_line(entry: usize, text: &str) -> Result<Cue, LineProblem> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    let [pitch, length] = parts.as_slice() else {
        return Err(LineProblem::Format);
    };

    Ok(Cue::from_tokens(entry, pitch, length)?)
}

/// Parses the contents of a song file. Returns every invalid line if there are any.
pub fn parse_score(contents: &str) -> Result<Score, Vec<LineError>> {
    let mut cues = Vec::new();
    let mut errors = Vec::new();

    let entries = contents
        .lines()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty());
    for (entry, (i, text)) in entries.enumerate() {
        match parse_line(entry + 1, text) {
            Ok(cue) => cues.push(cue),
            Err(problem) => errors.push(LineError {
                line: i + 1,
                text: text.trim().to_string(),
                problem,
            }),
        }
    }

    if errors.is_empty() {
        Ok(Score::new(cues))
    } else {
        Err(errors)
    }
}

/// Loads a song file.
pub fn load_score(path: &Path) -> Result<Score, LoadError> {
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let score = parse_score(&contents).map_err(|errors| LoadError::Invalid {
        file: filename_display(path).to_string(),
        errors,
    })?;

    info!(
        file = filename_display(path),
        cues = score.len(),
        "Song loaded."
    );
    Ok(score)
}
