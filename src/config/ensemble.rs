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
use std::time::Duration;

use duration_string::DurationString;
use serde::Deserialize;

use crate::conductor;
use crate::cue::Score;
use crate::notes::{DEFAULT_MEASURE_LENGTH, DEFAULT_SAMPLE_RATE};
use crate::roster::Roster;

use super::error::ConfigError;
use super::performer::Performer;

/// How the conductor spaces cues.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Pacing {
    /// Each cue lasts its note length.
    Duration,
    /// Each cue lasts one beat.
    Tempo { bpm: u32 },
}

/// A YAML representation of the ensemble configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Ensemble {
    /// The length of one measure (default: 1s).
    measure_length: Option<String>,

    /// How cues are paced (default: by note duration).
    pacing: Option<Pacing>,

    /// Sample rate used when rendering to a file (default: 49152).
    sample_rate: Option<u32>,

    /// The choir. When absent, one performer is created per pitch in the song.
    performers: Option<Vec<Performer>>,
}

impl Ensemble {
    /// New will create a new ensemble configuration.
    pub fn new(
        measure_length: Option<&str>,
        pacing: Option<Pacing>,
        performers: Option<Vec<Performer>>,
    ) -> Ensemble {
        Ensemble {
            measure_length: measure_length.map(str::to_string),
            pacing,
            sample_rate: None,
            performers,
        }
    }

    /// Returns the measure length from the configuration.
    pub fn measure_length(&self) -> Result<Duration, ConfigError> {
        let measure_length: Duration = match &self.measure_length {
            Some(measure_length) => DurationString::from_string(measure_length.clone())
                .map_err(|e| ConfigError::invalid("measure_length", e))?
                .into(),
            None => DEFAULT_MEASURE_LENGTH,
        };

        if measure_length.as_millis() == 0 {
            return Err(ConfigError::invalid(
                "measure_length",
                "must be at least 1ms",
            ));
        }
        Ok(measure_length)
    }

    /// Returns the pacing mode from the configuration.
    pub fn pacing(&self) -> Result<conductor::Pacing, ConfigError> {
        match self.pacing {
            None | Some(Pacing::Duration) => Ok(conductor::Pacing::Duration),
            Some(Pacing::Tempo { bpm: 0 }) => {
                Err(ConfigError::invalid("pacing.bpm", "must be greater than 0"))
            }
            Some(Pacing::Tempo { bpm }) => Ok(conductor::Pacing::Tempo { bpm }),
        }
    }

    /// Returns the sample rate (default: 49152).
    pub fn sample_rate(&self) -> Result<u32, ConfigError> {
        match self.sample_rate {
            None => Ok(DEFAULT_SAMPLE_RATE),
            Some(0) => Err(ConfigError::invalid("sample_rate", "must be greater than 0")),
            Some(sample_rate) => Ok(sample_rate),
        }
    }

    /// Builds the roster: the configured performers in order, or one per pitch of the score.
    pub fn roster(&self, score: &Score) -> Result<Roster, ConfigError> {
        let performers = match &self.performers {
            Some(performers) => performers,
            None => return Ok(Roster::for_score(score)?),
        };

        let mut roster = Roster::new();
        for performer in performers {
            roster.add(performer.to_performer()?)?;
        }
        Ok(roster)
    }
}
