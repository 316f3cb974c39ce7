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
use serde::Deserialize;

use crate::notes::Pitch;
use crate::performer::Slot;

use super::error::ConfigError;

/// A YAML representation of a choir member.
#[derive(Deserialize, Clone, Debug)]
pub struct Performer {
    /// The name of the performer. Must be unique within the choir.
    name: String,

    /// The pitch rung with the left hand.
    left: Option<String>,

    /// The pitch rung with the right hand.
    right: Option<String>,
}

impl Performer {
    /// New will create a new performer configuration.
    pub fn new(name: &str, left: Option<&str>, right: Option<&str>) -> Performer {
        Performer {
            name: name.to_string(),
            left: left.map(str::to_string),
            right: right.map(str::to_string),
        }
    }

    /// Returns the name of the performer.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds the performer, binding its configured pitches.
    pub fn to_performer(&self) -> Result<crate::performer::Performer, ConfigError> {
        let mut performer = crate::performer::Performer::new(&self.name);
        for (slot, token) in [(Slot::Left, &self.left), (Slot::Right, &self.right)] {
            if let Some(token) = token {
                let pitch = token
                    .parse::<Pitch>()
                    .map_err(|e| ConfigError::invalid(&format!("{}.{}", self.name, slot), e))?;
                performer.assign_slot(slot, pitch)?;
            }
        }
        Ok(performer)
    }
}
