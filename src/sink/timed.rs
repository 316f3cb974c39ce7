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
use std::{fmt, thread, time::Duration};

use tracing::info;

use crate::notes::PitchWaveform;

use super::SinkError;

/// A sink that stands in for a playback line: it logs the note and holds the caller for the
/// note's duration, the way a blocking audio write would.
pub struct Sink {
    name: String,
}

impl Sink {
    /// Creates a new timed sink.
    pub fn new(name: &str) -> Sink {
        Sink {
            name: name.to_string(),
        }
    }
}

impl super::Sink for Sink {
    fn render(&self, waveform: &PitchWaveform, duration: Duration) -> Result<(), SinkError> {
        info!(
            sink = self.name,
            pitch = waveform.pitch().token(),
            duration = format!("{:?}", duration),
            "Ringing."
        );
        thread::sleep(duration);
        Ok(())
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Timed)", self.name)
    }
}
