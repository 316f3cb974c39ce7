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

use crate::notes::PitchWaveform;

pub mod error;
pub mod mock;
pub mod timed;
pub mod wav;

pub use error::SinkError;

/// An output sink renders a note for a performer. Sinks may be called by many performers at once
/// and may take any amount of real time; if a sink needs serialized access it has to provide it.
pub trait Sink: fmt::Display + Send + Sync {
    /// Renders the waveform for the given duration.
    fn render(&self, waveform: &PitchWaveform, duration: Duration) -> Result<(), SinkError>;
}
